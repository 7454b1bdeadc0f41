use foundation::LatLng;
use serde::{Deserialize, Serialize};

/// Initial engine map configuration, forwarded to the engine at `create`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapConfig {
    pub center: Option<LatLng>,
    pub zoom: Option<f64>,
}

/// Camera state applied by `set_camera`.
///
/// `angle` is the camera tilt. Absent fields leave the engine's current
/// value untouched. Animated transitions are unsupported on this substrate,
/// so the camera always jumps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraConfig {
    pub coordinate: Option<LatLng>,
    pub zoom: Option<f64>,
    pub bearing: Option<f64>,
    pub angle: Option<f64>,
}

/// Caller-supplied description of one marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkerSpec {
    pub coordinate: LatLng,
    pub opacity: Option<f64>,
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub icon_url: Option<String>,
    pub draggable: bool,
}

/// Viewport scroll delta in CSS pixels.
///
/// Only carried for signature compatibility: scroll interception is
/// unsupported on this substrate and always rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollDelta {
    pub x: f64,
    pub y: f64,
}

/// Base map rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapType {
    Normal,
    Hybrid,
    Satellite,
    Terrain,
    None,
}

impl MapType {
    /// The engine-side map type identifier.
    pub fn engine_id(self) -> &'static str {
        match self {
            MapType::Normal => "roadmap",
            MapType::Hybrid => "hybrid",
            MapType::Satellite => "satellite",
            MapType::Terrain => "terrain",
            MapType::None => "none",
        }
    }
}
