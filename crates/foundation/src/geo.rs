use serde::{Deserialize, Serialize};

/// Geographic coordinate in degrees.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }
}

/// Geographic bounding box spanning from its southwest to its northeast corner.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub southwest: LatLng,
    pub northeast: LatLng,
}

impl GeoBounds {
    pub fn new(southwest: LatLng, northeast: LatLng) -> Self {
        GeoBounds {
            southwest,
            northeast,
        }
    }
}

/// Edge insets in CSS pixels, used when re-fitting a map's visible bounds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}
