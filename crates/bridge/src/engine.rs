use foundation::{GeoBounds, LatLng, Padding};

use crate::config::{CameraConfig, MapConfig, MapType, MarkerSpec};
use crate::error::BridgeError;

/// Opaque handle to an engine map object.
///
/// Handles are issued by a `MapEngine` implementation and are meaningless
/// outside of it. The bridge maps them back to caller-facing string ids
/// through its bidirectional indices.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MapHandle(pub u64);

/// Opaque handle to an engine marker object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerHandle(pub u64);

/// Opaque handle to an engine overlay object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayHandle(pub u64);

/// Opaque handle to an engine clusterer object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterHandle(pub u64);

/// Identifier for one engine listener registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// A retained engine listener registration.
///
/// Every listener the bridge attaches is recorded on its owning instance so
/// that `destroy` can release it; nothing is allowed to keep calling back
/// against a torn-down container.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Subscription(pub SubscriptionId);

/// The default listener set attached to every map at `create`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MapEventKind {
    Idle,
    CenterChanged,
    Click,
}

/// One cluster member as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMember {
    pub marker: MarkerHandle,
    pub position: LatLng,
    pub title: Option<String>,
}

/// Engine-native events, queued by the engine's callbacks and drained by
/// `MapBridge::pump`.
///
/// Events carry engine handles only, never bridge ids; translation happens
/// in `events`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    CameraIdle {
        map: MapHandle,
        bearing: f64,
        position: LatLng,
        tilt: f64,
        zoom: f64,
    },
    CameraMoveStarted {
        map: MapHandle,
    },
    MapClicked {
        map: MapHandle,
        position: LatLng,
    },
    MarkerClicked {
        marker: MarkerHandle,
        position: LatLng,
        title: Option<String>,
    },
    ClusterClicked {
        cluster: ClusterHandle,
        position: LatLng,
        members: Vec<ClusterMember>,
    },
    LocationResolved {
        map: MapHandle,
        position: LatLng,
    },
    LocationFailed {
        map: MapHandle,
        message: String,
    },
}

/// Seam between the registry and a concrete mapping engine.
///
/// Implementations own the engine's live object graph; the bridge only ever
/// sees opaque handles. All methods are synchronous: engine callbacks queue
/// `EngineEvent`s instead of calling back into the bridge, which keeps the
/// registry free of re-entrant mutation.
pub trait MapEngine {
    /// Opaque UI container handle supplied by the host environment.
    type Container;

    /// Ensures the engine library is initialized. Idempotent; a failed load
    /// leaves the engine retryable.
    fn ensure_loaded(&mut self, api_key: &str) -> Result<(), BridgeError>;

    /// Constructs an engine map bound to `container`.
    fn create_map(
        &mut self,
        container: &Self::Container,
        config: &MapConfig,
    ) -> Result<MapHandle, BridgeError>;

    /// Unbinds the engine map and clears the container's visual content.
    fn destroy_map(&mut self, map: MapHandle, container: &Self::Container);

    fn subscribe_map(&mut self, map: MapHandle, kind: MapEventKind) -> Subscription;
    fn subscribe_marker(&mut self, marker: MarkerHandle) -> Subscription;
    fn subscribe_cluster(&mut self, cluster: ClusterHandle) -> Subscription;
    fn unsubscribe(&mut self, subscription: Subscription);

    fn move_camera(&mut self, map: MapHandle, camera: &CameraConfig);
    fn set_map_type(&mut self, map: MapHandle, map_type: MapType);
    fn set_center(&mut self, map: MapHandle, center: LatLng);

    /// The currently visible bounds, if the engine has computed them yet.
    fn visible_bounds(&self, map: MapHandle) -> Option<GeoBounds>;
    fn fit_bounds(&mut self, map: MapHandle, bounds: GeoBounds, padding: Padding);

    fn create_marker(
        &mut self,
        map: MapHandle,
        spec: &MarkerSpec,
    ) -> Result<MarkerHandle, BridgeError>;
    fn remove_marker(&mut self, marker: MarkerHandle);

    fn create_traffic_overlay(&mut self) -> Result<OverlayHandle, BridgeError>;
    /// Attaches the overlay to `map`, or detaches it when `map` is `None`.
    fn set_overlay_map(&mut self, overlay: OverlayHandle, map: Option<MapHandle>);
    /// Releases the engine overlay object behind the handle.
    fn destroy_overlay(&mut self, overlay: OverlayHandle);

    /// Constructs a clusterer over the given marker snapshot.
    fn create_clusterer(
        &mut self,
        map: MapHandle,
        markers: &[MarkerHandle],
    ) -> Result<ClusterHandle, BridgeError>;
    /// Detaches the clusterer from its map without touching the markers.
    fn detach_clusterer(&mut self, cluster: ClusterHandle);

    fn supports_geolocation(&self) -> bool;
    /// Issues a single one-shot position query. The answer arrives later as
    /// `EngineEvent::LocationResolved` or `EngineEvent::LocationFailed`.
    fn request_location(&mut self, map: MapHandle);

    /// Drains events queued by engine callbacks since the last call.
    fn take_events(&mut self) -> Vec<EngineEvent>;
}
