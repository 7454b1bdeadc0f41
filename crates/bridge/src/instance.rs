use std::collections::{BTreeMap, BTreeSet};

use crate::engine::{ClusterHandle, MapHandle, MarkerHandle, OverlayHandle, Subscription};

/// One live marker owned by exactly one map instance.
#[derive(Debug)]
pub struct MarkerInstance {
    pub id: String,
    pub handle: MarkerHandle,
    pub subscription: Subscription,
}

/// Active clustering state for one map instance.
///
/// `snapshot` is fixed when clustering is enabled; markers added afterwards
/// are not retroactively included until clustering is re-enabled.
#[derive(Debug)]
pub struct ClusterState {
    pub handle: ClusterHandle,
    pub subscription: Subscription,
    pub snapshot: BTreeSet<MarkerHandle>,
}

/// Traffic overlay state.
///
/// The engine overlay object is created lazily on first enable and retained
/// across toggles for reuse.
#[derive(Debug)]
pub struct TrafficState {
    pub overlay: OverlayHandle,
    pub enabled: bool,
}

/// One embedded, independently addressable map view with its own markers,
/// overlays, and listeners.
///
/// Owned exclusively by the registry. The engine map object behind `map` is
/// owned by the engine and only referenced here. At most one clusterer and
/// one traffic overlay are active at a time.
#[derive(Debug)]
pub struct MapInstance<C> {
    pub id: String,
    pub container: C,
    pub map: MapHandle,
    pub markers: BTreeMap<String, MarkerInstance>,
    pub subscriptions: Vec<Subscription>,
    pub clusterer: Option<ClusterState>,
    pub traffic: Option<TrafficState>,
}
