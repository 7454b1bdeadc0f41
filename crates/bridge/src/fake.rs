//! In-memory engine used by the bridge tests.
//!
//! Records every interaction so tests can assert on the engine-side object
//! graph, and exposes `push` so tests can simulate callback activity.

use std::collections::{BTreeMap, BTreeSet};

use foundation::{GeoBounds, LatLng, Padding};

use crate::config::{CameraConfig, MapConfig, MapType, MarkerSpec};
use crate::engine::{
    ClusterHandle, EngineEvent, MapEngine, MapEventKind, MapHandle, MarkerHandle, OverlayHandle,
    Subscription, SubscriptionId,
};
use crate::error::BridgeError;

pub(crate) fn bounds(southwest: (f64, f64), northeast: (f64, f64)) -> GeoBounds {
    GeoBounds::new(
        LatLng::new(southwest.0, southwest.1),
        LatLng::new(northeast.0, northeast.1),
    )
}

#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    next_handle: u64,
    pub loaded: bool,
    pub fail_load: bool,
    pub fail_clusterer: bool,
    pub geolocation: bool,
    pub events: Vec<EngineEvent>,
    pub live_maps: BTreeSet<u64>,
    pub live_markers: BTreeSet<u64>,
    pub subscriptions: BTreeSet<u64>,
    pub overlays_created: usize,
    pub live_overlays: BTreeSet<u64>,
    pub overlay_attachments: Vec<(u64, Option<u64>)>,
    pub clusterers: BTreeMap<u64, Vec<MarkerHandle>>,
    pub detached_clusterers: BTreeSet<u64>,
    pub location_requests: Vec<MapHandle>,
    pub centers: BTreeMap<u64, LatLng>,
    pub camera_moves: Vec<(MapHandle, CameraConfig)>,
    pub map_types: Vec<(MapHandle, MapType)>,
    pub bounds: Option<GeoBounds>,
    pub fit_calls: Vec<(MapHandle, GeoBounds, Padding)>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    fn handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }
}

impl MapEngine for FakeEngine {
    type Container = ();

    fn ensure_loaded(&mut self, _api_key: &str) -> Result<(), BridgeError> {
        if self.fail_load {
            return Err(BridgeError::EngineLoadFailure("simulated".to_string()));
        }
        self.loaded = true;
        Ok(())
    }

    fn create_map(
        &mut self,
        _container: &Self::Container,
        config: &MapConfig,
    ) -> Result<MapHandle, BridgeError> {
        let h = self.handle();
        self.live_maps.insert(h);
        if let Some(center) = config.center {
            self.centers.insert(h, center);
        }
        Ok(MapHandle(h))
    }

    fn destroy_map(&mut self, map: MapHandle, _container: &Self::Container) {
        self.live_maps.remove(&map.0);
        self.centers.remove(&map.0);
    }

    fn subscribe_map(&mut self, _map: MapHandle, _kind: MapEventKind) -> Subscription {
        let h = self.handle();
        self.subscriptions.insert(h);
        Subscription(SubscriptionId(h))
    }

    fn subscribe_marker(&mut self, _marker: MarkerHandle) -> Subscription {
        let h = self.handle();
        self.subscriptions.insert(h);
        Subscription(SubscriptionId(h))
    }

    fn subscribe_cluster(&mut self, _cluster: ClusterHandle) -> Subscription {
        let h = self.handle();
        self.subscriptions.insert(h);
        Subscription(SubscriptionId(h))
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.subscriptions.remove(&subscription.0.0);
    }

    fn move_camera(&mut self, map: MapHandle, camera: &CameraConfig) {
        if let Some(center) = camera.coordinate {
            self.centers.insert(map.0, center);
        }
        self.camera_moves.push((map, *camera));
    }

    fn set_map_type(&mut self, map: MapHandle, map_type: MapType) {
        self.map_types.push((map, map_type));
    }

    fn set_center(&mut self, map: MapHandle, center: LatLng) {
        self.centers.insert(map.0, center);
    }

    fn visible_bounds(&self, _map: MapHandle) -> Option<GeoBounds> {
        self.bounds
    }

    fn fit_bounds(&mut self, map: MapHandle, bounds: GeoBounds, padding: Padding) {
        self.fit_calls.push((map, bounds, padding));
    }

    fn create_marker(
        &mut self,
        _map: MapHandle,
        _spec: &MarkerSpec,
    ) -> Result<MarkerHandle, BridgeError> {
        let h = self.handle();
        self.live_markers.insert(h);
        Ok(MarkerHandle(h))
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.live_markers.remove(&marker.0);
    }

    fn create_traffic_overlay(&mut self) -> Result<OverlayHandle, BridgeError> {
        let h = self.handle();
        self.overlays_created += 1;
        self.live_overlays.insert(h);
        Ok(OverlayHandle(h))
    }

    fn set_overlay_map(&mut self, overlay: OverlayHandle, map: Option<MapHandle>) {
        self.overlay_attachments.push((overlay.0, map.map(|m| m.0)));
    }

    fn destroy_overlay(&mut self, overlay: OverlayHandle) {
        self.live_overlays.remove(&overlay.0);
    }

    fn create_clusterer(
        &mut self,
        _map: MapHandle,
        markers: &[MarkerHandle],
    ) -> Result<ClusterHandle, BridgeError> {
        if self.fail_clusterer {
            return Err(BridgeError::InternalConsistency(
                "simulated clusterer failure".to_string(),
            ));
        }
        let h = self.handle();
        self.clusterers.insert(h, markers.to_vec());
        Ok(ClusterHandle(h))
    }

    fn detach_clusterer(&mut self, cluster: ClusterHandle) {
        self.clusterers.remove(&cluster.0);
        self.detached_clusterers.insert(cluster.0);
    }

    fn supports_geolocation(&self) -> bool {
        self.geolocation
    }

    fn request_location(&mut self, map: MapHandle) {
        self.location_requests.push(map);
    }

    fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}
