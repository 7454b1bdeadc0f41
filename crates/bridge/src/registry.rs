use std::collections::BTreeMap;

use foundation::{MarkerIdAllocator, Padding};

use crate::config::{CameraConfig, MapConfig, MapType, MarkerSpec, ScrollDelta};
use crate::engine::{ClusterHandle, MapEngine, MapEventKind, MapHandle, MarkerHandle};
use crate::error::BridgeError;
use crate::instance::{MapInstance, MarkerInstance, TrafficState};
use crate::notify::{Notification, NotificationBus};

/// Owning side of the marker reverse index: which map and which marker a
/// given engine handle belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct MarkerKey {
    pub map_id: String,
    pub marker_id: String,
}

/// Registry and command surface over an arbitrary number of live map
/// instances.
///
/// The bridge is an explicitly owned value: callers thread it through their
/// host layer rather than reaching for a global. It owns the id-to-instance
/// mapping, the handle-to-id reverse indices, the process-wide marker id
/// allocator, and the notification bus. The engine behind `E` owns the live
/// map/marker objects themselves.
///
/// Ordering contract:
/// - registry containers are `BTreeMap`s, so traversal order is stable;
/// - indices are updated in the same command that mutates the instance, so
///   every command observes a consistent snapshot.
pub struct MapBridge<E: MapEngine> {
    engine: E,
    maps: BTreeMap<String, MapInstance<E::Container>>,
    pub(crate) map_index: BTreeMap<MapHandle, String>,
    pub(crate) marker_index: BTreeMap<MarkerHandle, MarkerKey>,
    pub(crate) cluster_index: BTreeMap<ClusterHandle, String>,
    marker_ids: MarkerIdAllocator,
    pub(crate) bus: NotificationBus,
}

impl<E: MapEngine> MapBridge<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            maps: BTreeMap::new(),
            map_index: BTreeMap::new(),
            marker_index: BTreeMap::new(),
            cluster_index: BTreeMap::new(),
            marker_ids: MarkerIdAllocator::new(),
            bus: NotificationBus::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub(crate) fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Number of live map instances.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Looks up a live instance by id.
    pub fn lookup(&self, id: &str) -> Result<&MapInstance<E::Container>, BridgeError> {
        self.maps
            .get(id)
            .ok_or_else(|| BridgeError::UnknownIdentifier(id.to_string()))
    }

    pub(crate) fn lookup_mut(
        &mut self,
        id: &str,
    ) -> Result<&mut MapInstance<E::Container>, BridgeError> {
        self.maps
            .get_mut(id)
            .ok_or_else(|| BridgeError::UnknownIdentifier(id.to_string()))
    }

    /// Creates a new map instance bound to `container`.
    ///
    /// Ensures the engine library is loaded first (idempotent across calls;
    /// a load failure leaves `create` retryable), attaches the default
    /// listener set, and emits `onMapReady`. A duplicate live id is
    /// rejected: overwriting would leak the previous instance's
    /// subscriptions and engine objects.
    pub fn create(
        &mut self,
        id: impl Into<String>,
        container: E::Container,
        config: &MapConfig,
        api_key: &str,
    ) -> Result<(), BridgeError> {
        let id = id.into();
        if self.maps.contains_key(&id) {
            return Err(BridgeError::DuplicateIdentifier(id));
        }

        self.engine.ensure_loaded(api_key)?;
        let map = self.engine.create_map(&container, config)?;

        let mut instance = MapInstance {
            id: id.clone(),
            container,
            map,
            markers: BTreeMap::new(),
            subscriptions: Vec::new(),
            clusterer: None,
            traffic: None,
        };
        for kind in [
            MapEventKind::Idle,
            MapEventKind::CenterChanged,
            MapEventKind::Click,
        ] {
            instance.subscriptions.push(self.engine.subscribe_map(map, kind));
        }

        self.map_index.insert(map, id.clone());
        self.maps.insert(id.clone(), instance);
        self.bus.emit(Notification::MapReady { map_id: id });
        Ok(())
    }

    /// Destroys a map instance.
    ///
    /// Releases every retained subscription, removes every owned marker,
    /// detaches clusterer and traffic overlay, clears the container, and
    /// deletes all index rows. No notification can be emitted for this id
    /// afterwards.
    pub fn destroy(&mut self, id: &str) -> Result<(), BridgeError> {
        let Some(mut instance) = self.maps.remove(id) else {
            return Err(BridgeError::UnknownIdentifier(id.to_string()));
        };

        if let Some(cluster) = instance.clusterer.take() {
            self.engine.unsubscribe(cluster.subscription);
            self.engine.detach_clusterer(cluster.handle);
            self.cluster_index.remove(&cluster.handle);
        }
        if let Some(traffic) = instance.traffic.take() {
            if traffic.enabled {
                self.engine.set_overlay_map(traffic.overlay, None);
            }
            // The overlay object is retained across toggles, so it must be
            // released here even when currently disabled.
            self.engine.destroy_overlay(traffic.overlay);
        }
        for (_, marker) in std::mem::take(&mut instance.markers) {
            self.engine.unsubscribe(marker.subscription);
            self.engine.remove_marker(marker.handle);
            self.marker_index.remove(&marker.handle);
        }
        for subscription in instance.subscriptions.drain(..) {
            self.engine.unsubscribe(subscription);
        }

        self.map_index.remove(&instance.map);
        self.engine.destroy_map(instance.map, &instance.container);
        Ok(())
    }

    /// Applies center/bearing/tilt/zoom without animation.
    pub fn set_camera(&mut self, id: &str, camera: &CameraConfig) -> Result<(), BridgeError> {
        let map = self.lookup(id)?.map;
        self.engine.move_camera(map, camera);
        Ok(())
    }

    pub fn set_map_type(&mut self, id: &str, map_type: MapType) -> Result<(), BridgeError> {
        let map = self.lookup(id)?.map;
        self.engine.set_map_type(map, map_type);
        Ok(())
    }

    /// Re-fits the current visible bounds with the given padding.
    ///
    /// No-op when the engine has not computed bounds yet.
    pub fn set_padding(&mut self, id: &str, padding: Padding) -> Result<(), BridgeError> {
        let map = self.lookup(id)?.map;
        if let Some(bounds) = self.engine.visible_bounds(map) {
            self.engine.fit_bounds(map, bounds, padding);
        }
        Ok(())
    }

    /// Toggles the traffic overlay.
    ///
    /// The overlay object is created lazily on first enable and its handle
    /// retained across toggles for reuse.
    pub fn enable_traffic_layer(&mut self, id: &str, enabled: bool) -> Result<(), BridgeError> {
        let instance = self
            .maps
            .get_mut(id)
            .ok_or_else(|| BridgeError::UnknownIdentifier(id.to_string()))?;
        if enabled {
            let overlay = match &instance.traffic {
                Some(traffic) => traffic.overlay,
                None => self.engine.create_traffic_overlay()?,
            };
            self.engine.set_overlay_map(overlay, Some(instance.map));
            instance.traffic = Some(TrafficState {
                overlay,
                enabled: true,
            });
        } else if let Some(traffic) = &mut instance.traffic {
            self.engine.set_overlay_map(traffic.overlay, None);
            traffic.enabled = false;
        }
        Ok(())
    }

    /// Adds one marker; see `add_markers` for the batch form.
    pub fn add_marker(&mut self, id: &str, spec: &MarkerSpec) -> Result<String, BridgeError> {
        self.insert_marker(id, spec)
    }

    /// Adds markers, allocating one id per spec in input order.
    pub fn add_markers(
        &mut self,
        id: &str,
        specs: &[MarkerSpec],
    ) -> Result<Vec<String>, BridgeError> {
        specs.iter().map(|spec| self.insert_marker(id, spec)).collect()
    }

    fn insert_marker(&mut self, id: &str, spec: &MarkerSpec) -> Result<String, BridgeError> {
        let instance = self
            .maps
            .get_mut(id)
            .ok_or_else(|| BridgeError::UnknownIdentifier(id.to_string()))?;
        let handle = self.engine.create_marker(instance.map, spec)?;
        let subscription = self.engine.subscribe_marker(handle);
        let marker_id = self.marker_ids.next_id();
        self.marker_index.insert(
            handle,
            MarkerKey {
                map_id: id.to_string(),
                marker_id: marker_id.clone(),
            },
        );
        instance.markers.insert(
            marker_id.clone(),
            MarkerInstance {
                id: marker_id.clone(),
                handle,
                subscription,
            },
        );
        Ok(marker_id)
    }

    /// Removes one marker, releasing its listener and engine object.
    pub fn remove_marker(&mut self, id: &str, marker_id: &str) -> Result<(), BridgeError> {
        let instance = self
            .maps
            .get_mut(id)
            .ok_or_else(|| BridgeError::UnknownIdentifier(id.to_string()))?;
        let Some(marker) = instance.markers.remove(marker_id) else {
            return Err(BridgeError::UnknownIdentifier(marker_id.to_string()));
        };
        // A marker removed while clustering is active also leaves the
        // snapshot: the clusterer no longer renders it.
        if let Some(cluster) = &mut instance.clusterer {
            cluster.snapshot.remove(&marker.handle);
        }
        self.engine.unsubscribe(marker.subscription);
        self.engine.remove_marker(marker.handle);
        self.marker_index.remove(&marker.handle);
        Ok(())
    }

    pub fn remove_markers(&mut self, id: &str, marker_ids: &[String]) -> Result<(), BridgeError> {
        for marker_id in marker_ids {
            self.remove_marker(id, marker_id)?;
        }
        Ok(())
    }

    /// One-shot geolocation: recenter + location notifications on success,
    /// an `onError` notification on asynchronous failure.
    pub fn enable_current_location(
        &mut self,
        id: &str,
        enabled: bool,
    ) -> Result<(), BridgeError> {
        let map = self.lookup(id)?.map;
        if !enabled {
            return Ok(());
        }
        if !self.engine.supports_geolocation() {
            return Err(BridgeError::GeolocationUnavailable);
        }
        self.engine.request_location(map);
        Ok(())
    }

    pub fn enable_indoor_maps(&mut self, _id: &str, _enabled: bool) -> Result<(), BridgeError> {
        Err(BridgeError::UnsupportedOperation("indoor maps"))
    }

    pub fn enable_accessibility_elements(
        &mut self,
        _id: &str,
        _enabled: bool,
    ) -> Result<(), BridgeError> {
        Err(BridgeError::UnsupportedOperation("accessibility elements"))
    }

    pub fn on_scroll(&mut self, _id: &str, _delta: ScrollDelta) -> Result<(), BridgeError> {
        Err(BridgeError::UnsupportedOperation("scroll interception"))
    }
}

#[cfg(test)]
mod tests {
    use foundation::{LatLng, Padding};

    use crate::config::{CameraConfig, MapConfig, MapType, MarkerSpec, ScrollDelta};
    use crate::error::BridgeError;
    use crate::fake::FakeEngine;
    use crate::registry::MapBridge;

    fn bridge() -> MapBridge<FakeEngine> {
        MapBridge::new(FakeEngine::new())
    }

    fn spec(lat: f64, lng: f64) -> MarkerSpec {
        MarkerSpec {
            coordinate: LatLng::new(lat, lng),
            ..MarkerSpec::default()
        }
    }

    #[test]
    fn create_emits_map_ready() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        let notifications = b.pump();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].name(), "onMapReady");
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        let err = b.create("m1", (), &MapConfig::default(), "key").unwrap_err();
        assert_eq!(err, BridgeError::DuplicateIdentifier("m1".into()));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn create_is_retryable_after_engine_load_failure() {
        let mut b = bridge();
        b.engine_mut().fail_load = true;
        let err = b.create("m1", (), &MapConfig::default(), "key").unwrap_err();
        assert!(matches!(err, BridgeError::EngineLoadFailure(_)));
        assert!(b.is_empty());

        b.engine_mut().fail_load = false;
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn destroying_every_map_returns_the_registry_to_empty() {
        let mut b = bridge();
        b.create("a", (), &MapConfig::default(), "key").unwrap();
        b.create("b", (), &MapConfig::default(), "key").unwrap();
        b.add_marker("a", &spec(1.0, 2.0)).unwrap();
        b.enable_clustering("a").unwrap();
        b.enable_traffic_layer("b", true).unwrap();

        b.destroy("a").unwrap();
        b.destroy("b").unwrap();
        assert!(b.is_empty());
        assert!(b.engine().subscriptions.is_empty());
        assert!(b.engine().live_markers.is_empty());
        assert!(b.engine().live_overlays.is_empty());
        assert!(b.engine().live_maps.is_empty());
    }

    #[test]
    fn destroy_releases_a_disabled_traffic_overlay() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        b.enable_traffic_layer("m1", true).unwrap();
        b.enable_traffic_layer("m1", false).unwrap();
        b.destroy("m1").unwrap();
        assert!(b.engine().live_overlays.is_empty());
    }

    #[test]
    fn destroy_unknown_map_fails() {
        let mut b = bridge();
        assert_eq!(
            b.destroy("nope").unwrap_err(),
            BridgeError::UnknownIdentifier("nope".into())
        );
    }

    #[test]
    fn lookup_fails_after_destroy() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        b.destroy("m1").unwrap();
        assert_eq!(
            b.lookup("m1").unwrap_err(),
            BridgeError::UnknownIdentifier("m1".into())
        );
    }

    #[test]
    fn marker_ids_increase_across_maps() {
        let mut b = bridge();
        b.create("a", (), &MapConfig::default(), "key").unwrap();
        b.create("b", (), &MapConfig::default(), "key").unwrap();
        let first = b.add_marker("a", &spec(1.0, 2.0)).unwrap();
        let second = b.add_marker("b", &spec(3.0, 4.0)).unwrap();
        let third = b.add_marker("a", &spec(5.0, 6.0)).unwrap();
        assert_eq!(first, "0");
        assert_eq!(second, "1");
        assert_eq!(third, "2");
    }

    #[test]
    fn add_markers_preserves_input_order() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        let ids = b
            .add_markers("m1", &[spec(1.0, 2.0), spec(3.0, 4.0)])
            .unwrap();
        assert_eq!(ids, vec!["0".to_string(), "1".to_string()]);

        let instance = b.lookup("m1").unwrap();
        assert!(instance.markers.contains_key("0"));
        assert!(instance.markers.contains_key("1"));
    }

    #[test]
    fn remove_marker_unknown_id_leaves_the_set_unchanged() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        b.add_marker("m1", &spec(1.0, 2.0)).unwrap();
        let err = b.remove_marker("m1", "99").unwrap_err();
        assert_eq!(err, BridgeError::UnknownIdentifier("99".into()));
        assert_eq!(b.lookup("m1").unwrap().markers.len(), 1);
    }

    #[test]
    fn remove_marker_releases_listener_and_engine_object() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        let id = b.add_marker("m1", &spec(1.0, 2.0)).unwrap();
        b.remove_marker("m1", &id).unwrap();
        assert!(b.engine().live_markers.is_empty());
        assert!(b.lookup("m1").unwrap().markers.is_empty());
    }

    #[test]
    fn remove_markers_batch() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        let ids = b
            .add_markers("m1", &[spec(1.0, 2.0), spec(3.0, 4.0), spec(5.0, 6.0)])
            .unwrap();
        b.remove_markers("m1", &ids[..2]).unwrap();
        let instance = b.lookup("m1").unwrap();
        assert_eq!(instance.markers.len(), 1);
        assert!(instance.markers.contains_key(&ids[2]));
    }

    #[test]
    fn set_camera_forwards_to_the_engine_without_animation() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        let camera = CameraConfig {
            coordinate: Some(LatLng::new(10.0, 20.0)),
            zoom: Some(8.0),
            ..CameraConfig::default()
        };
        b.set_camera("m1", &camera).unwrap();
        assert_eq!(b.engine().camera_moves.len(), 1);
        assert_eq!(b.engine().camera_moves[0].1, camera);
    }

    #[test]
    fn set_map_type_forwards_to_the_engine() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        b.set_map_type("m1", MapType::Satellite).unwrap();
        assert_eq!(b.engine().map_types.len(), 1);
        assert_eq!(b.engine().map_types[0].1, MapType::Satellite);
    }

    #[test]
    fn set_padding_is_a_noop_without_visible_bounds() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        b.set_padding("m1", Padding::default()).unwrap();
        assert!(b.engine().fit_calls.is_empty());
    }

    #[test]
    fn set_padding_refits_the_current_bounds() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        b.engine_mut().bounds = Some(crate::fake::bounds((0.0, 0.0), (1.0, 1.0)));
        let padding = Padding {
            top: 10.0,
            ..Padding::default()
        };
        b.set_padding("m1", padding).unwrap();
        assert_eq!(b.engine().fit_calls.len(), 1);
        assert_eq!(b.engine().fit_calls[0].2, padding);
    }

    #[test]
    fn traffic_overlay_is_created_once_and_reused() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        b.enable_traffic_layer("m1", true).unwrap();
        b.enable_traffic_layer("m1", false).unwrap();
        b.enable_traffic_layer("m1", true).unwrap();
        assert_eq!(b.engine().overlays_created, 1);

        let attachments = &b.engine().overlay_attachments;
        assert_eq!(attachments.len(), 3);
        assert!(attachments[0].1.is_some());
        assert!(attachments[1].1.is_none());
        assert!(attachments[2].1.is_some());
    }

    #[test]
    fn disabling_traffic_before_enabling_is_a_noop() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        b.enable_traffic_layer("m1", false).unwrap();
        assert_eq!(b.engine().overlays_created, 0);
        assert!(b.engine().overlay_attachments.is_empty());
    }

    #[test]
    fn unsupported_operations_fail_synchronously() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        assert!(matches!(
            b.on_scroll("m1", ScrollDelta::default()),
            Err(BridgeError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            b.enable_indoor_maps("m1", true),
            Err(BridgeError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            b.enable_accessibility_elements("m1", true),
            Err(BridgeError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn current_location_without_capability_fails() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        assert_eq!(
            b.enable_current_location("m1", true).unwrap_err(),
            BridgeError::GeolocationUnavailable
        );
    }

    #[test]
    fn current_location_issues_a_single_one_shot_query() {
        let mut b = bridge();
        b.engine_mut().geolocation = true;
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        b.enable_current_location("m1", true).unwrap();
        assert_eq!(b.engine().location_requests.len(), 1);
    }

    #[test]
    fn disabling_current_location_succeeds_without_engine_interaction() {
        let mut b = bridge();
        b.create("m1", (), &MapConfig::default(), "key").unwrap();
        b.enable_current_location("m1", false).unwrap();
        assert!(b.engine().location_requests.is_empty());
    }

    #[test]
    fn commands_against_unknown_maps_fail() {
        let mut b = bridge();
        let unknown = BridgeError::UnknownIdentifier("m1".into());
        assert_eq!(b.set_camera("m1", &CameraConfig::default()), Err(unknown.clone()));
        assert_eq!(b.set_map_type("m1", MapType::Normal), Err(unknown.clone()));
        assert_eq!(b.set_padding("m1", Padding::default()), Err(unknown.clone()));
        assert_eq!(b.enable_traffic_layer("m1", true), Err(unknown.clone()));
        assert_eq!(b.add_marker("m1", &spec(0.0, 0.0)), Err(unknown.clone()));
        assert_eq!(b.remove_marker("m1", "0"), Err(unknown.clone()));
        assert_eq!(b.enable_clustering("m1"), Err(unknown.clone()));
        assert_eq!(b.disable_clustering("m1"), Err(unknown.clone()));
        assert_eq!(b.enable_current_location("m1", true), Err(unknown));
    }
}
