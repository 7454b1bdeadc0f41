use crate::engine::{ClusterMember, EngineEvent, MapEngine};
use crate::notify::{ClusterItem, Notification};
use crate::registry::MapBridge;

/// Event normalization: engine-native callbacks in, platform-neutral
/// notifications out.
///
/// Engine events carry opaque handles; translation resolves them through
/// the bridge's reverse indices. An event whose handle matches no live
/// instance is stale (the engine delivered after `destroy` released the
/// subscriptions) and is dropped, preserving the guarantee that a destroyed
/// id emits nothing further.
impl<E: MapEngine> MapBridge<E> {
    /// Drains queued engine events, translates them, and returns every
    /// notification produced since the last pump (including ones emitted by
    /// synchronous commands, e.g. `onMapReady`).
    pub fn pump(&mut self) -> Vec<Notification> {
        for event in self.engine_mut().take_events() {
            self.dispatch(event);
        }
        self.bus.drain()
    }

    /// Translates one engine event into zero or more notifications.
    ///
    /// Public so hosts and tests can inject simulated engine activity.
    pub fn dispatch(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::CameraIdle {
                map,
                bearing,
                position,
                tilt,
                zoom,
            } => {
                let Some(map_id) = self.map_index.get(&map).cloned() else {
                    return;
                };
                self.bus.emit(Notification::CameraIdle {
                    map_id,
                    bearing,
                    latitude: position.lat,
                    longitude: position.lng,
                    tilt,
                    zoom,
                });
            }
            EngineEvent::CameraMoveStarted { map } => {
                let Some(map_id) = self.map_index.get(&map).cloned() else {
                    return;
                };
                self.bus.emit(Notification::CameraMoveStarted {
                    map_id,
                    is_gesture: true,
                });
            }
            EngineEvent::MapClicked { map, position } => {
                let Some(map_id) = self.map_index.get(&map).cloned() else {
                    return;
                };
                self.bus.emit(Notification::MapClick {
                    map_id,
                    latitude: position.lat,
                    longitude: position.lng,
                });
            }
            EngineEvent::MarkerClicked {
                marker,
                position,
                title,
            } => {
                let Some(key) = self.marker_index.get(&marker).cloned() else {
                    return;
                };
                self.bus.emit(Notification::MarkerClick {
                    map_id: key.map_id,
                    marker_id: key.marker_id,
                    latitude: position.lat,
                    longitude: position.lng,
                    title: title.unwrap_or_default(),
                    snippet: String::new(),
                });
            }
            EngineEvent::ClusterClicked {
                cluster,
                position,
                members,
            } => {
                let Some(map_id) = self.cluster_index.get(&cluster).cloned() else {
                    return;
                };
                match self.cluster_items(&map_id, &members) {
                    Ok(items) => self.bus.emit(Notification::ClusterClick {
                        map_id,
                        latitude: position.lat,
                        longitude: position.lng,
                        size: items.len(),
                        items,
                    }),
                    Err(message) => self.bus.emit(Notification::Error { map_id, message }),
                }
            }
            EngineEvent::LocationResolved { map, position } => {
                if self.map_index.get(&map).is_none() {
                    return;
                }
                self.engine_mut().set_center(map, position);
                self.bus.emit(Notification::MyLocationButtonClick {});
                self.bus.emit(Notification::MyLocationClick {});
            }
            EngineEvent::LocationFailed { map, message } => {
                let Some(map_id) = self.map_index.get(&map).cloned() else {
                    return;
                };
                self.bus.emit(Notification::Error { map_id, message });
            }
        }
    }

    /// Resolves cluster members to structured items.
    ///
    /// Members outside the instance's snapshot are filtered: that is the
    /// snapshot policy working, not an error. A member inside the snapshot
    /// that no longer resolves in the marker index means the registry and
    /// the engine graph diverged, which aborts the whole cluster payload.
    fn cluster_items(
        &self,
        map_id: &str,
        members: &[ClusterMember],
    ) -> Result<Vec<ClusterItem>, String> {
        let snapshot = self
            .lookup(map_id)
            .ok()
            .and_then(|instance| instance.clusterer.as_ref())
            .map(|cluster| &cluster.snapshot);
        let Some(snapshot) = snapshot else {
            return Err("cluster click for a map without active clustering".to_string());
        };

        let mut items = Vec::new();
        for member in members {
            if !snapshot.contains(&member.marker) {
                continue;
            }
            let Some(key) = self.marker_index.get(&member.marker) else {
                return Err(format!(
                    "cluster member {:?} is in the snapshot but not in the marker index",
                    member.marker
                ));
            };
            items.push(ClusterItem {
                marker_id: key.marker_id.clone(),
                latitude: member.position.lat,
                longitude: member.position.lng,
                title: member.title.clone().unwrap_or_default(),
                snippet: String::new(),
            });
        }
        Ok(items)
    }
}
