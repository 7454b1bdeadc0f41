use crate::engine::{MapEngine, MarkerHandle};
use crate::error::BridgeError;
use crate::instance::ClusterState;
use crate::registry::MapBridge;

/// Per-instance clustering adapter.
///
/// Enabling clustering snapshots the instance's current marker set; markers
/// added later are not retroactively included until clustering is enabled
/// again. Disabling detaches the clusterer without touching the underlying
/// markers.
impl<E: MapEngine> MapBridge<E> {
    pub fn enable_clustering(&mut self, id: &str) -> Result<(), BridgeError> {
        let instance = self.lookup_mut(id)?;
        let handles: Vec<MarkerHandle> =
            instance.markers.values().map(|marker| marker.handle).collect();
        let map = instance.map;

        // Re-enabling replaces the previous clusterer and re-snapshots. The
        // new clusterer is built first, so a failed re-enable leaves the
        // previous clustering state intact.
        let cluster = self.engine_mut().create_clusterer(map, &handles)?;
        let subscription = self.engine_mut().subscribe_cluster(cluster);

        let instance = self.lookup_mut(id)?;
        if let Some(previous) = instance.clusterer.take() {
            self.engine_mut().unsubscribe(previous.subscription);
            self.engine_mut().detach_clusterer(previous.handle);
            self.cluster_index.remove(&previous.handle);
        }

        self.cluster_index.insert(cluster, id.to_string());
        self.lookup_mut(id)?.clusterer = Some(ClusterState {
            handle: cluster,
            subscription,
            snapshot: handles.into_iter().collect(),
        });
        Ok(())
    }

    pub fn disable_clustering(&mut self, id: &str) -> Result<(), BridgeError> {
        self.detach_cluster_state(id)
    }

    fn detach_cluster_state(&mut self, id: &str) -> Result<(), BridgeError> {
        let instance = self.lookup_mut(id)?;
        if let Some(cluster) = instance.clusterer.take() {
            self.engine_mut().unsubscribe(cluster.subscription);
            self.engine_mut().detach_clusterer(cluster.handle);
            self.cluster_index.remove(&cluster.handle);
        }
        Ok(())
    }
}
