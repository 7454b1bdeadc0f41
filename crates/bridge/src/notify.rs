use serde::Serialize;

/// One cluster-click item: a fixed structured record per member marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterItem {
    pub marker_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub snippet: String,
}

/// Platform-neutral notification vocabulary.
///
/// Field names match the wire payloads the host layer forwards to its
/// listeners (`mapId`, `latitude`, ...), so serializing a variant yields the
/// payload object directly; `name` supplies the event name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum Notification {
    MapReady {
        map_id: String,
    },
    CameraIdle {
        map_id: String,
        bearing: f64,
        latitude: f64,
        longitude: f64,
        tilt: f64,
        zoom: f64,
    },
    CameraMoveStarted {
        map_id: String,
        is_gesture: bool,
    },
    MapClick {
        map_id: String,
        latitude: f64,
        longitude: f64,
    },
    MarkerClick {
        map_id: String,
        marker_id: String,
        latitude: f64,
        longitude: f64,
        title: String,
        snippet: String,
    },
    ClusterClick {
        map_id: String,
        latitude: f64,
        longitude: f64,
        size: usize,
        items: Vec<ClusterItem>,
    },
    MyLocationButtonClick {},
    MyLocationClick {},
    /// Listener-level failure surfaced through the notification channel
    /// instead of being raised inside an unobserved callback.
    Error {
        map_id: String,
        message: String,
    },
}

impl Notification {
    /// The event name the host layer publishes this notification under.
    pub fn name(&self) -> &'static str {
        match self {
            Notification::MapReady { .. } => "onMapReady",
            Notification::CameraIdle { .. } => "onCameraIdle",
            Notification::CameraMoveStarted { .. } => "onCameraMoveStarted",
            Notification::MapClick { .. } => "onMapClick",
            Notification::MarkerClick { .. } => "onMarkerClick",
            Notification::ClusterClick { .. } => "onClusterClick",
            Notification::MyLocationButtonClick {} => "onMyLocationButtonClick",
            Notification::MyLocationClick {} => "onMyLocationClick",
            Notification::Error { .. } => "onError",
        }
    }
}

/// Fire-and-forget notification channel, drained by the host layer.
///
/// At-most-once per physical event: the bridge emits each translated engine
/// event exactly once, and nothing is re-queued.
#[derive(Debug, Default)]
pub struct NotificationBus {
    queue: Vec<Notification>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    pub fn emit(&mut self, notification: Notification) {
        self.queue.push(notification);
    }

    pub fn pending(&self) -> &[Notification] {
        &self.queue
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue)
    }
}
