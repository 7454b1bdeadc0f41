//! `MapEngine` implementation over the Google Maps JS API.
//!
//! All interop goes through `js_sys::Reflect`, so the engine namespace is
//! only touched at runtime after the loader has injected it. Engine objects
//! live in handle-keyed tables; callbacks queue `EngineEvent`s and defer
//! dispatch to the next microtask, which keeps the bridge free of
//! re-entrant borrows.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use bridge::{
    BridgeError, CameraConfig, ClusterHandle, ClusterMember, EngineEvent, MapConfig, MapEngine,
    MapEventKind, MapHandle, MapType, MarkerHandle, MarkerSpec, OverlayHandle, Subscription,
    SubscriptionId,
};
use foundation::{GeoBounds, LatLng, Padding};

/// Property stamped onto every engine marker object so cluster callbacks can
/// resolve members back to handles without scanning.
const MARKER_HANDLE_PROP: &str = "__bridgeMarkerHandle";

fn js_key(key: &str) -> JsValue {
    JsValue::from_str(key)
}

fn js_error(context: &str, err: &JsValue) -> BridgeError {
    BridgeError::InternalConsistency(format!("{context}: {err:?}"))
}

fn log_interop_failure(context: &str, err: &JsValue) {
    web_sys::console::log_1(&JsValue::from_str(&format!(
        "map engine interop failed ({context}): {err:?}"
    )));
}

/// Invokes a method on a JS object.
fn invoke(target: &JsValue, method: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
    let function: Function = Reflect::get(target, &js_key(method))?
        .dyn_into()
        .map_err(|_| JsValue::from_str(&format!("{method} is not a function")))?;
    let arguments = Array::new();
    for arg in args {
        arguments.push(arg);
    }
    Reflect::apply(&function, target, &arguments)
}

fn call_number(target: &JsValue, method: &str) -> f64 {
    invoke(target, method, &[])
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0)
}

/// Reads a `google.maps.LatLng` (an object with `lat()`/`lng()` methods).
fn latlng_of(value: &JsValue) -> Option<LatLng> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    let lat = invoke(value, "lat", &[]).ok()?.as_f64()?;
    let lng = invoke(value, "lng", &[]).ok()?.as_f64()?;
    Some(LatLng::new(lat, lng))
}

/// Builds a `{lat, lng}` literal.
fn latlng_literal(position: LatLng) -> Result<JsValue, JsValue> {
    let literal = Object::new();
    Reflect::set(&literal, &js_key("lat"), &JsValue::from_f64(position.lat))?;
    Reflect::set(&literal, &js_key("lng"), &JsValue::from_f64(position.lng))?;
    Ok(literal.into())
}

fn padding_literal(padding: Padding) -> Result<JsValue, JsValue> {
    let literal = Object::new();
    Reflect::set(&literal, &js_key("top"), &JsValue::from_f64(padding.top))?;
    Reflect::set(&literal, &js_key("left"), &JsValue::from_f64(padding.left))?;
    Reflect::set(&literal, &js_key("right"), &JsValue::from_f64(padding.right))?;
    Reflect::set(&literal, &js_key("bottom"), &JsValue::from_f64(padding.bottom))?;
    Ok(literal.into())
}

/// The `google.maps` namespace, present only after the loader ran.
fn maps_namespace() -> Result<JsValue, BridgeError> {
    let window = web_sys::window()
        .ok_or_else(|| BridgeError::EngineLoadFailure("no window object".to_string()))?;
    let google = Reflect::get(window.as_ref(), &js_key("google"))
        .map_err(|err| js_error("window.google", &err))?;
    if google.is_undefined() {
        return Err(BridgeError::EngineLoadFailure(
            "google maps namespace is not present".to_string(),
        ));
    }
    let maps = Reflect::get(&google, &js_key("maps"))
        .map_err(|err| js_error("google.maps", &err))?;
    if maps.is_undefined() {
        return Err(BridgeError::EngineLoadFailure(
            "google maps namespace is not present".to_string(),
        ));
    }
    Ok(maps)
}

pub(crate) fn engine_loaded() -> bool {
    maps_namespace().is_ok()
}

fn engine_constructor(name: &str) -> Result<Function, BridgeError> {
    let maps = maps_namespace()?;
    Reflect::get(&maps, &js_key(name))
        .map_err(|err| js_error(name, &err))?
        .dyn_into()
        .map_err(|_| BridgeError::EngineLoadFailure(format!("google.maps.{name} is missing")))
}

/// Closures retained for the lifetime of a listener registration.
enum RetainedClosure {
    Unary(Closure<dyn FnMut(JsValue)>),
    Ternary(Closure<dyn FnMut(JsValue, JsValue, JsValue)>),
}

impl RetainedClosure {
    fn function(&self) -> &JsValue {
        match self {
            RetainedClosure::Unary(closure) => closure.as_ref(),
            RetainedClosure::Ternary(closure) => closure.as_ref(),
        }
    }
}

struct ListenerRegistration {
    /// Engine-side `MapsEventListener`, when the engine handed one out.
    remover: Option<JsValue>,
    _closure: RetainedClosure,
}

/// Callback pairs retained per outstanding geolocation query.
struct GeoCallbacks {
    _success: Closure<dyn FnMut(JsValue)>,
    _failure: Closure<dyn FnMut(JsValue)>,
}

/// Retains one-shot request state until the request reports back.
///
/// A callback must not drop itself while it is executing, so firing only
/// marks the request finished through the shared flag; the entry is dropped
/// on the next `prune`, which runs after the callback has returned.
struct RequestTable<T> {
    entries: HashMap<u64, T>,
    finished: Rc<RefCell<Vec<u64>>>,
}

impl<T> RequestTable<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            finished: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn retain(&mut self, request: u64, entry: T) {
        self.entries.insert(request, entry);
    }

    /// Shared flag a callback pushes its request id onto when it fires.
    fn finish_flag(&self) -> Rc<RefCell<Vec<u64>>> {
        Rc::clone(&self.finished)
    }

    fn prune(&mut self) {
        for request in self.finished.borrow_mut().drain(..) {
            self.entries.remove(&request);
        }
    }
}

pub struct WebEngine {
    next_handle: u64,
    maps: HashMap<u64, JsValue>,
    markers: HashMap<u64, JsValue>,
    overlays: HashMap<u64, JsValue>,
    clusterers: HashMap<u64, JsValue>,
    /// Cluster click closures created at construction time, claimed by the
    /// matching `subscribe_cluster` call.
    pending_cluster_closures: HashMap<u64, RetainedClosure>,
    listeners: HashMap<u64, ListenerRegistration>,
    /// Outstanding geolocation queries, dropped once they report back.
    geo_requests: RequestTable<GeoCallbacks>,
    queue: Rc<RefCell<Vec<EngineEvent>>>,
}

impl WebEngine {
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            maps: HashMap::new(),
            markers: HashMap::new(),
            overlays: HashMap::new(),
            clusterers: HashMap::new(),
            pending_cluster_closures: HashMap::new(),
            listeners: HashMap::new(),
            geo_requests: RequestTable::new(),
            queue: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn push_event(queue: &Rc<RefCell<Vec<EngineEvent>>>, event: EngineEvent) {
        queue.borrow_mut().push(event);
        crate::schedule_dispatch();
    }

    fn register_listener(
        &mut self,
        target: &JsValue,
        event: &str,
        closure: RetainedClosure,
    ) -> Subscription {
        let id = self.handle();
        let remover = match invoke(target, "addListener", &[&js_key(event), closure.function()]) {
            Ok(listener) => Some(listener),
            Err(err) => {
                log_interop_failure("addListener", &err);
                None
            }
        };
        self.listeners.insert(
            id,
            ListenerRegistration {
                remover,
                _closure: closure,
            },
        );
        Subscription(SubscriptionId(id))
    }

    fn marker_member(marker: &JsValue) -> Option<ClusterMember> {
        let handle = Reflect::get(marker, &js_key(MARKER_HANDLE_PROP))
            .ok()?
            .as_f64()? as u64;
        let position = invoke(marker, "getPosition", &[])
            .ok()
            .and_then(|value| latlng_of(&value))
            .unwrap_or_default();
        let title = invoke(marker, "getTitle", &[])
            .ok()
            .and_then(|value| value.as_string());
        Some(ClusterMember {
            marker: MarkerHandle(handle),
            position,
            title,
        })
    }
}

impl Default for WebEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MapEngine for WebEngine {
    type Container = web_sys::Element;

    fn ensure_loaded(&mut self, _api_key: &str) -> Result<(), BridgeError> {
        // The script injection itself is asynchronous and happens in
        // `loader::ensure_engine` before any command reaches the bridge;
        // here we only verify the namespace actually arrived.
        maps_namespace().map(|_| ())
    }

    fn create_map(
        &mut self,
        container: &Self::Container,
        config: &MapConfig,
    ) -> Result<MapHandle, BridgeError> {
        let constructor = engine_constructor("Map")?;
        let options = Object::new();
        let build = (|| -> Result<(), JsValue> {
            if let Some(center) = config.center {
                Reflect::set(&options, &js_key("center"), &latlng_literal(center)?)?;
            }
            if let Some(zoom) = config.zoom {
                Reflect::set(&options, &js_key("zoom"), &JsValue::from_f64(zoom))?;
            }
            Ok(())
        })();
        build.map_err(|err| js_error("map options", &err))?;

        let arguments = Array::of2(container.as_ref(), options.as_ref());
        let map = Reflect::construct(&constructor, &arguments)
            .map_err(|err| js_error("new google.maps.Map", &err))?;
        let h = self.handle();
        self.maps.insert(h, map.into());
        Ok(MapHandle(h))
    }

    fn destroy_map(&mut self, map: MapHandle, container: &Self::Container) {
        container.set_inner_html("");
        if let Some(map_js) = self.maps.remove(&map.0)
            && let Err(err) = invoke(&map_js, "unbindAll", &[])
        {
            log_interop_failure("unbindAll", &err);
        }
    }

    fn subscribe_map(&mut self, map: MapHandle, kind: MapEventKind) -> Subscription {
        let Some(map_js) = self.maps.get(&map.0).cloned() else {
            let id = self.handle();
            return Subscription(SubscriptionId(id));
        };
        let queue = Rc::clone(&self.queue);
        let (event, closure): (&str, Closure<dyn FnMut(JsValue)>) = match kind {
            MapEventKind::Idle => {
                let target = map_js.clone();
                ("idle", Closure::new(move |_event: JsValue| {
                    let position = invoke(&target, "getCenter", &[])
                        .ok()
                        .and_then(|value| latlng_of(&value))
                        .unwrap_or_default();
                    Self::push_event(&queue, EngineEvent::CameraIdle {
                        map,
                        bearing: call_number(&target, "getHeading"),
                        position,
                        tilt: call_number(&target, "getTilt"),
                        zoom: call_number(&target, "getZoom"),
                    });
                }))
            }
            MapEventKind::CenterChanged => ("center_changed", Closure::new(move |_event: JsValue| {
                Self::push_event(&queue, EngineEvent::CameraMoveStarted { map });
            })),
            MapEventKind::Click => ("click", Closure::new(move |event: JsValue| {
                let position = Reflect::get(&event, &js_key("latLng"))
                    .ok()
                    .and_then(|value| latlng_of(&value))
                    .unwrap_or_default();
                Self::push_event(&queue, EngineEvent::MapClicked { map, position });
            })),
        };
        self.register_listener(&map_js, event, RetainedClosure::Unary(closure))
    }

    fn subscribe_marker(&mut self, marker: MarkerHandle) -> Subscription {
        let Some(marker_js) = self.markers.get(&marker.0).cloned() else {
            let id = self.handle();
            return Subscription(SubscriptionId(id));
        };
        let queue = Rc::clone(&self.queue);
        let target = marker_js.clone();
        let closure: Closure<dyn FnMut(JsValue)> = Closure::new(move |_event: JsValue| {
            let position = invoke(&target, "getPosition", &[])
                .ok()
                .and_then(|value| latlng_of(&value))
                .unwrap_or_default();
            let title = invoke(&target, "getTitle", &[])
                .ok()
                .and_then(|value| value.as_string());
            Self::push_event(&queue, EngineEvent::MarkerClicked {
                marker,
                position,
                title,
            });
        });
        self.register_listener(&marker_js, "click", RetainedClosure::Unary(closure))
    }

    fn subscribe_cluster(&mut self, cluster: ClusterHandle) -> Subscription {
        // The click closure was wired into the clusterer's options at
        // construction; this claims it as a releasable registration.
        let id = self.handle();
        if let Some(closure) = self.pending_cluster_closures.remove(&cluster.0) {
            self.listeners.insert(
                id,
                ListenerRegistration {
                    remover: None,
                    _closure: closure,
                },
            );
        }
        Subscription(SubscriptionId(id))
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        let Some(registration) = self.listeners.remove(&subscription.0.0) else {
            return;
        };
        if let Some(remover) = registration.remover
            && let Err(err) = invoke(&remover, "remove", &[])
        {
            log_interop_failure("listener remove", &err);
        }
    }

    fn move_camera(&mut self, map: MapHandle, camera: &CameraConfig) {
        let Some(map_js) = self.maps.get(&map.0) else {
            return;
        };
        let result = (|| -> Result<(), JsValue> {
            let options = Object::new();
            if let Some(coordinate) = camera.coordinate {
                Reflect::set(&options, &js_key("center"), &latlng_literal(coordinate)?)?;
            }
            if let Some(bearing) = camera.bearing {
                Reflect::set(&options, &js_key("heading"), &JsValue::from_f64(bearing))?;
            }
            if let Some(angle) = camera.angle {
                Reflect::set(&options, &js_key("tilt"), &JsValue::from_f64(angle))?;
            }
            if let Some(zoom) = camera.zoom {
                Reflect::set(&options, &js_key("zoom"), &JsValue::from_f64(zoom))?;
            }
            invoke(map_js, "moveCamera", &[options.as_ref()])?;
            Ok(())
        })();
        if let Err(err) = result {
            log_interop_failure("moveCamera", &err);
        }
    }

    fn set_map_type(&mut self, map: MapHandle, map_type: MapType) {
        let Some(map_js) = self.maps.get(&map.0) else {
            return;
        };
        if let Err(err) = invoke(map_js, "setMapTypeId", &[&js_key(map_type.engine_id())]) {
            log_interop_failure("setMapTypeId", &err);
        }
    }

    fn set_center(&mut self, map: MapHandle, center: LatLng) {
        let Some(map_js) = self.maps.get(&map.0) else {
            return;
        };
        let result = latlng_literal(center)
            .and_then(|literal| invoke(map_js, "setCenter", &[&literal]));
        if let Err(err) = result {
            log_interop_failure("setCenter", &err);
        }
    }

    fn visible_bounds(&self, map: MapHandle) -> Option<GeoBounds> {
        let map_js = self.maps.get(&map.0)?;
        let bounds = invoke(map_js, "getBounds", &[]).ok()?;
        if bounds.is_undefined() || bounds.is_null() {
            return None;
        }
        let southwest = latlng_of(&invoke(&bounds, "getSouthWest", &[]).ok()?)?;
        let northeast = latlng_of(&invoke(&bounds, "getNorthEast", &[]).ok()?)?;
        Some(GeoBounds::new(southwest, northeast))
    }

    fn fit_bounds(&mut self, map: MapHandle, bounds: GeoBounds, padding: Padding) {
        let Some(map_js) = self.maps.get(&map.0).cloned() else {
            return;
        };
        let result = (|| -> Result<(), JsValue> {
            let constructor = engine_constructor("LatLngBounds")
                .map_err(|err| JsValue::from_str(&err.to_string()))?;
            let arguments = Array::of2(
                &latlng_literal(bounds.southwest)?,
                &latlng_literal(bounds.northeast)?,
            );
            let bounds_js = Reflect::construct(&constructor, &arguments)?;
            invoke(&map_js, "fitBounds", &[&bounds_js, &padding_literal(padding)?])?;
            Ok(())
        })();
        if let Err(err) = result {
            log_interop_failure("fitBounds", &err);
        }
    }

    fn create_marker(
        &mut self,
        map: MapHandle,
        spec: &MarkerSpec,
    ) -> Result<MarkerHandle, BridgeError> {
        let map_js = self
            .maps
            .get(&map.0)
            .cloned()
            .ok_or_else(|| BridgeError::InternalConsistency("marker for a dead map".to_string()))?;
        let constructor = engine_constructor("Marker")?;
        let h = self.handle();

        let build = (|| -> Result<JsValue, JsValue> {
            let options = Object::new();
            Reflect::set(&options, &js_key("position"), &latlng_literal(spec.coordinate)?)?;
            Reflect::set(&options, &js_key("map"), &map_js)?;
            if let Some(opacity) = spec.opacity {
                Reflect::set(&options, &js_key("opacity"), &JsValue::from_f64(opacity))?;
            }
            if let Some(title) = &spec.title {
                Reflect::set(&options, &js_key("title"), &js_key(title))?;
            }
            if let Some(icon_url) = &spec.icon_url {
                Reflect::set(&options, &js_key("icon"), &js_key(icon_url))?;
            }
            Reflect::set(&options, &js_key("draggable"), &JsValue::from_bool(spec.draggable))?;

            let marker = Reflect::construct(&constructor, &Array::of1(options.as_ref()))?;
            Reflect::set(&marker, &js_key(MARKER_HANDLE_PROP), &JsValue::from_f64(h as f64))?;
            Ok(marker.into())
        })();
        let marker = build.map_err(|err| js_error("new google.maps.Marker", &err))?;
        self.markers.insert(h, marker);
        Ok(MarkerHandle(h))
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        if let Some(marker_js) = self.markers.remove(&marker.0)
            && let Err(err) = invoke(&marker_js, "setMap", &[&JsValue::NULL])
        {
            log_interop_failure("marker setMap(null)", &err);
        }
    }

    fn create_traffic_overlay(&mut self) -> Result<OverlayHandle, BridgeError> {
        let constructor = engine_constructor("TrafficLayer")?;
        let overlay = Reflect::construct(&constructor, &Array::new())
            .map_err(|err| js_error("new google.maps.TrafficLayer", &err))?;
        let h = self.handle();
        self.overlays.insert(h, overlay);
        Ok(OverlayHandle(h))
    }

    fn set_overlay_map(&mut self, overlay: OverlayHandle, map: Option<MapHandle>) {
        let Some(overlay_js) = self.overlays.get(&overlay.0) else {
            return;
        };
        let target = map
            .and_then(|m| self.maps.get(&m.0).cloned())
            .unwrap_or(JsValue::NULL);
        if let Err(err) = invoke(overlay_js, "setMap", &[&target]) {
            log_interop_failure("overlay setMap", &err);
        }
    }

    fn destroy_overlay(&mut self, overlay: OverlayHandle) {
        if let Some(overlay_js) = self.overlays.remove(&overlay.0)
            && let Err(err) = invoke(&overlay_js, "setMap", &[&JsValue::NULL])
        {
            log_interop_failure("overlay release", &err);
        }
    }

    fn create_clusterer(
        &mut self,
        map: MapHandle,
        markers: &[MarkerHandle],
    ) -> Result<ClusterHandle, BridgeError> {
        let map_js = self
            .maps
            .get(&map.0)
            .cloned()
            .ok_or_else(|| BridgeError::InternalConsistency("clusterer for a dead map".to_string()))?;

        // The clusterer comes from the @googlemaps/markerclusterer UMD
        // bundle, which the host page loads alongside this module.
        let window = web_sys::window()
            .ok_or_else(|| BridgeError::EngineLoadFailure("no window object".to_string()))?;
        let namespace = Reflect::get(window.as_ref(), &js_key("markerClusterer"))
            .map_err(|err| js_error("window.markerClusterer", &err))?;
        let constructor: Function = Reflect::get(&namespace, &js_key("MarkerClusterer"))
            .map_err(|err| js_error("MarkerClusterer", &err))?
            .dyn_into()
            .map_err(|_| {
                BridgeError::InternalConsistency(
                    "marker clusterer library is not loaded".to_string(),
                )
            })?;

        let h = self.handle();
        let handle = ClusterHandle(h);
        let queue = Rc::clone(&self.queue);
        let on_click: Closure<dyn FnMut(JsValue, JsValue, JsValue)> =
            Closure::new(move |_event: JsValue, cluster: JsValue, _map: JsValue| {
                let position = Reflect::get(&cluster, &js_key("position"))
                    .ok()
                    .and_then(|value| latlng_of(&value))
                    .unwrap_or_default();
                let members = Reflect::get(&cluster, &js_key("markers"))
                    .ok()
                    .map(|markers| {
                        Array::from(&markers)
                            .iter()
                            .filter_map(|marker| Self::marker_member(&marker))
                            .collect()
                    })
                    .unwrap_or_default();
                Self::push_event(&queue, EngineEvent::ClusterClicked {
                    cluster: handle,
                    position,
                    members,
                });
            });

        let build = (|| -> Result<JsValue, JsValue> {
            let marker_array = Array::new();
            for marker in markers {
                if let Some(marker_js) = self.markers.get(&marker.0) {
                    marker_array.push(marker_js);
                }
            }
            let options = Object::new();
            Reflect::set(&options, &js_key("map"), &map_js)?;
            Reflect::set(&options, &js_key("markers"), &marker_array)?;
            Reflect::set(&options, &js_key("onClusterClick"), on_click.as_ref())?;
            Reflect::construct(&constructor, &Array::of1(options.as_ref())).map(Into::into)
        })();
        let clusterer = build.map_err(|err| js_error("new MarkerClusterer", &err))?;

        self.clusterers.insert(h, clusterer);
        self.pending_cluster_closures
            .insert(h, RetainedClosure::Ternary(on_click));
        Ok(handle)
    }

    fn detach_clusterer(&mut self, cluster: ClusterHandle) {
        self.pending_cluster_closures.remove(&cluster.0);
        if let Some(clusterer_js) = self.clusterers.remove(&cluster.0)
            && let Err(err) = invoke(&clusterer_js, "setMap", &[&JsValue::NULL])
        {
            log_interop_failure("clusterer setMap(null)", &err);
        }
    }

    fn supports_geolocation(&self) -> bool {
        web_sys::window().is_some_and(|window| window.navigator().geolocation().is_ok())
    }

    fn request_location(&mut self, map: MapHandle) {
        let geolocation = web_sys::window().and_then(|window| window.navigator().geolocation().ok());
        let Some(geolocation) = geolocation else {
            Self::push_event(&self.queue, EngineEvent::LocationFailed {
                map,
                message: "geolocation is not available".to_string(),
            });
            return;
        };

        let request = self.handle();
        let queue = Rc::clone(&self.queue);
        let finished = self.geo_requests.finish_flag();
        let success: Closure<dyn FnMut(JsValue)> = Closure::new(move |position: JsValue| {
            finished.borrow_mut().push(request);
            let coords = Reflect::get(&position, &js_key("coords")).unwrap_or(JsValue::UNDEFINED);
            let lat = Reflect::get(&coords, &js_key("latitude"))
                .ok()
                .and_then(|value| value.as_f64());
            let lng = Reflect::get(&coords, &js_key("longitude"))
                .ok()
                .and_then(|value| value.as_f64());
            let event = match (lat, lng) {
                (Some(lat), Some(lng)) => EngineEvent::LocationResolved {
                    map,
                    position: LatLng::new(lat, lng),
                },
                _ => EngineEvent::LocationFailed {
                    map,
                    message: "malformed geolocation position".to_string(),
                },
            };
            Self::push_event(&queue, event);
        });

        let queue = Rc::clone(&self.queue);
        let finished = self.geo_requests.finish_flag();
        let failure: Closure<dyn FnMut(JsValue)> = Closure::new(move |err: JsValue| {
            finished.borrow_mut().push(request);
            let message = Reflect::get(&err, &js_key("message"))
                .ok()
                .and_then(|value| value.as_string())
                .unwrap_or_else(|| "geolocation query failed".to_string());
            Self::push_event(&queue, EngineEvent::LocationFailed { map, message });
        });

        let issued = geolocation.get_current_position_with_error_callback(
            success.as_ref().unchecked_ref(),
            Some(failure.as_ref().unchecked_ref()),
        );
        if issued.is_err() {
            Self::push_event(&self.queue, EngineEvent::LocationFailed {
                map,
                message: "geolocation query rejected".to_string(),
            });
            return;
        }
        self.geo_requests.retain(request, GeoCallbacks {
            _success: success,
            _failure: failure,
        });
    }

    fn take_events(&mut self) -> Vec<EngineEvent> {
        // Safe point to drop finished one-shot callbacks: never reached
        // from inside a callback invocation.
        self.geo_requests.prune();
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}
