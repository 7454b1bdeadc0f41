//! Browser plugin surface for the map bridge.
//!
//! The host page calls the exported command functions and registers one
//! event listener; notifications come back as `(name, payload)` pairs with
//! JSON payloads. All state lives in one thread-local bridge, so commands
//! never race listener delivery.

use std::cell::RefCell;

use console_error_panic_hook::set_once;
use js_sys::Function;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use bridge::{
    BridgeError, CameraConfig, MapBridge, MapConfig, MapType, MarkerSpec, ScrollDelta,
};
use foundation::Padding;

mod engine;
mod loader;

use engine::WebEngine;

struct PluginState {
    bridge: MapBridge<WebEngine>,
    listener: Option<Function>,
}

thread_local! {
    static STATE: RefCell<PluginState> = RefCell::new(PluginState {
        bridge: MapBridge::new(WebEngine::new()),
        listener: None,
    });
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Registers the notification listener; `None` detaches it.
#[wasm_bindgen]
pub fn set_event_listener(listener: Option<Function>) {
    STATE.with(|state| {
        state.borrow_mut().listener = listener;
    });
}

/// Defers a notification flush to the next microtask.
///
/// Engine callbacks run while a command may still hold the state borrow,
/// so they must never flush inline.
pub(crate) fn schedule_dispatch() {
    spawn_local(async {
        flush_notifications();
    });
}

fn flush_notifications() {
    let (listener, notifications) = STATE.with(|state| {
        let mut s = state.borrow_mut();
        let notifications = s.bridge.pump();
        (s.listener.clone(), notifications)
    });
    let Some(listener) = listener else {
        return;
    };
    for notification in notifications {
        let name = JsValue::from_str(notification.name());
        let payload = match to_js(&notification) {
            Ok(payload) => payload,
            Err(err) => {
                web_sys::console::log_1(&err);
                continue;
            }
        };
        if let Err(err) = listener.call2(&JsValue::NULL, &name, &payload) {
            web_sys::console::log_1(&err);
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(|err| JsValue::from_str(&err.to_string()))?;
    js_sys::JSON::parse(&json)
}

fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<T, JsValue> {
    let json = js_sys::JSON::stringify(value)?
        .as_string()
        .ok_or_else(|| JsValue::from_str("expected a JSON-serializable argument"))?;
    serde_json::from_str(&json).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn err_js(err: BridgeError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Runs one bridge command, then flushes whatever it queued.
fn with_bridge<R>(
    command: impl FnOnce(&mut MapBridge<WebEngine>) -> Result<R, BridgeError>,
) -> Result<R, JsValue> {
    let result = STATE.with(|state| command(&mut state.borrow_mut().bridge));
    flush_notifications();
    result.map_err(err_js)
}

#[wasm_bindgen]
pub async fn create(
    map_id: String,
    element: web_sys::Element,
    config: JsValue,
    api_key: String,
) -> Result<(), JsValue> {
    let config: MapConfig = from_js(&config)?;
    loader::ensure_engine(&api_key).await.map_err(err_js)?;
    with_bridge(|bridge| bridge.create(map_id, element, &config, &api_key))
}

#[wasm_bindgen]
pub fn destroy(map_id: String) -> Result<(), JsValue> {
    with_bridge(|bridge| bridge.destroy(&map_id))
}

#[wasm_bindgen]
pub fn set_camera(map_id: String, config: JsValue) -> Result<(), JsValue> {
    let camera: CameraConfig = from_js(&config)?;
    with_bridge(|bridge| bridge.set_camera(&map_id, &camera))
}

#[wasm_bindgen]
pub fn set_map_type(map_id: String, map_type: String) -> Result<(), JsValue> {
    let map_type: MapType = from_js(&JsValue::from_str(&map_type))?;
    with_bridge(|bridge| bridge.set_map_type(&map_id, map_type))
}

#[wasm_bindgen]
pub fn set_padding(map_id: String, config: JsValue) -> Result<(), JsValue> {
    let padding: Padding = from_js(&config)?;
    with_bridge(|bridge| bridge.set_padding(&map_id, padding))
}

#[wasm_bindgen]
pub fn enable_traffic_layer(map_id: String, enabled: bool) -> Result<(), JsValue> {
    with_bridge(|bridge| bridge.enable_traffic_layer(&map_id, enabled))
}

#[wasm_bindgen]
pub fn enable_clustering(map_id: String) -> Result<(), JsValue> {
    with_bridge(|bridge| bridge.enable_clustering(&map_id))
}

#[wasm_bindgen]
pub fn disable_clustering(map_id: String) -> Result<(), JsValue> {
    with_bridge(|bridge| bridge.disable_clustering(&map_id))
}

/// Adds one marker; resolves to `{"id": "..."}`.
#[wasm_bindgen]
pub fn add_marker(map_id: String, marker: JsValue) -> Result<JsValue, JsValue> {
    let spec: MarkerSpec = from_js(&marker)?;
    let id = with_bridge(|bridge| bridge.add_marker(&map_id, &spec))?;
    to_js(&serde_json::json!({ "id": id }))
}

/// Adds markers in order; resolves to `{"ids": [...]}`.
#[wasm_bindgen]
pub fn add_markers(map_id: String, markers: JsValue) -> Result<JsValue, JsValue> {
    let specs: Vec<MarkerSpec> = from_js(&markers)?;
    let ids = with_bridge(|bridge| bridge.add_markers(&map_id, &specs))?;
    to_js(&serde_json::json!({ "ids": ids }))
}

#[wasm_bindgen]
pub fn remove_marker(map_id: String, marker_id: String) -> Result<(), JsValue> {
    with_bridge(|bridge| bridge.remove_marker(&map_id, &marker_id))
}

#[wasm_bindgen]
pub fn remove_markers(map_id: String, marker_ids: JsValue) -> Result<(), JsValue> {
    let marker_ids: Vec<String> = from_js(&marker_ids)?;
    with_bridge(|bridge| bridge.remove_markers(&map_id, &marker_ids))
}

#[wasm_bindgen]
pub fn enable_current_location(map_id: String, enabled: bool) -> Result<(), JsValue> {
    with_bridge(|bridge| bridge.enable_current_location(&map_id, enabled))
}

#[wasm_bindgen]
pub fn enable_indoor_maps(map_id: String, enabled: bool) -> Result<(), JsValue> {
    with_bridge(|bridge| bridge.enable_indoor_maps(&map_id, enabled))
}

#[wasm_bindgen]
pub fn enable_accessibility_elements(map_id: String, enabled: bool) -> Result<(), JsValue> {
    with_bridge(|bridge| bridge.enable_accessibility_elements(&map_id, enabled))
}

#[wasm_bindgen]
pub fn on_scroll(map_id: String, delta: JsValue) -> Result<(), JsValue> {
    let delta: ScrollDelta = from_js(&delta)?;
    with_bridge(|bridge| bridge.on_scroll(&map_id, delta))
}
