//! Script-tag loader for the Google Maps JS API.
//!
//! Injection is idempotent: once the namespace is present the loader is a
//! no-op, so repeated `create` calls never stack script tags.

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use bridge::BridgeError;

use crate::engine::engine_loaded;

const READY_CALLBACK: &str = "__bridgeMapsReady";

pub(crate) async fn ensure_engine(api_key: &str) -> Result<(), BridgeError> {
    if engine_loaded() {
        return Ok(());
    }
    let pending = inject_script(api_key)
        .map_err(|err| BridgeError::EngineLoadFailure(format!("script injection failed: {err:?}")))?;
    JsFuture::from(pending)
        .await
        .map_err(|err| BridgeError::EngineLoadFailure(format!("maps script failed to load: {err:?}")))?;
    web_sys::console::log_1(&JsValue::from_str("Loaded google maps API"));
    Ok(())
}

/// Injects the API script and resolves once its `callback=` fires.
fn inject_script(api_key: &str) -> Result<Promise, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window object"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document object"))?;
    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no head"))?;
    let src = format!("https://maps.googleapis.com/maps/api/js?key={api_key}&callback={READY_CALLBACK}");

    Ok(Promise::new(&mut |resolve: Function, reject: Function| {
        let attach = (|| -> Result<(), JsValue> {
            Reflect::set(window.as_ref(), &JsValue::from_str(READY_CALLBACK), &resolve)?;
            let script: web_sys::HtmlScriptElement =
                document.create_element("script")?.dyn_into()?;
            script.set_src(&src);
            script.set_async(true);
            script.set_onerror(Some(&reject));
            head.append_child(&script)?;
            Ok(())
        })();
        if let Err(err) = attach
            && let Err(err) = reject.call1(&JsValue::NULL, &err)
        {
            web_sys::console::log_1(&err);
        }
    }))
}
