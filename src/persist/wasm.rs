//! JS-backed key-value store for browser usage.

use js_sys::Function;
use wasm_bindgen::prelude::*;

use crate::persist::store::KeyValueStore;

/// Key-value store driven by caller-supplied JS functions.
///
/// The UI hands in thin wrappers over `localStorage` (or any compatible
/// storage) and the core owns every key decision. A `set` callback that
/// throws (e.g. quota exceeded) reports as a failed write.
///
/// # Example (JavaScript)
/// ```js
/// const store = new JsStore(
///   (k) => localStorage.getItem(k),
///   (k, v) => localStorage.setItem(k, v),
///   (k) => localStorage.removeItem(k),
/// );
/// const manager = new JsBuilderManager(store);
/// ```
#[wasm_bindgen]
pub struct JsStore {
    get_fn: Function,
    set_fn: Function,
    remove_fn: Function,
}

#[wasm_bindgen]
impl JsStore {
    /// Creates a store from get/set/remove functions.
    #[wasm_bindgen(constructor)]
    pub fn new(get: Function, set: Function, remove: Function) -> JsStore {
        JsStore {
            get_fn: get,
            set_fn: set,
            remove_fn: remove,
        }
    }
}

impl KeyValueStore for JsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.get_fn
            .call1(&JsValue::NULL, &JsValue::from_str(key))
            .ok()
            .and_then(|value| value.as_string())
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.set_fn
            .call2(
                &JsValue::NULL,
                &JsValue::from_str(key),
                &JsValue::from_str(value),
            )
            .is_ok()
    }

    fn remove(&mut self, key: &str) {
        let _ = self.remove_fn.call1(&JsValue::NULL, &JsValue::from_str(key));
    }
}
