//! Browser-backed token surfaces
//!
//! Both types look the window up on every call and hold no JS handles, so
//! they satisfy the `Send + Sync` bounds of the token store seams.

use foodsched_client::{CookieJar, KeyValueStore};
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, Storage};

fn local_storage() -> Option<Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

fn html_document() -> Option<HtmlDocument> {
    web_sys::window()?
        .document()?
        .dyn_into::<HtmlDocument>()
        .ok()
}

/// `window.localStorage`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        let Some(storage) = local_storage() else {
            warn!(key, "localStorage unavailable; value not stored");
            return;
        };
        if let Err(e) = storage.set_item(key, value) {
            warn!(key, error = ?e, "Failed to write localStorage");
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = local_storage()
            && let Err(e) = storage.remove_item(key)
        {
            warn!(key, error = ?e, "Failed to remove localStorage entry");
        }
    }
}

/// `document.cookie`
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentCookieJar;

impl CookieJar for DocumentCookieJar {
    fn cookie_header(&self) -> String {
        html_document()
            .and_then(|document| document.cookie().ok())
            .unwrap_or_default()
    }

    fn write(&self, directive: &str) {
        let Some(document) = html_document() else {
            warn!("document unavailable; cookie not written");
            return;
        };
        if let Err(e) = document.set_cookie(directive) {
            warn!(error = ?e, "Failed to write cookie");
        }
    }
}
