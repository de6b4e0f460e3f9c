//! Browser tests, run with `wasm-pack test --headless --firefox crates/web`

#![cfg(target_arch = "wasm32")]

use foodsched_client::tokens::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use foodsched_client::{CookieJar, TokenStore};
use foodsched_web::feedback::{ORIGINAL_TEXT_ATTR, remember_original_text};
use foodsched_web::{
    AlertKind, DocumentCookieJar, LocalStorageStore, WebClient, show_alert, show_loading,
};
use std::sync::Arc;
use wasm_bindgen_test::*;
use web_sys::Element;

wasm_bindgen_test_configure!(run_in_browser);

fn browser_tokens() -> TokenStore {
    TokenStore::new(Arc::new(LocalStorageStore), Arc::new(DocumentCookieJar))
}

fn mount(tag: &str, id: &str) -> Element {
    let document = web_sys::window().unwrap().document().unwrap();
    if let Some(existing) = document.get_element_by_id(id) {
        existing.remove();
    }
    let element = document.create_element(tag).unwrap();
    element.set_id(id);
    document.body().unwrap().append_child(&element).unwrap();
    element
}

#[wasm_bindgen_test]
fn test_local_storage_round_trip() {
    let tokens = browser_tokens();
    tokens.set_tokens("a1", Some("r1"));

    let storage = web_sys::window().unwrap().local_storage().unwrap().unwrap();
    assert_eq!(
        storage.get_item(ACCESS_TOKEN_KEY).unwrap().as_deref(),
        Some("a1")
    );
    assert_eq!(tokens.get_refresh_token().as_deref(), Some("r1"));

    tokens.clear_tokens();
    assert_eq!(tokens.get_access_token(), None);
    assert_eq!(storage.get_item(REFRESH_TOKEN_KEY).unwrap(), None);
}

#[wasm_bindgen_test]
fn test_document_cookie_is_read_and_expired() {
    let jar = DocumentCookieJar;
    jar.write("access_token=from-backend; path=/");

    let tokens = browser_tokens();
    assert_eq!(
        tokens.get_from_cookie("access_token").as_deref(),
        Some("from-backend")
    );
    assert!(tokens.has_access_token());

    tokens.clear_tokens();
    assert_eq!(tokens.get_from_cookie("access_token"), None);
}

#[wasm_bindgen_test]
fn test_show_alert_sets_text_and_class() {
    let alert = mount("div", "login-alert");
    alert.set_class_name("alert d-none");

    show_alert("login-alert", "bad input", AlertKind::Warning, None);

    assert_eq!(alert.text_content().as_deref(), Some("bad input"));
    assert_eq!(alert.class_name(), "alert alert-warning");
    assert!(!alert.class_list().contains("d-none"));
}

#[wasm_bindgen_test]
fn test_show_alert_missing_element_is_ignored() {
    show_alert("no-such-element", "ignored", AlertKind::default(), None);
}

#[wasm_bindgen_test]
fn test_show_loading_restores_original_text() {
    let button = mount("button", "submit-button");
    button.set_inner_html("Log in");
    remember_original_text(&button);

    show_loading(&button, true);
    assert!(button.has_attribute("disabled"));
    assert!(button.inner_html().contains("spinner-border"));

    show_loading(&button, false);
    assert!(!button.has_attribute("disabled"));
    assert_eq!(button.inner_html(), "Log in");
    assert_eq!(
        button.get_attribute(ORIGINAL_TEXT_ATTR).as_deref(),
        Some("Log in")
    );
}

#[wasm_bindgen_test]
fn test_web_client_uses_page_origin() {
    let client = WebClient::for_current_origin().unwrap();
    let origin = web_sys::window().unwrap().location().origin().unwrap();
    assert_eq!(client.api.base_url(), origin.trim_end_matches('/'));
}
