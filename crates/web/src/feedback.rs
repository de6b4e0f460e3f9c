//! Alert banners and button loading state

use gloo::timers::callback::Timeout;
use std::time::Duration;
use tracing::debug;
use web_sys::Element;

/// How long an alert stays visible unless told otherwise
pub const DEFAULT_ALERT_DURATION: Duration = Duration::from_secs(5);

/// Attribute holding a button's markup to restore after loading
pub const ORIGINAL_TEXT_ATTR: &str = "data-original-text";

const HIDDEN_CLASS: &str = "d-none";

const SPINNER_MARKUP: &str = r#"
    <span class="spinner-border spinner-border-sm" role="status" aria-hidden="true"></span>
    <span class="ms-1">Processing...</span>
"#;

/// Bootstrap alert variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AlertKind {
    #[default]
    Danger,
    Warning,
    Success,
    Info,
    Primary,
    Secondary,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Danger => "danger",
            AlertKind::Warning => "warning",
            AlertKind::Success => "success",
            AlertKind::Info => "info",
            AlertKind::Primary => "primary",
            AlertKind::Secondary => "secondary",
        }
    }
}

fn element_by_id(id: &str) -> Option<Element> {
    web_sys::window()?.document()?.get_element_by_id(id)
}

/// Show `message` in the alert element `element_id`, hiding it again after
/// `duration`. Missing elements are ignored.
pub fn show_alert(element_id: &str, message: &str, kind: AlertKind, duration: Option<Duration>) {
    let Some(element) = element_by_id(element_id) else {
        debug!(element_id, "Alert element not found");
        return;
    };

    element.set_text_content(Some(message));
    element.set_class_name(&format!("alert alert-{}", kind.as_str()));
    let _ = element.class_list().remove_1(HIDDEN_CLASS);

    if let Some(duration) = duration.filter(|d| !d.is_zero()) {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        Timeout::new(millis, move || {
            let _ = element.class_list().add_1(HIDDEN_CLASS);
        })
        .forget();
    }
}

/// Store the button's current markup so [`show_loading`] can restore it
pub fn remember_original_text(button: &Element) {
    if !button.has_attribute(ORIGINAL_TEXT_ATTR) {
        let _ = button.set_attribute(ORIGINAL_TEXT_ATTR, &button.inner_html());
    }
}

/// Toggle a button between its normal and loading state
pub fn show_loading(button: &Element, is_loading: bool) {
    if is_loading {
        let _ = button.set_attribute("disabled", "disabled");
        button.set_inner_html(SPINNER_MARKUP);
    } else {
        let _ = button.remove_attribute("disabled");
        if let Some(original) = button.get_attribute(ORIGINAL_TEXT_ATTR) {
            button.set_inner_html(&original);
        }
    }
}

/// [`show_loading`] for a button looked up by id
pub fn show_loading_by_id(button_id: &str, is_loading: bool) {
    if let Some(button) = element_by_id(button_id) {
        show_loading(&button, is_loading);
    }
}
