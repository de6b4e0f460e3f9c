//! Browser bindings for the Food Scheduler client
//!
//! Token surfaces backed by `localStorage` and `document.cookie`, page
//! feedback helpers, and the per-page [`WebClient`] bootstrap.

pub mod feedback;
pub mod logging;
pub mod session;
pub mod storage;

pub use feedback::{AlertKind, show_alert, show_loading};
pub use logging::init_logging;
pub use session::WebClient;
pub use storage::{DocumentCookieJar, LocalStorageStore};
