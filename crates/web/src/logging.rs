//! Browser console logging

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;
use tracing_web::MakeWebConsoleWriter;

/// Route `tracing` output to the browser console and install the panic hook.
/// Calling it twice keeps the first subscriber.
pub fn init_logging(level: Level) {
    console_error_panic_hook::set_once();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new())
        .with_filter(LevelFilter::from_level(level));

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
