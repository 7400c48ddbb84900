use chrono::{SecondsFormat, Utc};

pub const APP_NAME: &str = "jackblog_backend";

/// Fixed-width RFC 3339 timestamp, so lexical order matches time order.
pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn print_banner() {
    tracing::debug!(app = APP_NAME, version = env!("CARGO_PKG_VERSION"), "starting");
}
