use chrono::{DateTime, SecondsFormat};
use netmeter_core::BucketWindow;

pub fn format_timestamp_ms(timestamp_ms: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => timestamp_ms.to_string(),
    }
}

pub fn format_window(window: &BucketWindow) -> String {
    format!(
        "{} .. {}",
        format_timestamp_ms(window.start),
        format_timestamp_ms(window.end)
    )
}
