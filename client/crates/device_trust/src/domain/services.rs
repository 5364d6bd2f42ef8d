//! Domain Services
//!
//! Pure functions: canonical fingerprint hashing and remaining-time
//! formatting.

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

use super::entities::FingerprintComponents;
use super::value_objects::FingerprintHash;
use crate::error::TrustResult;

/// Largest integer a JavaScript number represents exactly
const JS_MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Stable subset of the components, in hashing order
///
/// `audio`, `userAgent`, `cookiesEnabled` and `doNotTrack` vary between
/// sessions on the same device and are left out.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StableComponents<'a> {
    canvas: &'a str,
    webgl: &'a str,
    screen: &'a str,
    timezone: &'a str,
    language: &'a str,
    platform: &'a str,
    hardware_concurrency: u32,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "js_number_opt"
    )]
    device_memory: Option<f64>,
    color_depth: u32,
    #[serde(serialize_with = "js_number")]
    pixel_ratio: f64,
    touch_support: bool,
    plugins: &'a str,
    fonts: &'a str,
}

/// Serialize a float the way `JSON.stringify` prints a number
fn js_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        serializer.serialize_unit()
    } else if value.fract() == 0.0 && value.abs() < JS_MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn js_number_opt<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => js_number(v, serializer),
        None => serializer.serialize_none(),
    }
}

fn char_prefix(value: &str, chars: usize) -> &str {
    match value.char_indices().nth(chars) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Canonical JSON of the stable components
pub fn canonical_json(
    components: &FingerprintComponents,
    canvas_prefix: usize,
) -> TrustResult<String> {
    let stable = StableComponents {
        canvas: char_prefix(&components.canvas, canvas_prefix),
        webgl: &components.webgl,
        screen: &components.screen,
        timezone: &components.timezone,
        language: &components.language,
        platform: &components.platform,
        hardware_concurrency: components.hardware_concurrency,
        device_memory: components.device_memory,
        color_depth: components.color_depth,
        pixel_ratio: components.pixel_ratio,
        touch_support: components.touch_support,
        plugins: &components.plugins,
        fonts: &components.fonts,
    };
    Ok(serde_json::to_string(&stable)?)
}

/// SHA-256 over the canonical JSON
pub fn fingerprint_hash(
    components: &FingerprintComponents,
    canvas_prefix: usize,
) -> TrustResult<FingerprintHash> {
    canonical_json(components, canvas_prefix).map(|json| FingerprintHash::digest(&json))
}

/// Human-readable time until a block lifts
///
/// Empty when there is no expiry, `vài giây` once it has passed, otherwise
/// whole minutes rounded up as `{h} giờ {m} phút`.
pub fn format_time_remaining(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(expires_at) = expires_at else {
        return String::new();
    };

    let remaining_ms = (expires_at - now).num_milliseconds();
    if remaining_ms <= 0 {
        return "vài giây".to_string();
    }

    let minutes = (remaining_ms + 59_999) / 60_000;
    format!("{} giờ {} phút", minutes / 60, minutes % 60)
}

/// Countdown display `M:SS`, floored to whole seconds
pub fn format_countdown(remaining: Duration) -> String {
    let seconds = remaining.num_seconds().max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
