//! Screen, plugin and locale probes

use super::sentinel::UNKNOWN_TIMEZONE;
use crate::domain::host::{BrowserHost, Navigator, Screen};

/// `WxHxDepth|AvailWxAvailH`
pub fn screen_signature(screen: &Screen) -> String {
    format!(
        "{}x{}x{}|{}x{}",
        screen.width, screen.height, screen.color_depth, screen.avail_width, screen.avail_height
    )
}

pub fn plugin_list(navigator: &Navigator) -> String {
    navigator.plugins.join(",")
}

pub fn timezone<H: BrowserHost + ?Sized>(host: &H) -> String {
    host.timezone()
        .filter(|tz| !tz.is_empty())
        .unwrap_or_else(|| UNKNOWN_TIMEZONE.to_string())
}
