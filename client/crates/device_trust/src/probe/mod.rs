//! Fingerprint Probes
//!
//! Each probe reads one capability of the [`BrowserHost`] and always
//! yields a string: either the signal itself or a sentinel naming why it
//! could not be taken.
//!
//! [`BrowserHost`]: crate::domain::host::BrowserHost

pub mod audio;
pub mod canvas;
pub mod environment;
pub mod fonts;
pub mod webgl;

/// Sentinel values substituted for unavailable signals
pub mod sentinel {
    pub const NO_CANVAS: &str = "no-canvas";
    pub const CANVAS_ERROR: &str = "canvas-error";
    pub const NO_WEBGL: &str = "no-webgl";
    pub const WEBGL_ERROR: &str = "webgl-error";
    pub const UNKNOWN_GPU: &str = "unknown|unknown";
    pub const NO_AUDIO_CONTEXT: &str = "no-audio-context";
    pub const AUDIO_TIMEOUT: &str = "audio-timeout";
    pub const AUDIO_ERROR: &str = "audio-error";
    pub const NO_FONTS: &str = "no-fonts";
    pub const UNKNOWN_TIMEZONE: &str = "unknown";
}
