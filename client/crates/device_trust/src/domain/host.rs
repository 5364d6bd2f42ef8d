//! Browser Host Port
//!
//! Capabilities the fingerprint probes and the automation detector read
//! from the runtime environment. Every capability may be missing; probes
//! map `Ok(None)` and `Err(_)` to their own sentinels.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),

    #[error("Probe failed: {0}")]
    Failed(String),
}

/// Navigator properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Navigator {
    pub user_agent: String,
    pub platform: String,
    pub language: String,
    pub hardware_concurrency: Option<u32>,
    pub device_memory: Option<f64>,
    pub cookie_enabled: bool,
    pub do_not_track: Option<String>,
    pub webdriver: bool,
    /// Installed plugin names
    pub plugins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Screen {
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
    pub avail_width: u32,
    pub avail_height: u32,
}

/// Unmasked GPU identification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuInfo {
    pub vendor: String,
    pub renderer: String,
}

/// 2D drawing surface
pub trait Canvas2d: Send {
    fn resize(&mut self, width: u32, height: u32);
    fn set_text_baseline(&mut self, baseline: &str);
    fn set_font(&mut self, font: &str);
    fn set_fill_style(&mut self, style: &str);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn begin_path(&mut self);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64);
    fn stroke(&mut self);
    /// Rendered width of `text` in the current font
    fn measure_text(&mut self, text: &str) -> Result<f64, ProbeError>;
    fn to_data_url(&self) -> Result<String, ProbeError>;
}

/// WebGL context
pub trait WebGl: Send {
    /// `Ok(None)` when the debug renderer extension is not exposed
    fn debug_renderer_info(&self) -> Result<Option<GpuInfo>, ProbeError>;
}

/// Oscillator -> analyser -> processor -> gain -> destination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioGraph {
    /// Oscillator `type` (`"triangle"`)
    pub waveform: &'static str,
    pub buffer_size: usize,
    pub input_channels: u32,
    pub output_channels: u32,
    pub gain: f32,
}

impl AudioGraph {
    /// Silent triangle wave sampled through a 4096-frame processor
    pub const FINGERPRINT: AudioGraph = AudioGraph {
        waveform: "triangle",
        buffer_size: 4096,
        input_channels: 1,
        output_channels: 1,
        gain: 0.0,
    };
}

/// Receives the first processed channel buffer
pub type AudioCallback = Box<dyn FnOnce(Vec<f32>) + Send>;

pub trait AudioContext: Send {
    /// Start rendering `graph`; `on_process` fires at most once
    fn start(&mut self, graph: &AudioGraph, on_process: AudioCallback) -> Result<(), ProbeError>;
    fn close(&mut self);
}

/// The runtime environment a fingerprint is taken from
pub trait BrowserHost: Send + Sync {
    fn navigator(&self) -> Navigator;
    fn screen(&self) -> Screen;
    fn device_pixel_ratio(&self) -> f64;
    /// IANA timezone name, if resolvable
    fn timezone(&self) -> Option<String>;
    fn touch_support(&self) -> bool;
    /// Whether a named global object exists
    fn has_global(&self, name: &str) -> bool;
    fn create_canvas(&self) -> Result<Option<Box<dyn Canvas2d>>, ProbeError>;
    fn create_webgl(&self) -> Result<Option<Box<dyn WebGl>>, ProbeError>;
    fn create_audio_context(&self) -> Result<Option<Box<dyn AudioContext>>, ProbeError>;
    /// Hand a value to the developer console
    ///
    /// An open console formats the value; a closed one ignores it.
    fn inspect(&self, value: &dyn fmt::Display);
}
