//! Snapshot Browser Host
//!
//! Replays a recorded browser environment from JSON. Used by the CLI to
//! fingerprint a captured device and by tests as a configurable host.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::host::{
    AudioCallback, AudioContext, AudioGraph, BrowserHost, Canvas2d, GpuInfo, Navigator,
    ProbeError, Screen, WebGl,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasSnapshot {
    /// Data URL returned for any drawing
    pub data_url: String,
    /// Measured text widths keyed by CSS font string (`72px monospace`)
    pub text_widths: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebGlSnapshot {
    pub debug_info: Option<GpuInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioSnapshot {
    /// First processed buffer; `None` never calls back
    pub samples: Option<Vec<f32>>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostSnapshot {
    pub navigator: Navigator,
    pub screen: Screen,
    pub device_pixel_ratio: f64,
    pub timezone: Option<String>,
    pub touch_support: bool,
    /// Names of global objects present in the page
    pub globals: Vec<String>,
    pub canvas: Option<CanvasSnapshot>,
    pub webgl: Option<WebGlSnapshot>,
    pub audio: Option<AudioSnapshot>,
    pub devtools_open: bool,
}

impl Default for HostSnapshot {
    fn default() -> Self {
        Self {
            navigator: Navigator::default(),
            screen: Screen::default(),
            device_pixel_ratio: 1.0,
            timezone: None,
            touch_support: false,
            globals: Vec::new(),
            canvas: None,
            webgl: None,
            audio: None,
            devtools_open: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotHost {
    snapshot: HostSnapshot,
}

impl SnapshotHost {
    pub fn new(snapshot: HostSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    pub fn snapshot(&self) -> &HostSnapshot {
        &self.snapshot
    }
}

impl BrowserHost for SnapshotHost {
    fn navigator(&self) -> Navigator {
        self.snapshot.navigator.clone()
    }

    fn screen(&self) -> Screen {
        self.snapshot.screen
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.snapshot.device_pixel_ratio
    }

    fn timezone(&self) -> Option<String> {
        self.snapshot.timezone.clone()
    }

    fn touch_support(&self) -> bool {
        self.snapshot.touch_support
    }

    fn has_global(&self, name: &str) -> bool {
        self.snapshot.globals.iter().any(|g| g == name)
    }

    fn create_canvas(&self) -> Result<Option<Box<dyn Canvas2d>>, ProbeError> {
        Ok(self.snapshot.canvas.clone().map(|snapshot| {
            Box::new(SnapshotCanvas {
                snapshot,
                font: String::new(),
            }) as Box<dyn Canvas2d>
        }))
    }

    fn create_webgl(&self) -> Result<Option<Box<dyn WebGl>>, ProbeError> {
        Ok(self
            .snapshot
            .webgl
            .clone()
            .map(|snapshot| Box::new(snapshot) as Box<dyn WebGl>))
    }

    fn create_audio_context(&self) -> Result<Option<Box<dyn AudioContext>>, ProbeError> {
        Ok(self.snapshot.audio.clone().map(|snapshot| {
            Box::new(SnapshotAudio {
                snapshot,
                pending: None,
            }) as Box<dyn AudioContext>
        }))
    }

    fn inspect(&self, value: &dyn fmt::Display) {
        if self.snapshot.devtools_open {
            let rendered = value.to_string();
            tracing::trace!(len = rendered.len(), "Console formatted inspected value");
        }
    }
}

struct SnapshotCanvas {
    snapshot: CanvasSnapshot,
    font: String,
}

impl SnapshotCanvas {
    /// `72px 'Arial', monospace` falls back to `72px monospace`
    fn fallback_font(font: &str) -> Option<String> {
        let (size, families) = font.split_once(' ')?;
        let last = families.rsplit(',').next()?.trim();
        Some(format!("{size} {last}"))
    }
}

impl Canvas2d for SnapshotCanvas {
    fn resize(&mut self, _width: u32, _height: u32) {}
    fn set_text_baseline(&mut self, _baseline: &str) {}

    fn set_font(&mut self, font: &str) {
        self.font = font.to_string();
    }

    fn set_fill_style(&mut self, _style: &str) {}
    fn fill_rect(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) {}
    fn fill_text(&mut self, _text: &str, _x: f64, _y: f64) {}
    fn begin_path(&mut self) {}
    fn arc(&mut self, _x: f64, _y: f64, _radius: f64, _start: f64, _end: f64) {}
    fn stroke(&mut self) {}

    fn measure_text(&mut self, _text: &str) -> Result<f64, ProbeError> {
        let widths = &self.snapshot.text_widths;
        widths
            .get(&self.font)
            .or_else(|| Self::fallback_font(&self.font).and_then(|f| widths.get(&f)))
            .copied()
            .ok_or_else(|| ProbeError::Failed(format!("no width recorded for {}", self.font)))
    }

    fn to_data_url(&self) -> Result<String, ProbeError> {
        Ok(self.snapshot.data_url.clone())
    }
}

impl WebGl for WebGlSnapshot {
    fn debug_renderer_info(&self) -> Result<Option<GpuInfo>, ProbeError> {
        Ok(self.debug_info.clone())
    }
}

struct SnapshotAudio {
    snapshot: AudioSnapshot,
    /// Held open until close so the probe observes silence, not an error
    pending: Option<AudioCallback>,
}

impl AudioContext for SnapshotAudio {
    fn start(&mut self, graph: &AudioGraph, on_process: AudioCallback) -> Result<(), ProbeError> {
        tracing::trace!(
            waveform = graph.waveform,
            buffer_size = graph.buffer_size,
            "Replaying audio graph"
        );
        let Some(mut samples) = self.snapshot.samples.clone() else {
            self.pending = Some(on_process);
            return Ok(());
        };
        // The processor delivers one buffer of at most `buffer_size` frames
        samples.truncate(graph.buffer_size);

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ProbeError::Unsupported("audio rendering outside a runtime"))?;
        let latency = Duration::from_millis(self.snapshot.latency_ms);
        runtime.spawn(async move {
            tokio::time::sleep(latency).await;
            on_process(samples);
        });
        Ok(())
    }

    fn close(&mut self) {
        self.pending = None;
    }
}
