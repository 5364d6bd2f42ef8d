//! Canvas rendering probe

use std::f64::consts::TAU;

use super::sentinel::{CANVAS_ERROR, NO_CANVAS};
use crate::domain::host::{BrowserHost, Canvas2d, ProbeError};

/// Data URL of a fixed drawing
pub fn canvas_digest<H: BrowserHost + ?Sized>(host: &H) -> String {
    let mut canvas = match host.create_canvas() {
        Ok(Some(canvas)) => canvas,
        Ok(None) => return NO_CANVAS.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Canvas unavailable");
            return CANVAS_ERROR.to_string();
        }
    };

    match draw(canvas.as_mut()) {
        Ok(data_url) => data_url,
        Err(e) => {
            tracing::debug!(error = %e, "Canvas probe failed");
            CANVAS_ERROR.to_string()
        }
    }
}

fn draw(ctx: &mut dyn Canvas2d) -> Result<String, ProbeError> {
    ctx.resize(200, 50);

    ctx.set_text_baseline("top");
    ctx.set_font("14px 'Arial'");
    ctx.set_fill_style("#f60");
    ctx.fill_rect(125.0, 1.0, 62.0, 20.0);
    ctx.set_fill_style("#069");
    ctx.fill_text("Fingerprint", 2.0, 15.0);
    ctx.set_fill_style("rgba(102, 204, 0, 0.7)");
    ctx.fill_text("Canvas", 4.0, 17.0);

    ctx.begin_path();
    ctx.arc(50.0, 25.0, 20.0, 0.0, TAU);
    ctx.stroke();

    ctx.to_data_url()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::snapshot::{CanvasSnapshot, HostSnapshot, SnapshotHost};
    use std::sync::{Arc, Mutex};

    /// Records every drawing call
    struct RecordingCanvas {
        ops: Arc<Mutex<Vec<String>>>,
        fail_export: bool,
    }

    impl RecordingCanvas {
        fn push(&self, op: String) {
            self.ops.lock().unwrap().push(op);
        }
    }

    impl Canvas2d for RecordingCanvas {
        fn resize(&mut self, width: u32, height: u32) {
            self.push(format!("resize {width}x{height}"));
        }
        fn set_text_baseline(&mut self, baseline: &str) {
            self.push(format!("baseline {baseline}"));
        }
        fn set_font(&mut self, font: &str) {
            self.push(format!("font {font}"));
        }
        fn set_fill_style(&mut self, style: &str) {
            self.push(format!("fill {style}"));
        }
        fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
            self.push(format!("rect {x},{y},{width},{height}"));
        }
        fn fill_text(&mut self, text: &str, x: f64, y: f64) {
            self.push(format!("text {text} {x},{y}"));
        }
        fn begin_path(&mut self) {
            self.push("begin".to_string());
        }
        fn arc(&mut self, x: f64, y: f64, radius: f64, _start: f64, _end: f64) {
            self.push(format!("arc {x},{y},{radius}"));
        }
        fn stroke(&mut self) {
            self.push("stroke".to_string());
        }
        fn measure_text(&mut self, _text: &str) -> Result<f64, ProbeError> {
            Ok(0.0)
        }
        fn to_data_url(&self) -> Result<String, ProbeError> {
            if self.fail_export {
                Err(ProbeError::Failed("tainted".into()))
            } else {
                Ok("data:image/png;base64,recorded".to_string())
            }
        }
    }

    #[test]
    fn test_draws_fixed_scene() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let mut canvas = RecordingCanvas {
            ops: ops.clone(),
            fail_export: false,
        };

        let url = draw(&mut canvas).unwrap();
        assert_eq!(url, "data:image/png;base64,recorded");

        let ops = ops.lock().unwrap();
        assert_eq!(ops[0], "resize 200x50");
        assert!(ops.contains(&"font 14px 'Arial'".to_string()));
        assert!(ops.contains(&"rect 125,1,62,20".to_string()));
        assert!(ops.contains(&"text Fingerprint 2,15".to_string()));
        assert!(ops.contains(&"fill rgba(102, 204, 0, 0.7)".to_string()));
        assert!(ops.contains(&"text Canvas 4,17".to_string()));
        assert_eq!(ops.last().unwrap(), "stroke");
    }

    #[test]
    fn test_export_failure_is_sentinel() {
        let mut canvas = RecordingCanvas {
            ops: Arc::default(),
            fail_export: true,
        };
        assert!(draw(&mut canvas).is_err());
    }

    #[test]
    fn test_missing_canvas_is_sentinel() {
        let host = SnapshotHost::new(HostSnapshot::default());
        assert_eq!(canvas_digest(&host), NO_CANVAS);
    }

    #[test]
    fn test_snapshot_canvas_returns_data_url() {
        let host = SnapshotHost::new(HostSnapshot {
            canvas: Some(CanvasSnapshot {
                data_url: "data:image/png;base64,abc".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(canvas_digest(&host), "data:image/png;base64,abc");
    }
}
