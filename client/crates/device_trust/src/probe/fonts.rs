//! Installed font probe
//!
//! A font counts as installed when text rendered with it (falling back to a
//! generic family) measures differently from the generic family alone.

use super::sentinel::NO_FONTS;
use crate::domain::host::{BrowserHost, Canvas2d, ProbeError};

pub const CANDIDATE_FONTS: [&str; 10] = [
    "Arial",
    "Helvetica",
    "Times New Roman",
    "Georgia",
    "Verdana",
    "Courier New",
    "Comic Sans MS",
    "Impact",
    "Trebuchet MS",
    "Lucida Console",
];

pub const BASELINE_FONTS: [&str; 3] = ["monospace", "sans-serif", "serif"];

const TEST_STRING: &str = "mmmmmmmmmmlli";
const TEST_SIZE: &str = "72px";

fn text_width(canvas: &mut dyn Canvas2d, family: &str) -> Result<f64, ProbeError> {
    canvas.set_font(&format!("{TEST_SIZE} {family}"));
    canvas.measure_text(TEST_STRING)
}

/// Comma-joined installed candidate fonts
pub fn detected_fonts<H: BrowserHost + ?Sized>(host: &H) -> String {
    let mut canvas = match host.create_canvas() {
        Ok(Some(canvas)) => canvas,
        Ok(None) => return NO_FONTS.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Font probe has no canvas");
            return NO_FONTS.to_string();
        }
    };

    let baselines = match BASELINE_FONTS
        .iter()
        .map(|base| text_width(canvas.as_mut(), base))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(widths) => widths,
        Err(e) => {
            tracing::debug!(error = %e, "Font baseline measurement failed");
            return NO_FONTS.to_string();
        }
    };

    CANDIDATE_FONTS
        .iter()
        .enumerate()
        .filter(|&(i, font)| {
            let base = i % BASELINE_FONTS.len();
            let family = format!("'{font}', {}", BASELINE_FONTS[base]);
            text_width(canvas.as_mut(), &family).is_ok_and(|width| width != baselines[base])
        })
        .map(|(_, font)| *font)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::snapshot::{CanvasSnapshot, HostSnapshot, SnapshotHost};
    use std::collections::HashMap;

    fn host_with_widths(widths: &[(&str, f64)]) -> SnapshotHost {
        SnapshotHost::new(HostSnapshot {
            canvas: Some(CanvasSnapshot {
                data_url: String::new(),
                text_widths: widths
                    .iter()
                    .map(|(font, w)| (font.to_string(), *w))
                    .collect::<HashMap<_, _>>(),
            }),
            ..Default::default()
        })
    }

    #[test]
    fn test_detects_fonts_that_change_width() {
        let host = host_with_widths(&[
            ("72px monospace", 100.0),
            ("72px sans-serif", 90.0),
            ("72px serif", 80.0),
            // Arial falls back to monospace: differs, so installed
            ("72px 'Arial', monospace", 95.0),
            // Helvetica against sans-serif: identical, so missing
            ("72px 'Helvetica', sans-serif", 90.0),
            ("72px 'Verdana', sans-serif", 91.5),
        ]);

        assert_eq!(detected_fonts(&host), "Arial,Verdana");
    }

    #[test]
    fn test_no_candidates_installed() {
        let host = host_with_widths(&[
            ("72px monospace", 100.0),
            ("72px sans-serif", 90.0),
            ("72px serif", 80.0),
        ]);
        assert_eq!(detected_fonts(&host), "");
    }

    #[test]
    fn test_missing_baseline_is_sentinel() {
        let host = host_with_widths(&[("72px monospace", 100.0)]);
        assert_eq!(detected_fonts(&host), NO_FONTS);
    }

    #[test]
    fn test_no_canvas_is_sentinel() {
        let host = SnapshotHost::new(HostSnapshot::default());
        assert_eq!(detected_fonts(&host), NO_FONTS);
    }
}
