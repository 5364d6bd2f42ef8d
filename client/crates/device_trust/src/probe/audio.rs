//! Audio stack probe
//!
//! Renders a silent triangle wave and digests the first processed buffer.
//! The callback races a timeout; whichever settles first wins.

use std::time::Duration;

use tokio::sync::oneshot;

use super::sentinel::{AUDIO_ERROR, AUDIO_TIMEOUT, NO_AUDIO_CONTEXT};
use crate::domain::host::{AudioGraph, BrowserHost};

/// Sum of absolute sample values, printed as a decimal
pub fn digest_samples(samples: &[f32]) -> String {
    let sum: f64 = samples.iter().map(|s| f64::from(s.abs())).sum();
    sum.to_string()
}

pub async fn audio_digest<H: BrowserHost + ?Sized>(host: &H, timeout: Duration) -> String {
    let mut context = match host.create_audio_context() {
        Ok(Some(context)) => context,
        Ok(None) => return NO_AUDIO_CONTEXT.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Audio context unavailable");
            return AUDIO_ERROR.to_string();
        }
    };

    let (tx, rx) = oneshot::channel();
    let on_process = Box::new(move |samples: Vec<f32>| {
        // The receiver is gone once the timeout has won
        let _ = tx.send(samples);
    });

    if let Err(e) = context.start(&AudioGraph::FINGERPRINT, on_process) {
        tracing::debug!(error = %e, "Audio graph failed to start");
        context.close();
        return AUDIO_ERROR.to_string();
    }

    let digest = match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(samples)) => digest_samples(&samples),
        Ok(Err(_)) => AUDIO_ERROR.to_string(),
        Err(_) => {
            tracing::debug!(timeout_ms = timeout.as_millis() as u64, "Audio probe timed out");
            AUDIO_TIMEOUT.to_string()
        }
    };

    context.close();
    digest
}
