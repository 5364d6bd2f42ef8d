//! Build Fingerprint Use Case

use std::sync::Arc;

use chrono::Utc;

use super::automation::AutomationDetector;
use super::config::TrustConfig;
use crate::domain::entities::{DeviceFingerprint, FingerprintComponents};
use crate::domain::host::BrowserHost;
use crate::domain::services;
use crate::error::TrustResult;
use crate::probe::{audio, canvas, environment, fonts, webgl};

pub struct FingerprintBuilder<H: BrowserHost + ?Sized> {
    host: Arc<H>,
    config: Arc<TrustConfig>,
}

impl<H: BrowserHost + ?Sized> FingerprintBuilder<H> {
    pub fn new(host: Arc<H>, config: Arc<TrustConfig>) -> Self {
        Self { host, config }
    }

    /// Run every probe and hash the stable subset
    pub async fn build(&self) -> TrustResult<DeviceFingerprint> {
        let host = self.host.as_ref();

        let audio = audio::audio_digest(host, self.config.audio_probe_timeout).await;
        let navigator = host.navigator();
        let screen = host.screen();

        let components = FingerprintComponents {
            canvas: canvas::canvas_digest(host),
            webgl: webgl::gpu_signature(host),
            audio,
            screen: environment::screen_signature(&screen),
            timezone: environment::timezone(host),
            language: navigator.language.clone(),
            platform: navigator.platform.clone(),
            hardware_concurrency: navigator.hardware_concurrency.unwrap_or(0),
            device_memory: navigator.device_memory,
            user_agent: navigator.user_agent.clone(),
            color_depth: screen.color_depth,
            pixel_ratio: host.device_pixel_ratio(),
            touch_support: host.touch_support(),
            cookies_enabled: navigator.cookie_enabled,
            do_not_track: navigator.do_not_track.clone(),
            plugins: environment::plugin_list(&navigator),
            fonts: fonts::detected_fonts(host),
        };

        let hash = services::fingerprint_hash(&components, self.config.canvas_hash_prefix)?;
        let automation = AutomationDetector::new(host).detect();

        tracing::info!(
            fingerprint = %hash.short(),
            automation_detected = automation.is_bot(),
            "Device fingerprint generated"
        );

        Ok(DeviceFingerprint {
            hash,
            components,
            generated_at: Utc::now(),
            automation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::host::{Navigator, Screen};
    use crate::infra::snapshot::{AudioSnapshot, HostSnapshot, SnapshotHost};
    use crate::probe::sentinel;

    fn snapshot() -> HostSnapshot {
        HostSnapshot {
            navigator: Navigator {
                user_agent: "Mozilla/5.0 Firefox/121.0".into(),
                platform: "Linux x86_64".into(),
                language: "vi-VN".into(),
                hardware_concurrency: Some(4),
                cookie_enabled: true,
                plugins: vec!["PDF Viewer".into()],
                ..Default::default()
            },
            screen: Screen {
                width: 1366,
                height: 768,
                color_depth: 24,
                avail_width: 1366,
                avail_height: 738,
            },
            timezone: Some("Asia/Ho_Chi_Minh".into()),
            audio: Some(AudioSnapshot {
                samples: Some(vec![0.25; 4]),
                latency_ms: 10,
            }),
            ..Default::default()
        }
    }

    fn builder(snapshot: HostSnapshot) -> FingerprintBuilder<SnapshotHost> {
        FingerprintBuilder::new(
            Arc::new(SnapshotHost::new(snapshot)),
            Arc::new(TrustConfig::default()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_components_collected() {
        let fingerprint = builder(snapshot()).build().await.unwrap();
        let c = &fingerprint.components;

        assert_eq!(c.canvas, sentinel::NO_CANVAS);
        assert_eq!(c.webgl, sentinel::NO_WEBGL);
        assert_eq!(c.audio, "1");
        assert_eq!(c.screen, "1366x768x24|1366x738");
        assert_eq!(c.timezone, "Asia/Ho_Chi_Minh");
        assert_eq!(c.hardware_concurrency, 4);
        assert_eq!(c.plugins, "PDF Viewer");
        assert_eq!(c.fonts, sentinel::NO_FONTS);
        assert!(!fingerprint.automation_detected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hash_is_stable_across_volatile_signals() {
        let first = builder(snapshot()).build().await.unwrap();

        let mut changed = snapshot();
        changed.audio = None;
        changed.navigator.user_agent = "Mozilla/5.0 Firefox/122.0".into();
        let second = builder(changed).build().await.unwrap();

        assert_eq!(second.components.audio, sentinel::NO_AUDIO_CONTEXT);
        assert_eq!(first.hash, second.hash);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hash_changes_with_stable_signals() {
        let first = builder(snapshot()).build().await.unwrap();

        let mut changed = snapshot();
        changed.timezone = Some("Europe/Paris".into());
        let second = builder(changed).build().await.unwrap();

        assert_ne!(first.hash, second.hash);
    }
}
