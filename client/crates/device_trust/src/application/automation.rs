//! Automation Detector
//!
//! Fixed battery of headless/automation heuristics. A single hit is common
//! on genuine browsers, so the verdict needs corroboration.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::entities::AutomationVerdict;
use crate::domain::host::BrowserHost;
use crate::domain::value_objects::AutomationSignal;
use crate::probe::webgl;

/// Globals injected by common automation frameworks
pub const AUTOMATION_GLOBALS: [&str; 6] = [
    "_phantom",
    "__nightmare",
    "_selenium",
    "callPhantom",
    "callSelenium",
    "_Selenium_IDE_Recorder",
];

pub const SOFTWARE_RENDERERS: [&str; 2] = ["SwiftShader", "llvmpipe"];

/// Records whether anything formatted it
#[derive(Default)]
struct StringifyTrap {
    formatted: AtomicBool,
}

impl fmt::Display for StringifyTrap {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.formatted.store(true, Ordering::Relaxed);
        Ok(())
    }
}

pub struct AutomationDetector<'a, H: ?Sized> {
    host: &'a H,
}

impl<'a, H: BrowserHost + ?Sized> AutomationDetector<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    pub fn detect(&self) -> AutomationVerdict {
        let navigator = self.host.navigator();
        let mut reasons = Vec::new();

        if navigator.webdriver {
            reasons.push(AutomationSignal::Webdriver);
        }

        reasons.extend(
            AUTOMATION_GLOBALS
                .into_iter()
                .filter(|name| self.host.has_global(name))
                .map(AutomationSignal::AutomationGlobal),
        );

        if navigator.user_agent.contains("Chrome") && !self.host.has_global("chrome") {
            reasons.push(AutomationSignal::FakeChrome);
        }

        if navigator.plugins.is_empty() {
            reasons.push(AutomationSignal::NoPlugins);
        }

        if webgl::renderer(self.host)
            .is_some_and(|renderer| SOFTWARE_RENDERERS.iter().any(|sw| renderer.contains(sw)))
        {
            reasons.push(AutomationSignal::SoftwareRenderer);
        }

        let trap = StringifyTrap::default();
        self.host.inspect(&trap);
        if trap.formatted.load(Ordering::Relaxed) {
            reasons.push(AutomationSignal::DevtoolsOpen);
        }

        let verdict = AutomationVerdict::from_reasons(reasons);
        if verdict.is_bot() {
            tracing::warn!(
                reasons = ?verdict.reasons().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
                "Automation detected"
            );
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::host::{GpuInfo, Navigator};
    use crate::infra::snapshot::{HostSnapshot, SnapshotHost, WebGlSnapshot};

    fn human() -> HostSnapshot {
        HostSnapshot {
            navigator: Navigator {
                user_agent: "Mozilla/5.0 (Windows NT 10.0) Chrome/120.0".into(),
                plugins: vec!["PDF Viewer".into()],
                ..Default::default()
            },
            globals: vec!["chrome".into()],
            webgl: Some(WebGlSnapshot {
                debug_info: Some(GpuInfo {
                    vendor: "Google Inc. (NVIDIA)".into(),
                    renderer: "ANGLE (NVIDIA GeForce RTX 3060)".into(),
                }),
            }),
            ..Default::default()
        }
    }

    fn detect(snapshot: HostSnapshot) -> AutomationVerdict {
        AutomationDetector::new(&SnapshotHost::new(snapshot)).detect()
    }

    #[test]
    fn test_clean_browser() {
        let verdict = detect(human());
        assert!(!verdict.is_bot());
        assert!(verdict.reasons().is_empty());
    }

    #[test]
    fn test_single_signal_is_not_bot() {
        let mut snapshot = human();
        snapshot.navigator.plugins.clear();
        let verdict = detect(snapshot);
        assert_eq!(verdict.reasons(), &[AutomationSignal::NoPlugins]);
        assert!(!verdict.is_bot());
    }

    #[test]
    fn test_headless_chrome() {
        let mut snapshot = human();
        snapshot.navigator.webdriver = true;
        snapshot.navigator.plugins.clear();
        snapshot.globals.clear();
        snapshot.webgl = Some(WebGlSnapshot {
            debug_info: Some(GpuInfo {
                vendor: "Google Inc.".into(),
                renderer: "Google SwiftShader".into(),
            }),
        });

        let verdict = detect(snapshot);
        assert!(verdict.is_bot());
        assert_eq!(
            verdict.reasons(),
            &[
                AutomationSignal::Webdriver,
                AutomationSignal::FakeChrome,
                AutomationSignal::NoPlugins,
                AutomationSignal::SoftwareRenderer,
            ]
        );
    }

    #[test]
    fn test_automation_globals_in_order() {
        let mut snapshot = human();
        snapshot.globals.extend(["callSelenium".into(), "_phantom".into()]);
        let verdict = detect(snapshot);
        assert_eq!(
            verdict.reasons(),
            &[
                AutomationSignal::AutomationGlobal("_phantom"),
                AutomationSignal::AutomationGlobal("callSelenium"),
            ]
        );
        assert!(verdict.is_bot());
    }

    #[test]
    fn test_devtools_trap() {
        let mut snapshot = human();
        snapshot.devtools_open = true;
        let verdict = detect(snapshot);
        assert_eq!(verdict.reasons(), &[AutomationSignal::DevtoolsOpen]);
    }

    #[test]
    fn test_non_chrome_agent_without_chrome_global() {
        let mut snapshot = human();
        snapshot.navigator.user_agent = "Mozilla/5.0 Firefox/121.0".into();
        snapshot.globals.clear();
        assert!(detect(snapshot).reasons().is_empty());
    }
}
