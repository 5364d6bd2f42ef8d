//! Domain Value Objects
//!
//! Immutable value types for the device trust domain.

use std::fmt;

use platform::crypto::{is_sha256_hex, sha256_hex};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{TrustError, TrustResult};

/// SHA-256 device identifier, 64 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FingerprintHash(String);

impl FingerprintHash {
    pub fn new(value: impl Into<String>) -> TrustResult<Self> {
        let value = value.into();
        if is_sha256_hex(&value) {
            Ok(Self(value))
        } else {
            Err(TrustError::InvalidHash(value))
        }
    }

    /// Hash a canonical serialization
    pub fn digest(canonical: &str) -> Self {
        Self(sha256_hex(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, for log lines
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for FingerprintHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FingerprintHash {
    type Error = TrustError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FingerprintHash> for String {
    fn from(hash: FingerprintHash) -> Self {
        hash.0
    }
}

/// Heuristic humanness score, always within [-100, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct BehaviorScore(i32);

impl BehaviorScore {
    pub const MIN: i32 = -100;
    pub const MAX: i32 = 100;
    pub const NEUTRAL: BehaviorScore = BehaviorScore(0);

    /// Clamp a raw sum into range
    pub fn new(raw: i32) -> Self {
        Self(raw.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<BehaviorScore> for i32 {
    fn from(score: BehaviorScore) -> Self {
        score.0
    }
}

impl fmt::Display for BehaviorScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single reason the environment looks automated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutomationSignal {
    /// `navigator.webdriver` is set
    Webdriver,
    /// A known automation-framework global is present
    AutomationGlobal(&'static str),
    /// User agent claims Chrome but the `chrome` global is missing
    FakeChrome,
    NoPlugins,
    /// GPU renderer is a software rasterizer
    SoftwareRenderer,
    /// Developer tools stringified an inspected value
    DevtoolsOpen,
}

impl AutomationSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomationSignal::Webdriver => "webdriver",
            AutomationSignal::AutomationGlobal(name) => name,
            AutomationSignal::FakeChrome => "fake-chrome",
            AutomationSignal::NoPlugins => "no-plugins",
            AutomationSignal::SoftwareRenderer => "software-renderer",
            AutomationSignal::DevtoolsOpen => "devtools-open",
        }
    }
}

impl fmt::Display for AutomationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AutomationSignal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_hash_validation() {
        let valid = sha256_hex("device");
        let hash = FingerprintHash::new(valid.clone()).unwrap();
        assert_eq!(hash.as_str(), valid);
        assert_eq!(hash.short().len(), 12);

        assert!(matches!(
            FingerprintHash::new("not-a-hash"),
            Err(TrustError::InvalidHash(_))
        ));
        assert!(FingerprintHash::new(valid.to_uppercase()).is_err());
    }

    #[test]
    fn test_fingerprint_hash_serde_validates() {
        let hash = FingerprintHash::digest("x");
        let json = serde_json::to_string(&hash).unwrap();
        let back: FingerprintHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);

        assert!(serde_json::from_str::<FingerprintHash>(r#""abc""#).is_err());
    }

    #[test]
    fn test_behavior_score_clamps() {
        assert_eq!(BehaviorScore::new(-250).value(), -100);
        assert_eq!(BehaviorScore::new(250).value(), 100);
        assert_eq!(BehaviorScore::new(-30).value(), -30);
        assert_eq!(BehaviorScore::default(), BehaviorScore::NEUTRAL);
    }

    #[test]
    fn test_automation_signal_names() {
        assert_eq!(AutomationSignal::Webdriver.to_string(), "webdriver");
        assert_eq!(
            AutomationSignal::AutomationGlobal("_phantom").to_string(),
            "_phantom"
        );
        assert_eq!(
            serde_json::to_string(&AutomationSignal::SoftwareRenderer).unwrap(),
            r#""software-renderer""#
        );
    }
}
