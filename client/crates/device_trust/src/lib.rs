//! Device Trust Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, lockout contract, host port
//! - `probe/` - Fingerprint signal probes over the host port
//! - `application/` - Orchestrator and use cases
//! - `infra/` - Supabase RPC and in-memory lockout backends, snapshot host
//! - `presentation/` - Auth page view model and block countdown
//!
//! ## Security Model
//! - The lockout backend is the sole authority for counting attempts, block
//!   decisions and expiry; the client only reports and reads
//! - The fingerprint hash covers a stable subset of signals only
//! - Backend failures resolve permissively unless a block is already known
//! - Automation and behavior signals are heuristics, never proof

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;
pub mod probe;

// Re-exports for convenience
pub use application::SecurityCheck;
pub use application::config::{BehaviorConfig, FailurePolicy, TrustConfig};
pub use application::device_trust::DeviceTrust;
pub use application::events::{EventKind, EventTarget};
pub use application::record_login::LoginAttemptInput;
pub use domain::entities::{BlockState, DeviceFingerprint, DeviceSecurityState, TrustPhase};
pub use domain::host::BrowserHost;
pub use domain::repository::LockoutPolicy;
pub use domain::value_objects::{BehaviorScore, FingerprintHash};
pub use error::{TrustError, TrustResult};
pub use infra::memory::InMemoryLockoutPolicy;
pub use infra::snapshot::SnapshotHost;
pub use infra::supabase::SupabaseLockoutPolicy;
pub use presentation::gate::{AuthGate, GateScreen};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
