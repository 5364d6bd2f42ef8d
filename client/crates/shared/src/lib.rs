//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of device-trust vocabulary:
//! - Error classification and the unified error type
//! - Typed ID wrappers (user IDs issued by the auth provider)
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across the probe, policy and view layers.

pub mod error {
    pub mod app_error;
    pub mod kind;
}
pub mod id;
