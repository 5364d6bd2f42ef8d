//! Infrastructure Layer
//!
//! Lockout backends and a replayable browser host.

pub mod dto;
pub mod memory;
pub mod snapshot;
pub mod supabase;
