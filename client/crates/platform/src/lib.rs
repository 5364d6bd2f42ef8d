//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, lowercase hex digests)
//! - JSON RPC client for PostgREST-style backends
//! - Backend connection configuration

pub mod config;
pub mod crypto;
pub mod rpc;
