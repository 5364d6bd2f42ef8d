//! Presentation Layer
//!
//! View models for the authentication page.

pub mod countdown;
pub mod gate;
