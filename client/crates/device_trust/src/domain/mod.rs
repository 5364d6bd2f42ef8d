//! Domain Layer
//!
//! Entities, value objects, the lockout backend contract and the browser
//! host port. Nothing in here performs I/O on its own.

pub mod entities;
pub mod host;
pub mod repository;
pub mod services;
pub mod value_objects;
