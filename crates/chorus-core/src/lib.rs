//! # chorus-core
//!
//! Core crate for the Chorus notification client. Contains the notification
//! data model, typed identifiers, configuration schemas, the collaborator
//! traits implemented by transport and persistence adapters, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other Chorus crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
