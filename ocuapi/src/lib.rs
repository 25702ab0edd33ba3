//! Blocking client for the camera vendor's mobile-app cloud API.
//!
//! The vendor exposes no public API; every call here impersonates the
//! official Android app (same headers, same `services-sync` passthrough
//! envelope). Nothing in this crate owns UI state: callers get typed
//! results or an [`ApiError`] and decide what to do with them.

pub mod auth;
pub mod client;
pub mod errors;
pub mod model;

pub use auth::ClientAuth;
pub use client::CloudClient;
pub use errors::ApiError;
pub use model::{Axis, DeviceDetails, Preset};
