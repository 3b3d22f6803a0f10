//! SkyDrive API Library
//!
//! HTTP handlers, authentication and application setup.

mod api_doc;
mod handlers;
mod services;
mod telemetry;

pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use telemetry::init_telemetry;
