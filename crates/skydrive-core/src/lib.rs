//! SkyDrive Core Library
//!
//! This crate provides the domain models, error types and configuration
//! shared by every SkyDrive component.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

pub use config::{Config, PreviewMode, ServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
