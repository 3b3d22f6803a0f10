//! SkyDrive Storage Library
//!
//! Storage abstraction over the blob store holding uploaded files, with
//! an S3-compatible implementation and a local filesystem one.
//!
//! # Storage key format
//!
//! Every object is stored under a random URL-safe token (see [`generate_object_key`]).
//! Keys are independent of database row ids, so a leaked file id never
//! reveals the object location. Backends reject anything that is not a single
//! flat segment ([`validate_object_key`]).

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

pub use factory::create_storage;
pub use keys::{generate_object_key, validate_object_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::{S3Settings, S3Storage};
pub use skydrive_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
