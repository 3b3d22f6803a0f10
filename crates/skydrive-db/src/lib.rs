//! SkyDrive Database Layer
//!
//! Postgres repositories for accounts, login sessions, files and the
//! sharing relation. Schema lives in the workspace `migrations/` directory.

pub mod db;

pub use db::{FileRepository, SessionRepository, ShareRepository, UserRepository};
