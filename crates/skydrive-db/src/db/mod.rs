//! Database repositories
//!
//! Each repository wraps a `PgPool` and owns the queries for one table.

pub mod file;
pub mod session;
pub mod share;
pub mod user;

pub use file::FileRepository;
pub use session::SessionRepository;
pub use share::ShareRepository;
pub use user::UserRepository;
