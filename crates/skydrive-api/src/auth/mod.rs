//! Authentication: password hashing, access tokens and the request guard.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::{AccessClaims, JwtKeys};
pub use models::AuthUser;
