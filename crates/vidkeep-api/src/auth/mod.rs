//! Bearer-token identity.
//!
//! Tokens are HS256 JWTs signed with `JWT_SECRET`; the `sub` claim is the user ID.
//! Issuing tokens is someone else's job, this module only validates them.

pub mod jwt;
pub mod models;

pub use jwt::JwtValidator;
pub use models::{AuthUser, JwtClaims};
