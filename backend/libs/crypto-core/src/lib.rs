//! Shared token primitives for blog platform services.
//!
//! Services never issue credentials themselves; the identity provider does.
//! This crate only holds the RS256 key material and the claim layout both
//! sides agree on.
pub mod jwt;

pub use jwt::{Claims, JwtKeys};
