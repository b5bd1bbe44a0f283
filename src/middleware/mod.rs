//! Middleware for cross-cutting request concerns.
//!
//! - [`auth`]: bearer-token authentication extractor
//! - [`role`]: role checks applied at the router boundary
//!
//! # Authentication Flow
//!
//! 1. Client sends a request with `Authorization: Bearer <token>`
//! 2. `AuthUser` validates the JWT and extracts claims
//! 3. Role middleware compares the role claim against the route's allow-list
//! 4. Handler executes if all checks pass

pub mod auth;
pub mod role;
