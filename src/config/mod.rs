//! Configuration modules.
//!
//! Each submodule handles one aspect of configuration, loaded from
//! environment variables with `from_env()`.
//!
//! - [`cors`]: CORS configuration
//! - [`database`]: PostgreSQL connection pool initialization
//! - [`jwt`]: JWT authentication configuration
//! - [`mpesa`]: M-Pesa gateway credentials and endpoints

pub mod cors;
pub mod database;
pub mod jwt;
pub mod mpesa;
