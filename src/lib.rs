//! # Shule API
//!
//! A school administration REST API built with Rust, Axum, and PostgreSQL.
//! It manages users, students, courses, units, grades and fee balances, and
//! integrates M-Pesa STK push payments with asynchronous callback
//! reconciliation.
//!
//! ## Architecture
//!
//! The codebase follows a modular architecture inspired by NestJS:
//!
//! ```text
//! src/
//! ├── config/           # Configuration (database, JWT, CORS, M-Pesa)
//! ├── middleware/       # Auth extractor and role middleware
//! ├── modules/          # Feature modules
//! │   ├── auth/        # Login and token refresh
//! │   ├── users/       # User accounts
//! │   ├── students/    # Student records and self-service
//! │   ├── courses/     # Courses and units
//! │   ├── grades/      # Grade recording
//! │   ├── fees/        # Fee balance ledger
//! │   └── payments/    # M-Pesa gateway, transaction ledger, callbacks
//! └── utils/           # Errors, JWT, password hashing
//! ```
//!
//! Each feature module follows a consistent structure:
//!
//! - `mod.rs`: Module exports
//! - `controller.rs`: HTTP handlers
//! - `service.rs`: Business logic
//! - `model.rs`: Data models, DTOs, database structs
//! - `router.rs`: Axum router configuration
//!
//! ## Payment reconciliation
//!
//! Initiating a payment records a "pending" transaction before the gateway
//! is contacted. The gateway later invokes an unauthenticated callback; the
//! handler matches it by merchant request id and flips the transaction to a
//! terminal state with a compare-and-set, so repeated callback delivery can
//! never double-create a payment or double-credit a fee balance.
//!
//! ## Authentication
//!
//! JWT bearer tokens with an access/refresh pair. The `role` claim ("admin"
//! or "student") drives router-level authorization; students may only read
//! their own records.

pub mod config;
pub mod docs;
pub mod logging;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;
