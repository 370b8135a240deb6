//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Signup, login, email verification and sessions
//! - `rate_limit` - Fixed-window attempt limits for auth actions

pub mod auth;
pub mod rate_limit;

pub use auth::{AuthError, AuthService, SignupOutcome};
pub use rate_limit::{RateLimitAction, RateLimitConfig, RateLimitPolicies, RateLimiter};
