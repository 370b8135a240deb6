//! Domain models for the storefront.
//!
//! Field names serialize in camelCase because the same shapes are written to
//! the data directory and returned over the JSON API.

pub mod product;
pub mod session;
pub mod user;
pub mod verification_token;

pub use product::{Product, ProductCategory};
pub use session::{Session, SessionData};
pub use user::{NewUser, PublicUser, User};
pub use verification_token::VerificationToken;
