//! Marketplace Core - Shared types library.
//!
//! This crate provides common types used across all marketplace components:
//! - `storefront` - Public-facing marketplace server
//! - `cli` - Command-line tools for data maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no file
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and emails
//! - [`pagination`] - Page slicing and page-number windows for listings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pagination;
pub mod types;

pub use pagination::{Paginated, PaginationOptions, page_numbers, paginate};
pub use types::*;
