//! Address-to-forecast lookup with an expiring, postal-code keyed cache.
//!
//! An address is geocoded, reduced to its postal code, and the forecast for
//! that code is served from [`cache::ExpiringCache`] or fetched upstream.

pub mod cache;
pub mod config;
pub mod forecast;
pub mod shell;
pub mod utils;
