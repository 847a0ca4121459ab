//! geolive library crate.
//!
//! Periodic multi-tenant alert fan-out: poll a feed, select the notable
//! event, and deliver it to one destination per tenant with per-tenant
//! failure isolation.

pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod logging;
pub mod notification;
pub mod scheduler;
pub mod tenant;
pub mod utils;

pub use error::{Error, Result};
