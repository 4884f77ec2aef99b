//! armnet - fluent SDK for cloud network resources
//!
//! Resources are defined through staged builders that only expose `create`
//! once every required setting is present, updated through copies of their
//! last fetched state, and managed in bulk through their collections.
//!
//! # Module Structure
//!
//! - [`fluent`] - generic definition, update, handle and collection types
//! - [`network`] - the concrete network resource types and [`NetworkManager`]
//! - [`model`] - ids, regions, service tags and wire payloads
//! - [`arm`] - transport seam, HTTP and in-memory transports, credentials
//! - [`config`] - persistent CLI configuration
//! - [`error`] - error taxonomy and batch results

pub mod arm;
pub mod config;
pub mod error;
pub mod fluent;
pub mod model;
pub mod network;

pub use error::{BatchItem, Error, Result};
pub use network::NetworkManager;
