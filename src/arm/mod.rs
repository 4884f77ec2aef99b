//! Resource-management API access
//!
//! # Module Structure
//!
//! - [`transport`] - the seam every remote call goes through
//! - [`client`] - subscription-bound client shared by collections and handles
//! - [`http`] - REST transport over `reqwest`
//! - [`auth`] - bearer token sources and caching
//! - [`memory`] - in-memory transport for tests and offline use
//!
//! # Example
//!
//! ```ignore
//! use armnet::arm::{auth::Credentials, client::ArmClient, http::HttpTransport};
//!
//! let transport = HttpTransport::new(http::DEFAULT_ENDPOINT, Credentials::from_environment())?;
//! let client = ArmClient::new(Arc::new(transport), "00000000-0000-0000-0000-000000000000");
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod memory;
pub mod transport;

pub use client::ArmClient;
pub use transport::{Invocation, Operation, Page, PageCursor, PageRequest, Transport};
