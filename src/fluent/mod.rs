//! Staged resource builders
//!
//! Every resource type goes through the same lifecycle:
//!
//! - [`Collection::define`] starts a [`Definition`] at stage [`stage::Blank`].
//!   Required settings advance the stage one step at a time; optional
//!   settings are only offered once every required one is in place, and
//!   `create` exists only on [`stage::WithCreate`].
//! - [`Handle::update`] copies a fetched snapshot into an [`Update`] whose
//!   mutators can be called in any order; `apply` sends the result.
//! - Child resources are defined, updated and removed through their
//!   parent's definition or update (see [`child`]).
//!
//! Only terminal operations (`create`, `apply`, deletes and actions) reach
//! the transport, each with exactly one mutating call.
//!
//! ```no_run
//! # async fn demo(network: armnet::NetworkManager) -> armnet::Result<()> {
//! use armnet::model::Region;
//!
//! let table = network
//!     .route_tables()
//!     .define("rt-spoke")
//!     .with_region(Region::US_WEST)
//!     .with_existing_resource_group("rg-network")
//!     .with_tag("env", "prod")
//!     .create()
//!     .await?;
//! # let _ = table;
//! # Ok(())
//! # }
//! ```
//!
//! Skipping a required stage does not compile:
//!
//! ```compile_fail
//! # async fn demo(network: armnet::NetworkManager) -> armnet::Result<()> {
//! network.route_tables().define("rt-spoke").create().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ```compile_fail
//! # async fn demo(network: armnet::NetworkManager) -> armnet::Result<()> {
//! use armnet::model::Region;
//!
//! // A gateway needs a network, a gateway type and a SKU before `create`
//! network
//!     .virtual_network_gateways()
//!     .define("vng")
//!     .with_region(Region::US_WEST)
//!     .with_existing_resource_group("rg-network")
//!     .create()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod child;
pub mod collection;
pub mod definition;
pub mod handle;
pub mod kind;
pub mod stage;
pub mod update;

pub use child::{ChildDefinition, ChildParent, ChildUpdate};
pub use collection::Collection;
pub use definition::Definition;
pub use handle::Handle;
pub use kind::{ChildKind, ChildOf, ResourceKind};
pub use update::Update;
