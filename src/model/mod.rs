//! Value types and wire payloads
//!
//! - [`expandable`] - open-ended string enumerations
//! - [`region`] - region names and labels
//! - [`resource`] - resource envelopes, child payloads and references
//! - [`resource_id`] - hierarchical resource ids
//! - [`service_tag`] - service tags and region qualification

pub mod expandable;
pub mod region;
pub mod resource;
pub mod resource_id;
pub mod service_tag;

pub use expandable::{IpAllocationMethod, ProvisioningState};
pub use region::Region;
pub use resource::{ChildInner, ResourceInner, ResourceProperties, Sku, SubResource};
pub use resource_id::ResourceId;
pub use service_tag::ServiceTag;
