//! Service tags
//!
//! A service tag names the address ranges of a platform service. Some tags
//! can be narrowed to a single region by appending the region qualifier
//! (`Storage` -> `Storage.WestUS`). Qualification is a pure function of the
//! tag and the region; there is no shared cache of qualified tags.

use super::region::Region;
use crate::expandable_string;

expandable_string! {
    /// A service tag, optionally region-qualified
    pub struct ServiceTag {
        INTERNET = "Internet",
        VIRTUAL_NETWORK = "VirtualNetwork",
        AZURE_LOAD_BALANCER = "AzureLoadBalancer",
        AZURE_CLOUD = "AzureCloud",
        STORAGE = "Storage",
        SQL = "Sql",
        APP_SERVICE = "AppService",
        EVENT_HUB = "EventHub",
        SERVICE_BUS = "ServiceBus",
        AZURE_CONTAINER_REGISTRY = "AzureContainerRegistry",
        AZURE_KEY_VAULT = "AzureKeyVault",
        GATEWAY_MANAGER = "GatewayManager",
    }
}

/// Tags that have no regional variant
const GLOBAL_ONLY: &[&str] = &["Internet", "VirtualNetwork", "AzureLoadBalancer", "GatewayManager"];

impl ServiceTag {
    /// Tag without any region qualifier
    pub fn base(&self) -> &str {
        self.as_str()
            .split_once('.')
            .map_or(self.as_str(), |(base, _)| base)
    }

    /// Region qualifier, if any (`Storage.WestUS` -> `WestUS`)
    pub fn region_qualifier(&self) -> Option<&str> {
        self.as_str().split_once('.').map(|(_, region)| region)
    }

    /// Whether a regional variant of this tag exists
    pub fn supports_regions(&self) -> bool {
        let base = self.base();
        !GLOBAL_ONLY.iter().any(|g| g.eq_ignore_ascii_case(base))
    }

    /// The tag narrowed to `region`.
    ///
    /// Returns `None` for tags without regional variants. Qualifying an
    /// already-qualified tag replaces its region.
    pub fn in_region(&self, region: &Region) -> Option<ServiceTag> {
        if !self.supports_regions() {
            return None;
        }
        Some(ServiceTag::from_name(format!(
            "{}.{}",
            self.base(),
            region.qualifier()
        )))
    }

    /// The region this tag is qualified with, when it names a known region
    pub fn region(&self) -> Option<Region> {
        let qualifier = self.region_qualifier()?;
        Region::known().find(|r| r.qualifier().eq_ignore_ascii_case(qualifier))
    }
}
