//! Public IP addresses

use crate::expandable_string;
use crate::fluent::stage::WithCreate;
use crate::fluent::{Definition, Handle, ResourceKind, Update};
use crate::model::{IpAllocationMethod, ProvisioningState, ResourceProperties, Sku};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

expandable_string! {
    /// Pricing tier of a public IP address
    pub struct PublicIpSkuType {
        BASIC = "Basic",
        STANDARD = "Standard",
    }
}

impl PublicIpSkuType {
    /// Tier named by a wire SKU object
    pub fn from_sku(sku: &Sku) -> Self {
        Self::from_name(sku.name.as_str())
    }

    pub fn to_sku(&self) -> Sku {
        Sku {
            name: self.as_str().to_string(),
            ..Sku::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpDnsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddressProperties {
    #[serde(
        rename = "publicIPAllocationMethod",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allocation_method: Option<IpAllocationMethod>,
    /// Assigned by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_settings: Option<PublicIpDnsSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_in_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl ResourceProperties for PublicIpAddressProperties {
    fn provisioning_state(&self) -> Option<&ProvisioningState> {
        self.provisioning_state.as_ref()
    }
}

/// Public IP address resource type
#[derive(Debug)]
pub enum PublicIpAddresses {}

impl ResourceKind for PublicIpAddresses {
    type Properties = PublicIpAddressProperties;
    type AfterGroup = WithCreate;

    const RESOURCE_TYPE: &'static str = "publicIPAddresses";
    const DISPLAY_NAME: &'static str = "public IP address";
    const API_VERSION: &'static str = "2023-09-01";
}

pub type PublicIpAddress = Handle<PublicIpAddresses>;
pub type PublicIpAddressDefinition<S> = Definition<PublicIpAddresses, S>;
pub type PublicIpAddressUpdate = Update<PublicIpAddresses>;

macro_rules! public_ip_address_settings {
    ($target:ty) => {
        impl $target {
            pub fn with_static_ip(self) -> Self {
                self.edit(|inner| inner.properties.allocation_method = Some(IpAllocationMethod::STATIC))
            }

            pub fn with_dynamic_ip(self) -> Self {
                self.edit(|inner| inner.properties.allocation_method = Some(IpAllocationMethod::DYNAMIC))
            }

            /// DNS label under the region's domain, e.g. `label.westus.cloudapp.azure.com`
            pub fn with_leaf_domain_label(self, label: &str) -> Self {
                self.edit(|inner| {
                    let dns = inner.properties.dns_settings.get_or_insert_with(Default::default);
                    dns.domain_name_label = Some(label.to_ascii_lowercase());
                })
            }

            pub fn without_leaf_domain_label(self) -> Self {
                self.edit(|inner| inner.properties.dns_settings = None)
            }

            pub fn with_idle_timeout_in_minutes(self, minutes: u32) -> Self {
                self.edit(|inner| inner.properties.idle_timeout_in_minutes = Some(minutes))
            }

            pub fn with_sku(self, sku: PublicIpSkuType) -> Self {
                self.edit(|inner| inner.sku = Some(sku.to_sku()))
            }
        }
    };
}

public_ip_address_settings!(PublicIpAddressDefinition<WithCreate>);
public_ip_address_settings!(PublicIpAddressUpdate);

impl PublicIpAddress {
    pub fn ip_address(&self) -> Option<&str> {
        self.properties().ip_address.as_deref()
    }

    pub fn ip_allocation_method(&self) -> Option<&IpAllocationMethod> {
        self.properties().allocation_method.as_ref()
    }

    pub fn leaf_domain_label(&self) -> Option<&str> {
        self.properties()
            .dns_settings
            .as_ref()
            .and_then(|d| d.domain_name_label.as_deref())
    }

    pub fn fqdn(&self) -> Option<&str> {
        self.properties()
            .dns_settings
            .as_ref()
            .and_then(|d| d.fqdn.as_deref())
    }

    pub fn idle_timeout_in_minutes(&self) -> Option<u32> {
        self.properties().idle_timeout_in_minutes
    }

    /// Tier of the address; the backend treats a missing SKU as basic
    pub fn sku(&self) -> PublicIpSkuType {
        self.inner()
            .sku
            .as_ref()
            .map(PublicIpSkuType::from_sku)
            .unwrap_or(PublicIpSkuType::BASIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Region;
    use crate::network::testing::manager;

    #[test]
    fn test_sku_mapping_is_pure() {
        let sku = PublicIpSkuType::STANDARD.to_sku();
        assert_eq!(sku.name, "Standard");
        assert_eq!(PublicIpSkuType::from_sku(&sku), PublicIpSkuType::STANDARD);

        let custom = Sku {
            name: "standardv2".to_string(),
            ..Sku::default()
        };
        let custom_type = PublicIpSkuType::from_sku(&custom);
        assert!(!custom_type.is_known());
        assert_eq!(custom_type.to_sku().name, "standardv2");
    }

    #[tokio::test]
    async fn test_create_with_options() {
        let (transport, network) = manager();

        let ip = network
            .public_ip_addresses()
            .define("pip1")
            .with_region(Region::EUROPE_WEST)
            .with_existing_resource_group("rg")
            .with_static_ip()
            .with_leaf_domain_label("MyApp")
            .with_idle_timeout_in_minutes(10)
            .with_sku(PublicIpSkuType::STANDARD)
            .create()
            .await
            .unwrap();

        assert_eq!(ip.ip_allocation_method(), Some(&IpAllocationMethod::STATIC));
        assert_eq!(ip.leaf_domain_label(), Some("myapp"));
        assert_eq!(ip.idle_timeout_in_minutes(), Some(10));
        assert_eq!(ip.sku(), PublicIpSkuType::STANDARD);

        let payload = &transport.submitted_payloads().await[0];
        assert_eq!(payload["properties"]["publicIPAllocationMethod"], "Static");
        assert_eq!(payload["sku"]["name"], "Standard");
    }

    #[tokio::test]
    async fn test_update_last_write_wins() {
        let (_transport, network) = manager();
        let ip = network
            .public_ip_addresses()
            .define("pip1")
            .with_region(Region::EUROPE_WEST)
            .with_existing_resource_group("rg")
            .create()
            .await
            .unwrap();
        assert_eq!(ip.sku(), PublicIpSkuType::BASIC);

        let ip = ip
            .update()
            .with_static_ip()
            .with_dynamic_ip()
            .with_leaf_domain_label("a")
            .without_leaf_domain_label()
            .apply()
            .await
            .unwrap();

        assert_eq!(ip.ip_allocation_method(), Some(&IpAllocationMethod::DYNAMIC));
        assert_eq!(ip.leaf_domain_label(), None);
    }
}
