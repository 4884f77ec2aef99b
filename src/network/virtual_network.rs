//! Virtual networks and their subnets

use crate::error::Result;
use crate::fluent::stage::{Blank, WithAttach, WithCreate};
use crate::fluent::{
    ChildDefinition, ChildKind, ChildOf, ChildParent, ChildUpdate, Definition, Handle,
    ResourceKind, Update,
};
use crate::model::{ChildInner, ProvisioningState, ResourceInner, ResourceProperties, SubResource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Address space given to a network defined without one
pub const DEFAULT_ADDRESS_SPACE: &str = "10.0.0.0/16";
/// Subnet added to a network defined without any
pub const DEFAULT_SUBNET_NAME: &str = "subnet1";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhcpOptions {
    #[serde(default)]
    pub dns_servers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_table: Option<SubResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_security_group: Option<SubResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_space: Option<AddressSpace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_options: Option<DhcpOptions>,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ddos_protection: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl ResourceProperties for VirtualNetworkProperties {
    fn provisioning_state(&self) -> Option<&ProvisioningState> {
        self.provisioning_state.as_ref()
    }
}

impl VirtualNetworkProperties {
    fn address_prefixes_mut(&mut self) -> &mut Vec<String> {
        &mut self.address_space.get_or_insert_with(Default::default).address_prefixes
    }

    fn dns_servers_mut(&mut self) -> &mut Vec<String> {
        &mut self.dhcp_options.get_or_insert_with(Default::default).dns_servers
    }
}

/// Virtual network resource type
#[derive(Debug)]
pub enum VirtualNetworks {}

impl ResourceKind for VirtualNetworks {
    type Properties = VirtualNetworkProperties;
    type AfterGroup = WithCreate;

    const RESOURCE_TYPE: &'static str = "virtualNetworks";
    const DISPLAY_NAME: &'static str = "virtual network";
    const API_VERSION: &'static str = "2023-09-01";

    fn prepare_create(inner: &mut ResourceInner<VirtualNetworkProperties>) {
        let prefixes = inner.properties.address_prefixes_mut();
        if prefixes.is_empty() {
            prefixes.push(DEFAULT_ADDRESS_SPACE.to_string());
        }
        let first = prefixes[0].clone();

        if inner.properties.subnets.is_empty() {
            let mut subnet = Subnet::named(DEFAULT_SUBNET_NAME);
            subnet.properties.address_prefix = Some(first);
            inner.properties.subnets.push(subnet);
        }
    }
}

/// Subnet child type
#[derive(Debug)]
pub enum Subnets {}

impl ChildKind for Subnets {
    type Properties = SubnetProperties;
    const DISPLAY_NAME: &'static str = "subnet";
}

pub type VirtualNetwork = Handle<VirtualNetworks>;
pub type VirtualNetworkDefinition<S> = Definition<VirtualNetworks, S>;
pub type VirtualNetworkUpdate = Update<VirtualNetworks>;
pub type Subnet = ChildOf<Subnets>;
pub type SubnetDefinition<P, S> = ChildDefinition<Subnets, P, S>;
pub type SubnetUpdate<P> = ChildUpdate<Subnets, P>;

impl ChildInner<SubnetProperties> {
    pub fn address_prefix(&self) -> Option<&str> {
        self.properties.address_prefix.as_deref()
    }

    pub fn route_table_id(&self) -> Option<&str> {
        self.properties.route_table.as_ref().map(|r| r.id.as_str())
    }

    pub fn network_security_group_id(&self) -> Option<&str> {
        self.properties
            .network_security_group
            .as_ref()
            .map(|r| r.id.as_str())
    }
}

impl<P> SubnetDefinition<P, Blank> {
    pub fn with_address_prefix(self, cidr: &str) -> SubnetDefinition<P, WithAttach> {
        self.edit(|props| props.address_prefix = Some(cidr.to_string()))
            .advance()
    }
}

impl<P> SubnetDefinition<P, WithAttach> {
    pub fn with_existing_route_table(self, id: &str) -> Self {
        self.edit(|props| props.route_table = Some(SubResource::new(id)))
    }

    pub fn with_existing_network_security_group(self, id: &str) -> Self {
        self.edit(|props| props.network_security_group = Some(SubResource::new(id)))
    }
}

impl<P: ChildParent<Subnets>> SubnetUpdate<P> {
    pub fn with_address_prefix(self, cidr: &str) -> Self {
        self.edit(|props| props.address_prefix = Some(cidr.to_string()))
    }

    pub fn with_existing_route_table(self, id: &str) -> Self {
        self.edit(|props| props.route_table = Some(SubResource::new(id)))
    }

    pub fn without_route_table(self) -> Self {
        self.edit(|props| props.route_table = None)
    }

    pub fn with_existing_network_security_group(self, id: &str) -> Self {
        self.edit(|props| props.network_security_group = Some(SubResource::new(id)))
    }

    pub fn without_network_security_group(self) -> Self {
        self.edit(|props| props.network_security_group = None)
    }
}

impl ChildParent<Subnets> for VirtualNetworkDefinition<WithCreate> {
    fn children_mut(&mut self) -> &mut Vec<Subnet> {
        &mut self.inner_mut().properties.subnets
    }
}

impl ChildParent<Subnets> for VirtualNetworkUpdate {
    fn children_mut(&mut self) -> &mut Vec<Subnet> {
        &mut self.inner_mut().properties.subnets
    }
}

macro_rules! virtual_network_settings {
    ($target:ty) => {
        impl $target {
            /// Add an address space; duplicates are ignored
            pub fn with_address_space(self, cidr: &str) -> Self {
                self.edit(|inner| {
                    let prefixes = inner.properties.address_prefixes_mut();
                    if !prefixes.iter().any(|p| p == cidr) {
                        prefixes.push(cidr.to_string());
                    }
                })
            }

            pub fn with_dns_server(self, address: &str) -> Self {
                self.edit(|inner| {
                    let servers = inner.properties.dns_servers_mut();
                    if !servers.iter().any(|s| s == address) {
                        servers.push(address.to_string());
                    }
                })
            }

            pub fn with_ddos_protection(self, enabled: bool) -> Self {
                self.edit(|inner| inner.properties.enable_ddos_protection = Some(enabled))
            }

            pub fn define_subnet(self, name: &str) -> SubnetDefinition<Self, Blank> {
                self.define_child(name)
            }

            pub fn with_subnet(self, name: &str, cidr: &str) -> Self {
                self.define_subnet(name).with_address_prefix(cidr).attach()
            }
        }
    };
}

virtual_network_settings!(VirtualNetworkDefinition<WithCreate>);
virtual_network_settings!(VirtualNetworkUpdate);

impl VirtualNetworkUpdate {
    pub fn without_address_space(self, cidr: &str) -> Self {
        self.edit(|inner| inner.properties.address_prefixes_mut().retain(|p| p != cidr))
    }

    pub fn without_dns_server(self, address: &str) -> Self {
        self.edit(|inner| inner.properties.dns_servers_mut().retain(|s| s != address))
    }

    pub fn update_subnet(self, name: &str) -> Result<SubnetUpdate<Self>> {
        self.update_child(name)
    }

    pub fn without_subnet(self, name: &str) -> Self {
        self.detach_child(name)
    }
}

impl VirtualNetwork {
    pub fn address_spaces(&self) -> &[String] {
        self.properties()
            .address_space
            .as_ref()
            .map(|a| a.address_prefixes.as_slice())
            .unwrap_or_default()
    }

    pub fn dns_servers(&self) -> &[String] {
        self.properties()
            .dhcp_options
            .as_ref()
            .map(|d| d.dns_servers.as_slice())
            .unwrap_or_default()
    }

    pub fn is_ddos_protection_enabled(&self) -> bool {
        self.properties().enable_ddos_protection.unwrap_or(false)
    }

    pub fn subnets(&self) -> &[Subnet] {
        &self.properties().subnets
    }

    pub fn subnet(&self, name: &str) -> Option<&Subnet> {
        self.subnets().iter().find(|s| s.name == name)
    }
}
