//! Virtual network gateways
//!
//! Defining a gateway requires, in order, the network it serves, the gateway
//! type and a SKU. The gateway is placed in the network's `GatewaySubnet`.

use crate::error::Result;
use crate::expandable_string;
use crate::fluent::handle::action;
use crate::fluent::stage::WithCreate;
use crate::fluent::{Definition, Handle, ResourceKind, Update};
use crate::model::{
    ChildInner, IpAllocationMethod, ProvisioningState, ResourceId, ResourceProperties,
    SubResource,
};
use crate::network::public_ip_address::PublicIpAddress;
use crate::network::virtual_network::VirtualNetwork;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Subnet the backend requires gateways to live in
pub const GATEWAY_SUBNET: &str = "GatewaySubnet";
/// Name of the IP configuration created by `with_existing_network`
pub const DEFAULT_IP_CONFIGURATION: &str = "default";

expandable_string! {
    pub struct VirtualNetworkGatewayType {
        VPN = "Vpn",
        EXPRESS_ROUTE = "ExpressRoute",
    }
}

expandable_string! {
    pub struct VpnType {
        ROUTE_BASED = "RouteBased",
        POLICY_BASED = "PolicyBased",
    }
}

expandable_string! {
    pub struct VirtualNetworkGatewaySkuName {
        BASIC = "Basic",
        VPN_GW1 = "VpnGw1",
        VPN_GW2 = "VpnGw2",
        VPN_GW3 = "VpnGw3",
        STANDARD = "Standard",
        HIGH_PERFORMANCE = "HighPerformance",
        ULTRA_PERFORMANCE = "UltraPerformance",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkGatewaySku {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<VirtualNetworkGatewaySkuName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<VirtualNetworkGatewaySkuName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BgpSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgp_peering_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_weight: Option<i32>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayIpConfigurationProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,
    #[serde(
        rename = "publicIPAddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub public_ip_address: Option<SubResource>,
    #[serde(
        rename = "privateIPAllocationMethod",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub private_ip_allocation_method: Option<IpAllocationMethod>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

pub type GatewayIpConfiguration = ChildInner<GatewayIpConfigurationProperties>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkGatewayProperties {
    #[serde(default)]
    pub ip_configurations: Vec<GatewayIpConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_type: Option<VirtualNetworkGatewayType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_type: Option<VpnType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<VirtualNetworkGatewaySku>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_bgp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgp_settings: Option<BgpSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl ResourceProperties for VirtualNetworkGatewayProperties {
    fn provisioning_state(&self) -> Option<&ProvisioningState> {
        self.provisioning_state.as_ref()
    }
}

impl VirtualNetworkGatewayProperties {
    fn primary_ip_configuration(&mut self) -> &mut GatewayIpConfiguration {
        if self.ip_configurations.is_empty() {
            let mut config = GatewayIpConfiguration::named(DEFAULT_IP_CONFIGURATION);
            config.properties.private_ip_allocation_method = Some(IpAllocationMethod::DYNAMIC);
            self.ip_configurations.push(config);
        }
        &mut self.ip_configurations[0]
    }
}

/// Virtual network gateway resource type
#[derive(Debug)]
pub enum VirtualNetworkGateways {}

impl ResourceKind for VirtualNetworkGateways {
    type Properties = VirtualNetworkGatewayProperties;
    type AfterGroup = WithNetwork;

    const RESOURCE_TYPE: &'static str = "virtualNetworkGateways";
    const DISPLAY_NAME: &'static str = "virtual network gateway";
    const API_VERSION: &'static str = "2023-09-01";
    const LONG_RUNNING: bool = true;
}

/// Definition stage: network required
#[derive(Debug)]
pub enum WithNetwork {}

/// Definition stage: gateway type required
#[derive(Debug)]
pub enum WithGatewayType {}

/// Definition stage: SKU required
#[derive(Debug)]
pub enum WithSku {}

pub type VirtualNetworkGateway = Handle<VirtualNetworkGateways>;
pub type VirtualNetworkGatewayDefinition<S> = Definition<VirtualNetworkGateways, S>;
pub type VirtualNetworkGatewayUpdate = Update<VirtualNetworkGateways>;

impl VirtualNetworkGatewayDefinition<WithNetwork> {
    /// Serve `network` from its gateway subnet
    pub fn with_existing_network(
        self,
        network: &VirtualNetwork,
    ) -> VirtualNetworkGatewayDefinition<WithGatewayType> {
        let subnet = network.resource_id().child("subnets", GATEWAY_SUBNET);
        self.with_gateway_subnet(subnet.to_string())
    }

    /// Serve the network with the given id from its gateway subnet
    pub fn with_existing_network_id(
        self,
        network_id: &str,
    ) -> VirtualNetworkGatewayDefinition<WithGatewayType> {
        let subnet = format!("{}/subnets/{GATEWAY_SUBNET}", network_id.trim_end_matches('/'));
        self.with_gateway_subnet(subnet)
    }

    fn with_gateway_subnet(self, subnet_id: String) -> VirtualNetworkGatewayDefinition<WithGatewayType> {
        self.edit(|inner| {
            inner.properties.primary_ip_configuration().properties.subnet =
                Some(SubResource::new(subnet_id));
        })
        .advance()
    }
}

impl VirtualNetworkGatewayDefinition<WithGatewayType> {
    pub fn with_route_based_vpn(self) -> VirtualNetworkGatewayDefinition<WithSku> {
        self.with_gateway_type(VirtualNetworkGatewayType::VPN, Some(VpnType::ROUTE_BASED))
    }

    pub fn with_policy_based_vpn(self) -> VirtualNetworkGatewayDefinition<WithSku> {
        self.with_gateway_type(VirtualNetworkGatewayType::VPN, Some(VpnType::POLICY_BASED))
    }

    pub fn with_express_route(self) -> VirtualNetworkGatewayDefinition<WithSku> {
        self.with_gateway_type(VirtualNetworkGatewayType::EXPRESS_ROUTE, None)
    }

    pub fn with_gateway_type(
        self,
        gateway_type: VirtualNetworkGatewayType,
        vpn_type: Option<VpnType>,
    ) -> VirtualNetworkGatewayDefinition<WithSku> {
        self.edit(|inner| {
            inner.properties.gateway_type = Some(gateway_type);
            inner.properties.vpn_type = vpn_type;
        })
        .advance()
    }
}

fn gateway_sku(name: VirtualNetworkGatewaySkuName) -> VirtualNetworkGatewaySku {
    VirtualNetworkGatewaySku {
        tier: Some(name.clone()),
        name: Some(name),
        capacity: None,
    }
}

impl VirtualNetworkGatewayDefinition<WithSku> {
    pub fn with_sku(self, name: VirtualNetworkGatewaySkuName) -> VirtualNetworkGatewayDefinition<WithCreate> {
        self.edit(|inner| inner.properties.sku = Some(gateway_sku(name)))
            .advance()
    }
}

macro_rules! virtual_network_gateway_settings {
    ($target:ty) => {
        impl $target {
            pub fn with_existing_public_ip_address(self, address: &PublicIpAddress) -> Self {
                self.with_existing_public_ip_address_id(&address.id())
            }

            pub fn with_existing_public_ip_address_id(self, id: &str) -> Self {
                self.edit(|inner| {
                    inner.properties.primary_ip_configuration().properties.public_ip_address =
                        Some(SubResource::new(id));
                })
            }

            /// Enable BGP with the given autonomous system number and peering address
            pub fn with_bgp(self, asn: u32, peering_address: &str) -> Self {
                self.edit(|inner| {
                    inner.properties.enable_bgp = Some(true);
                    let settings = inner.properties.bgp_settings.get_or_insert_with(Default::default);
                    settings.asn = Some(asn);
                    settings.bgp_peering_address = Some(peering_address.to_string());
                })
            }

            pub fn without_bgp(self) -> Self {
                self.edit(|inner| {
                    inner.properties.enable_bgp = Some(false);
                    inner.properties.bgp_settings = None;
                })
            }

            pub fn with_active_active(self, enabled: bool) -> Self {
                self.edit(|inner| inner.properties.active_active = Some(enabled))
            }
        }
    };
}

virtual_network_gateway_settings!(VirtualNetworkGatewayDefinition<WithCreate>);
virtual_network_gateway_settings!(VirtualNetworkGatewayUpdate);

impl VirtualNetworkGatewayUpdate {
    pub fn with_sku(self, name: VirtualNetworkGatewaySkuName) -> Self {
        self.edit(|inner| inner.properties.sku = Some(gateway_sku(name)))
    }
}

impl VirtualNetworkGateway {
    pub fn gateway_type(&self) -> Option<&VirtualNetworkGatewayType> {
        self.properties().gateway_type.as_ref()
    }

    pub fn vpn_type(&self) -> Option<&VpnType> {
        self.properties().vpn_type.as_ref()
    }

    pub fn sku_name(&self) -> Option<&VirtualNetworkGatewaySkuName> {
        self.properties().sku.as_ref().and_then(|s| s.name.as_ref())
    }

    pub fn is_bgp_enabled(&self) -> bool {
        self.properties().enable_bgp.unwrap_or(false)
    }

    pub fn bgp_settings(&self) -> Option<&BgpSettings> {
        self.properties().bgp_settings.as_ref()
    }

    pub fn is_active_active(&self) -> bool {
        self.properties().active_active.unwrap_or(false)
    }

    fn primary_ip_configuration(&self) -> Option<&GatewayIpConfiguration> {
        self.properties().ip_configurations.first()
    }

    pub fn subnet_id(&self) -> Option<&str> {
        self.primary_ip_configuration()
            .and_then(|c| c.properties.subnet.as_ref())
            .map(|s| s.id.as_str())
    }

    /// Id of the network the gateway serves
    pub fn network_id(&self) -> Option<ResourceId> {
        let subnet = ResourceId::parse(self.subnet_id()?).ok()?;
        subnet.parent()
    }

    pub fn public_ip_address_id(&self) -> Option<&str> {
        self.primary_ip_configuration()
            .and_then(|c| c.properties.public_ip_address.as_ref())
            .map(|s| s.id.as_str())
    }

    /// Reset the gateway and return its refreshed state
    pub async fn reset(&self) -> Result<Self> {
        action::<VirtualNetworkGateways>(self.client(), self.resource_id().clone(), "reset").await?;
        self.refresh().await
    }
}
