//! Application gateways
//!
//! A gateway must be placed in an existing subnet before anything else can be
//! configured. Start and stop are available per handle and as batches over
//! ids.

use crate::error::{BatchItem, Result};
use crate::expandable_string;
use crate::fluent::handle::action;
use crate::fluent::stage::{Blank, WithAttach, WithCreate};
use crate::fluent::{
    ChildDefinition, ChildKind, ChildOf, ChildParent, ChildUpdate, Collection, Definition,
    Handle, ResourceKind, Update,
};
use crate::model::{ChildInner, ProvisioningState, ResourceInner, ResourceProperties, SubResource};
use crate::network::virtual_network::VirtualNetwork;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name given to the IP configuration created by `with_existing_subnet`
pub const DEFAULT_IP_CONFIGURATION: &str = "default";
const DEFAULT_CAPACITY: u32 = 1;

expandable_string! {
    pub struct ApplicationGatewaySkuName {
        STANDARD_SMALL = "Standard_Small",
        STANDARD_MEDIUM = "Standard_Medium",
        STANDARD_LARGE = "Standard_Large",
        WAF_MEDIUM = "WAF_Medium",
        WAF_LARGE = "WAF_Large",
        STANDARD_V2 = "Standard_v2",
        WAF_V2 = "WAF_v2",
    }
}

expandable_string! {
    pub struct ApplicationGatewayTier {
        STANDARD = "Standard",
        WAF = "WAF",
        STANDARD_V2 = "Standard_v2",
        WAF_V2 = "WAF_v2",
    }
}

expandable_string! {
    /// Run state reported by the backend; read-only
    pub struct ApplicationGatewayOperationalState {
        STOPPED = "Stopped",
        STARTING = "Starting",
        RUNNING = "Running",
        STOPPING = "Stopping",
    }
}

impl ApplicationGatewaySkuName {
    /// Tier a SKU belongs to
    pub fn tier(&self) -> ApplicationGatewayTier {
        let name = self.as_str();
        let lower = name.to_ascii_lowercase();
        if lower.ends_with("_v2") {
            ApplicationGatewayTier::from_name(name)
        } else if lower.starts_with("waf") {
            ApplicationGatewayTier::WAF
        } else {
            ApplicationGatewayTier::STANDARD
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationGatewaySku {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<ApplicationGatewaySkuName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<ApplicationGatewayTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendPortProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendPoolProperties {
    #[serde(default)]
    pub backend_addresses: Vec<BackendAddress>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl BackendPoolProperties {
    fn add(&mut self, address: BackendAddress) {
        if !self.backend_addresses.contains(&address) {
            self.backend_addresses.push(address);
        }
    }
}

pub type IpConfiguration = ChildInner<IpConfigurationProperties>;
pub type FrontendPort = ChildInner<FrontendPortProperties>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationGatewayProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<ApplicationGatewaySku>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational_state: Option<ApplicationGatewayOperationalState>,
    #[serde(
        rename = "gatewayIPConfigurations",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub gateway_ip_configurations: Vec<IpConfiguration>,
    #[serde(default)]
    pub frontend_ports: Vec<FrontendPort>,
    #[serde(default)]
    pub backend_address_pools: Vec<Backend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl ResourceProperties for ApplicationGatewayProperties {
    fn provisioning_state(&self) -> Option<&ProvisioningState> {
        self.provisioning_state.as_ref()
    }
}

impl ApplicationGatewayProperties {
    fn sku_mut(&mut self) -> &mut ApplicationGatewaySku {
        self.sku.get_or_insert_with(Default::default)
    }
}

/// Application gateway resource type
#[derive(Debug)]
pub enum ApplicationGateways {}

impl ResourceKind for ApplicationGateways {
    type Properties = ApplicationGatewayProperties;
    type AfterGroup = WithSubnet;

    const RESOURCE_TYPE: &'static str = "applicationGateways";
    const DISPLAY_NAME: &'static str = "application gateway";
    const API_VERSION: &'static str = "2023-09-01";
    const LONG_RUNNING: bool = true;

    fn prepare_create(inner: &mut ResourceInner<ApplicationGatewayProperties>) {
        let sku = inner.properties.sku_mut();
        let name = sku
            .name
            .get_or_insert(ApplicationGatewaySkuName::STANDARD_V2)
            .clone();
        sku.tier.get_or_insert_with(|| name.tier());
        sku.capacity.get_or_insert(DEFAULT_CAPACITY);
    }
}

/// Backend pool child type
#[derive(Debug)]
pub enum Backends {}

impl ChildKind for Backends {
    type Properties = BackendPoolProperties;
    const DISPLAY_NAME: &'static str = "backend pool";
}

/// Definition stage: region and group set, subnet required
#[derive(Debug)]
pub enum WithSubnet {}

pub type ApplicationGateway = Handle<ApplicationGateways>;
pub type ApplicationGatewayDefinition<S> = Definition<ApplicationGateways, S>;
pub type ApplicationGatewayUpdate = Update<ApplicationGateways>;
pub type Backend = ChildOf<Backends>;
pub type BackendDefinition<P, S> = ChildDefinition<Backends, P, S>;
pub type BackendUpdate<P> = ChildUpdate<Backends, P>;

fn ip_address(ip: &str) -> BackendAddress {
    BackendAddress {
        ip_address: Some(ip.to_string()),
        ..BackendAddress::default()
    }
}

fn fqdn(name: &str) -> BackendAddress {
    BackendAddress {
        fqdn: Some(name.to_string()),
        ..BackendAddress::default()
    }
}

impl ChildInner<BackendPoolProperties> {
    pub fn ip_addresses(&self) -> impl Iterator<Item = &str> {
        self.properties
            .backend_addresses
            .iter()
            .filter_map(|a| a.ip_address.as_deref())
    }

    pub fn fqdns(&self) -> impl Iterator<Item = &str> {
        self.properties
            .backend_addresses
            .iter()
            .filter_map(|a| a.fqdn.as_deref())
    }
}

impl<P> BackendDefinition<P, Blank> {
    pub fn with_ip_address(self, ip: &str) -> BackendDefinition<P, WithAttach> {
        self.edit(|props| props.add(ip_address(ip))).advance()
    }

    pub fn with_fqdn(self, name: &str) -> BackendDefinition<P, WithAttach> {
        self.edit(|props| props.add(fqdn(name))).advance()
    }
}

impl<P> BackendDefinition<P, WithAttach> {
    pub fn with_ip_address(self, ip: &str) -> Self {
        self.edit(|props| props.add(ip_address(ip)))
    }

    pub fn with_fqdn(self, name: &str) -> Self {
        self.edit(|props| props.add(fqdn(name)))
    }
}

impl<P: ChildParent<Backends>> BackendUpdate<P> {
    pub fn with_ip_address(self, ip: &str) -> Self {
        self.edit(|props| props.add(ip_address(ip)))
    }

    pub fn without_ip_address(self, ip: &str) -> Self {
        self.edit(|props| {
            props
                .backend_addresses
                .retain(|a| a.ip_address.as_deref() != Some(ip))
        })
    }

    pub fn with_fqdn(self, name: &str) -> Self {
        self.edit(|props| props.add(fqdn(name)))
    }

    pub fn without_fqdn(self, name: &str) -> Self {
        self.edit(|props| props.backend_addresses.retain(|a| a.fqdn.as_deref() != Some(name)))
    }
}

impl ChildParent<Backends> for ApplicationGatewayDefinition<WithCreate> {
    fn children_mut(&mut self) -> &mut Vec<Backend> {
        &mut self.inner_mut().properties.backend_address_pools
    }
}

impl ChildParent<Backends> for ApplicationGatewayUpdate {
    fn children_mut(&mut self) -> &mut Vec<Backend> {
        &mut self.inner_mut().properties.backend_address_pools
    }
}

impl ApplicationGatewayDefinition<WithSubnet> {
    /// Place the gateway in the subnet with the given id
    pub fn with_existing_subnet(self, subnet_id: &str) -> ApplicationGatewayDefinition<WithCreate> {
        self.edit(|inner| {
            let mut config = IpConfiguration::named(DEFAULT_IP_CONFIGURATION);
            config.properties.subnet = Some(SubResource::new(subnet_id));
            inner.properties.gateway_ip_configurations = vec![config];
        })
        .advance()
    }

    /// Place the gateway in `subnet` of `network`
    pub fn with_existing_network_subnet(
        self,
        network: &VirtualNetwork,
        subnet: &str,
    ) -> ApplicationGatewayDefinition<WithCreate> {
        let id = network.resource_id().child("subnets", subnet);
        self.with_existing_subnet(&id.to_string())
    }
}

macro_rules! application_gateway_settings {
    ($target:ty) => {
        impl $target {
            /// Set the SKU and the tier it belongs to
            pub fn with_sku(self, name: ApplicationGatewaySkuName) -> Self {
                self.edit(|inner| {
                    let sku = inner.properties.sku_mut();
                    sku.tier = Some(name.tier());
                    sku.name = Some(name);
                })
            }

            pub fn with_instance_count(self, count: u32) -> Self {
                self.edit(|inner| inner.properties.sku_mut().capacity = Some(count))
            }

            /// Listen on `port` under the name `port_{port}`
            pub fn with_frontend_port(self, port: u16) -> Self {
                self.with_named_frontend_port(&format!("port_{port}"), port)
            }

            /// Listen on `port`; an existing port with the same name is replaced
            pub fn with_named_frontend_port(self, name: &str, port: u16) -> Self {
                self.edit(|inner| {
                    let ports = &mut inner.properties.frontend_ports;
                    ports.retain(|p| p.name != name);
                    let mut entry = FrontendPort::named(name);
                    entry.properties.port = Some(port);
                    ports.push(entry);
                })
            }

            pub fn define_backend(self, name: &str) -> BackendDefinition<Self, Blank> {
                self.define_child(name)
            }
        }
    };
}

application_gateway_settings!(ApplicationGatewayDefinition<WithCreate>);
application_gateway_settings!(ApplicationGatewayUpdate);

impl ApplicationGatewayUpdate {
    pub fn without_frontend_port(self, name: &str) -> Self {
        self.edit(|inner| inner.properties.frontend_ports.retain(|p| p.name != name))
    }

    pub fn update_backend(self, name: &str) -> Result<BackendUpdate<Self>> {
        self.update_child(name)
    }

    pub fn without_backend(self, name: &str) -> Self {
        self.detach_child(name)
    }
}

impl ApplicationGateway {
    pub fn operational_state(&self) -> Option<&ApplicationGatewayOperationalState> {
        self.properties().operational_state.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.operational_state() == Some(&ApplicationGatewayOperationalState::RUNNING)
    }

    pub fn sku_name(&self) -> Option<&ApplicationGatewaySkuName> {
        self.properties().sku.as_ref().and_then(|s| s.name.as_ref())
    }

    pub fn tier(&self) -> Option<&ApplicationGatewayTier> {
        self.properties().sku.as_ref().and_then(|s| s.tier.as_ref())
    }

    pub fn instance_count(&self) -> Option<u32> {
        self.properties().sku.as_ref().and_then(|s| s.capacity)
    }

    /// Subnet of the first IP configuration
    pub fn subnet_id(&self) -> Option<&str> {
        self.properties()
            .gateway_ip_configurations
            .iter()
            .find_map(|c| c.properties.subnet.as_ref())
            .map(|s| s.id.as_str())
    }

    pub fn frontend_ports(&self) -> impl Iterator<Item = (&str, u16)> {
        self.properties()
            .frontend_ports
            .iter()
            .filter_map(|p| p.properties.port.map(|port| (p.name.as_str(), port)))
    }

    pub fn backends(&self) -> &[Backend] {
        &self.properties().backend_address_pools
    }

    pub fn backend(&self, name: &str) -> Option<&Backend> {
        self.backends().iter().find(|b| b.name == name)
    }

    /// Start the gateway and return its refreshed state
    pub async fn start(&self) -> Result<Self> {
        action::<ApplicationGateways>(self.client(), self.resource_id().clone(), "start").await?;
        self.refresh().await
    }

    /// Stop the gateway and return its refreshed state
    pub async fn stop(&self) -> Result<Self> {
        action::<ApplicationGateways>(self.client(), self.resource_id().clone(), "stop").await?;
        self.refresh().await
    }
}

impl Collection<ApplicationGateways> {
    /// Start each gateway independently; one item per id, in completion order
    pub fn start_by_ids<I, T>(&self, ids: I) -> BoxStream<'static, BatchItem<()>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.action_by_ids(ids, "start")
    }

    /// Stop each gateway independently; one item per id, in completion order
    pub fn stop_by_ids<I, T>(&self, ids: I) -> BoxStream<'static, BatchItem<()>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.action_by_ids(ids, "stop")
    }

    fn action_by_ids<I, T>(&self, ids: I, name: &'static str) -> BoxStream<'static, BatchItem<()>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let client = self.client().clone();
        self.for_each_id(ids, move |id| {
            let client = client.clone();
            async move {
                let id = Self::parse_id(&id)?;
                action::<ApplicationGateways>(&client, id, name).await
            }
        })
    }
}
