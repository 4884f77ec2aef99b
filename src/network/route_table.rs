//! Route tables and their routes

use crate::expandable_string;
use crate::fluent::stage::{Blank, WithAttach, WithCreate};
use crate::fluent::{
    ChildDefinition, ChildKind, ChildOf, ChildParent, ChildUpdate, Definition, Handle,
    ResourceKind, Update,
};
use crate::error::Result;
use crate::model::{ChildInner, ProvisioningState, ResourceProperties, ServiceTag, SubResource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

expandable_string! {
    /// Where a route sends matching traffic
    pub struct RouteNextHopType {
        VIRTUAL_NETWORK_GATEWAY = "VirtualNetworkGateway",
        VNET_LOCAL = "VnetLocal",
        INTERNET = "Internet",
        VIRTUAL_APPLIANCE = "VirtualAppliance",
        NONE = "None",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop_type: Option<RouteNextHopType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop_ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableProperties {
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_bgp_route_propagation: Option<bool>,
    /// Subnets associated with the table; maintained by the backend
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl ResourceProperties for RouteTableProperties {
    fn provisioning_state(&self) -> Option<&ProvisioningState> {
        self.provisioning_state.as_ref()
    }
}

/// Route table resource type
#[derive(Debug)]
pub enum RouteTables {}

impl ResourceKind for RouteTables {
    type Properties = RouteTableProperties;
    type AfterGroup = WithCreate;

    const RESOURCE_TYPE: &'static str = "routeTables";
    const DISPLAY_NAME: &'static str = "route table";
    const API_VERSION: &'static str = "2023-09-01";
}

/// Route child type
#[derive(Debug)]
pub enum Routes {}

impl ChildKind for Routes {
    type Properties = RouteProperties;
    const DISPLAY_NAME: &'static str = "route";
}

pub type RouteTable = Handle<RouteTables>;
pub type RouteTableDefinition<S> = Definition<RouteTables, S>;
pub type RouteTableUpdate = Update<RouteTables>;
pub type Route = ChildOf<Routes>;
pub type RouteDefinition<P, S> = ChildDefinition<Routes, P, S>;
pub type RouteUpdate<P> = ChildUpdate<Routes, P>;

/// Route definition stage: destination set, next hop required
#[derive(Debug)]
pub enum WithNextHop {}

impl ChildInner<RouteProperties> {
    pub fn destination_address_prefix(&self) -> Option<&str> {
        self.properties.address_prefix.as_deref()
    }

    pub fn next_hop_type(&self) -> Option<&RouteNextHopType> {
        self.properties.next_hop_type.as_ref()
    }

    pub fn next_hop_ip_address(&self) -> Option<&str> {
        self.properties.next_hop_ip_address.as_deref()
    }
}

fn set_next_hop(props: &mut RouteProperties, hop: RouteNextHopType, ip: Option<&str>) {
    props.next_hop_type = Some(hop);
    props.next_hop_ip_address = ip.map(str::to_string);
}

impl<P> RouteDefinition<P, Blank> {
    /// Traffic to `cidr` is matched by this route
    pub fn with_destination_address_prefix(self, cidr: &str) -> RouteDefinition<P, WithNextHop> {
        self.edit(|props| props.address_prefix = Some(cidr.to_string()))
            .advance()
    }

    /// Traffic to the address ranges of `tag` is matched by this route
    pub fn with_destination_service_tag(self, tag: &ServiceTag) -> RouteDefinition<P, WithNextHop> {
        self.with_destination_address_prefix(tag.as_str())
    }
}

impl<P> RouteDefinition<P, WithNextHop> {
    pub fn with_next_hop(self, hop: RouteNextHopType) -> RouteDefinition<P, WithAttach> {
        self.edit(|props| set_next_hop(props, hop, None)).advance()
    }

    pub fn with_next_hop_to_virtual_appliance(self, ip: &str) -> RouteDefinition<P, WithAttach> {
        self.edit(|props| set_next_hop(props, RouteNextHopType::VIRTUAL_APPLIANCE, Some(ip)))
            .advance()
    }
}

impl<P: ChildParent<Routes>> RouteUpdate<P> {
    pub fn with_destination_address_prefix(self, cidr: &str) -> Self {
        self.edit(|props| props.address_prefix = Some(cidr.to_string()))
    }

    pub fn with_destination_service_tag(self, tag: &ServiceTag) -> Self {
        self.with_destination_address_prefix(tag.as_str())
    }

    pub fn with_next_hop(self, hop: RouteNextHopType) -> Self {
        self.edit(|props| set_next_hop(props, hop, None))
    }

    pub fn with_next_hop_to_virtual_appliance(self, ip: &str) -> Self {
        self.edit(|props| set_next_hop(props, RouteNextHopType::VIRTUAL_APPLIANCE, Some(ip)))
    }
}

impl ChildParent<Routes> for RouteTableDefinition<WithCreate> {
    fn children_mut(&mut self) -> &mut Vec<Route> {
        &mut self.inner_mut().properties.routes
    }
}

impl ChildParent<Routes> for RouteTableUpdate {
    fn children_mut(&mut self) -> &mut Vec<Route> {
        &mut self.inner_mut().properties.routes
    }
}

/// Settings offered both while defining and while updating a route table
macro_rules! route_table_settings {
    ($target:ty) => {
        impl $target {
            /// Begin defining a route; `attach` returns here
            pub fn define_route(self, name: &str) -> RouteDefinition<Self, Blank> {
                self.define_child(name)
            }

            /// Add a route in one step
            pub fn with_route(self, name: &str, cidr: &str, hop: RouteNextHopType) -> Self {
                self.define_route(name)
                    .with_destination_address_prefix(cidr)
                    .with_next_hop(hop)
                    .attach()
            }

            /// Add a route via a virtual appliance in one step
            pub fn with_route_via_virtual_appliance(self, name: &str, cidr: &str, ip: &str) -> Self {
                self.define_route(name)
                    .with_destination_address_prefix(cidr)
                    .with_next_hop_to_virtual_appliance(ip)
                    .attach()
            }

            pub fn with_disabled_bgp_route_propagation(self) -> Self {
                self.edit(|inner| inner.properties.disable_bgp_route_propagation = Some(true))
            }

            pub fn with_enabled_bgp_route_propagation(self) -> Self {
                self.edit(|inner| inner.properties.disable_bgp_route_propagation = Some(false))
            }
        }
    };
}

route_table_settings!(RouteTableDefinition<WithCreate>);
route_table_settings!(RouteTableUpdate);

impl RouteTableUpdate {
    /// Begin changing an existing route; `parent` returns here
    pub fn update_route(self, name: &str) -> Result<RouteUpdate<Self>> {
        self.update_child(name)
    }

    pub fn without_route(self, name: &str) -> Self {
        self.detach_child(name)
    }
}

impl RouteTable {
    pub fn routes(&self) -> &[Route] {
        &self.properties().routes
    }

    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes().iter().find(|r| r.name == name)
    }

    pub fn is_bgp_route_propagation_disabled(&self) -> bool {
        self.properties().disable_bgp_route_propagation.unwrap_or(false)
    }

    /// Ids of the subnets this table is associated with
    pub fn subnet_ids(&self) -> impl Iterator<Item = &str> {
        self.properties().subnets.iter().map(|s| s.id.as_str())
    }
}
