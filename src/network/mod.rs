//! Network resource types
//!
//! [`NetworkManager`] is the entry point: one collection per resource type,
//! all sharing the same client.

pub mod application_gateway;
pub mod network_watcher;
pub mod public_ip_address;
pub mod route_table;
pub mod virtual_network;
pub mod virtual_network_gateway;

pub use application_gateway::{ApplicationGateway, ApplicationGateways};
pub use network_watcher::{NetworkWatcher, NetworkWatchers};
pub use public_ip_address::{PublicIpAddress, PublicIpAddresses, PublicIpSkuType};
pub use route_table::{Route, RouteNextHopType, RouteTable, RouteTables};
pub use virtual_network::{Subnet, VirtualNetwork, VirtualNetworks};
pub use virtual_network_gateway::{VirtualNetworkGateway, VirtualNetworkGateways};

use crate::arm::ArmClient;
use crate::fluent::Collection;

/// Entry point to every network resource collection
#[derive(Clone, Debug)]
pub struct NetworkManager {
    client: ArmClient,
}

impl NetworkManager {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ArmClient {
        &self.client
    }

    pub fn subscription_id(&self) -> &str {
        self.client.subscription_id()
    }

    pub fn route_tables(&self) -> Collection<RouteTables> {
        Collection::new(self.client.clone())
    }

    pub fn virtual_networks(&self) -> Collection<VirtualNetworks> {
        Collection::new(self.client.clone())
    }

    pub fn public_ip_addresses(&self) -> Collection<PublicIpAddresses> {
        Collection::new(self.client.clone())
    }

    pub fn network_watchers(&self) -> Collection<NetworkWatchers> {
        Collection::new(self.client.clone())
    }

    pub fn application_gateways(&self) -> Collection<ApplicationGateways> {
        Collection::new(self.client.clone())
    }

    pub fn virtual_network_gateways(&self) -> Collection<VirtualNetworkGateways> {
        Collection::new(self.client.clone())
    }
}
