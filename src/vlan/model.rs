//! VLAN document types and the operations that mutate them.
//!
//! The structs double as the on-disk YAML schema, so their field names and
//! field order are the persisted wire contract.

use super::error::VlanError;
use crate::defaults::{
    DEFAULT_INTERFACE_NAME, DEFAULT_KEEP_ALIVE, DEFAULT_LISTEN_PORT, DEFAULT_NETWORK,
    DEFAULT_SERVER_NAME,
};
use crate::ip::{parse_cidr, parse_subnet, pick_next_address};
use crate::keys::{PresharedKey, PrivateKey, PublicKey};
use ipnet::IpNet;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// A WireGuard VLAN: one server, its clients and the shared settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vlan {
    /// host:port clients dial to reach the server
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_endpoint: String,
    /// PersistentKeepalive for every peer entry; 0 disables it
    #[serde(default, skip_serializing_if = "is_zero")]
    pub keep_alive: u32,
    pub server: VlanServer,
    #[serde(default)]
    pub clients: Vec<VlanClient>,
    /// Unrecognised top-level fields, written back untouched
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

/// The server peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlanServer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(default)]
    pub peer_name: String,
    #[serde(default)]
    pub listen_port: u16,
    /// Server address plus the prefix of the whole VLAN, e.g. `10.20.30.1/24`
    #[serde(default)]
    pub network: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    /// Extra `[Interface]` keys copied verbatim into the server config
    #[serde(default, rename = "extra", skip_serializing_if = "BTreeMap::is_empty")]
    pub interface_extra: BTreeMap<String, String>,
    /// Unrecognised fields, written back untouched
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

/// A client peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlanClient {
    #[serde(default)]
    pub peer_name: String,
    /// Bare address (host route) or CIDR routed to this client
    #[serde(default)]
    pub network: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preshared_key: String,
    /// Extra `[Interface]` keys copied verbatim into the client config
    #[serde(default, rename = "extra", skip_serializing_if = "BTreeMap::is_empty")]
    pub interface_extra: BTreeMap<String, String>,
    /// Unrecognised fields, written back untouched
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Stated public key, or the one derived from the private key.
///
/// Used by the renderers, which read the model without filling it in.
fn effective_public_key(private_key: &str, public_key: &str) -> Result<String, VlanError> {
    if !public_key.is_empty() {
        return Ok(public_key.to_string());
    }
    PrivateKey::from_base64(private_key)
        .map(|key| key.public_key().to_base64())
        .map_err(VlanError::invalid_key("private key"))
}

fn check_network(network: &str) -> Result<IpNet, VlanError> {
    parse_subnet(network).map_err(VlanError::invalid_cidr(network))
}

impl VlanServer {
    /// Server with a freshly generated key pair
    pub fn new(peer_name: &str, network: &str, listen_port: u16) -> Result<Self, VlanError> {
        check_network(network)?;
        let private_key = PrivateKey::generate()?;
        info!(
            "Generated new server private key; public={}",
            private_key.public_key()
        );
        Ok(Self::from_key(peer_name, network, listen_port, &private_key))
    }

    /// Server using an existing base64 private key
    pub fn with_private_key(
        peer_name: &str,
        network: &str,
        listen_port: u16,
        private_key: &str,
    ) -> Result<Self, VlanError> {
        check_network(network)?;
        let private_key =
            PrivateKey::from_base64(private_key).map_err(VlanError::invalid_key("private key"))?;
        Ok(Self::from_key(peer_name, network, listen_port, &private_key))
    }

    fn from_key(peer_name: &str, network: &str, listen_port: u16, key: &PrivateKey) -> Self {
        Self {
            interface_name: None,
            peer_name: peer_name.to_string(),
            listen_port,
            network: network.to_string(),
            private_key: key.to_base64(),
            public_key: key.public_key().to_base64(),
            interface_extra: BTreeMap::new(),
            unknown: BTreeMap::new(),
        }
    }

    /// Name of the local tunnel interface
    pub fn interface_name(&self) -> &str {
        self.interface_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_INTERFACE_NAME)
    }

    /// The whole VLAN subnet, with the server address as its host part.
    ///
    /// The network must carry a prefix; a bare address is an error here.
    pub fn subnet(&self) -> Result<IpNet, VlanError> {
        check_network(&self.network)
    }

    /// The server's own address inside the VLAN
    pub fn address(&self) -> Result<IpAddr, VlanError> {
        self.subnet().map(|net| net.addr())
    }

    pub fn effective_public_key(&self) -> Result<String, VlanError> {
        effective_public_key(&self.private_key, &self.public_key)
    }
}

impl VlanClient {
    /// Address space routed to this client
    pub fn cidr(&self) -> Result<IpNet, VlanError> {
        parse_cidr(&self.network).map_err(VlanError::invalid_cidr(&self.network))
    }

    pub fn has_private_key(&self) -> bool {
        !self.private_key.is_empty()
    }

    pub fn effective_public_key(&self) -> Result<String, VlanError> {
        effective_public_key(&self.private_key, &self.public_key)
    }
}

impl Vlan {
    /// VLAN around `server` with no clients and the default keep-alive
    pub fn new(server: VlanServer) -> Self {
        Self {
            public_endpoint: String::new(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            server,
            clients: Vec::new(),
            unknown: BTreeMap::new(),
        }
    }

    /// VLAN built entirely from the defaults, with a fresh server key pair
    pub fn generate_default() -> Result<Self, VlanError> {
        VlanServer::new(DEFAULT_SERVER_NAME, DEFAULT_NETWORK, DEFAULT_LISTEN_PORT).map(Self::new)
    }

    pub fn with_public_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.public_endpoint = endpoint.into();
        self
    }

    pub fn with_keep_alive(mut self, seconds: u32) -> Self {
        self.keep_alive = seconds;
        self
    }

    /// Look up a client by exact name
    pub fn client(&self, name: &str) -> Option<&VlanClient> {
        self.clients.iter().find(|client| client.peer_name == name)
    }

    /// Fill in every public key that is absent but derivable.
    ///
    /// Run once after loading and after each mutation; readers such as the
    /// renderers never fill fields in themselves.
    pub fn normalize(&mut self) -> Result<(), VlanError> {
        if self.server.public_key.is_empty() && !self.server.private_key.is_empty() {
            self.server.public_key = self.server.effective_public_key()?;
        }
        for client in &mut self.clients {
            if client.public_key.is_empty() && client.has_private_key() {
                client.public_key = client.effective_public_key()?;
            }
        }
        Ok(())
    }

    /// Next free address in the server's subnet.
    ///
    /// The server address and every client's address and subnet count as taken.
    pub fn next_address(&self) -> Result<IpAddr, VlanError> {
        let subnet = self.server.subnet()?;

        let mut taken_addresses = vec![subnet.addr()];
        let mut taken_subnets = Vec::with_capacity(self.clients.len());
        for client in &self.clients {
            let cidr = client.cidr()?;
            taken_addresses.push(cidr.addr());
            taken_subnets.push(cidr);
        }

        Ok(pick_next_address(&subnet, &taken_addresses, &taken_subnets)?)
    }

    /// Add a client with its own key pair.
    ///
    /// A fresh key pair is generated unless `private_key` is given. The
    /// model is left untouched if anything fails.
    pub fn add_client(
        &mut self,
        name: &str,
        private_key: Option<&str>,
    ) -> Result<&VlanClient, VlanError> {
        let network = self.prepare_client(name)?;
        let private_key = match private_key.filter(|key| !key.is_empty()) {
            Some(encoded) => {
                PrivateKey::from_base64(encoded).map_err(VlanError::invalid_key("private key"))?
            }
            None => PrivateKey::generate()?,
        };
        let preshared_key = PresharedKey::generate()?;

        self.push_client(VlanClient {
            peer_name: name.to_string(),
            network,
            private_key: private_key.to_base64(),
            public_key: private_key.public_key().to_base64(),
            preshared_key: preshared_key.to_base64(),
            interface_extra: BTreeMap::new(),
            unknown: BTreeMap::new(),
        })
    }

    /// Add a client that keeps its private key to itself.
    ///
    /// Only the public key is stored; the preshared key is still generated here.
    pub fn add_client_with_public_key(
        &mut self,
        name: &str,
        public_key: &str,
    ) -> Result<&VlanClient, VlanError> {
        let network = self.prepare_client(name)?;
        let public_key =
            PublicKey::from_base64(public_key).map_err(VlanError::invalid_key("public key"))?;
        let preshared_key = PresharedKey::generate()?;

        self.push_client(VlanClient {
            peer_name: name.to_string(),
            network,
            private_key: String::new(),
            public_key: public_key.to_base64(),
            preshared_key: preshared_key.to_base64(),
            interface_extra: BTreeMap::new(),
            unknown: BTreeMap::new(),
        })
    }

    /// Name checks plus address allocation shared by both add operations
    fn prepare_client(&self, name: &str) -> Result<String, VlanError> {
        if name.is_empty() {
            return Err(VlanError::EmptyName);
        }
        if self.client(name).is_some() {
            return Err(VlanError::DuplicateName(name.to_string()));
        }
        Ok(self.next_address()?.to_string())
    }

    fn push_client(&mut self, client: VlanClient) -> Result<&VlanClient, VlanError> {
        info!(
            "Created client: {} - {}",
            client.peer_name, client.network
        );
        let idx = self.clients.len();
        self.clients.push(client);
        Ok(&self.clients[idx])
    }
}
