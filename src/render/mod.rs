//! Peer configuration rendering.
//!
//! Turns a VLAN document into WireGuard INI text for the server or for one
//! named client. Renderers only read the model; public keys that are absent
//! but derivable are computed on the fly.

pub mod ini;
pub mod qr;

pub use ini::{IniError, PeerConfig, Section, SectionKind};
pub use qr::{render_qr, QrError};

use crate::ip::parse_cidr;
use crate::keys::PrivateKey;
use crate::vlan::{Vlan, VlanClient, VlanError};
use std::collections::BTreeMap;

fn server_comment(name: &str) -> String {
    format!("VLAN Server: {}", name)
}

fn client_comment(name: &str) -> String {
    format!("VLAN Client: {}", name)
}

fn apply_extra(section: &mut Section, extra: &BTreeMap<String, String>) {
    for (key, value) in extra {
        section.set(key, value.as_str());
    }
}

fn keep_alive_value(keep_alive: u32) -> String {
    if keep_alive == 0 {
        String::new()
    } else {
        keep_alive.to_string()
    }
}

/// `[Peer]` entry the server keeps for one client
fn server_side_peer(vlan: &Vlan, client: &VlanClient) -> Result<Section, VlanError> {
    let mut peer = Section::new(SectionKind::Peer).with_comment(client_comment(&client.peer_name));
    peer.set("AllowedIPs", client.cidr()?.to_string())
        .set("PublicKey", client.effective_public_key()?)
        .set("PresharedKey", client.preshared_key.as_str())
        .set("PersistentKeepalive", keep_alive_value(vlan.keep_alive));
    Ok(peer)
}

/// Server configuration: the server interface plus one peer per client, in
/// document order.
pub fn render_server_config(vlan: &Vlan) -> Result<PeerConfig, VlanError> {
    let server = &vlan.server;
    // Validate the network before echoing it back as written
    server.subnet()?;

    let mut interface =
        Section::new(SectionKind::Interface).with_comment(server_comment(&server.peer_name));
    interface
        .set("Address", server.network.trim())
        .set("ListenPort", server.listen_port.to_string())
        .set("PrivateKey", server.private_key.as_str());
    apply_extra(&mut interface, &server.interface_extra);

    let mut config = PeerConfig::new(interface);
    for client in &vlan.clients {
        config.push_peer(server_side_peer(vlan, client)?);
    }
    Ok(config)
}

/// Configuration for the client called `name`, with the server as its only peer
pub fn render_client_config(vlan: &Vlan, name: &str) -> Result<PeerConfig, VlanError> {
    let client = vlan
        .client(name)
        .ok_or_else(|| VlanError::NoSuchClient(name.to_string()))?;
    if !client.has_private_key() {
        return Err(VlanError::MissingPrivateKey(name.to_string()));
    }
    if vlan.public_endpoint.is_empty() {
        return Err(VlanError::NoPublicEndpoint);
    }

    let mut interface =
        Section::new(SectionKind::Interface).with_comment(client_comment(&client.peer_name));
    interface
        .set("Address", client.cidr()?.to_string())
        .set("PrivateKey", client.private_key.as_str());
    apply_extra(&mut interface, &client.interface_extra);

    let server = &vlan.server;
    let mut peer =
        Section::new(SectionKind::Peer).with_comment(server_comment(&server.peer_name));
    peer.set("Endpoint", vlan.public_endpoint.as_str())
        .set("AllowedIPs", server.subnet()?.trunc().to_string())
        .set("PublicKey", server.effective_public_key()?)
        .set("PresharedKey", client.preshared_key.as_str())
        .set("PersistentKeepalive", keep_alive_value(vlan.keep_alive));

    let mut config = PeerConfig::new(interface);
    config.push_peer(peer);
    Ok(config)
}

/// A standalone `[Interface]` section for a peer outside any VLAN document.
///
/// `listen_port` of 0 leaves ListenPort out.
pub fn render_standalone_interface(
    name: &str,
    address: &str,
    listen_port: u16,
    private_key: &PrivateKey,
) -> Result<PeerConfig, VlanError> {
    let address = parse_cidr(address).map_err(VlanError::invalid_cidr(address))?;

    let mut interface = Section::new(SectionKind::Interface);
    interface.set_name(name);
    interface
        .set("Address", address.to_string())
        .set(
            "ListenPort",
            if listen_port == 0 {
                String::new()
            } else {
                listen_port.to_string()
            },
        )
        .set("PrivateKey", private_key.to_base64());

    let mut config = PeerConfig::new(interface);
    config.prune();
    Ok(config)
}
