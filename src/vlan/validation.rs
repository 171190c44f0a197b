//! VLAN document validation.
//!
//! Validation walks the shared settings, then the server, then every client
//! in order. It never stops at the first problem: all warnings and errors are
//! collected into a [`ValidationReport`], each tagged with its position.

use super::error::{Position, PositionedError, ValidationErrors, VlanError};
use super::model::{Vlan, VlanClient, VlanServer};
use crate::ip::cidr::nets_overlap;
use crate::keys::{PresharedKey, PrivateKey, PublicKey};
use ipnet::IpNet;
use std::collections::HashSet;

/// Outcome of [`Vlan::validate`]
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Non-fatal findings, already prefixed with their position
    pub warnings: Vec<String>,
    pub errors: Vec<PositionedError>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Warnings on success, or every error aggregated into one
    pub fn into_result(self) -> Result<Vec<String>, VlanError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(VlanError::Validation(ValidationErrors(self.errors)))
        }
    }

    fn warn(&mut self, position: Position, message: &str) {
        let warning = match position {
            Position::Vlan => message.to_string(),
            _ => format!("{}: {}", position, message),
        };
        self.warnings.push(warning);
    }

    fn error(&mut self, position: Position, error: VlanError) {
        self.errors.push(PositionedError { position, error });
    }
}

impl Vlan {
    /// Check every invariant of the document without changing it
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.keep_alive == 0 {
            report.warn(Position::Vlan, "keep-alive is not set");
        }
        if self.public_endpoint.is_empty() {
            report.warn(Position::Vlan, "public endpoint not set");
        }

        let server_net = validate_server(&self.server, &mut report);

        let mut seen_names = HashSet::new();
        let mut claimed: Vec<(usize, IpNet)> = Vec::with_capacity(self.clients.len());
        for (idx, client) in self.clients.iter().enumerate() {
            let position = Position::Client(idx);
            let client_net = validate_client(position, client, &mut report);

            if !client.peer_name.is_empty() && !seen_names.insert(client.peer_name.as_str()) {
                report.error(position, VlanError::DuplicateName(client.peer_name.clone()));
            }

            if let Some(net) = client_net {
                check_overlaps(position, &net, server_net.as_ref(), &claimed, self, &mut report);
                claimed.push((idx, net));
            }
        }

        report
    }
}

/// Returns the parsed server network when it is valid
fn validate_server(server: &VlanServer, report: &mut ValidationReport) -> Option<IpNet> {
    let position = Position::Server;

    if server.peer_name.is_empty() {
        report.error(position, VlanError::EmptyName);
    }
    if server.listen_port == 0 {
        report.error(position, VlanError::MissingListenPort);
    }

    let network = server
        .subnet()
        .map_err(|e| report.error(position, e))
        .ok();

    match PrivateKey::from_base64(&server.private_key) {
        Ok(private_key) => {
            check_public_key(position, &server.public_key, Some(&private_key), report);
        }
        Err(source) => report.error(
            position,
            VlanError::InvalidKey {
                field: "private key",
                source,
            },
        ),
    }

    network
}

/// Returns the parsed client network when it is valid
fn validate_client(
    position: Position,
    client: &VlanClient,
    report: &mut ValidationReport,
) -> Option<IpNet> {
    if client.peer_name.is_empty() {
        report.error(position, VlanError::EmptyName);
    }

    let network = client
        .cidr()
        .map_err(|e| report.error(position, e))
        .ok();

    let private_key = if client.has_private_key() {
        match PrivateKey::from_base64(&client.private_key) {
            Ok(key) => Some(key),
            Err(source) => {
                report.error(
                    position,
                    VlanError::InvalidKey {
                        field: "private key",
                        source,
                    },
                );
                None
            }
        }
    } else {
        report.warn(
            position,
            "private key unset; will not be able to generate client config",
        );
        if client.public_key.is_empty() {
            report.error(position, VlanError::MissingKeys);
        }
        None
    };
    check_public_key(position, &client.public_key, private_key.as_ref(), report);

    if client.preshared_key.is_empty() {
        report.warn(position, "preshared key unset; this is unsafe");
    } else if let Err(source) = PresharedKey::from_base64(&client.preshared_key) {
        report.error(
            position,
            VlanError::InvalidKey {
                field: "preshared key",
                source,
            },
        );
    }

    network
}

/// A stated public key must decode, and match the private key when there is one
fn check_public_key(
    position: Position,
    stated: &str,
    private_key: Option<&PrivateKey>,
    report: &mut ValidationReport,
) {
    if stated.is_empty() {
        return;
    }
    let stated_key = match PublicKey::from_base64(stated) {
        Ok(key) => key,
        Err(source) => {
            report.error(
                position,
                VlanError::InvalidKey {
                    field: "public key",
                    source,
                },
            );
            return;
        }
    };
    if let Some(private_key) = private_key {
        let derived = private_key.public_key();
        if derived != stated_key {
            report.error(
                position,
                VlanError::KeyMismatch {
                    stated: stated.to_string(),
                    derived: derived.to_base64(),
                },
            );
        }
    }
}

/// A client may not claim the server address or another client's space
fn check_overlaps(
    position: Position,
    net: &IpNet,
    server_net: Option<&IpNet>,
    claimed: &[(usize, IpNet)],
    vlan: &Vlan,
    report: &mut ValidationReport,
) {
    if let Some(server_net) = server_net {
        if net.contains(&server_net.addr()) {
            report.error(
                position,
                VlanError::AddressOverlap {
                    network: net.to_string(),
                    other: format!("server address {}", server_net.addr()),
                },
            );
        }
    }

    for (other_idx, other_net) in claimed {
        if nets_overlap(net, other_net) {
            report.error(
                position,
                VlanError::AddressOverlap {
                    network: net.to_string(),
                    other: format!(
                        "client[{}] '{}' ({})",
                        other_idx, vlan.clients[*other_idx].peer_name, other_net
                    ),
                },
            );
        }
    }
}
