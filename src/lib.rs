//! # wg-vlan - Declarative WireGuard VLAN manager
//!
//! This library keeps a small WireGuard overlay network (one server, many
//! clients) in a single YAML document and generates the peer configuration
//! files every member needs.
//!
//! ## Overview
//!
//! A VLAN document is edited only through operations that keep it
//! consistent: client names stay unique, every client gets the next free
//! address in the server's subnet, and key pairs and preshared keys are
//! generated on the spot. Rendering reads the document and never changes it.
//!
//! ## Key Features
//!
//! - **Key Material**: X25519 key pairs and preshared keys, base64 encoded
//! - **Address Allocation**: Deterministic next-free-address scan over IPv4 and IPv6 subnets
//! - **Validation**: Every structural problem reported at once, with its position
//! - **Peer Configs**: WireGuard INI for the server or any client, as text or QR code
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `keys`: Key generation, decoding and public key derivation
//! - `ip`: CIDR parsing and the address allocator
//! - `vlan`: Document types, mutation, validation and YAML persistence
//! - `render`: INI model and the server/client config renderers
//! - `commands`: Handlers behind the `wg-vlan` subcommands
//! - `defaults`: Process-wide default values
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use wg_vlan::render::render_client_config;
//! use wg_vlan::vlan::{load_vlan, save_vlan};
//!
//! let path = std::path::Path::new("vlan.yaml");
//! let mut vlan = load_vlan(path)?;
//! vlan.add_client("laptop", None)?;
//! save_vlan(&vlan, path)?;
//!
//! println!("{}", render_client_config(&vlan, "laptop")?);
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Document Format
//!
//! ```yaml
//! public_endpoint: vpn.example.com:51820
//! keep_alive: 25
//! server:
//!   peer_name: wg-vlan
//!   listen_port: 51820
//!   network: 10.20.30.1/24
//!   private_key: ...
//!   public_key: ...
//! clients:
//!   - peer_name: laptop
//!     network: 10.20.30.2
//!     private_key: ...
//!     public_key: ...
//!     preshared_key: ...
//! ```
//!
//! ## Error Handling
//!
//! Core modules return typed `thiserror` errors (`KeyError`, `AllocationError`,
//! `VlanError`). Persistence and the command handlers return
//! `color_eyre::Result` with file context attached.

pub mod commands;
pub mod defaults;
pub mod ip;
pub mod keys;
pub mod render;
pub mod vlan;
