//! Handlers behind the `wg-vlan` subcommands.
//!
//! Each handler takes file paths and an output sink so it can run without a
//! process around it; `main` only parses arguments and dispatches here.

use crate::defaults::{
    DEFAULT_KEEP_ALIVE, DEFAULT_LISTEN_PORT, DEFAULT_NETWORK, DEFAULT_PEER_ADDRESS,
    DEFAULT_SERVER_NAME,
};
use crate::keys::PrivateKey;
use crate::render::{
    render_client_config, render_qr, render_server_config, render_standalone_interface,
    PeerConfig,
};
use crate::vlan::{create_vlan, load_vlan, save_vlan, Vlan, VlanClient, VlanServer};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::io::Write;
use std::path::Path;

/// Settings for a brand new VLAN document
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub server_name: String,
    pub public_endpoint: String,
    pub network: String,
    pub listen_port: u16,
    /// Base64 server private key; generated when absent
    pub private_key: Option<String>,
    pub keep_alive: u32,
    pub interface_name: Option<String>,
    /// Clients created right away, in order
    pub clients: Vec<String>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            public_endpoint: String::new(),
            network: DEFAULT_NETWORK.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            private_key: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
            interface_name: None,
            clients: Vec::new(),
        }
    }
}

/// Build a VLAN from `options` and write it to `config_path`.
///
/// Fails without touching the filesystem if the file already exists.
pub fn init(config_path: &Path, options: &InitOptions) -> Result<Vlan> {
    let server = match options.private_key.as_deref().filter(|key| !key.is_empty()) {
        Some(key) => VlanServer::with_private_key(
            &options.server_name,
            &options.network,
            options.listen_port,
            key,
        )?,
        None => VlanServer::new(&options.server_name, &options.network, options.listen_port)?,
    };

    let mut vlan = Vlan::new(server)
        .with_public_endpoint(options.public_endpoint.as_str())
        .with_keep_alive(options.keep_alive);
    vlan.server.interface_name = options.interface_name.clone();

    for name in &options.clients {
        vlan.add_client(name, None)
            .wrap_err_with(|| format!("Failed to create client '{}'", name))?;
    }

    for warning in vlan.validate().into_result()? {
        warn!("config warning: {}", warning);
    }

    create_vlan(&vlan, config_path)?;
    info!(
        "Initialized VLAN '{}' on interface {} ({})",
        vlan.server.peer_name,
        vlan.server.interface_name(),
        vlan.server.network
    );
    Ok(vlan)
}

/// Key material for a client being added
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientKey {
    Generate,
    /// Base64 private key; the public key is derived and stored too
    Private(String),
    /// Base64 public key only; the private key stays with the client
    Public(String),
}

/// Add one client to the document at `config_path` and save it back
pub fn client_add(config_path: &Path, name: &str, key: &ClientKey) -> Result<VlanClient> {
    let mut vlan = load_vlan(config_path)?;

    let client = match key {
        ClientKey::Generate => vlan.add_client(name, None)?,
        ClientKey::Private(private_key) => vlan.add_client(name, Some(private_key.as_str()))?,
        ClientKey::Public(public_key) => vlan.add_client_with_public_key(name, public_key)?,
    }
    .clone();

    vlan.normalize()?;
    save_vlan(&vlan, config_path)?;
    Ok(client)
}

/// Which peer's configuration to print
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Server,
    Client(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Qr,
}

fn write_config(config: &PeerConfig, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let text = config.to_string();
    match format {
        OutputFormat::Text => write!(out, "{}", text)?,
        OutputFormat::Qr => writeln!(out, "{}", render_qr(&text)?)?,
    }
    out.flush()?;
    Ok(())
}

/// Render the server's or one client's configuration from `config_path`
pub fn print(
    config_path: &Path,
    target: &Target,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let vlan = load_vlan(config_path)?;
    let config = match target {
        Target::Server => render_server_config(&vlan)?,
        Target::Client(name) => render_client_config(&vlan, name)?,
    };
    write_config(&config, format, out)
}

/// Settings for a standalone peer
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Name written into the comment; the host name when absent
    pub name: Option<String>,
    pub address: String,
    pub listen_port: u16,
    pub private_key: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            name: None,
            address: DEFAULT_PEER_ADDRESS.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            private_key: None,
        }
    }
}

/// Name of this machine, or an empty string when it cannot be read
pub fn default_peer_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Write a single-peer `[Interface]` config, not tied to any VLAN document
pub fn generate(options: &GenerateOptions, out: &mut impl Write) -> Result<()> {
    let name = options.name.clone().unwrap_or_else(default_peer_name);
    let private_key = match options.private_key.as_deref().filter(|key| !key.is_empty()) {
        Some(key) => PrivateKey::from_base64(key).wrap_err("invalid private key")?,
        None => PrivateKey::generate()?,
    };
    info!("Generated peer '{}' public={}", name, private_key.public_key());

    let config = render_standalone_interface(
        &name,
        &options.address,
        options.listen_port,
        &private_key,
    )
    .wrap_err_with(|| format!("Failed to parse address '{}'", options.address))?;
    writeln!(out, "{}", config)?;
    Ok(())
}
