use clap::{Parser, Subcommand};
use color_eyre::Result;
use env_logger::Env;
use std::io;
use std::path::PathBuf;

use wg_vlan::commands::{self, ClientKey, GenerateOptions, InitOptions, OutputFormat, Target};
use wg_vlan::defaults::{
    DEFAULT_KEEP_ALIVE, DEFAULT_LISTEN_PORT, DEFAULT_NETWORK, DEFAULT_PEER_ADDRESS,
    DEFAULT_SERVER_NAME,
};

/// Manage a WireGuard VLAN from a single YAML document
#[derive(Parser, Debug)]
#[command(name = "wg-vlan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a new VLAN configuration file
    Init {
        /// YAML config file to write to
        #[arg(short = 'f', long = "vlan-config")]
        config: PathBuf,

        /// Peer name of the server
        #[arg(short, long, default_value = DEFAULT_SERVER_NAME)]
        name: String,

        /// Public endpoint (host:port) for clients to connect to
        #[arg(short, long, default_value = "")]
        endpoint: String,

        /// CIDR address/mask of the VLAN subnet
        #[arg(long, visible_alias = "net", default_value = DEFAULT_NETWORK)]
        network: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_LISTEN_PORT)]
        port: u16,

        /// Server private key (base64); a new one is generated when omitted
        #[arg(short = 'k', long)]
        private_key: Option<String>,

        /// Keep-alive interval in seconds, 0 to disable
        #[arg(long, default_value_t = DEFAULT_KEEP_ALIVE)]
        keep_alive: u32,

        /// Name of the server's tunnel interface
        #[arg(long = "interface")]
        interface_name: Option<String>,

        /// Create a client with this name (repeatable)
        #[arg(long = "client")]
        clients: Vec<String>,
    },

    /// Add a client to an existing VLAN
    #[command(visible_alias = "add")]
    ClientAdd {
        /// YAML config file to update
        #[arg(short = 'f', long = "vlan-config")]
        config: PathBuf,

        /// Peer name of the new client
        #[arg(short, long)]
        name: String,

        /// Client public key (base64); the private key stays with the client
        #[arg(long, conflicts_with = "private_key")]
        public_key: Option<String>,

        /// Client private key (base64); a new one is generated when omitted
        #[arg(long)]
        private_key: Option<String>,
    },

    /// Print the server's or a client's WireGuard config
    Print {
        /// YAML config file to read
        #[arg(short = 'c', long = "vlan-config", visible_alias = "config")]
        config: PathBuf,

        /// Print the server config
        #[arg(short, long, conflicts_with = "client", required_unless_present = "client")]
        server: bool,

        /// Print the named client's config
        #[arg(long)]
        client: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print a standalone WireGuard peer config to stdout
    #[command(visible_alias = "gen")]
    Generate {
        /// Name of this host, written as a comment; defaults to the host name
        #[arg(short, long)]
        name: Option<String>,

        /// Address of this peer; include a netmask to define the network size
        #[arg(short, long, visible_alias = "ip", default_value = DEFAULT_PEER_ADDRESS)]
        address: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_LISTEN_PORT)]
        port: u16,

        /// Private key (base64); a new one is generated when omitted
        #[arg(short = 'k', long = "key", visible_alias = "private-key")]
        private_key: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let cli = Cli::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    run(cli.command)
}

fn run(command: Commands) -> Result<()> {
    let mut stdout = io::stdout().lock();

    match command {
        Commands::Init {
            config,
            name,
            endpoint,
            network,
            port,
            private_key,
            keep_alive,
            interface_name,
            clients,
        } => {
            let options = InitOptions {
                server_name: name,
                public_endpoint: endpoint,
                network,
                listen_port: port,
                private_key,
                keep_alive,
                interface_name,
                clients,
            };
            commands::init(&config, &options)?;
        }
        Commands::ClientAdd {
            config,
            name,
            public_key,
            private_key,
        } => {
            let key = match (public_key, private_key) {
                (Some(public_key), _) => ClientKey::Public(public_key),
                (None, Some(private_key)) => ClientKey::Private(private_key),
                (None, None) => ClientKey::Generate,
            };
            commands::client_add(&config, &name, &key)?;
        }
        Commands::Print {
            config,
            server,
            client,
            format,
        } => {
            let target = match (server, client) {
                (_, Some(name)) => Target::Client(name),
                _ => Target::Server,
            };
            commands::print(&config, &target, format, &mut stdout)?;
        }
        Commands::Generate {
            name,
            address,
            port,
            private_key,
        } => {
            let options = GenerateOptions {
                name,
                address,
                listen_port: port,
                private_key,
            };
            commands::generate(&options, &mut stdout)?;
        }
    }

    Ok(())
}
