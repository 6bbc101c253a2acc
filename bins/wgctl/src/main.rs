//! wgctl - bring WireGuard tunnels up and down.
//!
//! Tunnels are described by YAML files in `/etc/wireguard` and configured
//! over netlink, without `ip` or `wg`.

mod cli;
mod conn;
mod status;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "wgctl", version, about = "WireGuard tunnel controller")]
struct Cli {
    /// Log every netlink exchange and state transition.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start up a tunnel.
    #[command(visible_alias = "start")]
    Up {
        /// Instance name or path to a definition file.
        instance: String,
    },

    /// Bring down a tunnel.
    #[command(visible_alias = "stop")]
    Down {
        /// Instance name or path to a definition file.
        instance: String,
    },

    /// Restart a tunnel, reloading its definition.
    Restart {
        /// Instance name or path to a definition file.
        instance: String,
    },

    /// Show whether a tunnel is up (all tunnels if omitted).
    Status {
        /// Instance name or path to a definition file.
        instance: Option<String>,
    },

    /// Show information on a particular tunnel.
    Info {
        /// Instance name or path to a definition file.
        instance: String,

        /// Output JSON.
        #[arg(short = 'j', long)]
        json: bool,
    },

    /// Print version information.
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    if let Command::Version = cli.command {
        println!("wgctl version {}", env!("CARGO_PKG_VERSION"));
        println!("Copyright © 2018 Antoine POPINEAU");
        println!("Licence MIT");
        return;
    }

    // SAFETY: geteuid has no preconditions.
    if unsafe { libc::geteuid() } != 0 {
        cli::fatal("this should be run as root");
    }

    let result = match cli.command {
        Command::Up { instance } => conn::up(&instance).await,
        Command::Down { instance } => conn::down(&instance).await,
        Command::Restart { instance } => conn::restart(&instance).await,
        Command::Status { instance: None } => status::status_all().await,
        Command::Status {
            instance: Some(instance),
        } => status::status(&instance).await,
        Command::Info { instance, json } => status::info(&instance, json).await,
        Command::Version => Ok(()),
    };

    if let Err(e) = result {
        cli::fatal(&e.to_string());
    }
}
