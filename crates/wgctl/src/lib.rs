//! WireGuard tunnel lifecycle for Linux, spoken directly over netlink.
//!
//! This crate brings WireGuard tunnels up and down without shelling out to
//! `ip` or `wg`. Device configuration goes over the generic netlink
//! `wireguard` family; links, addresses, routes and policy rules go over
//! route netlink.
//!
//! # Layers
//!
//! - [`netlink`] - socket, framing, the attribute tree codec and the
//!   WireGuard message mapper and gateway
//! - [`tunnel`] - the bring-up/tear-down state machine, the routing policy
//!   for catch-all peers, and the link and hook collaborators
//! - [`config`] - YAML tunnel definitions from `/etc/wireguard`
//! - `output` - text and JSON rendering of device state (feature `output`)
//!
//! # Example
//!
//! ```ignore
//! use wgctl::config;
//! use wgctl::netlink::genl::wireguard::WireguardGateway;
//! use wgctl::tunnel::{CommandHookRunner, NetlinkLinkControl, TunnelController};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> wgctl::Result<()> {
//!     let config = config::load("wg0")?;
//!
//!     let gateway = WireguardGateway::new().await?;
//!     let links = NetlinkLinkControl::new()?;
//!     let hooks = CommandHookRunner;
//!
//!     TunnelController::new(&gateway, &links, &hooks).up(&config).await
//! }
//! ```

pub mod config;
pub mod netlink;
pub mod tunnel;
pub mod util;

#[cfg(feature = "output")]
pub mod output;

pub use config::TunnelConfig;
pub use netlink::{Error, Result};
