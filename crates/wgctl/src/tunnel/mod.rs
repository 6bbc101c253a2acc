//! Tunnel lifecycle.
//!
//! [`TunnelController`] drives a tunnel up and down through three
//! collaborators:
//!
//! - a [`DeviceGateway`](crate::netlink::genl::wireguard::DeviceGateway)
//!   for WireGuard device state
//! - a [`LinkControl`] for links, addresses, routes and rules
//! - a [`HookRunner`] for post-up and pre-down commands
//!
//! Bring-up order:
//!
//! 1. check that keys and endpoints decode, refuse if the device exists,
//!    else create the `wireguard` link
//! 2. assign the address, if one is configured, and set the link up
//! 3. configure keys, port and peers
//! 4. add a route per allowed IP, or the catch-all policy ([`policy`])
//!    once when a peer routes `0.0.0.0/0`, then run post-up hooks
//!
//! Tear-down runs pre-down hooks, deletes the link and then removes the
//! catch-all rules on a best-effort basis.

mod control;
mod controller;
mod hooks;
pub mod policy;

pub use control::{LinkControl, NetlinkLinkControl};
pub use controller::{TunnelController, TunnelState, WIREGUARD_KIND};
pub use hooks::{CommandHookRunner, HookRunner};
pub use policy::{PolicyAction, PolicyOp, RuleSpec, policy_operations};
