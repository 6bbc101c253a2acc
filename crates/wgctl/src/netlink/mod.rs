//! Async netlink plumbing for WireGuard tunnels.
//!
//! Two protocols are spoken:
//!
//! - `NETLINK_GENERIC` for the `wireguard` family ([`genl::wireguard`])
//! - `NETLINK_ROUTE` for links, addresses, routes and policy rules
//!   ([`link`], [`addr`], [`route`], [`rule`])
//!
//! Every exchange goes through a [`Connection`], which owns one socket for
//! its lifetime. Connections are created per command invocation and never
//! shared between tunnels.

pub mod addr;
pub mod attr;
pub mod builder;
pub mod connection;
pub mod error;
pub mod genl;
pub mod interface_ref;
pub mod link;
pub mod message;
pub mod route;
pub mod rule;
pub mod socket;
pub mod types;

pub use attr::{AttrValue, Attribute};
pub use builder::MessageBuilder;
pub use connection::Connection;
pub use error::{Error, Result};
pub use interface_ref::InterfaceRef;
pub use link::LinkInfo;
pub use socket::{NetlinkSocket, Protocol, RECV_TIMEOUT};
