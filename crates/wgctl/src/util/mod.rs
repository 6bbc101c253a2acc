//! Small helpers shared by the config loader and the netlink layer.

pub mod addr;

pub use addr::{AddrError, IpPrefix};
