//! Fixed-size route netlink headers and attribute ids.

pub mod addr;
pub mod link;
pub mod route;
pub mod rule;
