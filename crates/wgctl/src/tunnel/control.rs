//! Link, address, route and rule primitives used during bring-up/tear-down.

use crate::netlink::connection::Connection;
use crate::netlink::error::Result;
use crate::netlink::interface_ref::InterfaceRef;
use crate::netlink::socket::Protocol;
use crate::util::IpPrefix;

use super::policy::RuleSpec;

/// The generic network primitives the orchestrator sequences.
#[allow(async_fn_in_trait)]
pub trait LinkControl {
    /// Create a link of `kind` named `name`.
    async fn create_link(&self, name: &str, kind: &str) -> Result<()>;

    async fn delete_link(&self, name: &str) -> Result<()>;

    async fn set_link_up(&self, name: &str) -> Result<()>;

    async fn add_address(&self, name: &str, address: &IpPrefix) -> Result<()>;

    /// Route `dst` through `dev`, in `table` or `main`.
    async fn add_route(&self, dst: &IpPrefix, dev: &str, table: Option<u32>) -> Result<()>;

    async fn add_rule(&self, rule: &RuleSpec) -> Result<()>;

    /// Delete the rule matching `rule`.
    async fn delete_rule(&self, rule: &RuleSpec) -> Result<()>;
}

/// [`LinkControl`] over a route netlink socket.
pub struct NetlinkLinkControl {
    conn: Connection,
}

impl NetlinkLinkControl {
    /// Open a `NETLINK_ROUTE` socket for this invocation.
    pub fn new() -> Result<Self> {
        Ok(Self {
            conn: Connection::new(Protocol::Route)?,
        })
    }
}

impl LinkControl for NetlinkLinkControl {
    async fn create_link(&self, name: &str, kind: &str) -> Result<()> {
        self.conn.add_link(name, kind).await
    }

    async fn delete_link(&self, name: &str) -> Result<()> {
        self.conn.del_link(&InterfaceRef::name(name)).await
    }

    async fn set_link_up(&self, name: &str) -> Result<()> {
        self.conn.set_link_up(&InterfaceRef::name(name)).await
    }

    async fn add_address(&self, name: &str, address: &IpPrefix) -> Result<()> {
        self.conn.add_address(&InterfaceRef::name(name), address).await
    }

    async fn add_route(&self, dst: &IpPrefix, dev: &str, table: Option<u32>) -> Result<()> {
        self.conn.add_route(dst, &InterfaceRef::name(dev), table).await
    }

    async fn add_rule(&self, rule: &RuleSpec) -> Result<()> {
        self.conn.add_rule(&rule.to_builder()).await
    }

    async fn delete_rule(&self, rule: &RuleSpec) -> Result<()> {
        self.conn.del_rule(&rule.to_builder()).await
    }
}
