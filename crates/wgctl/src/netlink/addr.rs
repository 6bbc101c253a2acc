//! Interface address assignment.

use tracing::debug;

use super::attr::Attribute;
use super::builder::MessageBuilder;
use super::connection::{Connection, create_request};
use super::error::Result;
use super::interface_ref::InterfaceRef;
use super::message::NlMsgType;
use super::types::addr::{IfAddrMsg, IfaAttr};
use crate::util::IpPrefix;

/// Build an `RTM_NEWADDR` request assigning `prefix` to the link at `index`.
///
/// The address goes in both `IFA_LOCAL` and `IFA_ADDRESS`, as `ip address
/// add` does for point-to-point style links.
pub fn address_request(index: u32, prefix: &IpPrefix) -> MessageBuilder {
    let ifaddr = IfAddrMsg {
        ifa_family: prefix.family() as u8,
        ifa_prefixlen: prefix.prefix_len,
        ifa_index: index,
        ..Default::default()
    };

    let mut builder = create_request(NlMsgType::RTM_NEWADDR);
    builder.append_header(&ifaddr);
    builder.append_attrs(&[
        Attribute::bytes(IfaAttr::Local as u16, prefix.addr_bytes()),
        Attribute::bytes(IfaAttr::Address as u16, prefix.addr_bytes()),
    ]);
    builder
}

impl Connection {
    /// Assign an address to an interface.
    pub async fn add_address(&self, iface: &InterfaceRef, prefix: &IpPrefix) -> Result<()> {
        let index = self.link_index(iface).await?;
        debug!(%iface, %prefix, "adding address");
        self.request_ack(address_request(index, prefix))
            .await
            .map_err(|e| e.with_context(format!("adding address {} to {}", prefix, iface)))
    }
}
