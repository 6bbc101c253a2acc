//! Route installation.
//!
//! Routes added here are device routes (`ip route add <dst> dev <link>
//! [table <id>]`): protocol boot, scope link, unicast.

use tracing::debug;

use super::attr::Attribute;
use super::builder::MessageBuilder;
use super::connection::{Connection, create_request};
use super::error::Result;
use super::interface_ref::InterfaceRef;
use super::message::NlMsgType;
use super::types::route::{RtMsg, RtaAttr, rt_scope, rt_table, rtn, rtprot};
use crate::util::IpPrefix;

/// Build an `RTM_NEWROUTE` request for `dst` via the link at `oif`.
///
/// Without a table the route lands in `main`. Tables above 255 do not fit
/// `rtm_table` and are sent as `RTA_TABLE`.
pub fn route_request(dst: &IpPrefix, oif: u32, table: Option<u32>) -> MessageBuilder {
    let table = table.unwrap_or(rt_table::MAIN as u32);
    let rtmsg = RtMsg {
        rtm_family: dst.family() as u8,
        rtm_dst_len: dst.prefix_len,
        rtm_table: if table > 255 { rt_table::UNSPEC } else { table as u8 },
        rtm_protocol: rtprot::BOOT,
        rtm_scope: rt_scope::LINK,
        rtm_type: rtn::UNICAST,
        ..Default::default()
    };

    let mut builder = create_request(NlMsgType::RTM_NEWROUTE);
    builder.append_header(&rtmsg);
    if dst.prefix_len > 0 {
        builder.append_attr(&Attribute::bytes(RtaAttr::Dst as u16, dst.addr_bytes()));
    }
    builder.append_attr(&Attribute::u32(RtaAttr::Oif as u16, oif));
    if table > 255 {
        builder.append_attr(&Attribute::u32(RtaAttr::Table as u16, table));
    }
    builder
}

impl Connection {
    /// Add a device route, optionally into a specific table.
    pub async fn add_route(
        &self,
        dst: &IpPrefix,
        dev: &InterfaceRef,
        table: Option<u32>,
    ) -> Result<()> {
        let oif = self.link_index(dev).await?;
        debug!(%dst, %dev, ?table, "adding route");
        self.request_ack(route_request(dst, oif, table))
            .await
            .map_err(|e| e.with_context(format!("adding route {} dev {}", dst, dev)))
    }
}
