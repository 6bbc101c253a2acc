//! Policy routing rules.
//!
//! ```ignore
//! use wgctl::netlink::rule::RuleBuilder;
//!
//! // ip rule add table main suppress_prefixlength 0 priority 18000
//! conn.add_rule(&RuleBuilder::v4().table(254).suppress_prefixlen(0).priority(18000)).await?;
//!
//! // ip rule add fwmark 51820 table 51820 priority 20000
//! conn.add_rule(&RuleBuilder::v4().fwmark(51820).table(51820).priority(20000)).await?;
//! ```

use tracing::debug;

use super::attr::Attribute;
use super::builder::MessageBuilder;
use super::connection::{Connection, ack_request, create_request};
use super::error::Result;
use super::message::NlMsgType;
use super::types::rule::{FibRuleAction, FibRuleHdr, FraAttr};

/// Builder for a `lookup <table>` rule.
///
/// The same builder selects the rule to delete; the kernel matches on every
/// attribute that is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBuilder {
    family: u8,
    priority: Option<u32>,
    fwmark: Option<u32>,
    suppress_prefixlen: Option<u32>,
    table: u32,
}

impl RuleBuilder {
    /// Create a new rule builder for the given address family.
    pub fn new(family: u8) -> Self {
        Self {
            family,
            priority: None,
            fwmark: None,
            suppress_prefixlen: None,
            table: 0,
        }
    }

    /// IPv4 rule.
    pub fn v4() -> Self {
        Self::new(libc::AF_INET as u8)
    }

    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Match packets carrying this firewall mark.
    pub fn fwmark(mut self, mark: u32) -> Self {
        self.fwmark = Some(mark);
        self
    }

    /// Reject lookup results with a prefix length at or below `len`.
    pub fn suppress_prefixlen(mut self, len: u32) -> Self {
        self.suppress_prefixlen = Some(len);
        self
    }

    pub fn table(mut self, table: u32) -> Self {
        self.table = table;
        self
    }

    /// Build the netlink message for adding this rule.
    pub fn build(&self) -> MessageBuilder {
        self.build_internal(create_request(NlMsgType::RTM_NEWRULE))
    }

    /// Build the netlink message for deleting this rule.
    pub fn build_delete(&self) -> MessageBuilder {
        self.build_internal(ack_request(NlMsgType::RTM_DELRULE))
    }

    fn build_internal(&self, mut builder: MessageBuilder) -> MessageBuilder {
        let hdr = FibRuleHdr {
            family: self.family,
            action: FibRuleAction::ToTbl as u8,
            table: if self.table <= 255 { self.table as u8 } else { 0 },
            ..Default::default()
        };
        builder.append_header(&hdr);

        if let Some(prio) = self.priority {
            builder.append_attr(&Attribute::u32(FraAttr::Priority as u16, prio));
        }
        // No FRA_FWMASK: the kernel then compares the whole mark.
        if let Some(mark) = self.fwmark {
            builder.append_attr(&Attribute::u32(FraAttr::Fwmark as u16, mark));
        }
        if let Some(len) = self.suppress_prefixlen {
            builder.append_attr(&Attribute::u32(FraAttr::SuppressPrefixlen as u16, len));
        }
        if self.table > 255 {
            builder.append_attr(&Attribute::u32(FraAttr::Table as u16, self.table));
        }

        builder
    }
}

impl Connection {
    /// Add a policy routing rule.
    pub async fn add_rule(&self, rule: &RuleBuilder) -> Result<()> {
        debug!(?rule, "adding rule");
        self.request_ack(rule.build())
            .await
            .map_err(|e| e.with_context("adding rule"))
    }

    /// Delete a policy routing rule.
    pub async fn del_rule(&self, rule: &RuleBuilder) -> Result<()> {
        debug!(?rule, "deleting rule");
        self.request_ack(rule.build_delete())
            .await
            .map_err(|e| e.with_context("deleting rule"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{decode_attrs, find};
    use crate::netlink::message::{NLM_F_CREATE, NLMSG_HDRLEN, NlMsgHdr};
    use zerocopy::FromBytes;

    #[test]
    fn test_suppress_rule_uses_header_table() {
        let msg = RuleBuilder::v4()
            .table(254)
            .suppress_prefixlen(0)
            .priority(18000)
            .build()
            .finish();

        let (hdr, rest) = FibRuleHdr::read_from_prefix(&msg[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(hdr.table, 254);
        assert_eq!(hdr.action, FibRuleAction::ToTbl as u8);

        let attrs = decode_attrs(rest).unwrap();
        assert_eq!(find(&attrs, FraAttr::Priority as u16).unwrap().as_u32().unwrap(), 18000);
        assert_eq!(find(&attrs, FraAttr::SuppressPrefixlen as u16).unwrap().as_u32().unwrap(), 0);
        assert!(find(&attrs, FraAttr::Table as u16).is_none());
        assert!(find(&attrs, FraAttr::Fwmark as u16).is_none());
    }

    #[test]
    fn test_fwmark_rule_uses_table_attr() {
        let msg = RuleBuilder::v4()
            .fwmark(51820)
            .table(51820)
            .priority(20000)
            .build()
            .finish();

        let (hdr, rest) = FibRuleHdr::read_from_prefix(&msg[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(hdr.table, 0);

        let attrs = decode_attrs(rest).unwrap();
        assert_eq!(find(&attrs, FraAttr::Fwmark as u16).unwrap().as_u32().unwrap(), 51820);
        assert_eq!(find(&attrs, FraAttr::Table as u16).unwrap().as_u32().unwrap(), 51820);
    }

    #[test]
    fn test_delete_has_no_create_flag() {
        let msg = RuleBuilder::v4().table(254).build_delete().finish();
        let hdr = NlMsgHdr::parse(&msg).unwrap();
        assert_eq!(hdr.nlmsg_type, NlMsgType::RTM_DELRULE);
        assert_eq!(hdr.nlmsg_flags & NLM_F_CREATE, 0);
    }
}
