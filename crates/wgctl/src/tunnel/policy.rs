//! Policy routing for catch-all peers.
//!
//! A peer that routes `0.0.0.0/0` would capture the tunnel's own encrypted
//! traffic. The fix is the usual WireGuard trio:
//!
//! ```text
//! ip route add 0.0.0.0/0 dev <tunnel> table <port>
//! ip rule add table main suppress_prefixlength 0 priority 18000
//! ip rule add fwmark <port> table <port> priority 20000
//! ```
//!
//! The table id is the tunnel's listen port, so two catch-all tunnels must
//! not share a port.

use crate::netlink::rule::RuleBuilder;
use crate::netlink::types::route::rt_table;
use crate::util::IpPrefix;

/// Priority of the rule that looks up `main` but ignores its default route.
pub const SUPPRESS_PRIORITY: u32 = 18000;

/// Priority of the rule that sends marked packets to the tunnel table.
pub const FWMARK_PRIORITY: u32 = 20000;

/// Selector of one policy rule, used both to add and to delete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSpec {
    pub table: u32,
    pub priority: u32,
    pub fwmark: Option<u32>,
    pub suppress_prefixlen: Option<u32>,
}

impl RuleSpec {
    /// `table main suppress_prefixlength 0`
    pub fn suppress_main() -> Self {
        Self {
            table: rt_table::MAIN as u32,
            priority: SUPPRESS_PRIORITY,
            fwmark: None,
            suppress_prefixlen: Some(0),
        }
    }

    /// `fwmark <table> table <table>`
    pub fn fwmark_lookup(table: u32) -> Self {
        Self {
            table,
            priority: FWMARK_PRIORITY,
            fwmark: Some(table),
            suppress_prefixlen: None,
        }
    }

    /// The route netlink form of this rule (IPv4).
    pub fn to_builder(&self) -> RuleBuilder {
        let mut rule = RuleBuilder::v4().table(self.table).priority(self.priority);
        if let Some(mark) = self.fwmark {
            rule = rule.fwmark(mark);
        }
        if let Some(len) = self.suppress_prefixlen {
            rule = rule.suppress_prefixlen(len);
        }
        rule
    }
}

/// Whether the policy is being set up or torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    Install,
    Remove,
}

/// One step submitted through [`LinkControl`](super::LinkControl).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOp {
    /// Default route through the tunnel link in `table`.
    AddRoute { dst: IpPrefix, table: u32 },
    AddRule(RuleSpec),
    DeleteRule(RuleSpec),
}

/// Operations that install or remove the catch-all policy for `table_id`.
///
/// Removal only touches the rules: the table route belongs to the tunnel
/// link and disappears with it.
pub fn policy_operations(table_id: u32, action: PolicyAction) -> Vec<PolicyOp> {
    match action {
        PolicyAction::Install => vec![
            PolicyOp::AddRoute {
                dst: IpPrefix::CATCH_ALL,
                table: table_id,
            },
            PolicyOp::AddRule(RuleSpec::suppress_main()),
            PolicyOp::AddRule(RuleSpec::fwmark_lookup(table_id)),
        ],
        PolicyAction::Remove => vec![
            PolicyOp::DeleteRule(RuleSpec::suppress_main()),
            PolicyOp::DeleteRule(RuleSpec::fwmark_lookup(table_id)),
        ],
    }
}
