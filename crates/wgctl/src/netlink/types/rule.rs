//! Routing rule message types.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// FIB rule header (struct fib_rule_hdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct FibRuleHdr {
    /// Address family.
    pub family: u8,
    /// Destination prefix length.
    pub dst_len: u8,
    /// Source prefix length.
    pub src_len: u8,
    /// TOS.
    pub tos: u8,
    /// Routing table ID (0 when FRA_TABLE carries it).
    pub table: u8,
    /// Reserved.
    pub res1: u8,
    /// Reserved.
    pub res2: u8,
    /// Action (FR_ACT_*).
    pub action: u8,
    /// Flags.
    pub flags: u32,
}

/// FIB rule attributes (FRA_*) used here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FraAttr {
    Priority = 6,
    Fwmark = 10,
    SuppressPrefixlen = 14,
    Table = 15,
}

/// FIB rule actions (FR_ACT_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FibRuleAction {
    /// Look the packet up in the rule's table.
    ToTbl = 1,
}
