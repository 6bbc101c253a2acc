//! Route message types.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Route message (struct rtmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RtMsg {
    /// Address family.
    pub rtm_family: u8,
    /// Destination prefix length.
    pub rtm_dst_len: u8,
    /// Source prefix length.
    pub rtm_src_len: u8,
    /// TOS filter.
    pub rtm_tos: u8,
    /// Routing table ID (RT_TABLE_UNSPEC when RTA_TABLE carries it).
    pub rtm_table: u8,
    /// Routing protocol (RTPROT_*).
    pub rtm_protocol: u8,
    /// Route scope (RT_SCOPE_*).
    pub rtm_scope: u8,
    /// Route type (RTN_*).
    pub rtm_type: u8,
    /// Route flags.
    pub rtm_flags: u32,
}

/// Route attributes (RTA_*) used here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RtaAttr {
    Dst = 1,
    Oif = 4,
    Table = 15,
}

/// Well-known routing tables.
pub mod rt_table {
    pub const UNSPEC: u8 = 0;
    pub const MAIN: u8 = 254;
}

/// Routing protocols (RTPROT_*).
pub mod rtprot {
    pub const BOOT: u8 = 3;
}

/// Route scopes (RT_SCOPE_*).
pub mod rt_scope {
    pub const LINK: u8 = 253;
}

/// Route types (RTN_*).
pub mod rtn {
    pub const UNICAST: u8 = 1;
}
