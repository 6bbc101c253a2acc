//! Generic Netlink (GENL) support.
//!
//! Generic netlink families get their message type (the family id) assigned
//! at module load time. The id is looked up by name through the fixed
//! control family before any family-specific request can be sent.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ WireguardGateway                        │
//! │ (exists / query / configure)            │
//! └────────────────┬────────────────────────┘
//!                  │
//! ┌────────────────▼────────────────────────┐
//! │ GenlConnection                          │
//! │ (family resolution, GenlMessage I/O)    │
//! └────────────────┬────────────────────────┘
//!                  │
//! ┌────────────────▼────────────────────────┐
//! │ Connection (Protocol::Generic)          │
//! └─────────────────────────────────────────┘
//! ```

mod connection;
mod header;
mod message;

pub use connection::{FamilyInfo, GenlConnection, parse_family};
pub use header::{GENL_HDRLEN, GenlMsgHdr};
pub use message::GenlMessage;

pub mod wireguard;

/// Control family id (fixed, not dynamically assigned).
pub const GENL_ID_CTRL: u16 = 0x10;

/// Control family commands used here.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    GetFamily = 3,
}

/// Control family attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttr {
    FamilyId = 1,
    FamilyName = 2,
    Version = 3,
}

impl TryFrom<u16> for CtrlAttr {
    type Error = u16;

    fn try_from(value: u16) -> std::result::Result<Self, u16> {
        match value {
            1 => Ok(Self::FamilyId),
            2 => Ok(Self::FamilyName),
            3 => Ok(Self::Version),
            other => Err(other),
        }
    }
}
