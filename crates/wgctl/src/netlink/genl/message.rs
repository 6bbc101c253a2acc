//! A generic netlink payload: command, version and an attribute tree.

use zerocopy::{FromBytes, IntoBytes};

use super::header::GenlMsgHdr;
use crate::netlink::attr::{Attribute, decode_attrs, encode_attrs};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::{Error, Result};

/// The part of a GENL message after `nlmsghdr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenlMessage {
    pub cmd: u8,
    pub version: u8,
    pub attrs: Vec<Attribute>,
}

impl GenlMessage {
    pub fn new(cmd: u8, version: u8, attrs: Vec<Attribute>) -> Self {
        Self { cmd, version, attrs }
    }

    /// Serialize `genlmsghdr` plus attributes (no `nlmsghdr`).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = GenlMsgHdr::new(self.cmd, self.version).as_bytes().to_vec();
        encode_attrs(&self.attrs, &mut buf);
        buf
    }

    /// Parse a payload returned by [`Connection::request`](crate::netlink::Connection::request).
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let (hdr, rest) = GenlMsgHdr::read_from_prefix(payload).map_err(|_| {
            Error::MalformedMessage(format!("GENL header too short: {} bytes", payload.len()))
        })?;
        Ok(Self {
            cmd: hdr.cmd,
            version: hdr.version,
            attrs: decode_attrs(rest)?,
        })
    }

    /// Append this message to a builder whose `nlmsghdr` is already set.
    pub fn append_to(&self, builder: &mut MessageBuilder) {
        builder.append_header(&GenlMsgHdr::new(self.cmd, self.version));
        builder.append_attrs(&self.attrs);
    }
}
