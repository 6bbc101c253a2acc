//! Message builder for constructing netlink requests.

use zerocopy::{Immutable, IntoBytes};

use super::attr::{Attribute, encode_attrs};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Builder for a single netlink message.
///
/// Layout is `nlmsghdr`, then an optional family header (`ifinfomsg`,
/// `genlmsghdr`, ...), then attributes. Length, sequence number and port id
/// are filled in last.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
}

impl MessageBuilder {
    /// Create a new message builder with the given type and flags.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        let header = NlMsgHdr::new(msg_type, flags);
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(header.as_bytes());
        buf.resize(NLMSG_HDRLEN, 0);
        Self { buf }
    }

    /// Get the current message length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the message is empty (header only).
    pub fn is_empty(&self) -> bool {
        self.buf.len() == NLMSG_HDRLEN
    }

    /// Append a fixed-size family header, padded to alignment.
    pub fn append_header<T: IntoBytes + Immutable>(&mut self, header: &T) {
        self.buf.extend_from_slice(header.as_bytes());
        self.buf.resize(nlmsg_align(self.buf.len()), 0);
    }

    /// Append one attribute (and its children).
    pub fn append_attr(&mut self, attr: &Attribute) {
        attr.encode(&mut self.buf);
    }

    /// Append a list of attributes in order.
    pub fn append_attrs(&mut self, attrs: &[Attribute]) {
        encode_attrs(attrs, &mut self.buf);
    }

    /// Set the sequence number.
    pub fn set_seq(&mut self, seq: u32) {
        self.buf[8..12].copy_from_slice(&seq.to_ne_bytes());
    }

    /// Set the port ID.
    pub fn set_pid(&mut self, pid: u32) {
        self.buf[12..16].copy_from_slice(&pid.to_ne_bytes());
    }

    /// Get the message type from the header.
    pub fn msg_type(&self) -> u16 {
        u16::from_ne_bytes([self.buf[4], self.buf[5]])
    }

    /// Finalize and return the message bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let len = self.buf.len() as u32;
        self.buf[0..4].copy_from_slice(&len.to_ne_bytes());
        self.buf
    }
}
