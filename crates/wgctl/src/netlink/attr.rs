//! Netlink attribute (nlattr) handling.
//!
//! Attributes are TLV nodes: a 4-byte header (`nla_len`, `nla_type`)
//! followed by the payload, padded to a 4-byte boundary. A payload is either
//! raw bytes or another list of attributes.
//!
//! Decoding produces an [`Attribute`] tree without knowing what any type id
//! means; giving the ids a meaning is left to the family-specific mappers.
//!
//! ```text
//! ┌──────────┬──────────┬─────────────────────┬─────────┐
//! │ nla_len  │ nla_type │ payload             │ padding │
//! │ (u16)    │ (u16)    │ (nla_len - 4 bytes) │ (0..3)  │
//! └──────────┴──────────┴─────────────────────┴─────────┘
//! ```

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4;

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

/// Netlink attribute header (mirrors struct nlattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header, excluding padding.
    pub nla_len: u16,
    /// Attribute type with flag bits.
    pub nla_type: u16,
}

impl NlAttr {
    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Check if the nested flag is set.
    pub fn is_nested(&self) -> bool {
        self.nla_type & NLA_F_NESTED != 0
    }
}

/// Payload of an attribute node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Raw bytes: integers, strings, keys, socket addresses.
    Scalar(Vec<u8>),
    /// An ordered list of child attributes.
    Nested(Vec<Attribute>),
}

/// One node of a decoded (or to-be-encoded) attribute tree.
///
/// `kind` never carries the flag bits; [`NLA_F_NESTED`] is derived from the
/// value shape when encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: u16,
    pub value: AttrValue,
}

impl Attribute {
    /// Opaque bytes.
    pub fn bytes(kind: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: kind & NLA_TYPE_MASK,
            value: AttrValue::Scalar(data.into()),
        }
    }

    pub fn u8(kind: u16, value: u8) -> Self {
        Self::bytes(kind, vec![value])
    }

    /// u16 in host byte order.
    pub fn u16(kind: u16, value: u16) -> Self {
        Self::bytes(kind, value.to_ne_bytes())
    }

    /// u32 in host byte order.
    pub fn u32(kind: u16, value: u32) -> Self {
        Self::bytes(kind, value.to_ne_bytes())
    }

    /// u64 in host byte order.
    pub fn u64(kind: u16, value: u64) -> Self {
        Self::bytes(kind, value.to_ne_bytes())
    }

    /// NUL-terminated string.
    pub fn string(kind: u16, value: &str) -> Self {
        let mut data = Vec::with_capacity(value.len() + 1);
        data.extend_from_slice(value.as_bytes());
        data.push(0);
        Self::bytes(kind, data)
    }

    /// Nested attribute list.
    pub fn nested(kind: u16, children: Vec<Attribute>) -> Self {
        Self {
            kind: kind & NLA_TYPE_MASK,
            value: AttrValue::Nested(children),
        }
    }

    /// Length on the wire including the header, excluding trailing padding.
    pub fn wire_len(&self) -> usize {
        NLA_HDRLEN
            + match &self.value {
                AttrValue::Scalar(data) => data.len(),
                AttrValue::Nested(children) => children.iter().map(|c| nla_align(c.wire_len())).sum(),
            }
    }

    /// Append this node, padded to alignment, to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        let nla_type = match self.value {
            AttrValue::Scalar(_) => self.kind,
            AttrValue::Nested(_) => self.kind | NLA_F_NESTED,
        };
        let header = NlAttr {
            nla_len: self.wire_len() as u16,
            nla_type,
        };
        buf.extend_from_slice(header.as_bytes());

        match &self.value {
            AttrValue::Scalar(data) => buf.extend_from_slice(data),
            AttrValue::Nested(children) => encode_attrs(children, buf),
        }

        buf.resize(nla_align(buf.len()), 0);
    }

    /// Raw payload of a scalar node.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match &self.value {
            AttrValue::Scalar(data) => Ok(data),
            AttrValue::Nested(_) => Err(Error::MalformedMessage(format!(
                "attribute {} is nested, expected a scalar",
                self.kind
            ))),
        }
    }

    pub fn as_u8(&self) -> Result<u8> {
        Ok(self.fixed::<1>()?[0])
    }

    pub fn as_u16(&self) -> Result<u16> {
        Ok(u16::from_ne_bytes(self.fixed()?))
    }

    pub fn as_u32(&self) -> Result<u32> {
        Ok(u32::from_ne_bytes(self.fixed()?))
    }

    pub fn as_u64(&self) -> Result<u64> {
        Ok(u64::from_ne_bytes(self.fixed()?))
    }

    /// String payload, up to the first NUL.
    pub fn as_str(&self) -> Result<&str> {
        let data = self.as_bytes()?;
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len]).map_err(|e| {
            Error::MalformedMessage(format!("attribute {}: invalid UTF-8: {}", self.kind, e))
        })
    }

    /// Children of a nested node.
    ///
    /// Some kernel paths nest without setting `NLA_F_NESTED`; such a node
    /// decodes as a scalar and is re-read here as an attribute list.
    pub fn children(&self) -> Result<Vec<Attribute>> {
        match &self.value {
            AttrValue::Nested(children) => Ok(children.clone()),
            AttrValue::Scalar(data) => decode_attrs(data),
        }
    }

    fn fixed<const N: usize>(&self) -> Result<[u8; N]> {
        let data = self.as_bytes()?;
        data.get(..N)
            .and_then(|d| <[u8; N]>::try_from(d).ok())
            .ok_or_else(|| {
                Error::MalformedMessage(format!(
                    "attribute {}: expected {} bytes, got {}",
                    self.kind,
                    N,
                    data.len()
                ))
            })
    }
}

/// Append a list of attributes to `buf`.
pub fn encode_attrs(attrs: &[Attribute], buf: &mut Vec<u8>) {
    for attr in attrs {
        attr.encode(buf);
    }
}

/// Decode a full attribute list.
///
/// Nodes flagged `NLA_F_NESTED` are decoded recursively. Fails with
/// [`Error::MalformedMessage`] when a declared length is shorter than the
/// header or runs past the buffer, or when padding bytes are non-zero.
/// Trailing padding of the last node may be absent.
pub fn decode_attrs(data: &[u8]) -> Result<Vec<Attribute>> {
    let mut attrs = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        let (header, _) = NlAttr::read_from_prefix(rest).map_err(|_| {
            Error::MalformedMessage(format!(
                "{} trailing bytes are too short for an attribute header",
                rest.len()
            ))
        })?;

        let len = header.nla_len as usize;
        if len < NLA_HDRLEN {
            return Err(Error::MalformedMessage(format!(
                "attribute {} declares length {} below header size",
                header.kind(),
                len
            )));
        }
        if len > rest.len() {
            return Err(Error::MalformedMessage(format!(
                "attribute {} declares length {} but only {} bytes remain",
                header.kind(),
                len,
                rest.len()
            )));
        }

        let payload = &rest[NLA_HDRLEN..len];
        let next = nla_align(len).min(rest.len());
        if rest[len..next].iter().any(|&b| b != 0) {
            return Err(Error::MalformedMessage(format!(
                "attribute {} has non-zero padding",
                header.kind()
            )));
        }

        let value = if header.is_nested() {
            AttrValue::Nested(decode_attrs(payload)?)
        } else {
            AttrValue::Scalar(payload.to_vec())
        };
        attrs.push(Attribute {
            kind: header.kind(),
            value,
        });

        rest = &rest[next..];
    }

    Ok(attrs)
}

/// Find the first attribute of `kind` in a decoded list.
pub fn find(attrs: &[Attribute], kind: u16) -> Option<&Attribute> {
    attrs.iter().find(|a| a.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nla_align() {
        assert_eq!(nla_align(0), 0);
        assert_eq!(nla_align(1), 4);
        assert_eq!(nla_align(4), 4);
        assert_eq!(nla_align(5), 8);
    }

    #[test]
    fn test_encode_scalar_pads() {
        let mut buf = Vec::new();
        Attribute::u8(3, 0x2a).encode(&mut buf);
        // len=5, type=3, value, 3 bytes padding
        assert_eq!(buf, vec![5, 0, 3, 0, 0x2a, 0, 0, 0]);
    }

    #[test]
    fn test_encode_string_nul_terminated() {
        let mut buf = Vec::new();
        Attribute::string(2, "wg0").encode(&mut buf);
        assert_eq!(buf, vec![8, 0, 2, 0, b'w', b'g', b'0', 0]);
    }

    #[test]
    fn test_encode_nested_sets_flag() {
        let attr = Attribute::nested(8, vec![Attribute::nested(0, vec![Attribute::u16(1, 2)])]);
        let mut buf = Vec::new();
        attr.encode(&mut buf);

        #[rustfmt::skip]
        let expected = vec![
            16, 0, 0x08, 0x80,      // outer: len 16, type 8 | NESTED
              12, 0, 0x00, 0x80,    // index 0 | NESTED
                6, 0, 1, 0,         // u16 attr type 1
                2, 0, 0, 0,         // value + padding
        ];
        assert_eq!(buf, expected);
        assert_eq!(decode_attrs(&buf).unwrap(), vec![attr]);
    }

    #[test]
    fn test_decode_list() {
        #[rustfmt::skip]
        let data = vec![
            8, 0, 6, 0, 0x34, 0x12, 0, 0,   // u16 0x1234, padded
            8, 0, 7, 0, 1, 0, 0, 0,         // u32 1
        ];
        let attrs = decode_attrs(&data).unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].kind, 6);
        assert_eq!(attrs[0].as_u16().unwrap(), u16::from_ne_bytes([0x34, 0x12]));
        assert_eq!(find(&attrs, 7).unwrap().as_u32().unwrap(), u32::from_ne_bytes([1, 0, 0, 0]));
        assert!(find(&attrs, 9).is_none());
    }

    #[test]
    fn test_decode_last_padding_optional() {
        let data = vec![5, 0, 3, 0, 0x10];
        let attrs = decode_attrs(&data).unwrap();
        assert_eq!(attrs[0].as_u8().unwrap(), 0x10);
    }

    #[test]
    fn test_decode_length_past_buffer() {
        let data = vec![12, 0, 1, 0, 0, 0, 0, 0];
        assert!(matches!(decode_attrs(&data), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_decode_length_below_header() {
        let data = vec![2, 0, 1, 0];
        assert!(matches!(decode_attrs(&data), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_decode_truncated_header() {
        let data = vec![8, 0, 1, 0, 1, 2, 3, 4, 8, 0];
        assert!(matches!(decode_attrs(&data), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_decode_dirty_padding() {
        let data = vec![5, 0, 3, 0, 0x10, 0, 0xff, 0];
        assert!(matches!(decode_attrs(&data), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_decode_bad_nested_child() {
        // nested flag set, but the child claims more bytes than the parent holds
        let data = vec![8, 0, 0x08, 0x80, 9, 0, 1, 0];
        assert!(matches!(decode_attrs(&data), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_shape_mismatch() {
        let nested = Attribute::nested(1, vec![]);
        assert!(matches!(nested.as_u32(), Err(Error::MalformedMessage(_))));

        let short = Attribute::bytes(1, vec![1, 2]);
        assert!(matches!(short.as_u32(), Err(Error::MalformedMessage(_))));

        // scalar re-read as a list: 3 bytes cannot hold a header
        let scalar = Attribute::bytes(1, vec![1, 2, 3]);
        assert!(matches!(scalar.children(), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_unflagged_nest_reads_as_children() {
        let mut inner = Vec::new();
        Attribute::u32(1, 7).encode(&mut inner);
        let parent = Attribute::bytes(18, inner);

        let children = parent.children().unwrap();
        assert_eq!(children, vec![Attribute::u32(1, 7)]);
    }

    #[test]
    fn test_as_str() {
        assert_eq!(Attribute::string(2, "wg0").as_str().unwrap(), "wg0");
        assert_eq!(Attribute::bytes(2, b"eth0".to_vec()).as_str().unwrap(), "eth0");
        assert!(Attribute::bytes(2, vec![0xff, 0xfe]).as_str().is_err());
    }
}
