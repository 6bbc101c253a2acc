//! Link creation, removal and lookup over route netlink.
//!
//! ```ignore
//! use wgctl::netlink::{Connection, Protocol};
//!
//! let conn = Connection::new(Protocol::Route)?;
//! conn.add_link("wg0", "wireguard").await?;
//! conn.set_link_up(&"wg0".into()).await?;
//! ```

use tracing::debug;
use zerocopy::FromBytes;

use super::attr::{self, Attribute, decode_attrs};
use super::builder::MessageBuilder;
use super::connection::{Connection, ack_request, create_request, dump_request};
use super::error::{Error, Result};
use super::interface_ref::InterfaceRef;
use super::message::NlMsgType;
use super::types::link::{IfInfoMsg, IflaAttr, IflaInfo, iff};

/// A link as reported by an `RTM_GETLINK` dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    /// Kernel interface index.
    pub index: u32,
    /// Interface name.
    pub name: String,
    /// `IFLA_INFO_KIND`, e.g. `"wireguard"`. Absent for physical devices.
    pub kind: Option<String>,
}

impl LinkInfo {
    /// Parse one `RTM_NEWLINK` payload. Returns `None` for links without a name.
    pub fn parse(payload: &[u8]) -> Result<Option<Self>> {
        let (ifinfo, rest) = IfInfoMsg::read_from_prefix(payload).map_err(|_| {
            Error::MalformedMessage(format!("link message too short: {} bytes", payload.len()))
        })?;
        let attrs = decode_attrs(rest)?;

        let Some(name) = attr::find(&attrs, IflaAttr::Ifname as u16) else {
            return Ok(None);
        };

        let kind = match attr::find(&attrs, IflaAttr::Linkinfo as u16) {
            Some(linkinfo) => attr::find(&linkinfo.children()?, IflaInfo::Kind as u16)
                .map(|k| k.as_str().map(str::to_string))
                .transpose()?,
            None => None,
        };

        Ok(Some(Self {
            index: ifinfo.ifi_index as u32,
            name: name.as_str()?.to_string(),
            kind,
        }))
    }
}

/// Build an `RTM_NEWLINK` request creating a link of `kind` named `name`.
pub fn new_link_request(name: &str, kind: &str) -> MessageBuilder {
    let mut builder = create_request(NlMsgType::RTM_NEWLINK);
    builder.append_header(&IfInfoMsg::new());
    builder.append_attr(&Attribute::string(IflaAttr::Ifname as u16, name));
    builder.append_attr(&Attribute::nested(
        IflaAttr::Linkinfo as u16,
        vec![Attribute::string(IflaInfo::Kind as u16, kind)],
    ));
    builder
}

/// Build an `RTM_DELLINK` request for the link at `index`.
pub fn del_link_request(index: u32) -> MessageBuilder {
    let mut builder = ack_request(NlMsgType::RTM_DELLINK);
    builder.append_header(&IfInfoMsg::new().with_index(index));
    builder
}

/// Build an `RTM_SETLINK` request raising `IFF_UP` on `index`.
pub fn set_up_request(index: u32) -> MessageBuilder {
    let mut ifinfo = IfInfoMsg::new().with_index(index);
    ifinfo.ifi_flags = iff::UP;
    ifinfo.ifi_change = iff::UP;

    let mut builder = ack_request(NlMsgType::RTM_SETLINK);
    builder.append_header(&ifinfo);
    builder
}

impl Connection {
    /// Dump every link in the namespace.
    pub async fn list_links(&self) -> Result<Vec<LinkInfo>> {
        let mut builder = dump_request(NlMsgType::RTM_GETLINK);
        builder.append_header(&IfInfoMsg::new());

        let mut links = Vec::new();
        for payload in self.request(builder).await? {
            if let Some(link) = LinkInfo::parse(&payload)? {
                links.push(link);
            }
        }
        Ok(links)
    }

    /// Resolve an interface reference to its index.
    pub async fn link_index(&self, iface: &InterfaceRef) -> Result<u32> {
        match iface {
            InterfaceRef::Index(index) => Ok(*index),
            InterfaceRef::Name(name) => self
                .list_links()
                .await?
                .into_iter()
                .find(|link| &link.name == name)
                .map(|link| link.index)
                .ok_or_else(|| Error::InterfaceNotFound { name: name.clone() }),
        }
    }

    /// Create a link of the given kind.
    pub async fn add_link(&self, name: &str, kind: &str) -> Result<()> {
        debug!(name, kind, "creating link");
        self.request_ack(new_link_request(name, kind))
            .await
            .map_err(|e| e.with_context(format!("creating {} link {}", kind, name)))
    }

    /// Delete a link.
    pub async fn del_link(&self, iface: &InterfaceRef) -> Result<()> {
        let index = self.link_index(iface).await?;
        debug!(%iface, index, "deleting link");
        self.request_ack(del_link_request(index))
            .await
            .map_err(|e| e.with_context(format!("deleting link {}", iface)))
    }

    /// Set a link administratively up.
    pub async fn set_link_up(&self, iface: &InterfaceRef) -> Result<()> {
        let index = self.link_index(iface).await?;
        debug!(%iface, index, "setting link up");
        self.request_ack(set_up_request(index))
            .await
            .map_err(|e| e.with_context(format!("setting link {} up", iface)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::message::{NLM_F_CREATE, NLM_F_EXCL, NLMSG_HDRLEN, NlMsgHdr};
    use zerocopy::IntoBytes;

    const IFINFO_LEN: usize = std::mem::size_of::<IfInfoMsg>();

    #[test]
    fn test_new_link_request() {
        let msg = new_link_request("wg0", "wireguard").finish();
        let hdr = NlMsgHdr::parse(&msg).unwrap();
        assert_eq!(hdr.nlmsg_type, NlMsgType::RTM_NEWLINK);
        assert_ne!(hdr.nlmsg_flags & NLM_F_CREATE, 0);
        assert_ne!(hdr.nlmsg_flags & NLM_F_EXCL, 0);

        let attrs = decode_attrs(&msg[NLMSG_HDRLEN + IFINFO_LEN..]).unwrap();
        assert_eq!(attrs[0].as_str().unwrap(), "wg0");
        let linkinfo = attrs[1].children().unwrap();
        assert_eq!(linkinfo[0].kind, IflaInfo::Kind as u16);
        assert_eq!(linkinfo[0].as_str().unwrap(), "wireguard");
    }

    #[test]
    fn test_set_up_request() {
        let msg = set_up_request(7).finish();
        let (ifinfo, _) = IfInfoMsg::read_from_prefix(&msg[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(ifinfo.ifi_index, 7);
        assert_eq!(ifinfo.ifi_flags, iff::UP);
        assert_eq!(ifinfo.ifi_change, iff::UP);
    }

    #[test]
    fn test_parse_link_with_unflagged_linkinfo() {
        let mut payload = IfInfoMsg::new().with_index(4).as_bytes().to_vec();
        Attribute::string(IflaAttr::Ifname as u16, "wg0").encode(&mut payload);

        // the kernel nests IFLA_LINKINFO without NLA_F_NESTED
        let mut info = Vec::new();
        Attribute::string(IflaInfo::Kind as u16, "wireguard").encode(&mut info);
        Attribute::bytes(IflaAttr::Linkinfo as u16, info).encode(&mut payload);

        let link = LinkInfo::parse(&payload).unwrap().unwrap();
        assert_eq!(
            link,
            LinkInfo {
                index: 4,
                name: "wg0".into(),
                kind: Some("wireguard".into()),
            }
        );
    }

    #[test]
    fn test_parse_link_without_name() {
        let payload = IfInfoMsg::new().with_index(1).as_bytes().to_vec();
        assert_eq!(LinkInfo::parse(&payload).unwrap(), None);
    }

    #[test]
    fn test_parse_link_too_short() {
        assert!(matches!(
            LinkInfo::parse(&[0; 8]),
            Err(Error::MalformedMessage(_))
        ));
    }
}
