//! Generic Netlink connection with family resolution.

use tracing::debug;

use super::message::GenlMessage;
use super::{CtrlAttr, CtrlCmd, GENL_ID_CTRL};
use crate::netlink::attr::Attribute;
use crate::netlink::builder::MessageBuilder;
use crate::netlink::connection::Connection;
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{NLM_F_ACK, NLM_F_REQUEST};
use crate::netlink::socket::Protocol;

/// Information about a Generic Netlink family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyInfo {
    /// Dynamically assigned family ID (used as nlmsg_type).
    pub id: u16,
    /// Family version.
    pub version: u32,
}

/// Generic Netlink connection.
pub struct GenlConnection {
    conn: Connection,
}

impl GenlConnection {
    /// Open a `NETLINK_GENERIC` socket.
    pub fn new() -> Result<Self> {
        Ok(Self {
            conn: Connection::new(Protocol::Generic)?,
        })
    }

    /// Look up a family by name.
    ///
    /// Fails with [`Error::FamilyNotFound`] when no such family is registered,
    /// which for `wireguard` means the kernel module is not loaded.
    pub async fn resolve_family(&self, name: &str) -> Result<FamilyInfo> {
        let request = GenlMessage::new(
            CtrlCmd::GetFamily as u8,
            1,
            vec![Attribute::string(CtrlAttr::FamilyName as u16, name)],
        );

        let replies = self
            .request(GENL_ID_CTRL, NLM_F_REQUEST | NLM_F_ACK, &request)
            .await
            .map_err(|e| match e.errno() {
                Some(libc::ENOENT) => Error::FamilyNotFound {
                    name: name.to_string(),
                },
                _ => e,
            })?;

        let info = parse_family(name, &replies)?;
        debug!(name, id = info.id, version = info.version, "resolved genl family");
        Ok(info)
    }

    /// Send one GENL message and decode every data reply.
    pub async fn request(
        &self,
        family_id: u16,
        flags: u16,
        msg: &GenlMessage,
    ) -> Result<Vec<GenlMessage>> {
        let mut builder = MessageBuilder::new(family_id, flags);
        msg.append_to(&mut builder);

        self.conn
            .request(builder)
            .await?
            .iter()
            .map(|payload| GenlMessage::decode(payload))
            .collect()
    }
}

/// Extract family information from `CTRL_CMD_GETFAMILY` replies.
pub fn parse_family(name: &str, replies: &[GenlMessage]) -> Result<FamilyInfo> {
    let Some(reply) = replies.first() else {
        return Err(Error::FamilyNotFound {
            name: name.to_string(),
        });
    };

    let mut id = None;
    let mut version = 0;

    for attr in &reply.attrs {
        match CtrlAttr::try_from(attr.kind) {
            Ok(CtrlAttr::FamilyId) => id = Some(attr.as_u16()?),
            Ok(CtrlAttr::Version) => version = attr.as_u32()?,
            Ok(CtrlAttr::FamilyName) | Err(_) => {}
        }
    }

    let id = id.ok_or_else(|| Error::MalformedMessage("family reply without an id".into()))?;

    Ok(FamilyInfo { id, version })
}
