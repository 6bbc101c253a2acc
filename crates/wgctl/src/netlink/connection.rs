//! Netlink connection with request/response handling.

use tracing::debug;

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{
    MessageIter, NLM_F_ACK, NLM_F_CREATE, NLM_F_DUMP, NLM_F_EXCL, NLM_F_REQUEST, NlMsgError,
};
use super::socket::{NetlinkSocket, Protocol};

/// A netlink connection owning one socket.
///
/// Each exchange sends one request and reads replies for its sequence number
/// until the kernel acknowledges, reports an error, or ends a dump.
pub struct Connection {
    socket: NetlinkSocket,
}

impl Connection {
    /// Create a new connection for the given protocol.
    pub fn new(protocol: Protocol) -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new(protocol)?,
        })
    }

    /// Send a request and collect the payloads of every data reply.
    ///
    /// Payloads exclude `nlmsghdr`. The first negative error code (from an
    /// `NLMSG_ERROR` or a `NLMSG_DONE` trailer) fails the whole exchange.
    pub async fn request(&self, mut builder: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg_type = builder.msg_type();
        let msg = builder.finish();
        debug!(msg_type, seq, len = msg.len(), "netlink request");
        self.socket.send(&msg).await?;

        let mut replies = Vec::new();
        loop {
            let data = self.socket.recv_msg().await?;
            if collect_replies(&data, seq, &mut replies)? {
                break;
            }
        }

        debug!(msg_type, seq, replies = replies.len(), "netlink exchange complete");
        Ok(replies)
    }

    /// Send a request that expects an ACK only (no data response).
    pub async fn request_ack(&self, builder: MessageBuilder) -> Result<()> {
        self.request(builder).await.map(|_| ())
    }
}

/// Absorb one receive buffer into `replies`.
///
/// Returns `Ok(true)` once the exchange for `seq` is finished. Messages with
/// another sequence number are skipped.
pub(crate) fn collect_replies(data: &[u8], seq: u32, replies: &mut Vec<Vec<u8>>) -> Result<bool> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;

        if header.nlmsg_seq != seq {
            continue;
        }

        if header.is_error() {
            let err = NlMsgError::parse(payload)?;
            if !err.is_ack() {
                return Err(Error::from_errno(err.error));
            }
            return Ok(true);
        }

        if header.is_done() {
            // A failed dump reports its errno in the DONE payload.
            if let Some(bytes) = payload.get(..4) {
                let errno = i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                if errno < 0 {
                    return Err(Error::from_errno(errno));
                }
            }
            return Ok(true);
        }

        replies.push(payload.to_vec());
    }

    Ok(false)
}

/// Helper to build a dump request.
pub fn dump_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_DUMP)
}

/// Helper to build a request expecting ACK.
pub fn ack_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_ACK)
}

/// Helper to build a create request that fails if the object exists.
pub fn create_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_ACK | NLM_F_CREATE | NLM_F_EXCL)
}
