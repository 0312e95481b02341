// commands.rs - sphinx routing commands
// Copyright (C) 2018  David Anthony Stainton.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Routing records carried in the plaintext of each header layer.
//!
//! A record is encoded as a one byte length followed by that many
//! bytes: a flag and the flag's payload. The length prefix lets a mix
//! read its own record and hand the remainder of the decrypted routing
//! information on unchanged.

use std::fmt;

use super::constants::{K, RELAY_FLAG, DELIVER_FLAG, SURB_DELIVER_FLAG, MAX_ROUTING_RECORD_SIZE};
use super::error::SphinxError;

/// The largest node identifier a relay record can hold.
pub const MAX_NODE_ID_SIZE: usize = MAX_ROUTING_RECORD_SIZE - 1;

/// The largest destination a SURB delivery record can hold.
pub const MAX_DESTINATION_SIZE: usize = MAX_ROUTING_RECORD_SIZE - 2 - K;

/// A SURB identifier.
pub type SurbId = [u8; K];


/// NodeId identifies a mix node.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NodeId(Vec<u8>);

impl NodeId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<'a> From<&'a [u8]> for NodeId {
    fn from(id: &'a [u8]) -> NodeId {
        NodeId(id.to_vec())
    }
}

impl From<Vec<u8>> for NodeId {
    fn from(id: Vec<u8>) -> NodeId {
        NodeId(id)
    }
}

impl<'a> From<&'a str> for NodeId {
    fn from(id: &'a str) -> NodeId {
        NodeId(id.as_bytes().to_vec())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if s.chars().all(|c| c.is_ascii_graphic()) => write!(f, "NodeId({})", s),
            _ => {
                write!(f, "NodeId(")?;
                for b in &self.0 {
                    write!(f, "{:02x}", b)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// RoutingRecord is the instruction a mix finds for itself in the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutingRecord {
    /// Forward the packet to the given mix.
    Relay(NodeId),
    /// This is the last hop, the body is for the destination named inside it.
    Deliver,
    /// This is the last hop of a SURB, deliver the reply to `destination`.
    SurbDeliver { destination: Vec<u8>, surb_id: SurbId },
}

impl RoutingRecord {
    /// Serialize the record, length prefix included.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SphinxError> {
        let mut out = vec![0u8];
        match *self {
            RoutingRecord::Relay(ref id) => {
                if id.0.is_empty() || id.0.len() > MAX_NODE_ID_SIZE {
                    return Err(SphinxError::Capacity {
                        needed: id.0.len(),
                        available: MAX_NODE_ID_SIZE,
                    });
                }
                out.push(RELAY_FLAG);
                out.extend_from_slice(&id.0);
            }
            RoutingRecord::Deliver => {
                out.push(DELIVER_FLAG);
            }
            RoutingRecord::SurbDeliver { ref destination, ref surb_id } => {
                if destination.len() > MAX_DESTINATION_SIZE {
                    return Err(SphinxError::Capacity {
                        needed: destination.len(),
                        available: MAX_DESTINATION_SIZE,
                    });
                }
                out.push(SURB_DELIVER_FLAG);
                out.push(destination.len() as u8);
                out.extend_from_slice(destination);
                out.extend_from_slice(surb_id);
            }
        }
        out[0] = (out.len() - 1) as u8;
        Ok(out)
    }

    /// Parse one length prefixed record from the front of `b`,
    /// returning it along with the bytes that follow it.
    pub fn from_bytes(b: &[u8]) -> Result<(RoutingRecord, &[u8]), SphinxError> {
        let (len, rest) = match b.split_first() {
            Some((len, rest)) => (*len as usize, rest),
            None => return Err(SphinxError::MalformedRouting),
        };
        if len == 0 || rest.len() < len {
            return Err(SphinxError::MalformedRouting);
        }
        let (record, rest) = rest.split_at(len);
        let (flag, payload) = (record[0], &record[1..]);
        let cmd = match flag {
            RELAY_FLAG => {
                if payload.is_empty() {
                    return Err(SphinxError::MalformedRouting);
                }
                RoutingRecord::Relay(NodeId::from(payload))
            }
            DELIVER_FLAG => {
                if !payload.is_empty() {
                    return Err(SphinxError::MalformedRouting);
                }
                RoutingRecord::Deliver
            }
            SURB_DELIVER_FLAG => {
                let (dest_len, payload) = match payload.split_first() {
                    Some((dest_len, payload)) => (*dest_len as usize, payload),
                    None => return Err(SphinxError::MalformedRouting),
                };
                if payload.len() != dest_len + K {
                    return Err(SphinxError::MalformedRouting);
                }
                let mut surb_id = [0u8; K];
                surb_id.copy_from_slice(&payload[dest_len..]);
                RoutingRecord::SurbDeliver {
                    destination: payload[..dest_len].to_vec(),
                    surb_id,
                }
            }
            _ => return Err(SphinxError::MalformedRouting),
        };
        Ok((cmd, rest))
    }
}
