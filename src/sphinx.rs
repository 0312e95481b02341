// sphinx.rs - sphinx cryptographic packet format
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

//! Sphinx headers, packets and their wire encoding.
//!
//! A packed message is
//!
//! ```text
//! max_len: u32 | body_len: u32 | alpha | beta | gamma | delta
//! ```
//!
//! with both lengths big endian. The receiver looks the lengths up in
//! its table of supported parameters before reading anything else.

use byteorder::{BigEndian, ByteOrder};
use tracing::warn;

use super::constants::{K, WIRE_PREFIX_SIZE};
use super::error::SphinxError;
use super::group::Group;
use super::internal_crypto::MAC_SIZE;
use super::params::{Params, ParamsTable};


/// this struct represents the Sphinx mix packet header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// alpha is the encoded group element, unvalidated until a mix
    /// processes the header
    pub alpha: Vec<u8>,
    /// beta is the encrypted routing information
    pub beta: Vec<u8>,
    /// gamma is the message authenticating code over beta
    pub gamma: [u8; MAC_SIZE],
}

/// Packet is a header with its onion encrypted body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    /// delta is the body, exactly `body_len` bytes
    pub delta: Vec<u8>,
}

impl Packet {
    /// The size of a packed message for the given parameters.
    pub fn wire_size<G: Group>(params: &Params<G>) -> usize {
        WIRE_PREFIX_SIZE + params.group().element_size() + params.beta_len() + K + params.body_len()
    }
}

/// Serialize a packet for transmission.
pub fn pack_message<G: Group>(params: &Params<G>, packet: &Packet) -> Result<Vec<u8>, SphinxError> {
    let header = &packet.header;
    if header.alpha.len() != params.group().element_size() {
        return Err(SphinxError::MalformedPacket("wrong alpha length"));
    }
    if header.beta.len() != params.beta_len() {
        return Err(SphinxError::MalformedPacket("wrong beta length"));
    }
    if packet.delta.len() != params.body_len() {
        return Err(SphinxError::MalformedPacket("wrong body length"));
    }
    let mut out = vec![0u8; WIRE_PREFIX_SIZE];
    BigEndian::write_u32(&mut out[0..4], params.max_len() as u32);
    BigEndian::write_u32(&mut out[4..8], params.body_len() as u32);
    out.reserve(Packet::wire_size(params) - WIRE_PREFIX_SIZE);
    out.extend_from_slice(&header.alpha);
    out.extend_from_slice(&header.beta);
    out.extend_from_slice(&header.gamma);
    out.extend_from_slice(&packet.delta);
    Ok(out)
}

/// Parse a packed message, returning the parameters it was built for.
///
/// Only the sizes are checked here; alpha is validated as a group
/// element when the packet is processed.
pub fn unpack_message<'a, G: Group>(table: &'a ParamsTable<G>, b: &[u8]) -> Result<(&'a Params<G>, Packet), SphinxError> {
    if b.len() < WIRE_PREFIX_SIZE {
        return Err(SphinxError::MalformedPacket("truncated"));
    }
    let max_len = BigEndian::read_u32(&b[0..4]) as usize;
    let body_len = BigEndian::read_u32(&b[4..8]) as usize;
    let params = table.get(max_len, body_len).map_err(|err| {
        warn!(max_len, body_len, "unsupported sphinx parameters");
        err
    })?;
    if b.len() != Packet::wire_size(params) {
        return Err(SphinxError::MalformedPacket("wrong packet length"));
    }

    let (alpha, rest) = b[WIRE_PREFIX_SIZE..].split_at(params.group().element_size());
    let (beta, rest) = rest.split_at(params.beta_len());
    let (gamma, delta) = rest.split_at(MAC_SIZE);
    let packet = Packet {
        header: Header {
            alpha: alpha.to_vec(),
            beta: beta.to_vec(),
            gamma: *array_ref![gamma, 0, MAC_SIZE],
        },
        delta: delta.to_vec(),
    };
    Ok((params, packet))
}
