// server.rs - Sphinx server side function(s)
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

//! The server side of Sphinx, packet processing.
//!
//! A mix processes an incoming packet by validating alpha, checking
//! the header MAC, decrypting its own routing record and stripping one
//! layer of body encryption. Any failure means the packet MUST be
//! discarded with no additional processing; no partially unwrapped
//! state is returned.

use subtle::ConstantTimeEq;
use tracing::trace;

use super::commands::{NodeId, RoutingRecord, SurbId};
use super::constants::K;
use super::ecdh::PrivateKey;
use super::error::SphinxError;
use super::group::Group;
use super::internal_crypto::{Key, MAC_SIZE};
use super::params::Params;
use super::sphinx::{Header, Packet};


/// What a mix must do with a successfully unwrapped packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Forward `packet` to `next_hop`.
    Relay { next_hop: NodeId, packet: Packet },
    /// The body has reached the last hop; the destination is inside it.
    Deliver { delta: Vec<u8> },
    /// Deliver a SURB reply body to `destination`.
    SurbDeliver { destination: Vec<u8>, surb_id: SurbId, delta: Vec<u8> },
}

/// Unwrapped is the result of a mix node unwrapping a Sphinx packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unwrapped {
    /// replay detection tag, unique per packet and mix key
    pub tag: Key,
    pub action: Action,
}

/// unwrap a layer of sphinx packet encryption
///
/// # Arguments
///
/// * `params` - the parameters the packet was built with
/// * `private_key` - this mix node's private key
/// * `header` - the received header
/// * `delta` - the received body
///
/// # Errors
///
/// * `SphinxError::GroupMembership` - alpha is not a valid group element
/// * `SphinxError::MacMismatch` - computed MAC doesn't match gamma
/// * `SphinxError::MalformedRouting` - the routing record failed to parse
/// * `SphinxError::MalformedPacket` - beta or delta has the wrong size
pub fn sphinx_process<G: Group>(params: &Params<G>, private_key: &PrivateKey<G>, header: &Header, delta: &[u8]) -> Result<Unwrapped, SphinxError> {
    let group = params.group();
    let beta_len = params.beta_len();

    let alpha = group.from_bytes(&header.alpha)?;
    if header.beta.len() != beta_len {
        return Err(SphinxError::MalformedPacket("wrong beta length"));
    }
    if delta.len() != params.body_len() {
        return Err(SphinxError::MalformedPacket("wrong body length"));
    }

    // Calculate the hop's shared secret.
    let s = private_key.exp(group, &alpha);
    let aes = params.get_aes_key(&s);

    // compare MAC in constant time
    let mac = params.mu(&params.hmu(&aes), &header.beta);
    if mac.ct_eq(&header.gamma).unwrap_u8() == 0 {
        return Err(SphinxError::MacMismatch);
    }

    // Append padding to preserve length invariance, decrypt the (padded)
    // routing information, and extract the section for the current hop.
    let mut b = Vec::with_capacity(beta_len + 2 * params.max_len());
    b.extend_from_slice(&header.beta);
    b.resize(beta_len + 2 * params.max_len(), 0);
    params.xor_rho(&params.hrho(&aes), &mut b);
    let (routing, rest) = RoutingRecord::from_bytes(&b)?;

    let tag = params.htau(&aes);
    let delta = params.pii(&params.hpi(&aes), delta)?;

    let action = match routing {
        RoutingRecord::Relay(next_hop) => {
            if rest.len() < MAC_SIZE + beta_len {
                return Err(SphinxError::MalformedRouting);
            }
            let blind = params.hb(&aes)?;
            let next_alpha = group.expon(&alpha, &blind);
            let header = Header {
                alpha: group.to_bytes(&next_alpha),
                beta: rest[K..K + beta_len].to_vec(),
                gamma: *array_ref![rest, 0, MAC_SIZE],
            };
            trace!(?next_hop, "relaying sphinx packet");
            Action::Relay {
                next_hop,
                packet: Packet { header, delta },
            }
        }
        RoutingRecord::Deliver => Action::Deliver { delta },
        RoutingRecord::SurbDeliver { destination, surb_id } => Action::SurbDeliver {
            destination,
            surb_id,
            delta,
        },
    };
    Ok(Unwrapped { tag, action })
}
