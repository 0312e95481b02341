// client.rs - Sphinx client side functions
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

//! Sphinx mix client cryptographic operations
//!
//! A client builds a header with `create_header`, the onion of routing
//! records for the path, and encrypts the body once per hop with the
//! keys it returns. Every header has the same size whatever the path
//! length: the space freed as each mix strips its layer is refilled
//! with key stream, which the client precomputes as the filler string.

use std::collections::HashMap;
use std::hash::BuildHasher;

use rand_core::{CryptoRng, RngCore};
use tracing::trace;

use super::commands::{NodeId, RoutingRecord};
use super::constants::K;
use super::error::SphinxError;
use super::group::Group;
use super::internal_crypto::Key;
use super::params::Params;
use super::sphinx::{Header, Packet};
use super::utils::{pad_body, unpad_body};


/// mix network public key lookup
pub trait MixPki<G: Group> {
    /// get the public key of a node
    fn lookup(&self, node_id: &NodeId) -> Option<G::Element>;
}

impl<G: Group, S: BuildHasher> MixPki<G> for HashMap<NodeId, G::Element, S> {
    fn lookup(&self, node_id: &NodeId) -> Option<G::Element> {
        self.get(node_id).cloned()
    }
}

/// PathHop describes a route hop that a Sphinx packet will traverse.
#[derive(Clone, Debug)]
pub struct PathHop<G: Group> {
    pub id: NodeId,
    pub public_key: G::Element,
}

/// Resolve the public keys of a route.
pub fn new_path<G: Group, P: MixPki<G>>(pki: &P, ids: &[NodeId]) -> Result<Vec<PathHop<G>>, SphinxError> {
    ids.iter()
        .map(|id| match pki.lookup(id) {
            Some(public_key) => Ok(PathHop {
                id: id.clone(),
                public_key,
            }),
            None => Err(SphinxError::UnknownNode(id.clone())),
        })
        .collect()
}

/// Create a Sphinx header routing through `path` and ending with the
/// `last` routing record.
///
/// Returns the header for the first hop and the body permutation
/// key of every hop, in path order.
///
/// # Errors
///
/// * `SphinxError::EmptyPath` - the path has no hops
/// * `SphinxError::Capacity` - the routing records do not fit in the header
pub fn create_header<G, R>(params: &Params<G>, rng: &mut R, path: &[PathHop<G>], last: &RoutingRecord) -> Result<(Header, Vec<Key>), SphinxError>
    where G: Group,
          R: RngCore + CryptoRng
{
    let n = path.len();
    if n == 0 {
        return Err(SphinxError::EmptyPath);
    }
    let group = params.group();
    let beta_len = params.beta_len();

    // The record for hop i tells hop i-1 where to send the packet.
    let node_meta = path[1..]
        .iter()
        .map(|hop| RoutingRecord::Relay(hop.id.clone()).to_bytes())
        .collect::<Result<Vec<_>, _>>()?;
    let final_routing = last.to_bytes()?;

    let relay_len: usize = node_meta.iter().map(|meta| meta.len() + K).sum();
    if relay_len + final_routing.len() > beta_len {
        return Err(SphinxError::Capacity {
            needed: relay_len + final_routing.len(),
            available: beta_len,
        });
    }

    // Derive the per hop shared secrets. Each blinding factor is a
    // function of the hop key alone, so a mix recomputes the same
    // value when it blinds alpha for its successor.
    let mut blind_factor = group.gen_secret(rng);
    let mut alphas = Vec::with_capacity(n);
    let mut secrets = Vec::with_capacity(n);
    for hop in path {
        let alpha = group.expon_base(&blind_factor);
        let s = group.expon(&hop.public_key, &blind_factor);
        let aes = params.get_aes_key(&s);
        let b = params.hb(&aes)?;
        blind_factor = group.mul_scalars(&blind_factor, &b);
        alphas.push(alpha);
        secrets.push(aes);
    }

    // Compute the filler string: the key stream each of the first
    // n-1 mixes appends while decrypting, as seen by the next mix.
    let mut phi: Vec<u8> = Vec::with_capacity(relay_len);
    let mut min_len = beta_len;
    for i in 1..n {
        let pad = K + node_meta[i - 1].len();
        let mut buf = vec![0u8; min_len];
        buf.extend_from_slice(&phi);
        buf.resize(min_len + phi.len() + pad, 0);
        params.xor_rho(&params.hrho(&secrets[i - 1]), &mut buf);
        phi = buf.split_off(min_len);
        min_len -= pad;
    }
    debug_assert_eq!(phi.len(), relay_len);

    // The innermost layer: the final record, random padding, filler.
    let random_pad_len = beta_len - relay_len - final_routing.len();
    let mut beta = final_routing;
    let mut pad = vec![0u8; random_pad_len];
    rng.fill_bytes(&mut pad);
    beta.extend_from_slice(&pad);
    params.xor_rho(&params.hrho(&secrets[n - 1]), &mut beta);
    beta.extend_from_slice(&phi);
    let mut gamma = params.mu(&params.hmu(&secrets[n - 1]), &beta);

    for i in (0..n - 1).rev() {
        let meta = &node_meta[i];
        let plain_beta_len = beta_len - K - meta.len();
        let mut plain = Vec::with_capacity(beta_len);
        plain.extend_from_slice(meta);
        plain.extend_from_slice(&gamma);
        plain.extend_from_slice(&beta[..plain_beta_len]);
        params.xor_rho(&params.hrho(&secrets[i]), &mut plain);
        beta = plain;
        gamma = params.mu(&params.hmu(&secrets[i]), &beta);
    }

    trace!(hops = n, "created sphinx header");
    let header = Header {
        alpha: group.to_bytes(&alphas[0]),
        beta,
        gamma,
    };
    let keys = secrets.iter().map(|aes| params.hpi(aes)).collect();
    Ok((header, keys))
}

/// Create a forward message for `destination`, who receives `message`
/// from the last mix of `path`.
pub fn create_forward_message<G, R>(params: &Params<G>, rng: &mut R, path: &[PathHop<G>], destination: &[u8], message: &[u8]) -> Result<Packet, SphinxError>
    where G: Group,
          R: RngCore + CryptoRng
{
    if destination.len() > u8::max_value() as usize {
        return Err(SphinxError::Capacity {
            needed: destination.len(),
            available: u8::max_value() as usize,
        });
    }
    let (header, keys) = create_header(params, rng, path, &RoutingRecord::Deliver)?;

    let mut body = vec![0u8; K];
    body.push(destination.len() as u8);
    body.extend_from_slice(destination);
    body.extend_from_slice(message);
    let mut delta = pad_body(params.body_len(), body)?;
    for key in keys.iter().rev() {
        delta = params.pi(key, &delta)?;
    }
    Ok(Packet { header, delta })
}

/// Decode a body that has passed through every hop of its path,
/// returning the destination and the message.
pub fn receive_forward<G: Group>(params: &Params<G>, delta: &[u8]) -> Result<(Vec<u8>, Vec<u8>), SphinxError> {
    let body = open_body(params, delta)?;
    let (dest_len, rest) = match body.split_first() {
        Some((dest_len, rest)) => (*dest_len as usize, rest),
        None => return Err(SphinxError::MalformedBody("missing destination")),
    };
    if rest.len() < dest_len {
        return Err(SphinxError::MalformedBody("truncated destination"));
    }
    let (destination, message) = rest.split_at(dest_len);
    Ok((destination.to_vec(), message.to_vec()))
}

/// Check the leading zero tag of a fully decrypted body and strip
/// its padding.
pub(crate) fn open_body<'a, G: Group>(params: &Params<G>, delta: &'a [u8]) -> Result<&'a [u8], SphinxError> {
    if delta.len() != params.body_len() {
        return Err(SphinxError::MalformedBody("wrong body length"));
    }
    if delta[..K].iter().any(|b| *b != 0) {
        return Err(SphinxError::MalformedBody("missing zero tag"));
    }
    unpad_body(&delta[K..])
}
