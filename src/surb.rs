// surb.rs - Sphinx single use reply blocks
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

//! Single use reply blocks.
//!
//! A SURB lets a third party answer a message without learning who
//! will receive the answer. Its creator keeps the `SurbKeys` and hands
//! out the `Surb`. The replier encrypts its body once with `ktilde`,
//! every mix on the path strips a layer as usual, and the creator
//! finishes by encrypting with the hop keys in reverse and undoing
//! `ktilde`.

use std::collections::HashMap;

use rand_core::{CryptoRng, RngCore};

use super::client::{PathHop, create_header, open_body};
use super::commands::{NodeId, RoutingRecord, SurbId};
use super::constants::K;
use super::error::SphinxError;
use super::group::Group;
use super::internal_crypto::Key;
use super::params::Params;
use super::sphinx::{Header, Packet};
use super::utils::pad_body;


/// Surb is the part of a reply block given to the replier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surb {
    pub first_hop: NodeId,
    pub header: Header,
    pub ktilde: Key,
}

/// SurbKeys are the keys the creator of a SURB needs to read the reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurbKeys {
    pub ktilde: Key,
    /// body permutation key of each hop, in path order
    pub hop_keys: Vec<Key>,
}

/// Create a reply block routed through `path` and delivered to
/// `destination`, normally the creator's own address.
pub fn create_surb<G, R>(params: &Params<G>, rng: &mut R, path: &[PathHop<G>], destination: &[u8]) -> Result<(SurbId, SurbKeys, Surb), SphinxError>
    where G: Group,
          R: RngCore + CryptoRng
{
    let mut surb_id = [0u8; K];
    rng.fill_bytes(&mut surb_id);
    let last = RoutingRecord::SurbDeliver {
        destination: destination.to_vec(),
        surb_id,
    };
    let (header, hop_keys) = create_header(params, rng, path, &last)?;

    let mut ktilde = [0u8; K];
    rng.fill_bytes(&mut ktilde);
    let keys = SurbKeys { ktilde, hop_keys };
    let surb = Surb {
        first_hop: path[0].id.clone(),
        header,
        ktilde,
    };
    Ok((surb_id, keys, surb))
}

/// Build the reply packet for `message`, returning the mix to send it to.
pub fn package_surb<G: Group>(params: &Params<G>, surb: &Surb, message: &[u8]) -> Result<(NodeId, Packet), SphinxError> {
    let mut body = vec![0u8; K];
    body.extend_from_slice(message);
    let delta = params.pi(&surb.ktilde, &pad_body(params.body_len(), body)?)?;
    let packet = Packet {
        header: surb.header.clone(),
        delta,
    };
    Ok((surb.first_hop.clone(), packet))
}

/// Decrypt a reply body delivered through a SURB.
pub fn receive_surb<G: Group>(params: &Params<G>, keys: &SurbKeys, delta: &[u8]) -> Result<Vec<u8>, SphinxError> {
    let mut delta = delta.to_vec();
    for key in keys.hop_keys.iter().rev() {
        delta = params.pi(key, &delta)?;
    }
    let delta = params.pii(&keys.ktilde, &delta)?;
    Ok(open_body(params, &delta)?.to_vec())
}

/// SurbKeyStore holds the keys of outstanding reply blocks.
pub trait SurbKeyStore {
    /// remember the keys of a new SURB
    fn insert(&mut self, surb_id: SurbId, keys: SurbKeys);

    /// remove and return the keys for `surb_id`; a reply block can
    /// only be used once
    fn take(&mut self, surb_id: &SurbId) -> Option<SurbKeys>;
}

/// VolatileSurbKeyStore keeps SURB keys in a HashMap.
#[derive(Default)]
pub struct VolatileSurbKeyStore {
    map: HashMap<SurbId, SurbKeys>,
}

impl VolatileSurbKeyStore {
    pub fn new() -> VolatileSurbKeyStore {
        VolatileSurbKeyStore::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl SurbKeyStore for VolatileSurbKeyStore {
    fn insert(&mut self, surb_id: SurbId, keys: SurbKeys) {
        self.map.insert(surb_id, keys);
    }

    fn take(&mut self, surb_id: &SurbId) -> Option<SurbKeys> {
        self.map.remove(surb_id)
    }
}

/// Look up the keys for `surb_id` and decrypt the reply.
pub fn receive_surb_reply<G, S>(params: &Params<G>, store: &mut S, surb_id: &SurbId, delta: &[u8]) -> Result<Vec<u8>, SphinxError>
    where G: Group,
          S: SurbKeyStore
{
    let keys = store.take(surb_id).ok_or(SphinxError::UnknownSurb)?;
    receive_surb(params, &keys, delta)
}
