// node.rs - Sphinx mix node
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

//! Sphinx mix node cryptographic operations

use std::collections::HashSet;

use tracing::{debug, warn};

use super::commands::NodeId;
use super::ecdh::PrivateKey;
use super::error::SphinxError;
use super::group::{Group, RistrettoGroup};
use super::internal_crypto::Key;
use super::params::Params;
use super::server::{Action, sphinx_process};
use super::sphinx::Packet;


/// This trait is used to detect mix packet replay attacks. A unique
/// tag for each packet is remembered and if ever seen again implies a
/// replay attack. Note that we can flush our cache upon mix node key
/// rotation, which must happen fairly often.
pub trait PacketReplayCache {
    /// returns true if we've seen a given tag before
    fn check(&self, tag: &Key) -> bool;

    /// record a tag in our cache so that future calls with `check`
    /// will return true for that tag
    fn set(&mut self, tag: Key);

    /// flush our cache of tags
    fn flush(&mut self);
}

/// VolatileReplayCache is used to detect replay attacks
/// with a volatile cache, a HashSet. No disk persistence is used here.
#[derive(Default)]
pub struct VolatileReplayCache {
    tags: HashSet<Key>,
}

impl VolatileReplayCache {
    pub fn new() -> VolatileReplayCache {
        VolatileReplayCache::default()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl PacketReplayCache for VolatileReplayCache {
    fn check(&self, tag: &Key) -> bool {
        self.tags.contains(tag)
    }

    fn set(&mut self, tag: Key) {
        self.tags.insert(tag);
    }

    fn flush(&mut self) {
        self.tags.clear();
    }
}

/// MixNode is a mix's identity, key material and replay state.
pub struct MixNode<C: PacketReplayCache = VolatileReplayCache, G: Group = RistrettoGroup> {
    id: NodeId,
    private_key: PrivateKey<G>,
    params: Params<G>,
    replay_cache: C,
}

impl<C: PacketReplayCache, G: Group> MixNode<C, G> {
    pub fn new(id: NodeId, private_key: PrivateKey<G>, params: Params<G>, replay_cache: C) -> MixNode<C, G> {
        MixNode {
            id,
            private_key,
            params,
            replay_cache,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn public_key(&self) -> &G::Element {
        self.private_key.public_key()
    }

    pub fn params(&self) -> &Params<G> {
        &self.params
    }

    /// Unwrap one layer of `packet`, rejecting replays.
    ///
    /// The replay tag is only recorded once the packet has been fully
    /// unwrapped.
    pub fn process(&mut self, packet: &Packet) -> Result<Action, SphinxError> {
        let unwrapped = sphinx_process(&self.params, &self.private_key, &packet.header, &packet.delta)
            .map_err(|err| {
                debug!(node = ?self.id, error = %err, "dropping sphinx packet");
                err
            })?;
        if self.replay_cache.check(&unwrapped.tag) {
            warn!(node = ?self.id, "dropping replayed sphinx packet");
            return Err(SphinxError::ReplayedPacket);
        }
        self.replay_cache.set(unwrapped.tag);
        Ok(unwrapped.action)
    }

    /// Replace the node's key. Tags seen under the old key can no
    /// longer recur, so the replay cache is flushed.
    pub fn rotate(&mut self, private_key: PrivateKey<G>) {
        self.private_key = private_key;
        self.replay_cache.flush();
    }
}
