// params.rs - Sphinx parameters and keyed primitives
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

//! Sphinx parameters.
//!
//! `Params` fixes the group, the header capacity `max_len` and the body
//! size `m` shared by every mix on a path, and provides the keyed
//! primitives the header and body codecs are built from. It holds no
//! mutable state and can be shared freely between threads.

use std::collections::HashMap;

use serde::Deserialize;

use super::constants::{K, DEFAULT_MAX_LEN, DEFAULT_BODY_LEN, AES_KEY_PREFIX, BLINDING_TAG,
                       STREAM_KEY_TAG, MAC_KEY_TAG, SPRP_KEY_TAG, REPLAY_TAG};
use super::error::SphinxError;
use super::group::{Group, RistrettoGroup};
use super::internal_crypto::{Key, MAC_SIZE, hash, xor_key_stream, block_derive, hkdf_derive,
                             hmac, sprp_encrypt, sprp_decrypt};


/// KeySchedule selects how the per hop keys are derived from the
/// shared secret. All mixes of a network must agree on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySchedule {
    /// Encrypt a per purpose tag with AES under the hop key.
    BlockCipher,
    /// HKDF-SHA256 keyed with the hop key, the tag as info.
    Hkdf,
}

impl Default for KeySchedule {
    fn default() -> KeySchedule {
        KeySchedule::BlockCipher
    }
}

/// Params bundles the group and packet dimensions.
#[derive(Clone, Debug)]
pub struct Params<G: Group = RistrettoGroup> {
    group: G,
    max_len: usize,
    body_len: usize,
    schedule: KeySchedule,
}

impl<G: Group> Params<G> {
    /// Create parameters with a header capacity of `max_len` bytes and
    /// bodies of `body_len` bytes.
    pub fn new(group: G, max_len: usize, body_len: usize) -> Result<Params<G>, SphinxError> {
        if max_len <= 2 * K + 2 {
            return Err(SphinxError::InvalidParameters("max_len too small for a routing record"));
        }
        if body_len < 2 * K {
            return Err(SphinxError::InvalidParameters("body length must be at least 2k"));
        }
        if max_len > u32::max_value() as usize || body_len > u32::max_value() as usize {
            return Err(SphinxError::InvalidParameters("sizes must fit in 32 bits"));
        }
        Ok(Params {
            group,
            max_len,
            body_len,
            schedule: KeySchedule::default(),
        })
    }

    pub fn with_key_schedule(mut self, schedule: KeySchedule) -> Params<G> {
        self.schedule = schedule;
        self
    }

    pub fn group(&self) -> &G {
        &self.group
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn body_len(&self) -> usize {
        self.body_len
    }

    pub fn k(&self) -> usize {
        K
    }

    pub fn key_schedule(&self) -> KeySchedule {
        self.schedule
    }

    /// The size of the beta field of every header.
    pub fn beta_len(&self) -> usize {
        self.max_len - 2 * K
    }

    /// The symmetric key for a hop, derived from its shared secret.
    pub fn get_aes_key(&self, s: &G::Element) -> Key {
        let encoded = self.group.to_bytes(s);
        let digest = hash(&[AES_KEY_PREFIX, &encoded[..]]);
        *array_ref![digest, 0, K]
    }

    fn derive_key(&self, aes: &Key, tag: &[u8; K]) -> Key {
        match self.schedule {
            KeySchedule::BlockCipher => block_derive(aes, tag),
            KeySchedule::Hkdf => hkdf_derive(aes, tag),
        }
    }

    /// The blinding factor applied to alpha at this hop. It depends on
    /// the hop key only, so alpha is not an input.
    pub fn hb(&self, aes: &Key) -> Result<G::Scalar, SphinxError> {
        self.group.make_exp(&self.derive_key(aes, BLINDING_TAG))
    }

    /// The key of the stream cipher masking beta.
    pub fn hrho(&self, aes: &Key) -> Key {
        self.derive_key(aes, STREAM_KEY_TAG)
    }

    /// The key of the header MAC.
    pub fn hmu(&self, aes: &Key) -> Key {
        self.derive_key(aes, MAC_KEY_TAG)
    }

    /// The key of the body permutation.
    pub fn hpi(&self, aes: &Key) -> Key {
        self.derive_key(aes, SPRP_KEY_TAG)
    }

    /// The replay detection tag.
    pub fn htau(&self, aes: &Key) -> Key {
        self.derive_key(aes, REPLAY_TAG)
    }

    /// XOR `data` with the key stream of `key`.
    pub fn xor_rho(&self, key: &Key, data: &mut [u8]) {
        xor_key_stream(key, data)
    }

    pub fn mu(&self, key: &Key, data: &[u8]) -> [u8; MAC_SIZE] {
        hmac(key, data)
    }

    /// Encrypt a body with the wide block permutation.
    pub fn pi(&self, key: &Key, data: &[u8]) -> Result<Vec<u8>, SphinxError> {
        self.check_body(data)?;
        let mut block = data.to_vec();
        sprp_encrypt(key, &mut block);
        Ok(block)
    }

    /// Invert `pi`.
    pub fn pii(&self, key: &Key, data: &[u8]) -> Result<Vec<u8>, SphinxError> {
        self.check_body(data)?;
        let mut block = data.to_vec();
        sprp_decrypt(key, &mut block);
        Ok(block)
    }

    fn check_body(&self, data: &[u8]) -> Result<(), SphinxError> {
        if data.len() != self.body_len {
            return Err(SphinxError::MalformedBody("wrong body length"));
        }
        Ok(())
    }
}

impl Default for Params<RistrettoGroup> {
    fn default() -> Params<RistrettoGroup> {
        Params {
            group: RistrettoGroup,
            max_len: DEFAULT_MAX_LEN,
            body_len: DEFAULT_BODY_LEN,
            schedule: KeySchedule::default(),
        }
    }
}

/// ParamsConfig describes one supported parameter set, as read from
/// a configuration file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ParamsConfig {
    pub max_len: usize,
    pub body_len: usize,
    #[serde(default)]
    pub key_schedule: KeySchedule,
}

/// ParamsTable maps `(max_len, body_len)` to the parameter sets a
/// mix accepts packets for.
#[derive(Clone, Debug, Default)]
pub struct ParamsTable<G: Group = RistrettoGroup> {
    table: HashMap<(usize, usize), Params<G>>,
}

impl<G: Group> ParamsTable<G> {
    pub fn new() -> ParamsTable<G> {
        ParamsTable {
            table: HashMap::new(),
        }
    }

    /// Build a table from configuration entries.
    pub fn from_configs(configs: &[ParamsConfig]) -> Result<ParamsTable<G>, SphinxError>
        where G: Default
    {
        let mut table = ParamsTable::new();
        for config in configs {
            let params = Params::new(G::default(), config.max_len, config.body_len)?
                .with_key_schedule(config.key_schedule);
            table.insert(params);
        }
        Ok(table)
    }

    /// Add a parameter set, replacing any set of the same dimensions.
    pub fn insert(&mut self, params: Params<G>) {
        self.table.insert((params.max_len(), params.body_len()), params);
    }

    pub fn get(&self, max_len: usize, body_len: usize) -> Result<&Params<G>, SphinxError> {
        self.table
            .get(&(max_len, body_len))
            .ok_or(SphinxError::UnknownParameters { max_len, body_len })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
