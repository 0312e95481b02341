// ecdh.rs - mix node key pairs
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

use rand_core::{CryptoRng, RngCore};

use super::error::SphinxError;
use super::group::{Group, RistrettoGroup};


/// PrivateKey is a mix node's long term secret exponent together
/// with its public element.
#[derive(Clone)]
pub struct PrivateKey<G: Group = RistrettoGroup> {
    secret: G::Scalar,
    public_key: G::Element,
}

impl<G: Group> PrivateKey<G> {
    pub fn generate<R: RngCore + CryptoRng>(group: &G, rng: &mut R) -> PrivateKey<G> {
        let secret = group.gen_secret(rng);
        PrivateKey::from_scalar(group, secret)
    }

    pub fn from_scalar(group: &G, secret: G::Scalar) -> PrivateKey<G> {
        let public_key = group.expon_base(&secret);
        PrivateKey {
            secret,
            public_key,
        }
    }

    /// Load a key from the little endian encoding of its scalar.
    ///
    /// Keys longer than 64 bytes or reducing to zero are rejected.
    pub fn from_bytes(group: &G, b: &[u8]) -> Result<PrivateKey<G>, SphinxError> {
        if b.is_empty() {
            return Err(SphinxError::InvalidParameters("empty private key"));
        }
        Ok(PrivateKey::from_scalar(group, group.make_exp(b)?))
    }

    pub fn public_key(&self) -> &G::Element {
        &self.public_key
    }

    pub fn scalar(&self) -> &G::Scalar {
        &self.secret
    }

    /// Exp calculates the shared secret with the provided element.
    pub fn exp(&self, group: &G, element: &G::Element) -> G::Element {
        group.expon(element, &self.secret)
    }
}
