// group.rs - prime order group operations
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

//! The group abstraction Sphinx is built on, and its implementation
//! over the Ristretto prime order group.

use std::fmt;

use curve25519_dalek_ng::constants::{RISTRETTO_BASEPOINT_POINT, RISTRETTO_BASEPOINT_TABLE};
use curve25519_dalek_ng::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek_ng::scalar::Scalar;
use curve25519_dalek_ng::traits::IsIdentity;
use rand_core::{CryptoRng, RngCore};

use super::error::SphinxError;


/// Group operations needed by the Sphinx header codec.
///
/// Elements taken from the network only ever enter the codec through
/// `from_bytes`, which performs the membership check. Nothing is
/// exponentiated before it has been validated.
pub trait Group: Clone {
    type Scalar: Clone + fmt::Debug;
    type Element: Clone + PartialEq + fmt::Debug;

    /// The size in bytes of an encoded element.
    fn element_size(&self) -> usize;

    /// The group generator.
    fn generator(&self) -> Self::Element;

    /// Returns a uniformly random secret scalar.
    fn gen_secret<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Self::Scalar;

    /// Raises `base` to the power `exp`.
    fn expon(&self, base: &Self::Element, exp: &Self::Scalar) -> Self::Element;

    /// Raises the generator to the power `exp`.
    fn expon_base(&self, exp: &Self::Scalar) -> Self::Element {
        self.expon(&self.generator(), exp)
    }

    /// Raises `base` to each exponent in turn.
    fn multiexpon(&self, base: &Self::Element, exps: &[Self::Scalar]) -> Self::Element {
        exps.iter().fold(base.clone(), |acc, exp| self.expon(&acc, exp))
    }

    /// Multiplies two scalars modulo the group order.
    fn mul_scalars(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;

    /// Reduces at most 64 bytes to a scalar modulo the group order.
    /// Longer input and a zero result are `InvalidParameters`.
    fn make_exp(&self, raw: &[u8]) -> Result<Self::Scalar, SphinxError>;

    /// Decodes and validates an element.
    fn from_bytes(&self, raw: &[u8]) -> Result<Self::Element, SphinxError>;

    /// The canonical encoding of an element.
    fn to_bytes(&self, element: &Self::Element) -> Vec<u8>;

    /// Returns true if `raw` encodes a valid element.
    fn in_group(&self, raw: &[u8]) -> bool {
        self.from_bytes(raw).is_ok()
    }
}

/// The size of an encoded Ristretto point.
pub const RISTRETTO_ELEMENT_SIZE: usize = 32;

/// The Ristretto group over curve25519.
#[derive(Clone, Copy, Debug, Default)]
pub struct RistrettoGroup;

impl Group for RistrettoGroup {
    type Scalar = Scalar;
    type Element = RistrettoPoint;

    fn element_size(&self) -> usize {
        RISTRETTO_ELEMENT_SIZE
    }

    fn generator(&self) -> RistrettoPoint {
        RISTRETTO_BASEPOINT_POINT
    }

    fn gen_secret<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Scalar {
        Scalar::random(rng)
    }

    fn expon(&self, base: &RistrettoPoint, exp: &Scalar) -> RistrettoPoint {
        base * exp
    }

    fn expon_base(&self, exp: &Scalar) -> RistrettoPoint {
        &RISTRETTO_BASEPOINT_TABLE * exp
    }

    fn mul_scalars(&self, a: &Scalar, b: &Scalar) -> Scalar {
        a * b
    }

    fn make_exp(&self, raw: &[u8]) -> Result<Scalar, SphinxError> {
        let mut wide = [0u8; 64];
        if raw.len() > wide.len() {
            return Err(SphinxError::InvalidParameters("exponent longer than 64 bytes"));
        }
        wide[..raw.len()].copy_from_slice(raw);
        let exp = Scalar::from_bytes_mod_order_wide(&wide);
        if exp == Scalar::zero() {
            return Err(SphinxError::InvalidParameters("zero exponent"));
        }
        Ok(exp)
    }

    /// Accepts only canonical encodings of points other than the identity.
    fn from_bytes(&self, raw: &[u8]) -> Result<RistrettoPoint, SphinxError> {
        if raw.len() != RISTRETTO_ELEMENT_SIZE {
            return Err(SphinxError::GroupMembership);
        }
        let mut bytes = [0u8; RISTRETTO_ELEMENT_SIZE];
        bytes.copy_from_slice(raw);
        match CompressedRistretto(bytes).decompress() {
            Some(point) if !point.is_identity() => Ok(point),
            _ => Err(SphinxError::GroupMembership),
        }
    }

    fn to_bytes(&self, element: &RistrettoPoint) -> Vec<u8> {
        element.compress().to_bytes().to_vec()
    }
}
