// internal_crypto.rs - symmetric primitives used by the Sphinx codec
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

//! Sphinx symmetric crypto primitives

use ctr::cipher::{KeyIvInit, StreamCipher};
use digest::Digest;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::constants::K;

pub const HASH_SIZE: usize = 32;
pub const MAC_SIZE: usize = K;
pub const STREAM_IV_SIZE: usize = 16;

const ZERO_IV: [u8; STREAM_IV_SIZE] = [0u8; STREAM_IV_SIZE];

/// A derived symmetric key.
pub type Key = [u8; K];

type HmacSha256 = Hmac<Sha256>;
type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;


/// SHA-256 over the concatenation of `parts`.
pub fn hash(parts: &[&[u8]]) -> [u8; HASH_SIZE] {
    let mut h = Sha256::new();
    for part in parts {
        h.input(part);
    }
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(h.result().as_slice());
    out
}

/// XOR the AES-128-CTR key stream for `key` and initial counter
/// block `iv` into `data`.
pub fn stream_xor(key: &Key, iv: &[u8; STREAM_IV_SIZE], data: &mut [u8]) {
    let mut cipher = Aes128Ctr::new(key.into(), iv.into());
    cipher.apply_keystream(data);
}

/// XOR the key stream for `key` with a zero counter block into `data`.
pub fn xor_key_stream(key: &Key, data: &mut [u8]) {
    stream_xor(key, &ZERO_IV, data)
}

/// Encrypts a single `tag` block under `key`. The first counter
/// block of CTR mode started at `tag` is exactly AES(key, tag).
pub fn block_derive(key: &Key, tag: &[u8; K]) -> Key {
    let mut out = [0u8; K];
    stream_xor(key, tag, &mut out);
    out
}

/// HKDF-SHA256 expansion of `ikm` with `tag` as the info string.
pub fn hkdf_derive(ikm: &Key, tag: &[u8; K]) -> Key {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    let mut out = [0u8; K];
    hk.expand(tag, &mut out).expect("K is a valid HKDF-SHA256 output length");
    out
}

/// HMAC-SHA256 truncated to `MAC_SIZE` bytes.
pub fn hmac(key: &Key, data: &[u8]) -> [u8; MAC_SIZE] {
    let mut mac = HmacSha256::new_varkey(key).expect("HMAC can take key of any size");
    mac.input(data);
    let code = mac.result().code();
    let mut out = [0u8; MAC_SIZE];
    out.copy_from_slice(&code[..MAC_SIZE]);
    out
}

fn round_key(half: &[u8], key: &Key, round: &[u8]) -> [u8; STREAM_IV_SIZE] {
    let digest = hash(&[half, &key[..], round]);
    *array_ref![digest, 0, STREAM_IV_SIZE]
}

fn left_iv(left: &[u8]) -> [u8; STREAM_IV_SIZE] {
    let mut iv = [0u8; STREAM_IV_SIZE];
    iv.copy_from_slice(left);
    iv
}

/// Encrypt `block` in place with the four round wide block cipher.
///
/// The block is split into a `K` byte left half and the remaining
/// right half. Rounds one and three key the left half stream with a
/// hash of the right half; rounds two and four key the right half
/// stream with the left half.
///
/// # Panics
///
/// Panics if `block` is not longer than `K` bytes.
pub fn sprp_encrypt(key: &Key, block: &mut [u8]) {
    assert!(block.len() > K);
    let (left, right) = block.split_at_mut(K);

    let k1 = round_key(right, key, b"1");
    stream_xor(key, &k1, left);

    let iv = left_iv(left);
    stream_xor(key, &iv, right);

    let k3 = round_key(right, key, b"3");
    stream_xor(key, &k3, left);

    let iv = left_iv(left);
    stream_xor(key, &iv, right);
}

/// Decrypt `block` in place, undoing `sprp_encrypt` round by round.
///
/// # Panics
///
/// Panics if `block` is not longer than `K` bytes.
pub fn sprp_decrypt(key: &Key, block: &mut [u8]) {
    assert!(block.len() > K);
    let (left, right) = block.split_at_mut(K);

    let iv = left_iv(left);
    stream_xor(key, &iv, right);

    let k3 = round_key(right, key, b"3");
    stream_xor(key, &k3, left);

    let iv = left_iv(left);
    stream_xor(key, &iv, right);

    let k1 = round_key(right, key, b"1");
    stream_xor(key, &k1, left);
}
