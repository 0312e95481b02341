// constants.rs - sphinx cryptographic packet format constants
// Copyright (C) 2018  David Anthony Stainton.
//
// MIT License
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

/// The security parameter in bytes: the size of every derived
/// key, MAC, replay tag and SURB identifier.
pub const K: usize = 16;

/// The default total header capacity in bytes.
pub const DEFAULT_MAX_LEN: usize = 192;

/// The default size of the packet body in bytes.
pub const DEFAULT_BODY_LEN: usize = 1024;

/// Routing record flag telling a mix to relay the packet.
pub const RELAY_FLAG: u8 = 0xF0;

/// Routing record flag telling the last mix to deliver the body.
pub const DELIVER_FLAG: u8 = 0xF1;

/// Routing record flag telling the last mix to deliver a SURB reply.
pub const SURB_DELIVER_FLAG: u8 = 0xF2;

/// The largest encoded routing record, not counting its length prefix.
pub const MAX_ROUTING_RECORD_SIZE: usize = 255;

/// Byte marking the end of a padded body.
pub const PADDING_MARKER: u8 = 0x7F;

/// Byte filling a padded body after the marker.
pub const PADDING_FILL: u8 = 0xFF;

/// Prefix hashed together with the shared secret to produce the
/// per hop symmetric key.
pub const AES_KEY_PREFIX: &[u8] = b"aes_key:";

// Domain separation tags for the per hop key derivations.
pub const BLINDING_TAG: &[u8; K] = b"hbhbhbhbhbhbhbhb";
pub const STREAM_KEY_TAG: &[u8; K] = b"hrhohrhohrhohrho";
pub const MAC_KEY_TAG: &[u8; K] = b"hmu:hmu:hmu:hmu:";
pub const SPRP_KEY_TAG: &[u8; K] = b"hpi:hpi:hpi:hpi:";
pub const REPLAY_TAG: &[u8; K] = b"htauhtauhtauhtau";

/// The size of the fixed part of a packed message: the `max_len`
/// and body length fields.
pub const WIRE_PREFIX_SIZE: usize = 4 + 4;
