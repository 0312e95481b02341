// error.rs - Sphinx error types
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

use thiserror::Error;

use super::commands::NodeId;


/// Every way creating or unwrapping a Sphinx packet can fail.
///
/// Apart from the configuration errors singled out by `is_local`,
/// a failure is fatal for the packet concerned: it must be dropped
/// and no partially unwrapped state may be forwarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SphinxError {
    #[error("alpha is not a valid group element")]
    GroupMembership,

    #[error("message authentication code did not match")]
    MacMismatch,

    #[error("insufficient capacity: need {needed} bytes, have {available}")]
    Capacity { needed: usize, available: usize },

    #[error("malformed body: {0}")]
    MalformedBody(&'static str),

    #[error("failed to parse routing information")]
    MalformedRouting,

    #[error("malformed packet: {0}")]
    MalformedPacket(&'static str),

    #[error("unknown parameters: max_len {max_len}, body length {body_len}")]
    UnknownParameters { max_len: usize, body_len: usize },

    #[error("invalid parameters: {0}")]
    InvalidParameters(&'static str),

    #[error("path must contain at least one hop")]
    EmptyPath,

    #[error("no public key for node {0:?}")]
    UnknownNode(NodeId),

    #[error("packet replay detected")]
    ReplayedPacket,

    #[error("no keys stored for SURB id")]
    UnknownSurb,
}

impl SphinxError {
    /// Returns true for errors caused by local configuration rather
    /// than by the contents of a packet.
    pub fn is_local(&self) -> bool {
        use self::SphinxError::*;
        match *self {
            UnknownParameters { .. } | InvalidParameters(_) | UnknownNode(_) | UnknownSurb => true,
            _ => false,
        }
    }
}
