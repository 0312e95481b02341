// lib.rs - The Sphinx cryptographic packet library
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


//! An implementation of the Sphinx cryptographic packet format
//!
//! # The Sphinx Cryptographic Packet Format
//!
//! Sphinx can be used to build high or low latency traffic analysis resistance
//! communication networks. A packet is a fixed size header, carrying the
//! onion encrypted routing information, and a fixed size body encrypted once
//! per hop with a wide block cipher.
//!
//! # Features of the Sphinx packet format
//!
//! * Single Use Reply Blocks
//! * per hop bitwise unlinkability
//! * indistinguishable replies
//! * hidden the path length
//! * hidden the relay position
//! * tagging attack detection
//! * replay attack detection
//!
//! # Usage
//!
//! A client resolves a path with [`client::new_path`] and builds a packet
//! with [`client::create_forward_message`]. Each mix calls
//! [`server::sphinx_process`] (or [`node::MixNode::process`], which adds
//! replay detection) and acts on the returned [`server::Action`]. The
//! destination decodes the final body with [`client::receive_forward`].
//! Replies travel on reply blocks made by [`surb::create_surb`].
//!
//! **Sphinx: A Compact and Provably Secure Mix Format**\
//! https://cypherpunks.ca/~iang/pubs/Sphinx_Oakland09.pdf

#[macro_use]
extern crate arrayref;

pub mod constants;
pub mod commands;
pub mod error;
pub mod group;
pub mod ecdh;
pub mod params;
pub mod sphinx;
pub mod client;
pub mod surb;
pub mod server;
pub mod node;

mod internal_crypto;
mod utils;

pub use internal_crypto::Key;
