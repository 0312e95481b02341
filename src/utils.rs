// utils.rs - Sphinx utility functions
// Copyright (C) 2018  David Anthony Stainton and Jeffrey Burdges.
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

use super::constants::{PADDING_MARKER, PADDING_FILL};
use super::error::SphinxError;

/// Append the padding marker to `body` and fill it out to `size`
/// bytes.
pub fn pad_body(size: usize, mut body: Vec<u8>) -> Result<Vec<u8>, SphinxError> {
    if body.len() + 1 > size {
        return Err(SphinxError::Capacity {
            needed: body.len() + 1,
            available: size,
        });
    }
    body.push(PADDING_MARKER);
    body.resize(size, PADDING_FILL);
    Ok(body)
}

/// Strip the padding added by `pad_body`.
pub fn unpad_body(body: &[u8]) -> Result<&[u8], SphinxError> {
    match body.iter().rposition(|b| *b != PADDING_FILL) {
        Some(i) if body[i] == PADDING_MARKER => Ok(&body[..i]),
        _ => Err(SphinxError::MalformedBody("padding marker not found")),
    }
}
