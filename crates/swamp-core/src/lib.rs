//! swamp-core — shared primitives for Swamp package tooling (no_std-ready)
//!
//! Provides:
//! - `Tag`: four-byte identifier used for container icons, chunk names and section markers
//! - `Cursor`: bounds-checked big-endian reader over an immutable byte buffer
//! - `ByteWriter`: big-endian writer (fixtures, tooling)
//! - [`raff`]: the RAFF container framing (file header, chunk headers, markers)
//! - `CoreError` + alias `CoreResult<T>`
//!
//! Features:
//! - `std` (default): `std::error::Error` impl for `CoreError`

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/* ─────────────────────────── Imports ─────────────────────────── */

use core::fmt;

#[cfg(feature = "std")]
use std::{string::String, vec::Vec};

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

#[cfg(not(feature = "std"))]
extern crate alloc;

use byteorder::{BigEndian, ByteOrder};

/* ─────────────────────────── Public modules ─────────────────────────── */

pub mod raff;

/* ─────────────────────────── Common result ─────────────────────────── */

/// Result alias shared by the core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/// Capacity of the string scratch buffer used by the package format.
///
/// A length-prefixed string can never legally exceed this many bytes.
pub const MAX_STRING_LEN: usize = 511;

/* ─────────────────────────── Tags ─────────────────────────── */

/// Four-byte identifier, compared byte for byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// Builds a tag from raw bytes.
    pub const fn new(bytes: [u8; 4]) -> Self { Self(bytes) }

    /// Raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 4] { &self.0 }

    /// Builds a tag from the first four bytes of `b`.
    fn from_slice(b: &[u8]) -> Self { Self([b[0], b[1], b[2], b[3]]) }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match core::str::from_utf8(&self.0) {
            Ok(s) if !s.chars().any(char::is_control) => write!(f, "'{s}'"),
            _ => {
                let [a, b, c, d] = self.0;
                write!(f, "{a:02X} {b:02X} {c:02X} {d:02X}")
            }
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Tag({self})") }
}

/* ─────────────────────────── Byte Writer (BE) ─────────────────────────── */

/// Growable write buffer, big-endian.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    pub fn new() -> Self { Self { buf: Vec::new() } }
    /// Read access to the content.
    pub fn as_slice(&self) -> &[u8] { &self.buf }
    /// Consumes the writer.
    pub fn into_vec(self) -> Vec<u8> { self.buf }
    /// Number of bytes written so far.
    pub fn len(&self) -> usize { self.buf.len() }
    /// True if nothing was written yet.
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }
    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) { self.buf.extend_from_slice(bytes); }
    /// Writes a tag.
    pub fn write_tag(&mut self, tag: Tag) { self.write_bytes(&tag.0); }
    /// Writes a u8.
    pub fn write_u8(&mut self, v: u8) { self.buf.push(v); }
    /// Writes a big-endian u16.
    pub fn write_u16_be(&mut self, v: u16) { self.buf.extend_from_slice(&v.to_be_bytes()); }
    /// Writes a big-endian u32.
    pub fn write_u32_be(&mut self, v: u32) { self.buf.extend_from_slice(&v.to_be_bytes()); }
    /// Writes a big-endian i32.
    pub fn write_i32_be(&mut self, v: i32) { self.buf.extend_from_slice(&v.to_be_bytes()); }

    /// Writes a string as one length byte followed by the raw bytes (no terminator).
    pub fn write_string(&mut self, s: &str) -> CoreResult<()> {
        let len = u8::try_from(s.len())
            .map_err(|_| CoreError::StringTooLong { len: s.len(), max: usize::from(u8::MAX) })?;
        self.write_u8(len);
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

/* ─────────────────────────── Cursor (BE) ─────────────────────────── */

/// Position-tracked reader over an immutable buffer.
///
/// `position() <= len()` always holds: a read that would run past the end
/// fails with [`CoreError::UnexpectedEof`] and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Builds a cursor at offset 0.
    pub fn new(data: &'a [u8]) -> Self { Self { data, pos: 0 } }
    /// Current offset.
    pub fn position(&self) -> usize { self.pos }
    /// Total buffer length.
    pub fn len(&self) -> usize { self.data.len() }
    /// True if the underlying buffer is empty.
    pub fn is_empty(&self) -> bool { self.data.is_empty() }
    /// Bytes left to read.
    pub fn remaining(&self) -> usize { self.data.len() - self.pos }

    /// Returns the next `n` bytes without advancing.
    pub fn peek_slice(&self, n: usize) -> CoreResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.data.len()).ok_or(
            CoreError::UnexpectedEof { needed: n as u64, at: self.pos as u64 },
        )?;
        Ok(&self.data[self.pos..end])
    }

    /// Reads `n` raw bytes.
    pub fn take_slice(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        let slice = self.peek_slice(n)?;
        self.pos += n;
        Ok(slice)
    }

    /// Skips `n` bytes.
    pub fn skip(&mut self, n: usize) -> CoreResult<()> { self.take_slice(n).map(|_| ()) }

    /// Reads a u8.
    pub fn read_u8(&mut self) -> CoreResult<u8> { Ok(self.take_slice(1)?[0]) }

    /// Reads a big-endian u16.
    pub fn read_u16_be(&mut self) -> CoreResult<u16> { Ok(BigEndian::read_u16(self.take_slice(2)?)) }

    /// Reads a big-endian u32.
    pub fn read_u32_be(&mut self) -> CoreResult<u32> { Ok(BigEndian::read_u32(self.take_slice(4)?)) }

    /// Reads a big-endian i32.
    pub fn read_i32_be(&mut self) -> CoreResult<i32> { Ok(BigEndian::read_i32(self.take_slice(4)?)) }

    /// Per-entry count (one byte).
    pub fn read_count(&mut self) -> CoreResult<u8> { self.read_u8() }

    /// Per-chunk entry count (four bytes, BE).
    pub fn read_dword_count(&mut self) -> CoreResult<u32> { self.read_u32_be() }

    /// Reads a four-byte tag.
    pub fn read_tag(&mut self) -> CoreResult<Tag> { Ok(Tag::from_slice(self.take_slice(4)?)) }

    /// Reads a length-prefixed string (one length byte, then raw bytes).
    ///
    /// Fails with [`CoreError::StringTooLong`] when the length exceeds `max_len`.
    /// The bytes are decoded lossily: the format carries no encoding guarantee.
    /// On failure the position is restored to where the string started.
    pub fn read_string(&mut self, max_len: usize) -> CoreResult<String> {
        let start = self.pos;
        let res = self.read_string_inner(max_len);
        if res.is_err() {
            self.pos = start;
        }
        res
    }

    fn read_string_inner(&mut self, max_len: usize) -> CoreResult<String> {
        let len = usize::from(self.read_u8()?);
        if len > max_len {
            return Err(CoreError::StringTooLong { len, max: max_len });
        }
        let raw = self.take_slice(len)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

/* ─────────────────────────── Errors ─────────────────────────── */

/// Low-level decoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Buffer ended before the requested bytes.
    UnexpectedEof {
        /// Bytes requested.
        needed: u64,
        /// Offset where the read started.
        at: u64,
    },
    /// A length-prefixed string is longer than its destination allows.
    StringTooLong {
        /// Announced length.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },
    /// RAFF file header magic mismatch.
    HeaderMismatch,
    /// A chunk header carried an unexpected icon or name.
    ChunkTagMismatch {
        /// Icon that was required.
        expected_icon: Tag,
        /// Name that was required.
        expected_name: Tag,
        /// Icon found in the stream.
        found_icon: Tag,
        /// Name found in the stream.
        found_name: Tag,
    },
    /// A section marker was not the one required at this position.
    MarkerMismatch {
        /// Marker that was required.
        expected: Tag,
        /// Marker found in the stream.
        found: Tag,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::UnexpectedEof { needed, at } => write!(f, "unexpected end of stream: need {needed} bytes at {at}"),
            CoreError::StringTooLong { len, max } => write!(f, "string too long: {len} bytes (max {max})"),
            CoreError::HeaderMismatch => write!(f, "invalid RAFF file header"),
            CoreError::ChunkTagMismatch { expected_icon, expected_name, found_icon, found_name } => write!(
                f,
                "chunk tag mismatch: expected {expected_icon}/{expected_name}, found {found_icon}/{found_name}"
            ),
            CoreError::MarkerMismatch { expected, found } => {
                write!(f, "marker mismatch: expected {expected}, found {found}")
            }
        }
    }
}

/// `std::error::Error` only with the `std` feature.
#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

/* ─────────────────────────── Prelude ─────────────────────────── */

/// Convenience re-exports.
pub mod prelude {
    /// Key types and framing helpers.
    pub use super::{
        raff, ByteWriter, CoreError, CoreResult, Cursor, Tag, MAX_STRING_LEN,
    };
}

/* ─────────────────────────── Tests ─────────────────────────── */
