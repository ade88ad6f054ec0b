//! RAFF container framing.
//!
//! ```text
//! file   = header chunk*
//! header = icon[4] "RAFF" version:u8          (9 bytes)
//! chunk  = icon[4] name[4] size:u32 BE body   (12 byte header)
//! marker = tag[4]                             (no length)
//! ```
//!
//! Only the framing lives here; what a chunk or marker means is up to the
//! format built on top. Verification never consumes bytes on failure.

use crate::{ByteWriter, CoreError, CoreResult, Cursor, Tag};

/// Icon opening every RAFF file (U+1F98A).
pub const RAFF_ICON: Tag = Tag([0xF0, 0x9F, 0xA6, 0x8A]);
/// Name following the icon in the file header.
pub const RAFF_NAME: Tag = Tag(*b"RAFF");
/// Supported framing version.
pub const RAFF_VERSION: u8 = 1;
/// Size of the file header in bytes.
pub const HEADER_LEN: usize = 9;
/// Size of a chunk header in bytes.
pub const CHUNK_HEADER_LEN: usize = 12;

/// A decoded chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Icon tag.
    pub icon: Tag,
    /// Name tag.
    pub name: Tag,
    /// Announced body size in bytes.
    pub size: u32,
}

/// Verifies the 9-byte file header and advances past it.
pub fn verify_top_header(cursor: &mut Cursor<'_>) -> CoreResult<()> {
    let raw = cursor.peek_slice(HEADER_LEN)?;
    if raw[..4] != RAFF_ICON.0 || raw[4..8] != RAFF_NAME.0 || raw[8] != RAFF_VERSION {
        return Err(CoreError::HeaderMismatch);
    }
    cursor.skip(HEADER_LEN)
}

/// Decodes a chunk header without checking its tags.
pub fn peek_chunk_header(cursor: &Cursor<'_>) -> CoreResult<ChunkHeader> {
    let mut probe = Cursor::new(cursor.peek_slice(CHUNK_HEADER_LEN)?);
    Ok(ChunkHeader { icon: probe.read_tag()?, name: probe.read_tag()?, size: probe.read_u32_be()? })
}

/// Reads a chunk header, requiring the given icon and name. Returns the chunk size.
pub fn read_chunk_header(cursor: &mut Cursor<'_>, icon: Tag, name: Tag) -> CoreResult<u32> {
    let header = peek_chunk_header(cursor)?;
    if header.icon != icon || header.name != name {
        return Err(CoreError::ChunkTagMismatch {
            expected_icon: icon,
            expected_name: name,
            found_icon: header.icon,
            found_name: header.name,
        });
    }
    cursor.skip(CHUNK_HEADER_LEN)?;
    Ok(header.size)
}

/// Reads a section marker, requiring `expected`.
pub fn read_marker(cursor: &mut Cursor<'_>, expected: Tag) -> CoreResult<()> {
    let found = Cursor::new(cursor.peek_slice(4)?).read_tag()?;
    if found != expected {
        return Err(CoreError::MarkerMismatch { expected, found });
    }
    cursor.skip(4)
}

/// Writes the file header.
pub fn write_file_header(w: &mut ByteWriter) {
    w.write_tag(RAFF_ICON);
    w.write_tag(RAFF_NAME);
    w.write_u8(RAFF_VERSION);
}

/// Writes a chunk header.
pub fn write_chunk_header(w: &mut ByteWriter, icon: Tag, name: Tag, size: u32) {
    w.write_tag(icon);
    w.write_tag(name);
    w.write_u32_be(size);
}

/// Writes a section marker.
pub fn write_marker(w: &mut ByteWriter, tag: Tag) { w.write_tag(tag); }
