//! Type information hook.
//!
//! The `sti0` chunk is only used to print declared types in diagnostics.
//! Its encoding belongs to the compiler; the loader hands the raw bytes to a
//! [`TypeInfoDecoder`] and keeps whatever it returns.

/// Error returned by a [`TypeInfoDecoder`].
pub type TypeInfoError = Box<dyn std::error::Error + Send + Sync>;

/// Decoded type information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeInfoChunk {
    raw: Vec<u8>,
    names: Vec<String>,
}

impl TypeInfoChunk {
    /// Chunk that only keeps its bytes; every type is unknown.
    pub fn opaque(raw: &[u8]) -> Self { Self { raw: raw.to_vec(), names: Vec::new() } }

    /// Chunk whose type `i` prints as `names[i]`.
    pub fn with_names(raw: &[u8], names: Vec<String>) -> Self { Self { raw: raw.to_vec(), names } }

    /// Bytes of the chunk as read.
    pub fn raw(&self) -> &[u8] { &self.raw }

    /// Printable form of `type_ref`, if known.
    pub fn describe(&self, type_ref: u8) -> Option<&str> { self.names.get(usize::from(type_ref)).map(String::as_str) }

    /// Like [`describe`](Self::describe), falling back to `unknown`.
    pub fn describe_or_unknown(&self, type_ref: u8) -> &str { self.describe(type_ref).unwrap_or("unknown") }
}

/// Turns the `sti0` chunk body into a [`TypeInfoChunk`].
pub trait TypeInfoDecoder {
    /// Deserializes `bytes`; the error becomes the source of
    /// [`UnpackError::TypeInfoDeserializeFailed`](crate::UnpackError::TypeInfoDeserializeFailed).
    fn deserialize(&self, bytes: &[u8]) -> Result<TypeInfoChunk, TypeInfoError>;
}

impl<F> TypeInfoDecoder for F
where
    F: Fn(&[u8]) -> Result<TypeInfoChunk, TypeInfoError>,
{
    fn deserialize(&self, bytes: &[u8]) -> Result<TypeInfoChunk, TypeInfoError> { self(bytes) }
}

/// Default decoder: keeps the bytes, resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTypeInfo;

impl TypeInfoDecoder for RawTypeInfo {
    fn deserialize(&self, bytes: &[u8]) -> Result<TypeInfoChunk, TypeInfoError> { Ok(TypeInfoChunk::opaque(bytes)) }
}
