//! Load errors.

use std::io;
use std::path::PathBuf;

use swamp_core::{CoreError, Tag};
use swamp_runtime::HeapError;
use thiserror::Error;

use crate::type_info::TypeInfoError;

/// Everything that can abort a package load.
///
/// A load is all-or-nothing: none of these leave a usable partial package.
#[derive(Debug, Error)]
pub enum UnpackError {
    /// The buffer ended before a read completed.
    #[error("unexpected end of stream: need {needed} bytes at offset {at}")]
    UnexpectedEndOfStream {
        /// Bytes requested.
        needed: u64,
        /// Offset of the failed read.
        at: u64,
    },

    /// A length-prefixed string exceeds the allowed size.
    #[error("string too long: {len} bytes (max {max})")]
    StringTooLong {
        /// Announced length.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Not a RAFF file.
    #[error("not a RAFF file (header mismatch)")]
    HeaderMismatch,

    /// A chunk header carried the wrong icon or name.
    #[error("chunk tag mismatch: expected {expected_icon}/{expected_name}, found {found_icon}/{found_name}")]
    ChunkTagMismatch {
        /// Required icon.
        expected_icon: Tag,
        /// Required name.
        expected_name: Tag,
        /// Icon in the stream.
        found_icon: Tag,
        /// Name in the stream.
        found_name: Tag,
    },

    /// Wrong section marker, i.e. a missing or out-of-order section.
    #[error("section marker mismatch: expected {expected}, found {found}")]
    MarkerMismatch {
        /// Required marker.
        expected: Tag,
        /// Marker in the stream.
        found: Tag,
    },

    /// The body section does not define exactly the declared functions.
    #[error("function count mismatch: {declared} declared, {bodies} bodies")]
    FunctionCountMismatch {
        /// Entries in the declaration section.
        declared: u32,
        /// Entries in the body section.
        bodies: u32,
    },

    /// A body referenced a constant that does not exist (yet).
    #[error("constant index {index} out of range (table holds {len})")]
    ConstantIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Table length at lookup time.
        len: usize,
    },

    /// The constant table reached its configured maximum.
    #[error("constant table capacity of {capacity} exceeded")]
    TableCapacityExceeded {
        /// Configured maximum.
        capacity: usize,
    },

    /// The host does not provide a function the package needs.
    #[error("could not bind external function '{name}'")]
    ExternalBindingFailed {
        /// Requested name.
        name: String,
    },

    /// The host provides the function with a different parameter count.
    #[error("external function '{name}' declares {declared} params, host expects {expected}")]
    ExternalArityMismatch {
        /// Requested name.
        name: String,
        /// Parameter count in the package.
        declared: u8,
        /// Arity registered by the host.
        expected: usize,
    },

    /// The type-info decoder rejected its chunk.
    #[error("type information could not be deserialized: {0}")]
    TypeInfoDeserializeFailed(#[source] TypeInfoError),

    /// Linker invariant violated on the heap side.
    #[error(transparent)]
    Heap(#[from] HeapError),

    /// Reading the package file failed.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Load result.
pub type UnpackResult<T> = Result<T, UnpackError>;

impl From<CoreError> for UnpackError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnexpectedEof { needed, at } => Self::UnexpectedEndOfStream { needed, at },
            CoreError::StringTooLong { len, max } => Self::StringTooLong { len, max },
            CoreError::HeaderMismatch => Self::HeaderMismatch,
            CoreError::ChunkTagMismatch { expected_icon, expected_name, found_icon, found_name } => {
                Self::ChunkTagMismatch { expected_icon, expected_name, found_icon, found_name }
            }
            CoreError::MarkerMismatch { expected, found } => Self::MarkerMismatch { expected, found },
        }
    }
}

impl UnpackError {
    /// True for the truncation kind.
    pub fn is_truncation(&self) -> bool { matches!(self, Self::UnexpectedEndOfStream { .. }) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn core_errors_map_one_to_one() {
        let e = UnpackError::from(CoreError::UnexpectedEof { needed: 4, at: 9 });
        assert!(e.is_truncation());
        assert_eq!(e.to_string(), "unexpected end of stream: need 4 bytes at offset 9");

        let e = UnpackError::from(CoreError::MarkerMismatch { expected: Tag(*b"abcd"), found: Tag(*b"abce") });
        assert!(matches!(e, UnpackError::MarkerMismatch { .. }));
        assert!(matches!(UnpackError::from(CoreError::HeaderMismatch), UnpackError::HeaderMismatch));
    }

    #[test]
    fn heap_errors_are_transparent() {
        let e = UnpackError::from(HeapError::AlreadyDefined { name: "main".into() });
        assert_eq!(e.to_string(), "function 'main' is already defined");
    }
}
