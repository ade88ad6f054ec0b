//! Load session: walks the package framing and drives the section decoders.

use std::ops::Range;

use log::{debug, info, trace};
use swamp_core::{raff, CoreError, Cursor};
use swamp_runtime::{Binder, Heap, ValueRef};

use crate::format::{CODE_ICON, CODE_NAME, PACKAGE_ICON, PACKAGE_NAME, TYPE_INFO_ICON, TYPE_INFO_NAME};
use crate::type_info::{RawTypeInfo, TypeInfoChunk, TypeInfoDecoder};
use crate::{ConstantTable, Package, Section, UnpackError, UnpackResult};

/* ─────────────────────────── Options ─────────────────────────── */

/// Knobs for one load.
///
/// The default is strict: every external must bind, the table is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnpackOptions {
    /// Accept externals the binder cannot resolve (left unbound).
    /// Meant for inspection tools; a package loaded this way must not run.
    pub ignore_external_bind_errors: bool,
    /// Maximum number of constant-table entries.
    pub max_constants: Option<usize>,
}

impl UnpackOptions {
    /// Strict options.
    pub fn new() -> Self { Self::default() }

    /// Sets [`ignore_external_bind_errors`](Self::ignore_external_bind_errors).
    #[must_use]
    pub fn lenient(mut self, yes: bool) -> Self {
        self.ignore_external_bind_errors = yes;
        self
    }

    /// Sets [`max_constants`](Self::max_constants).
    #[must_use]
    pub fn max_constants(mut self, max: Option<usize>) -> Self {
        self.max_constants = max;
        self
    }
}

/// Constant-table positions of the declared functions.
///
/// Body `i` defines the function at `start + i`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclarationWindow {
    /// First position.
    pub start: usize,
    /// Number of declarations.
    pub count: u32,
}

impl DeclarationWindow {
    /// Positions as a range.
    pub fn range(self) -> Range<usize> { self.start..self.start + self.count as usize }
}

/* ─────────────────────────── Session ─────────────────────────── */

/// One package load.
///
/// Owns everything built while decoding; on success it turns into a
/// [`Package`], on failure it is dropped whole.
pub struct Session<B: Binder> {
    pub(crate) binder: B,
    pub(crate) options: UnpackOptions,
    pub(crate) heap: Heap,
    pub(crate) table: ConstantTable,
    pub(crate) declarations: DeclarationWindow,
    pub(crate) entry: Option<ValueRef>,
    pub(crate) type_info: TypeInfoChunk,
    type_decoder: Box<dyn TypeInfoDecoder>,
}

impl<B: Binder> Session<B> {
    /// New session resolving externals through `binder`.
    pub fn new(binder: B, options: UnpackOptions) -> Self {
        Self {
            binder,
            options,
            heap: Heap::new(),
            table: ConstantTable::with_capacity_limit(options.max_constants),
            declarations: DeclarationWindow::default(),
            entry: None,
            type_info: TypeInfoChunk::default(),
            type_decoder: Box::new(RawTypeInfo),
        }
    }

    /// Replaces the type-information decoder (default: [`RawTypeInfo`]).
    #[must_use]
    pub fn with_type_info_decoder<D: TypeInfoDecoder + 'static>(mut self, decoder: D) -> Self {
        self.type_decoder = Box::new(decoder);
        self
    }

    /// Decodes `bytes` and links the result.
    pub fn unpack(mut self, bytes: &[u8]) -> UnpackResult<Package> {
        let mut cursor = Cursor::new(bytes);

        raff::verify_top_header(&mut cursor)?;
        let package_size = raff::read_chunk_header(&mut cursor, PACKAGE_ICON, PACKAGE_NAME)?;
        debug!("package chunk: {package_size} bytes announced, {} available", cursor.remaining());

        self.read_type_information(&mut cursor)?;

        let code_size = raff::read_chunk_header(&mut cursor, CODE_ICON, CODE_NAME)?;
        let code_start = cursor.position();
        self.read_code(&mut cursor)?;

        let decoded = cursor.position() - code_start;
        if usize::try_from(code_size).map_or(true, |announced| announced != decoded) {
            debug!("code chunk announced {code_size} bytes, decoded {decoded}");
        }

        info!(
            "unpacked {} constants, {} functions, entry: {}",
            self.table.len(),
            self.declarations.count,
            if self.entry.is_some() { "main" } else { "none" }
        );

        Ok(Package::new(self.heap, self.table, self.type_info, self.declarations, self.entry))
    }

    fn read_type_information(&mut self, cursor: &mut Cursor<'_>) -> UnpackResult<()> {
        let size = raff::read_chunk_header(cursor, TYPE_INFO_ICON, TYPE_INFO_NAME)?;
        let body = cursor.take_slice(usize::try_from(size).unwrap_or(usize::MAX))?;
        self.type_info = self.type_decoder.deserialize(body).map_err(UnpackError::TypeInfoDeserializeFailed)?;
        debug!("type information: {size} bytes");
        Ok(())
    }

    fn read_code(&mut self, cursor: &mut Cursor<'_>) -> UnpackResult<()> {
        for section in Section::ORDER {
            expect_marker(cursor, section)?;
            let start = self.table.len();
            match section {
                Section::ExternalFunctions => self.read_external_functions(cursor)?,
                Section::FunctionDeclarations => self.read_function_declarations(cursor)?,
                Section::Booleans => self.read_booleans(cursor)?,
                Section::Integers => self.read_integers(cursor)?,
                Section::Strings => self.read_strings(cursor)?,
                Section::ResourceNames => self.read_resource_names(cursor)?,
                Section::FunctionBodies => self.read_function_bodies(cursor)?,
            }
            self.table.record_section(section, start..self.table.len());
        }
        Ok(())
    }
}

fn expect_marker(cursor: &mut Cursor<'_>, section: Section) -> UnpackResult<()> {
    trace!("marker {} at {}", section.marker(), cursor.position());
    raff::read_marker(cursor, section.marker()).map_err(|err| {
        if let CoreError::MarkerMismatch { found, .. } = &err {
            debug!("expected {section} marker, found {found}");
        }
        UnpackError::from(err)
    })
}
