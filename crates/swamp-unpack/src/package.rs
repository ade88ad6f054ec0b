//! A loaded, linked package.

use swamp_runtime::{Function, Heap, Value, ValueRef};

use crate::session::DeclarationWindow;
use crate::type_info::TypeInfoChunk;
use crate::ConstantTable;

/// Result of a successful load.
///
/// Owns the heap holding every value of the program. Handles returned by
/// this type are only meaningful against [`Package::heap`].
#[derive(Debug, Clone)]
pub struct Package {
    heap: Heap,
    constants: ConstantTable,
    type_info: TypeInfoChunk,
    declarations: DeclarationWindow,
    entry: Option<ValueRef>,
}

impl Package {
    pub(crate) fn new(
        heap: Heap,
        constants: ConstantTable,
        type_info: TypeInfoChunk,
        declarations: DeclarationWindow,
        entry: Option<ValueRef>,
    ) -> Self {
        Self { heap, constants, type_info, declarations, entry }
    }

    /// Handle of the `main` function, if the package declares one.
    pub fn entry(&self) -> Option<ValueRef> { self.entry }

    /// The `main` function, if any.
    pub fn entry_function(&self) -> Option<&Function> { self.entry.and_then(|r| self.heap.function(r).ok()) }

    /// Value arena.
    pub fn heap(&self) -> &Heap { &self.heap }

    /// Constant table.
    pub fn constants(&self) -> &ConstantTable { &self.constants }

    /// Type information as decoded.
    pub fn type_info(&self) -> &TypeInfoChunk { &self.type_info }

    /// Where the declared functions sit in the constant table.
    pub fn declarations(&self) -> DeclarationWindow { self.declarations }

    /// Value behind a handle.
    pub fn value(&self, r: ValueRef) -> Option<&Value> { self.heap.get(r) }

    /// Value at constant-table position `index`.
    pub fn constant(&self, index: usize) -> Option<&Value> {
        self.constants.get(index).ok().and_then(|r| self.heap.get(r))
    }

    /// Declared functions, in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = (ValueRef, &Function)> + '_ {
        self.declarations.range().filter_map(move |i| {
            let r = self.constants.get(i).ok()?;
            self.heap.function(r).ok().map(|f| (r, f))
        })
    }

    /// Function declared as `name`. With duplicates, the last one.
    pub fn function(&self, name: &str) -> Option<(ValueRef, &Function)> {
        self.functions().filter(|(_, f)| f.name == name).last()
    }

    /// Name behind resource handle `handle`.
    pub fn resource_name(&self, handle: usize) -> Option<&str> { self.constants.resource_name(handle) }

    /// Hands the heap and entry handle to an executor.
    pub fn into_parts(self) -> (Heap, Option<ValueRef>) { (self.heap, self.entry) }
}
