//! `Heap`: append-only value arena addressed by `ValueRef`.
//!
//! Every value of a loaded program lives here until the heap is dropped.
//! Handles are never invalidated: there is no removal and no compaction.
//! This replaces per-value reference counting with one owner per program.

use std::num::NonZeroU32;

use thiserror::Error;

use crate::{ExternalFunction, Function, FunctionBody, NativeFn, Value};

/// Stable handle to a value in a [`Heap`]. Zero is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueRef(NonZeroU32);

impl ValueRef {
    fn from_slot(slot: usize) -> Option<Self> {
        u32::try_from(slot).ok().and_then(|s| s.checked_add(1)).and_then(NonZeroU32::new).map(Self)
    }

    /// Arena slot (0-based).
    pub fn slot(self) -> usize { (self.0.get() - 1) as usize }

    /// Raw non-zero handle value.
    pub fn raw(self) -> u32 { self.0.get() }
}

/// Heap errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    /// The handle does not belong to this heap.
    #[error("dangling value handle #{raw}")]
    DanglingRef {
        /// Raw handle.
        raw: u32,
    },
    /// A function operation targeted some other kind of value.
    #[error("value #{raw} is a {kind}, not a function")]
    NotAFunction {
        /// Raw handle.
        raw: u32,
        /// Actual kind.
        kind: &'static str,
    },
    /// The function already carries a body.
    #[error("function '{name}' is already defined")]
    AlreadyDefined {
        /// Function name.
        name: String,
    },
    /// No more handles can be issued.
    #[error("heap exhausted")]
    Exhausted,
}

/// Heap result.
pub type HeapResult<T> = Result<T, HeapError>;

/// Value arena for one program.
#[derive(Debug, Default, Clone)]
pub struct Heap {
    values: Vec<Value>,
}

impl Heap {
    /// Empty heap.
    pub fn new() -> Self { Self::default() }

    /// Number of values.
    pub fn len(&self) -> usize { self.values.len() }

    /// True when nothing was allocated.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Stores a value and returns its handle.
    pub fn alloc(&mut self, value: Value) -> HeapResult<ValueRef> {
        let r = ValueRef::from_slot(self.values.len()).ok_or(HeapError::Exhausted)?;
        self.values.push(value);
        Ok(r)
    }

    /// Allocates a boolean.
    pub fn alloc_boolean(&mut self, b: bool) -> HeapResult<ValueRef> { self.alloc(Value::Boolean(b)) }

    /// Allocates an integer.
    pub fn alloc_integer(&mut self, i: i32) -> HeapResult<ValueRef> { self.alloc(Value::Integer(i)) }

    /// Allocates a string.
    pub fn alloc_string(&mut self, s: impl Into<String>) -> HeapResult<ValueRef> {
        self.alloc(Value::String(s.into()))
    }

    /// Allocates a host function binding.
    pub fn alloc_external_function(
        &mut self,
        name: impl Into<String>,
        param_count: u8,
        type_index: u8,
        func: Option<NativeFn>,
    ) -> HeapResult<ValueRef> {
        self.alloc(Value::ExternalFunction(ExternalFunction { name: name.into(), param_count, type_index, func }))
    }

    /// Allocates a declared function (no body yet).
    pub fn declare_function(
        &mut self,
        name: impl Into<String>,
        type_index: u8,
        declared_params: u8,
    ) -> HeapResult<ValueRef> {
        self.alloc(Value::Function(Function::declared(name, type_index, declared_params)))
    }

    /// Attaches `body` to a declared function, in place.
    ///
    /// The handle keeps pointing at the same function; a second definition
    /// fails with [`HeapError::AlreadyDefined`].
    pub fn define_function(&mut self, r: ValueRef, body: FunctionBody) -> HeapResult<()> {
        let value = self.values.get_mut(r.slot()).ok_or(HeapError::DanglingRef { raw: r.raw() })?;
        match value {
            Value::Function(f) if f.body.is_some() => Err(HeapError::AlreadyDefined { name: f.name.clone() }),
            Value::Function(f) => {
                log::trace!("define #{} '{}' ({} opcodes)", r.raw(), f.name, body.opcodes.len());
                f.body = Some(body);
                Ok(())
            }
            other => Err(HeapError::NotAFunction { raw: r.raw(), kind: other.kind() }),
        }
    }

    /// Looks up a value.
    pub fn get(&self, r: ValueRef) -> Option<&Value> { self.values.get(r.slot()) }

    /// Looks up a value that must be a function.
    pub fn function(&self, r: ValueRef) -> HeapResult<&Function> {
        match self.get(r) {
            Some(Value::Function(f)) => Ok(f),
            Some(other) => Err(HeapError::NotAFunction { raw: r.raw(), kind: other.kind() }),
            None => Err(HeapError::DanglingRef { raw: r.raw() }),
        }
    }

    /// Iterates as `(handle, &Value)` in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ValueRef, &Value)> + '_ {
        self.values.iter().enumerate().filter_map(|(slot, v)| ValueRef::from_slot(slot).map(|r| (r, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body(consts: Vec<ValueRef>) -> FunctionBody {
        FunctionBody { param_count: 1, variable_count: 2, temp_count: 0, opcodes: vec![0x01, 0x02], constants: consts }
    }

    #[test]
    fn handles_are_stable_and_non_zero() -> HeapResult<()> {
        let mut heap = Heap::new();
        let a = heap.alloc_integer(10)?;
        let b = heap.alloc_boolean(true)?;
        assert_eq!(a.raw(), 1);
        assert_eq!(b.slot(), 1);
        assert_eq!(heap.get(a).and_then(Value::as_integer), Some(10));
        assert_eq!(heap.iter().count(), 2);
        Ok(())
    }

    #[test]
    fn define_in_place_keeps_identity() -> HeapResult<()> {
        let mut heap = Heap::new();
        let callee = heap.declare_function("helper", 0, 1)?;
        let caller = heap.declare_function("main", 1, 0)?;

        // caller's body references callee before callee is defined
        heap.define_function(caller, body(vec![callee]))?;
        assert!(!heap.function(callee)?.is_defined());

        heap.define_function(callee, body(vec![]))?;
        let seen_from_caller = heap.function(caller)?.body().map(|b| b.constants[0]);
        assert_eq!(seen_from_caller, Some(callee));
        assert!(heap.function(callee)?.is_defined());
        Ok(())
    }

    #[test]
    fn defined_exactly_once() -> HeapResult<()> {
        let mut heap = Heap::new();
        let f = heap.declare_function("main", 0, 0)?;
        heap.define_function(f, body(vec![]))?;
        assert_eq!(heap.define_function(f, body(vec![])), Err(HeapError::AlreadyDefined { name: "main".into() }));
        Ok(())
    }

    #[test]
    fn define_rejects_non_functions() -> HeapResult<()> {
        let mut heap = Heap::new();
        let s = heap.alloc_string("nope")?;
        assert_eq!(heap.define_function(s, body(vec![])), Err(HeapError::NotAFunction { raw: 1, kind: "string" }));
        assert!(matches!(heap.function(s), Err(HeapError::NotAFunction { .. })));

        let mut other = Heap::new();
        assert_eq!(other.define_function(s, body(vec![])), Err(HeapError::DanglingRef { raw: 1 }));
        Ok(())
    }
}
