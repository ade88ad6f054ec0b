//! swamp-runtime — values and native bindings for the Swamp VM
//!
//! - `Value`   : tagged runtime value (Boolean/Integer/String/ExternalFunction/Function)
//! - `Heap`    : append-only arena owning every value of a loaded program,
//!   addressed by stable `ValueRef` handles
//! - `Function`: declared first, defined (body attached) exactly once, in place
//! - `Runtime` : native function registry, resolved by name through `Binder`
//!
//! This crate does **not** execute bytecode; it only models what a loader
//! produces and what the VM will later consume.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]
#![cfg_attr(not(debug_assertions), warn(missing_docs))]

use std::fmt;

pub mod heap;
pub mod natives;

pub use heap::{Heap, HeapError, HeapResult, ValueRef};
pub use natives::{Binder, Captured, Error, NativeEntry, NativeFn, RResult, Runtime, RuntimeCtx};

/* --------------------------- Value types --------------------------- */

/// Value owned by the [`Heap`].
#[derive(Clone)]
pub enum Value {
    /// Boolean.
    Boolean(bool),
    /// 32-bit signed integer. Resource names are integers too.
    Integer(i32),
    /// Owned string.
    String(String),
    /// Binding to a host (native) function.
    ExternalFunction(ExternalFunction),
    /// Bytecode function, declared or defined.
    Function(Function),
}

impl Value {
    /// Short kind name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::ExternalFunction(_) => "external",
            Value::Function(_) => "function",
        }
    }

    /// Returns the function if this value is one.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the integer payload if this value is one.
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Integer(i) => write!(f, "Integer({i})"),
            Value::String(s) => {
                if s.len() > 64 { write!(f, "String({}…)", truncate(s, 64)) } else { write!(f, "String({s:?})") }
            }
            Value::ExternalFunction(e) => fmt::Debug::fmt(e, f),
            Value::Function(func) => fmt::Debug::fmt(func, f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::String(s) => write!(f, "{s}"),
            Value::ExternalFunction(e) => write!(f, "<external {}/{}>", e.name, e.param_count),
            Value::Function(func) => write!(f, "<fn {}>", func.name),
        }
    }
}

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Boolean(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Integer(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }

impl TryFrom<Value> for bool {
    type Error = Error;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v { Value::Boolean(b) => Ok(b), other => Err(Error::Type(format!("boolean, got {}", other.kind()))) }
    }
}
impl TryFrom<Value> for i32 {
    type Error = Error;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v { Value::Integer(i) => Ok(i), other => Err(Error::Type(format!("integer, got {}", other.kind()))) }
    }
}
impl TryFrom<Value> for String {
    type Error = Error;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v { Value::String(s) => Ok(s), other => Err(Error::Type(format!("string, got {}", other.kind()))) }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Host function binding. `func` is `None` when the loader was told to
/// tolerate names the host could not resolve.
#[derive(Clone)]
pub struct ExternalFunction {
    /// Name the package asked for.
    pub name: String,
    /// Declared parameter count.
    pub param_count: u8,
    /// Type reference into the package's type information.
    pub type_index: u8,
    /// Resolved implementation.
    pub func: Option<NativeFn>,
}

impl ExternalFunction {
    /// True if a native implementation is attached.
    pub fn is_bound(&self) -> bool { self.func.is_some() }
}

impl fmt::Debug for ExternalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalFunction")
            .field("name", &self.name)
            .field("param_count", &self.param_count)
            .field("type_index", &self.type_index)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Compiled body attached to a declared [`Function`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBody {
    /// Parameter count as stated by the body.
    pub param_count: u8,
    /// Local variable slots.
    pub variable_count: u8,
    /// Temporary slots.
    pub temp_count: u8,
    /// Raw opcodes, not interpreted here.
    pub opcodes: Vec<u8>,
    /// Constants referenced by the opcodes, in body order.
    pub constants: Vec<ValueRef>,
}

/// Bytecode function.
///
/// Starts *declared* (name + type only). The loader attaches its body later
/// with [`Heap::define_function`]; the handle stays the same, so references
/// recorded before the body was read stay valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Debug name.
    pub name: String,
    /// Type reference into the package's type information.
    pub type_index: u8,
    /// Parameter count from the declaration.
    pub declared_params: u8,
    body: Option<FunctionBody>,
}

impl Function {
    /// A function without a body.
    pub fn declared(name: impl Into<String>, type_index: u8, declared_params: u8) -> Self {
        Self { name: name.into(), type_index, declared_params, body: None }
    }

    /// True once the body has been attached.
    pub fn is_defined(&self) -> bool { self.body.is_some() }

    /// Body, if defined.
    pub fn body(&self) -> Option<&FunctionBody> { self.body.as_ref() }
}

/* -------------------------------- Prelude -------------------------------- */

/// Import everything at once.
pub mod prelude {
    pub use crate::{
        Binder, Captured, Error, ExternalFunction, Function, FunctionBody, Heap, HeapError, NativeEntry,
        NativeFn, RResult, Runtime, RuntimeCtx, Value, ValueRef,
    };
}

/* --------------------------------- Tests --------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(i32::try_from(Value::from(7)).unwrap(), 7);
        assert!(bool::try_from(Value::from("x")).is_err());
        assert_eq!(String::try_from(Value::from("hi")).unwrap(), "hi");
        assert_eq!(Value::from(true).kind(), "boolean");
    }

    #[test]
    fn debug_truncates_long_strings() {
        let long = "é".repeat(80);
        let shown = format!("{:?}", Value::from(long.as_str()));
        assert!(shown.ends_with("…)"));
        assert!(shown.len() < long.len());
    }

    #[test]
    fn declared_function_has_no_body() {
        let f = Function::declared("main", 3, 0);
        assert!(!f.is_defined());
        assert!(f.body().is_none());
        assert_eq!(Value::Function(f).to_string(), "<fn main>");
    }
}
