//! Native (host) functions: registry, call context and name binding.
//!
//! A package names the host functions it needs; the loader resolves each
//! name through a [`Binder`] handed to it at construction. [`Runtime`] is the
//! stock registry, but any `Fn(&str) -> Option<NativeFn>` works too.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::Value;

/* ------------------------------ Errors ------------------------------ */

/// Native call errors.
#[derive(Debug, Error)]
pub enum Error {
    /// No native registered under that name.
    #[error("native function not found: {0}")]
    NotFound(String),

    /// Wrong number of arguments.
    #[error("wrong arity: expected {expected}, got {got}")]
    Arity {
        /// Arguments the native takes.
        expected: usize,
        /// Arguments supplied.
        got: usize,
    },

    /// Unexpected argument type.
    #[error("invalid type: expected {0}")]
    Type(String),

    /// Host I/O.
    #[error("io: {0}")]
    Io(#[from] io::Error),

    /// Anything else.
    #[error("{0}")]
    Msg(String),
}

/// Native call result.
pub type RResult<T> = std::result::Result<T, Error>;

/* -------------------------- Native signature -------------------------- */

/// Native function: receives argument values and a mutable context.
pub type NativeFn = fn(&[Value], &mut RuntimeCtx) -> RResult<Value>;

/// Registry entry.
#[derive(Clone)]
pub struct NativeEntry {
    /// Full name, `Module.name`.
    pub fqname: String,
    /// Arity, if fixed.
    pub arity: Option<usize>,
    /// Implementation.
    pub func: NativeFn,
}

/// Resolves a host function name to its implementation.
pub trait Binder {
    /// `None` when the host does not provide `name`.
    fn bind(&self, name: &str) -> Option<NativeFn>;

    /// Fixed arity of `name`, when the host knows it.
    fn arity(&self, _name: &str) -> Option<usize> { None }
}

impl<F> Binder for F
where
    F: Fn(&str) -> Option<NativeFn>,
{
    fn bind(&self, name: &str) -> Option<NativeFn> { self(name) }
}

/* ------------------------------ Context ------------------------------ */

/// Context passed to natives.
pub struct RuntimeCtx {
    /// Where `Debug.log` writes (capturable in tests).
    pub stdout: Box<dyn Write + Send>,
}

impl RuntimeCtx {
    /// Writes a line terminated by `\n`.
    pub fn writeln_str(&mut self, s: &str) -> io::Result<()> {
        self.stdout.write_all(s.as_bytes())?;
        self.stdout.write_all(b"\n")
    }
}

/* ------------------------------ Runtime ------------------------------ */

/// Native registry plus the shared context.
pub struct Runtime {
    registry: HashMap<String, NativeEntry>,
    ctx: RuntimeCtx,
}

impl Default for Runtime {
    fn default() -> Self { Self::new() }
}

impl Runtime {
    /// Empty registry writing to the real stdout.
    pub fn new() -> Self {
        Self { registry: HashMap::new(), ctx: RuntimeCtx { stdout: Box::new(io::stdout()) } }
    }

    /// Test variant: stdout goes to a [`Captured`] buffer.
    pub fn with_captured_stdout() -> (Self, Captured) {
        let cap = Captured::default();
        let rt = Self { registry: HashMap::new(), ctx: RuntimeCtx { stdout: Box::new(cap.clone()) } };
        (rt, cap)
    }

    /// Replaces the output writer.
    #[must_use]
    pub fn with_stdout<W: Write + Send + 'static>(mut self, w: W) -> Self {
        self.ctx.stdout = Box::new(w);
        self
    }

    /// Registers `func` as `module.name`.
    pub fn register_fn(&mut self, module: &str, name: &str, arity: Option<usize>, func: NativeFn) {
        let fq = format!("{module}.{name}");
        self.registry.insert(fq.clone(), NativeEntry { fqname: fq, arity, func });
    }

    /// Registers a whole module.
    pub fn register_all(&mut self, module: &str, entries: &[(&str, Option<usize>, NativeFn)]) {
        for (name, arity, func) in entries {
            self.register_fn(module, name, *arity, *func);
        }
    }

    /// Number of registered natives.
    pub fn len(&self) -> usize { self.registry.len() }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool { self.registry.is_empty() }

    /// Calls `module.name` with `args`, checking arity.
    pub fn call<S: AsRef<str>>(&mut self, fqname: S, args: &[Value]) -> RResult<Value> {
        let key = fqname.as_ref();
        let entry = self.registry.get(key).ok_or_else(|| Error::NotFound(key.to_string()))?;
        if let Some(exp) = entry.arity {
            if args.len() != exp {
                return Err(Error::Arity { expected: exp, got: args.len() });
            }
        }
        (entry.func)(args, &mut self.ctx)
    }

    /// Registry preloaded with the core natives.
    pub fn with_defaults() -> Self {
        let mut rt = Self::new();

        rt.register_all("Debug", &[
            ("log",      Some(1), native_debug_log as NativeFn),
            ("toString", Some(1), native_debug_to_string as NativeFn),
        ]);

        rt.register_all("String", &[
            ("fromInt", Some(1), native_string_from_int as NativeFn),
            ("length",  Some(1), native_string_length as NativeFn),
        ]);

        rt.register_all("Basics", &[
            ("abs",    Some(1), native_basics_abs as NativeFn),
            ("negate", Some(1), native_basics_negate as NativeFn),
            ("not",    Some(1), native_basics_not as NativeFn),
        ]);

        rt
    }
}

impl Binder for Runtime {
    fn bind(&self, name: &str) -> Option<NativeFn> { self.registry.get(name).map(|e| e.func) }

    fn arity(&self, name: &str) -> Option<usize> { self.registry.get(name).and_then(|e| e.arity) }
}

/* --------------------------- Default natives --------------------------- */

/// First argument; natives can be called without the registry's arity check.
fn arg0(args: &[Value]) -> RResult<&Value> { args.first().ok_or(Error::Arity { expected: 1, got: args.len() }) }

fn native_debug_log(args: &[Value], ctx: &mut RuntimeCtx) -> RResult<Value> {
    let v = arg0(args)?;
    ctx.writeln_str(&v.to_string())?;
    Ok(v.clone())
}

fn native_debug_to_string(args: &[Value], _ctx: &mut RuntimeCtx) -> RResult<Value> {
    Ok(Value::String(arg0(args)?.to_string()))
}

fn native_string_from_int(args: &[Value], _ctx: &mut RuntimeCtx) -> RResult<Value> {
    let i: i32 = arg0(args)?.clone().try_into()?;
    Ok(Value::String(i.to_string()))
}

fn native_string_length(args: &[Value], _ctx: &mut RuntimeCtx) -> RResult<Value> {
    let s: String = arg0(args)?.clone().try_into()?;
    let len = i32::try_from(s.chars().count()).map_err(|_| Error::Msg("string length overflows integer".into()))?;
    Ok(Value::Integer(len))
}

fn native_basics_abs(args: &[Value], _ctx: &mut RuntimeCtx) -> RResult<Value> {
    let i: i32 = arg0(args)?.clone().try_into()?;
    Ok(Value::Integer(i.wrapping_abs()))
}

fn native_basics_negate(args: &[Value], _ctx: &mut RuntimeCtx) -> RResult<Value> {
    let i: i32 = arg0(args)?.clone().try_into()?;
    Ok(Value::Integer(i.wrapping_neg()))
}

fn native_basics_not(args: &[Value], _ctx: &mut RuntimeCtx) -> RResult<Value> {
    let b: bool = arg0(args)?.clone().try_into()?;
    Ok(Value::Boolean(!b))
}

/* ------------------------ stdout capture ------------------------ */

/// Writer that **captures** output into a String (tests).
#[derive(Default, Clone)]
pub struct Captured(Arc<Mutex<String>>);

impl Captured {
    /// Copy of the buffer.
    pub fn get(&self) -> String { self.0.lock().unwrap_or_else(PoisonError::into_inner).clone() }
    /// Clears the buffer.
    pub fn clear(&self) { self.0.lock().unwrap_or_else(PoisonError::into_inner).clear(); }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push_str(&s);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

/* --------------------------------- Tests --------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_natives_work() {
        let cap = Captured::default();
        let mut rt = Runtime::with_defaults().with_stdout(cap.clone());

        let v = rt.call("Debug.log", &[Value::from("yo")]).unwrap();
        assert_eq!(v.to_string(), "yo");
        assert_eq!(cap.get(), "yo\n");

        let v = rt.call("Basics.abs", &[Value::from(-42)]).unwrap();
        assert_eq!(v.as_integer(), Some(42));

        let v = rt.call("String.fromInt", &[Value::from(7)]).unwrap();
        assert_eq!(v.to_string(), "7");
    }

    #[test]
    fn arity_and_types() {
        let mut rt = Runtime::with_defaults();
        assert!(matches!(rt.call("Basics.abs", &[]), Err(Error::Arity { expected: 1, got: 0 })));
        assert!(matches!(rt.call("Basics.not", &[Value::from(1)]), Err(Error::Type(_))));
        assert!(matches!(rt.call("Nope.nope", &[]), Err(Error::NotFound(_))));
    }

    #[test]
    fn runtime_binds_by_full_name() {
        let (mut rt, _) = Runtime::with_captured_stdout();
        assert!(rt.is_empty());
        rt.register_fn("t", "id", Some(1), |a, _| Ok(a[0].clone()));
        assert!(rt.bind("t.id").is_some());
        assert!(rt.bind("id").is_none());
    }

    #[test]
    fn bound_natives_reject_missing_arguments() {
        let rt = Runtime::with_defaults();
        let mut ctx = RuntimeCtx { stdout: Box::new(Captured::default()) };
        for name in ["Debug.log", "Debug.toString", "String.fromInt", "String.length", "Basics.abs", "Basics.negate", "Basics.not"] {
            let func = rt.bind(name).unwrap();
            assert!(matches!(func(&[], &mut ctx), Err(Error::Arity { expected: 1, got: 0 })), "{name}");
        }
    }

    #[test]
    fn runtime_reports_registered_arity() {
        let mut rt = Runtime::with_defaults();
        rt.register_fn("t", "any", None, |_, _| Ok(Value::from(0)));
        assert_eq!(rt.arity("Debug.log"), Some(1));
        assert_eq!(rt.arity("t.any"), None);
        assert_eq!(rt.arity("Nope.nope"), None);
    }

    #[test]
    fn closures_are_binders() {
        let only_log = |name: &str| -> Option<NativeFn> {
            (name == "Debug.log").then_some(native_debug_log as NativeFn)
        };
        assert!(only_log.bind("Debug.log").is_some());
        assert!(only_log.bind("Debug.toString").is_none());
        assert_eq!(only_log.arity("Debug.log"), None);
    }
}
