//! Section decoders.
//!
//! Each reads its entry count, then its entries, appending one constant per
//! entry (bodies append nothing: they complete the declared functions).

use log::{debug, info, warn};
use swamp_core::{Cursor, MAX_STRING_LEN};
use swamp_runtime::{Binder, FunctionBody};

use crate::format::ENTRY_NAME;
use crate::session::{DeclarationWindow, Session};
use crate::{UnpackError, UnpackResult};

/// `(param_count, name, type_ref)`, shared by externals and declarations.
struct Signature {
    param_count: u8,
    name: String,
    type_ref: u8,
}

fn read_signature(cursor: &mut Cursor<'_>) -> UnpackResult<Signature> {
    let param_count = cursor.read_u8()?;
    let name = cursor.read_string(MAX_STRING_LEN)?;
    let type_ref = cursor.read_u8()?;
    Ok(Signature { param_count, name, type_ref })
}

impl<B: Binder> Session<B> {
    pub(crate) fn read_external_functions(&mut self, cursor: &mut Cursor<'_>) -> UnpackResult<()> {
        let count = cursor.read_count()?;
        info!("=== read external functions {count} ===");

        for i in 0..count {
            let Signature { param_count, name, type_ref } = read_signature(cursor)?;
            debug!(
                "{}: ({i}) external {name} params:{param_count} type:{}",
                self.table.len(),
                self.type_info.describe_or_unknown(type_ref)
            );

            let mut func = self.binder.bind(&name);
            if func.is_none() {
                if !self.options.ignore_external_bind_errors {
                    return Err(UnpackError::ExternalBindingFailed { name });
                }
                warn!("external function '{name}' is not provided by the host; left unbound");
            } else if let Some(expected) = self.binder.arity(&name).filter(|&n| n != usize::from(param_count)) {
                if !self.options.ignore_external_bind_errors {
                    return Err(UnpackError::ExternalArityMismatch { name, declared: param_count, expected });
                }
                warn!("external function '{name}' declares {param_count} params, host expects {expected}; left unbound");
                func = None;
            }

            let r = self.heap.alloc_external_function(name, param_count, type_ref, func)?;
            self.table.push(r)?;
        }
        Ok(())
    }

    pub(crate) fn read_function_declarations(&mut self, cursor: &mut Cursor<'_>) -> UnpackResult<()> {
        let count = cursor.read_dword_count()?;
        info!("=== read function declarations {count} ===");

        let start = self.table.len();
        for i in 0..count {
            let Signature { param_count, name, type_ref } = read_signature(cursor)?;
            debug!(
                "{}: ({i}) declare {name} params:{param_count} type:{}",
                self.table.len(),
                self.type_info.describe_or_unknown(type_ref)
            );

            let is_entry = name == ENTRY_NAME;
            let r = self.heap.declare_function(name, type_ref, param_count)?;
            self.table.push(r)?;

            if is_entry && self.entry.replace(r).is_some() {
                warn!("'{ENTRY_NAME}' declared more than once; using the last declaration");
            }
        }

        self.declarations = DeclarationWindow { start, count };
        Ok(())
    }

    pub(crate) fn read_booleans(&mut self, cursor: &mut Cursor<'_>) -> UnpackResult<()> {
        let count = cursor.read_count()?;
        info!("=== read booleans {count} ===");

        for _ in 0..count {
            let b = cursor.read_u8()? != 0;
            debug!("{}: boolean {b}", self.table.len());
            let r = self.heap.alloc_boolean(b)?;
            self.table.push(r)?;
        }
        Ok(())
    }

    pub(crate) fn read_integers(&mut self, cursor: &mut Cursor<'_>) -> UnpackResult<()> {
        let count = cursor.read_count()?;
        info!("=== read integers {count} ===");

        for _ in 0..count {
            let v = cursor.read_i32_be()?;
            debug!("{}: integer {v}", self.table.len());
            let r = self.heap.alloc_integer(v)?;
            self.table.push(r)?;
        }
        Ok(())
    }

    pub(crate) fn read_strings(&mut self, cursor: &mut Cursor<'_>) -> UnpackResult<()> {
        let count = cursor.read_count()?;
        info!("=== read strings {count} ===");

        for _ in 0..count {
            let s = cursor.read_string(MAX_STRING_LEN)?;
            debug!("{}: string {s:?}", self.table.len());
            let r = self.heap.alloc_string(s)?;
            self.table.push(r)?;
        }
        Ok(())
    }

    /// Resource names become integer handles; the text goes to the side table.
    pub(crate) fn read_resource_names(&mut self, cursor: &mut Cursor<'_>) -> UnpackResult<()> {
        let count = cursor.read_count()?;
        info!("=== read resource names {count} ===");

        for i in 0..count {
            let name = cursor.read_string(MAX_STRING_LEN)?;
            debug!("{}: resource {i} {name:?}", self.table.len());
            self.table.push_resource_name(name);
            let r = self.heap.alloc_integer(i32::from(i))?;
            self.table.push(r)?;
        }
        Ok(())
    }

    /// Attaches a body to every declared function, in declaration order.
    ///
    /// The count is checked before anything is defined. Body constants may
    /// name any position already in the table, including functions whose
    /// own body comes later.
    pub(crate) fn read_function_bodies(&mut self, cursor: &mut Cursor<'_>) -> UnpackResult<()> {
        let count = cursor.read_dword_count()?;
        info!("=== read function bodies {count} ===");

        let window = self.declarations;
        if count != window.count {
            return Err(UnpackError::FunctionCountMismatch { declared: window.count, bodies: count });
        }

        for (i, slot) in window.range().enumerate() {
            let param_count = cursor.read_u8()?;
            let variable_count = cursor.read_u8()?;
            let temp_count = cursor.read_u8()?;
            let constant_count = cursor.read_u8()?;

            let function = self.table.get(slot)?;

            let mut constants = Vec::with_capacity(usize::from(constant_count));
            for _ in 0..constant_count {
                let index = cursor.read_u8()?;
                constants.push(self.table.get(usize::from(index))?);
            }

            let opcode_count = cursor.read_u16_be()?;
            let opcodes = cursor.take_slice(usize::from(opcode_count))?.to_vec();

            let name = &self.heap.function(function)?.name;
            debug!(
                "{slot}: ({i}) define {name} params:{param_count} vars:{variable_count} temps:{temp_count} consts:{constant_count} opcodes:{opcode_count}"
            );

            self.heap.define_function(function, FunctionBody {
                param_count,
                variable_count,
                temp_count,
                opcodes,
                constants,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Section, UnpackOptions};
    use pretty_assertions::assert_eq;
    use swamp_core::ByteWriter;
    use swamp_runtime::{HeapError, NativeFn, Runtime, Value};

    fn strict() -> Session<Runtime> { Session::new(Runtime::with_defaults(), UnpackOptions::default()) }

    fn value<B: Binder>(s: &Session<B>, index: usize) -> &Value {
        s.heap.get(s.table.get(index).unwrap()).unwrap()
    }

    fn decl(w: &mut ByteWriter, name: &str) {
        w.write_u8(0);
        w.write_string(name).unwrap();
        w.write_u8(0);
    }

    #[test]
    fn literals_append_in_order() {
        let mut w = ByteWriter::new();
        w.write_u8(2);
        w.write_u8(1);
        w.write_u8(0);
        w.write_u8(1);
        w.write_i32_be(-7);
        w.write_u8(1);
        w.write_string("hé").unwrap();

        let mut s = strict();
        let mut c = Cursor::new(w.as_slice());
        s.read_booleans(&mut c).unwrap();
        s.read_integers(&mut c).unwrap();
        s.read_strings(&mut c).unwrap();

        assert_eq!(c.remaining(), 0);
        assert_eq!(s.table.len(), 4);
        assert!(matches!(value(&s, 0), Value::Boolean(true)));
        assert!(matches!(value(&s, 1), Value::Boolean(false)));
        assert_eq!(value(&s, 2).as_integer(), Some(-7));
        assert!(matches!(value(&s, 3), Value::String(x) if x == "hé"));
    }

    #[test]
    fn resource_names_are_positions() {
        let mut w = ByteWriter::new();
        w.write_u8(2);
        w.write_string("a").unwrap();
        w.write_string("b").unwrap();

        let mut s = strict();
        s.read_resource_names(&mut Cursor::new(w.as_slice())).unwrap();
        assert_eq!(value(&s, 0).as_integer(), Some(0));
        assert_eq!(value(&s, 1).as_integer(), Some(1));
        assert_eq!(s.table.resource_names(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn externals_bind_or_fail() {
        let mut w = ByteWriter::new();
        w.write_u8(1);
        w.write_u8(1);
        w.write_string("Nope.missing").unwrap();
        w.write_u8(0);

        let err = strict().read_external_functions(&mut Cursor::new(w.as_slice())).unwrap_err();
        assert!(matches!(err, UnpackError::ExternalBindingFailed { name } if name == "Nope.missing"));

        let mut lenient = Session::new(Runtime::with_defaults(), UnpackOptions::new().lenient(true));
        lenient.read_external_functions(&mut Cursor::new(w.as_slice())).unwrap();
        assert!(matches!(value(&lenient, 0), Value::ExternalFunction(e) if !e.is_bound() && e.param_count == 1));
    }

    #[test]
    fn externals_resolve_through_binder() {
        fn log_only(name: &str) -> Option<NativeFn> {
            Runtime::with_defaults().bind(name).filter(|_| name == "Debug.log")
        }
        let mut w = ByteWriter::new();
        w.write_u8(1);
        w.write_u8(1);
        w.write_string("Debug.log").unwrap();
        w.write_u8(3);

        let mut s = Session::new(log_only, UnpackOptions::default());
        s.read_external_functions(&mut Cursor::new(w.as_slice())).unwrap();
        assert!(matches!(value(&s, 0), Value::ExternalFunction(e) if e.is_bound() && e.type_index == 3));
    }

    #[test]
    fn externals_must_match_host_arity() {
        let mut w = ByteWriter::new();
        w.write_u8(1);
        w.write_u8(0);
        w.write_string("Debug.log").unwrap();
        w.write_u8(0);

        let err = strict().read_external_functions(&mut Cursor::new(w.as_slice())).unwrap_err();
        assert!(matches!(
            err,
            UnpackError::ExternalArityMismatch { ref name, declared: 0, expected: 1 } if name == "Debug.log"
        ));

        let mut lenient = Session::new(Runtime::with_defaults(), UnpackOptions::new().lenient(true));
        lenient.read_external_functions(&mut Cursor::new(w.as_slice())).unwrap();
        assert!(matches!(value(&lenient, 0), Value::ExternalFunction(e) if !e.is_bound() && e.param_count == 0));
    }

    #[test]
    fn last_main_wins() {
        let mut w = ByteWriter::new();
        w.write_u32_be(3);
        decl(&mut w, "main");
        decl(&mut w, "helper");
        decl(&mut w, "main");

        let mut s = strict();
        s.read_function_declarations(&mut Cursor::new(w.as_slice())).unwrap();
        assert_eq!(s.declarations, DeclarationWindow { start: 0, count: 3 });
        assert_eq!(s.entry, Some(s.table.get(2).unwrap()));
    }

    #[test]
    fn body_count_must_match_declarations() {
        let mut w = ByteWriter::new();
        w.write_u32_be(1);
        decl(&mut w, "main");
        w.write_u32_be(2);

        let mut s = strict();
        let mut c = Cursor::new(w.as_slice());
        s.read_function_declarations(&mut c).unwrap();
        let err = s.read_function_bodies(&mut c).unwrap_err();
        assert!(matches!(err, UnpackError::FunctionCountMismatch { declared: 1, bodies: 2 }));
        assert!(!s.heap.function(s.table.get(0).unwrap()).unwrap().is_defined());
    }

    #[test]
    fn body_constant_past_table_end() {
        let mut w = ByteWriter::new();
        w.write_u32_be(1);
        decl(&mut w, "main");
        w.write_u32_be(1);
        w.write_bytes(&[0, 0, 0, 1, 9]);

        let mut s = strict();
        let mut c = Cursor::new(w.as_slice());
        s.read_function_declarations(&mut c).unwrap();
        let err = s.read_function_bodies(&mut c).unwrap_err();
        assert!(matches!(err, UnpackError::ConstantIndexOutOfRange { index: 9, len: 1 }));
    }

    #[test]
    fn body_slot_must_hold_a_function() {
        let mut w = ByteWriter::new();
        w.write_u8(1);
        w.write_u8(1);
        w.write_u32_be(1);
        w.write_bytes(&[0, 0, 0, 0, 0, 0]);

        let mut s = strict();
        let mut c = Cursor::new(w.as_slice());
        s.read_booleans(&mut c).unwrap();
        s.declarations = DeclarationWindow { start: 0, count: 1 };
        let err = s.read_function_bodies(&mut c).unwrap_err();
        assert!(matches!(err, UnpackError::Heap(HeapError::NotAFunction { raw: 1, kind: "boolean" })));
    }

    #[test]
    fn sections_are_recorded() {
        let mut w = ByteWriter::new();
        w.write_u8(1);
        w.write_i32_be(5);
        let mut s = strict();
        s.read_integers(&mut Cursor::new(w.as_slice())).unwrap();
        s.table.record_section(Section::Integers, 0..1);
        assert_eq!(s.table.section_of(0), Some(Section::Integers));
    }
}
