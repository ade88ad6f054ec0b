//! Package fixtures for integration tests.
#![allow(dead_code)]

use swamp_core::{raff, ByteWriter, Tag};
use swamp_unpack::format::{CODE_ICON, CODE_NAME, PACKAGE_ICON, PACKAGE_NAME, TYPE_INFO_ICON, TYPE_INFO_NAME};
use swamp_unpack::Section;

#[derive(Debug, Clone, Default)]
pub struct Body {
    pub params: u8,
    pub vars: u8,
    pub temps: u8,
    pub constants: Vec<u8>,
    pub opcodes: Vec<u8>,
}

impl Body {
    pub fn empty() -> Self { Self::default() }

    pub fn with(constants: &[u8], opcodes: &[u8]) -> Self {
        Self { constants: constants.to_vec(), opcodes: opcodes.to_vec(), ..Self::default() }
    }
}

/// Builder for a complete spk3 package.
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    pub type_info: Vec<u8>,
    pub externals: Vec<(u8, String, u8)>,
    pub declarations: Vec<(u8, String, u8)>,
    pub booleans: Vec<bool>,
    pub integers: Vec<i32>,
    pub strings: Vec<String>,
    pub resources: Vec<String>,
    pub bodies: Vec<Body>,
    /// Writes this tag instead of the given section's marker.
    pub marker_override: Option<(Section, Tag)>,
    /// Body count to write instead of `bodies.len()`.
    pub body_count_override: Option<u32>,
}

impl Fixture {
    pub fn new() -> Self { Self::default() }

    pub fn external(mut self, params: u8, name: &str, type_ref: u8) -> Self {
        self.externals.push((params, name.into(), type_ref));
        self
    }

    pub fn declare(mut self, params: u8, name: &str, type_ref: u8) -> Self {
        self.declarations.push((params, name.into(), type_ref));
        self
    }

    pub fn boolean(mut self, b: bool) -> Self {
        self.booleans.push(b);
        self
    }

    pub fn integer(mut self, i: i32) -> Self {
        self.integers.push(i);
        self
    }

    pub fn string(mut self, s: &str) -> Self {
        self.strings.push(s.into());
        self
    }

    pub fn resource(mut self, s: &str) -> Self {
        self.resources.push(s.into());
        self
    }

    pub fn body(mut self, b: Body) -> Self {
        self.bodies.push(b);
        self
    }

    fn marker(&self, w: &mut ByteWriter, section: Section) {
        let tag = match self.marker_override {
            Some((s, tag)) if s == section => tag,
            _ => section.marker(),
        };
        raff::write_marker(w, tag);
    }

    fn code(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();

        self.marker(&mut w, Section::ExternalFunctions);
        w.write_u8(u8::try_from(self.externals.len()).unwrap());
        for (params, name, type_ref) in &self.externals {
            w.write_u8(*params);
            w.write_string(name).unwrap();
            w.write_u8(*type_ref);
        }

        self.marker(&mut w, Section::FunctionDeclarations);
        w.write_u32_be(u32::try_from(self.declarations.len()).unwrap());
        for (params, name, type_ref) in &self.declarations {
            w.write_u8(*params);
            w.write_string(name).unwrap();
            w.write_u8(*type_ref);
        }

        self.marker(&mut w, Section::Booleans);
        w.write_u8(u8::try_from(self.booleans.len()).unwrap());
        for b in &self.booleans {
            w.write_u8(u8::from(*b));
        }

        self.marker(&mut w, Section::Integers);
        w.write_u8(u8::try_from(self.integers.len()).unwrap());
        for i in &self.integers {
            w.write_i32_be(*i);
        }

        self.marker(&mut w, Section::Strings);
        w.write_u8(u8::try_from(self.strings.len()).unwrap());
        for s in &self.strings {
            w.write_string(s).unwrap();
        }

        self.marker(&mut w, Section::ResourceNames);
        w.write_u8(u8::try_from(self.resources.len()).unwrap());
        for s in &self.resources {
            w.write_string(s).unwrap();
        }

        self.marker(&mut w, Section::FunctionBodies);
        w.write_u32_be(self.body_count_override.unwrap_or_else(|| u32::try_from(self.bodies.len()).unwrap()));
        for b in &self.bodies {
            w.write_u8(b.params);
            w.write_u8(b.vars);
            w.write_u8(b.temps);
            w.write_u8(u8::try_from(b.constants.len()).unwrap());
            for c in &b.constants {
                w.write_u8(*c);
            }
            w.write_u16_be(u16::try_from(b.opcodes.len()).unwrap());
            w.write_bytes(&b.opcodes);
        }

        w.into_vec()
    }

    pub fn build(&self) -> Vec<u8> {
        let code = self.code();

        let mut inner = ByteWriter::new();
        raff::write_chunk_header(&mut inner, TYPE_INFO_ICON, TYPE_INFO_NAME, u32::try_from(self.type_info.len()).unwrap());
        inner.write_bytes(&self.type_info);
        raff::write_chunk_header(&mut inner, CODE_ICON, CODE_NAME, u32::try_from(code.len()).unwrap());
        inner.write_bytes(&code);

        let mut w = ByteWriter::new();
        raff::write_file_header(&mut w);
        raff::write_chunk_header(&mut w, PACKAGE_ICON, PACKAGE_NAME, u32::try_from(inner.len()).unwrap());
        w.write_bytes(inner.as_slice());
        w.into_vec()
    }
}

/// Declares `main` with an empty body.
pub fn minimal_main() -> Fixture { Fixture::new().declare(0, "main", 0).body(Body::empty()) }

/// Something of everything; constant layout:
/// 0 Debug.log, 1 main, 2 helper, 3 true, 4 42, 5 "hello", 6 resource "sprite".
pub fn sample() -> Fixture {
    Fixture::new()
        .external(1, "Debug.log", 0)
        .declare(0, "main", 1)
        .declare(1, "helper", 2)
        .boolean(true)
        .integer(42)
        .string("hello")
        .resource("sprite")
        .body(Body::with(&[2, 5, 0], &[0x10, 0x02, 0x00, 0x20]))
        .body(Body::with(&[0, 4], &[0x01]))
}
