//! Fixtures shared by the benchmarks.
//!
//! Synthetic packages with N functions, each body referencing a few
//! literals and the next function (forward references), so the linker does
//! the same work a compiled program would ask of it.

use anyhow::Result;
use swamp_core::{raff, ByteWriter};
use swamp_unpack::format::{CODE_ICON, CODE_NAME, PACKAGE_ICON, PACKAGE_NAME, TYPE_INFO_ICON, TYPE_INFO_NAME};
use swamp_unpack::Section;

/// `functions` declarations (first one `main`), 16 integers, 16 strings,
/// 4 resources, 2 externals; every body is `opcodes` bytes long.
pub fn synth_package(functions: u32, opcodes: u16) -> Result<Vec<u8>> {
    let externals = ["Debug.log", "String.fromInt"];
    let mut code = ByteWriter::new();

    raff::write_marker(&mut code, Section::ExternalFunctions.marker());
    code.write_u8(u8::try_from(externals.len())?);
    for name in externals {
        code.write_u8(1);
        code.write_string(name)?;
        code.write_u8(0);
    }

    raff::write_marker(&mut code, Section::FunctionDeclarations.marker());
    code.write_u32_be(functions);
    for i in 0..functions {
        code.write_u8(u8::try_from(i % 4)?);
        if i == 0 {
            code.write_string("main")?;
        } else {
            code.write_string(&format!("fn_{i}"))?;
        }
        code.write_u8(0);
    }

    raff::write_marker(&mut code, Section::Booleans.marker());
    code.write_u8(2);
    code.write_u8(1);
    code.write_u8(0);

    raff::write_marker(&mut code, Section::Integers.marker());
    code.write_u8(16);
    for i in 0..16 {
        code.write_i32_be(i * 1000 - 7);
    }

    raff::write_marker(&mut code, Section::Strings.marker());
    code.write_u8(16);
    for i in 0..16 {
        code.write_string(&format!("string constant number {i}"))?;
    }

    raff::write_marker(&mut code, Section::ResourceNames.marker());
    code.write_u8(4);
    for name in ["player.png", "tiles.png", "jump.wav", "font.ttf"] {
        code.write_string(name)?;
    }

    // body constants are 1-byte indices: stay within the first 256 slots
    let table_len = externals.len() + functions as usize + 2 + 16 + 16 + 4;
    let reachable = table_len.min(256);
    raff::write_marker(&mut code, Section::FunctionBodies.marker());
    code.write_u32_be(functions);
    for i in 0..functions as usize {
        code.write_bytes(&[1, 4, 2]);
        let next_fn = externals.len() + (i + 1) % functions as usize;
        let picks = [0, next_fn, (i * 7) % reachable, (i * 13) % reachable];
        code.write_u8(4);
        for p in picks {
            code.write_u8(u8::try_from(p.min(reachable - 1))?);
        }
        code.write_u16_be(opcodes);
        code.write_bytes(&vec![0x42; usize::from(opcodes)]);
    }

    let mut inner = ByteWriter::new();
    raff::write_chunk_header(&mut inner, TYPE_INFO_ICON, TYPE_INFO_NAME, 0);
    raff::write_chunk_header(&mut inner, CODE_ICON, CODE_NAME, u32::try_from(code.len())?);
    inner.write_bytes(code.as_slice());

    let mut w = ByteWriter::new();
    raff::write_file_header(&mut w);
    raff::write_chunk_header(&mut w, PACKAGE_ICON, PACKAGE_NAME, u32::try_from(inner.len())?);
    w.write_bytes(inner.as_slice());
    Ok(w.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swamp_runtime::Runtime;
    use swamp_unpack::{load, UnpackOptions};

    #[test]
    fn synthetic_packages_load() {
        for functions in [1, 300] {
            let bytes = synth_package(functions, 8).unwrap();
            let package = load(&bytes, Runtime::with_defaults(), UnpackOptions::default()).unwrap();
            assert_eq!(package.declarations().count, functions);
            assert_eq!(package.entry_function().map(|f| f.name.as_str()), Some("main"));
        }
    }
}
