//! Textual and structured views of a loaded package, for inspection tools.

use std::fmt::Write;

use swamp_runtime::{Value, ValueRef};

use crate::{Package, Section};

/// Multi-line listing: constants, resources, function bodies and entry.
pub fn render(package: &Package, title: &str) -> String {
    let table = package.constants();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== {title} == (constants={}, functions={}, resources={}, type_info={} bytes)",
        table.len(),
        package.declarations().count,
        table.resource_names().len(),
        package.type_info().raw().len()
    );

    if !table.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, ";; constants");
        for (idx, r) in table.iter() {
            let _ = writeln!(out, "const[{idx:04}] = {}", show_constant(package, idx, r));
        }
    }

    if !table.resource_names().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, ";; resources");
        for (i, name) in table.resource_names().iter().enumerate() {
            let _ = writeln!(out, "res[{i:04}] = {name:?}");
        }
    }

    for (r, f) in package.functions() {
        let Some(body) = f.body() else { continue };
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            ";; fn {} (params={} vars={} temps={})",
            f.name, body.param_count, body.variable_count, body.temp_count
        );
        for (k, c) in body.constants.iter().enumerate() {
            let _ = writeln!(out, "  k{k} -> {}", show_ref(package, *c));
        }
        let _ = writeln!(out, "  code {}", hex(&body.opcodes));
        if Some(r) == package.entry() {
            let _ = writeln!(out, "  ;; entry point");
        }
    }

    let _ = writeln!(out);
    match package.entry_function() {
        Some(f) => {
            let _ = writeln!(out, ";; entry: {}", f.name);
        }
        None => {
            let _ = writeln!(out, ";; entry: none");
        }
    }
    out
}

fn show_constant(package: &Package, idx: usize, r: ValueRef) -> String {
    let Some(value) = package.value(r) else { return format!("<dangling #{}>", r.raw()) };
    match (package.constants().section_of(idx), value) {
        (Some(Section::ResourceNames), Value::Integer(h)) => {
            let name = usize::try_from(*h).ok().and_then(|h| package.resource_name(h)).unwrap_or("?");
            format!("resource {h} {name:?}")
        }
        _ => show_value(package, value),
    }
}

fn show_ref(package: &Package, r: ValueRef) -> String {
    package.value(r).map_or_else(|| format!("<dangling #{}>", r.raw()), |v| show_value(package, v))
}

fn show_value(package: &Package, value: &Value) -> String {
    let types = package.type_info();
    match value {
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::String(s) if s.chars().count() > 64 => {
            let head: String = s.chars().take(64).collect();
            format!("{head:?}…")
        }
        Value::String(s) => format!("{s:?}"),
        Value::ExternalFunction(e) => format!(
            "external {}/{} : {} ({})",
            e.name,
            e.param_count,
            types.describe_or_unknown(e.type_index),
            if e.is_bound() { "bound" } else { "unbound" }
        ),
        Value::Function(f) => match f.body() {
            Some(b) => format!(
                "fn {}/{} : {} (defined, {} consts, {} opcodes)",
                f.name,
                f.declared_params,
                types.describe_or_unknown(f.type_index),
                b.constants.len(),
                b.opcodes.len()
            ),
            None => format!("fn {}/{} : {} (declared)", f.name, f.declared_params, types.describe_or_unknown(f.type_index)),
        },
    }
}

fn hex(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "(empty)".into();
    }
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        let _ = write!(s, "{b:02X}");
    }
    s
}

/* ─────────────────────────── Summary ─────────────────────────── */

/// Per-kind counts of a package, serializable for `--json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PackageSummary {
    /// Constant-table entries.
    pub constants: usize,
    /// External functions.
    pub externals: usize,
    /// Externals the host did not provide.
    pub unbound_externals: usize,
    /// Declared functions.
    pub functions: usize,
    /// Functions with a body.
    pub defined_functions: usize,
    /// Boolean literals.
    pub booleans: usize,
    /// Integer literals, resource handles excluded.
    pub integers: usize,
    /// String literals.
    pub strings: usize,
    /// Resource names.
    pub resources: Vec<String>,
    /// Entry-point name, if any.
    pub entry: Option<String>,
    /// Size of the type-information chunk.
    pub type_info_bytes: usize,
}

impl PackageSummary {
    /// Counts everything in `package`.
    pub fn of(package: &Package) -> Self {
        let table = package.constants();
        let mut s = Self {
            constants: table.len(),
            resources: table.resource_names().to_vec(),
            entry: package.entry_function().map(|f| f.name.clone()),
            type_info_bytes: package.type_info().raw().len(),
            ..Self::default()
        };

        for (idx, r) in table.iter() {
            match (table.section_of(idx), package.value(r)) {
                (_, Some(Value::ExternalFunction(e))) => {
                    s.externals += 1;
                    if !e.is_bound() {
                        s.unbound_externals += 1;
                    }
                }
                (_, Some(Value::Function(f))) => {
                    s.functions += 1;
                    if f.is_defined() {
                        s.defined_functions += 1;
                    }
                }
                (_, Some(Value::Boolean(_))) => s.booleans += 1,
                (Some(Section::ResourceNames), Some(Value::Integer(_))) => {}
                (_, Some(Value::Integer(_))) => s.integers += 1,
                (_, Some(Value::String(_))) => s.strings += 1,
                (_, None) => {}
            }
        }
        s
    }
}
