//! swamp-cli — library side of the `swamp-run` binary
//!
//! Argument parsing stays in `main.rs`; this crate loads the package,
//! reports what it found and writes listings to a caller-supplied writer,
//! so everything here is testable without spawning a process.
//!
//! - Logs (`feature = "trace"`) and colored status lines (`feature = "color"`)
//! - JSON summary (`feature = "json"`)

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use log::{info, warn};
use swamp_runtime::Runtime;
use swamp_unpack::{listing, load_file, Package, UnpackOptions};

#[cfg(feature = "color")]
use owo_colors::OwoColorize;

// ───────────────────────────── Public types ─────────────────────────────

/// What to print after a successful load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Listing {
    /// Entry point only.
    #[default]
    None,
    /// Constant table, resources and bodies as text.
    Text,
    /// [`swamp_unpack::PackageSummary`] as pretty JSON.
    Json,
}

/// One `swamp-run` invocation.
#[derive(Clone, Debug, Default)]
pub struct RunTask {
    /// Package file.
    pub input: PathBuf,
    /// Accept externals the host does not provide.
    pub lenient: bool,
    /// Extra output.
    pub listing: Listing,
    /// Report load time.
    pub time: bool,
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Installs `env_logger` when the `trace` feature is on.
pub fn init_logger() {
    #[cfg(feature = "trace")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .try_init();
    }
}

// ───────────────────────────── Execution ─────────────────────────────

/// Loads `task.input` and reports on `out`. Returns the process exit code.
pub fn execute<W: Write>(task: &RunTask, out: &mut W) -> Result<i32> {
    info!("swamp-run {}", env!("CARGO_PKG_VERSION"));

    let options = UnpackOptions::new().lenient(task.lenient);
    let start = Instant::now();
    let package = load_file(&task.input, Runtime::with_defaults(), options)
        .with_context(|| format!("loading {}", display(&task.input)))?;
    let elapsed = start.elapsed();

    match package.entry_function() {
        Some(main) => {
            let opcodes = main.body().map_or(0, |b| b.opcodes.len());
            info!("entry point: {} ({opcodes} opcodes)", main.name);
            status_ok("ENTRY", &main.name);
        }
        None => warn!("couldn't find any entry-point"),
    }

    match task.listing {
        Listing::None => {}
        Listing::Text => out.write_all(listing::render(&package, &title(&task.input)).as_bytes())?,
        Listing::Json => write_json(&package, out)?,
    }

    if task.time {
        status_info("TIME", &format!("load: {} µs", elapsed.as_micros()));
    }

    writeln!(out, "done.")?;
    Ok(0)
}

fn write_json<W: Write>(package: &Package, out: &mut W) -> Result<()> {
    #[cfg(feature = "json")]
    {
        let summary = swamp_unpack::PackageSummary::of(package);
        writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        Ok(())
    }

    #[cfg(not(feature = "json"))]
    {
        let _ = (package, out);
        Err(anyhow::anyhow!("`--json` unavailable: rebuild `swamp-cli` with the `json` feature"))
    }
}

fn title(path: &Path) -> String {
    path.file_name().map_or_else(|| display(path), |n| n.to_string_lossy().into_owned())
}

fn display(p: &Path) -> String { p.to_string_lossy().to_string() }

// ───────────────────────────── Status lines ─────────────────────────────

fn status_ok(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.green().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

fn status_info(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.blue().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

// ───────────────────────────── Tests ─────────────────────────────
