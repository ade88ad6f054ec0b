//! `swamp-run` — loads a Swamp package and reports its entry point
//!
//! Only argument parsing and process setup (logger, color) live here; the
//! work is delegated to `swamp_cli` (lib).

#![forbid(unsafe_code)]

use std::{io, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};

use swamp_cli as cli;

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "swamp-run", version, about = "Load a Swamp package (.spk) and resolve its entry point", long_about = None)]
struct Opt {
    /// Package file
    #[arg(value_name = "PACK")]
    pack: PathBuf,

    /// More output (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// List the constant table; unbound externals are tolerated
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Print a JSON summary instead of the text listing
    #[arg(long)]
    json: bool,

    /// Report load time
    #[arg(long)]
    time: bool,

    /// Colored status lines (when built with the `color` feature)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

// ──────────────────────────── Logger / verbosity ────────────────────────────

fn init_telemetry(verbose: u8, quiet: bool) {
    #[cfg(feature = "trace")]
    {
        let level = if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        };
        std::env::set_var("RUST_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()));
        cli::init_logger();
    }
    #[cfg(not(feature = "trace"))]
    {
        let _ = (verbose, quiet);
    }
}

fn init_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Auto => {}
        ColorChoice::Always => {
            std::env::set_var("CLICOLOR_FORCE", "1");
            std::env::remove_var("NO_COLOR");
        }
        ColorChoice::Never => {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("CLICOLOR_FORCE");
        }
    }
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    match real_main() {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn real_main() -> Result<i32> {
    let opt = Opt::parse();

    init_color(opt.color);
    init_telemetry(opt.verbose, opt.quiet);

    let listing = match (opt.json, opt.list) {
        (true, _) => cli::Listing::Json,
        (false, true) => cli::Listing::Text,
        (false, false) => cli::Listing::None,
    };
    let task = cli::RunTask { input: opt.pack, lenient: opt.list || opt.json, listing, time: opt.time };

    let mut stdout = io::stdout().lock();
    cli::execute(&task, &mut stdout).context("swamp-run failed")
}
