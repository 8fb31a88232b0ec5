//! The thin CLI front-end: argument parsing, file I/O, and pretty
//! printing, none of which the parsing engine touches directly.
//!
//! Hand-rolled `std::env::args()` parsing (no argument-parsing crate) and
//! `stderrlog`-backed `log` output wired up from a verbosity count.

use std::env;
use std::fs;
use std::process;

use macho_report::{parse_with, ParseOptions, Report};

struct Options {
    path: String,
    first_only: bool,
    show_strings: bool,
    show_symbols: bool,
    strict_entitlements: bool,
    verbosity: usize,
}

fn usage() -> ! {
    eprintln!("usage: macho-report <path> [--first-only] [--strings] [--symbols] [--strict-entitlements] [-v...]");
    process::exit(1);
}

fn parse_args() -> Options {
    let mut path = None;
    let mut first_only = false;
    let mut show_strings = false;
    let mut show_symbols = false;
    let mut strict_entitlements = false;
    let mut verbosity = 0;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--first-only" => first_only = true,
            "--strings" => show_strings = true,
            "--symbols" => show_symbols = true,
            "--strict-entitlements" => strict_entitlements = true,
            "-v" => verbosity += 1,
            "-vv" => verbosity += 2,
            other if !other.starts_with('-') && path.is_none() => path = Some(other.to_string()),
            _ => usage(),
        }
    }

    let Some(path) = path else { usage() };

    Options {
        path,
        first_only,
        show_strings,
        show_symbols,
        strict_entitlements,
        verbosity,
    }
}

fn main() {
    let opts = parse_args();

    stderrlog::new()
        .verbosity(opts.verbosity + 1)
        .init()
        .expect("logger already initialized");

    let bytes = match fs::read(&opts.path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("macho-report: {}: {e}", opts.path);
            process::exit(1);
        }
    };

    let parse_options = if opts.strict_entitlements {
        ParseOptions::strict_entitlements()
    } else {
        ParseOptions::default()
    };

    let report = match parse_with(&bytes, parse_options) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("macho-report: {}: {e}", opts.path);
            process::exit(1);
        }
    };

    print_report(&report, &opts);
}

fn print_report(report: &Report, opts: &Options) {
    println!("fat: {}", report.is_fat);
    println!("arches: {}", report.arches.len());

    for (err_index, message) in &report.slice_errors {
        println!("slice {err_index}: skipped ({message})");
    }

    let arches: Box<dyn Iterator<Item = (usize, &macho_report::ArchReport)>> = if opts.first_only {
        Box::new(report.arches.iter().enumerate().take(1))
    } else {
        Box::new(report.arches.iter().enumerate())
    };

    for (i, arch) in arches {
        println!("--- arch {i}: {} ---", arch.architecture);
        println!("  filetype: {:?}", arch.filetype);
        println!(
            "  flags: no_undefined_refs={} dyld_compatible={} defines_weak_symbols={} uses_weak_symbols={} allows_stack_execution={} enforce_no_heap_exec={}",
            arch.flags.no_undefined_refs,
            arch.flags.dyld_compatible,
            arch.flags.defines_weak_symbols,
            arch.flags.uses_weak_symbols,
            arch.flags.allows_stack_execution,
            arch.flags.enforce_no_heap_exec,
        );

        println!("  dylibs ({}):", arch.dylibs.len());
        for dylib in &arch.dylibs {
            let truncated = if dylib.is_truncated { " (truncated)" } else { "" };
            println!("    {} ({}){truncated}", dylib.path, dylib.version);
        }

        if let Some(security) = &arch.security {
            println!(
                "  signed: hardened_runtime={} library_validation_disabled={} dylib_env_var_allowed={}",
                security.has_hardened_runtime,
                security.is_library_validation_disabled,
                security.is_dylib_env_var_allowed,
            );
        } else {
            println!("  signed: false");
        }

        if opts.show_strings {
            println!("  strings ({}):", arch.strings.len());
            for s in &arch.strings {
                println!(
                    "    [{}:{} @ {:#x}] {:?}",
                    s.original_segment,
                    s.original_section,
                    s.original_offset,
                    String::from_utf8_lossy(&s.content)
                );
            }
        }

        if opts.show_symbols {
            println!("  symbols ({}, capped to 20):", arch.symbols.len());
            for symbol in arch.symbols.iter().take(20) {
                println!("    {:?} {}", symbol.classification, symbol.name);
            }
        }

        if !arch.warnings.is_empty() {
            println!("  warnings ({}):", arch.warnings.len());
            for warning in &arch.warnings {
                println!("    {warning}");
            }
        }
    }
}
