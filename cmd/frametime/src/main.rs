//! frametime: launch a program with libframetime preloaded
//!
//! ```text
//! frametime [--output PATH] [--no-gpu] [--debug] [--queries N]
//!           [--library PATH] [--log-level LEVEL] -- PROGRAM [ARGS...]
//! ```
//!
//! Translates the flags into `LIBFRAMETIME_*` variables, prepends the shim
//! to `LD_PRELOAD` and replaces itself with PROGRAM.

use std::ffi::CString;
use std::path::PathBuf;

use frametime_core::env::keys;

const LIBRARY_NAME: &str = "libframetime.so";

#[derive(Debug, Default, PartialEq, Eq)]
struct Cfg {
    output: Option<String>,
    no_gpu: bool,
    debug: bool,
    queries: Option<usize>,
    library: Option<PathBuf>,
    log_level: Option<String>,
    program: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Cmd {
    Run(Cfg),
    Help,
}

fn parse_args(args: &[String]) -> Result<Cmd, String> {
    let mut c = Cfg::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => c.output = Some(value(args, &mut i)?.to_string()),
            "--no-gpu" => c.no_gpu = true,
            "--debug" => c.debug = true,
            "-q" | "--queries" => {
                let v = value(args, &mut i)?;
                c.queries = Some(v.parse().map_err(|_| format!("bad --queries value: {}", v))?);
            }
            "--library" => c.library = Some(PathBuf::from(value(args, &mut i)?)),
            "--log-level" => c.log_level = Some(value(args, &mut i)?.to_string()),
            "-h" | "--help" => return Ok(Cmd::Help),
            "--" => {
                c.program = args[i + 1..].to_vec();
                break;
            }
            other if other.starts_with('-') => return Err(format!("unknown option: {}", other)),
            _ => {
                c.program = args[i..].to_vec();
                break;
            }
        }
        i += 1;
    }
    if c.program.is_empty() {
        return Err("missing PROGRAM".to_string());
    }
    Ok(Cmd::Run(c))
}

fn value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str, String> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} needs a value", flag))
}

/// `library` first, then whatever was already preloaded
fn preload_list(library: &str, existing: Option<&str>) -> String {
    match existing {
        Some(rest) if !rest.trim().is_empty() => format!("{} {}", library, rest),
        _ => library.to_string(),
    }
}

/// Default shim location: next to this executable
fn default_library() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(LIBRARY_NAME)))
        .unwrap_or_else(|| PathBuf::from(LIBRARY_NAME))
}

/// Variables to set in the child environment
fn child_env(c: &Cfg, existing_preload: Option<&str>) -> Vec<(&'static str, String)> {
    let library = c.library.clone().unwrap_or_else(default_library);
    let mut vars = vec![(
        "LD_PRELOAD",
        preload_list(&library.to_string_lossy(), existing_preload),
    )];
    if let Some(path) = &c.output {
        vars.push((keys::OUTPUT_FILE, path.clone()));
    }
    if c.no_gpu {
        vars.push((keys::NO_GPU, "1".to_string()));
    }
    if c.debug {
        vars.push((keys::DEBUG, "1".to_string()));
    }
    if let Some(n) = c.queries {
        vars.push((keys::QUERIES, n.to_string()));
    }
    if let Some(level) = &c.log_level {
        vars.push((keys::LOG_LEVEL, level.clone()));
    }
    vars
}

fn eprint_usage() {
    eprintln!("Usage: frametime [OPTIONS] [--] PROGRAM [ARGS...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output PATH      Measurement log (default /tmp/libframetime.out)");
    eprintln!("      --no-gpu           Time frames on the CPU only");
    eprintln!("      --debug            Warn when a GPU query result is late");
    eprintln!("  -q, --queries N        GPU query ring depth (2-64)");
    eprintln!("      --library PATH     Shim to preload (default: next to this binary)");
    eprintln!("      --log-level LEVEL  off, error, warn, info, debug, trace");
    eprintln!("  -h, --help             Show this help");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = match parse_args(&args) {
        Ok(Cmd::Run(cfg)) => cfg,
        Ok(Cmd::Help) => {
            eprint_usage();
            std::process::exit(0);
        }
        Err(msg) => {
            eprintln!("frametime: {}", msg);
            eprint_usage();
            std::process::exit(2);
        }
    };

    let existing = std::env::var("LD_PRELOAD").ok();
    for (key, val) in child_env(&cfg, existing.as_deref()) {
        std::env::set_var(key, val);
    }

    let argv: Vec<CString> = match cfg.program.iter().map(|a| CString::new(a.as_str())).collect() {
        Ok(argv) => argv,
        Err(_) => {
            eprintln!("frametime: argument contains a NUL byte");
            std::process::exit(2);
        }
    };

    // Only returns on failure
    let err = match nix::unistd::execvp(&argv[0], &argv) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    eprintln!("frametime: cannot run {}: {}", cfg.program[0], err);
    std::process::exit(127);
}
