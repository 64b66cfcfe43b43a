//! Rewrite web-font links across a static-site build output directory.
//!
//! Usage:
//!   webfont-trim <DIST_DIR> [--max-unique-chars N] [--font-href-pattern S] [--text-param S]
//!
//! Logging goes through `env_logger`; the default level is `info` and
//! `RUST_LOG` overrides it.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use webfont_trim::{discover_routes, process_routes, TrimOptions};

#[derive(Debug)]
struct Args {
    dist_dir: PathBuf,
    options: TrimOptions,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    let routes = discover_routes(&cli.dist_dir)
        .map_err(|e| format!("cannot read {}: {}", cli.dist_dir.display(), e))?;
    let report = process_routes(&routes, &cli.options);
    println!("webfont-trim {}: {}", cli.dist_dir.display(), report);
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }

    let dist_dir = match args.get(1) {
        Some(v) if !v.starts_with("--") => PathBuf::from(v),
        _ => return Err("missing build output directory".to_string()),
    };

    let mut cfg = Args {
        dist_dir,
        options: TrimOptions::default(),
    };

    let mut i = 2usize;
    while i < args.len() {
        match args[i].as_str() {
            "--max-unique-chars" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--max-unique-chars requires a value".to_string())?;
                let max = v
                    .parse::<usize>()
                    .map_err(|_| format!("invalid --max-unique-chars value '{}'", v))?;
                cfg.options = cfg.options.with_max_unique_chars(max);
                i += 2;
            }
            "--font-href-pattern" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--font-href-pattern requires a value".to_string())?;
                if v.trim().is_empty() {
                    return Err("--font-href-pattern must not be empty".to_string());
                }
                cfg.options = cfg.options.with_font_href_pattern(v.clone());
                i += 2;
            }
            "--text-param" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--text-param requires a value".to_string())?;
                if v.trim().is_empty() {
                    return Err("--text-param must not be empty".to_string());
                }
                cfg.options = cfg.options.with_text_param(v.clone());
                i += 2;
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    Ok(cfg)
}

fn help_text() -> &'static str {
    "usage: webfont-trim <DIST_DIR> [--max-unique-chars N] [--font-href-pattern S] [--text-param S]

Rewrites the web-font stylesheet link of every .html file under DIST_DIR so the
font host serves only the glyphs that page uses.

options:
  --max-unique-chars N     skip pages using more than N unique characters (default 1000)
  --font-href-pattern S    href substring identifying the font stylesheet link
                           (default https://fonts.googleapis.com/css2?family=)
  --text-param S           character filter query parameter (default text)"
}
