//! godl - run a pinned Go release
//!
//! Usage:
//!   go1.24.3 download             Install Go 1.24.3 (godl installed under that name)
//!   go1.24.3 <args...>            Run Go 1.24.3's go command
//!   godl <version> download       Same, naming the version explicitly
//!   godl <version> <args...>

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::ffi::OsString;
use std::path::Path;

/// Name this binary answers to when it is not masquerading as a version.
const SELF_NAME: &str = "godl";

#[derive(Parser)]
#[command(name = SELF_NAME)]
#[command(about = "Download and run a specific Go release")]
#[command(version)]
struct Cli {
    /// Release to use, e.g. go1.24.3
    #[arg(value_name = "VERSION")]
    release: String,

    /// `download`, or arguments passed verbatim to that release's go command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<OsString>,
}

/// Version named by the program name, if this binary was installed or
/// linked under a release name.
fn version_from_program(argv0: &OsString) -> Result<Option<String>> {
    let name = Path::new(argv0)
        .file_name()
        .context("cannot determine program name")?;
    let name = name
        .to_str()
        .with_context(|| format!("program name {:?} is not valid UTF-8", name))?;
    let stem = name
        .strip_suffix(std::env::consts::EXE_SUFFIX)
        .unwrap_or(name);

    if stem == SELF_NAME {
        return Ok(None);
    }
    if stem.is_empty() {
        bail!("empty program name");
    }
    Ok(Some(stem.to_string()))
}

/// Parse `godl <VERSION> [ARGS]...`.
///
/// Once a version is given, only the program name and version go through
/// clap. Everything after it is forwarded as is, `-h` and `--version`
/// included, since those belong to the release's go command.
fn parse_cli(argv: &[OsString]) -> std::result::Result<Cli, clap::Error> {
    match argv.get(1) {
        Some(first) if !first.as_encoded_bytes().starts_with(b"-") => {
            let mut cli = Cli::try_parse_from(&argv[..2])?;
            cli.args = argv[2..].to_vec();
            Ok(cli)
        }
        _ => Cli::try_parse_from(argv),
    }
}

fn main() -> Result<()> {
    let argv: Vec<OsString> = std::env::args_os().collect();
    let argv0 = argv.first().cloned().unwrap_or_else(|| SELF_NAME.into());

    let code = match version_from_program(&argv0)? {
        Some(version) => godl::run(&version, argv.get(1..).unwrap_or_default()),
        None => {
            let cli = parse_cli(&argv).unwrap_or_else(|e| e.exit());
            godl::run(&cli.release, &cli.args)
        }
    };

    std::process::exit(code);
}
