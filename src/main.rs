//! termfiles - open macro, script and session files
//!
//! # Quick Start
//!
//! ```text
//! termfiles work.macros          # Install macros from a .macros file
//! termfiles build.session        # Start the session's command
//! termfiles ./deploy.sh          # Run a script as a session
//! termfiles -n *.macros          # Show what would be done
//! ```

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use termfiles::config::{self, Config as FileConfig};
use termfiles::host::{DryRunHost, MacroStore, ProcessHost, SessionLauncher};
use termfiles::{FileOpener, KeyPolicy, Opened};

/// Command line options
#[derive(Debug, Default)]
struct Args {
    /// Files to open, in order
    files: Vec<PathBuf>,
    /// Print host calls instead of performing them
    dry_run: bool,
    /// Override the configured key policy with `skip`
    skip_invalid: bool,
    /// Explicit config file
    config_path: Option<PathBuf>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("termfiles {}", VERSION);
}

fn print_help() {
    eprintln!("termfiles {} - Open macro, script and session files", VERSION);
    eprintln!();
    eprintln!("Usage: termfiles [OPTIONS] <FILE>...");
    eprintln!();
    eprintln!("File types (by extension):");
    eprintln!("  .macros               Replace the active macro set");
    eprintln!("  .session              Start the session's \"command\"");
    eprintln!("  (other)               Run the file as a session");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -n, --dry-run         Print host calls instead of performing them");
    eprintln!("  -s, --skip-invalid    Skip macro keys that do not decode");
    eprintln!("  -c, --config <PATH>   Use a specific config file");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Configuration: ~/.termfiles/config.toml");
    eprintln!("Log file:      ~/.termfiles/termfiles.log");
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-n" | "--dry-run" => {
                parsed.dry_run = true;
            }
            "-s" | "--skip-invalid" => {
                parsed.skip_invalid = true;
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config path".to_string());
                }
                parsed.config_path = Some(PathBuf::from(&args[i]));
            }
            "--" => {
                parsed.files.extend(args[i + 1..].iter().map(PathBuf::from));
                break;
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
            file => {
                parsed.files.push(PathBuf::from(file));
            }
        }
        i += 1;
    }

    if parsed.files.is_empty() {
        return Err("No files given".to_string());
    }

    Ok(parsed)
}

fn init_logging(level: &str) {
    let log_path = config::app_dir()
        .map(|dir| dir.join("termfiles.log"))
        .unwrap_or_else(|| PathBuf::from("termfiles.log"));

    // Open log file (append mode)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Open every file, reporting failures on stderr. Returns the failure count.
fn open_all<H>(opener: &FileOpener, files: &[PathBuf], host: &mut H) -> usize
where
    H: MacroStore + SessionLauncher,
{
    let mut failures = 0;
    for path in files {
        match opener.open(path, host) {
            Ok(Opened::Macros(set)) => {
                eprintln!("{}: {} macros installed", path.display(), set.len());
            }
            Ok(Opened::Session(session)) => {
                eprintln!("{}: started {:?}", path.display(), session.command);
            }
            Ok(Opened::Script(_)) => {
                eprintln!("{}: started script", path.display());
            }
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                failures += 1;
            }
        }
    }
    failures
}

fn main() -> anyhow::Result<ExitCode> {
    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            return Ok(ExitCode::from(2));
        }
    };

    let mut file_config = match &args.config_path {
        Some(path) => FileConfig::load_from(path)?,
        None => FileConfig::load(),
    };
    if args.skip_invalid {
        file_config.macros.key_policy = KeyPolicy::Skip;
    }

    init_logging(&file_config.log_level);
    info!("termfiles {} opening {} files", VERSION, args.files.len());

    let opener = file_config.opener();
    let failures = if args.dry_run {
        let mut host = DryRunHost::new(io::stdout().lock());
        open_all(&opener, &args.files, &mut host)
    } else {
        let mut host = ProcessHost::new();
        let failures = open_all(&opener, &args.files, &mut host);
        if let Some(set) = host.macros.current() {
            for slot in set.iter() {
                println!("{:>3}  {:<12} {}", slot.index, slot.name, slot.contents);
            }
        }
        failures
    };

    info!("Done, {} failures", failures);
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("termfiles")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_files_and_flags() {
        let args = parse_args(&argv(&["-n", "a.macros", "--skip-invalid", "b.session"])).unwrap();
        assert!(args.dry_run);
        assert!(args.skip_invalid);
        assert_eq!(
            args.files,
            vec![PathBuf::from("a.macros"), PathBuf::from("b.session")]
        );
    }

    #[test]
    fn test_parse_config_path() {
        let args = parse_args(&argv(&["-c", "/tmp/c.toml", "x.sh"])).unwrap();
        assert_eq!(args.config_path, Some(PathBuf::from("/tmp/c.toml")));
        assert!(parse_args(&argv(&["x.sh", "--config"])).is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&argv(&[])).is_err());
        assert!(parse_args(&argv(&["--bogus", "a.macros"])).is_err());
    }

    #[test]
    fn test_double_dash() {
        let args = parse_args(&argv(&["--", "-odd.sh"])).unwrap();
        assert_eq!(args.files, vec![PathBuf::from("-odd.sh")]);
    }
}
