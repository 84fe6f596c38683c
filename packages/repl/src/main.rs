use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rowmap_repl::host::terminal::EDIT_MODE_ENV;
use rowmap_repl::{ShellConfig, ShellError};

/// rowmap - interactive shell over row-mapped stores
#[derive(Parser, Debug)]
#[command(name = "rowmap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Store configuration file (JSON); defaults to a scratch store
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force vi editing mode
    #[arg(long)]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long, conflicts_with = "vi")]
    emacs: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<ShellConfig, ShellError> {
    let config = match path {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::scratch(),
    };
    Ok(ShellConfig {
        router: config.router.with_env_overrides(),
        ..config
    })
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.vi {
        std::env::set_var(EDIT_MODE_ENV, "vi");
    } else if args.emacs {
        std::env::set_var(EDIT_MODE_ENV, "emacs");
    }

    let result = load_config(args.config.as_ref()).and_then(|config| rowmap_repl::run(&config));
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
