use anyhow::Result;
use clap::{Parser, Subcommand};

mod classifier;
mod cli;
mod config;
mod pipeline;
mod util;
mod validator;

#[derive(Parser)]
#[command(name = "docforge", version)]
#[command(about = "Build a validated documentation corpus from source repositories", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the corpus from configured or auto-detected projects
    Build {
        /// Base path override: resolves relative project paths and replaces
        /// the auto-detection roots
        path: Option<String>,

        /// Path to config file (defaults to ./docforge.toml or ~/.config/docforge/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Output directory override
        #[arg(short = 'o', long)]
        out: Option<String>,

        /// Run the full pipeline without writing any files
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Build {
            path,
            config,
            out,
            dry_run,
        } => {
            let passed = cli::build::run(path, config, out, dry_run).await?;
            if !passed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_build_defaults() {
        let cli = Cli::try_parse_from(["docforge", "build"]).unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Build {
                path,
                config,
                out,
                dry_run,
            } => {
                assert!(path.is_none());
                assert!(config.is_none());
                assert!(out.is_none());
                assert!(!dry_run);
            }
        }
    }

    #[test]
    fn test_parse_build_with_all_args() {
        let cli = Cli::try_parse_from([
            "docforge",
            "build",
            "/srv/repos",
            "--config",
            "custom.toml",
            "-o",
            "out-corpus",
            "--dry-run",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Build {
                path,
                config,
                out,
                dry_run,
            } => {
                assert_eq!(path.unwrap(), "/srv/repos");
                assert_eq!(config.unwrap(), "custom.toml");
                assert_eq!(out.unwrap(), "out-corpus");
                assert!(dry_run);
            }
        }
    }

    #[test]
    fn test_parse_missing_subcommand() {
        let result = Cli::try_parse_from(["docforge"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_unknown_subcommand() {
        let result = Cli::try_parse_from(["docforge", "publish"]);
        assert!(result.is_err());
    }
}
