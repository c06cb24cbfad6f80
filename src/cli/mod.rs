use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON config file (temp_root, output_dir, compression_level).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List the samples in a directory or a ZIP archive.
    #[command(alias = "l")]
    List {
        /// A directory on disk, or a `.zip` archive.
        #[arg(required = true)]
        path: PathBuf,
    },

    /// Export a pack manifest to a ZIP archive.
    #[command(alias = "x")]
    Export {
        /// Pack manifest (JSON) describing the folders and items.
        #[arg(short, long)]
        manifest: PathBuf,

        /// Output archive. Defaults to `<pack name>.zip` in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge several pack archives into one, each under a folder named after it.
    #[command(alias = "c")]
    Combine {
        /// Archives to merge.
        #[arg(required = true)]
        archives: Vec<PathBuf>,

        /// Directory for the combined archive. Overrides the configured output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

/// Parses command-line arguments using `clap`. Usage errors and `--help` exit the process.
pub fn run() -> Result<Args, Box<dyn std::error::Error>> {
    Ok(Args::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let args = Args::try_parse_from(["samplepack", "combine", "a.zip", "b.zip", "-vv", "--config", "c.json"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config, Some(PathBuf::from("c.json")));
        match args.command {
            Commands::Combine { archives, output_dir } => {
                assert_eq!(archives.len(), 2);
                assert!(output_dir.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn export_requires_manifest() {
        assert!(Args::try_parse_from(["samplepack", "export"]).is_err());
    }
}
