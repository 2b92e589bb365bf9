use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress a raw file of little-endian symbols
    Compress {
        /// JSON encoding configuration file path
        #[clap(short, long, value_parser)]
        config: PathBuf,

        /// Input file path
        #[clap(value_parser)]
        input: PathBuf,

        /// Output file path
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },
    /// Decompress a file produced by `compress`
    Decompress {
        /// JSON encoding configuration file path; must be identical to
        /// the one used for compression
        #[clap(short, long, value_parser)]
        config: PathBuf,

        /// Input file path
        #[clap(value_parser)]
        input: PathBuf,

        /// Output file path
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },
    /// Print a template encoding configuration as JSON
    ShowConfig {
        /// Word size of the symbols to compress, in bytes
        #[clap(default_value_t = 1, long, value_parser)]
        word_size: u8,
    },
}
