use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::patterns::{DEFAULT_WORKERS, MAX_CHUNK_SIZE};

#[derive(Parser, Debug)]
#[command(
    name = "kswc",
    version,
    about = "Kansas workers' compensation appeal decision extraction and chunking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Process(ProcessArgs),
    List(ListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    #[arg(long, short = 'd', default_value = ".")]
    pub directory: PathBuf,

    #[arg(long, short = 'o', default_value = "workers_comp_chunks.jsonl")]
    pub output: PathBuf,

    #[arg(long, short = 'w', default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    #[arg(long, short = 'r', default_value_t = false)]
    pub resume: bool,

    #[arg(long, short = 'p')]
    pub pattern: Option<String>,

    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    #[arg(long, default_value_t = MAX_CHUNK_SIZE)]
    pub max_chunk_size: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long, short = 'd', default_value = ".")]
    pub directory: PathBuf,

    #[arg(long, short = 'p')]
    pub pattern: Option<String>,
}
