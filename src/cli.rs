use crate::models::{ArchiveType, CompressionConfig, CompressionLevel};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "source-mirror")]
#[command(author, version, long_about = None)]
#[command(about = "Mirror direct download links through a SourceMirror worker")]
pub struct Args {
    /// Worker base URL (required by every command except preview)
    #[arg(short, long, env = "SOURCE_MIRROR_WORKER")]
    pub worker: Option<String>,

    /// HTTP proxy (e.g., http://127.0.0.1:7890)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Status polling interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub poll_interval_ms: u64,

    /// Log level (RUST_LOG is also honoured)
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Worker URL for commands that talk to the worker.
    pub fn require_worker(&self) -> anyhow::Result<&str> {
        self.worker.as_deref().ok_or_else(|| {
            anyhow::anyhow!("A worker URL is required: pass --worker or set SOURCE_MIRROR_WORKER")
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show where every link will land and any conflicting paths
    Preview {
        #[command(flatten)]
        input: LinkInput,
    },
    /// Submit links to the worker and follow the job until it completes
    Submit {
        #[command(flatten)]
        input: LinkInput,

        /// Free-text notes for the whole job
        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// Reopen an existing job for live tracking
    Watch {
        #[arg(long)]
        job_id: String,

        #[arg(long)]
        run_id: String,
    },
    /// List recent jobs
    History,
    /// Run failed files of a finished job again
    Retry {
        #[arg(long)]
        job_id: String,

        #[arg(long)]
        run_id: String,

        /// Original file name to retry (repeatable; default: every failed file)
        #[arg(short = 'f', long = "file")]
        files: Vec<String>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct LinkInput {
    /// Link file path: a .json array, or tab separated columns
    /// url, folder, rename_base, rename_ext, allow_ext, notes
    #[arg(short, long)]
    pub links_file: PathBuf,

    /// Compress files before uploading
    #[arg(long)]
    pub compress: bool,

    /// Compression level
    #[arg(long, value_enum, default_value = "mid")]
    pub level: CompressionLevel,

    /// Archive format
    #[arg(long, value_enum, default_value = "zip")]
    pub archive: ArchiveType,
}

impl LinkInput {
    pub fn compression(&self) -> CompressionConfig {
        CompressionConfig {
            enabled: self.compress,
            level: self.level,
            archive_type: self.archive,
        }
    }
}
