pub mod cli;
pub mod client;
pub mod error;
pub mod links;
pub mod logger;
pub mod models;
pub mod planner;
pub mod poller;
pub mod progress;
pub mod report;
pub mod stage;

pub use client::{JobSession, StatusSource, WorkerClient};
pub use error::WorkerError;
pub use links::LinkCollection;
pub use models::{ArchiveType, CompressionConfig, CompressionLevel, JobStatus, LinkSpec};
pub use planner::{Plan, plan};
pub use poller::{PollOutcome, Poller, ProgressView};
pub use stage::{SlotState, Stage, StageBoard, StageTracker};
