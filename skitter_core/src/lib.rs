pub mod archive;
pub mod campaign;
pub mod config;
pub mod corpus;
pub mod input;
pub mod mutator;
pub mod runner;

pub use archive::{ArchiveError, CrashArchive};
pub use campaign::{CampaignStats, FuzzCampaign};
pub use config::SkitterConfig;
pub use corpus::{CorpusError, CorpusStore};
pub use input::Input;
pub use mutator::{Mutator, RandomByteMutator};
pub use runner::{ExecutionResult, RunnerError, TargetRunner};
