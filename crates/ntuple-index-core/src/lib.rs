pub mod config;
pub mod convention;
pub mod engine;
pub mod error;
pub mod legacy;
pub mod probe;
pub mod progress;
pub mod provenance;
pub mod report;
pub mod rows;
pub mod scanner;
pub mod sizes;
pub mod storage;
pub mod user_dirs;

pub use config::AppConfig;
pub use engine::{IndexEngine, IndexResult};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use provenance::{GitProvenance, ProvenanceProvider, StaticProvenance};
