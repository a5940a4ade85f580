use thiserror::Error;

use lesdc_sim::{ConfigError, StepError};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("step: {0}")]
    Step(#[from] StepError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("unsupported format '{0}', expected plain|json")]
    UnknownFormat(String),
    #[error("fixture version '{found}' is not supported (expected '{expected}')")]
    FixtureVersion { found: String, expected: String },
}
