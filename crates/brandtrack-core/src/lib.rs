//! Shared domain types, configuration, and text matching for the brandtrack
//! workspace.

pub mod app_config;
pub mod config;
pub mod text;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{
    Engagement, MentionKind, Platform, RawMention, SentimentJudgment, SentimentLabel,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid platform: {0}")]
    InvalidPlatform(String),
    #[error("invalid sentiment label: {0}")]
    InvalidSentimentLabel(String),
    #[error("invalid mention kind: {0}")]
    InvalidMentionKind(String),
}
