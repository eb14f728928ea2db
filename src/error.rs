//! Error types for the obligo engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::event::EventStatus;

/// Main error type for obligo operations.
#[derive(Error, Debug)]
pub enum ObligoError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Query-parameter and invariant validation errors. Never retried.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("unit id is required for event queries")]
    MissingUnit,

    #[error("date range ends ({end}) before it starts ({start})")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("settlement date {0} present on a non-settled event")]
    UnexpectedSettlementDate(NaiveDate),

    #[error("settled event {0} is missing its settlement date")]
    MissingSettlementDate(String),

    #[error("no active query; call get_events before refetch")]
    NoActiveQuery,
}

/// Persistence-boundary errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("transient backend failure: {0}")]
    Transient(String),

    #[error("event not found: {0}")]
    NotFound(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: EventStatus, to: EventStatus },

    #[error("event {0} is owned by a different unit")]
    UnitMismatch(String),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for obligo operations.
pub type Result<T> = std::result::Result<T, ObligoError>;
