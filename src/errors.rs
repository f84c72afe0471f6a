use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrystalPathError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Chart derivation failed: {0}")]
    ChartDerivation(String),

    #[error("Narrative service error: {0}")]
    NarrativeService(String),

    #[error("Insufficient prediction credits")]
    InsufficientCredits,

    #[error("User not found: id {0}")]
    UserNotFound(i64),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CrystalPathError>;
