//! Error types for Scam Guard.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{provider} provider not properly configured")]
    NotConfigured { provider: String },

    #[error("{provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("{provider} API error: {status} {reason}")]
    Http {
        provider: String,
        status: u16,
        reason: String,
    },

    #[error("No response content from {provider} API")]
    EmptyResponse { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the analysis orchestrator before or around a provider call.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Email content is required for analysis")]
    EmptyContent,

    #[error("Email content is too long. Please limit to 10,000 characters.")]
    ContentTooLong { length: usize, max: usize },

    #[error("No AI provider configured")]
    NoProvider,

    #[error("An unexpected error occurred during analysis")]
    Unexpected,
}

/// Account and session errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password must be at least {min} characters long")]
    WeakPassword { min: usize },

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Trusted-contact validation and persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("User ID, name, and relationship are required")]
    MissingFields,

    #[error("Invalid relationship type")]
    InvalidRelationship(String),

    #[error("Either phone number or email must be provided")]
    MissingContactMethod,

    #[error("Trusted contact {0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
