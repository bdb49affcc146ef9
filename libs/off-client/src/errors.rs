use crate::ConfigError;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum OffError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<ValidationErrors> for OffError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("missing {}", field),
                })
            })
            .collect();
        messages.sort();
        messages.dedup();
        OffError::Validation(messages.join(", "))
    }
}

impl OffError {
    /// Short message suitable for showing to the person who triggered the action.
    pub fn user_message(&self) -> String {
        match self {
            OffError::Validation(msg) => msg.clone(),
            OffError::NotFound(_) => "Product not found or error.".to_string(),
            OffError::Search(_) => "Search failed.".to_string(),
            OffError::Submission(_) => "Submission failed.".to_string(),
            OffError::Config(_) | OffError::Client(_) => "Internal configuration error".to_string(),
        }
    }
}

pub type Result<T, E = OffError> = std::result::Result<T, E>;
