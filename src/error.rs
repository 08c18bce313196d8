use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateBindError {
    #[error("Failed to parse template document: {0}")]
    TemplateParse(String),

    #[error("Invalid mapping for worksheet '{sheet}': {details}")]
    ValidationError { sheet: String, details: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "mistral")]
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[cfg(feature = "mistral")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, TemplateBindError>;
