use crate::error::*;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Extraction(e) => {
                error!("Extraction error details: {:?}", e);
            }
            CoreError::Classification(e) => {
                error!("Classification error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Extraction(e) => e.user_friendly_message(),
            CoreError::Classification(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Io(e) => format!("File error: {}", e),
            CoreError::Serialization(_) => {
                "Could not encode the data. Please try again.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Extraction(_) => "EXTRACTION".to_string(),
            CoreError::Classification(_) => "CLASSIFICATION".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
        }
    }
}

impl ErrorExt for ExtractionError {
    fn log_error(&self) -> &Self {
        error!("ExtractionError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ExtractionError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ExtractionError::NoTarget { .. } => {
                "Could not extract comments: no active page.".to_string()
            }
            ExtractionError::Failed { reason } => {
                format!("Could not extract comments: {}", reason)
            }
            ExtractionError::Timeout { after } => format!(
                "Could not extract comments: the page did not answer within {:?}.",
                after
            ),
            ExtractionError::InvalidSelector { selector } => format!(
                "Invalid comment selector '{}'. Please check your preferences.",
                selector
            ),
            ExtractionError::PageLoad { location, .. } => {
                format!("Could not load the page at {}.", location)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ExtractionError::NoTarget { .. } => "EXTRACTION_NO_TARGET".to_string(),
            ExtractionError::Failed { .. } => "EXTRACTION_FAILED".to_string(),
            ExtractionError::Timeout { .. } => "EXTRACTION_TIMEOUT".to_string(),
            ExtractionError::InvalidSelector { .. } => "EXTRACTION_INVALID_SELECTOR".to_string(),
            ExtractionError::PageLoad { .. } => "EXTRACTION_PAGE_LOAD".to_string(),
        }
    }
}

impl ErrorExt for ClassificationError {
    fn log_error(&self) -> &Self {
        error!("ClassificationError: {:?}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ClassificationError (warning): {:?}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        format!("API error: {}", self.message())
    }

    fn error_code(&self) -> String {
        match self {
            ClassificationError::Transport { .. } => "CLASSIFICATION_TRANSPORT".to_string(),
            ClassificationError::Status { .. } => "CLASSIFICATION_STATUS".to_string(),
            ClassificationError::InvalidResponse { .. } => {
                "CLASSIFICATION_INVALID_RESPONSE".to_string()
            }
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::MissingField { field } if field == "api_url" => {
                "Set API URL first".to_string()
            }
            ConfigError::MissingField { field } => {
                format!("Required setting '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("Invalid value '{}' for setting '{}'.", value, field)
            }
            ConfigError::NoConfigDir => {
                "Preferences cannot be stored on this system.".to_string()
            }
            ConfigError::Parse(_) => {
                "Preferences file is malformed. Please fix or delete it.".to_string()
            }
            ConfigError::Serialize(_) | ConfigError::Io { .. } => {
                "Preferences could not be saved.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::NoConfigDir => "CONFIG_NO_DIR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
            ConfigError::Serialize(_) => "CONFIG_SERIALIZE_ERROR".to_string(),
            ConfigError::Io { .. } => "CONFIG_IO_ERROR".to_string(),
        }
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    /// Log the error and return the status line to show the user.
    pub fn report_error(&self, error: &CoreError) -> String {
        let message = error.user_friendly_message();
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", message);
        }
        message
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
