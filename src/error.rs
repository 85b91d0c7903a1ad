use thiserror::Error;

#[derive(Debug, Error)]
pub enum FillError {
    /// Node.js bridge failed to spawn (ax_server.js)
    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    SubprocessSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the bridge pipes failed
    #[error("Browser session I/O: {0}")]
    SessionIO(String),

    /// Bridge answered with ok=false or an unexpected payload
    #[error("Browser command '{command}' failed: {error}")]
    SessionProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("YAML error ({context}): {source}")]
    Yaml {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Answer backend could not be reached or replied with garbage
    #[error("Answer backend request failed: {0}")]
    Backend(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A scripted or in-memory surface refused an operation
    #[error("Browser operation '{operation}' unavailable: {reason}")]
    Unsupported { operation: String, reason: String },

    /// Input document (fields, answers, profile) is structurally wrong
    #[error("Invalid document {path}: {reason}")]
    InvalidDocument { path: String, reason: String },
}

impl FillError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        FillError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn yaml(context: impl Into<String>, source: serde_yaml::Error) -> Self {
        FillError::Yaml {
            context: context.into(),
            source,
        }
    }

    pub fn unsupported(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        FillError::Unsupported {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
