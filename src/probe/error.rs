use std::path::PathBuf;

/// Failures observed while attempting a forbidden action.
///
/// None of these abort a probe run: the caller converts each one into a
/// reported outcome.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{source}")]
    CreationDenied {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{signal}")]
    AbnormalTermination { signal: String },
    #[error("{source}")]
    WriteDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProbeError {
    pub fn creation_denied(command: impl Into<String>, source: std::io::Error) -> Self {
        ProbeError::CreationDenied {
            command: command.into(),
            source,
        }
    }

    pub fn write_denied(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProbeError::WriteDenied {
            path: path.into(),
            source,
        }
    }
}
