use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode JPEG at quality {quality}: {source}")]
    Encode {
        quality: u8,
        #[source]
        source: image::ImageError,
    },

    #[error("Could not read source directory {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not create output directory {}: {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Unexpected failure: {0}")]
    Unexpected(String),

    /// A task failed and the file it had started writing could not be removed.
    #[error("{error} (partial output {} left behind: {cleanup})", path.display())]
    PartialOutput {
        path: PathBuf,
        #[source]
        error: Box<ConvertError>,
        cleanup: std::io::Error,
    },
}

impl ConvertError {
    /// Errors that abort the whole batch rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::Discovery { .. }
                | ConvertError::OutputDirectory { .. }
                | ConvertError::InvalidLimit(_)
        )
    }

    /// True when the underlying cause is a permission problem.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            ConvertError::Io(e)
            | ConvertError::Discovery { source: e, .. }
            | ConvertError::OutputDirectory { source: e, .. } => {
                e.kind() == std::io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_fatal_classification() {
        let discovery = ConvertError::Discovery {
            path: PathBuf::from("/nope"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(discovery.is_fatal());

        let decode = ConvertError::Decode {
            path: PathBuf::from("broken.jpg"),
            source: image::ImageError::IoError(io::Error::new(io::ErrorKind::Other, "bad")),
        };
        assert!(!decode.is_fatal());
        assert!(!ConvertError::Unexpected("boom".to_string()).is_fatal());
    }

    #[test]
    fn test_permission_denied_detection() {
        let err = ConvertError::OutputDirectory {
            path: PathBuf::from("/root/out"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_permission_denied());
        assert!(!ConvertError::InvalidLimit("0MB".to_string()).is_permission_denied());
    }

    #[test]
    fn test_partial_output_keeps_original_error() {
        let err = ConvertError::PartialOutput {
            path: PathBuf::from("/out/photo.jpg"),
            error: Box::new(ConvertError::Unexpected("encoder died".to_string())),
            cleanup: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        };

        let message = err.to_string();
        assert!(message.starts_with("Unexpected failure: encoder died"));
        assert!(message.contains("/out/photo.jpg"));
        assert!(message.ends_with("read-only)"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_decode_message_names_file() {
        let err = ConvertError::Decode {
            path: PathBuf::from("photo.cr2"),
            source: image::ImageError::IoError(io::Error::new(io::ErrorKind::Other, "bad")),
        };
        assert!(err.to_string().contains("photo.cr2"));
    }
}
