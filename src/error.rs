/// Error types for loading, slicing and exporting
///
/// Errors stay typed inside the crate. They are flattened to strings only when
/// they cross into an iced `Message`, since messages must be `Clone`.

/// Everything that can go wrong while the user drives the slicer
#[derive(Debug, thiserror::Error)]
pub enum SlicerError {
    /// The chosen file does not look like a raster image
    #[error("{name} is not an image file ({mime})")]
    UnsupportedFileType { name: String, mime: String },

    /// An action needed a loaded image but there is none
    #[error("no image loaded")]
    NoImage,

    /// A slice pass is still running
    #[error("a slice pass is already running")]
    Busy,

    /// The image crate could not decode the upload
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// A tile could not be encoded
    #[error("failed to encode {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    /// The zip writer failed
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Filesystem error while reading the upload or writing the bundle
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking task panicked or was cancelled
    #[error("task join error: {0}")]
    Task(String),

    /// Settings file could not be parsed
    #[error("config error: {0}")]
    Config(String),
}

impl From<tokio::task::JoinError> for SlicerError {
    fn from(err: tokio::task::JoinError) -> Self {
        SlicerError::Task(err.to_string())
    }
}

/// Convenience result type
pub type Result<T> = std::result::Result<T, SlicerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_file_message_names_file() {
        let err = SlicerError::UnsupportedFileType {
            name: "notes.txt".into(),
            mime: "text/plain".into(),
        };
        assert_eq!(err.to_string(), "notes.txt is not an image file (text/plain)");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SlicerError = io.into();
        assert!(matches!(err, SlicerError::Io(_)));
    }
}
