//! Error types for synthesis operations

use std::fmt;
use std::path::PathBuf;

/// Main error type for all synthesis operations
#[derive(Debug)]
pub enum SynthesisError {
    /// No usable GPU compute capability
    ///
    /// Synthesis cannot proceed. There is no silent fallback: callers that
    /// want the reference device must inject it explicitly.
    UnsupportedBackend {
        /// Why the backend could not be acquired
        reason: String,
    },

    /// Dimensions or border parameters that cannot produce a tiling
    InvalidGeometry {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Sample buffer length does not match its declared dimensions
    LengthMismatch {
        /// Number of samples implied by `width * height * channels`
        expected: usize,
        /// Number of samples actually supplied
        actual: usize,
    },

    /// Source samples that the transforms cannot rank
    InvalidSourceData {
        /// Description of what's wrong with the source data
        reason: String,
    },

    /// GPU dispatch, mapping or allocation failure
    Device {
        /// Operation that was being performed on the device
        operation: &'static str,
        /// Description reported by the driver or the limit check
        reason: String,
    },

    /// Numerical computation produced invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },

    /// Failed to load source image from filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save generated image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedBackend { reason } => {
                write!(f, "No supported compute backend: {reason}")
            }
            Self::InvalidGeometry {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid geometry '{parameter}' = '{value}': {reason}")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(
                    f,
                    "Sample buffer length mismatch: expected {expected} samples, got {actual}"
                )
            }
            Self::InvalidSourceData { reason } => {
                write!(f, "Invalid source data: {reason}")
            }
            Self::Device { operation, reason } => {
                write!(f, "Device error during {operation}: {reason}")
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for SynthesisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for synthesis results
pub type Result<T> = std::result::Result<T, SynthesisError>;

impl From<image::ImageError> for SynthesisError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for SynthesisError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid geometry error
pub fn invalid_geometry(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> SynthesisError {
    SynthesisError::InvalidGeometry {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a device error
pub fn device_error(operation: &'static str, reason: &impl ToString) -> SynthesisError {
    SynthesisError::Device {
        operation,
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> SynthesisError {
    SynthesisError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Create an error for a path the CLI cannot work with
pub fn path_error(path: &std::path::Path, reason: &str) -> SynthesisError {
    SynthesisError::FileSystem {
        path: path.to_path_buf(),
        operation: "resolve target",
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, reason.to_string()),
    }
}
