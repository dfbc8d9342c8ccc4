//! Error handling module for StickClip

use thiserror::Error;

use crate::ports::FetchError;

/// Main error type for StickClip operations
#[derive(Error, Debug)]
pub enum StickClipError {
    /// Encoder binary missing or unreachable - fatal for the session
    #[error("encoder unavailable: {message}")]
    Configuration { message: String },

    /// Source file could not be probed - fatal for the session
    #[error("failed to probe media file: {message}")]
    UnreadableMedia { message: String },

    /// Non-positive crop dimensions requested
    #[error("invalid crop dimensions: {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    /// Encoder process exited non-zero; carries its stderr verbatim
    #[error("encoder failed: {diagnostic}")]
    Encoding { diagnostic: String },

    /// User-initiated abort of an in-flight encode
    #[error("encode cancelled")]
    Cancelled,

    /// Size ceiling unreachable after the full compression ladder
    #[error("could not shrink output under the size ceiling after {attempts} attempts")]
    CompressionExhausted { attempts: usize },

    /// A second encode was requested while one is outstanding
    #[error("an encode is already in flight for this session")]
    EncoderBusy,

    /// Operation not permitted in the session's current phase
    #[error("cannot {action} while the session is {phase}")]
    InvalidPhase {
        phase: &'static str,
        action: &'static str,
    },

    /// Source acquisition failure
    #[error("source acquisition failed: {0}")]
    Fetch(#[from] FetchError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode/encode error while rendering previews
    #[error("preview image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for StickClip operations
pub type StickClipResult<T> = std::result::Result<T, StickClipError>;
