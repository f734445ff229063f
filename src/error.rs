use crate::platform::Platform;

/// Errors raised synchronously by attachment operations
///
/// None of these are retried internally.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("Attachment can be initialized only once")]
    AlreadyInitialized,

    #[error("Cannot {operation} before attachment is initialized")]
    NotInitialized { operation: &'static str },

    #[error("Cannot {operation}: {reason}")]
    InvalidState {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("'{operation}' is not supported on {platform}")]
    UnsupportedPlatform {
        operation: &'static str,
        platform: Platform,
    },

    #[error("Overlay surface command failed: {0:#}")]
    Surface(#[source] anyhow::Error),

    #[error("Native hook call failed: {0:#}")]
    Hook(#[source] anyhow::Error),
}

impl AttachError {
    /// Stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AttachError::AlreadyInitialized => "ALREADY_INITIALIZED",
            AttachError::NotInitialized { .. } => "NOT_INITIALIZED",
            AttachError::InvalidState { .. } => "INVALID_STATE",
            AttachError::UnsupportedPlatform { .. } => "UNSUPPORTED_PLATFORM",
            AttachError::Surface(_) => "SURFACE_ERROR",
            AttachError::Hook(_) => "HOOK_ERROR",
        }
    }

    /// Caller misuse rather than a backend failure
    pub fn is_user_error(&self) -> bool {
        !matches!(self, AttachError::Surface(_) | AttachError::Hook(_))
    }
}

pub type AttachResult<T> = Result<T, AttachError>;
