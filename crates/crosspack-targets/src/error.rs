//! Error types for platform lookup and host detection.

/// Errors that can occur while resolving platforms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    /// The token is not a key of the platform registry.
    #[error("unknown platform: '{token}'. Use --list to see available platforms.")]
    UnknownPlatform {
        /// The token as the user spelled it.
        token: String,
    },

    /// The running machine does not normalize to a registered token.
    #[error("unsupported host: os '{os}', arch '{arch}'")]
    UnsupportedHost {
        /// Raw OS name reported by the platform.
        os: String,
        /// Raw architecture name reported by the platform.
        arch: String,
    },
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, TargetError>;
