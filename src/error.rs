use thiserror::Error;

/// Failures reported when bringing the cycle counter up or down.
///
/// Both variants are fatal. Nothing is retried and no register write is
/// rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PmuError {
    #[error("privileged PMU register access denied")]
    PrivilegeDenied,
    #[error("PMU register layout not supported on this platform")]
    UnsupportedPlatform,
}
