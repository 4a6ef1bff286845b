/// Convenience result type used across vcrtc.
pub type VcrtcResult<T> = Result<T, VcrtcError>;

/// Top-level error taxonomy used by compositor APIs.
///
/// Every variant aborts at most the composition activation that produced it; the scheduler
/// absorbs them and keeps running.
#[derive(thiserror::Error, Debug)]
pub enum VcrtcError {
    /// Plane geometry or layout does not fit the primary plane or its own buffer.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A scratch, output or writeback buffer could not be allocated.
    #[error("allocation failure: {0}")]
    Allocation(String),

    /// A fourcc with no codec, reported only when the fallback codec is disabled.
    #[error("unsupported format: {0:#010x}")]
    UnsupportedFormat(u32),

    /// Caller-supplied argument outside the accepted set.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The composer worker thread could not be started, reached, or joined.
    #[error("worker error: {0}")]
    Worker(String),

    /// Errors when serializing or deserializing scenes and options.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VcrtcError {
    /// Build a [`VcrtcError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`VcrtcError::Allocation`] value.
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Build a [`VcrtcError::InvalidArgument`] value.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Build a [`VcrtcError::Worker`] value.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Build a [`VcrtcError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
