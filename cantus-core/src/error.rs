use thiserror::Error;

/// All errors produced by cantus-core.
#[derive(Debug, Error)]
pub enum CantusError {
    #[error("chat backend error: {0}")]
    Backend(String),

    #[error("chat backend returned status {status}")]
    BackendStatus { status: u16 },

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("all {attempted} generation attempts failed (last error: {last_error})")]
    AllCandidatesFailed { attempted: usize, last_error: String },

    #[error("no models available from the backend")]
    NoModelsAvailable,

    #[error("no speech tokens found in model output")]
    NoSpeechTokens,

    #[error("no usable candidates after token parsing")]
    NoUsableCandidates,

    #[error("recognition backend is required for best-of-n scoring but not available")]
    RecognizerUnavailable,

    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("recognition error: {0}")]
    Recognition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CantusError>;
