use payloads::ClientError;

/// Error code used when the backend answered with a body that is not its
/// structured error format.
pub const UNKNOWN_ERROR_CODE: &str = "common.unknown";

/// A failed request, as exposed to views.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorInfo {
    /// The request never produced a response.
    #[error("{message}")]
    Transport { message: String },
    /// The backend rejected the request.
    #[error("{message}")]
    Api {
        status_code: u16,
        /// Machine readable code such as `common.bad_request`.
        code: String,
        message: String,
    },
}

impl ErrorInfo {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn api(
        status_code: u16,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Api {
            status_code,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { .. } => None,
            Self::Api { status_code, .. } => Some(*status_code),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Transport { .. } => None,
            Self::Api { code, .. } => Some(code),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message } | Self::Api { message, .. } => message,
        }
    }
}

impl From<ClientError> for ErrorInfo {
    fn from(e: ClientError) -> Self {
        let body = e.error_body();
        let message = e.to_string();
        match (e, body) {
            (ClientError::Network(_), _) => Self::transport(message),
            (ClientError::APIError(status, _), Some(body)) => {
                Self::api(status.as_u16(), body.code, body.message)
            }
            (ClientError::APIError(status, _), None) => {
                Self::api(status.as_u16(), UNKNOWN_ERROR_CODE, message)
            }
        }
    }
}

/// Where a failed request is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorStrategy {
    /// Shown on the shared page-level error bar and logged, in addition to
    /// the returned `error` field.
    #[default]
    Default,
    /// Only exposed through the returned `error` field; the call site renders
    /// its own affordance.
    Custom,
}
