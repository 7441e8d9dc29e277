use std::sync::Arc;

/// Final result of fetching data for one input row.
#[derive(Debug, Clone)]
pub enum FetchOutcome<T> {
    /// The fetch succeeded and produced a payload.
    Success(T),

    /// The row was deliberately passed over (invalid address, nothing to fetch, unusable repository).
    Skipped(Arc<str>),

    /// The fetch was given up on after a permanent refusal or too many attempts.
    Failed(Arc<ohno::AppError>),
}

impl<T> FetchOutcome<T> {
    /// Returns `true` if the outcome is `Success`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns a reference to the payload if `Success`, otherwise `None`.
    #[must_use]
    pub const fn as_ref(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Consumes the outcome, returning the payload if `Success`.
    #[must_use]
    pub fn into_success(self) -> Option<T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn skipped(reason: impl Into<Arc<str>>) -> Self {
        Self::Skipped(reason.into())
    }

    pub(crate) fn failed(error: ohno::AppError) -> Self {
        Self::Failed(Arc::new(error))
    }
}
