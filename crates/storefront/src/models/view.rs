//! Outcome of loading the data behind a page.

/// Either the data a page shows, or the message explaining why it is missing.
///
/// Handlers await their API calls before rendering, so there is no separate
/// loading state on the server side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    Failed(String),
    Loaded(T),
}

impl<T> ViewState<T> {
    /// Map a fetch result, replacing any error with `message`.
    pub fn from_result<E>(result: Result<T, E>, message: impl Into<String>) -> Self {
        match result {
            Ok(data) => Self::Loaded(data),
            Err(_) => Self::Failed(message.into()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ViewState<U> {
        match self {
            Self::Failed(message) => ViewState::Failed(message),
            Self::Loaded(data) => ViewState::Loaded(f(data)),
        }
    }

    /// The error message, for templates.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            Self::Loaded(_) => None,
        }
    }

    /// The loaded data, for templates.
    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Failed(_) => None,
            Self::Loaded(data) => Some(data),
        }
    }
}

impl<T> ViewState<Vec<T>> {
    /// Loaded with no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Loaded(rows) if rows.is_empty())
    }
}
