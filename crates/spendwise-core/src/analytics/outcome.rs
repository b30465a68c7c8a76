//! Tagged result type returned by every analytics engine

/// Outcome of an analysis run
///
/// Missing data is a normal state, not an error: engines return
/// `InsufficientData` with a user-facing message. `Failure` is reserved for
/// the layer that fetches data (storage errors); engines never produce it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ready(T),
    InsufficientData { message: String },
    Failure { cause: String },
}

impl<T> Outcome<T> {
    pub fn insufficient(message: impl Into<String>) -> Self {
        Outcome::InsufficientData {
            message: message.into(),
        }
    }

    pub fn failure(cause: impl std::fmt::Display) -> Self {
        Outcome::Failure {
            cause: cause.to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }

    /// The computed value, if any
    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// The insufficient-data message, if that's what this is
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::InsufficientData { message } => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ready(value) => Outcome::Ready(f(value)),
            Outcome::InsufficientData { message } => Outcome::InsufficientData { message },
            Outcome::Failure { cause } => Outcome::Failure { cause },
        }
    }
}

impl<T> From<crate::Error> for Outcome<T> {
    fn from(err: crate::Error) -> Self {
        Outcome::failure(err)
    }
}
