//! Editor errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EditorError>;

/// Why a submission was rejected
///
/// The first three variants are local validation failures: no request was
/// sent. `Remote` carries the server's message, or a fallback when it sent none.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("invalid form: check {}", fields.join(", "))]
    InvalidForm { fields: Vec<&'static str> },

    #[error("select at least one destination")]
    NoDestination,

    #[error("notification requires recipients and an email configuration")]
    IncompleteNotification,

    #[error("{message}")]
    Remote { message: String },
}

impl EditorError {
    pub fn invalid(fields: Vec<&'static str>) -> Self {
        Self::InvalidForm { fields }
    }

    pub(crate) fn remote(err: &strata_client::ClientError, fallback: &str) -> Self {
        Self::Remote {
            message: err.user_message(fallback),
        }
    }

    /// True for failures detected before any network call
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_client::ClientError;

    #[test]
    fn test_invalid_form_lists_fields() {
        let err = EditorError::invalid(vec!["name", "source"]);
        assert_eq!(err.to_string(), "invalid form: check name, source");
        assert!(err.is_validation());
    }

    #[test]
    fn test_remote_uses_server_message() {
        let err = EditorError::remote(
            &ClientError::api_error(400, "Source not found"),
            "Failed to save job",
        );
        assert_eq!(err.to_string(), "Source not found");
        assert!(!err.is_validation());

        let err = EditorError::remote(&ClientError::api_error(500, ""), "Failed to save job");
        assert_eq!(err.to_string(), "Failed to save job");
    }
}
