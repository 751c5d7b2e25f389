//! SharePoint REST and Microsoft Graph list access.

pub mod client;
pub mod graph;
pub mod odata;
pub mod retry;

use serde_json::Value;
use thiserror::Error;

use crate::auth::AuthError;

pub use client::SharePointClient;
pub use graph::GraphClient;
pub use retry::RetryPolicy;

/// Errors from SharePoint or Graph calls.
#[derive(Debug, Error)]
pub enum SharePointError {
    /// Caller supplied an unusable argument; nothing was sent.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Request failed with status code {status}")]
    Remote { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SharePointError {
    /// Upstream HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            Self::Auth(AuthError::TokenEndpoint { status, .. }) => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Upstream response body: parsed JSON when it is JSON, the raw text
    /// otherwise, `null` when there was no response.
    pub fn response_data(&self) -> Value {
        let body = match self {
            Self::Remote { body, .. } => body,
            Self::Auth(AuthError::TokenEndpoint { body, .. }) => body,
            _ => return Value::Null,
        };
        if body.is_empty() {
            return Value::Null;
        }
        serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone()))
    }
}

/// How a list is addressed in the REST URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRef {
    /// `lists/getbytitle('<title>')`
    Title(String),
    /// `lists(guid'<id>')`
    Guid(String),
}

impl ListRef {
    pub fn title(title: impl Into<String>) -> Self {
        Self::Title(title.into())
    }

    pub fn guid(id: impl Into<String>) -> Self {
        Self::Guid(id.into())
    }

    /// Path segment after `/_api/web/`.
    pub fn path(&self) -> String {
        match self {
            Self::Title(title) => format!("lists/getbytitle('{}')", odata::escape_literal(title)),
            Self::Guid(id) => format!("lists(guid'{}')", odata::escape_literal(id)),
        }
    }

    fn label(&self) -> &str {
        match self {
            Self::Title(s) | Self::Guid(s) => s,
        }
    }
}

/// OData options for a list query. Empty clauses are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub select: Option<String>,
    pub filter: Option<String>,
    pub orderby: Option<String>,
    pub top: Option<u32>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn orderby(mut self, orderby: impl Into<String>) -> Self {
        self.orderby = Some(orderby.into());
        self
    }

    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_paths_escape_quotes() {
        assert_eq!(ListRef::title("Pages").path(), "lists/getbytitle('Pages')");
        assert_eq!(
            ListRef::title("Bob's List").path(),
            "lists/getbytitle('Bob''s List')"
        );
        assert_eq!(
            ListRef::guid("0c1d-42").path(),
            "lists(guid'0c1d-42')"
        );
    }

    #[test]
    fn response_data_prefers_json() {
        let err = SharePointError::Remote {
            status: 403,
            body: r#"{"error":{"message":"Access denied"}}"#.into(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(
            err.response_data()["error"]["message"],
            "Access denied"
        );

        let err = SharePointError::Remote {
            status: 502,
            body: "Bad gateway".into(),
        };
        assert_eq!(err.response_data(), Value::String("Bad gateway".into()));

        let err = SharePointError::Validation("itemId is required".into());
        assert_eq!(err.status(), None);
        assert_eq!(err.response_data(), Value::Null);
    }
}
