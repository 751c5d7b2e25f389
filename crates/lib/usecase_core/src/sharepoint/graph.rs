//! Microsoft Graph access to a SharePoint list.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::SharePointError;
use super::retry::{RetryPolicy, send_with_retry};
use crate::auth::AccessTokenProvider;
use crate::config::DEFAULT_GRAPH_BASE_URL;
use crate::models::{GraphListEntry, or_empty};

/// Fields expanded on each list item.
const EXPANDED_FIELDS: &str = "fields($select=Id,Title,Modified)";
const PAGE_SIZE: &str = "100";

/// Reads list items through Graph with a managed-identity token.
#[derive(Clone)]
pub struct GraphClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenProvider>,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl GraphClient {
    pub fn new(http: Client, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            http,
            base_url: DEFAULT_GRAPH_BASE_URL.into(),
            tokens,
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry.normalized();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `{base}/sites/{hostname}:{path}:/lists/{list_id}/items`
    pub fn items_url(&self, site_url: &str, list_id: &str) -> Result<String, SharePointError> {
        let site = Url::parse(site_url)
            .map_err(|e| SharePointError::Validation(format!("Invalid site URL: {e}")))?;
        let host = site
            .host_str()
            .ok_or_else(|| SharePointError::Validation("Site URL has no host".into()))?;
        Ok(format!(
            "{}/sites/{host}:{}:/lists/{list_id}/items",
            self.base_url,
            site.path()
        ))
    }

    /// First page (up to 100) of items with `Id`, `Title` and `Modified`.
    pub async fn list_items(
        &self,
        site_url: &str,
        list_id: &str,
    ) -> Result<Vec<GraphListEntry>, SharePointError> {
        let url = self.items_url(site_url, list_id)?;
        debug!(list_id, "fetching list items via Graph");
        let resp = send_with_retry(
            "Graph",
            &url,
            self.retry,
            self.timeout,
            self.tokens.as_ref(),
            |token| {
                self.http
                    .get(&url)
                    .bearer_auth(token)
                    .header(ACCEPT, "application/json")
                    .query(&[("$expand", EXPANDED_FIELDS), ("$top", PAGE_SIZE)])
            },
        )
        .await?;

        let body: Value = serde_json::from_str(&resp.text().await?)?;
        let items = match body.get("value") {
            Some(Value::Array(items)) => items.iter().map(graph_entry).collect(),
            _ => Vec::new(),
        };
        Ok(items)
    }
}

/// `id` from `fields.Id` (falling back to the item id); title and modified
/// default to `""`.
pub fn graph_entry(item: &Value) -> GraphListEntry {
    let fields = item.get("fields");
    let field = |name: &str| fields.and_then(|f| f.get(name));

    let id = match field("Id") {
        Some(v) if !v.is_null() => Some(v.clone()),
        _ => item.get("id").filter(|v| !v.is_null()).cloned(),
    };

    GraphListEntry {
        id,
        title: or_empty(field("Title")),
        modified: or_empty(field("Modified")),
    }
}
