//! SharePoint REST client.
//!
//! Every request carries a bearer token from the shared provider and asks
//! for `odata=nometadata` JSON. Throttled responses (429/503) are retried
//! with exponential backoff; everything else fails fast.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use super::odata::{escape_literal, query_string};
use super::retry::{RetryPolicy, send_with_retry};
use super::{ListQuery, ListRef, SharePointError};
use crate::auth::AccessTokenProvider;
use crate::config::SharePointSettings;
use crate::models::{Attachment, ListItem};

const JSON_NOMETADATA: &str = "application/json;odata=nometadata";
const ANY: &str = "*/*";

/// Takes `value`, or the verbose `d.results`, or nothing.
fn results(mut body: Value) -> Vec<Value> {
    if let Some(Value::Array(items)) = body.get_mut("value").map(Value::take) {
        return items;
    }
    match body.pointer_mut("/d/results").map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn require_item_id(item_id: Option<i64>) -> Result<i64, SharePointError> {
    item_id.ok_or_else(|| SharePointError::Validation("itemId is required".into()))
}

/// Client for one SharePoint site.
#[derive(Clone)]
pub struct SharePointClient {
    http: Client,
    site_url: String,
    tokens: Arc<dyn AccessTokenProvider>,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl SharePointClient {
    pub fn new(http: Client, site_url: impl Into<String>, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            http,
            site_url: site_url.into().trim_end_matches('/').to_string(),
            tokens,
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }

    /// Client configured from settings: site, attempts and timeout.
    pub fn from_settings(
        http: Client,
        settings: &SharePointSettings,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self::new(http, settings.site_url.clone(), tokens)
            .with_retry(RetryPolicy {
                max_attempts: settings.max_attempts,
                ..RetryPolicy::default()
            })
            .with_timeout(settings.request_timeout)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry.normalized();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Absolute URL of a list's items collection with OData options.
    pub fn list_items_url(&self, list: &ListRef, query: &ListQuery) -> String {
        format!(
            "{}/_api/web/{}/items{}",
            self.site_url,
            list.path(),
            query_string(query)
        )
    }

    /// Items of a list (first page only).
    pub async fn get_list_items(
        &self,
        list: &ListRef,
        query: &ListQuery,
    ) -> Result<Vec<ListItem>, SharePointError> {
        let url = self.list_items_url(list, query);
        debug!(list = list.label(), "fetching list items");
        let body = self.get_json(&url).await?;
        results(body)
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(SharePointError::from))
            .collect()
    }

    /// One item by id. `None` is rejected before any request; `0` is valid.
    pub async fn get_list_item_by_id(
        &self,
        list: &ListRef,
        item_id: Option<i64>,
        select: Option<&str>,
    ) -> Result<ListItem, SharePointError> {
        let item_id = require_item_id(item_id)?;
        let query = ListQuery {
            select: select.map(str::to_string),
            ..ListQuery::default()
        };
        let url = format!(
            "{}/_api/web/{}/items({item_id}){}",
            self.site_url,
            list.path(),
            query_string(&query)
        );
        debug!(list = list.label(), item_id, "fetching list item");
        let body = self.get_json(&url).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Attachment files of an item.
    pub async fn get_list_item_attachments(
        &self,
        list: &ListRef,
        item_id: Option<i64>,
    ) -> Result<Vec<Attachment>, SharePointError> {
        let item_id = require_item_id(item_id)?;
        let url = format!(
            "{}/_api/web/{}/items({item_id})/AttachmentFiles",
            self.site_url,
            list.path()
        );
        debug!(list = list.label(), item_id, "fetching attachments");
        let body = self.get_json(&url).await?;
        results(body)
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(SharePointError::from))
            .collect()
    }

    /// Raw bytes of a file addressed by its server-relative URL.
    pub async fn download_attachment_by_server_relative_url(
        &self,
        server_relative_url: &str,
    ) -> Result<Vec<u8>, SharePointError> {
        if server_relative_url.is_empty() {
            return Err(SharePointError::Validation(
                "serverRelativeUrl is required".into(),
            ));
        }
        let url = format!(
            "{}/_api/web/GetFileByServerRelativeUrl('{}')/$value",
            self.site_url,
            escape_literal(server_relative_url)
        );
        debug!(file = server_relative_url, "downloading file");
        let resp = self.send(&url, ANY).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn get_json(&self, url: &str) -> Result<Value, SharePointError> {
        let resp = self.send(url, JSON_NOMETADATA).await?;
        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Authenticated GET with throttling retries. Returns only 2xx responses.
    async fn send(&self, url: &str, accept: &str) -> Result<Response, SharePointError> {
        send_with_retry(
            "SharePoint",
            url,
            self.retry,
            self.timeout,
            self.tokens.as_ref(),
            |token| self.http.get(url).bearer_auth(token).header(ACCEPT, accept),
        )
        .await
    }
}
