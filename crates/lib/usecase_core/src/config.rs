//! SharePoint connection settings resolved from the environment.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth::Credential;

/// Default SharePoint list holding the use cases.
pub const DEFAULT_LIST_TITLE: &str = "UseCases";
pub const DEFAULT_PAGES_LIST: &str = "Pages";
pub const DEFAULT_SECTIONS_LIST: &str = "Sections";
pub const DEFAULT_SECTION_ITEMS_LIST: &str = "SectionItems";
pub const DEFAULT_ASSETS_LIST: &str = "Assets";

/// Default per-request timeout for upstream calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts for throttled (429/503) requests.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Titles of the lists backing the content pages.
#[derive(Clone, Debug)]
pub struct PageLists {
    pub pages: String,
    pub sections: String,
    pub section_items: String,
    pub assets: String,
}

impl Default for PageLists {
    fn default() -> Self {
        Self {
            pages: DEFAULT_PAGES_LIST.into(),
            sections: DEFAULT_SECTIONS_LIST.into(),
            section_items: DEFAULT_SECTION_ITEMS_LIST.into(),
            assets: DEFAULT_ASSETS_LIST.into(),
        }
    }
}

/// Everything needed to talk to the SharePoint site.
#[derive(Clone, Debug)]
pub struct SharePointSettings {
    /// Site URL, e.g. `https://tenant.sharepoint.com/sites/UseCases`.
    pub site_url: String,
    pub credential: Credential,
    /// Title of the main use-case list.
    pub list_title: String,
    /// GUID of the list served by the plain list endpoints.
    pub list_id: Option<String>,
    pub page_lists: PageLists,
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub authority_host: String,
    pub graph_base_url: String,
}

impl SharePointSettings {
    /// Reads settings from environment variables.
    ///
    /// | Variable                  | Default                               |
    /// |---------------------------|---------------------------------------|
    /// | `SP_SITE_URL`             | required                              |
    /// | `TENANT_ID`               | required                              |
    /// | `CLIENT_ID`               | required                              |
    /// | `CERT_THUMBPRINT`         | required                              |
    /// | `CERT_PRIVATE_KEY`        | required                              |
    /// | `SP_LIST_TITLE`           | `UseCases`                            |
    /// | `SP_LIST_ID`              | unset                                 |
    /// | `SP_LIST_PAGES`           | `Pages`                               |
    /// | `SP_LIST_SECTIONS`        | `Sections`                            |
    /// | `SP_LIST_SECTIONITEMS`    | `SectionItems`                        |
    /// | `SP_LIST_ASSETS`          | `Assets`                              |
    /// | `SP_REQUEST_TIMEOUT_SECS` | `30`                                  |
    /// | `SP_MAX_ATTEMPTS`         | `3`                                   |
    /// | `AUTHORITY_HOST`          | `https://login.microsoftonline.com`   |
    /// | `GRAPH_BASE_URL`          | `https://graph.microsoft.com/v1.0`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] but reads through `lookup`, so tests do not
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |name: &str| {
            let value = get(name);
            if value.is_none() {
                missing.push(name.to_string());
            }
            value.unwrap_or_default()
        };

        let site_url = required("SP_SITE_URL");
        let tenant_id = required("TENANT_ID");
        let client_id = required("CLIENT_ID");
        let thumbprint = required("CERT_THUMBPRINT");
        let private_key = required("CERT_PRIVATE_KEY");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let site_url = site_url.trim_end_matches('/').to_string();
        let site_origin = site_origin(&site_url)?;

        let request_timeout = Duration::from_secs(parse_number(
            "SP_REQUEST_TIMEOUT_SECS",
            get("SP_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let max_attempts = parse_number("SP_MAX_ATTEMPTS", get("SP_MAX_ATTEMPTS"), DEFAULT_MAX_ATTEMPTS)?;

        Ok(Self {
            credential: Credential::new(client_id, tenant_id, thumbprint, private_key, site_origin),
            site_url,
            list_title: get("SP_LIST_TITLE").unwrap_or_else(|| DEFAULT_LIST_TITLE.into()),
            list_id: get("SP_LIST_ID"),
            page_lists: PageLists {
                pages: get("SP_LIST_PAGES").unwrap_or_else(|| DEFAULT_PAGES_LIST.into()),
                sections: get("SP_LIST_SECTIONS").unwrap_or_else(|| DEFAULT_SECTIONS_LIST.into()),
                section_items: get("SP_LIST_SECTIONITEMS")
                    .unwrap_or_else(|| DEFAULT_SECTION_ITEMS_LIST.into()),
                assets: get("SP_LIST_ASSETS").unwrap_or_else(|| DEFAULT_ASSETS_LIST.into()),
            },
            request_timeout,
            max_attempts: max_attempts.max(1),
            authority_host: get("AUTHORITY_HOST")
                .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.into())
                .trim_end_matches('/')
                .to_string(),
            graph_base_url: get("GRAPH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.into())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Returns the list GUID or the error the list endpoints report.
    pub fn require_list_id(&self) -> Result<&str, ConfigError> {
        self.list_id
            .as_deref()
            .ok_or_else(|| ConfigError::Missing(vec!["SP_LIST_ID".into()]))
    }
}

/// Scheme + host (+ port) of the site, e.g. `https://tenant.sharepoint.com`.
pub fn site_origin(site_url: &str) -> Result<String, ConfigError> {
    let url = Url::parse(site_url).map_err(|e| ConfigError::Invalid {
        name: "SP_SITE_URL".into(),
        reason: e.to_string(),
    })?;
    Ok(url.origin().ascii_serialization())
}

fn parse_number<T: std::str::FromStr>(
    name: &str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name: name.into(),
            reason: format!("expected a number, got '{raw}'"),
        }),
    }
}
