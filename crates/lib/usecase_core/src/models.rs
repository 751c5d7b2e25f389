//! Domain models for SharePoint list data.
//!
//! List items stay dynamic: the schema is configured in SharePoint, not here.
//! Typed accessors cover the columns the catalog relies on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::facets::split_values;

/// One row of a SharePoint list, columns in the order SharePoint sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListItem(pub Map<String, Value>);

impl ListItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// `Id`, falling back to `ID`.
    pub fn id(&self) -> Option<i64> {
        self.get("Id")
            .and_then(Value::as_i64)
            .or_else(|| self.get("ID").and_then(Value::as_i64))
    }

    /// String value of a column; numbers are rendered, empty strings dropped.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<String> {
        self.text("Title")
    }

    /// Comma-joined `Country` column.
    pub fn countries(&self) -> Vec<String> {
        self.multi_values("Country")
    }

    /// Comma-joined `Sectors` column.
    pub fn sectors(&self) -> Vec<String> {
        self.multi_values("Sectors")
    }

    pub fn maturity_level(&self) -> Option<String> {
        self.text("MaturityLevel")
    }

    /// Splits a comma-joined column into trimmed, non-empty values.
    pub fn multi_values(&self, key: &str) -> Vec<String> {
        self.text(key).map(|s| split_values(&s)).unwrap_or_default()
    }

    /// Clone of a column for re-serialisation; `None` when the column is absent.
    pub fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ListItem {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A file attached to a list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attachment {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub server_relative_url: String,
}

/// Item shape served by the Graph list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GraphListEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub title: Value,
    pub modified: Value,
}

/// Item shape served by the certificate list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PublicListEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub title: Value,
    pub text: Value,
    pub modified: Value,
    pub num: Value,
}

impl From<&ListItem> for PublicListEntry {
    fn from(item: &ListItem) -> Self {
        Self {
            id: item.field("Id"),
            title: or_empty(item.get("Title")),
            text: or_empty(item.get("Text")),
            modified: or_empty(item.get("Modified")),
            num: or_empty(item.get("No")),
        }
    }
}

/// The value when it is truthy, `""` otherwise.
pub fn or_empty(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Value::String(String::new()),
        Some(Value::String(s)) if s.is_empty() => Value::String(String::new()),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Value::String(String::new()),
        Some(v) => v.clone(),
    }
}

/// Content page metadata from the Pages list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_image_url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Value>,
}

impl From<&ListItem> for Page {
    fn from(item: &ListItem) -> Self {
        Self {
            id: item.field("Id"),
            title: item.field("Title"),
            slug: item.field("Slug"),
            seo_title: item.field("SeoTitle"),
            seo_description: item.field("SeoDescription"),
            social_image_url: item.field("SocialImageUrl"),
            language: item.field("Language"),
        }
    }
}

/// A page section from the Sections list, with its items attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_slug: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_key: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subheading: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro_text: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_text: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_bg_image_url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_icon_url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_cta_label: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_cta_href: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<Value>,
    pub items: Vec<SectionItem>,
}

impl From<&ListItem> for Section {
    fn from(item: &ListItem) -> Self {
        Self {
            id: item.field("Id"),
            page_slug: item.field("PageSlug"),
            section_key: item.field("SectionKey"),
            section_type: item.field("SectionType"),
            heading: item.field("Heading"),
            subheading: item.field("Subheading"),
            intro_text: item.field("IntroText"),
            body_text: item.field("BodyText"),
            hero_bg_image_url: item.field("HeroBgImageUrl"),
            hero_icon_url: item.field("HeroIconUrl"),
            primary_cta_label: item.field("PrimaryCtaLabel"),
            primary_cta_href: item.field("PrimaryCtaHref"),
            extra_json: item.field("ExtraJson"),
            sort_order: item.field("SortOrder"),
            items: Vec::new(),
        }
    }
}

/// An entry from the SectionItems list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_slug: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_key: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_label: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_text: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<Value>,
}

impl From<&ListItem> for SectionItem {
    fn from(item: &ListItem) -> Self {
        Self {
            id: item.field("Id"),
            page_slug: item.field("PageSlug"),
            section_key: item.field("SectionKey"),
            item_type: item.field("ItemType"),
            group_label: item.field("GroupLabel"),
            label: item.field("Label"),
            subtitle: item.field("Subtitle"),
            title: item.field("Title"),
            description: item.field("Description"),
            bullets: item.field("Bullets"),
            value_text: item.field("ValueText"),
            url: item.field("Url"),
            icon_url: item.field("IconUrl"),
            location: item.field("Location"),
            stage_code: item.field("StageCode"),
            date_range: item.field("DateRange"),
            extra_json: item.field("ExtraJson"),
            sort_order: item.field("SortOrder"),
        }
    }
}

/// A reusable asset from the Assets list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<Value>,
}

impl From<&ListItem> for Asset {
    fn from(item: &ListItem) -> Self {
        Self {
            key: item.field("Key"),
            title: item.field("Title"),
            url: item.field("Url"),
            alt_text: item.field("AltText"),
        }
    }
}

/// Assembled content page: metadata, ordered sections, assets by key.
#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    pub page: Page,
    pub sections: Vec<Section>,
    pub assets: Map<String, Value>,
}

/// Text used to match a section to its items and to key assets.
///
/// Strings are used as-is, other scalars by their JSON rendering.
pub fn join_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(value: Value) -> ListItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn list_item_keeps_column_order() {
        let it = item(json!({"Zeta": 1, "Alpha": 2, "Mid": 3}));
        let keys: Vec<&String> = it.0.keys().collect();
        assert_eq!(keys, ["Zeta", "Alpha", "Mid"]);
        assert_eq!(
            serde_json::to_string(&it).unwrap(),
            r#"{"Zeta":1,"Alpha":2,"Mid":3}"#
        );
    }

    #[test]
    fn id_falls_back_to_upper_case_column() {
        assert_eq!(item(json!({"Id": 7})).id(), Some(7));
        assert_eq!(item(json!({"ID": 9})).id(), Some(9));
        assert_eq!(item(json!({"Title": "x"})).id(), None);
    }

    #[test]
    fn multi_value_accessors_split_on_commas() {
        let it = item(json!({
            "Country": "Kenya, Ghana ,,",
            "Sectors": "Health,Finance",
            "MaturityLevel": "Pilot/Testing"
        }));
        assert_eq!(it.countries(), ["Kenya", "Ghana"]);
        assert_eq!(it.sectors(), ["Health", "Finance"]);
        assert_eq!(it.maturity_level().as_deref(), Some("Pilot/Testing"));
        assert!(it.multi_values("Missing").is_empty());
    }

    #[test]
    fn attachment_uses_sharepoint_casing() {
        let a: Attachment = serde_json::from_value(json!({
            "FileName": "a.png",
            "ServerRelativeUrl": "/sites/x/Lists/UC/Attachments/1/a.png"
        }))
        .unwrap();
        assert_eq!(a.file_name, "a.png");
        assert_eq!(
            serde_json::to_value(&a).unwrap()["ServerRelativeUrl"],
            "/sites/x/Lists/UC/Attachments/1/a.png"
        );
    }

    #[test]
    fn absent_page_columns_are_omitted() {
        let page = Page::from(&item(json!({"Id": 1, "Title": "Home", "Slug": "home", "Language": null})));
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value, json!({"id": 1, "title": "Home", "slug": "home", "language": null}));
    }

    #[test]
    fn public_entry_defaults_falsy_columns_to_empty() {
        let entry = PublicListEntry::from(&item(json!({
            "Id": 3, "Title": "T", "Text": null, "Modified": "2024-01-01", "No": 0
        })));
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"id": 3, "title": "T", "text": "", "modified": "2024-01-01", "num": ""})
        );
        let entry = PublicListEntry::from(&item(json!({"No": 12})));
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"title": "", "text": "", "modified": "", "num": 12})
        );
    }

    #[test]
    fn join_key_renders_scalars() {
        assert_eq!(join_key(&json!("hero")).as_deref(), Some("hero"));
        assert_eq!(join_key(&json!(3)).as_deref(), Some("3"));
        assert_eq!(join_key(&Value::Null), None);
    }
}
