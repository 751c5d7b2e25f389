//! Image-field decoding and attachment resolution.
//!
//! SharePoint has stored image columns in several shapes over the years:
//! JSON-encoded objects, bare URLs or file names, and objects carrying a
//! `serverUrl` + `serverRelativeUrl` pair. Everything here is total: bad
//! input produces empty results, never errors.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{Attachment, ListItem};

/// Column names that may hold the thumbnail, in lookup order.
pub const THUMBNAIL_FIELDS: &[&str] = &["Thumbnail", "thumbnail"];

/// Column names that may hold the cover image, in lookup order.
pub const COVER_FIELDS: &[&str] = &[
    "CoverImage",
    "Cover_Image",
    "Cover_x0020_Image",
    "Cover Image",
    "coverImage",
    "cover",
];

/// Internal name of the thumbnail column read by the image endpoint.
pub const THUMBNAIL_COLUMN: &str = "Thumbnail";

/// Internal name of the cover column (`Cover Image` with its space encoded).
pub const COVER_COLUMN: &str = "Cover_x0020_Image";

/// Decoded image column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFieldValue {
    pub file_name: Option<String>,
    pub server_relative_url: Option<String>,
    pub url: Option<String>,
}

/// Which image column a request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Thumbnail,
    Cover,
}

impl ImageKind {
    /// `cover` (any case) selects the cover; everything else the thumbnail.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("cover") => Self::Cover,
            _ => Self::Thumbnail,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Cover => "cover",
        }
    }

    /// Column selected when fetching a single item.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Thumbnail => THUMBNAIL_COLUMN,
            Self::Cover => COVER_COLUMN,
        }
    }

    /// Label used in "not set" messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Thumbnail => "Thumbnail",
            Self::Cover => "CoverImage",
        }
    }
}

/// JavaScript-style truthiness projected onto text: non-empty strings and
/// non-zero numbers.
fn truthy_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".into()),
        _ => None,
    }
}

fn first_truthy(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| truthy_text(object.get(*k)))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Decodes an image column into file name, server-relative URL and URL.
pub fn parse_image_field(value: Option<&Value>) -> ImageFieldValue {
    let Some(value) = value.filter(|v| is_truthy(v)) else {
        return ImageFieldValue::default();
    };

    let decoded;
    let value = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => {
                decoded = parsed;
                &decoded
            }
            Err(_) => return from_plain_string(raw),
        },
        other => other,
    };

    match value {
        Value::Object(object) => from_object(object),
        _ => ImageFieldValue::default(),
    }
}

fn from_plain_string(raw: &str) -> ImageFieldValue {
    let trimmed = raw.trim();
    let file_name = trimmed.rsplit('/').next().filter(|s| !s.is_empty());
    ImageFieldValue {
        file_name: file_name.map(str::to_string),
        server_relative_url: None,
        url: (!trimmed.is_empty()).then(|| trimmed.to_string()),
    }
}

fn from_object(object: &Map<String, Value>) -> ImageFieldValue {
    let file_name = first_truthy(object, &["fileName", "FileName", "name", "Name"]);
    let server_relative_url = first_truthy(object, &["serverRelativeUrl", "ServerRelativeUrl"]);

    let url = match (
        truthy_text(object.get("serverUrl")),
        truthy_text(object.get("serverRelativeUrl")),
    ) {
        (Some(server), Some(relative)) => {
            Some(format!("{}{}", server.strip_suffix('/').unwrap_or(&server), relative))
        }
        _ => first_truthy(object, &["url", "Url"]),
    };

    ImageFieldValue {
        file_name,
        server_relative_url,
        url,
    }
}

/// Reserved-attachment file name referenced by an image column.
///
/// Stricter than [`parse_image_field`]: only a JSON object (or a string
/// holding one) with `fileName`/`FileName` counts. Plain strings yield `None`.
pub fn attachment_file_name(value: Option<&Value>) -> Option<String> {
    let value = value.filter(|v| is_truthy(v))?;
    let object = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw).ok()? {
            Value::Object(object) => object,
            _ => return None,
        },
        Value::Object(object) => object.clone(),
        _ => return None,
    };
    first_truthy(&object, &["fileName", "FileName"])
}

/// Value of the first candidate column present on the item.
///
/// Presence decides, not content: a present-but-empty column stops the
/// search even if a later candidate holds data.
pub fn pick_field<'a>(item: &'a ListItem, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .find(|key| item.contains_key(key))
        .and_then(|key| item.get(key))
}

/// Attachment whose file name equals `file_name` exactly.
pub fn find_attachment<'a>(attachments: &'a [Attachment], file_name: &str) -> Option<&'a Attachment> {
    attachments.iter().find(|a| a.file_name == file_name)
}

/// Adds `ThumbnailUrl`, `ThumbnailServerRelativeUrl`, `CoverImageUrl` and
/// `CoverImageServerRelativeUrl` to a use-case item.
pub fn enrich_use_case(mut item: ListItem) -> ListItem {
    let thumbnail = parse_image_field(pick_field(&item, THUMBNAIL_FIELDS));
    let cover = parse_image_field(pick_field(&item, COVER_FIELDS));

    let to_value = |v: Option<String>| v.map(Value::String).unwrap_or(Value::Null);
    item.insert("ThumbnailUrl", to_value(thumbnail.url));
    item.insert(
        "ThumbnailServerRelativeUrl",
        to_value(thumbnail.server_relative_url),
    );
    item.insert("CoverImageUrl", to_value(cover.url));
    item.insert("CoverImageServerRelativeUrl", to_value(cover.server_relative_url));
    item
}

/// Content type inferred from the file extension.
pub fn guess_content_type(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    content_type_for_extension(ext)
}

/// Content type for a lower-case extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Lower-cased alphanumeric extension, `jpg` when there is none.
pub fn file_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            ext.to_ascii_lowercase()
        }
        _ => "jpg".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: Value) -> ImageFieldValue {
        parse_image_field(Some(&value))
    }

    #[test]
    fn json_encoded_object_yields_file_name() {
        let parsed = parse(json!(r#"{"fileName":"a.png"}"#));
        assert_eq!(parsed.file_name.as_deref(), Some("a.png"));
        assert_eq!(parsed.server_relative_url, None);
        assert_eq!(parsed.url, None);
    }

    #[test]
    fn plain_url_is_used_verbatim() {
        let parsed = parse(json!("https://x/y/z.png"));
        assert_eq!(parsed.file_name.as_deref(), Some("z.png"));
        assert_eq!(parsed.url.as_deref(), Some("https://x/y/z.png"));
        assert_eq!(parsed.server_relative_url, None);
    }

    #[test]
    fn plain_string_is_trimmed() {
        let parsed = parse(json!("  photo.jpg  "));
        assert_eq!(parsed.file_name.as_deref(), Some("photo.jpg"));
        assert_eq!(parsed.url.as_deref(), Some("photo.jpg"));
    }

    #[test]
    fn trailing_slash_has_no_file_name() {
        let parsed = parse(json!("https://x/y/"));
        assert_eq!(parsed.file_name, None);
        assert_eq!(parsed.url.as_deref(), Some("https://x/y/"));
    }

    #[test]
    fn empty_and_null_give_empty_result() {
        assert_eq!(parse(json!("")), ImageFieldValue::default());
        assert_eq!(parse(Value::Null), ImageFieldValue::default());
        assert_eq!(parse_image_field(None), ImageFieldValue::default());
    }

    #[test]
    fn json_scalars_give_empty_result() {
        assert_eq!(parse(json!("42")), ImageFieldValue::default());
        assert_eq!(parse(json!("\"quoted\"")), ImageFieldValue::default());
    }

    #[test]
    fn server_url_and_relative_url_are_joined() {
        let parsed = parse(json!({
            "serverUrl": "https://contoso.sharepoint.com/",
            "serverRelativeUrl": "/sites/uc/SiteAssets/cover.png",
            "fileName": "cover.png"
        }));
        assert_eq!(
            parsed.url.as_deref(),
            Some("https://contoso.sharepoint.com/sites/uc/SiteAssets/cover.png")
        );
        assert_eq!(
            parsed.server_relative_url.as_deref(),
            Some("/sites/uc/SiteAssets/cover.png")
        );
    }

    #[test]
    fn alternate_key_casings_are_accepted() {
        let parsed = parse(json!({
            "Name": "n.gif",
            "ServerRelativeUrl": "/a/n.gif",
            "Url": "https://host/a/n.gif"
        }));
        assert_eq!(parsed.file_name.as_deref(), Some("n.gif"));
        assert_eq!(parsed.server_relative_url.as_deref(), Some("/a/n.gif"));
        assert_eq!(parsed.url.as_deref(), Some("https://host/a/n.gif"));
    }

    #[test]
    fn empty_file_name_falls_through_to_next_key() {
        let parsed = parse(json!({"fileName": "", "FileName": "b.png"}));
        assert_eq!(parsed.file_name.as_deref(), Some("b.png"));
    }

    #[test]
    fn attachment_file_name_requires_json() {
        assert_eq!(
            attachment_file_name(Some(&json!(
                r#"{"fileName":"Reserved_ImageAttachment_1.png","originalImageName":"x.png"}"#
            )))
            .as_deref(),
            Some("Reserved_ImageAttachment_1.png")
        );
        assert_eq!(
            attachment_file_name(Some(&json!({"FileName": "c.webp"}))).as_deref(),
            Some("c.webp")
        );
        assert_eq!(attachment_file_name(Some(&json!("https://x/y/z.png"))), None);
        assert_eq!(attachment_file_name(Some(&json!(r#"{"name":"a.png"}"#))), None);
        assert_eq!(attachment_file_name(None), None);
    }

    #[test]
    fn pick_field_stops_at_first_present_key_even_if_empty() {
        let item: ListItem = serde_json::from_value(json!({
            "Cover_Image": null,
            "Cover_x0020_Image": r#"{"fileName":"real.png"}"#
        }))
        .unwrap();
        assert_eq!(pick_field(&item, COVER_FIELDS), Some(&Value::Null));

        let item: ListItem = serde_json::from_value(json!({
            "Cover_x0020_Image": r#"{"fileName":"real.png"}"#
        }))
        .unwrap();
        assert_eq!(
            pick_field(&item, COVER_FIELDS),
            Some(&json!(r#"{"fileName":"real.png"}"#))
        );
        assert_eq!(pick_field(&item, THUMBNAIL_FIELDS), None);
    }

    #[test]
    fn attachment_match_is_exact() {
        let attachments = vec![
            Attachment {
                file_name: "a.png".into(),
                server_relative_url: "/att/a.png".into(),
            },
            Attachment {
                file_name: "b.png".into(),
                server_relative_url: "/att/b.png".into(),
            },
        ];
        assert_eq!(
            find_attachment(&attachments, "b.png").map(|a| a.server_relative_url.as_str()),
            Some("/att/b.png")
        );
        assert!(find_attachment(&attachments, "c.png").is_none());
        assert!(find_attachment(&attachments, "B.png").is_none());
    }

    #[test]
    fn enrich_adds_derived_image_columns() {
        let item: ListItem = serde_json::from_value(json!({
            "Id": 4,
            "Thumbnail": "https://cdn/t.png",
            "CoverImage": {
                "serverUrl": "https://contoso.sharepoint.com",
                "serverRelativeUrl": "/sites/uc/c.png"
            }
        }))
        .unwrap();
        let enriched = enrich_use_case(item);
        assert_eq!(enriched.get("ThumbnailUrl"), Some(&json!("https://cdn/t.png")));
        assert_eq!(enriched.get("ThumbnailServerRelativeUrl"), Some(&Value::Null));
        assert_eq!(
            enriched.get("CoverImageUrl"),
            Some(&json!("https://contoso.sharepoint.com/sites/uc/c.png"))
        );
        assert_eq!(
            enriched.get("CoverImageServerRelativeUrl"),
            Some(&json!("/sites/uc/c.png"))
        );
        assert_eq!(enriched.get("Id"), Some(&json!(4)));
    }

    #[test]
    fn content_type_and_extension_helpers() {
        assert_eq!(guess_content_type("A.PNG"), "image/png");
        assert_eq!(guess_content_type("b.jpeg"), "image/jpeg");
        assert_eq!(guess_content_type("c.webp"), "image/webp");
        assert_eq!(guess_content_type("d.bmp"), "application/octet-stream");
        assert_eq!(guess_content_type("noext"), "application/octet-stream");

        assert_eq!(file_extension("Cover.PNG"), "png");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("noext"), "jpg");
        assert_eq!(file_extension("weird.j-g"), "jpg");
    }

    #[test]
    fn image_kind_parsing() {
        assert_eq!(ImageKind::parse(Some("COVER")), ImageKind::Cover);
        assert_eq!(ImageKind::parse(Some("banner")), ImageKind::Thumbnail);
        assert_eq!(ImageKind::parse(None), ImageKind::Thumbnail);
        assert_eq!(ImageKind::Cover.column(), "Cover_x0020_Image");
    }
}
