//! Content page assembly from the Pages, Sections, SectionItems and Assets
//! lists.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;
use usecase_core::config::PageLists;
use usecase_core::models::{Asset, ListItem, Page, PageData, Section, SectionItem, join_key};
use usecase_core::sharepoint::odata::eq_filter;
use usecase_core::sharepoint::{ListQuery, ListRef, SharePointClient, SharePointError};

/// Loads the page for `slug`; `None` when no page has that slug.
pub async fn load_page(
    client: &SharePointClient,
    lists: &PageLists,
    slug: &str,
) -> Result<Option<PageData>, SharePointError> {
    let pages = client
        .get_list_items(
            &ListRef::title(&lists.pages),
            &ListQuery::new().filter(eq_filter("Slug", slug)).top(1),
        )
        .await?;
    let Some(page) = pages.first() else {
        return Ok(None);
    };

    let sections = client
        .get_list_items(
            &ListRef::title(&lists.sections),
            &ListQuery::new()
                .filter(eq_filter("PageSlug", slug))
                .orderby("SortOrder asc"),
        )
        .await?;

    let section_items = client
        .get_list_items(
            &ListRef::title(&lists.section_items),
            &ListQuery::new()
                .filter(eq_filter("PageSlug", slug))
                .orderby("SectionKey asc, SortOrder asc"),
        )
        .await?;

    let assets = client
        .get_list_items(&ListRef::title(&lists.assets), &ListQuery::new())
        .await?;

    debug!(
        slug,
        sections = sections.len(),
        items = section_items.len(),
        assets = assets.len(),
        "assembling page"
    );
    Ok(Some(assemble(page, &sections, &section_items, &assets)))
}

/// Builds the response from raw list rows.
///
/// Section items are attached to the section with the same `SectionKey`,
/// keeping their list order. Assets are keyed by `Key`; rows without one
/// are dropped.
pub fn assemble(
    page: &ListItem,
    sections: &[ListItem],
    section_items: &[ListItem],
    assets: &[ListItem],
) -> PageData {
    let mut grouped: HashMap<String, Vec<SectionItem>> = HashMap::new();
    for row in section_items {
        let item = SectionItem::from(row);
        if let Some(key) = item.section_key.as_ref().and_then(join_key) {
            grouped.entry(key).or_default().push(item);
        }
    }

    let sections = sections
        .iter()
        .map(|row| {
            let mut section = Section::from(row);
            if let Some(key) = section.section_key.as_ref().and_then(join_key) {
                section.items = grouped.get(&key).cloned().unwrap_or_default();
            }
            section
        })
        .collect();

    let mut by_key = Map::new();
    for row in assets {
        let asset = Asset::from(row);
        let Some(key) = asset.key.as_ref().and_then(join_key) else {
            debug!("skipping asset without Key");
            continue;
        };
        by_key.insert(key, serde_json::to_value(&asset).unwrap_or(Value::Null));
    }

    PageData {
        page: Page::from(page),
        sections,
        assets: by_key,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows(value: Value) -> Vec<ListItem> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn items_are_grouped_under_their_section() {
        let page = rows(json!([{"Id": 1, "Title": "About", "Slug": "about"}]));
        let sections = rows(json!([
            {"Id": 10, "SectionKey": "hero", "SortOrder": 1},
            {"Id": 11, "SectionKey": "faq", "SortOrder": 2},
            {"Id": 12, "SortOrder": 3}
        ]));
        let items = rows(json!([
            {"Id": 100, "SectionKey": "faq", "Title": "Q1", "SortOrder": 1},
            {"Id": 101, "SectionKey": "faq", "Title": "Q2", "SortOrder": 2},
            {"Id": 102, "SectionKey": "orphan"}
        ]));
        let assets = rows(json!([
            {"Key": "logo", "Url": "/logo.svg", "AltText": "Logo"},
            {"Title": "no key"}
        ]));

        let data = assemble(&page[0], &sections, &items, &assets);
        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(value["page"], json!({"id": 1, "title": "About", "slug": "about"}));
        assert_eq!(value["sections"][0]["items"], json!([]));
        assert_eq!(value["sections"][1]["items"][0]["title"], "Q1");
        assert_eq!(value["sections"][1]["items"][1]["title"], "Q2");
        assert_eq!(value["sections"][2]["items"], json!([]));
        assert_eq!(
            value["assets"],
            json!({"logo": {"key": "logo", "url": "/logo.svg", "altText": "Logo"}})
        );
    }
}
