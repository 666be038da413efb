//! Flattening of raw pages into [`NormalizedEntry`] values.
//!
//! Every extraction here is total: a missing property, an unexpected kind or
//! an empty payload falls back to the field's default instead of failing.

use notion_source::{Page, PropertyValue, RichText, SelectOption};
use tracing::debug;

use super::entry::{NO_STATUS, NormalizedEntry, Snapshot, UNKNOWN_AUTHOR};

/// Display names of the columns the task database is expected to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNames {
    pub title: String,
    pub status: String,
    pub reminder: String,
    pub flag: String,
    pub creator: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "Task".to_string(),
            status: "Status".to_string(),
            reminder: "Task Reminder".to_string(),
            flag: "Submitted".to_string(),
            creator: "Creator".to_string(),
        }
    }
}

/// Normalize one page.
pub fn normalize(page: &Page, names: &PropertyNames) -> NormalizedEntry {
    NormalizedEntry {
        id: page.id.clone(),
        title: title_text(page.property(&names.title)),
        status: status_name(page.property(&names.status)),
        reminder: reminder_text(page.property(&names.reminder)),
        flag: flag_value(page.property(&names.flag)),
        url: page.url.clone(),
        author: author_name(page, names),
    }
}

/// Normalize a full query result into a snapshot.
pub fn normalize_all(pages: &[Page], names: &PropertyNames) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for page in pages {
        if snapshot.insert(normalize(page, names)).is_some() {
            debug!(id = %page.id, "Duplicate page id in query result; keeping the last one");
        }
    }
    snapshot
}

fn title_text(value: Option<&PropertyValue>) -> String {
    match value {
        Some(PropertyValue::Title(segments)) => segments
            .first()
            .map(|segment| segment.plain_text.clone())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn option_name(option: &Option<SelectOption>) -> Option<&str> {
    option
        .as_ref()
        .and_then(|o| o.name.as_deref())
        .filter(|name| !name.trim().is_empty())
}

fn status_name(value: Option<&PropertyValue>) -> String {
    let name = match value {
        Some(PropertyValue::Status(option)) | Some(PropertyValue::Select(option)) => {
            option_name(option)
        }
        _ => None,
    };
    name.unwrap_or(NO_STATUS).to_string()
}

fn joined_text(segments: &[RichText]) -> String {
    segments.iter().map(|s| s.plain_text.as_str()).collect()
}

fn reminder_text(value: Option<&PropertyValue>) -> String {
    match value {
        Some(PropertyValue::Formula(formula)) => formula.display().unwrap_or_default(),
        Some(PropertyValue::RichText(segments)) => joined_text(segments),
        _ => String::new(),
    }
}

fn flag_value(value: Option<&PropertyValue>) -> bool {
    matches!(value, Some(PropertyValue::Checkbox(true)))
}

/// Creator property first, then record-level creation metadata.
fn author_name(page: &Page, names: &PropertyNames) -> String {
    let from_property = match page.property(&names.creator) {
        Some(PropertyValue::CreatedBy(person)) => person.display_name(),
        Some(PropertyValue::People(people)) => people.first().and_then(|p| p.display_name()),
        _ => None,
    };

    from_property
        .or_else(|| page.created_by.as_ref().and_then(|c| c.name()))
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn page(extra: Value) -> Page {
        let mut raw = json!({
            "id": "x1",
            "url": "https://www.notion.so/x1",
            "properties": {}
        });
        if let (Some(target), Some(extra)) = (raw.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(raw).unwrap()
    }

    fn normalize_default(page: &Page) -> NormalizedEntry {
        normalize(page, &PropertyNames::default())
    }

    #[test]
    fn test_empty_page_uses_defaults() {
        let entry = normalize_default(&page(json!({})));

        assert_eq!(entry.id, "x1");
        assert_eq!(entry.title, "");
        assert_eq!(entry.status, NO_STATUS);
        assert_eq!(entry.reminder, "");
        assert!(!entry.flag);
        assert_eq!(entry.url, "https://www.notion.so/x1");
        assert_eq!(entry.author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_full_page() {
        let entry = normalize_default(&page(json!({
            "properties": {
                "Task": { "type": "title", "title": [
                    { "plain_text": "Draft slides" },
                    { "plain_text": " (v2)" }
                ]},
                "Status": { "type": "status", "status": { "name": "In Progress" } },
                "Task Reminder": { "type": "formula", "formula": { "type": "string", "string": "Due tomorrow" } },
                "Submitted": { "type": "checkbox", "checkbox": true },
                "Creator": { "type": "created_by", "created_by": { "object": "user", "name": "Hana" } }
            }
        })));

        assert_eq!(entry.title, "Draft slides");
        assert_eq!(entry.status, "In Progress");
        assert_eq!(entry.reminder, "Due tomorrow");
        assert!(entry.flag);
        assert_eq!(entry.author, "Hana");
    }

    #[test]
    fn test_wrong_kinds_fall_back() {
        let entry = normalize_default(&page(json!({
            "properties": {
                "Task": { "type": "rich_text", "rich_text": [{ "plain_text": "not a title" }] },
                "Status": { "type": "checkbox", "checkbox": true },
                "Submitted": { "type": "status", "status": { "name": "Done" } },
                "Task Reminder": { "type": "date", "date": { "start": "2025-01-01" } }
            }
        })));

        assert_eq!(entry.title, "");
        assert_eq!(entry.status, NO_STATUS);
        assert!(!entry.flag);
        assert_eq!(entry.reminder, "");
    }

    #[test]
    fn test_status_without_name_is_sentinel() {
        let entry = normalize_default(&page(json!({
            "properties": { "Status": { "type": "status", "status": { "name": "  " } } }
        })));
        assert_eq!(entry.status, NO_STATUS);

        let entry = normalize_default(&page(json!({
            "properties": { "Status": { "type": "select", "select": { "name": "Rejected" } } }
        })));
        assert_eq!(entry.status, "Rejected");
    }

    #[test]
    fn test_author_from_people_property() {
        let entry = normalize_default(&page(json!({
            "created_by": { "object": "user", "name": "Record Creator" },
            "properties": {
                "Creator": { "type": "people", "people": [{ "name": "First" }, { "name": "Second" }] }
            }
        })));
        assert_eq!(entry.author, "First");
    }

    #[test]
    fn test_author_falls_back_to_record_metadata() {
        let single = normalize_default(&page(json!({
            "created_by": { "object": "user", "name": "Solo" },
            "properties": { "Creator": { "type": "people", "people": [] } }
        })));
        let list = normalize_default(&page(json!({
            "created_by": [{ "name": "Listed" }]
        })));
        let nameless = normalize_default(&page(json!({
            "created_by": { "object": "user", "id": "u-1" }
        })));

        assert_eq!(single.author, "Solo");
        assert_eq!(list.author, "Listed");
        assert_eq!(nameless.author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_rich_text_reminder() {
        let entry = normalize_default(&page(json!({
            "properties": { "Task Reminder": { "type": "rich_text", "rich_text": [
                { "plain_text": "Ping " }, { "plain_text": "Sam" }
            ]}}
        })));
        assert_eq!(entry.reminder, "Ping Sam");
    }

    #[test]
    fn test_normalize_all_keys_by_id() {
        let pages = vec![
            page(json!({ "id": "a" })),
            page(json!({ "id": "b" })),
            page(json!({ "id": "a", "url": "https://www.notion.so/a-2" })),
        ];

        let snapshot = normalize_all(&pages, &PropertyNames::default());

        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.get("a").map(|e| e.url.as_str()),
            Some("https://www.notion.so/a-2")
        );
    }
}
