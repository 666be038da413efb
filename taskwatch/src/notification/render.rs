//! Embed rendering for change events.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::monitor::{ChangeEvent, ChangeKind, ReviewState};
use crate::snapshot::NO_STATUS;

pub const TASK_FIELD: &str = "Task";
pub const STATUS_FIELD: &str = "Status";
pub const REMINDER_FIELD: &str = "Task Reminder";

/// Fallback accent color when a template color cannot be parsed.
const DEFAULT_COLOR: u32 = 0x3498db;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

impl EmbedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
}

/// One rich message as accepted by chat webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    pub color: u32,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
}

/// Static text and color for one kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTemplate {
    pub title: &'static str,
    pub description: &'static str,
    /// Hex color without the leading `#`.
    pub color: &'static str,
}

pub fn template_for(kind: ChangeKind) -> MessageTemplate {
    match kind {
        ChangeKind::Created => MessageTemplate {
            title: "New task",
            description: "A new page was created in Notion! 👀",
            color: "00ffcc",
        },
        ChangeKind::StatusChanged(ReviewState::Approved)
        | ChangeKind::FlagToggled(ReviewState::Approved) => MessageTemplate {
            title: "Task approved",
            description: "This task has been Approved. ✅",
            color: "2ecc71",
        },
        ChangeKind::StatusChanged(ReviewState::Rejected)
        | ChangeKind::FlagToggled(ReviewState::Rejected) => MessageTemplate {
            title: "Resubmitted after rejection",
            description: "A Rejected task was submitted again. 🔁",
            color: "e74c3c",
        },
        ChangeKind::StatusChanged(ReviewState::InReview)
        | ChangeKind::FlagToggled(ReviewState::InReview) => MessageTemplate {
            title: "Submitted for review",
            description: "A task was submitted and is waiting for review. 📝",
            color: "f39c12",
        },
    }
}

/// Parse a `rrggbb` (optionally `#`-prefixed) color.
pub fn parse_color(hex: &str) -> u32 {
    let digits = hex.trim().trim_start_matches('#').trim_start_matches("0x");
    u32::from_str_radix(digits, 16).unwrap_or(DEFAULT_COLOR)
}

/// Drop fields that should not be shown and pull out the page title.
///
/// - `Task` is removed; its value is returned as the page title
/// - `Status` equal to the unset sentinel is removed
/// - `Task Reminder` with a blank value is removed
pub fn filter_fields(fields: Vec<EmbedField>) -> (Option<String>, Vec<EmbedField>) {
    let mut page_title = None;
    let mut kept = Vec::with_capacity(fields.len());

    for field in fields {
        match field.name.as_str() {
            TASK_FIELD => {
                page_title = Some(field.value);
            }
            STATUS_FIELD if field.value == NO_STATUS => {}
            REMINDER_FIELD if field.value.trim().is_empty() => {}
            _ => kept.push(field),
        }
    }

    (page_title.filter(|t| !t.is_empty()), kept)
}

/// Assemble an embed from raw parts, applying field filtering.
pub fn build_embed(
    template: MessageTemplate,
    url: &str,
    fields: Vec<EmbedField>,
    author: Option<&str>,
) -> Embed {
    let (page_title, fields) = filter_fields(fields);

    Embed {
        title: match page_title {
            Some(title) => format!("{title} 🔗"),
            None => template.title.to_string(),
        },
        description: template.description.to_string(),
        url: url.to_string(),
        color: parse_color(template.color),
        fields,
        author: author
            .filter(|name| !name.trim().is_empty())
            .map(|name| EmbedAuthor {
                name: name.to_string(),
            }),
    }
}

/// Render a change event into an embed.
pub fn render_event(event: &ChangeEvent) -> Embed {
    let entry = &event.entry;
    let fields = vec![
        EmbedField::new(TASK_FIELD, entry.title.as_str()),
        EmbedField::new(STATUS_FIELD, entry.status.as_str()),
        EmbedField::new(REMINDER_FIELD, entry.reminder.as_str()),
    ];

    build_embed(
        template_for(event.kind),
        &entry.url,
        fields,
        Some(entry.author.as_str()),
    )
}

/// Informational message announcing when the next poll is expected.
pub fn render_next_poll_notice(next_poll: DateTime<Tz>) -> Embed {
    Embed {
        title: "Page update notice".to_string(),
        description: format!(
            "Next update expected at: {}",
            next_poll.format("%Y-%m-%d %H:%M:%S")
        ),
        url: String::new(),
        color: parse_color("00ffcc"),
        fields: Vec::new(),
        author: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::NormalizedEntry;
    use chrono::TimeZone;

    fn event(kind: ChangeKind, title: &str, status: &str, reminder: &str) -> ChangeEvent {
        let mut entry = NormalizedEntry::new("x1");
        entry.title = title.to_string();
        entry.status = status.to_string();
        entry.reminder = reminder.to_string();
        entry.url = "https://www.notion.so/x1".to_string();
        entry.author = "Dana".to_string();
        ChangeEvent {
            kind,
            entry,
            previous: None,
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("00ffcc"), 0x00ffcc);
        assert_eq!(parse_color("#e74c3c"), 0xe74c3c);
        assert_eq!(parse_color("nope"), DEFAULT_COLOR);
    }

    #[test]
    fn test_filter_fields() {
        let (title, fields) = filter_fields(vec![
            EmbedField::new(TASK_FIELD, "Write docs"),
            EmbedField::new(STATUS_FIELD, NO_STATUS),
            EmbedField::new(REMINDER_FIELD, "   "),
            EmbedField::new("Owner", "Kim"),
        ]);

        assert_eq!(title.as_deref(), Some("Write docs"));
        assert_eq!(fields, vec![EmbedField::new("Owner", "Kim")]);
    }

    #[test]
    fn test_filter_keeps_meaningful_status_and_reminder() {
        let (title, fields) = filter_fields(vec![
            EmbedField::new(STATUS_FIELD, "In Progress"),
            EmbedField::new(REMINDER_FIELD, "D-2"),
        ]);

        assert_eq!(title, None);
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_render_created_event() {
        let embed = render_event(&event(ChangeKind::Created, "Do thing", NO_STATUS, ""));

        assert_eq!(embed.title, "Do thing 🔗");
        assert_eq!(embed.description, "A new page was created in Notion! 👀");
        assert_eq!(embed.color, 0x00ffcc);
        assert_eq!(embed.url, "https://www.notion.so/x1");
        assert!(embed.fields.is_empty());
        assert_eq!(embed.author.as_ref().map(|a| a.name.as_str()), Some("Dana"));
    }

    #[test]
    fn test_render_without_title_uses_template() {
        let embed = render_event(&event(
            ChangeKind::FlagToggled(ReviewState::InReview),
            "",
            "In Progress",
            "Tomorrow",
        ));

        assert_eq!(embed.title, "Submitted for review");
        assert_eq!(
            embed.fields,
            vec![
                EmbedField::new(STATUS_FIELD, "In Progress"),
                EmbedField::new(REMINDER_FIELD, "Tomorrow"),
            ]
        );
        assert!(embed.fields.iter().all(|f| f.name != TASK_FIELD));
    }

    #[test]
    fn test_serialized_shape() {
        let embed = render_event(&event(
            ChangeKind::StatusChanged(ReviewState::Approved),
            "Ship it",
            "Approved",
            "",
        ));
        let value = serde_json::to_value(&embed).unwrap();

        assert_eq!(value["title"], "Ship it 🔗");
        assert_eq!(value["color"], 0x2ecc71);
        assert_eq!(value["fields"][0]["name"], STATUS_FIELD);
        assert_eq!(value["fields"][0]["value"], "Approved");
        assert_eq!(value["author"]["name"], "Dana");
    }

    #[test]
    fn test_next_poll_notice() {
        let tz: Tz = "Asia/Seoul".parse().unwrap();
        let next = chrono::Utc
            .with_ymd_and_hms(2025, 5, 1, 0, 10, 0)
            .unwrap()
            .with_timezone(&tz);

        let embed = render_next_poll_notice(next);

        assert_eq!(embed.description, "Next update expected at: 2025-05-01 09:10:00");
        assert!(embed.author.is_none());
    }
}
