//! Raw page model returned by the database query endpoint.
//!
//! Property values are decoded into [`PropertyValue`], a closed sum over the
//! property kinds this crate understands. Decoding a single property never
//! fails: unknown kinds and malformed payloads become
//! [`PropertyValue::Unsupported`] so one odd column cannot drop a whole page.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// One page (row) of a database.
///
/// Only `id` is mandatory. Every other field falls back to its default when
/// it is missing, null or of the wrong type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub created_time: Option<String>,
    /// Record-level creation metadata.
    #[serde(default)]
    pub created_by: Option<CreatedBy>,
    #[serde(default, deserialize_with = "lenient_properties")]
    pub properties: BTreeMap<String, PropertyValue>,
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_string(deserializer)?.unwrap_or_default())
}

fn lenient_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, PropertyValue>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(name, raw)| (name, PropertyValue::from(raw)))
            .collect()),
        _ => Ok(BTreeMap::new()),
    }
}

impl Page {
    /// Look up a property by its display name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// `(name, kind)` for every property, sorted by name.
    pub fn property_kinds(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value.kind()))
    }
}

/// Creation metadata, which appears either as a single user object or as a
/// list of users depending on the API surface that produced the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CreatedBy {
    One(Person),
    Many(Vec<Person>),
    Other(Value),
}

impl CreatedBy {
    /// Display name of the creator, if one is present.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::One(person) => person.display_name(),
            Self::Many(people) => people.first().and_then(Person::display_name),
            Self::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Person {
    /// The person's name, ignoring blank values.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DateValue {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// Result of a formula property.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaValue {
    String {
        #[serde(default)]
        string: Option<String>,
    },
    Number {
        #[serde(default)]
        number: Option<f64>,
    },
    Boolean {
        #[serde(default)]
        boolean: Option<bool>,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
    #[serde(other)]
    Unknown,
}

impl FormulaValue {
    /// Render the formula result the way it reads in the database view.
    pub fn display(&self) -> Option<String> {
        match self {
            Self::String { string } => string.clone(),
            Self::Number { number } => number.map(|n| n.to_string()),
            Self::Boolean { boolean } => boolean.map(|b| b.to_string()),
            Self::Date { date } => date.as_ref().and_then(|d| match (&d.start, &d.end) {
                (Some(start), Some(end)) => Some(format!("{start} → {end}")),
                (Some(start), None) => Some(start.clone()),
                _ => None,
            }),
            Self::Unknown => None,
        }
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Status(Option<SelectOption>),
    Select(Option<SelectOption>),
    Checkbox(bool),
    Formula(FormulaValue),
    People(Vec<Person>),
    CreatedBy(Person),
    /// Any kind not listed above, or a listed kind with an unreadable payload.
    Unsupported { kind: String },
}

impl PropertyValue {
    /// The `type` tag this value was decoded from.
    pub fn kind(&self) -> &str {
        match self {
            Self::Title(_) => "title",
            Self::RichText(_) => "rich_text",
            Self::Status(_) => "status",
            Self::Select(_) => "select",
            Self::Checkbox(_) => "checkbox",
            Self::Formula(_) => "formula",
            Self::People(_) => "people",
            Self::CreatedBy(_) => "created_by",
            Self::Unsupported { kind } => kind.as_str(),
        }
    }
}

/// Wire shape of the property kinds we decode.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TypedProperty {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Status {
        #[serde(default)]
        status: Option<SelectOption>,
    },
    Select {
        #[serde(default)]
        select: Option<SelectOption>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: Option<bool>,
    },
    Formula {
        formula: FormulaValue,
    },
    People {
        #[serde(default)]
        people: Vec<Person>,
    },
    CreatedBy {
        #[serde(default)]
        created_by: Person,
    },
}

impl From<TypedProperty> for PropertyValue {
    fn from(typed: TypedProperty) -> Self {
        match typed {
            TypedProperty::Title { title } => Self::Title(title),
            TypedProperty::RichText { rich_text } => Self::RichText(rich_text),
            TypedProperty::Status { status } => Self::Status(status),
            TypedProperty::Select { select } => Self::Select(select),
            TypedProperty::Checkbox { checkbox } => Self::Checkbox(checkbox.unwrap_or(false)),
            TypedProperty::Formula { formula } => Self::Formula(formula),
            TypedProperty::People { people } => Self::People(people),
            TypedProperty::CreatedBy { created_by } => Self::CreatedBy(created_by),
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match serde_json::from_value::<TypedProperty>(value) {
            Ok(typed) => typed.into(),
            Err(_) => Self::Unsupported { kind },
        }
    }
}

/// One response of the paginated query endpoint.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl QueryResponse {
    /// Decode the result objects, skipping any that cannot be keyed by id.
    pub fn into_pages(self) -> Vec<Page> {
        self.results
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value::<Page>(raw) {
                Ok(page) => Some(page),
                Err(error) => {
                    warn!(index, error = %error, "Skipping unreadable page in query result");
                    None
                }
            })
            .collect()
    }
}
