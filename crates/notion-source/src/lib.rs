//! Typed access to Notion database queries.
//!
//! [`NotionClient`] posts to the database query endpoint and follows
//! pagination cursors until every page has been fetched. Pages are decoded
//! into [`Page`] values whose properties are an explicit [`PropertyValue`]
//! sum type; transport, auth headers and pagination stay inside this crate.

pub mod client;
pub mod error;
pub mod model;

pub use client::{MAX_PAGE_SIZE, NOTION_API_BASE, NOTION_VERSION, NotionClient};
pub use error::SourceError;
pub use model::{
    CreatedBy, DateValue, FormulaValue, Page, Person, PropertyValue, QueryResponse, RichText,
    SelectOption,
};
