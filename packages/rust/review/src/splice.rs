//! Inserting an approved submission into the navigation document.
//!
//! Works on the raw `serde_json::Value` rather than the typed model so that
//! fields the model does not know about survive the rewrite untouched.

use serde_json::Value;
use tracing::{debug, warn};

use navsphere_shared::{EnabledFlag, NavSphereError, RawLinkItem, Result};

use crate::submission::Submission;

/// Where a new link ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Category { category: String },
    Subcategory { category: String, subcategory: String },
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category { category } => write!(f, "{category}"),
            Self::Subcategory {
                category,
                subcategory,
            } => write!(f, "{category}/{subcategory}"),
        }
    }
}

/// Build the link entry for an approved submission.
pub fn new_link_item(submission: &Submission, id: String, icon: &str) -> RawLinkItem {
    RawLinkItem {
        id,
        title: submission.title.clone(),
        href: submission.url.clone(),
        description: Some(submission.description.clone()),
        icon: Some(icon.to_string()),
        enabled: EnabledFlag::from(true),
        video_config: None,
    }
}

/// Append `item` to the category (and optionally subcategory) named by
/// `category` / `subcategory`, matching on either `id` or `title`.
///
/// An unknown category falls back to the first one. An unknown subcategory,
/// or a category without subcategories, falls back to the category's own
/// `items`. Missing `items` arrays are created.
pub fn insert_submission(
    navigation: &mut Value,
    item: &RawLinkItem,
    category: &str,
    subcategory: Option<&str>,
) -> Result<Placement> {
    let categories = navigation
        .get_mut("navigationItems")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| NavSphereError::validation("navigationItems: expected an array"))?;

    if categories.is_empty() {
        return Err(NavSphereError::validation(
            "navigation data has no categories to add to",
        ));
    }

    let index = match categories.iter().position(|c| matches_key(c, category)) {
        Some(index) => index,
        None => {
            warn!(category, "category not found, using the first category");
            0
        }
    };
    let target = &mut categories[index];
    let category_id = string_field(target, "id");

    let item = serde_json::to_value(item)
        .map_err(|e| NavSphereError::parse(format!("encoding new link: {e}")))?;

    if let Some(wanted) = subcategory.filter(|s| !s.is_empty()) {
        let found = target
            .get_mut("subCategories")
            .and_then(Value::as_array_mut)
            .and_then(|subs| subs.iter_mut().find(|s| matches_key(s, wanted)));

        if let Some(sub) = found {
            let subcategory_id = string_field(sub, "id");
            push_item(sub, item)?;
            return Ok(Placement::Subcategory {
                category: category_id,
                subcategory: subcategory_id,
            });
        }

        debug!(subcategory = wanted, "subcategory not found, adding to category");
    }

    push_item(target, item)?;
    Ok(Placement::Category {
        category: category_id,
    })
}

fn matches_key(node: &Value, key: &str) -> bool {
    ["id", "title"]
        .iter()
        .any(|field| node.get(*field).and_then(Value::as_str) == Some(key))
}

fn string_field(node: &Value, field: &str) -> String {
    node.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn push_item(node: &mut Value, item: Value) -> Result<()> {
    let object = node
        .as_object_mut()
        .ok_or_else(|| NavSphereError::validation("target node is not an object"))?;

    let items = object
        .entry("items")
        .or_insert_with(|| Value::Array(Vec::new()));
    if items.is_null() {
        *items = Value::Array(Vec::new());
    }

    match items {
        Value::Array(list) => {
            list.push(item);
            Ok(())
        }
        _ => Err(NavSphereError::validation("items: expected an array")),
    }
}
