//! Loading raw navigation and site documents.
//!
//! The pipeline assumes every required field is present. This module is
//! where that is enforced: documents are checked field by field (so errors
//! can name the offending JSON path) before being decoded into the raw
//! model.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use navsphere_shared::{LoadedData, NavSphereError, RawNavigation, Result};

use crate::pipeline;

/// Parse and check a `navigation.json` document.
#[instrument(skip_all, fields(len = json.len()))]
pub fn parse_navigation(json: &str) -> Result<RawNavigation> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| NavSphereError::parse(format!("navigation data: {e}")))?;

    check_navigation(&value)?;

    let raw: RawNavigation = serde_json::from_value(value)
        .map_err(|e| NavSphereError::validation(format!("navigation data: {e}")))?;

    warn_duplicate_ids(&raw);
    debug!(categories = raw.navigation_items.len(), "navigation data parsed");

    Ok(raw)
}

/// Parse a `site.json` document. Any JSON object is accepted.
pub fn parse_site(json: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| NavSphereError::parse(format!("site data: {e}")))?;

    if !value.is_object() {
        return Err(NavSphereError::validation(
            "site data: root must be a JSON object",
        ));
    }

    Ok(value)
}

/// Read and parse `navigation.json` from disk.
pub fn read_navigation(path: &Path) -> Result<RawNavigation> {
    let content = std::fs::read_to_string(path).map_err(|e| NavSphereError::io(path, e))?;
    parse_navigation(&content)
}

/// Read and parse `site.json` from disk.
pub fn read_site(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| NavSphereError::io(path, e))?;
    parse_site(&content)
}

/// Read both documents and run the pipeline over them.
#[instrument(skip_all, fields(navigation = %navigation_path.display(), site = %site_path.display()))]
pub fn load_files(navigation_path: &Path, site_path: &Path) -> Result<LoadedData> {
    let raw_tree = read_navigation(navigation_path)?;
    let raw_site = read_site(site_path)?;
    Ok(pipeline::load(&raw_tree, &raw_site))
}

// ---------------------------------------------------------------------------
// Required-field checks
// ---------------------------------------------------------------------------

fn check_navigation(root: &Value) -> Result<()> {
    let categories = root
        .get("navigationItems")
        .and_then(Value::as_array)
        .ok_or_else(|| NavSphereError::validation("navigationItems: expected an array"))?;

    for (i, category) in categories.iter().enumerate() {
        let path = format!("navigationItems[{i}]");
        check_node(category, &path, &["id", "title"])?;
        check_links(category, &path)?;

        if let Some(subs) = optional_array(category, "subCategories", &path)? {
            for (j, sub) in subs.iter().enumerate() {
                let sub_path = format!("{path}.subCategories[{j}]");
                check_node(sub, &sub_path, &["id", "title"])?;
                check_links(sub, &sub_path)?;
            }
        }
    }

    Ok(())
}

fn check_links(parent: &Value, path: &str) -> Result<()> {
    if let Some(items) = optional_array(parent, "items", path)? {
        for (k, item) in items.iter().enumerate() {
            check_node(item, &format!("{path}.items[{k}]"), &["id", "title", "href"])?;
        }
    }
    Ok(())
}

/// The node must be an object holding every `required` field as a string.
fn check_node(node: &Value, path: &str, required: &[&str]) -> Result<()> {
    let object = node
        .as_object()
        .ok_or_else(|| NavSphereError::validation(format!("{path}: expected an object")))?;

    for field in required {
        match object.get(*field) {
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(NavSphereError::validation(format!(
                    "{path}.{field}: expected a string"
                )));
            }
            None => {
                return Err(NavSphereError::validation(format!(
                    "{path}.{field}: missing required field"
                )));
            }
        }
    }

    Ok(())
}

/// An optional array field; `null` counts as absent.
fn optional_array<'a>(node: &'a Value, field: &str, path: &str) -> Result<Option<&'a Vec<Value>>> {
    match node.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(NavSphereError::validation(format!(
            "{path}.{field}: expected an array"
        ))),
    }
}

/// Ids are carried through verbatim; repeats are suspicious but not fatal.
fn warn_duplicate_ids(raw: &RawNavigation) {
    let mut seen = HashSet::new();
    let mut check = |id: &str| {
        if !seen.insert(id.to_string()) {
            warn!(id, "duplicate id in navigation data");
        }
    };

    for category in &raw.navigation_items {
        check(&category.id);
        for item in category.items.iter().flatten() {
            check(&item.id);
        }
        for sub in category.sub_categories.iter().flatten() {
            check(&sub.id);
            for item in sub.items.iter().flatten() {
                check(&item.id);
            }
        }
    }
}
