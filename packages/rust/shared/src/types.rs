//! Core domain types for the navigation directory.
//!
//! Two families live here: the `Raw*` shapes decoded straight from
//! `navigation.json`, and the normalized shapes the pipeline hands to the
//! rendering layer. Both serialize to the same JSON layout.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

// ---------------------------------------------------------------------------
// Site settings
// ---------------------------------------------------------------------------

/// Colour scheme requested by the site owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Exact match against the allowed names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Clamp an arbitrary raw value, falling back to [`Theme::System`].
    pub fn from_raw(value: Option<&Value>) -> Self {
        value
            .and_then(Value::as_str)
            .and_then(Self::parse)
            .unwrap_or_default()
    }
}

/// Where outbound links open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkTarget {
    #[default]
    #[serde(rename = "_blank")]
    Blank,
    #[serde(rename = "_self")]
    Same,
}

impl LinkTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "_blank",
            Self::Same => "_self",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "_blank" => Some(Self::Blank),
            "_self" => Some(Self::Same),
            _ => None,
        }
    }

    /// Clamp an arbitrary raw value, falling back to [`LinkTarget::Blank`].
    pub fn from_raw(value: Option<&Value>) -> Self {
        value
            .and_then(Value::as_str)
            .and_then(Self::parse)
            .unwrap_or_default()
    }
}

/// `appearance` block of the site settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    #[serde(default)]
    pub theme: Theme,
    /// Unchecked sibling fields, carried through as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `navigation` block of the site settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSettings {
    #[serde(default)]
    pub link_target: LinkTarget,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized site-wide settings.
///
/// Everything except the two clamped enums is opaque metadata (title,
/// basic info, footer links, ...) and lives in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub appearance: Appearance,
    #[serde(default)]
    pub navigation: NavigationSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// EnabledFlag
// ---------------------------------------------------------------------------

/// The `enabled` field exactly as it appeared in the source document.
///
/// Only a literal `false` disables an entity. Absence, `null`, `true` and
/// values of any other type count as enabled and are written back unchanged
/// (`null` is written back as absent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnabledFlag(Option<Value>);

impl EnabledFlag {
    /// A flag whose field was not present at all.
    pub fn absent() -> Self {
        Self(None)
    }

    /// Wrap whatever value the source held.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self(None),
            other => Self(Some(other)),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    /// True only for a literal boolean `false`.
    pub fn is_disabled(&self) -> bool {
        matches!(self.0, Some(Value::Bool(false)))
    }

    /// The flag if it is an actual boolean.
    pub fn as_bool(&self) -> Option<bool> {
        self.0.as_ref().and_then(Value::as_bool)
    }
}

impl From<bool> for EnabledFlag {
    fn from(enabled: bool) -> Self {
        Self(Some(Value::Bool(enabled)))
    }
}

// ---------------------------------------------------------------------------
// Video embeds
// ---------------------------------------------------------------------------

/// Video host a link can embed a player for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoPlatform {
    #[default]
    Bilibili,
    Youtube,
}

impl VideoPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bilibili => "bilibili",
            Self::Youtube => "youtube",
        }
    }

    /// Resolve a raw `type` value. Anything other than the exact string
    /// `"youtube"` resolves to bilibili.
    pub fn from_raw(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("youtube") => Self::Youtube,
            _ => Self::Bilibili,
        }
    }
}

/// `videoConfig` as found in the source, before its type is checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVideoConfig {
    /// Unvalidated `type` value of any JSON type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub bvid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub aid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(default, deserialize_with = "lenient_page", skip_serializing_if = "Option::is_none")]
    pub p: Option<u32>,
}

/// Normalized inline player description for a link.
///
/// `platform` is always one of the known hosts. The id fields are copied
/// from the source whether or not they belong to the resolved platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEmbed {
    #[serde(rename = "type")]
    pub platform: VideoPlatform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bvid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    /// Page number within a multi-part upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<u32>,
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// A directory entry as stored in `navigation.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLinkItem {
    pub id: String,
    pub title: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "EnabledFlag::is_absent")]
    pub enabled: EnabledFlag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_config: Option<RawVideoConfig>,
}

/// A normalized directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkItem {
    pub id: String,
    pub title: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "EnabledFlag::is_absent")]
    pub enabled: EnabledFlag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_config: Option<VideoEmbed>,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Second-level grouping as stored in `navigation.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubcategory {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "EnabledFlag::is_absent")]
    pub enabled: EnabledFlag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<RawLinkItem>>,
    /// Fields the model does not know about, including any deeper nesting.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Top-level grouping as stored in `navigation.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCategory {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "EnabledFlag::is_absent")]
    pub enabled: EnabledFlag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<RawLinkItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_categories: Option<Vec<RawSubcategory>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Root of `navigation.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNavigation {
    pub navigation_items: Vec<RawCategory>,
}

/// Normalized second-level grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "EnabledFlag::is_absent")]
    pub enabled: EnabledFlag,
    /// `None` and `Some(vec![])` are distinct: the first means the source
    /// had no `items` field at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LinkItem>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized top-level grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "EnabledFlag::is_absent")]
    pub enabled: EnabledFlag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LinkItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_categories: Option<Vec<Subcategory>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized navigation tree, ordered as in the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTree {
    pub navigation_items: Vec<Category>,
}

/// Entity counts for a navigation tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub categories: usize,
    pub subcategories: usize,
    pub links: usize,
    /// Entities at any level whose `enabled` is literally `false`.
    pub disabled: usize,
    pub videos: usize,
}

impl NavigationTree {
    /// Count entities at every level.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();

        for category in &self.navigation_items {
            stats.categories += 1;
            if category.enabled.is_disabled() {
                stats.disabled += 1;
            }
            count_links(category.items.as_deref(), &mut stats);

            for sub in category.sub_categories.iter().flatten() {
                stats.subcategories += 1;
                if sub.enabled.is_disabled() {
                    stats.disabled += 1;
                }
                count_links(sub.items.as_deref(), &mut stats);
            }
        }

        stats
    }
}

fn count_links(items: Option<&[LinkItem]>, stats: &mut TreeStats) {
    for item in items.unwrap_or_default() {
        stats.links += 1;
        if item.enabled.is_disabled() {
            stats.disabled += 1;
        }
        if item.video_config.is_some() {
            stats.videos += 1;
        }
    }
}

/// Output of one pipeline run: settings plus the render-ready tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadedData {
    pub site: SiteConfig,
    pub tree: NavigationTree,
}

// ---------------------------------------------------------------------------
// Lenient scalar decoding
// ---------------------------------------------------------------------------

/// Accept a JSON string or number (numbers are stringified). `null` and
/// unusable values are `None`.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            warn!(value = %other, "ignoring video id that is not a string or number");
            None
        }
    })
}

/// Accept a positive page number given as a JSON number or numeric string.
/// Anything else is dropped so the platform default applies.
fn lenient_page<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };

    let parsed = match &value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    match parsed {
        Some(p) if p > 0 => Ok(Some(p)),
        _ => {
            warn!(value = %value, "ignoring video page that is not a positive integer");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn theme_and_link_target_clamp() {
        assert_eq!(Theme::from_raw(Some(&json!("dark"))), Theme::Dark);
        assert_eq!(Theme::from_raw(Some(&json!("Dark"))), Theme::System);
        assert_eq!(Theme::from_raw(Some(&json!(3))), Theme::System);
        assert_eq!(Theme::from_raw(None), Theme::System);

        assert_eq!(LinkTarget::from_raw(Some(&json!("_self"))), LinkTarget::Same);
        assert_eq!(LinkTarget::from_raw(Some(&json!("_top"))), LinkTarget::Blank);
    }

    #[test]
    fn enabled_flag_only_false_disables() {
        assert!(EnabledFlag::from(false).is_disabled());
        assert!(!EnabledFlag::from(true).is_disabled());
        assert!(!EnabledFlag::absent().is_disabled());
        assert!(!EnabledFlag::from_value(json!("false")).is_disabled());
        assert!(!EnabledFlag::from_value(json!(0)).is_disabled());
        assert!(EnabledFlag::from_value(Value::Null).is_absent());
    }

    #[test]
    fn enabled_flag_serializes_transparently() {
        let item: RawLinkItem = serde_json::from_value(json!({
            "id": "a", "title": "A", "href": "https://a.example", "enabled": "yes"
        }))
        .expect("deserialize");
        assert_eq!(item.enabled.as_bool(), None);

        let out = serde_json::to_value(&item).expect("serialize");
        assert_eq!(out["enabled"], json!("yes"));
    }

    #[test]
    fn absent_enabled_is_not_written() {
        let item: RawLinkItem = serde_json::from_value(json!({
            "id": "a", "title": "A", "href": "https://a.example"
        }))
        .expect("deserialize");
        assert!(item.enabled.is_absent());

        let out = serde_json::to_value(&item).expect("serialize");
        assert!(out.get("enabled").is_none());
    }

    #[test]
    fn video_config_accepts_numeric_ids() {
        let raw: RawVideoConfig = serde_json::from_value(json!({
            "type": "bilibili", "aid": 170001, "cid": "279786", "p": "2"
        }))
        .expect("deserialize");
        assert_eq!(raw.aid.as_deref(), Some("170001"));
        assert_eq!(raw.cid.as_deref(), Some("279786"));
        assert_eq!(raw.p, Some(2));
    }

    #[test]
    fn video_config_drops_unusable_values() {
        for p in [json!(0), json!(-1), json!(1.5), json!("x"), json!(true)] {
            let raw: RawVideoConfig = serde_json::from_value(json!({
                "type": "bilibili", "bvid": "BV1", "p": p.clone(), "aid": true, "cid": { "n": 1 }
            }))
            .expect("deserialize");
            assert_eq!(raw.p, None, "kept p = {p}");
            assert_eq!(raw.aid, None);
            assert_eq!(raw.cid, None);
            assert_eq!(raw.bvid.as_deref(), Some("BV1"));
        }
    }

    #[test]
    fn category_keeps_unknown_fields() {
        let raw: RawCategory = serde_json::from_value(json!({
            "id": "tools", "title": "Tools", "sortOrder": 4,
            "subCategories": [{ "id": "cli", "title": "CLI", "parentId": "tools" }]
        }))
        .expect("deserialize");
        assert_eq!(raw.extra.get("sortOrder"), Some(&json!(4)));
        assert!(raw.items.is_none());

        let subs = raw.sub_categories.as_ref().expect("subcategories");
        assert_eq!(subs[0].parent_id.as_deref(), Some("tools"));
        assert!(subs[0].extra.is_empty());
    }

    #[test]
    fn site_config_serializes_enum_names() {
        let site = SiteConfig {
            appearance: Appearance {
                theme: Theme::Dark,
                extra: Map::new(),
            },
            navigation: NavigationSettings {
                link_target: LinkTarget::Same,
                extra: Map::new(),
            },
            extra: Map::new(),
        };
        let value = serde_json::to_value(&site).expect("serialize");
        assert_eq!(value["appearance"]["theme"], json!("dark"));
        assert_eq!(value["navigation"]["linkTarget"], json!("_self"));
    }

    #[test]
    fn stats_counts_every_level() {
        let tree: NavigationTree = serde_json::from_value(json!({
            "navigationItems": [{
                "id": "c1", "title": "C1", "enabled": false,
                "items": [{ "id": "i1", "title": "I1", "href": "h", "enabled": true,
                            "videoConfig": { "type": "youtube", "videoId": "x" } }],
                "subCategories": [{
                    "id": "s1", "title": "S1",
                    "items": [{ "id": "i2", "title": "I2", "href": "h", "enabled": false }]
                }]
            }]
        }))
        .expect("deserialize");

        let stats = tree.stats();
        assert_eq!(stats.categories, 1);
        assert_eq!(stats.subcategories, 1);
        assert_eq!(stats.links, 2);
        assert_eq!(stats.disabled, 2);
        assert_eq!(stats.videos, 1);
    }
}
