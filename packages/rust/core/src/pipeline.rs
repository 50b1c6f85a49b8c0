//! Navigation data pipeline: raw JSON → normalized model → filtered model.
//!
//! Every stage is pure and total. Malformed optional fields degrade to
//! defaults instead of failing; required fields are the loader's job
//! (see [`crate::loader`]).

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use navsphere_shared::{
    Appearance, Category, LinkItem, LinkTarget, LoadedData, NavigationSettings, NavigationTree,
    RawCategory, RawLinkItem, RawNavigation, RawSubcategory, RawVideoConfig, SiteConfig,
    Subcategory, Theme, VideoEmbed, VideoPlatform,
};

/// Page shown when a bilibili embed does not name one.
pub const DEFAULT_VIDEO_PAGE: u32 = 1;

// ---------------------------------------------------------------------------
// Site
// ---------------------------------------------------------------------------

/// Normalize raw site settings of any shape.
///
/// `appearance.theme` and `navigation.linkTarget` are clamped to their
/// enums by exact string match. Every other field, including the siblings
/// of those two inside their blocks, is passed through untouched.
pub fn normalize_site(raw: &Value) -> SiteConfig {
    let mut extra = raw.as_object().cloned().unwrap_or_default();

    let mut appearance = object_fields(extra.remove("appearance"));
    let theme = Theme::from_raw(appearance.remove("theme").as_ref());

    let mut navigation = object_fields(extra.remove("navigation"));
    let link_target = LinkTarget::from_raw(navigation.remove("linkTarget").as_ref());

    SiteConfig {
        appearance: Appearance {
            theme,
            extra: appearance,
        },
        navigation: NavigationSettings {
            link_target,
            extra: navigation,
        },
        extra,
    }
}

/// Fields of a JSON object; anything else counts as empty.
fn object_fields(value: Option<Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Normalize a single link, resolving its video embed if it has one.
pub fn normalize_link_item(raw: &RawLinkItem) -> LinkItem {
    LinkItem {
        id: raw.id.clone(),
        title: raw.title.clone(),
        href: raw.href.clone(),
        description: raw.description.clone(),
        icon: raw.icon.clone(),
        enabled: raw.enabled.clone(),
        video_config: raw
            .video_config
            .as_ref()
            .map(|video| normalize_video(&raw.id, video)),
    }
}

/// Resolve the embed platform and copy every id field across.
///
/// An unrecognised `type` falls back to bilibili. The fields are copied
/// as-is, so a youtube `videoId` can end up on a bilibili embed.
fn normalize_video(item_id: &str, raw: &RawVideoConfig) -> VideoEmbed {
    let platform = VideoPlatform::from_raw(raw.kind.as_ref());

    let recognised = matches!(
        raw.kind.as_ref().and_then(Value::as_str),
        Some("bilibili" | "youtube")
    );
    if !recognised {
        warn!(
            item = item_id,
            kind = ?raw.kind,
            "unrecognised video type, treating as bilibili"
        );
    }

    let p = match platform {
        VideoPlatform::Bilibili => Some(raw.p.unwrap_or(DEFAULT_VIDEO_PAGE)),
        VideoPlatform::Youtube => raw.p,
    };

    VideoEmbed {
        platform,
        video_id: raw.video_id.clone(),
        bvid: raw.bvid.clone(),
        aid: raw.aid.clone(),
        cid: raw.cid.clone(),
        p,
    }
}

fn normalize_links(items: Option<&[RawLinkItem]>) -> Option<Vec<LinkItem>> {
    items.map(|items| items.iter().map(normalize_link_item).collect())
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Normalize every link in the tree, keeping order and nesting exactly.
///
/// A category or subcategory without `items` / `subCategories` keeps the
/// field absent rather than gaining an empty list.
pub fn normalize_tree(raw: &RawNavigation) -> NavigationTree {
    NavigationTree {
        navigation_items: raw.navigation_items.iter().map(normalize_category).collect(),
    }
}

fn normalize_category(raw: &RawCategory) -> Category {
    Category {
        id: raw.id.clone(),
        title: raw.title.clone(),
        icon: raw.icon.clone(),
        description: raw.description.clone(),
        enabled: raw.enabled.clone(),
        items: normalize_links(raw.items.as_deref()),
        sub_categories: raw
            .sub_categories
            .as_ref()
            .map(|subs| subs.iter().map(normalize_subcategory).collect()),
        extra: raw.extra.clone(),
    }
}

fn normalize_subcategory(raw: &RawSubcategory) -> Subcategory {
    Subcategory {
        id: raw.id.clone(),
        title: raw.title.clone(),
        icon: raw.icon.clone(),
        description: raw.description.clone(),
        parent_id: raw.parent_id.clone(),
        enabled: raw.enabled.clone(),
        items: normalize_links(raw.items.as_deref()),
        extra: raw.extra.clone(),
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Drop every category, subcategory and link whose `enabled` is literally
/// `false`.
///
/// Filtering is per node. A parent left with no surviving children stays in
/// the output as an empty container.
pub fn filter_tree(tree: &NavigationTree) -> NavigationTree {
    let navigation_items = tree
        .navigation_items
        .iter()
        .filter(|category| !category.enabled.is_disabled())
        .map(|category| Category {
            id: category.id.clone(),
            title: category.title.clone(),
            icon: category.icon.clone(),
            description: category.description.clone(),
            enabled: category.enabled.clone(),
            items: filter_links(category.items.as_deref()),
            sub_categories: category.sub_categories.as_ref().map(|subs| {
                subs.iter()
                    .filter(|sub| !sub.enabled.is_disabled())
                    .map(filter_subcategory)
                    .collect()
            }),
            extra: category.extra.clone(),
        })
        .collect();

    NavigationTree { navigation_items }
}

fn filter_subcategory(sub: &Subcategory) -> Subcategory {
    Subcategory {
        id: sub.id.clone(),
        title: sub.title.clone(),
        icon: sub.icon.clone(),
        description: sub.description.clone(),
        parent_id: sub.parent_id.clone(),
        enabled: sub.enabled.clone(),
        items: filter_links(sub.items.as_deref()),
        extra: sub.extra.clone(),
    }
}

fn filter_links(items: Option<&[LinkItem]>) -> Option<Vec<LinkItem>> {
    items.map(|items| {
        items
            .iter()
            .filter(|item| !item.enabled.is_disabled())
            .cloned()
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run the full pipeline: normalize the site, normalize the tree, then filter.
///
/// Normalization never touches `enabled`, so filtering sees the source values.
#[instrument(skip_all, fields(categories = raw_tree.navigation_items.len()))]
pub fn load(raw_tree: &RawNavigation, raw_site: &Value) -> LoadedData {
    let site = normalize_site(raw_site);
    let normalized = normalize_tree(raw_tree);
    let tree = filter_tree(&normalized);

    let before = normalized.stats();
    let after = tree.stats();
    debug!(
        theme = site.appearance.theme.as_str(),
        link_target = site.navigation.link_target.as_str(),
        links_in = before.links,
        links_out = after.links,
        removed = before.disabled,
        "navigation data loaded"
    );

    LoadedData { site, tree }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
