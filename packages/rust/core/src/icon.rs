//! Icon and cover-image path resolution.

use navsphere_shared::{LinkItem, NavigationTree};

/// Directory local icon names are served from.
const ICON_DIR: &str = "/icons";

/// Named icons shipped with the site.
const KNOWN_ICONS: &[(&str, &str)] = &[
    ("search", "/icons/search.svg"),
    ("user", "/icons/user.svg"),
    ("linecons-desktop", "/icons/desktop.svg"),
];

/// Resolve an icon reference to a servable path.
///
/// Known names map to their bundled file, absolute http(s) URLs pass
/// through, bare names are placed under `/icons/`, and rooted paths are
/// returned unchanged.
pub fn resolve_icon_path(icon: Option<&str>) -> Option<String> {
    let icon = icon.filter(|s| !s.is_empty())?;

    if let Some((_, path)) = KNOWN_ICONS.iter().find(|(name, _)| *name == icon) {
        return Some((*path).to_string());
    }

    if icon.starts_with("http://") || icon.starts_with("https://") {
        return Some(icon.to_string());
    }

    if !icon.starts_with('/') {
        return Some(format!("{ICON_DIR}/{icon}"));
    }

    Some(icon.to_string())
}

/// Resolve a video card's cover image from the link icon.
///
/// Protocol-relative URLs are upgraded to https and local paths are rooted.
pub fn cover_image_url(icon: Option<&str>) -> Option<String> {
    let icon = icon.filter(|s| !s.is_empty())?;

    if let Some(rest) = icon.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }

    if icon.starts_with("http") || icon.starts_with('/') {
        return Some(icon.to_string());
    }

    Some(format!("/{icon}"))
}

/// Copy of `tree` with every icon passed through [`resolve_icon_path`].
pub fn resolve_tree_icons(tree: &NavigationTree) -> NavigationTree {
    let mut tree = tree.clone();

    for category in &mut tree.navigation_items {
        category.icon = resolve_icon_path(category.icon.as_deref());
        resolve_link_icons(category.items.as_deref_mut());

        for sub in category.sub_categories.iter_mut().flatten() {
            sub.icon = resolve_icon_path(sub.icon.as_deref());
            resolve_link_icons(sub.items.as_deref_mut());
        }
    }

    tree
}

fn resolve_link_icons(items: Option<&mut [LinkItem]>) {
    for item in items.into_iter().flatten() {
        item.icon = resolve_icon_path(item.icon.as_deref());
    }
}
