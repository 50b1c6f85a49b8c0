//! Navigation data pipeline and domain logic for NavSphere.
//!
//! This crate turns raw `navigation.json` / `site.json` documents into the
//! normalized, filtered model the rendering layer consumes (see [`pipeline::load`]).

pub mod embed;
pub mod icon;
pub mod loader;
pub mod pipeline;

pub use loader::{load_files, parse_navigation, parse_site, read_navigation, read_site};
pub use pipeline::{filter_tree, load, normalize_link_item, normalize_site, normalize_tree};
