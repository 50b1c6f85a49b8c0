//! Shared types, error model, and configuration for NavSphere.
//!
//! This crate is the foundation depended on by all other NavSphere crates.
//! It provides:
//! - [`NavSphereError`]: the unified error type
//! - Domain types ([`SiteConfig`], [`NavigationTree`], [`Category`], [`LinkItem`], [`VideoEmbed`])
//!   and the raw shapes they are normalized from
//! - Configuration ([`AppConfig`], [`ReviewConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DataConfig, LabelsConfig, ReviewConfig, TrackerConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_token,
};
pub use error::{NavSphereError, Result};
pub use types::{
    Appearance, Category, EnabledFlag, LinkItem, LinkTarget, LoadedData, NavigationSettings,
    NavigationTree, RawCategory, RawLinkItem, RawNavigation, RawSubcategory, RawVideoConfig,
    SiteConfig, Subcategory, Theme, TreeStats, VideoEmbed, VideoPlatform,
};
