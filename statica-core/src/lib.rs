pub mod builder;
pub mod cleaner;
pub mod config;
pub mod content;
pub mod loader;
pub mod minify;
pub mod pipeline;
pub mod section;
pub mod sitemap;
pub mod template;
pub mod watcher;

// Re-export main types
pub use builder::{BuildError, BuildReport, BuildState, Site, SiteModel};
pub use cleaner::Cleaner;
pub use config::{ConfigError, SiteConfig};
pub use content::{ContentItem, ParseError};
pub use loader::{ContentLoader, LoadError};
pub use section::{Section, SectionRenderer, PAGES_SECTION};
pub use template::{TemplateError, TemplateRenderer};
pub use watcher::{ChangeWatcher, RebuildRequest, RebuildWorker, Watcher};
