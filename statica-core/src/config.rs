use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::section::Section;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing required setting: {}", key),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Resolved build settings. Constructed once at startup and handed to every
/// component that needs a path or a section list.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Root of everything the watcher observes
    pub src_dir: PathBuf,
    /// Deployable output tree, emptied on every build
    pub output_dir: PathBuf,
    /// Holds one subdirectory per section
    pub content_dir: PathBuf,
    /// Files copied flat into the output root
    pub static_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub assets_input: PathBuf,
    pub assets_output: PathBuf,
    /// Section names in render order; `pages` is reserved
    pub sections: Vec<String>,
    /// Prefix for sitemap locations, without trailing slash
    pub base_url: String,
    pub sitemap: bool,
    /// Watch mode coalesces filesystem events arriving within this window
    pub debounce: Duration,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("dist"),
            content_dir: PathBuf::from("src/content"),
            static_dir: PathBuf::from("src/static"),
            templates_dir: PathBuf::from("src/templates"),
            assets_input: PathBuf::from("src/assets"),
            assets_output: PathBuf::from("dist/assets"),
            sections: Vec::new(),
            base_url: "http://localhost:8000".to_string(),
            sitemap: true,
            debounce: Duration::from_secs(3),
        }
    }
}

impl SiteConfig {
    /// Default layout with every path placed under `root`.
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        Self::default().resolve_paths(root)
    }

    /// Joins every relative path onto `root`. Absolute paths are kept as is.
    pub fn resolve_paths<P: AsRef<Path>>(mut self, root: P) -> Self {
        let root = root.as_ref();
        for path in [
            &mut self.src_dir,
            &mut self.output_dir,
            &mut self.content_dir,
            &mut self.static_dir,
            &mut self.templates_dir,
            &mut self.assets_input,
            &mut self.assets_output,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    pub fn with_sections<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections = sections.into_iter().map(Into::into).collect();
        self
    }

    pub fn section_list(&self) -> Vec<Section> {
        self.sections.iter().map(Section::new).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("SRC_FOLDER", &self.src_dir),
            ("OUTPUT_PATH", &self.output_dir),
            ("INPUT_PATH", &self.content_dir),
            ("STATIC_FOLDER", &self.static_dir),
            ("TEMPLATES_FOLDER", &self.templates_dir),
            ("ASSETS_INPUT_PATH", &self.assets_input),
            ("ASSETS_OUTPUT_PATH", &self.assets_output),
        ];
        for (key, path) in required {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Missing(key));
            }
        }

        for name in &self.sections {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "SECTIONS contains an empty section name".to_string(),
                ));
            }
            if name.contains(['/', '\\']) || name == ".." {
                return Err(ConfigError::Invalid(format!(
                    "section name '{}' is not a plain directory name",
                    name
                )));
            }
        }

        if self.output_dir == self.src_dir {
            return Err(ConfigError::Invalid(
                "OUTPUT_PATH must differ from SRC_FOLDER".to_string(),
            ));
        }

        Ok(())
    }
}
