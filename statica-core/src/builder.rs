use serde::Serialize;
use serde::ser::SerializeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use log::info;
use tera::Context;

use crate::cleaner::Cleaner;
use crate::config::{ConfigError, SiteConfig};
use crate::content::{ContentItem, DATE_FORMAT};
use crate::loader::LoadError;
use crate::minify::minify;
use crate::section::{SectionRenderer, write_output};
use crate::sitemap::Sitemap;
use crate::template::{TemplateError, TemplateRenderer};

pub const HOME_TEMPLATE: &str = "home.html";
pub const SITEMAP_FILE: &str = "sitemap.xml";

#[derive(Debug)]
pub enum BuildError {
    ConfigError(ConfigError),
    LoadError(LoadError),
    TemplateError(TemplateError),
    IoError(std::io::Error),
}

impl From<ConfigError> for BuildError {
    fn from(err: ConfigError) -> Self {
        BuildError::ConfigError(err)
    }
}

impl From<LoadError> for BuildError {
    fn from(err: LoadError) -> Self {
        BuildError::LoadError(err)
    }
}

impl From<TemplateError> for BuildError {
    fn from(err: TemplateError) -> Self {
        BuildError::TemplateError(err)
    }
}

impl From<std::io::Error> for BuildError {
    fn from(err: std::io::Error) -> Self {
        BuildError::IoError(err)
    }
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::ConfigError(e) => write!(f, "Config error: {}", e),
            BuildError::LoadError(e) => write!(f, "Content error: {}", e),
            BuildError::TemplateError(e) => write!(f, "{}", e),
            BuildError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for BuildError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Cleaning,
    Building,
    Failed,
}

/// Section name to published items, in declared section order. Only lives
/// for the homepage render.
#[derive(Debug, Default)]
pub struct SiteModel {
    sections: Vec<(String, Vec<ContentItem>)>,
}

impl SiteModel {
    pub fn insert(&mut self, section: &str, items: Vec<ContentItem>) {
        self.sections.retain(|(name, _)| name != section);
        self.sections.push((section.to_string(), items));
    }
}

impl Serialize for SiteModel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (name, items) in &self.sections {
            map.serialize_entry(name, items)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
struct SiteGlobals<'a> {
    base_url: &'a str,
    sections: &'a [String],
    build_date: String,
}

/// Counts from one successful build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub sections: Vec<(String, usize)>,
    pub files_written: usize,
    pub sitemap_entries: usize,
    pub elapsed: Duration,
}

/// Runs full builds of one configured site.
pub struct Site {
    config: SiteConfig,
    state: BuildState,
}

impl Site {
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            state: BuildState::Idle,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Only observable between builds, so this is `Idle` or `Failed`;
    /// `build` holds the site exclusively while cleaning and building.
    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir.clone()
    }

    /// Clean, render every section, then the homepage and the sitemap.
    ///
    /// Nothing is rolled back on failure; files written before the error stay
    /// on disk and the site is left in [`BuildState::Failed`] until the next
    /// call.
    pub fn build(&mut self) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let result = self.run_build(Local::now().date_naive());

        match result {
            Ok(mut report) => {
                self.state = BuildState::Idle;
                report.elapsed = started.elapsed();
                info!("Build time: {:?}", report.elapsed);
                Ok(report)
            }
            Err(e) => {
                self.state = BuildState::Failed;
                Err(e)
            }
        }
    }

    fn run_build(&mut self, today: NaiveDate) -> Result<BuildReport, BuildError> {
        self.config.validate()?;

        self.state = BuildState::Cleaning;
        Cleaner::from_config(&self.config).clean()?;

        self.state = BuildState::Building;
        info!("Building site...");

        // Reloaded every build so template edits show up in watch mode
        let mut renderer = TemplateRenderer::new(&self.config.templates_dir)?;
        renderer.add_to_context(
            "site",
            &SiteGlobals {
                base_url: &self.config.base_url,
                sections: &self.config.sections,
                build_date: today.format(DATE_FORMAT).to_string(),
            },
        );

        let mut report = BuildReport::default();
        let mut model = SiteModel::default();
        let mut sitemap = Sitemap::new();
        let base_url = self.config.base_url.trim_end_matches('/');

        let sections = SectionRenderer::new(&self.config, &renderer);
        for section in self.config.section_list() {
            let (items, written) = sections.render(&section)?;

            if !section.is_pages() {
                for item in &items {
                    sitemap.push(format!("{}{}", base_url, item.url), today);
                }
            }

            report.sections.push((section.name().to_string(), items.len()));
            report.files_written += written;
            model.insert(section.name(), items);
        }

        let mut context = Context::new();
        context.insert("items", &model);
        let html = renderer.render(HOME_TEMPLATE, &context)?;
        write_output(&self.config.output_dir.join("index.html"), &minify(&html))?;
        report.files_written += 1;

        if self.config.sitemap {
            sitemap.write(&self.config.output_dir.join(SITEMAP_FILE))?;
            report.files_written += 1;
            report.sitemap_entries = sitemap.entries().len();
        }

        Ok(report)
    }
}
