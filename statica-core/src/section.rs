use std::path::{Path, PathBuf};

use log::{debug, info};
use tera::Context;

use crate::builder::BuildError;
use crate::config::SiteConfig;
use crate::content::ContentItem;
use crate::loader::ContentLoader;
use crate::minify::minify;
use crate::pipeline::{filter_published, is_published, order};
use crate::template::TemplateRenderer;

/// Reserved section rendered with a single template, without a listing page
/// and straight into the output root.
pub const PAGES_SECTION: &str = "pages";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
}

impl Section {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_pages(&self) -> bool {
        self.name == PAGES_SECTION
    }

    pub fn show_template(&self) -> String {
        if self.is_pages() {
            format!("{}.html", PAGES_SECTION)
        } else {
            format!("{}_show.html", self.name)
        }
    }

    pub fn list_template(&self) -> Option<String> {
        (!self.is_pages()).then(|| format!("{}_list.html", self.name))
    }

    /// Optional plain-text listing, rendered only when the template exists.
    pub fn gemini_list_template(&self) -> Option<String> {
        (!self.is_pages()).then(|| format!("{}_list.gmi", self.name))
    }

    pub fn input_dir(&self, content_dir: &Path) -> PathBuf {
        content_dir.join(&self.name)
    }

    fn output_dir(&self, output_root: &Path) -> PathBuf {
        if self.is_pages() {
            output_root.to_path_buf()
        } else {
            output_root.join(&self.name)
        }
    }

    /// `{root}/{section}/{slug}/index.html`, or `{root}/{slug}/index.html`
    /// for pages.
    pub fn item_output_path(&self, output_root: &Path, slug: &str) -> PathBuf {
        self.output_dir(output_root).join(slug).join("index.html")
    }

    pub fn listing_output_path(&self, output_root: &Path, file_name: &str) -> PathBuf {
        self.output_dir(output_root).join(file_name)
    }

    pub fn item_url(&self, slug: &str) -> String {
        if self.is_pages() {
            format!("/{}/", slug)
        } else {
            format!("/{}/{}/", self.name, slug)
        }
    }
}

/// Renders one section: a page per published item and, outside `pages`, the
/// listing.
pub struct SectionRenderer<'a> {
    config: &'a SiteConfig,
    renderer: &'a TemplateRenderer,
}

impl<'a> SectionRenderer<'a> {
    pub fn new(config: &'a SiteConfig, renderer: &'a TemplateRenderer) -> Self {
        Self { config, renderer }
    }

    /// Returns the ordered, published items for the homepage model together
    /// with the number of files written.
    pub fn render(&self, section: &Section) -> Result<(Vec<ContentItem>, usize), BuildError> {
        let loader = ContentLoader::new(section.input_dir(&self.config.content_dir));
        let items = order(loader.load(section)?);
        let mut written = 0;

        for item in &items {
            if !is_published(item) {
                debug!("Skipping draft: {}/{}", section.name(), item.slug);
                continue;
            }
            info!("Processing: {}/{}", section.name(), item.slug);

            let mut context = Context::new();
            context.insert("item", item);

            let html = self.renderer.render(&section.show_template(), &context)?;
            let path = section.item_output_path(&self.config.output_dir, &item.slug);
            write_output(&path, &minify(&html))?;
            written += 1;
        }

        let published = filter_published(items);

        if let Some(template) = section.list_template() {
            let mut context = Context::new();
            context.insert("items", &published);

            let html = self.renderer.render(&template, &context)?;
            let path = section.listing_output_path(&self.config.output_dir, "index.html");
            write_output(&path, &minify(&html))?;
            written += 1;

            if let Some(gemini) = section.gemini_list_template()
                && self.renderer.has_template(&gemini)
            {
                let text = self.renderer.render(&gemini, &context)?;
                let path = section.listing_output_path(&self.config.output_dir, "index.gmi");
                write_output(&path, &text)?;
                written += 1;
            }
        }

        Ok((published, written))
    }
}

pub(crate) fn write_output(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}
