use std::path::Path;

use chrono::NaiveDate;

use crate::content::DATE_FORMAT;

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const CHANGE_FREQUENCY: &str = "monthly";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: NaiveDate,
}

/// `sitemap.xml` entries collected during one build.
#[derive(Debug, Default)]
pub struct Sitemap {
    entries: Vec<SitemapEntry>,
}

impl Sitemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: Into<String>>(&mut self, loc: S, lastmod: NaiveDate) {
        self.entries.push(SitemapEntry {
            loc: loc.into(),
            lastmod,
        });
    }

    pub fn entries(&self) -> &[SitemapEntry] {
        &self.entries
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push_str(&format!(r#"<urlset xmlns="{}">"#, SITEMAP_NAMESPACE));
        for entry in &self.entries {
            xml.push_str(&format!(
                "<url><loc>{}</loc><changefreq>{}</changefreq><lastmod>{}</lastmod></url>",
                html_escape::encode_text(&entry.loc),
                CHANGE_FREQUENCY,
                entry.lastmod.format(DATE_FORMAT)
            ));
        }
        xml.push_str("</urlset>");
        xml
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        crate::section::write_output(path, &self.to_xml())
    }
}
