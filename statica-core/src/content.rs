use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use regex::Regex;
use serde::Serialize;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::section::Section;

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

static METADATA_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_-]*)\s*:\s*(.*)$").unwrap());

const HIGHLIGHT_THEME: &str = "base16-ocean.dark";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug)]
pub enum ParseError {
    MissingMetadata,
    MissingField(&'static str),
    InvalidDate { value: String, source: chrono::ParseError },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingMetadata => write!(f, "No metadata header found"),
            ParseError::MissingField(field) => write!(f, "Missing required metadata field '{}'", field),
            ParseError::InvalidDate { value, source } => {
                write!(f, "Invalid date '{}', expected YYYY-MM-DD: {}", value, source)
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::InvalidDate { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One parsed content file, shaped for templates.
///
/// Optional string fields default to `""`. `tags` and `images` always hold at
/// least one element: an empty or absent field yields `[""]`, which existing
/// templates rely on.
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    pub slug: String,
    pub section: String,
    /// Site-relative URL of the rendered page
    pub url: String,
    pub title: String,
    /// Verbatim `YYYY-MM-DD` string from the metadata
    pub date: String,
    #[serde(skip)]
    pub published_on: NaiveDate,
    pub subtitle: String,
    pub thumbnail: String,
    pub website: String,
    #[serde(rename = "bannerImage")]
    pub banner_image: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub draft: bool,
    /// Rendered HTML fragment
    pub body: String,
}

impl ContentItem {
    pub fn from_source(section: &Section, slug: &str, raw: &str) -> Result<Self, ParseError> {
        let (body, metadata) = parse(raw)?;
        let field = |key: &str| metadata.get(key).cloned().unwrap_or_default();

        let title = metadata
            .get("title")
            .cloned()
            .ok_or(ParseError::MissingField("title"))?;
        let date = metadata
            .get("date")
            .cloned()
            .ok_or(ParseError::MissingField("date"))?;
        let published_on = parse_date(&date)?;

        Ok(Self {
            slug: slug.to_string(),
            section: section.name().to_string(),
            url: section.item_url(slug),
            title,
            date,
            published_on,
            subtitle: field("subtitle"),
            thumbnail: field("thumbnail"),
            website: field("website"),
            banner_image: field("bannerImage"),
            tags: split_list(metadata.get("tags")),
            images: split_list(metadata.get("images")),
            draft: metadata.get("draft").is_some_and(|v| v == "true"),
            body,
        })
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| ParseError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

fn split_list(value: Option<&String>) -> Vec<String> {
    value
        .map(String::as_str)
        .unwrap_or("")
        .split(',')
        .map(|part| part.trim().to_string())
        .collect()
}

/// Splits a content file into its rendered HTML body and its metadata map.
pub fn parse(raw: &str) -> Result<(String, HashMap<String, String>), ParseError> {
    let (metadata, body) = split_metadata(raw).ok_or(ParseError::MissingMetadata)?;
    Ok((render_markdown(body), metadata))
}

/// Reads the metadata header. Either a block fenced by `---` lines, or bare
/// `key: value` lines at the top of the file up to the first line that is not
/// one.
fn split_metadata(raw: &str) -> Option<(HashMap<String, String>, &str)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut metadata = HashMap::new();
    let mut offset = 0;
    let mut lines = raw.split_inclusive('\n');

    let fenced = raw.lines().next().is_some_and(|l| l.trim() == "---");
    if fenced {
        offset += lines.next()?.len();
        let mut closed = false;
        for line in lines {
            offset += line.len();
            if line.trim() == "---" {
                closed = true;
                break;
            }
            if let Some((key, value)) = metadata_pair(line) {
                metadata.insert(key, value);
            }
        }
        if !closed {
            return None;
        }
    } else {
        for line in lines {
            let Some((key, value)) = metadata_pair(line) else {
                break;
            };
            metadata.insert(key, value);
            offset += line.len();
        }
    }

    if metadata.is_empty() {
        return None;
    }
    Some((metadata, &raw[offset..]))
}

fn metadata_pair(line: &str) -> Option<(String, String)> {
    let captures = METADATA_LINE.captures(line.trim_end())?;
    Some((captures[1].to_string(), captures[2].trim().to_string()))
}

fn render_markdown(content: &str) -> String {
    let parser = Parser::new_ext(content, Options::all());

    let events: Vec<Event> = parser.collect();
    let mut processed_events = Vec::with_capacity(events.len());
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => {
                let mut code_content = String::new();
                i += 1;

                while i < events.len() {
                    match &events[i] {
                        Event::End(TagEnd::CodeBlock) => break,
                        Event::Text(text) => code_content.push_str(text),
                        _ => {}
                    }
                    i += 1;
                }

                processed_events.push(Event::Html(highlight_code(lang, &code_content).into()));
            }
            event => processed_events.push(event.clone()),
        }
        i += 1;
    }

    let mut out = String::new();
    html::push_html(&mut out, processed_events.into_iter());
    out
}

fn highlight_code(lang: &str, code: &str) -> String {
    let plain = || format!("<pre><code>{}</code></pre>\n", html_escape::encode_text(code));

    let syntax = SYNTAX_SET.find_syntax_by_token(lang).or_else(|| match lang {
        "toml" => SYNTAX_SET.find_syntax_by_name("YAML"),
        _ => None,
    });

    match syntax {
        Some(syntax) => {
            let theme = &THEME_SET.themes[HIGHLIGHT_THEME];
            highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme).unwrap_or_else(|_| plain())
        }
        None => plain(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> Section {
        Section::new("blog")
    }

    #[test]
    fn test_fenced_metadata() {
        let raw = "---\ntitle: Hello\ndate: 2024-03-01\n---\nSome *text*\n";
        let (body, metadata) = parse(raw).unwrap();

        assert_eq!(metadata["title"], "Hello");
        assert_eq!(metadata["date"], "2024-03-01");
        assert_eq!(body, "<p>Some <em>text</em></p>\n");
    }

    #[test]
    fn test_bare_metadata_ends_at_blank_line() {
        let raw = "title: Hello: again\ndate: 2024-03-01\n\n# Heading\n";
        let (body, metadata) = parse(raw).unwrap();

        assert_eq!(metadata["title"], "Hello: again");
        assert_eq!(body, "<h1>Heading</h1>\n");
    }

    #[test]
    fn test_missing_metadata() {
        assert!(matches!(parse("# Just a heading\n"), Err(ParseError::MissingMetadata)));
        assert!(matches!(parse("---\ntitle: x\n"), Err(ParseError::MissingMetadata)));
        assert!(matches!(parse(""), Err(ParseError::MissingMetadata)));
    }

    #[test]
    fn test_item_defaults() {
        let item = ContentItem::from_source(&blog(), "hello", "title: Hi\ndate: 2024-01-01\n\nBody").unwrap();

        assert_eq!(item.slug, "hello");
        assert_eq!(item.url, "/blog/hello/");
        assert_eq!(item.subtitle, "");
        assert_eq!(item.banner_image, "");
        assert!(!item.draft);
        // Absent list fields still produce one empty element
        assert_eq!(item.tags, vec![""]);
        assert_eq!(item.images, vec![""]);
    }

    #[test]
    fn test_tags_are_split_and_trimmed() {
        let raw = "title: Hi\ndate: 2024-01-01\ntags: a, b\nimages: one.png ,two.png\n\n";
        let item = ContentItem::from_source(&blog(), "hi", raw).unwrap();

        assert_eq!(item.tags, vec!["a", "b"]);
        assert_eq!(item.images, vec!["one.png", "two.png"]);
    }

    #[test]
    fn test_empty_tags_yield_single_empty_string() {
        let raw = "title: Hi\ndate: 2024-01-01\ntags:\n\n";
        let item = ContentItem::from_source(&blog(), "hi", raw).unwrap();
        assert_eq!(item.tags, vec![""]);
    }

    #[test]
    fn test_draft_requires_literal_true() {
        for (value, expected) in [("true", true), ("True", false), ("yes", false), ("false", false)] {
            let raw = format!("title: Hi\ndate: 2024-01-01\ndraft: {}\n\n", value);
            let item = ContentItem::from_source(&blog(), "hi", &raw).unwrap();
            assert_eq!(item.draft, expected, "draft: {}", value);
        }
    }

    #[test]
    fn test_required_fields() {
        let err = ContentItem::from_source(&blog(), "x", "date: 2024-01-01\n\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingField("title")));

        let err = ContentItem::from_source(&blog(), "x", "title: X\n\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingField("date")));
    }

    #[test]
    fn test_invalid_date() {
        let err = ContentItem::from_source(&blog(), "x", "title: X\ndate: 01/02/2024\n\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidDate { .. }));
        assert!(err.to_string().contains("01/02/2024"));
    }

    #[test]
    fn test_banner_image_serializes_camel_case() {
        let raw = "title: Hi\ndate: 2024-01-01\nbannerImage: /b.png\n\n";
        let item = ContentItem::from_source(&blog(), "hi", raw).unwrap();
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["bannerImage"], "/b.png");
        assert!(value.get("published_on").is_none());
    }

    #[test]
    fn test_fenced_code_is_highlighted() {
        let raw = "title: Code\ndate: 2024-01-01\n\n```rust\nfn main() {}\n```\n";
        let (body, _) = parse(raw).unwrap();
        assert!(body.contains("<pre"));
        assert!(body.contains("main"));
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain_block() {
        let raw = "title: Code\ndate: 2024-01-01\n\n```nosuchlang\na < b\n```\n";
        let (body, _) = parse(raw).unwrap();
        assert!(body.contains("<pre><code>a &lt; b\n</code></pre>"));
    }
}
