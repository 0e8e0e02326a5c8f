use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use statica_core::{BuildError, LoadError, Site, SiteConfig, TemplateError};
use tempfile::TempDir;
use walkdir::WalkDir;

fn write(path: PathBuf, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A two-section site declared out of alphabetical order: `pages`, then
/// `blog` with a draft.
fn setup_site() -> (TempDir, SiteConfig) {
    let tmp = TempDir::new().unwrap();
    let mut config = SiteConfig::rooted_at(tmp.path()).with_sections(["pages", "blog"]);
    config.base_url = "https://example.com".to_string();

    let templates = &config.templates_dir;
    write(
        templates.join("blog_show.html"),
        "<html>\n  <body>\n    <h1>{{ item.title }}</h1>\n    {{ item.body | safe }}\n  </body>\n</html>\n",
    );
    write(
        templates.join("blog_list.html"),
        "<ul>{% for item in items %}<li>{{ item.slug }}|{{ item.date }}</li>{% endfor %}</ul>",
    );
    write(templates.join("pages.html"), "<main>{{ item.title }}</main>");
    write(
        templates.join("home.html"),
        "{% for name, section in items %}<section id=\"{{ name }}\">{% for item in section %}<a>{{ item.slug }}</a>{% endfor %}</section>{% endfor %}",
    );

    let blog = config.content_dir.join("blog");
    write(blog.join("first.md"), "---\ntitle: First\ndate: 2024-01-01\ntags: a, b\n---\nHello *world*\n");
    write(blog.join("second.md"), "title: Second\ndate: 2024-03-01\n\nLater post\n");
    write(blog.join("oldest.md"), "title: Oldest\ndate: 2023-12-31\n\nOld post\n");
    write(blog.join("secret.md"), "title: Secret\ndate: 2024-06-01\ndraft: true\n\nNot yet\n");
    write(config.content_dir.join("pages/about.md"), "title: About\ndate: 2020-01-01\n\nAbout me\n");

    write(config.assets_input.join("css/site.css"), "body { margin: 0 }");
    write(config.static_dir.join("robots.txt"), "User-agent: *");

    (tmp, config)
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, fs::read(e.path()).unwrap())
        })
        .collect()
}

#[test]
fn test_full_build_layout() {
    let (_tmp, config) = setup_site();
    let out = config.output_dir.clone();

    let report = Site::new(config).build().unwrap();

    let files: Vec<PathBuf> = snapshot(&out).into_keys().collect();
    let expected: Vec<PathBuf> = [
        "about/index.html",
        "assets/css/site.css",
        "blog/first/index.html",
        "blog/index.html",
        "blog/oldest/index.html",
        "blog/second/index.html",
        "index.html",
        "robots.txt",
        "sitemap.xml",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();
    assert_eq!(files, expected);

    assert_eq!(report.sections, vec![("pages".to_string(), 1), ("blog".to_string(), 3)]);
    assert_eq!(report.sitemap_entries, 3);
}

#[test]
fn test_item_pages_are_minified_markdown() {
    let (_tmp, config) = setup_site();
    let out = config.output_dir.clone();
    Site::new(config).build().unwrap();

    assert_eq!(
        read(&out, "blog/first/index.html"),
        "<html><body><h1>First</h1><p>Hello <em>world</em></p></body></html>"
    );
    assert_eq!(read(&out, "about/index.html"), "<main>About</main>");
}

#[test]
fn test_listing_and_homepage_follow_declared_order_without_drafts() {
    let (_tmp, config) = setup_site();
    let out = config.output_dir.clone();
    Site::new(config).build().unwrap();

    assert_eq!(
        read(&out, "blog/index.html"),
        "<ul><li>second|2024-03-01</li><li>first|2024-01-01</li><li>oldest|2023-12-31</li></ul>"
    );
    assert_eq!(
        read(&out, "index.html"),
        "<section id=\"pages\"><a>about</a></section><section id=\"blog\"><a>second</a><a>first</a><a>oldest</a></section>"
    );
    assert!(!out.join("blog/secret").exists());
}

#[test]
fn test_sitemap_lists_published_section_items() {
    let (_tmp, config) = setup_site();
    let out = config.output_dir.clone();
    Site::new(config).build().unwrap();

    let sitemap = read(&out, "sitemap.xml");
    assert!(sitemap.starts_with(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#
    ));
    assert_eq!(sitemap.matches("<url>").count(), 3);
    assert!(sitemap.contains("<loc>https://example.com/blog/second/</loc><changefreq>monthly</changefreq>"));
    assert!(!sitemap.contains("secret"));
    assert!(!sitemap.contains("about"));
}

#[test]
fn test_rebuild_is_byte_identical_and_not_cumulative() {
    let (_tmp, config) = setup_site();
    let out = config.output_dir.clone();
    let mut site = Site::new(config);

    site.build().unwrap();
    let first = snapshot(&out);
    site.build().unwrap();
    let second = snapshot(&out);

    assert_eq!(first, second);
    assert_eq!(read(&out, "sitemap.xml").matches("<url>").count(), 3);
}

#[test]
fn test_stale_output_is_removed() {
    let (_tmp, config) = setup_site();
    let out = config.output_dir.clone();
    write(out.join("blog/deleted-post/index.html"), "stale");
    write(out.join("old.html"), "stale");

    Site::new(config).build().unwrap();

    assert!(!out.join("blog/deleted-post").exists());
    assert!(!out.join("old.html").exists());
    assert!(out.join("blog/first/index.html").is_file());
}

#[test]
fn test_draft_toggle_removes_published_page() {
    let (_tmp, config) = setup_site();
    let out = config.output_dir.clone();
    let post = config.content_dir.join("blog/first.md");
    let mut site = Site::new(config);

    site.build().unwrap();
    assert!(out.join("blog/first/index.html").is_file());

    write(post, "title: First\ndate: 2024-01-01\ndraft: true\n\nHello\n");
    site.build().unwrap();
    assert!(!out.join("blog/first").exists());
    assert!(!read(&out, "index.html").contains("<a>first</a>"));
}

#[test]
fn test_missing_section_template_aborts_build() {
    let (_tmp, config) = setup_site();
    fs::remove_file(config.templates_dir.join("blog_list.html")).unwrap();
    let out = config.output_dir.clone();

    let err = Site::new(config).build().unwrap_err();

    match err {
        BuildError::TemplateError(TemplateError::NotFound(name)) => assert_eq!(name, "blog_list.html"),
        other => panic!("expected missing template, got {}", other),
    }
    // Pages written before the failure are left in place
    assert!(out.join("blog/first/index.html").is_file());
    assert!(!out.join("index.html").exists());
}

#[test]
fn test_bad_date_aborts_build() {
    let (_tmp, config) = setup_site();
    write(config.content_dir.join("blog/typo.md"), "title: Typo\ndate: 2024-13-45\n\n");

    let err = Site::new(config).build().unwrap_err();
    assert!(matches!(err, BuildError::LoadError(LoadError::ParseError { .. })));
    assert!(err.to_string().contains("typo.md"));
}
