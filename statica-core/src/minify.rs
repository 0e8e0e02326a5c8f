use std::sync::LazyLock;

use regex::Regex;

// Whitespace inside these elements is significant
static PRESERVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b.*?</pre>|<textarea\b.*?</textarea>|<script\b.*?</script>|<style\b.*?</style>")
        .unwrap()
});
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strips comments and collapses whitespace, leaving `pre`, `textarea`,
/// `script` and `style` contents untouched.
pub fn minify(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for block in PRESERVED.find_iter(html) {
        out.push_str(&collapse(&html[last..block.start()]));
        out.push_str(block.as_str());
        last = block.end();
    }
    out.push_str(&collapse(&html[last..]));

    out.trim().to_string()
}

fn collapse(fragment: &str) -> String {
    let fragment = COMMENT.replace_all(fragment, "");
    let fragment = BETWEEN_TAGS.replace_all(&fragment, "><");
    WHITESPACE.replace_all(&fragment, " ").into_owned()
}
