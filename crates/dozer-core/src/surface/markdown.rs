//! Markdown rendering with `pulldown-cmark`.

use super::MarkupRenderer;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Renders CommonMark (plus tables and strikethrough) to HTML.
///
/// Raw HTML in the source is escaped and shown as text, and links or images
/// with script URLs are neutralized.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self { options: Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH }
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_safe_url(url: &str) -> bool {
    let scheme = url.trim_start().to_ascii_lowercase();
    !(scheme.starts_with("javascript:")
        || scheme.starts_with("vbscript:")
        || scheme.starts_with("data:"))
}

fn sanitize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) if !is_safe_url(&dest_url) => {
            Event::Start(Tag::Link { link_type, dest_url: CowStr::Borrowed("#"), title, id })
        }
        Event::Start(Tag::Image { link_type, dest_url, title, id }) if !is_safe_url(&dest_url) => {
            Event::Start(Tag::Image { link_type, dest_url: CowStr::Borrowed(""), title, id })
        }
        other => other,
    }
}

impl MarkupRenderer for MarkdownRenderer {
    fn render(&self, markup: &str) -> String {
        let parser = Parser::new_ext(markup, self.options).map(sanitize);
        let mut out = String::with_capacity(markup.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markup: &str) -> String {
        MarkdownRenderer::new().render(markup)
    }

    #[test]
    fn test_renders_markdown() {
        assert_eq!(render("**hi**"), "<p><strong>hi</strong></p>\n");
        assert!(render("# Title").contains("<h1>Title</h1>"));
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_escapes_raw_html() {
        let out = render("<script>alert(1)</script>");
        assert!(!out.contains("<script>"));
        assert!(out.contains("&lt;script&gt;"));

        let inline = render("a <b onclick=\"x()\">b</b>");
        assert!(!inline.contains("<b "));
    }

    #[test]
    fn test_neutralizes_script_links() {
        let out = render("[x](javascript:alert(1))");
        assert!(out.contains("href=\"#\""));
        assert!(!out.contains("javascript:"));

        let ok = render("[x](https://example.com)");
        assert!(ok.contains("href=\"https://example.com\""));
    }

    #[test]
    fn test_tables_enabled() {
        let out = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(out.contains("<table>"));
    }
}
