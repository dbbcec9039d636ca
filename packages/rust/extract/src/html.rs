//! Plain text from HTML documents.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::normalize_whitespace;

/// What to drop and where to read from.
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Skip text inside `<script>`.
    pub strip_scripts: bool,
    /// Skip text inside `<style>`.
    pub strip_styles: bool,
    /// Read only `<body>`; otherwise the whole document (including `<title>`).
    pub body_only: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            strip_scripts: true,
            strip_styles: true,
            body_only: true,
        }
    }
}

/// Extract whitespace-collapsed text from an HTML document.
///
/// Inline text is concatenated as written; block-level elements and `<br>`
/// are separated by a space.
pub fn html_to_text(html: &str, opts: &HtmlOptions) -> String {
    static BODY_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("body").expect("valid selector"));

    let doc = Html::parse_document(html);
    let root = if opts.body_only {
        doc.select(&BODY_SEL).next().unwrap_or_else(|| doc.root_element())
    } else {
        doc.root_element()
    };

    let text = collect_text(root, opts);
    debug!(html_len = html.len(), text_len = text.len(), "html text extracted");
    text
}

fn collect_text(root: ElementRef<'_>, opts: &HtmlOptions) -> String {
    let mut out = String::new();
    walk(root, opts, &mut out);
    normalize_whitespace(&out)
}

fn walk(element: ElementRef<'_>, opts: &HtmlOptions, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if is_skipped(el.name(), opts) => {}
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = is_block(el.name());
                if block {
                    out.push(' ');
                }
                walk(child_el, opts, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "body"
            | "br"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "head"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "td"
            | "th"
            | "title"
            | "tr"
            | "ul"
    )
}

fn is_skipped(tag: &str, opts: &HtmlOptions) -> bool {
    match tag {
        "script" => opts.strip_scripts,
        "style" => opts.strip_styles,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
        <head><title>Page title</title><style>body { color: red; }</style></head>
        <body>
            <h1>Headline</h1>
            <script>var tracker = 1;</script>
            <p>First   paragraph.</p><p>Second&nbsp;paragraph.</p>
        </body></html>"#;

    #[test]
    fn strips_scripts_and_styles_from_body() {
        let text = html_to_text(PAGE, &HtmlOptions::default());
        assert_eq!(text, "Headline First paragraph. Second paragraph.");
    }

    #[test]
    fn scripts_kept_when_not_stripped() {
        let opts = HtmlOptions {
            strip_scripts: false,
            ..HtmlOptions::default()
        };
        let text = html_to_text(PAGE, &opts);
        assert!(text.contains("var tracker = 1;"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn whole_document_includes_head_title() {
        let opts = HtmlOptions {
            body_only: false,
            ..HtmlOptions::default()
        };
        let text = html_to_text(PAGE, &opts);
        assert!(text.starts_with("Page title"));
        assert!(text.contains("Headline"));
    }

    #[test]
    fn fragment_without_body_tag() {
        let text = html_to_text("<div>Just <b>a</b> fragment</div>", &HtmlOptions::default());
        assert_eq!(text, "Just a fragment");
    }

    #[test]
    fn inline_markup_does_not_split_words() {
        let html = "<body><p>Open<b>AI</b> выпустила Мос<i>кву</i></p></body>";
        let text = html_to_text(html, &HtmlOptions::default());
        assert_eq!(text, "OpenAI выпустила Москву");
    }

    #[test]
    fn block_elements_and_breaks_separate_words() {
        let html = "<body><div>one</div><div>two<br>three</div><ul><li>four</li><li>five</li></ul></body>";
        let text = html_to_text(html, &HtmlOptions::default());
        assert_eq!(text, "one two three four five");
    }

    #[test]
    fn empty_html_gives_empty_text() {
        assert_eq!(html_to_text("", &HtmlOptions::default()), "");
    }
}
