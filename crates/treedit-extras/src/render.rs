#![forbid(unsafe_code)]

//! Text views of a document.
//!
//! Two views are provided:
//!
//! - **Tree view**: one line per element with guide characters.
//! - **Indented markup**: HTML-like, one tag per line, children nested
//!   `indent` spaces deeper. The file store writes this same form.
//!
//! # Example
//!
//! ```
//! use treedit_core::Document;
//! use treedit_extras::render::{TreeGuides, render_tree};
//!
//! let mut doc = Document::new();
//! doc.add_element("body", "b", "root", "").unwrap();
//! doc.add_element("p", "p1", "b", "Hi").unwrap();
//!
//! assert_eq!(
//!     render_tree(doc.root(), TreeGuides::Ascii),
//!     "html#root\n`-- body#b\n    `-- p#p1: Hi"
//! );
//! ```

use treedit_core::ElementRef;
use treedit_runtime::{DocumentRenderer, GuideStyle, MAX_INDENT};

/// Guide character styles for tree rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeGuides {
    /// ASCII guides: `|`, `+--`, `` `-- ``.
    Ascii,
    /// Unicode box-drawing characters (default).
    #[default]
    Unicode,
}

impl TreeGuides {
    /// Vertical continuation (ancestor has siblings below).
    #[must_use]
    pub const fn vertical(&self) -> &'static str {
        match self {
            Self::Ascii => "|   ",
            Self::Unicode => "\u{2502}   ",
        }
    }

    /// Branch guide (item has siblings below).
    #[must_use]
    pub const fn branch(&self) -> &'static str {
        match self {
            Self::Ascii => "+-- ",
            Self::Unicode => "\u{251C}\u{2500}\u{2500} ",
        }
    }

    /// Last-item guide (no siblings below).
    #[must_use]
    pub const fn last(&self) -> &'static str {
        match self {
            Self::Ascii => "`-- ",
            Self::Unicode => "\u{2514}\u{2500}\u{2500} ",
        }
    }

    /// Empty indentation (no guide needed).
    #[must_use]
    pub const fn space(&self) -> &'static str {
        "    "
    }
}

impl From<GuideStyle> for TreeGuides {
    fn from(style: GuideStyle) -> Self {
        match style {
            GuideStyle::Unicode => Self::Unicode,
            GuideStyle::Ascii => Self::Ascii,
        }
    }
}

/// [`DocumentRenderer`] backed by [`render_tree`] and [`render_markup`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeRenderer {
    guides: TreeGuides,
}

impl TreeRenderer {
    #[must_use]
    pub fn new(guides: TreeGuides) -> Self {
        Self { guides }
    }

    #[must_use]
    pub fn guides(&self) -> TreeGuides {
        self.guides
    }
}

impl DocumentRenderer for TreeRenderer {
    fn render_tree(&self, root: ElementRef<'_>) -> String {
        render_tree(root, self.guides)
    }

    fn render_indented(&self, root: ElementRef<'_>, indent: usize) -> String {
        render_markup(root, indent)
    }
}

// ============================================================================
// Tree view
// ============================================================================

/// Render `root` and its descendants, one `<tag>#<id>` line each, with
/// `: <text>` appended when the element has text.
#[must_use]
pub fn render_tree(root: ElementRef<'_>, guides: TreeGuides) -> String {
    let mut lines = Vec::new();
    // is_last[d] tells whether the ancestor at depth d + 1 closes its level.
    let mut is_last: Vec<bool> = Vec::with_capacity(8);
    let mut stack = vec![(root, 0usize, true)];

    while let Some((node, depth, last)) = stack.pop() {
        is_last.truncate(depth.saturating_sub(1));
        if depth > 0 {
            is_last.push(last);
        }

        let mut line = String::new();
        for (d, &last_at_depth) in is_last.iter().enumerate() {
            let guide = if d + 1 == depth {
                if last_at_depth {
                    guides.last()
                } else {
                    guides.branch()
                }
            } else if last_at_depth {
                guides.space()
            } else {
                guides.vertical()
            };
            line.push_str(guide);
        }
        line.push_str(node.tag());
        line.push('#');
        line.push_str(node.id());
        if !node.text().is_empty() {
            line.push_str(": ");
            line.push_str(&single_line(node.text()));
        }
        lines.push(line);

        let children: Vec<_> = node.children().collect();
        let child_count = children.len();
        stack.extend(
            children
                .into_iter()
                .enumerate()
                .rev()
                .map(|(i, child)| (child, depth + 1, i + 1 == child_count)),
        );
    }
    lines.join("\n")
}

/// Keep one element per line in the tree view.
fn single_line(text: &str) -> String {
    text.replace('\n', "\\n")
}

// ============================================================================
// Indented markup
// ============================================================================

/// Render `root` as indented markup.
///
/// ```text
/// <html id="root">
///   <p id="p1">
///     Hi
///   </p>
///   <br id="br-1">
/// </html>
/// ```
///
/// Elements with neither text nor children close on the same line; void
/// elements (`br`, `img`, ...) have no closing tag at all. `indent` is
/// clamped to [`MAX_INDENT`].
#[must_use]
pub fn render_markup(root: ElementRef<'_>, indent: usize) -> String {
    let indent = indent.min(MAX_INDENT);
    let mut out = String::new();
    let mut steps = vec![Step::Open(root, 0)];

    while let Some(step) = steps.pop() {
        let (node, depth) = match step {
            Step::Close(node, depth) => {
                push_line(&mut out, &" ".repeat(depth * indent), &format!("</{}>", node.tag()));
                continue;
            }
            Step::Open(node, depth) => (node, depth),
        };
        let pad = " ".repeat(depth * indent);
        let open = format!("<{} id=\"{}\">", node.tag(), escape(node.id()));
        let is_empty = node.text().is_empty() && node.child_count() == 0;

        if is_empty && is_void(node.tag()) {
            push_line(&mut out, &pad, &open);
            continue;
        }
        if is_empty {
            push_line(&mut out, &pad, &format!("{open}</{}>", node.tag()));
            continue;
        }

        push_line(&mut out, &pad, &open);
        if !node.text().is_empty() {
            let inner = " ".repeat((depth + 1) * indent);
            push_line(&mut out, &inner, &escape(node.text()));
        }
        steps.push(Step::Close(node, depth));
        steps.extend(node.children().rev().map(|child| Step::Open(child, depth + 1)));
    }

    if out.ends_with('\n') {
        out.pop();
    }
    out
}

enum Step<'a> {
    Open(ElementRef<'a>, usize),
    Close(ElementRef<'a>, usize),
}

fn push_line(out: &mut String, pad: &str, content: &str) {
    out.push_str(pad);
    out.push_str(content);
    out.push('\n');
}

fn escape(value: &str) -> String {
    v_htmlescape::escape(value).to_string()
}

/// HTML void elements: never have a closing tag.
pub(crate) const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_TAGS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use treedit_core::Document;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.add_element("head", "h", "root", "").unwrap();
        doc.add_element("title", "t", "h", "My Page").unwrap();
        doc.add_element("body", "b", "root", "").unwrap();
        doc.add_element("p", "p1", "b", "Hello").unwrap();
        doc.add_element("ul", "list", "b", "").unwrap();
        doc.add_element("li", "i1", "list", "one").unwrap();
        doc
    }

    #[test]
    fn test_tree_unicode_guides() {
        let doc = sample();
        let expected = [
            "html#root",
            "\u{251C}\u{2500}\u{2500} head#h",
            "\u{2502}   \u{2514}\u{2500}\u{2500} title#t: My Page",
            "\u{2514}\u{2500}\u{2500} body#b",
            "    \u{251C}\u{2500}\u{2500} p#p1: Hello",
            "    \u{2514}\u{2500}\u{2500} ul#list",
            "        \u{2514}\u{2500}\u{2500} li#i1: one",
        ]
        .join("\n");
        assert_eq!(render_tree(doc.root(), TreeGuides::Unicode), expected);
    }

    #[test]
    fn test_tree_ascii_guides() {
        let doc = sample();
        let rendered = render_tree(doc.root(), TreeGuides::Ascii);
        assert_eq!(rendered.lines().nth(2), Some("|   `-- title#t: My Page"));
        assert_eq!(rendered.lines().nth(3), Some("`-- body#b"));
    }

    #[test]
    fn test_tree_root_only() {
        let doc = Document::new();
        assert_eq!(render_tree(doc.root(), TreeGuides::default()), "html#root");
    }

    #[test]
    fn test_tree_keeps_multiline_text_on_one_line() {
        let mut doc = Document::new();
        doc.add_element("pre", "code", "root", "a\nb").unwrap();
        assert_eq!(
            render_tree(doc.root(), TreeGuides::Ascii),
            "html#root\n`-- pre#code: a\\nb"
        );
    }

    #[test]
    fn test_markup_default_indent() {
        let mut doc = Document::new();
        doc.add_element("body", "b", "root", "").unwrap();
        doc.add_element("p", "p1", "b", "Hi").unwrap();
        doc.add_element("div", "empty", "b", "").unwrap();
        doc.add_element("br", "br1", "b", "").unwrap();

        let expected = "\
<html id=\"root\">
  <body id=\"b\">
    <p id=\"p1\">
      Hi
    </p>
    <div id=\"empty\"></div>
    <br id=\"br1\">
  </body>
</html>";
        assert_eq!(render_markup(doc.root(), 2), expected);
    }

    #[test]
    fn test_markup_zero_indent_is_flat() {
        let mut doc = Document::new();
        doc.add_element("p", "p1", "root", "x").unwrap();
        assert_eq!(
            render_markup(doc.root(), 0),
            "<html id=\"root\">\n<p id=\"p1\">\nx\n</p>\n</html>"
        );
    }

    #[test]
    fn test_markup_escapes_text() {
        let mut doc = Document::new();
        doc.add_element("p", "p1", "root", "a < b & c").unwrap();
        let out = render_markup(doc.root(), 4);
        assert!(out.contains("        a &lt; b &amp; c"), "{out}");
    }

    #[test]
    fn test_markup_clamps_indent() {
        let mut doc = Document::new();
        doc.add_element("p", "p1", "root", "").unwrap();
        assert_eq!(
            render_markup(doc.root(), usize::MAX),
            render_markup(doc.root(), MAX_INDENT)
        );
    }

    #[test]
    fn test_deep_chain_renders_iteratively() {
        let mut doc = Document::new();
        let mut parent = String::from("root");
        for i in 0..20_000 {
            let id = format!("d{i}");
            doc.add_element("div", &id, &parent, "").unwrap();
            parent = id;
        }
        let markup = render_markup(doc.root(), 0);
        assert_eq!(markup.lines().count(), 2 * 20_000 + 1);
        assert!(markup.ends_with("</div>\n</html>"));

        let tree = render_tree(doc.get_element_by_id("d19990").unwrap(), TreeGuides::Ascii);
        assert_eq!(tree.lines().count(), 10);
        let last = format!("{}`-- div#d19999", " ".repeat(32));
        assert_eq!(tree.lines().last(), Some(last.as_str()));
    }

    #[test]
    fn test_renderer_uses_configured_guides() {
        let renderer = TreeRenderer::new(GuideStyle::Ascii.into());
        assert_eq!(renderer.guides(), TreeGuides::Ascii);
        let mut doc = Document::new();
        doc.add_element("p", "p1", "root", "").unwrap();
        assert_eq!(renderer.render_tree(doc.root()), "html#root\n`-- p#p1");
        assert_eq!(
            renderer.render_indented(doc.root(), 2),
            "<html id=\"root\">\n  <p id=\"p1\"></p>\n</html>"
        );
    }
}
