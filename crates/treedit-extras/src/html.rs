#![forbid(unsafe_code)]

//! Minimal HTML reader and writer for whole documents.
//!
//! The reader accepts the subset the writer produces plus common hand-written
//! markup:
//!
//! - elements, with `id` kept and other attributes ignored
//! - text content, with entities decoded and surrounding whitespace trimmed
//! - comments, `<!DOCTYPE ...>` and `<?...?>` declarations (skipped)
//! - void elements (`<br>`) and self-closing tags (`<p/>`)
//! - raw text in `<script>` and `<style>` (no child tags; entities are still
//!   decoded, since the writer escapes them)
//!
//! Elements without an `id` get `<tag>-<n>`, skipping ids already used in
//! the file. Text split around child elements is joined with one space.
//!
//! The reader never recurses, so deeply nested input cannot overflow the
//! stack.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use treedit_core::{Document, ElementSnapshot};

use crate::render::{is_void, render_markup};

/// Indent used when writing files.
pub const FILE_INDENT: usize = 2;

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// A positioned syntax error. Lines and columns start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct HtmlError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Serialize a document as an HTML file body.
#[must_use]
pub fn write_document(doc: &Document) -> String {
    let mut out = String::from("<!DOCTYPE html>\n");
    out.push_str(&render_markup(doc.root(), FILE_INDENT));
    out.push('\n');
    out
}

/// Parse markup into a root snapshot.
pub fn parse_document(src: &str) -> Result<ElementSnapshot, HtmlError> {
    let raw = Parser::new(src).run()?;
    Ok(assign_ids(raw))
}

// ============================================================================
// Cursor
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Position {
    line: usize,
    column: usize,
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn eat(&mut self, s: &str) -> bool {
        if !self.starts_with(s) {
            return false;
        }
        for _ in s.chars() {
            self.bump();
        }
        true
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Consume up to (not including) `needle`. Returns `None` at EOF.
    fn take_until(&mut self, needle: &str) -> Option<&'a str> {
        let start = self.pos;
        let offset = self.rest().find(needle)?;
        while self.pos < start + offset {
            self.bump();
        }
        Some(&self.src[start..self.pos])
    }

    /// Like [`take_until`](Self::take_until) with an ASCII case-insensitive needle.
    fn take_until_ignore_case(&mut self, needle: &str) -> Option<&'a str> {
        let start = self.pos;
        let lower = self.rest().to_ascii_lowercase();
        let offset = lower.find(&needle.to_ascii_lowercase())?;
        while self.pos < start + offset {
            self.bump();
        }
        Some(&self.src[start..self.pos])
    }
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug)]
struct RawElement {
    tag: String,
    id: Option<String>,
    text: Vec<String>,
    children: Vec<RawElement>,
}

impl Drop for RawElement {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

struct OpenElement {
    element: RawElement,
    at: Position,
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    stack: Vec<OpenElement>,
    root: Option<RawElement>,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            cursor: Cursor::new(src),
            stack: Vec::new(),
            root: None,
        }
    }

    fn error_at(at: Position, message: impl Into<String>) -> HtmlError {
        HtmlError {
            line: at.line,
            column: at.column,
            message: message.into(),
        }
    }

    fn error(&self, message: impl Into<String>) -> HtmlError {
        Self::error_at(self.cursor.position(), message)
    }

    fn run(mut self) -> Result<RawElement, HtmlError> {
        loop {
            if self.cursor.at_end() {
                if let Some(open) = self.stack.last() {
                    return Err(Self::error_at(
                        open.at,
                        format!("<{}> is never closed", open.element.tag),
                    ));
                }
                break;
            }

            let at = self.cursor.position();
            if self.cursor.eat("<!--") {
                if self.cursor.take_until("-->").is_none() {
                    return Err(Self::error_at(at, "unterminated comment"));
                }
                self.cursor.eat("-->");
            } else if self.cursor.starts_with("</") {
                self.close_tag()?;
            } else if self.cursor.starts_with("<!") || self.cursor.starts_with("<?") {
                if self.cursor.take_until(">").is_none() {
                    return Err(Self::error_at(at, "unterminated declaration"));
                }
                self.cursor.eat(">");
            } else if self.cursor.starts_with("<")
                && self.cursor.peek_second().is_some_and(|c| c.is_ascii_alphabetic())
            {
                self.open_tag()?;
            } else {
                self.text()?;
            }
        }

        let end = self.cursor.position();
        self.root
            .ok_or_else(|| Self::error_at(end, "no root element"))
    }

    fn attach(&mut self, element: RawElement) {
        match self.stack.last_mut() {
            Some(parent) => parent.element.children.push(element),
            None => self.root = Some(element),
        }
    }

    fn open_tag(&mut self) -> Result<(), HtmlError> {
        let at = self.cursor.position();
        self.cursor.bump();
        let tag = self.cursor.take_while(is_name_char).to_owned();

        if self.stack.is_empty() && self.root.is_some() {
            return Err(Self::error_at(
                at,
                format!("<{tag}> starts a second root element"),
            ));
        }

        let mut id = None;
        let mut self_closing = false;
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.eat("/>") {
                self_closing = true;
                break;
            }
            if self.cursor.eat(">") {
                break;
            }
            match self.cursor.peek() {
                None => return Err(Self::error_at(at, format!("unterminated tag <{tag}"))),
                Some(c) if c == '/' || c == '=' || c == '<' => {
                    return Err(self.error(format!("unexpected '{c}' in <{tag}>")));
                }
                Some(_) => {}
            }

            let name = self
                .cursor
                .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '<'))
                .to_owned();
            self.cursor.skip_whitespace();
            let value = if self.cursor.eat("=") {
                self.cursor.skip_whitespace();
                self.attribute_value(&tag)?
            } else {
                String::new()
            };
            if name.eq_ignore_ascii_case("id") {
                id = Some(decode_entities(&value));
            }
        }

        let element = RawElement {
            tag,
            id,
            text: Vec::new(),
            children: Vec::new(),
        };

        if self_closing || is_void(&element.tag) {
            self.attach(element);
            return Ok(());
        }

        let raw_text = RAW_TEXT_TAGS
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&element.tag));
        let close = format!("</{}", element.tag);
        self.stack.push(OpenElement { element, at });

        if raw_text {
            let body = self.cursor.take_until_ignore_case(&close).ok_or_else(|| {
                Self::error_at(at, format!("<{}> is never closed", &close[2..]))
            })?;
            let body = decode_entities(body);
            if !body.trim().is_empty() {
                if let Some(open) = self.stack.last_mut() {
                    open.element.text.push(body.trim().to_owned());
                }
            }
        }
        Ok(())
    }

    fn attribute_value(&mut self, tag: &str) -> Result<String, HtmlError> {
        let at = self.cursor.position();
        for quote in ['"', '\''] {
            if self.cursor.peek() == Some(quote) {
                self.cursor.bump();
                let value = self
                    .cursor
                    .take_until(&quote.to_string())
                    .ok_or_else(|| {
                        Self::error_at(at, format!("unterminated attribute value in <{tag}>"))
                    })?
                    .to_owned();
                self.cursor.bump();
                return Ok(value);
            }
        }
        Ok(self
            .cursor
            .take_while(|c| !c.is_whitespace() && c != '>')
            .to_owned())
    }

    fn close_tag(&mut self) -> Result<(), HtmlError> {
        let at = self.cursor.position();
        self.cursor.eat("</");
        let name = self.cursor.take_while(is_name_char).to_owned();
        self.cursor.skip_whitespace();
        if !self.cursor.eat(">") {
            return Err(self.error(format!("expected '>' to close </{name}")));
        }

        match self.stack.last() {
            Some(open) if open.element.tag.eq_ignore_ascii_case(&name) => {
                if let Some(open) = self.stack.pop() {
                    self.attach(open.element);
                }
                Ok(())
            }
            // Stray end tag for a void element: browsers ignore it too.
            _ if is_void(&name) => Ok(()),
            Some(open) => Err(Self::error_at(
                at,
                format!("expected </{}>, found </{name}>", open.element.tag),
            )),
            None => Err(Self::error_at(at, format!("unexpected </{name}>"))),
        }
    }

    fn text(&mut self) -> Result<(), HtmlError> {
        let at = self.cursor.position();
        let start = self.cursor.pos;
        // Always take the first char so a lone '<' makes progress.
        self.cursor.bump();
        loop {
            match self.cursor.peek() {
                None => break,
                Some('<')
                    if self
                        .cursor
                        .peek_second()
                        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')) =>
                {
                    break;
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
        let text = decode_entities(&self.cursor.src[start..self.cursor.pos]);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        match self.stack.last_mut() {
            Some(open) => {
                open.element.text.push(trimmed.to_owned());
                Ok(())
            }
            None => Err(Self::error_at(at, "text outside the root element")),
        }
    }
}

// ============================================================================
// Id assignment
// ============================================================================

fn assign_ids(root: RawElement) -> ElementSnapshot {
    let mut taken = HashSet::new();
    let mut pending = vec![&root];
    while let Some(el) = pending.pop() {
        if let Some(id) = &el.id {
            taken.insert(id.clone());
        }
        pending.extend(el.children.iter());
    }

    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut next_id = |tag: &str| -> String {
        let counter = counters.entry(tag.to_owned()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{tag}-{counter}");
            if taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    };

    // Ids are generated in document order, so convert pre-order with an
    // explicit stack and stitch children back bottom-up.
    struct Frame {
        snapshot: ElementSnapshot,
        children: std::vec::IntoIter<RawElement>,
    }

    let convert = |mut el: RawElement, next_id: &mut dyn FnMut(&str) -> String| -> Frame {
        let tag = std::mem::take(&mut el.tag);
        let id = el.id.take().unwrap_or_else(|| next_id(&tag));
        Frame {
            snapshot: ElementSnapshot::new(tag, id).with_text(el.text.join(" ")),
            children: std::mem::take(&mut el.children).into_iter(),
        }
    };

    let mut stack = vec![convert(root, &mut next_id)];
    while let Some(mut frame) = stack.pop() {
        match frame.children.next() {
            Some(child) => {
                stack.push(frame);
                stack.push(convert(child, &mut next_id));
            }
            None => match stack.last_mut() {
                Some(parent) => parent.snapshot.children.push(frame.snapshot),
                None => return frame.snapshot,
            },
        }
    }
    ElementSnapshot::default()
}

/// Decode named and numeric character references. Unknown references are
/// kept as written.
#[must_use]
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&end| end <= 10).and_then(|end| {
            let name = &rest[1..end];
            let c = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => {
                    let code = if let Some(hex) =
                        name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"))
                    {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = name.strip_prefix('#') {
                        dec.parse::<u32>().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            c.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
