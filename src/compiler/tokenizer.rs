//! Tokenizer for the template markup.
//!
//! Walks the source once and emits flat tag/text/comment events into a
//! [`TokenSink`]; it never builds a tree. The tokenizer keeps its own open
//! tag stack purely for error recovery: mismatched or missing end tags are
//! healed here by synthesizing end events, so the sink always observes a
//! balanced stream.

use super::ast::Attribute;
use super::error::CompileError;

/// Tokenizer knobs. The tag predicates come from the platform description,
/// not from the language itself.
pub(crate) struct TokenizerOptions<'a> {
    /// Apply lenient HTML-style recovery (implicit closes, stray `</p>`).
    pub expect_html: bool,
    /// Also decode `&#10;` and `&#9;` in attribute values.
    pub should_decode_newlines: bool,
    /// Forward comment events instead of dropping them.
    pub keep_comments: bool,
    /// Tags that never take children and need no closing tag.
    pub is_void_tag: Option<&'a dyn Fn(&str) -> bool>,
    /// Tags a repeated open implicitly closes, such as `li`.
    pub can_be_left_open: Option<&'a dyn Fn(&str) -> bool>,
}

/// Receives the event stream.
pub(crate) trait TokenSink {
    fn start_tag(
        &mut self,
        tag: &str,
        attrs: Vec<Attribute>,
        self_closing: bool,
    ) -> Result<(), CompileError>;
    fn end_tag(&mut self, tag: &str) -> Result<(), CompileError>;
    fn text(&mut self, text: &str) -> Result<(), CompileError>;
    fn comment(&mut self, text: &str) -> Result<(), CompileError>;
}

/// Tokenizes `source`, driving `sink`. Stops early only on a fatal sink
/// error; malformed markup degrades to text instead of failing.
pub(crate) fn tokenize<S: TokenSink>(
    source: &str,
    options: &TokenizerOptions<'_>,
    sink: &mut S,
) -> Result<(), CompileError> {
    Tokenizer {
        source,
        pos: 0,
        options,
        sink,
        stack: Vec::new(),
    }
    .run()
}

struct OpenTag {
    tag: String,
    lower: String,
}

struct Tokenizer<'a, S: TokenSink> {
    source: &'a str,
    pos: usize,
    options: &'a TokenizerOptions<'a>,
    sink: &'a mut S,
    /// Open, not-yet-closed tags, used only for recovery.
    stack: Vec<OpenTag>,
}

impl<S: TokenSink> Tokenizer<'_, S> {
    fn run(&mut self) -> Result<(), CompileError> {
        let source = self.source;
        while self.pos < source.len() {
            if self
                .stack
                .last()
                .is_some_and(|open| is_raw_text_tag(&open.lower))
            {
                self.consume_raw_text()?;
                continue;
            }
            let rest = &source[self.pos..];
            match rest.find('<') {
                Some(0) if looks_like_markup(rest) => {
                    if !self.consume_markup()? {
                        // a construct opened but never completes; nothing
                        // left to resynchronize on
                        self.pos = source.len();
                        self.sink.text(rest)?;
                    }
                }
                Some(lt) => {
                    let end = text_end(rest, lt);
                    self.pos += end;
                    self.sink.text(&rest[..end])?;
                }
                None => {
                    self.pos = source.len();
                    self.sink.text(rest)?;
                }
            }
        }
        // unwind whatever was left open
        self.close_to(0)
    }

    /// Dispatches on the markup construct at the cursor. Returns `false`
    /// when the construct cannot be completed, leaving the cursor in place.
    fn consume_markup(&mut self) -> Result<bool, CompileError> {
        let source = self.source;
        let rest = &source[self.pos..];

        if let Some(tail) = rest.strip_prefix("<!--") {
            match tail.find("-->") {
                Some(end) => {
                    if self.options.keep_comments {
                        self.sink.comment(&tail[..end])?;
                    }
                    self.pos += 4 + end + 3;
                }
                None => {
                    self.pos = source.len();
                    self.sink.text(rest)?;
                }
            }
            return Ok(true);
        }

        if rest.starts_with("<![") {
            match rest.find("]>") {
                Some(end) => self.pos += end + 2,
                None => {
                    self.pos = source.len();
                    self.sink.text(rest)?;
                }
            }
            return Ok(true);
        }

        if rest.len() >= 9 && rest[..9].eq_ignore_ascii_case("<!doctype") {
            let Some(end) = rest.find('>') else {
                return Ok(false);
            };
            self.pos += end + 1;
            return Ok(true);
        }

        if let Some(tail) = rest.strip_prefix("</") {
            let name_len = tag_name_len(tail);
            if name_len == 0 {
                return Ok(false);
            }
            let Some(close) = tail[name_len..].find('>') else {
                return Ok(false);
            };
            self.pos += 2 + name_len + close + 1;
            self.close_tag(&tail[..name_len])?;
            return Ok(true);
        }

        self.consume_start_tag()
    }

    fn consume_start_tag(&mut self) -> Result<bool, CompileError> {
        let source = self.source;
        let rest = &source[self.pos..];
        let name_len = tag_name_len(&rest[1..]);
        if name_len == 0 {
            return Ok(false);
        }
        let tag = &rest[1..1 + name_len];
        let mut at = 1 + name_len;
        let mut attrs = Vec::new();
        loop {
            at += whitespace_len(&rest[at..]);
            let tail = &rest[at..];
            if tail.starts_with("/>") {
                self.pos += at + 2;
                return self.handle_start_tag(tag, attrs, true).map(|()| true);
            }
            if tail.starts_with('>') {
                self.pos += at + 1;
                return self.handle_start_tag(tag, attrs, false).map(|()| true);
            }
            let Some((attr, used)) =
                parse_attribute(tail, self.options.should_decode_newlines)
            else {
                return Ok(false);
            };
            attrs.push(attr);
            at += used;
        }
    }

    fn handle_start_tag(
        &mut self,
        tag: &str,
        attrs: Vec<Attribute>,
        self_closing: bool,
    ) -> Result<(), CompileError> {
        let lower = tag.to_ascii_lowercase();
        if self.options.expect_html
            && self.stack.last().is_some_and(|open| open.lower == lower)
            && self
                .options
                .can_be_left_open
                .is_some_and(|pred| pred(&lower))
        {
            self.close_tag(tag)?;
        }
        let unary = self_closing || self.options.is_void_tag.is_some_and(|pred| pred(&lower));
        if !unary {
            self.stack.push(OpenTag {
                tag: tag.to_string(),
                lower,
            });
        }
        self.sink.start_tag(tag, attrs, unary)
    }

    /// Handles an explicit end tag. A tag with no matching open falls back
    /// to the HTML-compatibility cases or is dropped.
    fn close_tag(&mut self, name: &str) -> Result<(), CompileError> {
        let lower = name.to_ascii_lowercase();
        match self.stack.iter().rposition(|open| open.lower == lower) {
            Some(keep) => self.close_to(keep),
            None if lower == "br" => self.sink.start_tag(name, Vec::new(), true),
            None if lower == "p" && self.options.expect_html => {
                self.sink.start_tag(name, Vec::new(), false)?;
                self.sink.end_tag(name)
            }
            None => Ok(()),
        }
    }

    /// Pops the stack down to `keep` entries, emitting an end event for
    /// each popped tag.
    fn close_to(&mut self, keep: usize) -> Result<(), CompileError> {
        while self.stack.len() > keep {
            if let Some(open) = self.stack.pop() {
                self.sink.end_tag(&open.tag)?;
            }
        }
        Ok(())
    }

    /// Content of a raw-text element runs verbatim to its own end tag.
    fn consume_raw_text(&mut self) -> Result<(), CompileError> {
        let source = self.source;
        let Some(lower) = self.stack.last().map(|open| open.lower.clone()) else {
            return Ok(());
        };
        let rest = &source[self.pos..];
        let needle = format!("</{lower}");
        match find_ignore_case(rest, &needle) {
            Some(at) => {
                if at > 0 {
                    self.sink.text(&rest[..at])?;
                }
                let tail = &rest[at + needle.len()..];
                let consumed = tail.find('>').map_or(tail.len(), |gt| gt + 1);
                self.pos += at + needle.len() + consumed;
                if let Some(open) = self.stack.pop() {
                    self.sink.end_tag(&open.tag)?;
                }
            }
            None => {
                self.pos = source.len();
                self.sink.text(rest)?;
            }
        }
        Ok(())
    }
}

/// Whether `rest` (positioned on a `<`) begins a construct the tokenizer
/// recognizes. Anything else is ordinary text.
fn looks_like_markup(rest: &str) -> bool {
    if rest.starts_with("<!--") || rest.starts_with("<![") {
        return true;
    }
    if rest.len() >= 9 && rest[..9].eq_ignore_ascii_case("<!doctype") {
        return true;
    }
    if let Some(tail) = rest.strip_prefix("</") {
        return tail.starts_with(is_tag_start);
    }
    rest[1..].starts_with(is_tag_start)
}

/// Scans forward from the `<` at `at` to the first `<` that begins real
/// markup, or to the end of `rest`.
fn text_end(rest: &str, mut at: usize) -> usize {
    loop {
        if looks_like_markup(&rest[at..]) {
            return at;
        }
        match rest[at + 1..].find('<') {
            Some(next) => at += 1 + next,
            None => return rest.len(),
        }
    }
}

/// Parses one attribute at the head of `input`. Returns the attribute and
/// the number of bytes consumed, or `None` when `input` does not start with
/// an attribute name (the enclosing tag is then malformed).
fn parse_attribute(input: &str, decode_newlines: bool) -> Option<(Attribute, usize)> {
    let name_len = input
        .bytes()
        .take_while(|b| {
            !b.is_ascii_whitespace() && !matches!(b, b'"' | b'\'' | b'<' | b'>' | b'/' | b'=')
        })
        .count();
    if name_len == 0 {
        return None;
    }
    let name = input[..name_len].to_string();
    let mut at = name_len;
    at += whitespace_len(&input[at..]);
    if !input[at..].starts_with('=') {
        // bare attribute, empty value
        return Some((
            Attribute {
                name,
                value: String::new(),
            },
            name_len,
        ));
    }
    at += 1;
    at += whitespace_len(&input[at..]);
    let tail = &input[at..];
    let raw = if let Some(quote) = tail.chars().next().filter(|c| matches!(c, '"' | '\'')) {
        let inner = &tail[1..];
        let end = inner.find(quote)?;
        at += 1 + end + 1;
        &inner[..end]
    } else {
        let end = tail
            .bytes()
            .position(|b| {
                b.is_ascii_whitespace() || matches!(b, b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
            })
            .unwrap_or(tail.len());
        if end == 0 {
            return None;
        }
        at += end;
        &tail[..end]
    };
    Some((
        Attribute {
            name,
            value: decode_attr(raw, decode_newlines),
        },
        at,
    ))
}

/// Undoes the character references the serializer is allowed to emit inside
/// attribute values. `&#10;`/`&#9;` only under the platform quirk flag.
fn decode_attr(value: &str, decode_newlines: bool) -> String {
    let mut out = value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    if decode_newlines {
        out = out.replace("&#10;", "\n").replace("&#9;", "\t");
    }
    out.replace("&amp;", "&")
}

/// Content of these elements is opaque text up to the matching end tag.
fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea")
}

fn is_tag_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn tag_name_len(s: &str) -> usize {
    s.bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':'))
        .count()
}

fn whitespace_len(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl TokenSink for Recorder {
        fn start_tag(
            &mut self,
            tag: &str,
            attrs: Vec<Attribute>,
            self_closing: bool,
        ) -> Result<(), CompileError> {
            let attrs: Vec<String> = attrs
                .iter()
                .map(|attr| format!("{}={}", attr.name, attr.value))
                .collect();
            let slash = if self_closing { "/" } else { "" };
            self.events
                .push(format!("start:{tag}[{}]{slash}", attrs.join(",")));
            Ok(())
        }

        fn end_tag(&mut self, tag: &str) -> Result<(), CompileError> {
            self.events.push(format!("end:{tag}"));
            Ok(())
        }

        fn text(&mut self, text: &str) -> Result<(), CompileError> {
            self.events.push(format!("text:{text}"));
            Ok(())
        }

        fn comment(&mut self, text: &str) -> Result<(), CompileError> {
            self.events.push(format!("comment:{text}"));
            Ok(())
        }
    }

    fn plain() -> TokenizerOptions<'static> {
        TokenizerOptions {
            expect_html: false,
            should_decode_newlines: false,
            keep_comments: false,
            is_void_tag: None,
            can_be_left_open: None,
        }
    }

    fn events_with(source: &str, options: &TokenizerOptions<'_>) -> Vec<String> {
        let mut recorder = Recorder::default();
        tokenize(source, options, &mut recorder).unwrap();
        recorder.events
    }

    fn events(source: &str) -> Vec<String> {
        events_with(source, &plain())
    }

    #[test]
    fn nested_tags_and_text() {
        assert_eq!(
            events("<view><text>hi</text></view>"),
            [
                "start:view[]",
                "start:text[]",
                "text:hi",
                "end:text",
                "end:view"
            ]
        );
    }

    #[test]
    fn attribute_forms() {
        assert_eq!(
            events("<input value=\"a\" alt='b' size=3 disabled/>"),
            ["start:input[value=a,alt=b,size=3,disabled=]/"]
        );
    }

    #[test]
    fn comments_are_dropped_unless_kept() {
        assert_eq!(events("<v><!-- hi --></v>"), ["start:v[]", "end:v"]);
        let options = TokenizerOptions {
            keep_comments: true,
            ..plain()
        };
        assert_eq!(
            events_with("<v><!-- hi --></v>", &options),
            ["start:v[]", "comment: hi ", "end:v"]
        );
    }

    #[test]
    fn attribute_entities_decode() {
        assert_eq!(
            events("<a title=\"a&lt;b&amp;c&#10;d\"/>"),
            ["start:a[title=a<b&c&#10;d]/"]
        );
        let options = TokenizerOptions {
            should_decode_newlines: true,
            ..plain()
        };
        assert_eq!(
            events_with("<a title=\"a&#10;b\"/>", &options),
            ["start:a[title=a\nb]/"]
        );
    }

    #[test]
    fn raw_text_content_is_opaque() {
        assert_eq!(
            events("<view><style>a<b { }</style></view>"),
            [
                "start:view[]",
                "start:style[]",
                "text:a<b { }",
                "end:style",
                "end:view"
            ]
        );
    }

    #[test]
    fn unclosed_tags_unwind_at_eof() {
        assert_eq!(events("<a><b>"), ["start:a[]", "start:b[]", "end:b", "end:a"]);
    }

    #[test]
    fn mismatched_end_tag_closes_intervening_tags() {
        assert_eq!(
            events("<a><b></a>"),
            ["start:a[]", "start:b[]", "end:b", "end:a"]
        );
    }

    #[test]
    fn stray_end_br_becomes_a_void_start() {
        assert_eq!(events("<a></br></a>"), ["start:a[]", "start:br[]/", "end:a"]);
    }

    #[test]
    fn stray_end_p_depends_on_html_mode() {
        assert_eq!(events("<a></p></a>"), ["start:a[]", "end:a"]);
        let options = TokenizerOptions {
            expect_html: true,
            ..plain()
        };
        assert_eq!(
            events_with("<a></p></a>", &options),
            ["start:a[]", "start:p[]", "end:p", "end:a"]
        );
    }

    #[test]
    fn repeated_left_open_tag_closes_implicitly() {
        let left_open = |tag: &str| tag == "li";
        let options = TokenizerOptions {
            expect_html: true,
            can_be_left_open: Some(&left_open),
            ..plain()
        };
        assert_eq!(
            events_with("<li>one<li>two", &options),
            [
                "start:li[]",
                "text:one",
                "end:li",
                "start:li[]",
                "text:two",
                "end:li"
            ]
        );
    }

    #[test]
    fn void_tags_take_no_children() {
        let void = |tag: &str| tag == "br";
        let options = TokenizerOptions {
            is_void_tag: Some(&void),
            ..plain()
        };
        assert_eq!(
            events_with("<v><br>x</v>", &options),
            ["start:v[]", "start:br[]/", "text:x", "end:v"]
        );
    }

    #[test]
    fn stray_angle_bracket_stays_text() {
        assert_eq!(events("<v>a < b</v>"), ["start:v[]", "text:a < b", "end:v"]);
    }

    #[test]
    fn conditional_sections_are_skipped() {
        assert_eq!(
            events("<v><![if x]>y<![endif]></v>"),
            ["start:v[]", "text:y", "end:v"]
        );
    }
}
