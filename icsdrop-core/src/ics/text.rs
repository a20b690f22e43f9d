//! TEXT value helpers: HTML stripping, RFC 5545 escaping and line folding.

use std::sync::LazyLock;

use regex::Regex;

// A tag runs to the next '>' or, if unterminated, to the end of input
static RE_HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+(?:>|$)").expect("valid html tag regex"));

/// Maximum octets per content line, excluding the CRLF
const MAX_LINE_OCTETS: usize = 75;

/// Remove HTML tags, keeping the text between them.
///
/// `strip_html(strip_html(x)) == strip_html(x)`: any '<' left behind is
/// followed by '>' or ends the input, so it can never start a tag.
pub fn strip_html(input: &str) -> String {
    RE_HTML_TAG.replace_all(input, "").into_owned()
}

/// Escape a TEXT value per RFC 5545 section 3.3.11.
pub fn escape_text(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => result.push_str("\\\\"),
            ';' => result.push_str("\\;"),
            ',' => result.push_str("\\,"),
            '\n' => result.push_str("\\n"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                result.push_str("\\n");
            }
            _ => result.push(c),
        }
    }

    result
}

/// Reverse of [`escape_text`]. Unknown escapes keep their backslash.
pub fn unescape_text(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(',') => {
                    result.push(',');
                    chars.next();
                }
                Some(';') => {
                    result.push(';');
                    chars.next();
                }
                Some('\\') => {
                    result.push('\\');
                    chars.next();
                }
                Some('n') | Some('N') => {
                    result.push('\n');
                    chars.next();
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Fold a content line into CRLF-terminated physical lines of at most 75
/// octets. Continuation lines start with a single space, and a UTF-8
/// sequence is never split.
pub fn fold_line(line: &str) -> String {
    let mut result = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3 + 2);
    let mut current = 0;

    for c in line.chars() {
        if current + c.len_utf8() > MAX_LINE_OCTETS {
            result.push_str("\r\n ");
            current = 1;
        }
        result.push(c);
        current += c.len_utf8();
    }
    result.push_str("\r\n");

    result
}
