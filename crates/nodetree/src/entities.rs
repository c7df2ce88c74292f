//! Character escaping for output and character-reference decoding for input

use std::borrow::Cow;

use crate::config::Syntax;

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("copy", '\u{a9}'),
    ("reg", '\u{ae}'),
    ("trade", '\u{2122}'),
    ("hellip", '\u{2026}'),
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
    ("laquo", '\u{ab}'),
    ("raquo", '\u{bb}'),
];

/// Escape `text` into `out`.
///
/// Text content escapes `& < >`; attribute values escape `& "` and, for XML,
/// also `<`. A non-breaking space is written as a reference in both.
pub fn escape(text: &str, out: &mut String, in_attribute: bool, syntax: Syntax) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => match syntax {
                Syntax::Html => out.push_str("&nbsp;"),
                Syntax::Xml => out.push_str("&#xa0;"),
            },
            '<' if !in_attribute || syntax == Syntax::Xml => out.push_str("&lt;"),
            '>' if !in_attribute => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

pub fn escape_to_string(text: &str, in_attribute: bool, syntax: Syntax) -> String {
    let mut out = String::with_capacity(text.len());
    escape(text, &mut out, in_attribute, syntax);
    out
}

/// Decode character references. Unknown or malformed references are kept as
/// written.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_one(rest) {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

// `input` starts at '&'; returns the char and the bytes consumed
fn decode_one(input: &str) -> Option<(char, usize)> {
    let semi = input[1..].find(';')? + 1;
    if semi > 12 {
        return None;
    }
    let body = &input[1..semi];
    let c = if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        char::from_u32(code)?
    } else {
        NAMED.iter().find(|(name, _)| *name == body).map(|&(_, c)| c)?
    };
    Some((c, semi + 1))
}
