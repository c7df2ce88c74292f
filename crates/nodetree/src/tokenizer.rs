//! Markup tokenizer
//!
//! Byte scanner over a `&str`. Slices are only cut at ASCII structural bytes
//! (`<`, `>`, quotes, whitespace), which are never UTF-8 continuation bytes,
//! so every slice boundary is a char boundary.
//!
//! Names keep their source case; the parser normalizes them. Every token
//! carries its byte span for source-position tracking.

use crate::config::Syntax;
use crate::entities::decode_entities;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const DOCTYPE_START: &[u8] = b"<!doctype";

// HTML elements whose content is not markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Byte range `start..end` in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAttribute {
    pub name: String,
    /// `None` for a boolean attribute
    pub value: Option<String>,
    pub name_span: Span,
    /// Inside the quotes; zero width at the name's end if there's no value
    pub value_span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Vec<TokenAttribute>,
        self_closing: bool,
        span: Span,
    },
    EndTag {
        name: String,
        span: Span,
    },
    /// Character data with references decoded
    Text {
        text: String,
        span: Span,
    },
    /// Raw `script`/`style` content, taken verbatim
    RawText {
        text: String,
        span: Span,
    },
    Comment {
        data: String,
        span: Span,
    },
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
        span: Span,
    },
}

pub fn tokenize(input: &str, syntax: Syntax) -> Vec<Token> {
    Tokenizer::new(input, syntax).run()
}

fn starts_with_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

fn is_tag_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b':' | b'.')
}

fn is_attribute_name_char(c: u8) -> bool {
    !c.is_ascii_whitespace() && !matches!(c, b'/' | b'>' | b'=' | b'"' | b'\'')
}

struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    syntax: Syntax,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str, syntax: Syntax) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            syntax,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.bytes.len() {
            if self.at_markup(self.pos) {
                self.markup();
            } else {
                self.text();
            }
        }
        self.tokens
    }

    /// A `<` that opens a tag, comment, doctype or declaration. Any other
    /// `<` is plain text.
    fn at_markup(&self, pos: usize) -> bool {
        let rest = &self.bytes[pos..];
        if rest.first() != Some(&b'<') {
            return false;
        }
        match rest.get(1) {
            Some(b'!') | Some(b'?') => true,
            Some(b'/') => rest.get(2).is_some_and(u8::is_ascii_alphabetic),
            Some(c) => c.is_ascii_alphabetic(),
            None => false,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn text(&mut self) {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.bytes.len() && !self.at_markup(self.pos) {
            self.pos += 1;
        }
        let raw = &self.input[start..self.pos];
        self.tokens.push(Token::Text {
            text: decode_entities(raw).into_owned(),
            span: Span::new(start, self.pos),
        });
    }

    fn markup(&mut self) {
        let rest = &self.bytes[self.pos..];
        if rest.starts_with(COMMENT_START.as_bytes()) {
            self.comment();
        } else if starts_with_ignore_ascii_case(rest, DOCTYPE_START) {
            self.doctype();
        } else if rest.starts_with(b"<!") || rest.starts_with(b"<?") {
            self.bogus_comment();
        } else if rest.starts_with(b"</") {
            self.end_tag();
        } else {
            self.start_tag();
        }
    }

    fn comment(&mut self) {
        let start = self.pos;
        let body = start + COMMENT_START.len();
        let (data, end) = match self.input[body..].find(COMMENT_END) {
            Some(rel) => (&self.input[body..body + rel], body + rel + COMMENT_END.len()),
            None => (&self.input[body..], self.bytes.len()),
        };
        self.tokens.push(Token::Comment {
            data: data.to_string(),
            span: Span::new(start, end),
        });
        self.pos = end;
    }

    /// `<?xml ...?>` and unknown `<!...>` declarations, kept as comments
    fn bogus_comment(&mut self) {
        let start = self.pos;
        let body = if self.bytes[start + 1] == b'?' {
            start + 1
        } else {
            start + 2
        };
        let (data, end) = match self.input[body..].find('>') {
            Some(rel) => (&self.input[body..body + rel], body + rel + 1),
            None => (&self.input[body..], self.bytes.len()),
        };
        self.tokens.push(Token::Comment {
            data: data.to_string(),
            span: Span::new(start, end),
        });
        self.pos = end;
    }

    fn doctype(&mut self) {
        let start = self.pos;
        let body = start + DOCTYPE_START.len();
        let (content, end) = match self.input[body..].find('>') {
            Some(rel) => (&self.input[body..body + rel], body + rel + 1),
            None => (&self.input[body..], self.bytes.len()),
        };
        let (name, public_id, system_id) = parse_doctype(content);
        self.tokens.push(Token::Doctype {
            name,
            public_id,
            system_id,
            span: Span::new(start, end),
        });
        self.pos = end;
    }

    fn tag_name(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_tag_name_char(self.bytes[self.pos]) {
            self.pos += 1;
        }
        self.input[start..self.pos].to_string()
    }

    fn end_tag(&mut self) {
        let start = self.pos;
        self.pos += 2;
        let name = self.tag_name();
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'>' {
            self.pos += 1;
        }
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
        self.tokens.push(Token::EndTag {
            name,
            span: Span::new(start, self.pos),
        });
    }

    fn start_tag(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let name = self.tag_name();
        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let Some(&c) = self.bytes.get(self.pos) else {
                break;
            };
            match c {
                b'>' => {
                    self.pos += 1;
                    break;
                }
                b'/' => {
                    self.pos += 1;
                    if self.bytes.get(self.pos) == Some(&b'>') {
                        self_closing = true;
                        self.pos += 1;
                        break;
                    }
                }
                _ => match self.attribute() {
                    Some(attribute) => attributes.push(attribute),
                    // stray quote or '='
                    None => self.pos += 1,
                },
            }
        }

        let content_start = self.pos;
        self.tokens.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
            span: Span::new(start, content_start),
        });

        let raw_text = self.syntax == Syntax::Html
            && !self_closing
            && RAW_TEXT_ELEMENTS.iter().any(|e| e.eq_ignore_ascii_case(&name));
        if raw_text {
            self.raw_text(&name, content_start);
        }
    }

    fn attribute(&mut self) -> Option<TokenAttribute> {
        let name_start = self.pos;
        while self.pos < self.bytes.len() && is_attribute_name_char(self.bytes[self.pos]) {
            self.pos += 1;
        }
        if self.pos == name_start {
            return None;
        }
        let name_span = Span::new(name_start, self.pos);
        let name = self.input[name_start..self.pos].to_string();

        let after_name = self.pos;
        self.skip_whitespace();
        if self.bytes.get(self.pos) != Some(&b'=') {
            self.pos = after_name;
            return Some(TokenAttribute {
                name,
                value: None,
                name_span,
                value_span: Span::new(after_name, after_name),
            });
        }
        self.pos += 1;
        self.skip_whitespace();

        let (value, value_span) = match self.bytes.get(self.pos) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                self.pos += 1;
                let value_start = self.pos;
                while self.pos < self.bytes.len() && self.bytes[self.pos] != quote {
                    self.pos += 1;
                }
                let raw = &self.input[value_start..self.pos];
                let span = Span::new(value_start, self.pos);
                if self.pos < self.bytes.len() {
                    self.pos += 1;
                }
                (raw, span)
            }
            _ => {
                let value_start = self.pos;
                while self.pos < self.bytes.len() {
                    let c = self.bytes[self.pos];
                    if c.is_ascii_whitespace()
                        || c == b'>'
                        || (c == b'/' && self.bytes.get(self.pos + 1) == Some(&b'>'))
                    {
                        break;
                    }
                    self.pos += 1;
                }
                (
                    &self.input[value_start..self.pos],
                    Span::new(value_start, self.pos),
                )
            }
        };

        Some(TokenAttribute {
            name,
            value: Some(decode_entities(value).into_owned()),
            name_span,
            value_span,
        })
    }

    /// Everything up to the matching close tag is one raw text token. A
    /// missing close tag takes the rest of the input.
    fn raw_text(&mut self, name: &str, content_start: usize) {
        let close_start = find_close_tag(&self.bytes[content_start..], name.as_bytes())
            .map_or(self.bytes.len(), |rel| content_start + rel);

        if close_start > content_start {
            self.tokens.push(Token::RawText {
                text: self.input[content_start..close_start].to_string(),
                span: Span::new(content_start, close_start),
            });
        }
        self.pos = close_start;
        if close_start == self.bytes.len() {
            self.tokens.push(Token::EndTag {
                name: name.to_string(),
                span: Span::new(close_start, close_start),
            });
        }
    }
}

/// Offset of `</name` followed by `>`, `/` or whitespace, ignoring case
fn find_close_tag(haystack: &[u8], name: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < haystack.len() {
        let rel = haystack[i..].iter().position(|&b| b == b'<')?;
        i += rel;
        let rest = &haystack[i..];
        if rest.get(1) == Some(&b'/')
            && starts_with_ignore_ascii_case(&rest[2..], name)
            && rest
                .get(2 + name.len())
                .map_or(true, |&c| c == b'>' || c == b'/' || c.is_ascii_whitespace())
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Split `html PUBLIC "pub" "sys"` into name, public id and system id
fn parse_doctype(content: &str) -> (String, String, String) {
    let content = content.trim();
    let (name, mut rest) = match content.find(|c: char| c.is_ascii_whitespace()) {
        Some(i) => (&content[..i], content[i..].trim_start()),
        None => (content, ""),
    };

    let mut public_id = String::new();
    let mut system_id = String::new();
    let keyword_len = 6;
    if let Some(keyword) = rest.get(..keyword_len) {
        let is_public = keyword.eq_ignore_ascii_case("PUBLIC");
        if is_public || keyword.eq_ignore_ascii_case("SYSTEM") {
            rest = rest[keyword_len..].trim_start();
            let first = take_quoted(&mut rest);
            if is_public {
                public_id = first;
                system_id = take_quoted(&mut rest);
            } else {
                system_id = first;
            }
        }
    }
    (name.to_string(), public_id, system_id)
}

fn take_quoted(rest: &mut &str) -> String {
    let s = rest.trim_start();
    let Some(quote) = s.chars().next().filter(|&c| c == '"' || c == '\'') else {
        *rest = s;
        return String::new();
    };
    let body = &s[1..];
    match body.find(quote) {
        Some(end) => {
            *rest = &body[end + 1..];
            body[..end].to_string()
        }
        None => {
            *rest = "";
            body.to_string()
        }
    }
}
