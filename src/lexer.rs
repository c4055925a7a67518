use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::{CharIndices, FromStr};

use crate::number::Number;
use crate::Rc;

use anyhow::{anyhow, bail, Result};

struct SourceInternal {
    file: String,
    contents: String,
    // Byte offset at which each line starts.
    line_starts: Vec<usize>,
}

/// Rule text and its file name, for error messages.
#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl Source {
    pub fn from_contents(file: String, contents: String) -> Result<Source> {
        // Spans hold u32 offsets.
        if contents.len() >= u32::MAX as usize {
            bail!("{file} is too large");
        }
        let line_starts = std::iter::once(0)
            .chain(contents.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Ok(Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                line_starts,
            }),
        })
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Source> {
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => bail!("Failed to read {}. {e}", path.as_ref().display()),
        };
        Self::from_contents(path.as_ref().to_string_lossy().to_string(), contents)
    }

    pub fn contents(&self) -> &str {
        &self.src.contents
    }

    // Text of 1-based `line` without its terminator.
    fn line_text(&self, line: u32) -> &str {
        let starts = &self.src.line_starts;
        let idx = (line as usize).saturating_sub(1);
        let start = match starts.get(idx) {
            Some(start) => *start,
            None => return "",
        };
        let end = match starts.get(idx + 1) {
            Some(next) => next - 1,
            None => self.src.contents.len(),
        };
        self.src.contents[start..end].trim_end_matches('\r')
    }

    /// An error pointing at `line`:`col` with the offending line and a caret.
    pub fn error(&self, line: u32, col: u32, msg: &str) -> anyhow::Error {
        let gutter = " ".repeat(line.to_string().len());
        let caret = " ".repeat((col as usize).saturating_sub(1));
        anyhow!(
            "\n--> {}:{line}:{col}\n{gutter} |\n{line} | {}\n{gutter} | {caret}^\nerror: {msg}",
            self.src.file,
            self.line_text(line),
        )
    }
}

#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub line: u32,
    pub col: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn text(&self) -> &str {
        &self.source.contents()[self.start as usize..self.end as usize]
    }

    pub fn error(&self, msg: &str) -> anyhow::Error {
        self.source.error(self.line, self.col, msg)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}:{} {:?}", self.line, self.col, self.text())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    Symbol,
    String,
    RawString,
    Number,
    Ident,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span);

#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn span(&self, line: u32, col: u32, start: usize, end: usize) -> Span {
        Span {
            source: self.source.clone(),
            line,
            col,
            start: start as u32,
            end: end as u32,
        }
    }

    fn read_ident(&mut self) -> Result<Token> {
        let start = self.peek().0;
        let col = self.col;
        loop {
            let ch = self.peek().1;
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.iter.next();
            } else {
                break;
            }
        }
        let end = self.peek().0;
        self.col += (end - start) as u32;
        Ok(Token(TokenKind::Ident, self.span(self.line, col, start, end)))
    }

    fn read_digits(&mut self) {
        while self.peek().1.is_ascii_digit() {
            self.iter.next();
        }
    }

    // See https://www.json.org/json-en.html for number's grammar
    fn read_number(&mut self) -> Result<Token> {
        let (start, chr) = self.peek();
        let col = self.col;
        self.iter.next();

        // A leading - must be followed by the integer part.
        let chr = if chr == '-' {
            let (_, c) = self.peek();
            self.iter.next();
            c
        } else {
            chr
        };

        // Read integer part.
        if chr != '0' {
            // Starts with 1.. or 9. Read digits.
            self.read_digits();
        }

        // Read fraction part
        // . must be followed by at least 1 digit.
        if self.peek().1 == '.' && self.peekahead(1).1.is_ascii_digit() {
            self.iter.next(); // .
            self.read_digits();
        }

        // Read exponent part
        let ch = self.peek().1;
        if ch == 'e' || ch == 'E' {
            self.iter.next();
            // e must be followed by an optional sign and digits
            if matches!(self.peek().1, '+' | '-') {
                self.iter.next();
            }
            // Read digits. Absence of digit will be validated by serde later.
            self.read_digits();
        }

        let end = self.peek().0;
        self.col += (end - start) as u32;

        // Check for invalid number.Valid number cannot be followed by
        // these characters:
        let ch = self.peek().1;
        if ch == '_' || ch == '.' || ch.is_ascii_alphanumeric() {
            return Err(self.source.error(self.line, self.col, "invalid number"));
        }

        if Number::from_str(&self.source.contents()[start..end]).is_err() {
            return Err(self.source.error(self.line, col, "invalid number"));
        }

        Ok(Token(TokenKind::Number, self.span(self.line, col, start, end)))
    }

    fn read_raw_string(&mut self) -> Result<Token> {
        self.iter.next();
        self.col += 1;
        let (start, _) = self.peek();
        let (line, col) = (self.line, self.col);
        loop {
            let (_, ch) = self.peek();
            self.iter.next();
            match ch {
                '`' => {
                    self.col += 1;
                    break;
                }
                '\x00' => {
                    return Err(self.source.error(line, col, "unmatched `"));
                }
                '\t' => self.col += 4,
                '\n' => {
                    self.line += 1;
                    self.col = 1;
                }
                _ => self.col += 1,
            }
        }
        let end = self.peek().0;
        Ok(Token(
            TokenKind::RawString,
            self.span(line, col, start, end - 1),
        ))
    }

    fn read_string(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        self.iter.next();
        self.col += 1;
        let (start, _) = self.peek();
        loop {
            let (offset, ch) = self.peek();
            match ch {
                '"' | '\x00' => {
                    break;
                }
                '\\' => {
                    self.iter.next();
                    let (_, ch) = self.peek();
                    self.iter.next();
                    match ch {
                        // json escape sequence
                        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => (),
                        'u' => {
                            for _i in 0..4 {
                                let (offset, ch) = self.peek();
                                let col = self.col + (offset - start) as u32;
                                if !ch.is_ascii_hexdigit() {
                                    return Err(self.source.error(
                                        line,
                                        col,
                                        "invalid hex escape sequence",
                                    ));
                                }
                                self.iter.next();
                            }
                        }
                        _ => return Err(self.source.error(line, col, "invalid escape sequence")),
                    }
                }
                _ => {
                    // check for valid json chars
                    let col = self.col + (offset - start) as u32;
                    if !('\u{0020}'..='\u{10FFFF}').contains(&ch) {
                        return Err(self.source.error(line, col, "invalid character in string"));
                    }
                    self.iter.next();
                }
            }
        }

        if self.peek().1 != '"' {
            return Err(self.source.error(line, col, "unmatched \""));
        }

        self.iter.next();
        let end = self.peek().0;
        self.col += (end - start) as u32;

        // Ensure that the string is parsable.
        if let Err(e) = serde_json::from_str::<String>(&self.source.contents()[start - 1..end]) {
            bail!(
                "{} {}",
                self.source
                    .error(self.line, col, "serde_json cannot parse string:"),
                e
            )
        }

        Ok(Token(
            TokenKind::String,
            self.span(line, col + 1, start, end - 1),
        ))
    }

    fn skip_ws(&mut self) -> Result<()> {
        // Only the 4 json whitespace characters are recognized.
        // https://www.crockford.com/mckeeman.html.
        // Additionally, comments are also skipped.
        // A tab is considered 4 space characters.
        'outer: loop {
            match self.peek().1 {
                ' ' => self.col += 1,
                '\t' => self.col += 4,
                '\r' => {
                    if self.peekahead(1).1 != '\n' {
                        return Err(self.source.error(
                            self.line,
                            self.col,
                            "\\r must be followed by \\n",
                        ));
                    }
                }
                '\n' => {
                    self.col = 1;
                    self.line += 1;
                }
                '#' => {
                    self.iter.next();
                    loop {
                        match self.peek().1 {
                            '\n' | '\x00' => continue 'outer,
                            _ => self.iter.next(),
                        };
                    }
                }
                _ => break,
            }
            self.iter.next();
        }
        Ok(())
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_ws()?;

        let (start, chr) = self.peek();
        let col = self.col;

        match chr {
            // Special case for - followed by digit which is a
            // negative json number.
            '-' if self.peekahead(1).1.is_ascii_digit() => self.read_number(),
            // grouping characters
            '{' | '}' | '[' | ']' | '(' | ')' |
            // separators
            ',' | '.' | '=' => {
                self.col += 1;
                self.iter.next();
                Ok(Token(TokenKind::Symbol, self.span(self.line, col, start, start + 1)))
            }
            // : or :-
            ':' => {
                self.col += 1;
                self.iter.next();
                let mut end = start + 1;
                if self.peek().1 == '-' {
                    self.col += 1;
                    self.iter.next();
                    end += 1;
                }
                Ok(Token(TokenKind::Symbol, self.span(self.line, col, start, end)))
            }
            '"' => self.read_string(),
            '`' => self.read_raw_string(),
            '\x00' => Ok(Token(TokenKind::Eof, self.span(self.line, col, start, start))),
            _ if chr.is_ascii_digit() => self.read_number(),
            _ if chr.is_ascii_alphabetic() || chr == '_' => self.read_ident(),
            _ => Err(self.source.error(self.line, self.col, "invalid character")),
        }
    }
}
