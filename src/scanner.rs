use std::{
    fs,
    io::{self, BufRead, Write},
    path::Path,
};

use crate::{error::ScanError, MAX_NAME_LEN};

type ScanResult<T> = Result<T, ScanError>;

/// A single lexed token. Numbers keep their integer-vs-real spelling;
/// structural delimiters become marker tokens interpreted by the
/// processor.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number { value: f64, real: bool },
    Name(Vec<u8>),
    Literal(Vec<u8>),
    Constant(Vec<u8>),
    TextString(Vec<u8>),
    HexString(Vec<u8>),
    /// The text after a `%%` document-structure comment
    Dsc(String),
    ArrayOpen,
    ArrayClose,
    ProcedureOpen,
    ProcedureClose,
    DictOpen,
    DictClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Buffer,
    Stdin,
}

/// Lexes PostScript source from a fully loaded file buffer or, in
/// interactive mode, line by line from stdin.
#[derive(Debug)]
pub(crate) struct Scanner {
    buffer: Vec<u8>,
    cursor: usize,
    line_start: usize,
    row: usize,
    source: Source,
    stdin_eof: bool,
    eps: bool,
    show_prompt: bool,
    page_size: Option<(f64, f64)>,
}

const DELIMITERS: &[u8] = b" \t\n\r\x0c/{}[]()<>%";

fn is_delimiter(b: u8) -> bool {
    DELIMITERS.contains(&b)
}

fn radix_digit(b: u8) -> Option<i64> {
    match b {
        b'0'..=b'9' => Some(i64::from(b - b'0')),
        b'a'..=b'z' => Some(i64::from(b - b'a') + 10),
        b'A'..=b'Z' => Some(i64::from(b - b'A') + 10),
        _ => None,
    }
}

/// Longest `strtod`-acceptable prefix starting at `start`: sign, digits
/// with an optional decimal point, optional exponent. Returns `start`
/// itself when no number is present.
fn scan_float(buffer: &[u8], start: usize) -> usize {
    let mut i = start;

    if matches!(buffer.get(i), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_digits = buffer[i..].iter().take_while(|b| b.is_ascii_digit()).count();
    i += int_digits;

    let mut frac_digits = 0;
    if buffer.get(i) == Some(&b'.') {
        i += 1;
        frac_digits = buffer[i..].iter().take_while(|b| b.is_ascii_digit()).count();
        i += frac_digits;
    }

    if int_digits + frac_digits == 0 {
        return start;
    }

    if matches!(buffer.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(buffer.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = buffer[j..].iter().take_while(|b| b.is_ascii_digit()).count();
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }

    i
}

impl Scanner {
    pub fn from_bytes(buffer: Vec<u8>) -> Self {
        Self {
            buffer,
            cursor: 0,
            line_start: 0,
            row: 0,
            source: Source::Buffer,
            stdin_eof: false,
            eps: false,
            show_prompt: true,
            page_size: None,
        }
    }

    pub fn interactive() -> Self {
        let mut scanner = Self::from_bytes(Vec::new());
        scanner.source = Source::Stdin;
        scanner
    }

    /// Loads a PostScript/EPS file. The first line must begin with the
    /// `%!PS` signature; a `%%BoundingBox:` comment anywhere in the file
    /// sizes the page.
    pub fn load_file(path: &Path) -> ScanResult<Self> {
        let buffer = fs::read(path).map_err(|_| {
            ScanError::new(0, 0, format!("Unable to open file: {}", path.display()))
        })?;

        if !buffer.starts_with(b"%!PS") {
            return Err(ScanError::new(
                0,
                0,
                "Input file is neither a PostScript nor an EPS file",
            ));
        }

        let mut scanner = Self::from_bytes(buffer);
        scanner.page_size = scanner.find_bounding_box();
        scanner.eps = scanner.page_size.is_some();

        if let Some((width, height)) = scanner.page_size {
            log::debug!("bounding box: {} x {}", width, height);
        }

        Ok(scanner)
    }

    fn find_bounding_box(&self) -> Option<(f64, f64)> {
        for line in self.buffer.split(|&b| b == b'\n') {
            let Some(rest) = line.strip_prefix(b"%%BoundingBox: ".as_slice()) else {
                continue;
            };

            let text = String::from_utf8_lossy(rest);
            let dims: Vec<i32> = text
                .split_whitespace()
                .map_while(|part| part.parse().ok())
                .collect();

            if let [x1, y1, x2, y2, ..] = dims[..] {
                return Some((f64::from(x2 - x1), f64::from(y2 - y1)));
            }
        }

        None
    }

    /// Page dimensions extracted from `%%BoundingBox:`, if any
    pub fn page_size(&self) -> Option<(f64, f64)> {
        self.page_size
    }

    pub fn is_eps(&self) -> bool {
        self.eps
    }

    pub fn is_interactive(&self) -> bool {
        self.source == Source::Stdin
    }

    pub fn is_eof(&self) -> bool {
        self.cursor >= self.buffer.len()
            && match self.source {
                Source::Buffer => true,
                Source::Stdin => self.stdin_eof,
            }
    }

    fn column(&self) -> usize {
        self.cursor - self.line_start
    }

    fn fail(&self, message: impl Into<String>) -> ScanError {
        ScanError::new(self.column(), self.row, message)
    }

    fn refill(&mut self) -> bool {
        if self.stdin_eof {
            return false;
        }

        if self.show_prompt {
            print!("> ");
            let _ = io::stdout().flush();
        }

        let mut line = Vec::new();
        match io::stdin().lock().read_until(b'\n', &mut line) {
            Ok(0) | Err(_) => {
                self.stdin_eof = true;
                false
            }
            Ok(_) => {
                self.buffer.extend_from_slice(&line);
                true
            }
        }
    }

    fn get(&mut self) -> Option<u8> {
        if self.cursor >= self.buffer.len() {
            match self.source {
                Source::Buffer => return None,
                Source::Stdin => {
                    if !self.refill() {
                        return None;
                    }
                }
            }
        }

        let b = self.buffer[self.cursor];
        self.cursor += 1;

        if b == b'\n' {
            self.row += 1;
            self.line_start = self.cursor;
        }

        Some(b)
    }

    fn unget(&mut self) {
        if self.cursor == 0 {
            return;
        }

        self.cursor -= 1;

        if self.buffer[self.cursor] == b'\n' {
            self.row -= 1;
            self.line_start = self.buffer[..self.cursor]
                .iter()
                .rposition(|&b| b == b'\n')
                .map(|pos| pos + 1)
                .unwrap_or(0);
        }
    }

    fn peek(&self) -> Option<u8> {
        self.buffer.get(self.cursor).copied()
    }

    /// Discards the rest of the current input line without pulling more
    /// data from an interactive source. Used for comments and for error
    /// recovery in interactive mode.
    pub fn clear_input(&mut self) {
        while self.cursor < self.buffer.len() {
            let b = self.buffer[self.cursor];
            self.cursor += 1;

            if b == b'\n' {
                self.row += 1;
                self.line_start = self.cursor;
                break;
            }
        }
    }

    fn take_rest_of_line(&mut self) -> String {
        let start = self.cursor;
        self.clear_input();

        let mut line = &self.buffer[start..self.cursor];
        while let Some((&last, rest)) = line.split_last() {
            if last == b'\n' || last == b'\r' {
                line = rest;
            } else {
                break;
            }
        }

        String::from_utf8_lossy(line).into_owned()
    }

    /// Lexes the next token. `Ok(None)` is the normal end of input.
    pub fn get_token(&mut self) -> ScanResult<Option<Token>> {
        loop {
            let Some(ch) = self.get() else {
                return Ok(None);
            };

            let token = match ch {
                b'a'..=b'z' | b'A'..=b'Z' => {
                    self.unget();
                    Token::Name(self.read_name()?)
                }
                b'0'..=b'9' => {
                    self.unget();
                    self.lex_number()?
                }
                b'/' => self.lex_literal()?,
                b'(' => self.lex_text_string()?,
                b')' => return Err(self.fail("unmatched ')'")),
                b'{' => Token::ProcedureOpen,
                b'}' => Token::ProcedureClose,
                b'[' => Token::ArrayOpen,
                b']' => Token::ArrayClose,
                b'<' => self.lex_angle_open()?,
                b'>' => self.lex_angle_close()?,
                b'%' => match self.lex_comment() {
                    Some(dsc) => Token::Dsc(dsc),
                    None => continue,
                },
                b'.' | b'-' | b'+' => self.lex_number_or_name()?,
                b'~' => self.lex_tilde()?,
                ch if ch.is_ascii_graphic() => {
                    self.unget();
                    Token::Name(self.read_name()?)
                }
                ch if ch.is_ascii_whitespace() => continue,
                ch => return Err(self.fail(format!("invalid character: {}", ch))),
            };

            return Ok(Some(token));
        }
    }

    /// Like [Scanner::get_token], but confined to the remainder of the
    /// current line; used by the `token` operator so that scanning never
    /// blocks on fresh input
    pub fn has_token(&mut self) -> ScanResult<Option<Token>> {
        loop {
            match self.buffer.get(self.cursor).copied() {
                None | Some(b'\n') | Some(b'%') => return Ok(None),
                Some(b' ' | b'\t' | b'\r' | 0x0c) => self.cursor += 1,
                Some(_) => return self.get_token(),
            }
        }
    }

    fn read_name(&mut self) -> ScanResult<Vec<u8>> {
        let mut name = Vec::new();

        while let Some(ch) = self.get() {
            if is_delimiter(ch) {
                self.unget();
                break;
            }

            if !ch.is_ascii_graphic() {
                return Err(self.fail(format!("invalid character in name: {}", ch)));
            }

            if name.len() >= MAX_NAME_LEN {
                return Err(self.fail(format!(
                    "name too long: max is {} characters",
                    MAX_NAME_LEN
                )));
            }

            name.push(ch);
        }

        Ok(name)
    }

    fn lex_literal(&mut self) -> ScanResult<Token> {
        match self.peek() {
            Some(b'/') => {
                self.get();

                let name = self.read_name()?;
                if name.is_empty() {
                    return Err(self.fail("missing name after constant //"));
                }

                Ok(Token::Constant(name))
            }
            None => Err(self.fail("unexpected end of file")),
            Some(..) => {
                let mut name = self.read_name()?;
                if name.is_empty() {
                    // a lone slash
                    name.push(b'/');
                }

                Ok(Token::Literal(name))
            }
        }
    }

    fn lex_number(&mut self) -> ScanResult<Token> {
        let start = self.cursor;
        let end = scan_float(&self.buffer, start);

        if end > start {
            let text = std::str::from_utf8(&self.buffer[start..end]).unwrap();
            let real = text.contains(['.', 'e', 'E']);
            let next = self.buffer.get(end).copied();

            if next.map_or(true, is_delimiter) {
                let value: f64 = text.parse().map_err(|_| self.fail("malformed number"))?;
                self.cursor = end;

                return Ok(Token::Number { value, real });
            }

            // base#number radix notation
            if next == Some(b'#') && self.buffer[start].is_ascii_digit() && !real {
                if let Ok(base) = text.parse::<i64>() {
                    if (2..=36).contains(&base) {
                        if let Some(token) = self.lex_radix_number(end + 1, base) {
                            return Ok(token);
                        }
                    }
                }
            }
        }

        // not a number after all
        self.read_name().map(Token::Name)
    }

    fn lex_radix_number(&mut self, digits_start: usize, base: i64) -> Option<Token> {
        let mut end = digits_start;

        while let Some(&b) = self.buffer.get(end) {
            match radix_digit(b) {
                Some(v) if v < base => end += 1,
                _ => break,
            }
        }

        if end == digits_start || !self.buffer.get(end).copied().map_or(true, is_delimiter) {
            return None;
        }

        let text = std::str::from_utf8(&self.buffer[digits_start..end]).unwrap();
        let value = i64::from_str_radix(text, base as u32).ok()?;

        self.cursor = end;

        Some(Token::Number {
            // out-of-range digits wrap to the 32-bit representation
            value: f64::from(value as i32),
            real: false,
        })
    }

    fn lex_number_or_name(&mut self) -> ScanResult<Token> {
        self.unget();

        let mut probe = self.cursor;
        if matches!(self.buffer.get(probe), Some(b'+' | b'-')) {
            probe += 1;
        }
        if self.buffer.get(probe) == Some(&b'.') {
            probe += 1;
        }

        if self.buffer.get(probe).is_some_and(u8::is_ascii_digit) {
            self.lex_number()
        } else {
            self.read_name().map(Token::Name)
        }
    }

    fn lex_text_string(&mut self) -> ScanResult<Token> {
        let mut data = Vec::new();
        let mut depth = 1;

        self.show_prompt = false;
        let result = loop {
            let Some(ch) = self.get() else {
                break Err(self.fail("text string has no matching ')'"));
            };

            match ch {
                b'(' => {
                    depth += 1;
                    data.push(b'(');
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break Ok(Token::TextString(data));
                    }
                    data.push(b')');
                }
                // escapes are not decoded: the backslash itself is dropped
                // and the following byte is taken verbatim
                b'\\' => {}
                ch if ch.is_ascii_graphic() => data.push(ch),
                ch if ch.is_ascii_whitespace() => data.push(b' '),
                ch => break Err(self.fail(format!("invalid character: {}", ch))),
            }
        };
        self.show_prompt = true;

        result
    }

    fn lex_angle_open(&mut self) -> ScanResult<Token> {
        match self.peek() {
            Some(b'<') => {
                self.get();
                Ok(Token::DictOpen)
            }
            Some(b'~') => Err(self.fail("Base 85 ASCII is not yet supported")),
            _ => {
                self.show_prompt = false;
                let result = self.lex_hex_string();
                self.show_prompt = true;
                result
            }
        }
    }

    fn lex_hex_string(&mut self) -> ScanResult<Token> {
        let mut data = Vec::new();
        let mut high: Option<u8> = None;

        while let Some(ch) = self.get() {
            if ch.is_ascii_hexdigit() {
                let nibble = radix_digit(ch).unwrap() as u8;

                match high.take() {
                    Some(hi) => data.push(hi << 4 | nibble),
                    None => high = Some(nibble),
                }
            } else if ch == b'>' {
                // an odd nibble is padded with a low zero
                if let Some(hi) = high {
                    data.push(hi << 4);
                }

                return Ok(Token::HexString(data));
            } else if !ch.is_ascii_whitespace() {
                return Err(self.fail(format!("character {} is not a hex digit", ch as char)));
            }
        }

        Err(self.fail("unexpected end of file"))
    }

    fn lex_angle_close(&mut self) -> ScanResult<Token> {
        if self.peek() == Some(b'>') {
            self.get();
            Ok(Token::DictClose)
        } else {
            Err(self.fail("missing '<'"))
        }
    }

    fn lex_tilde(&mut self) -> ScanResult<Token> {
        if self.peek() == Some(b'>') {
            Err(self.fail("missing '<~'"))
        } else {
            self.unget();
            self.read_name().map(Token::Name)
        }
    }

    /// `Some` carries a DSC payload; ordinary comments are consumed and
    /// yield `None`
    fn lex_comment(&mut self) -> Option<String> {
        if self.peek() == Some(b'%') {
            self.get();
            Some(self.take_rest_of_line())
        } else {
            self.clear_input();
            None
        }
    }
}
