use std::collections::HashSet;

use once_cell::sync::Lazy;

use super::SyntaxError;
use crate::ast::{Span, Token, TokenKind};

static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "break",
        "case",
        "class",
        "const",
        "continue",
        "default",
        "delete",
        "do",
        "else",
        "extends",
        "false",
        "for",
        "function",
        "if",
        "in",
        "instanceof",
        "let",
        "new",
        "null",
        "return",
        "switch",
        "this",
        "throw",
        "true",
        "typeof",
        "var",
        "void",
        "while",
        "with",
        "yield",
    ]
    .into_iter()
    .collect()
});

// Longest first, so maximal munch falls out of a linear scan.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "===", "!==", ">>>", "<<=", ">>=", "=>", "==", "!=", "<=", ">=", "&&", "||", "<<",
    ">>", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "{", "}", "(", ")", "[",
    "]", ";", ",", ".", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=",
];

pub(super) fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    offset: usize,
    line: usize,
    line_start: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            offset: 0,
            line: 1,
            line_start: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        loop {
            self.skip_trivia()?;

            if self.offset >= self.bytes.len() {
                return Ok(self.tokens);
            }

            let byte = self.bytes[self.offset];

            if is_identifier_start(byte) {
                self.read_identifier();
            } else if byte.is_ascii_digit() || (byte == b'.' && self.digit_at(self.offset + 1)) {
                self.read_number();
            } else if byte == b'"' || byte == b'\'' {
                self.read_string()?;
            } else if byte == b'/' && self.regex_allowed() {
                self.read_regex()?;
            } else {
                self.read_punctuator()?;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            line: self.line,
            column: self.offset - self.line_start,
        }
    }

    fn digit_at(&self, offset: usize) -> bool {
        self.bytes.get(offset).is_some_and(u8::is_ascii_digit)
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        while self.offset < self.bytes.len() {
            match self.bytes[self.offset] {
                b'\n' => {
                    self.offset += 1;
                    self.line += 1;
                    self.line_start = self.offset;
                }

                b' ' | b'\t' | b'\r' => self.offset += 1,

                b'/' if self.bytes.get(self.offset + 1) == Some(&b'/') => {
                    while self.offset < self.bytes.len() && self.bytes[self.offset] != b'\n' {
                        self.offset += 1;
                    }
                }

                b'/' if self.bytes.get(self.offset + 1) == Some(&b'*') => {
                    let start_line = self.line;
                    self.offset += 2;

                    loop {
                        if self.offset >= self.bytes.len() {
                            self.line = start_line;
                            return Err(self.error("unterminated block comment"));
                        }

                        match self.bytes[self.offset] {
                            b'\n' => {
                                self.offset += 1;
                                self.line += 1;
                                self.line_start = self.offset;
                            }
                            b'*' if self.bytes.get(self.offset + 1) == Some(&b'/') => {
                                self.offset += 2;
                                break;
                            }
                            _ => self.offset += 1,
                        }
                    }
                }

                _ => break,
            }
        }

        Ok(())
    }

    /// A `/` starts a regular expression unless the previous significant token
    /// could end an expression, in which case it is division.
    fn regex_allowed(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(token) => match token.kind {
                TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::String
                | TokenKind::Regex => false,
                TokenKind::Keyword => {
                    !matches!(token.value.as_str(), "this" | "true" | "false" | "null")
                }
                TokenKind::Punctuator => {
                    !matches!(token.value.as_str(), ")" | "]" | "}" | "++" | "--")
                }
            },
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            value: self.source[start..self.offset].to_string(),
            span: Span::new(start as u32, self.offset as u32),
            line: self.line,
            column: start - self.line_start,
        });
    }

    fn read_identifier(&mut self) {
        let start = self.offset;

        while self.offset < self.bytes.len() && is_identifier_part(self.bytes[self.offset]) {
            self.offset += 1;
        }

        let kind = if KEYWORDS.contains(&self.source[start..self.offset]) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };

        self.push(kind, start);
    }

    fn read_number(&mut self) {
        let start = self.offset;

        if self.bytes[self.offset] == b'0'
            && matches!(self.bytes.get(self.offset + 1), Some(b'x') | Some(b'X'))
        {
            self.offset += 2;
            while self
                .bytes
                .get(self.offset)
                .is_some_and(u8::is_ascii_hexdigit)
            {
                self.offset += 1;
            }

            self.push(TokenKind::Number, start);
            return;
        }

        while self.digit_at(self.offset) {
            self.offset += 1;
        }

        // Only take the dot when a fraction follows; `(0).x` must leave the
        // dot for the member access.
        if self.bytes.get(self.offset) == Some(&b'.') && self.digit_at(self.offset + 1) {
            self.offset += 1;
            while self.digit_at(self.offset) {
                self.offset += 1;
            }
        }

        if matches!(self.bytes.get(self.offset), Some(b'e') | Some(b'E')) {
            let mut lookahead = self.offset + 1;
            if matches!(self.bytes.get(lookahead), Some(b'+') | Some(b'-')) {
                lookahead += 1;
            }

            if self.digit_at(lookahead) {
                self.offset = lookahead;
                while self.digit_at(self.offset) {
                    self.offset += 1;
                }
            }
        }

        self.push(TokenKind::Number, start);
    }

    fn read_string(&mut self) -> Result<(), SyntaxError> {
        let start = self.offset;
        let quote = self.bytes[self.offset];
        self.offset += 1;

        loop {
            match self.bytes.get(self.offset) {
                None | Some(b'\n') => return Err(self.error("unterminated string literal")),

                Some(b'\\') => {
                    self.offset += 2;
                }

                Some(&byte) => {
                    self.offset += 1;
                    if byte == quote {
                        break;
                    }
                }
            }
        }

        self.push(TokenKind::String, start);
        Ok(())
    }

    fn read_regex(&mut self) -> Result<(), SyntaxError> {
        let start = self.offset;
        self.offset += 1;

        let mut in_class = false;

        loop {
            match self.bytes.get(self.offset) {
                None | Some(b'\n') => {
                    return Err(self.error("unterminated regular expression literal"))
                }

                Some(b'\\') => self.offset += 2,

                Some(b'[') => {
                    in_class = true;
                    self.offset += 1;
                }

                Some(b']') => {
                    in_class = false;
                    self.offset += 1;
                }

                Some(b'/') if !in_class => {
                    self.offset += 1;
                    break;
                }

                Some(_) => self.offset += 1,
            }
        }

        while self.offset < self.bytes.len() && is_identifier_part(self.bytes[self.offset]) {
            self.offset += 1;
        }

        self.push(TokenKind::Regex, start);
        Ok(())
    }

    fn read_punctuator(&mut self) -> Result<(), SyntaxError> {
        let rest = &self.source[self.offset..];

        for punctuator in PUNCTUATORS {
            if rest.starts_with(punctuator) {
                let start = self.offset;
                self.offset += punctuator.len();
                self.push(TokenKind::Punctuator, start);
                return Ok(());
            }
        }

        Err(self.error(format!(
            "unexpected character `{}`",
            &rest[..rest.chars().next().map_or(0, char::len_utf8)]
        )))
    }
}

fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$'
}

fn is_identifier_part(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.value)
            .collect()
    }

    #[test]
    fn splits_punctuators_greedily() {
        assert_eq!(values("a >>>= b === c"), vec!["a", ">>>=", "b", "===", "c"]);
    }

    #[test]
    fn distinguishes_regex_from_division() {
        let tokens = tokenize("a / b; return /b/g;").unwrap();

        assert_eq!(tokens[1].kind, TokenKind::Punctuator);
        assert_eq!(tokens[5].kind, TokenKind::Regex);
        assert_eq!(tokens[5].value, "/b/g");
    }

    #[test]
    fn regex_after_open_paren() {
        let tokens = tokenize("x = (/re/);").unwrap();

        assert_eq!(tokens[3].kind, TokenKind::Regex);
    }

    #[test]
    fn leaves_dot_for_member_access_on_integers() {
        assert_eq!(values("(0).toString"), vec!["(", "0", ")", ".", "toString"]);
        assert_eq!(values("(0.5).x"), vec!["(", "0.5", ")", ".", "x"]);
    }

    #[test]
    fn tracks_lines() {
        let tokens = tokenize("a\n  b /* c\nd */ e").unwrap();

        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn rejects_unterminated_strings() {
        let error = tokenize("x = 'oops\n").unwrap_err();

        assert_eq!(error.line, 1);
    }
}
