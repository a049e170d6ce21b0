// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! CMake script lexer.
//!
//! ```text
//! source text ──► RawCommand { name, line, args: [Token] }
//!
//! handles:  # line comments      #[==[ bracket comments ]==]
//!           "quoted args"        [==[ bracket args ]==]
//!           unquoted args        ( ) grouping tokens
//!           \<newline> continuations inside quoted args
//! ```
//!
//! Escape sequences are NOT decoded here; the evaluator decodes them
//! together with `${}` interpolation so `\$` can suppress expansion.

use super::ast::{Token, TokenKind};
use crate::error::ParseError;

/// A lexed command invocation, before block folding.
#[derive(Debug, Clone)]
pub(super) struct RawCommand {
    pub(super) name: String,
    pub(super) line: u32,
    pub(super) args: Vec<Token>,
}

struct Lexer<'a> {
    src: &'a [u8],
    file: &'a str,
    pos: usize,
    line: u32,
}

/// Lexes a whole list file into a flat command sequence.
pub(super) fn lex(source: &str, file: &str) -> Result<Vec<RawCommand>, ParseError> {
    let mut lexer = Lexer {
        src: source.as_bytes(),
        file,
        pos: 0,
        line: 1,
    };
    let mut commands = Vec::new();

    loop {
        lexer.skip_blank()?;
        if lexer.at_end() {
            return Ok(commands);
        }
        commands.push(lexer.lex_command()?);
    }
}

impl Lexer<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Skips whitespace, newlines and comments between commands/arguments.
    fn skip_blank(&mut self) -> Result<(), ParseError> {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.bump();
                }
                b'#' => {
                    self.pos += 1;
                    if let Some(level) = self.bracket_open_level() {
                        self.consume_bracket_body(level)?;
                    } else {
                        while let Some(c) = self.peek() {
                            if c == b'\n' {
                                break;
                            }
                            self.pos += 1;
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// If the cursor sits on `[=*[`, consumes the opener and returns the
    /// `=` count. Leaves the cursor untouched otherwise.
    fn bracket_open_level(&mut self) -> Option<usize> {
        let mut probe = self.pos;
        if self.src.get(probe) != Some(&b'[') {
            return None;
        }
        probe += 1;
        let mut level = 0;
        while self.src.get(probe) == Some(&b'=') {
            level += 1;
            probe += 1;
        }
        if self.src.get(probe) != Some(&b'[') {
            return None;
        }
        self.pos = probe + 1;
        Some(level)
    }

    /// Consumes bytes up to and including the matching `]=*]`, returning
    /// the raw body. A leading newline directly after the opener is
    /// dropped, per the bracket-argument rule.
    fn consume_bracket_body(&mut self, level: usize) -> Result<String, ParseError> {
        if self.peek() == Some(b'\n') {
            self.bump();
        } else if self.peek() == Some(b'\r') {
            self.bump();
            if self.peek() == Some(b'\n') {
                self.bump();
            }
        }

        let start = self.pos;
        while self.pos < self.src.len() {
            if self.src[self.pos] == b']' {
                let mut probe = self.pos + 1;
                let mut eq = 0;
                while self.src.get(probe) == Some(&b'=') {
                    eq += 1;
                    probe += 1;
                }
                if eq == level && self.src.get(probe) == Some(&b']') {
                    let body = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
                    self.pos = probe + 1;
                    return Ok(body);
                }
            }
            self.bump();
        }
        Err(ParseError::UnterminatedBracket {
            file: self.file.to_string(),
            line: self.line,
            level,
        })
    }

    fn lex_command(&mut self) -> Result<RawCommand, ParseError> {
        let line = self.line;
        let start = self.pos;

        let first = self.peek().unwrap_or(b'\0');
        if !(first.is_ascii_alphabetic() || first == b'_') {
            return Err(ParseError::UnexpectedToken {
                file: self.file.to_string(),
                line: self.line,
                found: char::from(first),
            });
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();

        self.skip_blank()?;
        if self.peek() != Some(b'(') {
            return Err(ParseError::UnbalancedParen {
                file: self.file.to_string(),
                line,
                command: name,
            });
        }
        self.pos += 1;

        let args = self.lex_args(&name, line)?;
        Ok(RawCommand { name, line, args })
    }

    /// Lexes arguments up to the command's closing `)`. Nested bare parens
    /// become [`TokenKind::Paren`] tokens so the logic evaluator can group.
    fn lex_args(&mut self, command: &str, line: u32) -> Result<Vec<Token>, ParseError> {
        let mut args = Vec::new();
        let mut depth = 0usize;

        loop {
            self.skip_blank()?;
            let Some(c) = self.peek() else {
                return Err(ParseError::UnbalancedParen {
                    file: self.file.to_string(),
                    line,
                    command: command.to_string(),
                });
            };
            match c {
                b')' => {
                    self.pos += 1;
                    if depth == 0 {
                        return Ok(args);
                    }
                    depth -= 1;
                    args.push(Token {
                        text: ")".to_string(),
                        kind: TokenKind::Paren,
                    });
                }
                b'(' => {
                    self.pos += 1;
                    depth += 1;
                    args.push(Token {
                        text: "(".to_string(),
                        kind: TokenKind::Paren,
                    });
                }
                b'"' => {
                    self.pos += 1;
                    args.push(self.lex_quoted()?);
                }
                b'[' => {
                    if let Some(level) = self.bracket_open_level() {
                        let body = self.consume_bracket_body(level)?;
                        args.push(Token {
                            text: body,
                            kind: TokenKind::Bracket,
                        });
                    } else {
                        args.push(self.lex_unquoted());
                    }
                }
                _ => args.push(self.lex_unquoted()),
            }
        }
    }

    fn lex_quoted(&mut self) -> Result<Token, ParseError> {
        let open_line = self.line;
        let mut text = String::new();

        loop {
            let Some(c) = self.bump() else {
                return Err(ParseError::UnterminatedString {
                    file: self.file.to_string(),
                    line: open_line,
                });
            };
            match c {
                b'"' => {
                    return Ok(Token {
                        text,
                        kind: TokenKind::Quoted,
                    });
                }
                b'\\' => {
                    match self.peek() {
                        // Line continuation: drop backslash + newline.
                        Some(b'\n') => {
                            self.bump();
                        }
                        Some(b'\r') => {
                            self.bump();
                            if self.peek() == Some(b'\n') {
                                self.bump();
                            }
                        }
                        Some(next) => {
                            text.push('\\');
                            text.push(char::from(next));
                            self.bump();
                        }
                        None => text.push('\\'),
                    }
                }
                _ => text.push(char::from(c)),
            }
        }
    }

    fn lex_unquoted(&mut self) -> Token {
        let start = self.pos;

        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\r' | b'\n' | b'(' | b')' | b'"' => break,
                b'\\' => {
                    // Keep the escape verbatim; it also shields the next byte
                    // from terminating the token.
                    self.pos += 1;
                    if self.peek().is_some() {
                        self.bump();
                    }
                }
                _ => {
                    self.pos += 1;
                }
            }
        }

        Token {
            text: String::from_utf8_lossy(&self.src[start..self.pos]).into_owned(),
            kind: TokenKind::Unquoted,
        }
    }
}
