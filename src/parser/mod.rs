// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! CMake script parser.
//!
//! ```text
//! parse_str / parse_file
//!        |
//!        v
//!    lexer  --> RawCommand stream
//!        |
//!        v
//!    fold   --> ListFile { nodes: [Node] }
//!
//! if/elseif/else/endif      -> Node::If
//! while/endwhile            -> Node::While
//! foreach/endforeach        -> Node::Foreach
//! function/endfunction      -> Node::Def(Function)
//! macro/endmacro            -> Node::Def(Macro)
//! everything else           -> Node::Command
//! ```

pub mod ast;
mod lexer;

#[cfg(test)]
mod tests;

use std::path::Path;

use anyhow::Context;

use crate::error::{ParseError, Result};
use ast::{Command, DefKind, IfBranch, ListFile, Node, Origin};
use lexer::RawCommand;

/// Parses CMake script text into a block-structured list file.
///
/// # Errors
///
/// Returns a [`ParseError`] for malformed input: unterminated strings or
/// brackets, unbalanced parentheses, or mismatched block terminators.
pub fn parse_str(source: &str, file: &str) -> std::result::Result<ListFile, ParseError> {
    let commands = lexer::lex(source, file)?;
    let mut stream = commands.into_iter().peekable();
    let nodes = parse_block(&mut stream, file, None)?;
    Ok(ListFile {
        file: file.to_string(),
        nodes,
    })
}

/// Reads and parses a list file from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ListFile> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_str(&source, &path.to_string_lossy())?)
}

type Stream = std::iter::Peekable<std::vec::IntoIter<RawCommand>>;

/// Terminator expected for the innermost open block, or `None` at the top
/// level. `elseif`/`else` are only legal directly inside an `if` block and
/// are handled by the caller via peeking.
fn parse_block(
    stream: &mut Stream,
    file: &str,
    terminator: Option<&str>,
) -> std::result::Result<Vec<Node>, ParseError> {
    let mut nodes = Vec::new();

    loop {
        let Some(next) = stream.peek() else {
            return match terminator {
                None => Ok(nodes),
                Some(term) => Err(ParseError::UnexpectedEof {
                    file: file.to_string(),
                    expected: term.to_string(),
                }),
            };
        };

        let lowered = next.name.to_ascii_lowercase();
        match lowered.as_str() {
            name if Some(name) == terminator => return Ok(nodes),
            "elseif" | "else" if terminator == Some("endif") => return Ok(nodes),
            "endif" | "endwhile" | "endforeach" | "endfunction" | "endmacro" | "elseif"
            | "else" => {
                let cmd = stream.next().unwrap_or_else(|| unreachable!());
                return Err(ParseError::UnbalancedBlock {
                    file: file.to_string(),
                    line: cmd.line,
                    expected: terminator.unwrap_or("<top level>").to_string(),
                    found: lowered,
                });
            }
            "if" => nodes.push(parse_if(stream, file)?),
            "while" => {
                let header = take_command(stream, file);
                let body = parse_block(stream, file, Some("endwhile"))?;
                consume_terminator(stream, file, "endwhile")?;
                nodes.push(Node::While {
                    condition: header,
                    body,
                });
            }
            "foreach" => {
                let header = take_command(stream, file);
                let body = parse_block(stream, file, Some("endforeach"))?;
                consume_terminator(stream, file, "endforeach")?;
                nodes.push(Node::Foreach { header, body });
            }
            "function" => {
                let header = take_command(stream, file);
                let body = parse_block(stream, file, Some("endfunction"))?;
                consume_terminator(stream, file, "endfunction")?;
                nodes.push(Node::Def {
                    kind: DefKind::Function,
                    header,
                    body,
                });
            }
            "macro" => {
                let header = take_command(stream, file);
                let body = parse_block(stream, file, Some("endmacro"))?;
                consume_terminator(stream, file, "endmacro")?;
                nodes.push(Node::Def {
                    kind: DefKind::Macro,
                    header,
                    body,
                });
            }
            _ => nodes.push(Node::Command(take_command(stream, file))),
        }
    }
}

fn parse_if(stream: &mut Stream, file: &str) -> std::result::Result<Node, ParseError> {
    let header = take_command(stream, file);
    let origin = header.origin.clone();
    let mut branches = Vec::new();
    let mut seen_else = false;

    let body = parse_block(stream, file, Some("endif"))?;
    branches.push(IfBranch {
        condition: Some(header),
        body,
    });

    loop {
        let Some(next) = stream.peek() else {
            return Err(ParseError::UnexpectedEof {
                file: file.to_string(),
                expected: "endif".to_string(),
            });
        };
        match next.name.to_ascii_lowercase().as_str() {
            "elseif" => {
                let header = take_command(stream, file);
                if seen_else {
                    return Err(ParseError::UnbalancedBlock {
                        file: file.to_string(),
                        line: header.origin.line,
                        expected: "endif".to_string(),
                        found: "elseif".to_string(),
                    });
                }
                let body = parse_block(stream, file, Some("endif"))?;
                branches.push(IfBranch {
                    condition: Some(header),
                    body,
                });
            }
            "else" => {
                let header = take_command(stream, file);
                if seen_else {
                    return Err(ParseError::UnbalancedBlock {
                        file: file.to_string(),
                        line: header.origin.line,
                        expected: "endif".to_string(),
                        found: "else".to_string(),
                    });
                }
                seen_else = true;
                let body = parse_block(stream, file, Some("endif"))?;
                branches.push(IfBranch {
                    condition: None,
                    body,
                });
            }
            "endif" => {
                stream.next();
                return Ok(Node::If { branches, origin });
            }
            _ => unreachable!("parse_block only stops on elseif/else/endif"),
        }
    }
}

fn take_command(stream: &mut Stream, file: &str) -> Command {
    let raw = stream.next().unwrap_or_else(|| unreachable!());
    Command {
        origin: Origin::new(file, raw.line),
        name: raw.name,
        args: raw.args,
    }
}

fn consume_terminator(
    stream: &mut Stream,
    file: &str,
    expected: &str,
) -> std::result::Result<(), ParseError> {
    match stream.next() {
        Some(cmd) if cmd.name.eq_ignore_ascii_case(expected) => Ok(()),
        Some(cmd) => Err(ParseError::UnbalancedBlock {
            file: file.to_string(),
            line: cmd.line,
            expected: expected.to_string(),
            found: cmd.name.to_ascii_lowercase(),
        }),
        None => Err(ParseError::UnexpectedEof {
            file: file.to_string(),
            expected: expected.to_string(),
        }),
    }
}
