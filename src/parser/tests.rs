// nobify-rs: CMake to C Build Driver Transpiler - Rust Port
//
// SPDX-FileCopyrightText: 2026 nobify-rs contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use super::ast::{DefKind, Node, TokenKind};
use super::parse_str;
use crate::error::ParseError;

fn first_command(source: &str) -> super::ast::Command {
    let list = parse_str(source, "test.cmake").unwrap();
    match list.nodes.into_iter().next().unwrap() {
        Node::Command(cmd) => cmd,
        other => panic!("expected command, got {other:?}"),
    }
}

#[test]
fn test_simple_command() {
    let cmd = first_command("add_library(core STATIC core.c)\n");
    assert_eq!(cmd.name, "add_library");
    assert_eq!(cmd.origin.line, 1);
    let args: Vec<_> = cmd.args.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(args, vec!["core", "STATIC", "core.c"]);
    assert!(cmd.args.iter().all(|t| t.kind == TokenKind::Unquoted));
}

#[test]
fn test_quoted_and_bracket_args() {
    let cmd = first_command("set(msg \"hello world\" [==[raw ${not_expanded}]==])\n");
    assert_eq!(cmd.args.len(), 3);
    assert_eq!(cmd.args[1].kind, TokenKind::Quoted);
    assert_eq!(cmd.args[1].text, "hello world");
    assert_eq!(cmd.args[2].kind, TokenKind::Bracket);
    assert_eq!(cmd.args[2].text, "raw ${not_expanded}");
}

#[test]
fn test_quoted_keeps_escapes_verbatim() {
    let cmd = first_command(r#"set(v "a\nb\"c\$d")"#);
    assert_eq!(cmd.args[1].text, r#"a\nb\"c\$d"#);
}

#[test]
fn test_quoted_line_continuation() {
    let cmd = first_command("set(v \"one\\\ntwo\")\n");
    assert_eq!(cmd.args[1].text, "onetwo");
}

#[test]
fn test_comments_and_bracket_comments() {
    let list = parse_str(
        "# leading comment\nproject(P) # trailing\n#[==[ block\ncomment ]==]\nset(A 1)\n",
        "test.cmake",
    )
    .unwrap();
    assert_eq!(list.nodes.len(), 2);
    assert_eq!(list.nodes[1].origin().line, 5);
}

#[test]
fn test_nested_parens_become_tokens() {
    let list = parse_str("if((A) AND (B OR C))\nendif()\n", "t.cmake").unwrap();
    let Node::If { branches, .. } = &list.nodes[0] else {
        panic!("expected if node");
    };
    let cond = branches[0].condition.as_ref().unwrap();
    let texts: Vec<_> = cond.args.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["(", "A", ")", "AND", "(", "B", "OR", "C", ")"]);
    assert_eq!(cond.args[0].kind, TokenKind::Paren);
}

#[test]
fn test_if_elseif_else_folding() {
    let list = parse_str(
        "if(A)\nset(X 1)\nelseif(B)\nset(X 2)\nset(Y 2)\nelse()\nset(X 3)\nendif()\n",
        "t.cmake",
    )
    .unwrap();
    let Node::If { branches, .. } = &list.nodes[0] else {
        panic!("expected if node");
    };
    assert_eq!(branches.len(), 3);
    assert!(branches[0].condition.is_some());
    assert_eq!(branches[0].body.len(), 1);
    assert_eq!(branches[1].body.len(), 2);
    assert!(branches[2].condition.is_none());
    assert_eq!(branches[2].body.len(), 1);
}

#[test]
fn test_nested_blocks() {
    let list = parse_str(
        "while(A)\nforeach(i RANGE 3)\nif(B)\nbreak()\nendif()\nendforeach()\nendwhile()\n",
        "t.cmake",
    )
    .unwrap();
    let Node::While { body, .. } = &list.nodes[0] else {
        panic!("expected while node");
    };
    let Node::Foreach { body: inner, .. } = &body[0] else {
        panic!("expected foreach node");
    };
    assert!(matches!(inner[0], Node::If { .. }));
}

#[test]
fn test_function_and_macro_capture() {
    let list = parse_str(
        "function(f arg)\nset(${arg} 1 PARENT_SCOPE)\nendfunction()\nmacro(m)\nendmacro()\n",
        "t.cmake",
    )
    .unwrap();
    let Node::Def { kind, header, body } = &list.nodes[0] else {
        panic!("expected def node");
    };
    assert_eq!(*kind, DefKind::Function);
    assert_eq!(header.args[0].text, "f");
    assert_eq!(body.len(), 1);
    let Node::Def { kind, body, .. } = &list.nodes[1] else {
        panic!("expected def node");
    };
    assert_eq!(*kind, DefKind::Macro);
    assert!(body.is_empty());
}

#[test]
fn test_case_insensitive_terminators() {
    let list = parse_str("IF(A)\nENDIF()\n", "t.cmake").unwrap();
    assert!(matches!(list.nodes[0], Node::If { .. }));
}

#[test]
fn test_unterminated_block_errors() {
    let err = parse_str("if(A)\nset(X 1)\n", "t.cmake").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedEof { .. }));
}

#[test]
fn test_stray_terminator_errors() {
    let err = parse_str("endwhile()\n", "t.cmake").unwrap_err();
    assert!(matches!(err, ParseError::UnbalancedBlock { .. }));
}

#[test]
fn test_mismatched_terminator_errors() {
    let err = parse_str("while(A)\nendforeach()\n", "t.cmake").unwrap_err();
    assert!(matches!(err, ParseError::UnbalancedBlock { .. }));
}

#[test]
fn test_unterminated_string_errors() {
    let err = parse_str("set(v \"abc)\n", "t.cmake").unwrap_err();
    assert!(matches!(err, ParseError::UnterminatedString { .. }));
}

#[test]
fn test_missing_paren_errors() {
    let err = parse_str("project P\n", "t.cmake").unwrap_err();
    assert!(matches!(err, ParseError::UnbalancedParen { .. }));
}
