//! Viewlogic `.net` + `.pkg` netlists.
//!
//! The package file declares components, the net file connects their pins:
//!
//! ```text
//! 74LS00;DIP14;U1,U2          (value;package;references)
//! VCC;U1^14,U2^14,            (net;reference^pin,...)
//!     C1^1
//! ```
//!
//! A record whose last item is followed by a comma continues on the next line.
//! Spaces may surround separators but never appear inside a name.

use std::collections::HashMap;

use logos::Logos;

use crate::context::ParserContext;
use crate::error::{FormatError, Warning};
use crate::format::Format;
use crate::raw::{RawComponent, RawNetlist, RawPin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    Semicolon,
    Comma,
    Caret,
    Text,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
}

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LogosTokenKind {
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("^")]
    Caret,
    #[regex(r"[^;,^ \t\r\n]+")]
    Text,
    #[regex(r"[ \t\r\n]+", logos::skip)]
    WS,
}

/// Tokens of one logical record
fn tokens(record: &str) -> Vec<Token<'_>> {
    LogosTokenKind::lexer(record)
        .spanned()
        .map(|(kind, span)| {
            let kind = match kind {
                Ok(LogosTokenKind::Semicolon) => TokenKind::Semicolon,
                Ok(LogosTokenKind::Comma) => TokenKind::Comma,
                Ok(LogosTokenKind::Caret) => TokenKind::Caret,
                Ok(LogosTokenKind::Text) => TokenKind::Text,
                Ok(LogosTokenKind::WS) => unreachable!(),
                Err(_) => TokenKind::Error,
            };
            Token {
                kind,
                text: &record[span],
            }
        })
        .collect()
}

/// Two text tokens in a row are one name with a space in it
fn has_inner_space(tokens: &[Token]) -> bool {
    tokens
        .windows(2)
        .any(|w| w[0].kind == TokenKind::Text && w[1].kind == TokenKind::Text)
}

/// One record joined from its continuation lines
struct Record {
    line: usize,
    text: String,
}

/// Next logical record, skipping `|` comment lines
fn next_record(ctx: &mut ParserContext) -> Option<Record> {
    let (line, first) = loop {
        let (line, text) = ctx.next_line()?;
        if !text.trim_start().starts_with('|') {
            break (line, text);
        }
    };
    let mut text = first.trim().to_owned();
    while text.ends_with(',') {
        let Some((_, next)) = ctx.next_line() else {
            break;
        };
        text.push_str(next.trim());
    }
    Some(Record { line, text })
}

/// Items of a comma separated list, each a run of tokens. A trailing comma is allowed.
fn split_items<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<&'t [Token<'a>]> {
    let mut items: Vec<&[Token]> = tokens.split(|t| t.kind == TokenKind::Comma).collect();
    if items.last().is_some_and(|item| item.is_empty()) {
        items.pop();
    }
    items
}

fn field<'a>(tokens: &[Token<'a>]) -> Option<&'a str> {
    match tokens {
        [] => Some(""),
        [Token {
            kind: TokenKind::Text,
            text,
        }] => Some(*text),
        _ => None,
    }
}

/// `value;package;ref,ref,...`
fn parse_package(record: &Record, netlist: &mut RawNetlist) -> Result<(), FormatError> {
    let toks = tokens(&record.text);
    let fields: Vec<&[Token]> = toks.split(|t| t.kind == TokenKind::Semicolon).collect();
    let malformed = |message: &str| FormatError::Malformed {
        line: record.line,
        text: record.text.clone(),
        message: format!("package file: {message}"),
    };
    if has_inner_space(&toks) {
        return Err(malformed("names must not contain spaces"));
    }
    let [value, package, references] = fields.as_slice() else {
        return Err(malformed("expected `value;package;references`"));
    };
    let value = field(value).ok_or_else(|| malformed("bad part value"))?;
    let package = field(package).ok_or_else(|| malformed("bad package name"))?;

    for item in split_items(references) {
        let Some(reference) = field(item).filter(|r| !r.is_empty()) else {
            return Err(malformed("bad component reference"));
        };
        netlist.components.push(RawComponent {
            line: record.line,
            timestamp: None,
            footprint: (!package.is_empty()).then(|| package.to_owned()),
            reference: reference.to_owned(),
            value: value.to_owned(),
            forced: vec![],
            pins: vec![],
        });
    }
    Ok(())
}

/// `net;ref^pin,ref^pin,...`
fn parse_net(
    record: &Record,
    index: &HashMap<String, usize>,
    netlist: &mut RawNetlist,
) -> Result<(), FormatError> {
    let toks = tokens(&record.text);
    let malformed = |message: &str| FormatError::Malformed {
        line: record.line,
        text: record.text.clone(),
        message: message.to_owned(),
    };
    if has_inner_space(&toks) {
        return Err(malformed("names must not contain spaces"));
    }
    let (net, nodes) = match toks.as_slice() {
        [Token {
            kind: TokenKind::Text,
            text,
        }, Token {
            kind: TokenKind::Semicolon,
            ..
        }, rest @ ..] => (*text, rest),
        _ => return Err(malformed("expected `net;reference^pin,...`")),
    };

    for node in split_items(nodes) {
        let [Token {
            kind: TokenKind::Text,
            text: reference,
        }, Token {
            kind: TokenKind::Caret,
            ..
        }, Token {
            kind: TokenKind::Text,
            text: pin,
        }] = node
        else {
            return Err(malformed("expected `reference^pin`"));
        };
        match index.get(*reference) {
            Some(&i) => netlist.components[i].pins.push(RawPin::new(*pin, net)),
            None => {
                let warning = Warning::UnknownReference {
                    reference: (*reference).to_owned(),
                    context: format!("Net {net}"),
                };
                log::warn!("{warning}");
                netlist.warnings.push(warning);
            }
        }
    }
    Ok(())
}

pub(crate) fn parse(
    net: &mut ParserContext,
    pkg: &mut ParserContext,
) -> Result<RawNetlist, FormatError> {
    let mut netlist = RawNetlist::new(Format::ViewlogicNetPkg);

    while let Some(record) = next_record(pkg) {
        parse_package(&record, &mut netlist)?;
    }

    let mut index = HashMap::new();
    for (i, component) in netlist.components.iter().enumerate() {
        index.entry(component.reference.clone()).or_insert(i);
    }

    while let Some(record) = next_record(net) {
        parse_net(&record, &index, &mut netlist)?;
    }
    log::debug!(
        "Read {} packaged components from the .pkg file",
        netlist.components.len()
    );
    Ok(netlist)
}
