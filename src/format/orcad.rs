//! OrCAD PCB2 and EESchema netlists.
//!
//! ```text
//! # EESchema Netlist Version 1.1
//! (
//!  ( 00000001 74LS00 U1 NAND {Lib=74LS00}
//!   ( 1 NET1 )
//!   ( 2 ? )
//!  )
//! )
//! *
//! { Allowed footprints by component:
//! $component U1
//!  DIP-14*
//! $endlist
//! $endfootprintlist
//! }
//! ```
//!
//! OrCAD PCB2 files open the list on the header line itself (`( { ... }`) and
//! have no filter trailer.

use logos::Logos;

use crate::context::ParserContext;
use crate::error::FormatError;
use crate::format::Format;
use crate::raw::{ForcedNet, RawComponent, RawFilterList, RawNetlist, RawPin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    Open,
    Close,
    Directive,
    Word,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
}

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LogosTokenKind {
    #[regex(r"\{[^}]*\}?")]
    Comment,
    #[regex(r"[^ \t\r\n{][^ \t\r\n]*")]
    Word,
    #[regex(r"[ \t\r\n]+", logos::skip)]
    WS,
}

/// Tokens of one line. Parentheses are structural only when they stand alone,
/// so net names such as `Net-(U1-Pad1)` survive.
fn tokens(line: &str) -> Vec<Token<'_>> {
    LogosTokenKind::lexer(line)
        .spanned()
        .filter_map(|(kind, span)| {
            let text = &line[span];
            let kind = match kind {
                Ok(LogosTokenKind::Comment) => return None,
                Ok(LogosTokenKind::Word) => match text {
                    "(" => TokenKind::Open,
                    ")" => TokenKind::Close,
                    t if ForcedNet::is_directive(t) => TokenKind::Directive,
                    _ => TokenKind::Word,
                },
                Ok(LogosTokenKind::WS) => unreachable!(),
                Err(_) => TokenKind::Error,
            };
            Some(Token { kind, text })
        })
        .collect()
}

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

enum Line<'a> {
    Open,
    Close,
    End,
    Component(Vec<Token<'a>>),
    FilterList,
}

fn classify(text: &str) -> Option<Line<'_>> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.to_ascii_lowercase().contains("allowed footprints") {
        return Some(Line::FilterList);
    }
    let toks = tokens(text);
    match kinds(&toks).as_slice() {
        [TokenKind::Open] => Some(Line::Open),
        [TokenKind::Close] => Some(Line::Close),
        [TokenKind::Word] if toks[0].text == "*" => Some(Line::End),
        [TokenKind::Open, rest @ ..]
            if rest
                .iter()
                .all(|k| matches!(k, TokenKind::Word | TokenKind::Directive)) =>
        {
            Some(Line::Component(toks))
        }
        _ => None,
    }
}

pub(crate) fn parse(ctx: &mut ParserContext, format: Format) -> Result<RawNetlist, FormatError> {
    let mut netlist = RawNetlist::new(format);

    // The OrCAD header line opens the component list, EESchema opens it on the next line.
    let Some(_) = ctx.next_line() else {
        return Err(ctx.eof("netlist header"));
    };
    let mut opened = format == Format::OrcadPcb2;
    let mut closed = false;

    while let Some((line, text)) = ctx.next_line() {
        let Some(kind) = classify(text) else {
            return Err(ctx.malformed(line, "unrecognized record"));
        };
        match kind {
            Line::Open if !opened => opened = true,
            Line::Close if opened && !closed => closed = true,
            Line::Component(toks) if opened && !closed => {
                let component = parse_component(ctx, line, &toks)?;
                log::trace!(
                    "{} ({} pins) at line {line}",
                    component.reference,
                    component.pins.len()
                );
                netlist.components.push(component);
            }
            Line::End if closed => {}
            Line::FilterList if closed => {
                netlist.filters.extend(parse_filter_lists(ctx, line)?);
            }
            _ => return Err(ctx.malformed(line, "unexpected record")),
        }
    }

    if !closed {
        return Err(ctx.eof("`)` closing the component list"));
    }
    Ok(netlist)
}

/// `( timestamp footprint reference [value] [(pins=NET)...]` followed by pin lines and `)`
fn parse_component(
    ctx: &mut ParserContext,
    line: usize,
    toks: &[Token],
) -> Result<RawComponent, FormatError> {
    let words: Vec<&str> = toks
        .iter()
        .filter(|t| t.kind == TokenKind::Word)
        .map(|t| t.text)
        .collect();
    let (timestamp, footprint, reference, value) = match words.as_slice() {
        [ts, fp, reference] => (*ts, *fp, *reference, ""),
        [ts, fp, reference, value] => (*ts, *fp, *reference, *value),
        _ => return Err(ctx.malformed(line, "expected `( timestamp footprint reference value`")),
    };
    let forced = toks
        .iter()
        .filter(|t| t.kind == TokenKind::Directive)
        .map(|t| {
            ForcedNet::parse(t.text)
                .ok_or_else(|| ctx.malformed(line, format!("bad net directive {}", t.text)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut component = RawComponent {
        line,
        timestamp: Some(timestamp.to_owned()),
        footprint: Some(footprint.to_owned()),
        reference: reference.to_owned(),
        value: value.to_owned(),
        forced,
        pins: vec![],
    };

    loop {
        let Some((pin_line, text)) = ctx.next_line() else {
            return Err(ctx.eof(format!("`)` closing component {reference}")));
        };
        let toks = tokens(text);
        match kinds(&toks).as_slice() {
            [TokenKind::Close] => break,
            [TokenKind::Open, TokenKind::Word, TokenKind::Word, TokenKind::Close] => {
                component
                    .pins
                    .push(RawPin::new(toks[1].text, toks[2].text));
            }
            _ => return Err(ctx.malformed(pin_line, "expected `( pin net )`")),
        }
    }
    Ok(component)
}

/// Body of the `{ Allowed footprints by component:` trailer
fn parse_filter_lists(
    ctx: &mut ParserContext,
    start: usize,
) -> Result<Vec<RawFilterList>, FormatError> {
    let mut lists = vec![];
    let mut current: Option<RawFilterList> = None;

    loop {
        let Some((line, text)) = ctx.next_line() else {
            return Err(ctx.eof(format!(
                "$endfootprintlist closing the list opened at line {start}"
            )));
        };
        let text = text.trim();
        let keyword = text.split_whitespace().next().unwrap_or_default();

        if keyword.eq_ignore_ascii_case("$endfootprintlist") {
            if current.is_some() {
                return Err(ctx.malformed(line, "missing $endlist"));
            }
            break;
        } else if keyword.eq_ignore_ascii_case("$component") {
            if current.is_some() {
                return Err(ctx.malformed(line, "missing $endlist"));
            }
            let reference = text[keyword.len()..].trim();
            if reference.is_empty() {
                return Err(ctx.malformed(line, "missing component reference"));
            }
            current = Some(RawFilterList {
                line,
                reference: reference.to_owned(),
                patterns: vec![],
            });
        } else if keyword.eq_ignore_ascii_case("$endlist") {
            let Some(list) = current.take() else {
                return Err(ctx.malformed(line, "$endlist without $component"));
            };
            lists.push(list);
        } else if let Some(list) = current.as_mut() {
            list.patterns.push(text.to_owned());
        } else {
            return Err(ctx.malformed(line, "footprint pattern outside of a $component block"));
        }
    }

    // The closing brace of the trailer is optional.
    if let Some((line, text)) = ctx.peek_line() {
        if text.trim() == "}" {
            ctx.next_line();
        } else {
            return Err(ctx.malformed(line, "unexpected data after $endfootprintlist"));
        }
    }
    Ok(lists)
}
