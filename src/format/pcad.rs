//! PCAD (`{COMPONENT ORCAD.PCB`) netlists.
//!
//! ```text
//! {COMPONENT ORCAD.PCB
//!  {ENVIRONMENT ORCAD.PCB
//!   ...
//!  }
//!  {DETAIL
//!   {SUBCOMP
//!    {I 74LS00.PRT (14=VCC) U1
//!     {CN
//!      1 NET1
//!      2 ?
//!     }
//!    }
//!   }
//!  }
//! }
//! ```
//!
//! The value ends at `.PRT` and only its first 8 characters are significant.
//! Blocks other than `DETAIL`, `SUBCOMP`, `I` and `CN` are skipped whole.

use std::iter::Peekable;

use logos::{Logos, SpannedIter};

use crate::context::ParserContext;
use crate::error::FormatError;
use crate::format::Format;
use crate::raw::{ForcedNet, RawComponent, RawNetlist, RawPin};

const VALUE_WIDTH: usize = 8;
const VALUE_SUFFIX: &str = ".PRT";

type Span = logos::Span;

struct Token {
    kind: TokenKind,
    span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    BlockOpen,
    BlockClose,
    Directive,
    Word,
    Error,
}

struct TokenIter<'a> {
    input: &'a str,
    iter: SpannedIter<'a, LogosTokenKind>,
}

impl<'a> TokenIter<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            iter: LogosTokenKind::lexer(input).spanned(),
        }
    }
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let (kind, span) = self.iter.next()?;
        let kind = match kind {
            Ok(LogosTokenKind::BlockOpen) => TokenKind::BlockOpen,
            Ok(LogosTokenKind::BlockClose) => TokenKind::BlockClose,
            Ok(LogosTokenKind::Word) if ForcedNet::is_directive(&self.input[span.clone()]) => {
                TokenKind::Directive
            }
            Ok(LogosTokenKind::Word) => TokenKind::Word,
            Ok(LogosTokenKind::WS) => unreachable!(),
            Err(_) => TokenKind::Error,
        };
        Some(Token { kind, span })
    }
}

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LogosTokenKind {
    #[regex(r"\{[A-Za-z_]*")]
    BlockOpen,
    #[token("}")]
    BlockClose,
    #[regex(r"[^ \t\r\n{}]+")]
    Word,
    #[regex(r"[ \t\r\n]+", logos::skip)]
    WS,
}

struct Parser<'a, 'c> {
    ctx: &'c ParserContext<'a>,
    input: &'a str,
    iter: Peekable<TokenIter<'a>>,
}

impl<'a, 'c> Parser<'a, 'c> {
    fn new(ctx: &'c ParserContext<'a>) -> Self {
        let input = ctx.input();
        Self {
            ctx,
            input,
            iter: TokenIter::new(input).peekable(),
        }
    }

    fn text(&self, tok: &Token) -> &'a str {
        &self.input[tok.span.clone()]
    }

    /// Name of a block opener, `{DETAIL` -> `DETAIL`
    fn block_name(&self, tok: &Token) -> &'a str {
        &self.text(tok)[1..]
    }

    fn get(&mut self, expected: &str) -> Result<Token, FormatError> {
        self.iter.next().ok_or_else(|| self.ctx.eof(expected))
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.iter.peek().map(|tok| tok.kind)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, FormatError> {
        let tok = self.get(expected)?;
        if tok.kind == kind {
            Ok(tok)
        } else {
            Err(self.unexpected(&tok, expected))
        }
    }

    fn unexpected(&self, tok: &Token, expected: &str) -> FormatError {
        self.ctx.malformed_at(
            tok.span.start,
            format!("expected {expected}, found `{}`", self.text(tok)),
        )
    }

    /// Consume the rest of a block whose opener was already read
    fn skip_block(&mut self, name: &str) -> Result<(), FormatError> {
        let mut depth = 1;
        while depth > 0 {
            let tok = self.get(&format!("`}}` closing {{{name}"))?;
            match tok.kind {
                TokenKind::BlockOpen => depth += 1,
                TokenKind::BlockClose => depth -= 1,
                TokenKind::Error => return Err(self.unexpected(&tok, "a token")),
                TokenKind::Directive | TokenKind::Word => {}
            }
        }
        Ok(())
    }

    fn parse_file(&mut self) -> Result<RawNetlist, FormatError> {
        let mut netlist = RawNetlist::new(Format::Pcad);

        let open = self.expect(TokenKind::BlockOpen, "{COMPONENT")?;
        if !self.block_name(&open).eq_ignore_ascii_case("COMPONENT") {
            return Err(self.unexpected(&open, "{COMPONENT"));
        }
        let kind = self.expect(TokenKind::Word, "ORCAD.PCB")?;
        if !self.text(&kind).eq_ignore_ascii_case("ORCAD.PCB") {
            return Err(self.unexpected(&kind, "ORCAD.PCB"));
        }

        loop {
            let tok = self.get("`}` closing {COMPONENT")?;
            match tok.kind {
                TokenKind::BlockClose => break,
                TokenKind::BlockOpen if self.block_name(&tok).eq_ignore_ascii_case("DETAIL") => {
                    self.parse_detail(&mut netlist)?;
                }
                TokenKind::BlockOpen => {
                    let name = self.block_name(&tok);
                    log::trace!("Skipping {{{name} block");
                    self.skip_block(name)?;
                }
                _ => return Err(self.unexpected(&tok, "a block")),
            }
        }

        if let Some(tok) = self.iter.next() {
            return Err(self.unexpected(&tok, "end of file"));
        }
        Ok(netlist)
    }

    fn parse_detail(&mut self, netlist: &mut RawNetlist) -> Result<(), FormatError> {
        loop {
            let tok = self.get("`}` closing {DETAIL")?;
            match tok.kind {
                TokenKind::BlockClose => return Ok(()),
                TokenKind::BlockOpen if self.block_name(&tok).eq_ignore_ascii_case("SUBCOMP") => {
                    self.parse_subcomp(netlist)?;
                }
                TokenKind::BlockOpen => {
                    let name = self.block_name(&tok);
                    self.skip_block(name)?;
                }
                _ => return Err(self.unexpected(&tok, "a block")),
            }
        }
    }

    fn parse_subcomp(&mut self, netlist: &mut RawNetlist) -> Result<(), FormatError> {
        loop {
            let tok = self.get("`}` closing {SUBCOMP")?;
            match tok.kind {
                TokenKind::BlockClose => return Ok(()),
                TokenKind::BlockOpen if self.block_name(&tok).eq_ignore_ascii_case("I") => {
                    let component = self.parse_instance(&tok)?;
                    log::trace!(
                        "{} ({} pins) at line {}",
                        component.reference,
                        component.pins.len(),
                        component.line
                    );
                    netlist.components.push(component);
                }
                TokenKind::BlockOpen => {
                    let name = self.block_name(&tok);
                    self.skip_block(name)?;
                }
                _ => return Err(self.unexpected(&tok, "a block")),
            }
        }
    }

    /// `{I value.PRT [(pins=NET)...] reference` then `{CN` blocks and `}`
    fn parse_instance(&mut self, open: &Token) -> Result<RawComponent, FormatError> {
        let line = self.ctx.line_of(open.span.start);
        let value = self.expect(TokenKind::Word, "a part value")?;
        let value = part_value(self.text(&value));

        let mut forced = vec![];
        while self.peek() == Some(TokenKind::Directive) {
            let tok = self.get("a net directive")?;
            let directive = ForcedNet::parse(self.text(&tok))
                .ok_or_else(|| self.unexpected(&tok, "a net directive `(pins=NET)`"))?;
            forced.push(directive);
        }

        let reference = self.expect(TokenKind::Word, "a reference")?;
        let mut component = RawComponent {
            line,
            timestamp: None,
            footprint: None,
            reference: self.text(&reference).to_owned(),
            value,
            forced,
            pins: vec![],
        };

        loop {
            let tok = self.get("`}` closing {I")?;
            match tok.kind {
                TokenKind::BlockClose => return Ok(component),
                TokenKind::BlockOpen if self.block_name(&tok).eq_ignore_ascii_case("CN") => {
                    self.parse_connections(&mut component)?;
                }
                TokenKind::BlockOpen => {
                    let name = self.block_name(&tok);
                    self.skip_block(name)?;
                }
                _ => return Err(self.unexpected(&tok, "a block")),
            }
        }
    }

    /// `pin net` pairs up to the closing brace
    fn parse_connections(&mut self, component: &mut RawComponent) -> Result<(), FormatError> {
        loop {
            let tok = self.get("`}` closing {CN")?;
            match tok.kind {
                TokenKind::BlockClose => return Ok(()),
                TokenKind::Word => {
                    let net = self.expect(TokenKind::Word, "a net name")?;
                    component
                        .pins
                        .push(RawPin::new(self.text(&tok), self.text(&net)));
                }
                _ => return Err(self.unexpected(&tok, "a pin number")),
            }
        }
    }
}

/// Part value up to `.PRT`, cut to the fixed field width
fn part_value(text: &str) -> String {
    let end = text
        .char_indices()
        .find(|&(i, _)| {
            text.get(i..i + VALUE_SUFFIX.len())
                .is_some_and(|s| s.eq_ignore_ascii_case(VALUE_SUFFIX))
        })
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].chars().take(VALUE_WIDTH).collect()
}

pub(crate) fn parse(ctx: &ParserContext) -> Result<RawNetlist, FormatError> {
    Parser::new(ctx).parse_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    const SAMPLE: &str = "{COMPONENT ORCAD.PCB
 {ENVIRONMENT ORCAD.PCB
  {TYPE NETLIST}
  {DATE 12-03-96}
 }
 {DETAIL
  {SUBCOMP
   {I 74LS00.PRT U1
    {CN
     1 NET1
     2 NET2
     3 ?
    }
   }
   {I LONGVALUE123.PRT (7,14=GND) U2
    {CN
     7 N0004
    }
   }
  }
 }
}
";

    fn parse_str(input: &str) -> Result<RawNetlist, FormatError> {
        parse(&ParserContext::new(input))
    }

    #[rstest]
    #[case("74LS00.PRT", "74LS00")]
    #[case("74ls00.prt", "74ls00")]
    #[case("LONGVALUE123.PRT", "LONGVALU")]
    #[case("10K", "10K")]
    #[case("A.PRT.PRT", "A")]
    fn extracts_part_value(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(part_value(input), expected);
    }

    #[test]
    fn parses_instances() {
        let netlist = parse_str(SAMPLE).unwrap();
        assert_eq!(netlist.format, Format::Pcad);
        assert_eq!(netlist.components.len(), 2);

        let u1 = &netlist.components[0];
        assert_eq!(u1.reference, "U1");
        assert_eq!(u1.value, "74LS00");
        assert_eq!(u1.line, 8);
        assert_eq!(
            u1.pins,
            [
                RawPin::new("1", "NET1"),
                RawPin::new("2", "NET2"),
                RawPin::new("3", "?")
            ]
        );

        let u2 = &netlist.components[1];
        assert_eq!(u2.value, "LONGVALU");
        assert_eq!(
            u2.forced,
            [ForcedNet {
                pins: vec!["7".into(), "14".into()],
                net: "GND".into()
            }]
        );
    }

    #[test]
    fn reports_missing_net_with_line() {
        let input = "{COMPONENT ORCAD.PCB\n {DETAIL\n  {SUBCOMP\n   {I R.PRT R1\n    {CN\n     1\n    }\n   }\n  }\n }\n}\n";
        let err = parse_str(input).unwrap_err();
        assert_eq!(err.line(), 7);
        assert!(matches!(err, FormatError::Malformed { .. }));
    }

    #[test]
    fn reports_unterminated_block() {
        let input = "{COMPONENT ORCAD.PCB\n {DETAIL\n  {SUBCOMP\n";
        assert!(matches!(
            parse_str(input),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn rejects_trailing_data() {
        let input = "{COMPONENT ORCAD.PCB\n}\nextra\n";
        let err = parse_str(input).unwrap_err();
        assert_eq!(err.line(), 3);
    }
}
