//! Viewlogic WIRELIST netlists.
//!
//! Every line starts with a record code:
//!
//! - `W`, `M`: start a new physical unit
//! - `I`: `VALUE=` and `REFDES=` attributes of the unit, then one net per
//!   remaining token; the token position is the pin index
//! - `API`: `API index pin` gives the real pin number of a pin index
//! - `AP`, `AS`: a pseudo-component, `PKG_TYPE=`, `PARTS=`, `REFDES=` and
//!   `SIGNAL=net=pin` attributes
//!
//! Lines starting with `|` are comments. Several units may share one
//! reference; they are merged after parsing.

use std::collections::HashMap;

use logos::Logos;

use crate::context::ParserContext;
use crate::error::FormatError;
use crate::format::Format;
use crate::raw::{PseudoComponent, RawComponent, RawNetlist, RawPin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token<'a> {
    /// `KEY=value`
    Attribute(&'a str, &'a str),
    Word(&'a str),
    Error(&'a str),
}

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LogosTokenKind {
    #[regex(r"[^ \t\r\n]+")]
    Word,
    #[regex(r"[ \t\r\n]+", logos::skip)]
    WS,
}

fn tokens(line: &str) -> Vec<Token<'_>> {
    LogosTokenKind::lexer(line)
        .spanned()
        .map(|(kind, span)| {
            let text = &line[span];
            match kind {
                Ok(LogosTokenKind::Word) => match text.split_once('=') {
                    Some((key, value))
                        if !key.is_empty()
                            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
                    {
                        Token::Attribute(key, value)
                    }
                    _ => Token::Word(text),
                },
                Ok(LogosTokenKind::WS) => unreachable!(),
                Err(_) => Token::Error(text),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Code {
    Wire,
    Macro,
    Instance,
    PinIndex,
    Pseudo,
}

impl Code {
    fn parse(text: &str) -> Option<Code> {
        match text.to_ascii_uppercase().as_str() {
            "W" => Some(Code::Wire),
            "M" => Some(Code::Macro),
            "I" => Some(Code::Instance),
            "API" => Some(Code::PinIndex),
            "AP" | "AS" => Some(Code::Pseudo),
            _ => None,
        }
    }
}

/// One physical unit under construction
#[derive(Debug, Default)]
struct Unit {
    line: usize,
    reference: Option<String>,
    value: String,
    nets: Vec<String>,
    /// 1-based pin index -> real pin number
    pin_numbers: HashMap<usize, String>,
}

impl Unit {
    fn into_component(self, ctx: &ParserContext) -> Result<RawComponent, FormatError> {
        let Some(reference) = self.reference else {
            return Err(ctx.malformed(self.line, "unit has no REFDES"));
        };
        let mut pin_numbers = self.pin_numbers;
        let pins = self
            .nets
            .into_iter()
            .enumerate()
            .map(|(i, net)| {
                let index = i + 1;
                let number = pin_numbers
                    .remove(&index)
                    .unwrap_or_else(|| index.to_string());
                RawPin::new(number, net)
            })
            .collect();
        Ok(RawComponent {
            line: self.line,
            timestamp: None,
            footprint: None,
            reference,
            value: self.value,
            forced: vec![],
            pins,
        })
    }
}

pub(crate) fn parse(ctx: &mut ParserContext) -> Result<RawNetlist, FormatError> {
    let mut netlist = RawNetlist::new(Format::ViewlogicWirelist);
    let mut units: Vec<Unit> = vec![];

    while let Some((line, text)) = ctx.next_line() {
        if text.trim_start().starts_with('|') {
            continue;
        }
        let toks = tokens(text);
        let Some((Token::Word(code), args)) = toks.split_first() else {
            return Err(ctx.malformed(line, "expected a record code"));
        };
        let Some(code) = Code::parse(code) else {
            return Err(ctx.malformed(line, format!("unknown record code `{code}`")));
        };
        if let Some(Token::Error(bad)) = args.iter().find(|t| matches!(t, Token::Error(_))) {
            return Err(ctx.malformed(line, format!("bad token `{bad}`")));
        }

        match code {
            Code::Wire | Code::Macro => units.push(Unit {
                line,
                ..Default::default()
            }),
            Code::Instance => {
                let Some(unit) = units.last_mut() else {
                    return Err(ctx.malformed(line, "`I` record outside of a unit"));
                };
                for tok in args {
                    match *tok {
                        Token::Attribute(key, value) if key.eq_ignore_ascii_case("VALUE") => {
                            unit.value = value.to_owned();
                        }
                        Token::Attribute(key, value) if key.eq_ignore_ascii_case("REFDES") => {
                            unit.reference = Some(value.to_owned());
                        }
                        Token::Attribute(key, _) => {
                            log::trace!("Ignoring attribute {key} at line {line}");
                        }
                        Token::Word(net) => unit.nets.push(net.to_owned()),
                        Token::Error(_) => {}
                    }
                }
            }
            Code::PinIndex => {
                let Some(unit) = units.last_mut() else {
                    return Err(ctx.malformed(line, "`API` record outside of a unit"));
                };
                let [Token::Word(index), Token::Word(pin)] = args else {
                    return Err(ctx.malformed(line, "expected `API index pin`"));
                };
                let index = index
                    .parse::<usize>()
                    .ok()
                    .filter(|&i| i >= 1 && i <= unit.nets.len())
                    .ok_or_else(|| ctx.malformed(line, format!("no pin at index {index}")))?;
                unit.pin_numbers.insert(index, (*pin).to_owned());
            }
            Code::Pseudo => netlist.pseudo.push(parse_pseudo(ctx, line, args)?),
        }
    }

    for unit in units {
        netlist.components.push(unit.into_component(ctx)?);
    }
    log::debug!(
        "Read {} units and {} pseudo-components",
        netlist.components.len(),
        netlist.pseudo.len()
    );
    Ok(netlist)
}

fn parse_pseudo(
    ctx: &ParserContext,
    line: usize,
    args: &[Token],
) -> Result<PseudoComponent, FormatError> {
    let mut pseudo = PseudoComponent {
        line,
        ..Default::default()
    };
    for tok in args {
        let Token::Attribute(key, value) = *tok else {
            log::trace!("Ignoring {tok:?} at line {line}");
            continue;
        };
        match key.to_ascii_uppercase().as_str() {
            "PKG_TYPE" => pseudo.package = Some(value.to_owned()),
            "PARTS" => {
                let parts = value
                    .parse()
                    .map_err(|_| ctx.malformed(line, format!("bad PARTS count `{value}`")))?;
                pseudo.part_count = Some(parts);
            }
            "REFDES" => pseudo.reference = value.to_owned(),
            "SIGNAL" => {
                let Some((net, pin)) = value
                    .split_once('=')
                    .filter(|(net, pin)| !net.is_empty() && !pin.is_empty())
                else {
                    return Err(ctx.malformed(
                        line,
                        format!("expected SIGNAL=net=pin, found `{value}`"),
                    ));
                };
                pseudo.pins.push(RawPin::new(pin, net));
            }
            _ => log::trace!("Ignoring attribute {key} at line {line}"),
        }
    }
    if pseudo.reference.is_empty() {
        return Err(ctx.malformed(line, "pseudo-component has no REFDES"));
    }
    Ok(pseudo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn parse_str(input: &str) -> Result<RawNetlist, FormatError> {
        parse(&mut ParserContext::new(input))
    }

    #[test]
    fn lexer_splits_attributes() {
        assert_eq!(
            tokens("I VALUE=74LS00 SIGNAL=VCC=14 NET1 =X"),
            [
                Token::Word("I"),
                Token::Attribute("VALUE", "74LS00"),
                Token::Attribute("SIGNAL", "VCC=14"),
                Token::Word("NET1"),
                Token::Word("=X"),
            ]
        );
    }

    #[test]
    fn units_take_positional_nets() {
        let input = "| Wirelist created by ViewDraw\nW 74LS00\nI VALUE=74LS00 REFDES=U1 NET1 NET2 ?\nAPI 1 12\nAPI 3 14\n";
        let netlist = parse_str(input).unwrap();
        assert_eq!(netlist.components.len(), 1);
        let u1 = &netlist.components[0];
        assert_eq!(u1.reference, "U1");
        assert_eq!(u1.value, "74LS00");
        assert_eq!(u1.line, 2);
        assert_eq!(
            u1.pins,
            [
                RawPin::new("12", "NET1"),
                RawPin::new("2", "NET2"),
                RawPin::new("14", "?")
            ]
        );
    }

    #[test]
    fn reads_pseudo_components() {
        let input = "| Wirelist\nAP PKG_TYPE=DIP14 PARTS=4 REFDES=U1 SIGNAL=VCC=14 SIGNAL=GND=7\nas refdes=U2\n";
        let netlist = parse_str(input).unwrap();
        assert_eq!(
            netlist.pseudo,
            [
                PseudoComponent {
                    line: 2,
                    reference: "U1".into(),
                    package: Some("DIP14".into()),
                    part_count: Some(4),
                    pins: vec![RawPin::new("14", "VCC"), RawPin::new("7", "GND")],
                },
                PseudoComponent {
                    line: 3,
                    reference: "U2".into(),
                    ..Default::default()
                }
            ]
        );
    }

    #[test]
    fn units_sharing_a_reference_stay_separate_until_merged() {
        let input = "| Wirelist\nW A\nI REFDES=U1 A B\nM B\nI REFDES=U1 C D\n";
        let netlist = parse_str(input).unwrap();
        assert_eq!(netlist.components.len(), 2);
        assert!(netlist.components.iter().all(|c| c.reference == "U1"));
    }

    #[rstest]
    #[case::unknown_code("| Wirelist\nX foo\n", 2)]
    #[case::instance_without_unit("| Wirelist\nI REFDES=U1 A\n", 2)]
    #[case::index_out_of_range("| Wirelist\nW\nI REFDES=U1 A\nAPI 2 5\n", 4)]
    #[case::bad_parts("| Wirelist\nAP REFDES=U1 PARTS=four\n", 2)]
    #[case::pseudo_without_refdes("| Wirelist\nAP PARTS=2\n", 2)]
    #[case::unit_without_refdes("| Wirelist\nW\nI VALUE=10K A B\n", 2)]
    fn rejects_malformed_records(#[case] input: &str, #[case] line: usize) {
        let err = parse_str(input).unwrap_err();
        assert_eq!(err.line(), line, "{err}");
    }
}
