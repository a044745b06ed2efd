//! Footprint equivalence files (`.equ`): one `'value' 'footprint'` pair per line.
//!
//! ```text
//! # Resistors
//! '10K' 'SM0603'
//! '74LS00' 'DIP-14'
//! ```

use logos::Logos;

use crate::context::ParserContext;
use crate::FormatError;

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LogosTokenKind {
    #[regex(r"'[^'\r\n]*'")]
    Quoted,
    #[regex(r"#[^\r\n]*")]
    Comment,
    #[regex(r"[ \t\r\n]+", logos::skip)]
    WS,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equivalence {
    pub value: String,
    pub footprint: String,
}

/// Value to footprint table, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Equivalences {
    entries: Vec<Equivalence>,
}

impl Equivalences {
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let mut ctx = ParserContext::new(text);
        let mut entries = vec![];
        while let Some((line, text)) = ctx.next_line() {
            let mut fields = vec![];
            for (kind, span) in LogosTokenKind::lexer(text).spanned() {
                match kind {
                    Ok(LogosTokenKind::Quoted) => {
                        let quoted = &text[span];
                        fields.push(&quoted[1..quoted.len() - 1]);
                    }
                    Ok(LogosTokenKind::Comment) => break,
                    Ok(LogosTokenKind::WS) => unreachable!(),
                    Err(_) => {
                        return Err(ctx.malformed(line, "expected `'value' 'footprint'`"))
                    }
                }
            }
            match fields.as_slice() {
                [] => {}
                [value, footprint, ..] => entries.push(Equivalence {
                    value: (*value).to_owned(),
                    footprint: (*footprint).to_owned(),
                }),
                [_] => return Err(ctx.malformed(line, "missing footprint")),
            }
        }
        Ok(Self { entries })
    }

    /// Footprint of the first entry whose value matches, ignoring ASCII case
    pub fn footprint_for(&self, value: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.value.eq_ignore_ascii_case(value))
            .map(|e| e.footprint.as_str())
    }

    pub fn entries(&self) -> &[Equivalence] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[test]
    fn reads_pairs_and_skips_comments() {
        let equ = Equivalences::parse(
            "# passives\n\n'10K' 'SM0603'  # most resistors\n'74LS00'\t'DIP-14'\n",
        )
        .unwrap();
        assert_eq!(equ.len(), 2);
        assert_eq!(equ.footprint_for("10k"), Some("SM0603"));
        assert_eq!(equ.footprint_for("74LS00"), Some("DIP-14"));
        assert_eq!(equ.footprint_for("74LS04"), None);
    }

    #[test]
    fn first_entry_wins() {
        let equ = Equivalences::parse("'1N4148' 'D3'\n'1n4148' 'SOD80'\n").unwrap();
        assert_eq!(equ.footprint_for("1N4148"), Some("D3"));
    }

    #[rstest]
    #[case::single_field("'10K'\n")]
    #[case::unquoted("10K SM0603\n")]
    #[case::unterminated("'10K' 'SM0603\n")]
    fn rejects_bad_lines(#[case] input: &str) {
        let err = Equivalences::parse(input).unwrap_err();
        assert_eq!(err.line(), 1);
    }
}
