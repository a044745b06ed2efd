//! Netlist grammars and header sniffing.
//!
//! Each grammar lives in its own submodule with its own lexer. Detection looks
//! at the first non-blank line only and is done once per load.

use std::fmt::Display;

use crate::context::ParserContext;
use crate::error::FormatError;
use crate::raw::RawNetlist;

mod orcad;
mod pcad;
mod viewlogic;
mod wirelist;

/// The legacy netlist grammars understood by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `( { OrCAD PCB II ... }` records, also the generic output of this crate
    OrcadPcb2,
    /// `# EESchema Netlist Version 1.1`, OrCAD records plus a footprint filter trailer
    EESchema,
    /// `{COMPONENT ORCAD.PCB` block structured netlist
    Pcad,
    /// Viewlogic `.net` file with a companion `.pkg` file
    ViewlogicNetPkg,
    /// `| Wirelist` line coded netlist
    ViewlogicWirelist,
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Format::OrcadPcb2 => "OrCAD PCB2",
            Format::EESchema => "EESchema",
            Format::Pcad => "PCAD",
            Format::ViewlogicNetPkg => "Viewlogic NET+PKG",
            Format::ViewlogicWirelist => "Viewlogic WIRELIST",
        };
        write!(f, "{name}")
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

impl Format {
    /// Classify a header line. `has_pkg` tells whether a companion `.pkg` file exists.
    pub fn detect_line(line: &str, has_pkg: bool) -> Option<Format> {
        let line = line.trim_start();
        if starts_with_ignore_case(line, "# EESchema") {
            Some(Format::EESchema)
        } else if line.starts_with("({") || line.starts_with("( {") {
            Some(Format::OrcadPcb2)
        } else if starts_with_ignore_case(line, "{COMPONENT ORCAD.PCB") {
            Some(Format::Pcad)
        } else if line
            .strip_prefix('|')
            .is_some_and(|rest| starts_with_ignore_case(rest.trim_start(), "Wirelist"))
        {
            Some(Format::ViewlogicWirelist)
        } else if has_pkg {
            Some(Format::ViewlogicNetPkg)
        } else {
            None
        }
    }

    /// Classify a whole input by its first non-blank line
    pub fn detect(input: &str, has_pkg: bool) -> Result<Format, FormatError> {
        let mut ctx = ParserContext::new(input);
        let Some((line, text)) = ctx.next_line() else {
            return Err(ctx.eof("netlist header"));
        };
        Format::detect_line(text, has_pkg).ok_or_else(|| FormatError::UnknownHeader {
            line,
            text: text.trim().to_owned(),
        })
    }

    /// Formats that only exist as a single physical unit per record and need the
    /// unit and pseudo-component merges
    pub fn has_units(&self) -> bool {
        matches!(self, Format::ViewlogicWirelist)
    }
}

/// Detect the grammar of `input` and read it into raw records.
///
/// `pkg` is the text of the companion `.pkg` file, if there is one.
pub fn parse(input: &str, pkg: Option<&str>) -> Result<RawNetlist, FormatError> {
    let format = Format::detect(input, pkg.is_some())?;
    log::debug!("Detected {format} netlist");
    let mut ctx = ParserContext::new(input);
    match format {
        Format::OrcadPcb2 | Format::EESchema => orcad::parse(&mut ctx, format),
        Format::Pcad => pcad::parse(&ctx),
        Format::ViewlogicWirelist => wirelist::parse(&mut ctx),
        Format::ViewlogicNetPkg => {
            let mut pkg = ParserContext::new(pkg.unwrap_or_default());
            viewlogic::parse(&mut ctx, &mut pkg)
        }
    }
}
