//! Component link files (`.cmp`), the footprint choices of a previous session.
//!
//! ```text
//! Cmp-Mod V01 Created by netlist_link date = 16/10/2026-10:00:00
//!
//! BeginCmp
//! TimeStamp = /4C6F9B3A;
//! Reference = R1;
//! ValeurCmp = 10K;
//! IdModule  = SM0603;
//! EndCmp
//!
//! EndListe
//! ```

use std::io::{self, Write};

use crate::context::ParserContext;
use crate::{FormatError, Netlist};

const HEADER: &str = "Cmp-Mod V01";

/// One remembered association
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkEntry {
    pub line: usize,
    pub timestamp: String,
    pub reference: String,
    pub value: String,
    pub footprint: String,
}

pub fn parse_component_file(text: &str) -> Result<Vec<LinkEntry>, FormatError> {
    let mut ctx = ParserContext::new(text);
    match ctx.next_line() {
        Some((_, header)) if header.trim_start().starts_with(HEADER) => {}
        Some((line, header)) => {
            return Err(FormatError::UnknownHeader {
                line,
                text: header.to_owned(),
            })
        }
        None => return Err(ctx.eof(HEADER)),
    }

    let mut entries = vec![];
    let mut current: Option<LinkEntry> = None;
    while let Some((line, text)) = ctx.next_line() {
        let text = text.trim();
        match (text, current.as_mut()) {
            ("BeginCmp", None) => {
                current = Some(LinkEntry {
                    line,
                    ..Default::default()
                })
            }
            ("EndCmp", Some(_)) => entries.extend(current.take()),
            ("EndListe", None) => {
                log::debug!("Read {} component links", entries.len());
                return Ok(entries);
            }
            ("BeginCmp" | "EndListe", Some(_)) => {
                return Err(ctx.malformed(line, "expected EndCmp"));
            }
            (_, Some(entry)) => {
                let Some((key, value)) = text.split_once('=') else {
                    return Err(ctx.malformed(line, "expected `key = value;`"));
                };
                let value = value.trim();
                let value = value.strip_suffix(';').unwrap_or(value).trim().to_owned();
                match key.trim() {
                    "TimeStamp" => entry.timestamp = value,
                    "Reference" => entry.reference = value,
                    "ValeurCmp" => entry.value = value,
                    "IdModule" => entry.footprint = value,
                    key => log::trace!("Ignoring {key} at line {line}"),
                }
            }
            (_, None) => return Err(ctx.malformed(line, "expected BeginCmp")),
        }
    }
    Err(ctx.eof(if current.is_some() { "EndCmp" } else { "EndListe" }))
}

/// Write the current association of every component
pub fn write_component_file(
    netlist: &Netlist,
    created: &str,
    mut out: impl Write,
) -> io::Result<()> {
    writeln!(out, "{HEADER} Created by netlist_link date = {created}")?;
    for component in netlist.components() {
        writeln!(out)?;
        writeln!(out, "BeginCmp")?;
        writeln!(out, "TimeStamp = {};", component.timestamp)?;
        writeln!(out, "Reference = {};", component.reference)?;
        writeln!(out, "ValeurCmp = {};", component.value)?;
        writeln!(out, "IdModule  = {};", component.footprint())?;
        writeln!(out, "EndCmp")?;
    }
    writeln!(out)?;
    writeln!(out, "EndListe")?;
    Ok(())
}
