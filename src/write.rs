//! Netlist output for the board layout tool.
//!
//! Long net names are shortened on the way out. All pins sharing a name get
//! the same new name, so renaming happens in a pass before anything is written.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::normalize::dedup_pins;
use crate::{Component, Netlist, Pin, NO_FOOTPRINT, UNCONNECTED};

/// Characters kept from a long net name
const PREFIX_LEN: usize = 8;

/// Original net name -> shortened name
pub type RenameMap = HashMap<String, String>;

/// Which end of a long net name survives shortening
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Justify {
    /// Keep the first characters
    #[default]
    Left,
    /// Keep the last characters
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// `# EESchema Netlist Version 1.1`
    EESchema,
    /// `( { netlist created  <created> }`
    Generic { created: String },
}

#[derive(Debug, Clone)]
pub struct NetlistWriter {
    pub limit: usize,
    pub justify: Justify,
    pub header: Header,
}

impl NetlistWriter {
    pub fn new(limit: usize, justify: Justify, header: Header) -> Self {
        Self {
            limit,
            justify,
            header,
        }
    }

    /// Pins of a component in output order
    fn output_pins(component: &Component) -> Vec<Pin> {
        let mut pins = component.pins().to_vec();
        // Conflicts were reported when the netlist was loaded.
        let _ = dedup_pins(&component.reference, &mut pins);
        pins
    }

    fn shorten(&self, net: &str, counter: usize) -> String {
        let len = net.chars().count();
        let prefix: String = match self.justify {
            Justify::Left => net.chars().take(PREFIX_LEN).collect(),
            Justify::Right => net.chars().skip(len.saturating_sub(PREFIX_LEN)).collect(),
        };
        format!("{prefix}{counter}")
    }

    /// New names for every net longer than the limit, numbered in order of first use
    pub fn renames(&self, netlist: &Netlist) -> RenameMap {
        let existing: HashSet<&str> = netlist
            .components()
            .iter()
            .flat_map(|c| c.pins())
            .map(|p| p.net.as_str())
            .collect();

        let mut renames = RenameMap::new();
        let mut taken: HashSet<String> = HashSet::new();
        let mut counter = 1;
        for component in netlist.components() {
            for pin in Self::output_pins(component) {
                if pin.net.chars().count() <= self.limit || renames.contains_key(&pin.net) {
                    continue;
                }
                let mut name = self.shorten(&pin.net, counter);
                while existing.contains(name.as_str()) || taken.contains(&name) {
                    counter += 1;
                    name = self.shorten(&pin.net, counter);
                }
                counter += 1;
                log::debug!("Renaming net {} to {name}", pin.net);
                taken.insert(name.clone());
                renames.insert(pin.net, name);
            }
        }
        renames
    }

    /// Write the netlist in its current component order and return the net renames applied
    pub fn write(&self, netlist: &Netlist, mut out: impl Write) -> io::Result<RenameMap> {
        let renames = self.renames(netlist);

        match &self.header {
            Header::EESchema => {
                writeln!(out, "# EESchema Netlist Version 1.1")?;
                writeln!(out, "(")?;
            }
            Header::Generic { created } => writeln!(out, "( {{ netlist created  {created} }}")?,
        }

        for component in netlist.components() {
            let footprint = match component.footprint() {
                "" => NO_FOOTPRINT,
                footprint => footprint,
            };
            writeln!(
                out,
                " ( {} {footprint} {} {}",
                component.timestamp, component.reference, component.value
            )?;
            for pin in Self::output_pins(component) {
                let net = match renames.get(&pin.net) {
                    Some(renamed) => renamed.as_str(),
                    None if pin.net.is_empty() => UNCONNECTED,
                    None => pin.net.as_str(),
                };
                writeln!(out, "  ( {} {net} )", pin.number)?;
            }
            writeln!(out, " )")?;
        }
        writeln!(out, ")")?;
        writeln!(out, "*")?;

        if netlist.components().iter().any(|c| !c.filters.is_empty()) {
            writeln!(out, "{{ Allowed footprints by component:")?;
            for component in netlist.components().iter().filter(|c| !c.filters.is_empty()) {
                writeln!(out, "$component {}", component.reference)?;
                for pattern in &component.filters {
                    writeln!(out, " {pattern}")?;
                }
                writeln!(out, "$endlist")?;
            }
            writeln!(out, "$endfootprintlist")?;
            writeln!(out, "}}")?;
        }
        Ok(renames)
    }
}

/// Apply output renames to the model
pub fn rename_nets(netlist: &mut Netlist, renames: &RenameMap) {
    for component in netlist.components_mut() {
        for pin in component.pins_mut() {
            if let Some(renamed) = renames.get(&pin.net) {
                pin.net = renamed.clone();
            }
        }
    }
}
