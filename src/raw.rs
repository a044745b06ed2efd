use crate::error::Warning;
use crate::format::Format;

/// Everything a grammar parser read from one netlist, before conversion
#[derive(Debug, Clone)]
pub struct RawNetlist {
    pub format: Format,
    pub components: Vec<RawComponent>,
    pub filters: Vec<RawFilterList>,
    pub pseudo: Vec<PseudoComponent>,
    pub warnings: Vec<Warning>,
}

impl RawNetlist {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            components: vec![],
            filters: vec![],
            pseudo: vec![],
            warnings: vec![],
        }
    }
}

/// One component record as written in the source
#[derive(Debug, Clone, Default)]
pub struct RawComponent {
    /// Line the record starts at
    pub line: usize,
    pub timestamp: Option<String>,
    /// `$noname` or absent when the source has no footprint
    pub footprint: Option<String>,
    pub reference: String,
    pub value: String,
    pub forced: Vec<ForcedNet>,
    pub pins: Vec<RawPin>,
}

/// A pin as written in the source; the net may be the `?` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPin {
    pub number: String,
    pub net: String,
}

impl RawPin {
    pub fn new(number: impl Into<String>, net: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            net: net.into(),
        }
    }
}

/// A net-forcing directive, `(1,2=VCC)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForcedNet {
    pub pins: Vec<String>,
    pub net: String,
}

impl ForcedNet {
    /// Parse a directive including its parentheses. Directives are single
    /// whitespace-free tokens in every grammar that has them.
    pub fn parse(text: &str) -> Option<Self> {
        if text.contains(char::is_whitespace) {
            return None;
        }
        let inner = text.strip_prefix('(')?.strip_suffix(')')?;
        let (pins, net) = inner.split_once('=')?;
        let pins: Vec<String> = pins
            .split(',')
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect();
        if pins.is_empty() || net.is_empty() {
            return None;
        }
        Some(Self {
            pins,
            net: net.to_owned(),
        })
    }

    /// Looks like a directive, so a malformed one is reported instead of read as a name
    pub fn is_directive(text: &str) -> bool {
        text.starts_with('(') && text.ends_with(')') && text.contains('=')
    }
}

/// Footprint filter patterns declared for one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilterList {
    pub line: usize,
    pub reference: String,
    pub patterns: Vec<String>,
}

/// Shared attributes of a family of physical units (Viewlogic wirelist `AP`/`AS` records).
/// Merged into the components with the same reference, then discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PseudoComponent {
    pub line: usize,
    pub reference: String,
    pub package: Option<String>,
    pub part_count: Option<u32>,
    pub pins: Vec<RawPin>,
}
