use std::path::PathBuf;

use thiserror::Error;

/// Structural problems found while reading a netlist. Fatal for the whole load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("line {line}: unrecognized netlist header `{text}`")]
    UnknownHeader { line: usize, text: String },
    #[error("line {line}: {message}: `{text}`")]
    Malformed {
        line: usize,
        text: String,
        message: String,
    },
    #[error("line {line}: unexpected end of file, expected {expected}")]
    UnexpectedEof { line: usize, expected: String },
}

impl FormatError {
    /// Line number (1-based) the error was reported at
    pub fn line(&self) -> usize {
        match self {
            FormatError::UnknownHeader { line, .. }
            | FormatError::Malformed { line, .. }
            | FormatError::UnexpectedEof { line, .. } => *line,
        }
    }
}

/// Footprint association errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Footprint {0} not found in catalog")]
    UnknownFootprint(String),
    #[error("Footprint name {0:?} contains whitespace")]
    InvalidFootprint(String),
    #[error("Component {0} not found")]
    UnknownComponent(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No netlist loaded")]
    NoNetlist,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Non-fatal diagnostics collected while loading and resolving
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error("{reference} pin {pin}: conflicting nets {kept} and {dropped}, keeping {kept}")]
    InconsistentPinNet {
        reference: String,
        pin: String,
        kept: String,
        dropped: String,
    },
    #[error("{reference}: no footprint matches the component filters")]
    UnresolvedFootprintFilter { reference: String },
    #[error("{context} refers to unknown component {reference}")]
    UnknownReference { reference: String, context: String },
    #[error("{reference}: footprint {footprint} not found in catalog")]
    UnknownFootprint {
        reference: String,
        footprint: String,
    },
}
