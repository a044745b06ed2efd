//! The footprints available for association.
//!
//! A catalog is built once, then only read; share it behind an `Arc`.

use std::collections::HashMap;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::context::ParserContext;
use crate::error::{Error, FormatError};
use crate::text::read_with_unknown_encoding;
use crate::Component;

/// One footprint of a library
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FootprintInfo {
    pub name: String,
    pub doc: String,
    pub keywords: String,
    /// Library the footprint was read from
    pub library: String,
}

impl FootprintInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FootprintCatalog {
    entries: Vec<FootprintInfo>,
    index: HashMap<String, usize>,
}

impl FootprintCatalog {
    /// Build a catalog, keeping the first entry of each name
    pub fn new(entries: impl IntoIterator<Item = FootprintInfo>) -> Self {
        let mut catalog = Self::default();
        for entry in entries {
            if catalog.index.contains_key(&entry.name) {
                log::debug!(
                    "Footprint {} from {} shadowed by an earlier library",
                    entry.name,
                    entry.library
                );
                continue;
            }
            catalog.index.insert(entry.name.clone(), catalog.entries.len());
            catalog.entries.push(entry);
        }
        catalog
    }

    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::new(names.into_iter().map(FootprintInfo::new))
    }

    pub fn load_legacy_library(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::load_libraries([path])
    }

    /// Read legacy footprint libraries, in order
    pub fn load_libraries<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
    ) -> Result<Self, Error> {
        let mut entries = vec![];
        for path in paths {
            let path = path.as_ref();
            let text = read_with_unknown_encoding(path).map_err(|e| Error::io(path, e))?;
            let library = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.extend(parse_legacy_library(&text, &library)?);
        }
        let catalog = Self::new(entries);
        log::debug!("Loaded {} footprints", catalog.len());
        Ok(catalog)
    }

    pub fn entries(&self) -> &[FootprintInfo] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&FootprintInfo> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Candidates for a component, in catalog order.
    ///
    /// Without filter patterns every footprint is a candidate. An empty result
    /// is not an error; falling back to the whole catalog is up to the caller.
    pub fn matching(&self, component: &Component) -> Vec<&FootprintInfo> {
        if component.filters.is_empty() {
            return self.entries.iter().collect();
        }
        let filter = FootprintFilter::new(&component.filters);
        self.entries
            .iter()
            .filter(|entry| filter.is_match(&entry.name))
            .collect()
    }
}

/// A component's filter patterns compiled into one matcher.
///
/// Only `*` and `?` are wildcards; everything else matches itself, case-sensitively.
#[derive(Debug, Clone)]
pub struct FootprintFilter {
    set: GlobSet,
}

impl FootprintFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(&wildcard_to_glob(pattern))
                .literal_separator(false)
                .backslash_escape(false)
                .build();
            match glob {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => log::warn!("Ignoring footprint filter {pattern}: {e}"),
            }
        }
        let set = builder.build().unwrap_or_else(|e| {
            log::warn!("Ignoring footprint filters: {e}");
            GlobSet::empty()
        });
        Self { set }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.set.is_match(name)
    }
}

/// Quote glob metacharacters other than `*` and `?`, and collapse `**`
fn wildcard_to_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '*' if glob.ends_with('*') => {}
            '[' | ']' | '{' | '}' => {
                glob.push('[');
                glob.push(c);
                glob.push(']');
            }
            _ => glob.push(c),
        }
    }
    glob
}

/// Footprint records of a legacy library:
///
/// ```text
/// $MODULE DIP-14
/// Cd 14 pins DIL package
/// Kw DIL DIP
/// ...
/// $EndMODULE DIP-14
/// ```
pub fn parse_legacy_library(text: &str, library: &str) -> Result<Vec<FootprintInfo>, FormatError> {
    let mut ctx = ParserContext::new(text);
    let mut entries = vec![];
    let mut current: Option<(usize, FootprintInfo)> = None;

    while let Some((line, text)) = ctx.next_line() {
        let text = text.trim();
        let (keyword, rest) = text
            .split_once(char::is_whitespace)
            .map(|(k, r)| (k, r.trim()))
            .unwrap_or((text, ""));

        match (keyword, current.as_mut()) {
            ("$MODULE", None) => {
                if rest.is_empty() {
                    return Err(ctx.malformed(line, "footprint without name"));
                }
                current = Some((
                    line,
                    FootprintInfo {
                        name: rest.to_owned(),
                        library: library.to_owned(),
                        ..Default::default()
                    },
                ));
            }
            ("$MODULE", Some(_)) => {
                return Err(ctx.malformed(line, "$MODULE inside another footprint"));
            }
            ("$EndMODULE", Some((_, info))) => {
                if !rest.is_empty() && rest != info.name {
                    return Err(ctx.malformed(line, format!("expected $EndMODULE {}", info.name)));
                }
                if let Some((_, info)) = current.take() {
                    entries.push(info);
                }
            }
            ("$EndMODULE", None) => {
                return Err(ctx.malformed(line, "$EndMODULE without $MODULE"));
            }
            ("Cd", Some((_, info))) => info.doc = rest.to_owned(),
            ("Kw", Some((_, info))) => info.keywords = rest.to_owned(),
            _ => {}
        }
    }

    if let Some((line, info)) = current {
        return Err(ctx.eof(format!(
            "$EndMODULE closing {} opened at line {line}",
            info.name
        )));
    }
    Ok(entries)
}
