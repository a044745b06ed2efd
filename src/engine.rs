use std::path::Path;
use std::sync::Arc;

use crate::catalog::{FootprintCatalog, FootprintInfo};
use crate::cmp::{parse_component_file, write_component_file};
use crate::equ::Equivalences;
use crate::resolve::LinkResolver;
use crate::text::read_with_unknown_encoding;
use crate::write::{rename_nets, Header, NetlistWriter, RenameMap};
use crate::{
    read_netlist, Component, Config, Error, Format, LinkError, Netlist, Order, Warning,
};

/// Footprints offered for one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootprintCandidates<'a> {
    pub footprints: Vec<&'a FootprintInfo>,
    /// Set when the component's filters matched nothing
    pub warning: Option<Warning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub components: usize,
    pub resolved: usize,
}

/// One netlist and its footprint associations.
///
/// The catalog is shared read-only; the netlist belongs to the engine until
/// the next successful load replaces it.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    catalog: Arc<FootprintCatalog>,
    netlist: Option<Netlist>,
    warnings: Vec<Warning>,
}

impl Engine {
    pub fn new(config: Config, catalog: Arc<FootprintCatalog>) -> Self {
        Self {
            config,
            catalog,
            netlist: None,
            warnings: vec![],
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<FootprintCatalog> {
        &self.catalog
    }

    /// Load a netlist file. A Viewlogic `.net` file is read together with the
    /// `.pkg` file next to it.
    pub fn load_netlist(&mut self, path: impl AsRef<Path>) -> Result<&Netlist, Error> {
        let path = path.as_ref();
        let text = read_with_unknown_encoding(path).map_err(|e| Error::io(path, e))?;
        let pkg_path = path.with_extension("pkg");
        let pkg = if pkg_path != path && pkg_path.is_file() {
            let pkg = read_with_unknown_encoding(&pkg_path).map_err(|e| Error::io(&pkg_path, e))?;
            Some(pkg)
        } else {
            None
        };
        log::debug!("Loading {}", path.display());
        self.load_netlist_str(&text, pkg.as_deref())
    }

    /// Replace the current netlist. On error the previous one is kept.
    pub fn load_netlist_str(&mut self, text: &str, pkg: Option<&str>) -> Result<&Netlist, Error> {
        let loaded = read_netlist(text, pkg)?;
        log::debug!(
            "Loaded {} netlist: {} components, {} warnings",
            loaded.netlist.format,
            loaded.netlist.len(),
            loaded.warnings.len()
        );
        self.warnings = loaded.warnings;
        Ok(&*self.netlist.insert(loaded.netlist))
    }

    pub fn netlist(&self) -> Option<&Netlist> {
        self.netlist.as_ref()
    }

    fn netlist_mut(&mut self) -> Result<&mut Netlist, Error> {
        self.netlist.as_mut().ok_or(Error::NoNetlist)
    }

    /// Components in display order
    pub fn components(&self) -> &[Component] {
        self.netlist
            .as_ref()
            .map(Netlist::components)
            .unwrap_or_default()
    }

    pub fn components_in(&self, order: Order) -> Vec<&Component> {
        self.netlist
            .as_ref()
            .map(|n| n.components_in(order))
            .unwrap_or_default()
    }

    /// Footprints offered for the component at `index`. When the component's
    /// filters match nothing the whole catalog is offered, unless the
    /// configuration turns that off.
    pub fn list_footprints(&self, index: usize) -> Result<FootprintCandidates<'_>, Error> {
        let netlist = self.netlist.as_ref().ok_or(Error::NoNetlist)?;
        let component = netlist
            .get(index)
            .ok_or_else(|| LinkError::UnknownComponent(format!("#{index}")))?;

        let mut footprints = self.catalog.matching(component);
        let mut warning = None;
        if footprints.is_empty() && !component.filters.is_empty() {
            let w = Warning::UnresolvedFootprintFilter {
                reference: component.reference.clone(),
            };
            log::warn!("{w}");
            warning = Some(w);
            if self.config.filter_fallback {
                footprints = self.catalog.entries().iter().collect();
            }
        }
        Ok(FootprintCandidates {
            footprints,
            warning,
        })
    }

    pub fn footprint_doc(&self, name: &str) -> Option<&str> {
        self.catalog.get(name).map(|f| f.doc.as_str())
    }

    pub fn footprint_keywords(&self, name: &str) -> Option<&str> {
        self.catalog.get(name).map(|f| f.keywords.as_str())
    }

    /// Associate a footprint with the component at `index`; an empty name clears it
    pub fn set_footprint(&mut self, index: usize, footprint: &str) -> Result<(), Error> {
        let resolver = LinkResolver::new(&self.catalog, self.config.footprint_policy);
        let netlist = self.netlist.as_mut().ok_or(Error::NoNetlist)?;
        let component = netlist
            .components_mut()
            .get_mut(index)
            .ok_or_else(|| LinkError::UnknownComponent(format!("#{index}")))?;
        resolver.set_footprint(component, footprint)?;
        Ok(())
    }

    pub fn clear_all_associations(&mut self) -> Result<(), Error> {
        let resolver = LinkResolver::new(&self.catalog, self.config.footprint_policy);
        let netlist = self.netlist.as_mut().ok_or(Error::NoNetlist)?;
        resolver.clear_all(netlist);
        Ok(())
    }

    /// Restore associations from a component link file
    pub fn apply_component_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<Warning>, Error> {
        let path = path.as_ref();
        let text = read_with_unknown_encoding(path).map_err(|e| Error::io(path, e))?;
        let entries = parse_component_file(&text)?;

        let resolver = LinkResolver::new(&self.catalog, self.config.footprint_policy);
        let netlist = self.netlist.as_mut().ok_or(Error::NoNetlist)?;
        let warnings = resolver.apply_links(netlist, &entries);
        self.warnings.extend(warnings.iter().cloned());
        Ok(warnings)
    }

    /// Associate unresolved components by value from an equivalence file.
    /// Returns the number of components associated.
    pub fn auto_associate(&mut self, path: impl AsRef<Path>) -> Result<usize, Error> {
        let path = path.as_ref();
        let text = read_with_unknown_encoding(path).map_err(|e| Error::io(path, e))?;
        let equivalences = Equivalences::parse(&text)?;

        let resolver = LinkResolver::new(&self.catalog, self.config.footprint_policy);
        let netlist = self.netlist.as_mut().ok_or(Error::NoNetlist)?;
        let (count, warnings) = resolver.auto_associate(netlist, &equivalences);
        self.warnings.extend(warnings);
        Ok(count)
    }

    /// Write the netlist for the board layout tool. Shortened net names are
    /// applied to the model once the file is written.
    pub fn save_links(&mut self, path: impl AsRef<Path>) -> Result<RenameMap, Error> {
        let path = path.as_ref();
        let netlist = self.netlist.as_ref().ok_or(Error::NoNetlist)?;
        let header = match netlist.format {
            Format::EESchema => Header::EESchema,
            _ => Header::Generic {
                created: chrono::Local::now().format("%d/%m/%Y %H:%M:%S").to_string(),
            },
        };
        let writer = NetlistWriter::new(self.config.net_name_limit, self.config.justify, header);

        let mut buf = vec![];
        let renames = writer
            .write(netlist, &mut buf)
            .map_err(|e| Error::io(path, e))?;
        std::fs::write(path, buf).map_err(|e| Error::io(path, e))?;

        if !renames.is_empty() {
            log::debug!("Renamed {} nets", renames.len());
            rename_nets(self.netlist_mut()?, &renames);
        }
        Ok(renames)
    }

    pub fn save_component_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let netlist = self.netlist.as_ref().ok_or(Error::NoNetlist)?;
        let created = chrono::Local::now().format("%d/%m/%Y-%H:%M:%S").to_string();
        let mut buf = vec![];
        write_component_file(netlist, &created, &mut buf).map_err(|e| Error::io(path, e))?;
        std::fs::write(path, buf).map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    /// Warnings of the last load and of the associations made since
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn stats(&self) -> Stats {
        self.netlist
            .as_ref()
            .map(|n| Stats {
                components: n.len(),
                resolved: n.resolved_count(),
            })
            .unwrap_or_default()
    }
}
