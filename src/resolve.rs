//! Component to footprint association.
//!
//! A component is either unresolved or resolved to one footprint name. The
//! [`LinkResolver`] is the only writer of that state outside of loading.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::FootprintCatalog;
use crate::cmp::LinkEntry;
use crate::equ::Equivalences;
use crate::{Component, LinkError, Netlist, Warning};

/// What to do with a footprint name that is not in the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FootprintPolicy {
    /// Reject it
    Strict,
    /// Store it as given
    #[default]
    Permissive,
}

pub struct LinkResolver<'a> {
    catalog: &'a FootprintCatalog,
    policy: FootprintPolicy,
}

impl<'a> LinkResolver<'a> {
    pub fn new(catalog: &'a FootprintCatalog, policy: FootprintPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Whether a footprint name may be stored under the current policy.
    /// Names with whitespace are refused under any policy.
    pub fn check(&self, footprint: &str) -> Result<(), LinkError> {
        if footprint.contains(char::is_whitespace) {
            Err(LinkError::InvalidFootprint(footprint.to_owned()))
        } else if footprint.is_empty()
            || self.policy == FootprintPolicy::Permissive
            || self.catalog.contains(footprint)
        {
            Ok(())
        } else {
            Err(LinkError::UnknownFootprint(footprint.to_owned()))
        }
    }

    /// Resolve a component, or clear its link with an empty name.
    /// On error the component is left as it was.
    pub fn set_footprint(
        &self,
        component: &mut Component,
        footprint: &str,
    ) -> Result<(), LinkError> {
        self.check(footprint)?;
        log::trace!("{} -> {footprint:?}", component.reference);
        component.set_footprint(footprint);
        Ok(())
    }

    pub fn set_by_reference(
        &self,
        netlist: &mut Netlist,
        reference: &str,
        footprint: &str,
    ) -> Result<(), LinkError> {
        let component = netlist
            .components_mut()
            .iter_mut()
            .find(|c| c.reference == reference)
            .ok_or_else(|| LinkError::UnknownComponent(reference.to_owned()))?;
        self.set_footprint(component, footprint)
    }

    /// Make every component unresolved
    pub fn clear_all(&self, netlist: &mut Netlist) {
        for component in netlist.components_mut() {
            component.set_footprint("");
        }
    }

    /// Apply the entries of a component link file. Each entry goes to the
    /// component with the same time-stamp, else the same reference.
    pub fn apply_links(&self, netlist: &mut Netlist, entries: &[LinkEntry]) -> Vec<Warning> {
        let components = netlist.components_mut();
        let mut by_timestamp = HashMap::new();
        let mut by_reference = HashMap::new();
        for (i, component) in components.iter().enumerate() {
            by_timestamp.entry(component.timestamp.clone()).or_insert(i);
            by_reference.entry(component.reference.clone()).or_insert(i);
        }

        let mut warnings = vec![];
        let mut applied = 0;
        for entry in entries {
            let index = by_timestamp
                .get(&entry.timestamp)
                .filter(|_| !entry.timestamp.is_empty())
                .or_else(|| by_reference.get(&entry.reference));
            let Some(&index) = index else {
                let warning = Warning::UnknownReference {
                    reference: entry.reference.clone(),
                    context: format!("Component link at line {}", entry.line),
                };
                log::warn!("{warning}");
                warnings.push(warning);
                continue;
            };
            if entry.footprint.is_empty() {
                continue;
            }
            let component = &mut components[index];
            match self.set_footprint(component, &entry.footprint) {
                Ok(()) => applied += 1,
                Err(_) => {
                    let warning = Warning::UnknownFootprint {
                        reference: component.reference.clone(),
                        footprint: entry.footprint.clone(),
                    };
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }
        log::debug!("Applied {applied} of {} component links", entries.len());
        warnings
    }

    /// Resolve still unresolved components from a value to footprint table.
    /// Returns how many components were resolved.
    pub fn auto_associate(
        &self,
        netlist: &mut Netlist,
        equivalences: &Equivalences,
    ) -> (usize, Vec<Warning>) {
        let mut count = 0;
        let mut warnings = vec![];
        for component in netlist
            .components_mut()
            .iter_mut()
            .filter(|c| !c.is_resolved())
        {
            let Some(footprint) = equivalences.footprint_for(&component.value) else {
                continue;
            };
            match self.set_footprint(component, footprint) {
                Ok(()) => count += 1,
                Err(_) => {
                    let warning = Warning::UnknownFootprint {
                        reference: component.reference.clone(),
                        footprint: footprint.to_owned(),
                    };
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }
        log::debug!("Associated {count} components by value");
        (count, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use rstest::*;

    fn netlist() -> Netlist {
        let mut netlist = Netlist::new(Format::EESchema);
        netlist.push(Component::new("R1").with_value("10K").with_timestamp("00000001"));
        netlist.push(Component::new("C1").with_value("100n").with_timestamp("00000002"));
        netlist.push(Component::new("U1").with_value("74ls00").with_timestamp("00000003"));
        netlist
    }

    fn catalog() -> FootprintCatalog {
        FootprintCatalog::from_names(["SM0603", "DIP-14"])
    }

    #[rstest]
    #[case(FootprintPolicy::Strict, "SM0603", true)]
    #[case(FootprintPolicy::Strict, "HANDMADE", false)]
    #[case(FootprintPolicy::Strict, "", true)]
    #[case(FootprintPolicy::Permissive, "HANDMADE", true)]
    #[case(FootprintPolicy::Permissive, "SO 8", false)]
    #[case(FootprintPolicy::Permissive, "SO8\t", false)]
    fn policy_decides_unknown_names(
        #[case] policy: FootprintPolicy,
        #[case] footprint: &str,
        #[case] accepted: bool,
    ) {
        let catalog = catalog();
        let resolver = LinkResolver::new(&catalog, policy);
        let mut component = Component::new("R1");
        component.set_footprint("OLD");
        let result = resolver.set_footprint(&mut component, footprint);
        assert_eq!(result.is_ok(), accepted);
        let expected = if accepted { footprint } else { "OLD" };
        assert_eq!(component.footprint(), expected);
    }

    #[test]
    fn whitespace_in_footprint_is_its_own_error() {
        let catalog = catalog();
        let resolver = LinkResolver::new(&catalog, FootprintPolicy::Permissive);
        assert_eq!(
            resolver.check("SO 8"),
            Err(LinkError::InvalidFootprint("SO 8".into()))
        );
    }

    #[test]
    fn set_by_unknown_reference_fails() {
        let catalog = catalog();
        let resolver = LinkResolver::new(&catalog, FootprintPolicy::Permissive);
        let mut netlist = netlist();
        assert_eq!(
            resolver.set_by_reference(&mut netlist, "Q1", "SOT23"),
            Err(LinkError::UnknownComponent("Q1".into()))
        );
        resolver.set_by_reference(&mut netlist, "C1", "SM0603").unwrap();
        assert_eq!(netlist.find("C1").unwrap().footprint(), "SM0603");
    }

    #[test]
    fn clear_all_unresolves_everything() {
        let catalog = catalog();
        let resolver = LinkResolver::new(&catalog, FootprintPolicy::Permissive);
        let mut netlist = netlist();
        resolver.set_by_reference(&mut netlist, "R1", "SM0603").unwrap();
        resolver.set_by_reference(&mut netlist, "U1", "DIP-14").unwrap();
        resolver.clear_all(&mut netlist);
        assert_eq!(netlist.resolved_count(), 0);
    }

    #[test]
    fn links_match_timestamp_then_reference() {
        let catalog = catalog();
        let resolver = LinkResolver::new(&catalog, FootprintPolicy::Strict);
        let mut netlist = netlist();
        let entries = [
            LinkEntry {
                line: 3,
                timestamp: "00000002".into(),
                reference: "R1".into(),
                footprint: "SM0603".into(),
                ..Default::default()
            },
            LinkEntry {
                line: 10,
                timestamp: "DEADBEEF".into(),
                reference: "U1".into(),
                footprint: "DIP-14".into(),
                ..Default::default()
            },
            LinkEntry {
                line: 17,
                timestamp: "CAFEBABE".into(),
                reference: "Q7".into(),
                footprint: "SOT23".into(),
                ..Default::default()
            },
            LinkEntry {
                line: 24,
                timestamp: "00000001".into(),
                reference: "R1".into(),
                footprint: "HANDMADE".into(),
                ..Default::default()
            },
        ];
        let warnings = resolver.apply_links(&mut netlist, &entries);

        assert_eq!(netlist.find("C1").unwrap().footprint(), "SM0603");
        assert_eq!(netlist.find("U1").unwrap().footprint(), "DIP-14");
        assert!(!netlist.find("R1").unwrap().is_resolved());
        assert_eq!(
            warnings,
            [
                Warning::UnknownReference {
                    reference: "Q7".into(),
                    context: "Component link at line 17".into()
                },
                Warning::UnknownFootprint {
                    reference: "R1".into(),
                    footprint: "HANDMADE".into()
                }
            ]
        );
    }

    #[test]
    fn auto_associate_fills_unresolved_only() {
        let catalog = catalog();
        let resolver = LinkResolver::new(&catalog, FootprintPolicy::Permissive);
        let mut netlist = netlist();
        resolver.set_by_reference(&mut netlist, "R1", "R_KEEP").unwrap();

        let equ = Equivalences::parse("'10K' 'SM0603'\n'74LS00' 'DIP-14'\n").unwrap();
        let (count, warnings) = resolver.auto_associate(&mut netlist, &equ);

        assert_eq!(count, 1);
        assert!(warnings.is_empty());
        assert_eq!(netlist.find("R1").unwrap().footprint(), "R_KEEP");
        assert_eq!(netlist.find("U1").unwrap().footprint(), "DIP-14");
        assert!(!netlist.find("C1").unwrap().is_resolved());
    }
}
