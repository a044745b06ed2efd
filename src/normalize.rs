//! Passes run on a freshly parsed netlist: unit and pseudo-component merges
//! (Viewlogic wirelists only), pin de-duplication and alphabetic ordering.

use std::collections::HashMap;

use crate::{natural_cmp, parse::Loaded, raw::PseudoComponent, Component, Netlist, Pin, Warning};

/// Run every pass the netlist's format calls for
pub fn normalize(loaded: &mut Loaded) {
    let Loaded {
        netlist,
        warnings,
        pseudo,
    } = loaded;

    if netlist.format.has_units() {
        merge_units(netlist);
        merge_pseudo_components(netlist, std::mem::take(pseudo));
    }

    for component in netlist.components_mut() {
        let reference = component.reference.clone();
        warnings.extend(dedup_pins(&reference, component.pins_mut()));
    }

    sort_alphabetic(netlist);
    log::debug!(
        "Normalized {} components, {} warnings",
        netlist.len(),
        warnings.len()
    );
}

/// Sort pins by number and drop repeated numbers, keeping the first occurrence.
/// A repeated pin on a different net is reported.
pub fn dedup_pins(reference: &str, pins: &mut Vec<Pin>) -> Vec<Warning> {
    pins.sort_by(|a, b| natural_cmp(&a.number, &b.number));

    let mut warnings = vec![];
    let mut kept: Vec<Pin> = Vec::with_capacity(pins.len());
    for pin in pins.drain(..) {
        match kept.last() {
            Some(last) if last.number == pin.number => {
                if last.net != pin.net {
                    let warning = Warning::InconsistentPinNet {
                        reference: reference.to_owned(),
                        pin: pin.number.clone(),
                        kept: last.net.clone(),
                        dropped: pin.net,
                    };
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
            }
            _ => kept.push(pin),
        }
    }
    *pins = kept;
    warnings
}

/// Order components by natural reference order and number them from 1
pub fn sort_alphabetic(netlist: &mut Netlist) {
    let components = netlist.components_mut();
    components.sort_by(|a, b| natural_cmp(&a.reference, &b.reference));
    for (i, component) in components.iter_mut().enumerate() {
        component.set_position(i + 1);
    }
}

/// Fold units sharing a reference into the first of them
pub fn merge_units(netlist: &mut Netlist) {
    let components = std::mem::take(netlist.components_mut());
    let before = components.len();

    let mut first: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Component> = Vec::with_capacity(components.len());
    for mut component in components {
        match first.get(&component.reference) {
            Some(&i) => {
                let target = &mut merged[i];
                target.pins_mut().append(component.pins_mut());
                if !target.is_resolved() && component.is_resolved() {
                    target.set_footprint(component.footprint());
                }
            }
            None => {
                first.insert(component.reference.clone(), merged.len());
                merged.push(component);
            }
        }
    }

    if merged.len() != before {
        log::debug!("Merged {before} units into {} components", merged.len());
    }
    *netlist.components_mut() = merged;
}

/// Copy pins, part count and package of each pseudo-component into the components
/// with the same reference
pub fn merge_pseudo_components(netlist: &mut Netlist, pseudo: Vec<PseudoComponent>) {
    for p in pseudo {
        let mut matched = false;
        for component in netlist
            .components_mut()
            .iter_mut()
            .filter(|c| c.reference == p.reference)
        {
            matched = true;
            component
                .pins_mut()
                .extend(p.pins.iter().cloned().map(Pin::from));
            if p.part_count.is_some() {
                component.part_count = p.part_count;
            }
            if let Some(package) = p.package.as_deref().filter(|_| !component.is_resolved()) {
                component.set_footprint(package);
            }
        }
        if !matched {
            log::debug!(
                "Pseudo-component {} at line {} matches no component",
                p.reference,
                p.line
            );
        }
    }
}
