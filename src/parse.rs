use std::collections::HashMap;

use crate::{
    raw::{self, PseudoComponent},
    Component, FormatError, Netlist, Pin, Warning, NO_FOOTPRINT, UNCONNECTED,
};

/// A netlist fresh out of a parser, with what is needed to normalize it
#[derive(Debug, Clone)]
pub struct Loaded {
    pub netlist: Netlist,
    pub warnings: Vec<Warning>,
    pub(crate) pseudo: Vec<PseudoComponent>,
}

impl From<raw::RawPin> for Pin {
    fn from(value: raw::RawPin) -> Self {
        let raw::RawPin { number, net } = value;
        let net = if net == UNCONNECTED { String::new() } else { net };
        Pin { number, net }
    }
}

impl TryFrom<raw::RawComponent> for Component {
    type Error = FormatError;

    fn try_from(value: raw::RawComponent) -> Result<Self, Self::Error> {
        let raw::RawComponent {
            line,
            timestamp,
            footprint,
            reference,
            value,
            forced,
            pins,
        } = value;
        if reference.is_empty() {
            return Err(FormatError::Malformed {
                line,
                text: String::new(),
                message: "component without reference".into(),
            });
        }

        // A directive wins over the net read for the same pin.
        let mut overrides: HashMap<&str, &str> = HashMap::new();
        for directive in &forced {
            for pin in &directive.pins {
                overrides.insert(pin, &directive.net);
            }
        }

        let mut component = Component::new(reference)
            .with_value(value)
            .with_timestamp(timestamp.unwrap_or_default());
        if let Some(footprint) = footprint.filter(|f| f != NO_FOOTPRINT) {
            component.set_footprint(footprint);
        }
        for pin in pins {
            let mut pin: Pin = pin.into();
            if let Some(net) = overrides.remove(pin.number.as_str()) {
                pin.net = net.to_owned();
            }
            component.add_pin(pin);
        }
        // Forced pins missing from the pin list are still connected.
        for directive in &forced {
            for number in &directive.pins {
                if overrides.remove(number.as_str()).is_some() {
                    component.add_pin(Pin::new(number.as_str(), directive.net.as_str()));
                }
            }
        }
        Ok(component)
    }
}

impl TryFrom<raw::RawNetlist> for Loaded {
    type Error = FormatError;

    fn try_from(value: raw::RawNetlist) -> Result<Self, Self::Error> {
        let raw::RawNetlist {
            format,
            components,
            filters,
            pseudo,
            mut warnings,
        } = value;

        // Units sharing a reference are merged later; elsewhere a reference names one record.
        let mut declared: HashMap<String, usize> = HashMap::new();
        let mut netlist = Netlist::new(format);
        for (i, raw) in components.into_iter().enumerate() {
            if !format.has_units() {
                if let Some(first) = declared.insert(raw.reference.clone(), raw.line) {
                    return Err(FormatError::Malformed {
                        line: raw.line,
                        text: raw.reference,
                        message: format!("reference already used by the record at line {first}"),
                    });
                }
            }
            let mut component: Component = raw.try_into()?;
            if component.timestamp.is_empty() {
                component.timestamp = format!("{:08X}", i + 1);
            }
            netlist.push(component);
        }

        for list in filters {
            let mut found = false;
            for component in netlist
                .components_mut()
                .iter_mut()
                .filter(|c| c.reference == list.reference)
            {
                component.filters.extend(list.patterns.iter().cloned());
                found = true;
            }
            if !found {
                let warning = Warning::UnknownReference {
                    reference: list.reference,
                    context: format!("Footprint filter list at line {}", list.line),
                };
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }

        Ok(Loaded {
            netlist,
            warnings,
            pseudo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::raw::{ForcedNet, RawComponent, RawFilterList, RawNetlist, RawPin};

    fn raw_component(reference: &str, pins: &[(&str, &str)]) -> RawComponent {
        RawComponent {
            reference: reference.into(),
            pins: pins.iter().map(|(n, net)| RawPin::new(*n, *net)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn placeholders_become_empty() {
        let mut raw = raw_component("U1", &[("1", "?"), ("2", "NET2")]);
        raw.footprint = Some(NO_FOOTPRINT.into());
        let component: Component = raw.try_into().unwrap();
        assert!(!component.is_resolved());
        assert_eq!(component.pins(), [Pin::new("1", ""), Pin::new("2", "NET2")]);
    }

    #[test]
    fn forced_nets_override_parsed_nets() {
        let mut raw = raw_component("U1", &[("7", "N0001"), ("14", "N0002"), ("1", "A")]);
        raw.forced = vec![
            ForcedNet {
                pins: vec!["7".into()],
                net: "GND".into(),
            },
            ForcedNet {
                pins: vec!["14".into(), "15".into()],
                net: "VCC".into(),
            },
        ];
        let component: Component = raw.try_into().unwrap();
        assert_eq!(
            component.pins(),
            [
                Pin::new("7", "GND"),
                Pin::new("14", "VCC"),
                Pin::new("1", "A"),
                Pin::new("15", "VCC")
            ]
        );
    }

    #[test]
    fn missing_timestamps_are_synthesized() {
        let mut raw = RawNetlist::new(Format::Pcad);
        raw.components.push(raw_component("R1", &[]));
        let mut with_ts = raw_component("R2", &[]);
        with_ts.timestamp = Some("/4C6F9B3A".into());
        raw.components.push(with_ts);
        raw.components.push(raw_component("R3", &[]));

        let loaded: Loaded = raw.try_into().unwrap();
        let stamps: Vec<_> = loaded
            .netlist
            .components()
            .iter()
            .map(|c| c.timestamp.as_str())
            .collect();
        assert_eq!(stamps, ["00000001", "/4C6F9B3A", "00000003"]);
    }

    #[test]
    fn filters_attach_by_reference() {
        let mut raw = RawNetlist::new(Format::EESchema);
        raw.components.push(raw_component("C1", &[]));
        raw.filters.push(RawFilterList {
            line: 10,
            reference: "C1".into(),
            patterns: vec!["SM0603".into()],
        });
        raw.filters.push(RawFilterList {
            line: 14,
            reference: "C9".into(),
            patterns: vec!["SM0805".into()],
        });

        let loaded: Loaded = raw.try_into().unwrap();
        assert_eq!(loaded.netlist.components()[0].filters, ["SM0603"]);
        assert_eq!(
            loaded.warnings,
            [Warning::UnknownReference {
                reference: "C9".into(),
                context: "Footprint filter list at line 14".into()
            }]
        );
    }

    #[test]
    fn repeated_reference_is_rejected() {
        let mut raw = RawNetlist::new(Format::EESchema);
        for (line, reference) in [(3, "U1"), (7, "R1"), (9, "U1")] {
            let mut component = raw_component(reference, &[]);
            component.line = line;
            raw.components.push(component);
        }
        let err = Loaded::try_from(raw).unwrap_err();
        assert_eq!(err.line(), 9);
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn wirelist_units_may_share_a_reference() {
        let mut raw = RawNetlist::new(Format::ViewlogicWirelist);
        raw.components.push(raw_component("U1", &[("1", "A")]));
        raw.components.push(raw_component("U1", &[("4", "B")]));
        let loaded = Loaded::try_from(raw).unwrap();
        assert_eq!(loaded.netlist.len(), 2);
    }

    #[test]
    fn empty_reference_is_rejected() {
        let mut raw = raw_component("", &[]);
        raw.line = 5;
        let err = Component::try_from(raw).unwrap_err();
        assert_eq!(err.line(), 5);
    }
}
