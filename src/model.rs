use std::cmp::Ordering;

use crate::format::Format;

/// Net name written for a pin that is not connected
pub const UNCONNECTED: &str = "?";
/// Footprint name written for a component that has no footprint yet
pub const NO_FOOTPRINT: &str = "$noname";

/// Natural ordering of designators and pin numbers ("R9" < "R10")
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natord::compare(a, b)
}

/// An individual pin. An empty net means unconnected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub number: String,
    pub net: String,
}

impl Pin {
    pub fn new(number: impl Into<String>, net: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            net: net.into(),
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.net.is_empty()
    }
}

/// Footprint association of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link<'a> {
    Unresolved,
    Resolved(&'a str),
}

/// A component in the schematic
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Component {
    /// Opaque key shared between the schematic and the board
    pub timestamp: String,
    pub reference: String,
    pub value: String,
    /// Wildcard patterns narrowing the footprint candidates
    pub filters: Vec<String>,
    /// Number of units in the package, when the source declares it
    pub part_count: Option<u32>,
    footprint: String,
    pins: Vec<Pin>,
    declared: usize,
    position: usize,
}

impl Component {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn add_pin(&mut self, pin: Pin) {
        self.pins.push(pin);
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub(crate) fn pins_mut(&mut self) -> &mut Vec<Pin> {
        &mut self.pins
    }

    pub fn footprint(&self) -> &str {
        &self.footprint
    }

    pub fn link(&self) -> Link<'_> {
        if self.footprint.is_empty() {
            Link::Unresolved
        } else {
            Link::Resolved(&self.footprint)
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.footprint.is_empty()
    }

    /// Unchecked write; catalog policy lives in [`crate::resolve::LinkResolver`]
    pub(crate) fn set_footprint(&mut self, footprint: impl Into<String>) {
        self.footprint = footprint.into();
    }

    /// Position in the source file, starting at 0
    pub fn declared(&self) -> usize {
        self.declared
    }

    /// 1-based display position assigned by the alphabetic sort, 0 before sorting
    pub fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

/// Iteration order over the components of a netlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Order of appearance in the source file
    Declaration,
    /// Natural order of the reference designators
    Alphabetic,
}

/// The full netlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Netlist {
    pub format: Format,
    components: Vec<Component>,
}

impl Netlist {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            components: vec![],
        }
    }

    /// Append a component, recording its declaration position
    pub fn push(&mut self, mut component: Component) {
        component.declared = self.components.len();
        self.components.push(component);
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub(crate) fn components_mut(&mut self) -> &mut Vec<Component> {
        &mut self.components
    }

    pub fn components_in(&self, order: Order) -> Vec<&Component> {
        let mut components: Vec<&Component> = self.components.iter().collect();
        match order {
            Order::Declaration => components.sort_by_key(|c| c.declared),
            Order::Alphabetic => {
                components.sort_by(|a, b| natural_cmp(&a.reference, &b.reference))
            }
        }
        components
    }

    pub fn get(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub fn find(&self, reference: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.reference == reference)
    }

    pub fn position_of(&self, reference: &str) -> Option<usize> {
        self.components.iter().position(|c| c.reference == reference)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.components.iter().filter(|c| c.is_resolved()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("R9", "R10", Ordering::Less)]
    #[case("R10", "R9", Ordering::Greater)]
    #[case("C1", "R1", Ordering::Less)]
    #[case("U2", "U2", Ordering::Equal)]
    #[case("U1A", "U1B", Ordering::Less)]
    fn natural_ordering(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(natural_cmp(a, b), expected);
    }

    #[test]
    fn link_follows_footprint() {
        let mut c = Component::new("U1");
        assert_eq!(c.link(), Link::Unresolved);
        c.set_footprint("DIP-14");
        assert_eq!(c.link(), Link::Resolved("DIP-14"));
        c.set_footprint("");
        assert!(!c.is_resolved());
    }

    #[test]
    fn components_in_keeps_declaration_order_available() {
        let mut netlist = Netlist::new(Format::EESchema);
        netlist.push(Component::new("R10"));
        netlist.push(Component::new("R9"));
        netlist.push(Component::new("C1"));

        let alpha: Vec<_> = netlist
            .components_in(Order::Alphabetic)
            .iter()
            .map(|c| c.reference.as_str())
            .collect();
        assert_eq!(alpha, ["C1", "R9", "R10"]);

        let declared: Vec<_> = netlist
            .components_in(Order::Declaration)
            .iter()
            .map(|c| c.reference.as_str())
            .collect();
        assert_eq!(declared, ["R10", "R9", "C1"]);
    }
}
