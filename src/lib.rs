//! Reading legacy schematic netlists and linking their components to footprints.
//!
//! ```no_run
//! use std::sync::Arc;
//! use netlist_link::{catalog::FootprintCatalog, Config, Engine, Order};
//!
//! # fn main() -> Result<(), netlist_link::Error> {
//! let catalog = FootprintCatalog::load_libraries(["lib/smd.mod", "lib/dip.mod"])?;
//! let mut engine = Engine::new(Config::default(), Arc::new(catalog));
//! engine.load_netlist("board.net")?;
//! for component in engine.components_in(Order::Alphabetic) {
//!     println!("{} {}", component.reference, component.value);
//! }
//! engine.set_footprint(0, "SM0603")?;
//! engine.save_links("board.net.out")?;
//! # Ok(())
//! # }
//! ```

mod context;
mod engine;
mod model;
mod text;

pub mod catalog;
pub mod cmp;
pub mod config;
pub mod equ;
pub mod error;
pub mod format;
pub mod normalize;
pub mod parse;
pub mod raw;
pub mod resolve;
pub mod write;

pub use config::Config;
pub use engine::{Engine, FootprintCandidates, Stats};
pub use error::{ConfigError, Error, FormatError, LinkError, Warning};
pub use format::Format;
pub use model::{natural_cmp, Component, Link, Netlist, Order, Pin, NO_FOOTPRINT, UNCONNECTED};
pub use parse::Loaded;

/// Parse and normalize a netlist. `pkg` is the companion `.pkg` text of a
/// Viewlogic netlist.
pub fn read_netlist(input: &str, pkg: Option<&str>) -> Result<Loaded, FormatError> {
    let raw = format::parse(input, pkg)?;
    let mut loaded = Loaded::try_from(raw)?;
    normalize::normalize(&mut loaded);
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    macro_rules! test_data {
        ($fname:expr) => {
            std::fs::read_to_string(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/resources/test/",
                $fname
            ))
            .unwrap()
        };
    }

    fn references(netlist: &Netlist) -> Vec<&str> {
        netlist
            .components()
            .iter()
            .map(|c| c.reference.as_str())
            .collect()
    }

    fn pins(netlist: &Netlist, reference: &str) -> Vec<(String, String)> {
        netlist
            .find(reference)
            .unwrap()
            .pins()
            .iter()
            .map(|p| (p.number.clone(), p.net.clone()))
            .collect()
    }

    fn pairs(pins: &[(&str, &str)]) -> Vec<(String, String)> {
        pins.iter()
            .map(|(n, net)| (n.to_string(), net.to_string()))
            .collect()
    }

    #[test]
    fn minimal_eeschema_netlist() {
        let input = "# EESchema Netlist Version 1.1\n(\n ( 00000001 74LS00 U1 NAND\n  ( 1 NET1 )\n  ( 2 NET2 )\n )\n)\n*\n";
        let loaded = read_netlist(input, None).unwrap();
        assert!(loaded.warnings.is_empty());
        let netlist = &loaded.netlist;
        assert_eq!(netlist.len(), 1);
        let u1 = &netlist.components()[0];
        assert_eq!(u1.reference, "U1");
        assert_eq!(u1.value, "NAND");
        assert_eq!(u1.footprint(), "74LS00");
        assert_eq!(u1.timestamp, "00000001");
        assert_eq!(u1.pins(), [Pin::new("1", "NET1"), Pin::new("2", "NET2")]);
    }

    #[test]
    fn eeschema_file() {
        let loaded = read_netlist(&test_data!("eeschema.net"), None).unwrap();
        let netlist = &loaded.netlist;
        assert_eq!(netlist.format, Format::EESchema);
        assert_eq!(references(netlist), ["C1", "C2", "R2", "R10", "U1"]);
        assert_eq!(netlist.find("C1").unwrap().filters, ["SM0603", "C?"]);
        assert_eq!(netlist.find("U1").unwrap().link(), Link::Resolved("DIP-14"));
        assert_eq!(netlist.find("R10").unwrap().link(), Link::Unresolved);
        assert_eq!(
            pins(netlist, "U1"),
            pairs(&[
                ("1", "INPUT_A"),
                ("2", "INPUT_B"),
                ("3", "THIS_IS_A_VERY_LONG_NET_NAME"),
                ("7", "GND"),
                ("14", "VCC")
            ])
        );
        assert_eq!(
            loaded.warnings,
            [Warning::InconsistentPinNet {
                reference: "R2".into(),
                pin: "1".into(),
                kept: "VCC".into(),
                dropped: "GND".into()
            }]
        );
    }

    #[test]
    fn orcad_file() {
        let loaded = read_netlist(&test_data!("orcad.net"), None).unwrap();
        let netlist = &loaded.netlist;
        assert_eq!(netlist.format, Format::OrcadPcb2);
        assert_eq!(references(netlist), ["R1", "U2"]);
        // (7=GND) forces pin 7 off N0001
        assert_eq!(
            pins(netlist, "U2"),
            pairs(&[("1", "IN"), ("7", "GND"), ("14", "VCC")])
        );
        assert_eq!(pins(netlist, "R1"), pairs(&[("1", "IN"), ("2", "")]));
    }

    #[test]
    fn pcad_file() {
        let loaded = read_netlist(&test_data!("pcad.net"), None).unwrap();
        let netlist = &loaded.netlist;
        assert_eq!(netlist.format, Format::Pcad);
        assert_eq!(references(netlist), ["R1", "U1"]);
        let u1 = netlist.find("U1").unwrap();
        assert_eq!(u1.value, "74HCT00A");
        assert_eq!(u1.timestamp, "00000001");
        assert!(!u1.is_resolved());
        assert_eq!(
            pins(netlist, "U1"),
            pairs(&[("1", "CLK"), ("2", "CLK"), ("7", "GND"), ("14", "VCC")])
        );
    }

    #[test]
    fn viewlogic_files() {
        let loaded = read_netlist(
            &test_data!("viewlogic.net"),
            Some(&test_data!("viewlogic.pkg")),
        )
        .unwrap();
        let netlist = &loaded.netlist;
        assert_eq!(netlist.format, Format::ViewlogicNetPkg);
        assert_eq!(references(netlist), ["R1", "U1", "U2"]);
        assert_eq!(netlist.find("U2").unwrap().footprint(), "DIP14");
        assert_eq!(
            pins(netlist, "U1"),
            pairs(&[("1", "A"), ("7", "GND"), ("14", "VCC")])
        );
        assert_eq!(
            loaded.warnings,
            [Warning::UnknownReference {
                reference: "U9".into(),
                context: "Net GND".into()
            }]
        );
    }

    #[test]
    fn wirelist_file() {
        let loaded = read_netlist(&test_data!("wirelist.wir"), None).unwrap();
        let netlist = &loaded.netlist;
        assert_eq!(netlist.format, Format::ViewlogicWirelist);
        assert_eq!(references(netlist), ["R1", "U1"]);

        let u1 = netlist.find("U1").unwrap();
        assert_eq!(u1.value, "74LS00");
        assert_eq!(u1.footprint(), "DIP14");
        assert_eq!(u1.part_count, Some(4));
        assert_eq!(
            pins(netlist, "U1"),
            pairs(&[
                ("1", "A"),
                ("2", "B"),
                ("3", "Y1"),
                ("4", "Y1"),
                ("5", "C"),
                ("6", "Y2"),
                ("7", "GND"),
                ("14", "VCC")
            ])
        );
        assert!(loaded.warnings.is_empty());
    }

    #[rstest]
    #[case::empty("", 1)]
    #[case::unknown_header("\n\nNETLIST v3\n", 3)]
    #[case::bad_record("# EESchema Netlist Version 1.1\n(\n ( 1 $noname R1 10K\n  1 GND\n )\n)\n", 4)]
    fn load_errors_carry_line(#[case] input: &str, #[case] line: usize) {
        let err = read_netlist(input, None).unwrap_err();
        assert_eq!(err.line(), line, "{err}");
    }

    #[test]
    fn normalized_netlists_are_sorted_and_deduplicated() {
        let loaded = read_netlist(&test_data!("eeschema.net"), None).unwrap();
        let components = loaded.netlist.components();
        for pair in components.windows(2) {
            assert!(natural_cmp(&pair[0].reference, &pair[1].reference).is_le());
        }
        for component in components {
            for pair in component.pins().windows(2) {
                assert_ne!(pair[0].number, pair[1].number);
            }
        }
    }
}
