//! End-to-end generation tests over the fixture circuits.

use std::path::PathBuf;
use vhdlgen::prelude::*;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture(name: &str) -> Document {
    let catalog = Catalog::builtin();
    load_document(&fixture_path(name), &catalog).expect("fixture should load")
}

const AND_GATE_VHDL: &str = "ENTITY and_gate IS\n\
\tPORT( A0_O : OUT BIT; B0_O : OUT BIT; Y0_I : IN BIT);\n\
END and_gate;\n\
\n\
ARCHITECTURE structural OF and_gate IS\n\
\tCOMPONENT and2\n\
\t\tPORT( A : IN BIT; B : IN BIT; Y : OUT BIT);\n\
\tEND COMPONENT;\n\
\n\
\tBEGIN\n\
\t\tG0 : and2 PORT MAP( A0_O, B0_O, Y0_I);\n\
\n\
END structural;\n";

const AND_NOT_VHDL: &str = "ENTITY and_not IS\n\
\tPORT( A0_O : OUT BIT; B0_O : OUT BIT; Y0_I : IN BIT);\n\
END and_not;\n\
\n\
ARCHITECTURE structural OF and_not IS\n\
\tCOMPONENT and2\n\
\t\tPORT( A : IN BIT; B : IN BIT; Y : OUT BIT);\n\
\tEND COMPONENT;\n\
\tCOMPONENT inv\n\
\t\tPORT( A : IN BIT; Y : OUT BIT);\n\
\tEND COMPONENT;\n\
\n\
\tSIGNAL wm: BIT;\n\
\n\
\tBEGIN\n\
\t\tG0 : and2 PORT MAP( A0_O, B0_O, wm);\n\
\n\
\t\tN0 : inv PORT MAP( wm, Y0_I);\n\
\n\
END structural;\n";

const AND_GATE_SIGNALS: &str = "<signals entity=\"and_gate\">\n\
\n\
\t<signal accessMode=\"OUT\">A0_O</signal>\n\
\t<signal accessMode=\"OUT\">B0_O</signal>\n\
\t<signal accessMode=\"IN\">Y0_I</signal>\n\
\n\
</signals>\n";

#[test]
fn test_and_gate_vhdl() {
    let mut document = load_fixture("and_gate.json");
    assert_eq!(document.build_vhdl().unwrap(), AND_GATE_VHDL);
}

#[test]
fn test_and_not_vhdl_declares_internal_signal() {
    let mut document = load_fixture("and_not.json");
    assert_eq!(document.build_vhdl().unwrap(), AND_NOT_VHDL);
}

#[test]
fn test_and_gate_signals_file() {
    let mut document = load_fixture("and_gate.json");
    assert_eq!(document.build_signals_file().unwrap(), AND_GATE_SIGNALS);
}

#[test]
fn test_repeated_builds_use_the_cache() {
    let mut document = load_fixture("and_not.json");

    let first = document.build_vhdl().unwrap();
    let visited = document.generator().traversed_points();
    assert!(visited > 0);

    // A second build of both outputs must not resolve anything again.
    let second = document.build_vhdl().unwrap();
    document.build_signals_file().unwrap();
    assert_eq!(first, second);
    assert_eq!(document.generator().traversed_points(), visited);
}

#[test]
fn test_mutation_invalidates_every_stage() {
    let mut document = load_fixture("and_not.json");
    let before = document.build_vhdl().unwrap();
    let visited = document.generator().traversed_points();
    assert!(before.contains("SIGNAL wm: BIT;"));

    assert!(document.circuit_mut().unwrap().rename_wire("wm", "mid"));

    let after = document.build_vhdl().unwrap();
    assert!(document.generator().traversed_points() > visited);
    assert!(after.contains("SIGNAL mid: BIT;"));
    assert!(after.contains("PORT MAP( A0_O, B0_O, mid);"));
    assert!(after.contains("PORT MAP( mid, Y0_I);"));
    assert!(!after.contains("wm"));
}

#[test]
fn test_duplicate_devices_do_not_widen_the_interface() {
    let catalog = Catalog::builtin();
    let mut document = load_fixture("and_gate.json");
    let baseline_ports = {
        document.build_vhdl().unwrap();
        document.generator().ports().len()
    };

    // Mirror A0 as a duplicate: same connectivity through a point link,
    // no wires of its own.
    {
        let circuit = document.circuit_mut().unwrap();
        let a0 = circuit.find_device("A0").unwrap();
        let a0_point = circuit
            .connection_point_of(circuit.pin_named(a0, "O").unwrap())
            .unwrap();
        let dup = circuit.add_device("A0(0)", catalog.find("io:input").unwrap());
        let dup_point = circuit
            .connection_point_of(circuit.pin_named(dup, "O").unwrap())
            .unwrap();
        circuit.link_points(a0_point, dup_point);
    }

    let vhdl = document.build_vhdl().unwrap();
    assert_eq!(document.generator().ports().len(), baseline_ports);
    assert!(!vhdl.contains("A0(0)"));
}

#[test]
fn test_passthrough_collapses_to_one_port() {
    let catalog = Catalog::builtin();
    let mut graph = CircuitGraph::new();
    let a0 = graph.add_device("A0", catalog.find("io:input").unwrap());
    let y0 = graph.add_device("Y0", catalog.find("io:output").unwrap());
    let a_point = graph
        .connection_point_of(graph.pin_named(a0, "O").unwrap())
        .unwrap();
    let y_point = graph
        .connection_point_of(graph.pin_named(y0, "I").unwrap())
        .unwrap();
    let wire = graph.add_wire("w");
    graph.connect_wire(wire, WireEnd::Left, a_point);
    graph.connect_wire(wire, WireEnd::Right, y_point);

    // One net shared by two pads: the first pin reached represents it.
    let mut document = Document::with_circuit("passthrough", graph);
    let vhdl = document.build_vhdl().unwrap();
    assert_eq!(document.generator().ports().len(), 1);
    assert!(vhdl.contains("PORT( A0_O : OUT BIT);"));
    assert!(!vhdl.contains("SIGNAL"));
}

/// Classification must not depend on the order devices were placed in.
#[test]
fn test_classification_ignores_placement_order() {
    fn build(gates_first: bool) -> CircuitGraph {
        let catalog = Catalog::builtin();
        let mut graph = CircuitGraph::new();
        let add_gates = |graph: &mut CircuitGraph| {
            graph.add_device("G0", catalog.find("gates:and2").unwrap());
            graph.add_device("N0", catalog.find("gates:inv").unwrap());
        };
        let add_pads = |graph: &mut CircuitGraph| {
            graph.add_device("A0", catalog.find("io:input").unwrap());
            graph.add_device("B0", catalog.find("io:input").unwrap());
            graph.add_device("Y0", catalog.find("io:output").unwrap());
        };
        if gates_first {
            add_gates(&mut graph);
            add_pads(&mut graph);
        } else {
            add_pads(&mut graph);
            add_gates(&mut graph);
        }

        let wire = |graph: &mut CircuitGraph, name: &str, from: (&str, &str), to: (&str, &str)| {
            let w = graph.add_wire(name);
            let from_device = graph.find_device(from.0).unwrap();
            let from_point = graph
                .connection_point_of(graph.pin_named(from_device, from.1).unwrap())
                .unwrap();
            let to_device = graph.find_device(to.0).unwrap();
            let to_point = graph
                .connection_point_of(graph.pin_named(to_device, to.1).unwrap())
                .unwrap();
            graph.connect_wire(w, WireEnd::Left, from_point);
            graph.connect_wire(w, WireEnd::Right, to_point);
        };
        wire(&mut graph, "wa", ("A0", "O"), ("G0", "A"));
        wire(&mut graph, "wb", ("B0", "O"), ("G0", "B"));
        wire(&mut graph, "wm", ("G0", "Y"), ("N0", "A"));
        wire(&mut graph, "wy", ("N0", "Y"), ("Y0", "I"));
        graph
    }

    let mut classified = Vec::new();
    for gates_first in [false, true] {
        let graph = build(gates_first);
        let mut generator = HdlGenerator::new();
        generator.ensure_nets(&graph);

        let mut external: Vec<String> = generator.external_nets().keys().cloned().collect();
        let mut internal: Vec<String> = generator.internal_nets().keys().cloned().collect();
        external.sort();
        internal.sort();
        classified.push((external, internal));
    }

    assert_eq!(classified[0], classified[1]);
    assert_eq!(classified[0].0, ["wa", "wb", "wy"]);
    assert_eq!(classified[0].1, ["wm"]);
}

/// A wire whose name already belongs to an external net halts the internal
/// traversal at that point: nothing beyond it is classified.
#[test]
fn test_external_name_collision_stops_internal_traversal() {
    let catalog = Catalog::builtin();
    let mut graph = CircuitGraph::new();

    // External net "n" between two pads.
    let a0 = graph.add_device("A0", catalog.find("io:input").unwrap());
    let y0 = graph.add_device("Y0", catalog.find("io:output").unwrap());
    let a_point = graph
        .connection_point_of(graph.pin_named(a0, "O").unwrap())
        .unwrap();
    let y_point = graph
        .connection_point_of(graph.pin_named(y0, "I").unwrap())
        .unwrap();
    let ext = graph.add_wire("n");
    graph.connect_wire(ext, WireEnd::Left, a_point);
    graph.connect_wire(ext, WireEnd::Right, y_point);

    // A disconnected island whose first wire reuses the name "n".
    let g0 = graph.add_device("G0", catalog.find("gates:inv").unwrap());
    let g_point = graph
        .connection_point_of(graph.pin_named(g0, "Y").unwrap())
        .unwrap();
    let j1 = graph.add_junction();
    let j2 = graph.add_junction();
    let alias = graph.add_wire("n");
    graph.connect_wire(alias, WireEnd::Left, g_point);
    graph.connect_wire(alias, WireEnd::Right, j1);
    let beyond = graph.add_wire("m");
    graph.connect_wire(beyond, WireEnd::Left, j1);
    graph.connect_wire(beyond, WireEnd::Right, j2);

    let mut generator = HdlGenerator::new();
    generator.ensure_nets(&graph);

    assert!(generator.external_nets().contains_key("n"));
    // "m" lies past the collision and is never reached.
    assert!(generator.internal_nets().is_empty());
}

#[test]
fn test_gate_only_circuit_has_no_interface() {
    let catalog = Catalog::builtin();
    let mut graph = CircuitGraph::new();
    graph.add_device("G0", catalog.find("gates:inv").unwrap());

    let mut document = Document::with_circuit("island", graph);
    assert!(matches!(
        document.build_vhdl(),
        Err(HdlError::EmptyInterface)
    ));
    assert!(matches!(
        document.build_signals_file(),
        Err(HdlError::EmptyInterface)
    ));
}

#[test]
fn test_generate_writes_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut document = load_fixture("and_gate.json");

    let result = document.generate(dir.path()).unwrap();
    assert_eq!(result.vhdl_path, dir.path().join("and_gate.vhd"));
    assert_eq!(result.signals_path, dir.path().join("and_gate.sig"));
    assert_eq!(result.ports, 3);
    assert_eq!(result.internal_signals, 0);
    assert_eq!(result.dependencies, 1);

    let vhdl = std::fs::read_to_string(&result.vhdl_path).unwrap();
    assert_eq!(vhdl, AND_GATE_VHDL);
    let signals = std::fs::read_to_string(&result.signals_path).unwrap();
    assert_eq!(signals, AND_GATE_SIGNALS);
}
