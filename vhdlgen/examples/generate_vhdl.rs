//! Build a small circuit through the API and print its generated VHDL.
//!
//! Run with: cargo run --example generate_vhdl

use vhdlgen::graph::WireEnd;
use vhdlgen::prelude::*;

fn main() -> Result<(), HdlError> {
    let catalog = Catalog::builtin();
    let mut graph = CircuitGraph::new();

    // Half adder: two input pads, xor for the sum, and for the carry.
    let a = graph.add_device("A", catalog.find("io:input").unwrap());
    let b = graph.add_device("B", catalog.find("io:input").unwrap());
    let sum = graph.add_device("S", catalog.find("io:output").unwrap());
    let carry = graph.add_device("C", catalog.find("io:output").unwrap());
    let xor_gate = graph.add_device("X0", catalog.find("gates:xor2").unwrap());
    let and_gate = graph.add_device("G0", catalog.find("gates:and2").unwrap());

    let point = |graph: &CircuitGraph, device, pin: &str| {
        graph
            .connection_point_of(graph.pin_named(device, pin).unwrap())
            .unwrap()
    };

    // Each input pad fans out to both gates through a junction.
    for (name, pad) in [("a", a), ("b", b)] {
        let fork = graph.add_junction();
        let feed = graph.add_wire(&format!("w{}", name));
        graph.connect_wire(feed, WireEnd::Left, point(&graph, pad, "O"));
        graph.connect_wire(feed, WireEnd::Right, fork);

        let pin = if name == "a" { "A" } else { "B" };
        let to_xor = graph.add_wire(&format!("w{}x", name));
        graph.connect_wire(to_xor, WireEnd::Left, fork);
        graph.connect_wire(to_xor, WireEnd::Right, point(&graph, xor_gate, pin));
        let to_and = graph.add_wire(&format!("w{}g", name));
        graph.connect_wire(to_and, WireEnd::Left, fork);
        graph.connect_wire(to_and, WireEnd::Right, point(&graph, and_gate, pin));
    }

    let ws = graph.add_wire("ws");
    graph.connect_wire(ws, WireEnd::Left, point(&graph, xor_gate, "Y"));
    graph.connect_wire(ws, WireEnd::Right, point(&graph, sum, "I"));
    let wc = graph.add_wire("wc");
    graph.connect_wire(wc, WireEnd::Left, point(&graph, and_gate, "Y"));
    graph.connect_wire(wc, WireEnd::Right, point(&graph, carry, "I"));

    let mut document = Document::with_circuit("half_adder", graph);
    println!("{}", document.build_vhdl()?);
    println!("{}", document.build_signals_file()?);
    Ok(())
}
