use std::collections::HashMap;

use tracing::{trace, warn};

use crate::simulation::{Circuit, ConnectionKey, ElementKey, ElementKind};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Settle {
    /// Rounds actually run, including the final quiet one when the circuit settled.
    pub rounds: usize,
    pub settled: bool,
}

/// Output of an element of `kind` given its input pins. Externally driven kinds keep `current`.
pub fn compute(kind: ElementKind, inputs: &[bool], current: bool) -> bool {
    let all = || !inputs.is_empty() && inputs.iter().all(|input| *input);
    let any = || inputs.iter().any(|input| *input);
    match kind {
        ElementKind::And => all(),
        ElementKind::Or => any(),
        // zero-input gates output false no matter what the inversion would say
        ElementKind::Nand => !inputs.is_empty() && !all(),
        ElementKind::Nor => !inputs.is_empty() && !any(),
        ElementKind::Xor => inputs.iter().filter(|input| **input).count() % 2 == 1,
        ElementKind::Not => inputs.first().is_some_and(|input| !input),
        ElementKind::Output => inputs.first().copied().unwrap_or(false),
        ElementKind::Input | ElementKind::Clock => current,
    }
}

/// Returns a stabilized copy of `circuit`, leaving the original untouched.
pub fn stabilize(circuit: &Circuit, max_rounds: usize) -> (Circuit, Settle) {
    let mut next = circuit.clone();
    let settle = update(&mut next, max_rounds);
    (next, settle)
}

/// Runs propagation rounds until one changes nothing or `max_rounds` have run.
///
/// Each round first copies every source output onto its connections, then recomputes every element from the
/// connection states alone, so the order elements are visited in cannot affect the result.
/// Oscillating feedback is not detected; it is left wherever the last round put it.
pub fn update(circuit: &mut Circuit, max_rounds: usize) -> Settle {
    let drivers = pin_drivers(circuit);

    for round in 1..=max_rounds {
        let wires_changed = update_connections(circuit);
        let elements_changed = update_elements(circuit, &drivers);
        trace!(round, wires_changed, elements_changed, "propagation round");

        if !wires_changed && !elements_changed {
            return Settle { rounds: round, settled: true };
        }
    }

    warn!(max_rounds, "circuit did not settle");
    Settle { rounds: max_rounds, settled: false }
}

// connections whose endpoints are gone are left out, so the pin they would feed reads low
fn pin_drivers(circuit: &Circuit) -> HashMap<(ElementKey, usize), ConnectionKey> {
    let mut drivers = HashMap::new();
    for (key, connection) in circuit.connections.iter() {
        if !circuit.elements.contains_key(connection.source) || !circuit.elements.contains_key(connection.target) {
            trace!(?key, "skipping dangling connection");
            continue;
        }
        drivers.entry((connection.target, connection.target_pin)).or_insert(key);
    }
    drivers
}

fn update_connections(circuit: &mut Circuit) -> bool {
    let mut changed = false;
    for (_, connection) in circuit.connections.iter_mut() {
        let Some(source) = circuit.elements.get(connection.source) else { continue };
        if connection.state != source.output {
            connection.state = source.output;
            changed = true;
        }
    }
    changed
}

fn update_elements(circuit: &mut Circuit, drivers: &HashMap<(ElementKey, usize), ConnectionKey>) -> bool {
    let connections = &circuit.connections;
    let mut changed = false;
    for (key, element) in circuit.elements.iter_mut() {
        if element.kind.is_driven_externally() {
            continue;
        }

        for (pin, input) in element.inputs.iter_mut().enumerate() {
            let value = drivers.get(&(key, pin)).and_then(|connection| connections.get(*connection)).is_some_and(|connection| connection.state);
            if *input != value {
                *input = value;
                changed = true;
            }
        }

        let output = compute(element.kind, &element.inputs, element.output);
        if output != element.output {
            element.output = output;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod test {
    use super::{compute, stabilize, update, Settle};
    use crate::simulation::location::Position;
    use crate::simulation::{Circuit, Connection, ElementKind};
    use crate::utils::enumerate_inputs;

    const MAX_ROUNDS: usize = 20;

    #[test]
    fn gate_truth_tables() {
        for arity in 1..=4 {
            for inputs in enumerate_inputs(arity) {
                let all = inputs.iter().all(|i| *i);
                let any = inputs.iter().any(|i| *i);
                let parity = inputs.iter().filter(|i| **i).count() % 2 == 1;
                assert_eq!(compute(ElementKind::And, &inputs, false), all, "and {inputs:?}");
                assert_eq!(compute(ElementKind::Or, &inputs, false), any, "or {inputs:?}");
                assert_eq!(compute(ElementKind::Nand, &inputs, false), !all, "nand {inputs:?}");
                assert_eq!(compute(ElementKind::Nor, &inputs, false), !any, "nor {inputs:?}");
                assert_eq!(compute(ElementKind::Xor, &inputs, false), parity, "xor {inputs:?}");
            }
        }
        assert!(compute(ElementKind::Not, &[false], false));
        assert!(!compute(ElementKind::Not, &[true], true));
        assert!(compute(ElementKind::Output, &[true], false));
    }

    #[test]
    fn zero_input_gates_output_false() {
        for kind in [ElementKind::And, ElementKind::Or, ElementKind::Nand, ElementKind::Nor, ElementKind::Xor, ElementKind::Not, ElementKind::Output] {
            assert!(!compute(kind, &[], true), "{kind}");
        }
    }

    #[test]
    fn external_kinds_keep_their_value() {
        assert!(compute(ElementKind::Input, &[], true));
        assert!(!compute(ElementKind::Clock, &[], false));
    }

    #[test]
    fn floating_and_gate_is_low() {
        let mut circuit = Circuit::new();
        let and = circuit.add_element_with_inputs(ElementKind::And, 3, Position::default());
        circuit.elements[and].output = true;

        let (stable, settle) = stabilize(&circuit, MAX_ROUNDS);

        assert!(settle.settled);
        assert!(!stable.element(and).unwrap().output);
        assert_eq!(stable.element(and).unwrap().inputs, vec![false; 3]);
        // the input snapshot is untouched
        assert!(circuit.element(and).unwrap().output);
    }

    #[test]
    fn floating_pin_reads_low() {
        let mut circuit = Circuit::new();
        let a = circuit.add_element(ElementKind::Input, Position::default());
        let nand = circuit.add_element(ElementKind::Nand, Position::default());
        circuit.connect(a, nand, 0).unwrap();
        circuit.set_input(a, true).unwrap();

        update(&mut circuit, MAX_ROUNDS);

        assert_eq!(circuit.element(nand).unwrap().inputs, vec![true, false]);
        assert!(circuit.element(nand).unwrap().output);
    }

    #[test]
    fn chain_propagates() {
        let mut circuit = Circuit::new();
        let a = circuit.add_element(ElementKind::Input, Position::default());
        let mut previous = a;
        for _ in 0..5 {
            let not = circuit.add_element(ElementKind::Not, Position::default());
            circuit.connect(previous, not, 0).unwrap();
            previous = not;
        }
        let out = circuit.add_element(ElementKind::Output, Position::default());
        circuit.connect(previous, out, 0).unwrap();

        update(&mut circuit, MAX_ROUNDS);
        assert!(circuit.element(out).unwrap().output);

        circuit.toggle_input(a).unwrap();
        update(&mut circuit, MAX_ROUNDS);
        assert!(!circuit.element(out).unwrap().output);
        assert!(circuit.connections().all(|(_, connection)| connection.state == circuit.element(connection.source).unwrap().output));
    }

    #[test]
    fn stabilize_is_idempotent() {
        let mut circuit = Circuit::new();
        let a = circuit.add_element(ElementKind::Input, Position::default());
        let b = circuit.add_element(ElementKind::Input, Position::default());
        let xor = circuit.add_element(ElementKind::Xor, Position::default());
        let nor = circuit.add_element(ElementKind::Nor, Position::default());
        let out = circuit.add_element(ElementKind::Output, Position::default());
        circuit.connect(a, xor, 0).unwrap();
        circuit.connect(b, xor, 1).unwrap();
        circuit.connect(xor, nor, 0).unwrap();
        circuit.connect(a, nor, 1).unwrap();
        circuit.connect(nor, out, 0).unwrap();
        circuit.set_input(b, true).unwrap();

        let (once, first) = stabilize(&circuit, MAX_ROUNDS);
        let (twice, second) = stabilize(&once, MAX_ROUNDS);

        assert!(first.settled);
        assert_eq!(second, Settle { rounds: 1, settled: true });
        for (key, element) in once.elements() {
            assert_eq!(twice.element(key), Some(element));
        }
        for (key, connection) in once.connections() {
            assert_eq!(twice.connection(key), Some(connection));
        }
    }

    #[test]
    fn oscillation_stops_at_the_cap() {
        let mut circuit = Circuit::new();
        let not = circuit.add_element(ElementKind::Not, Position::default());
        circuit.connect(not, not, 0).unwrap();

        let settle = update(&mut circuit, MAX_ROUNDS);

        assert_eq!(settle, Settle { rounds: MAX_ROUNDS, settled: false });
    }

    #[test]
    fn dangling_connections_are_skipped() {
        let mut circuit = Circuit::new();
        let a = circuit.add_element(ElementKind::Input, Position::default());
        let gone = circuit.add_element(ElementKind::Input, Position::default());
        let or = circuit.add_element(ElementKind::Or, Position::default());
        circuit.connect(a, or, 0).unwrap();
        circuit.set_input(gone, true).unwrap();
        // bypass the cascade to simulate a half-finished delete
        circuit.connections.insert(Connection { state: true, ..Connection::new(gone, or, 1) });
        circuit.elements.remove(gone);

        let settle = update(&mut circuit, MAX_ROUNDS);

        assert!(settle.settled);
        assert_eq!(circuit.element(or).unwrap().inputs, vec![false, false]);
        assert!(!circuit.element(or).unwrap().output);
    }

    #[test]
    fn clock_tick_propagates() {
        let mut circuit = Circuit::new();
        let clock = circuit.add_element(ElementKind::Clock, Position::default());
        let out = circuit.add_element(ElementKind::Output, Position::default());
        circuit.connect(clock, out, 0).unwrap();

        update(&mut circuit, MAX_ROUNDS);
        assert!(!circuit.element(out).unwrap().output);

        circuit.tick_clocks();
        update(&mut circuit, MAX_ROUNDS);
        assert!(circuit.element(out).unwrap().output);
        assert!(circuit.element(clock).unwrap().output);
    }
}
