use std::collections::BTreeMap;

use tracing::debug;

use crate::config::Config;
use crate::simulation::location::Position;
use crate::simulation::{Circuit, Element, ElementKey, ElementKind};
use crate::synthesis::equation::{render_term, variable_name, variable_names};
use crate::synthesis::term::Term;
use crate::synthesis::{check_num_vars, SynthesisError};

pub const OUTPUT_LABEL: &str = "F";

/// A freshly synthesized circuit, keyed independently of any live model.
#[derive(Debug)]
pub struct Fragment {
    pub circuit: Circuit,
    /// One INPUT element per variable, A first.
    pub inputs: Vec<ElementKey>,
    pub output: ElementKey,
}

/// Where a [`Fragment`]'s elements ended up after merging.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PlacedFragment {
    pub inputs: Vec<ElementKey>,
    pub output: ElementKey,
    pub elements: Vec<ElementKey>,
}

// layout columns, left to right
const INPUT_COLUMN: usize = 0;
const NOT_COLUMN: usize = 1;
const AND_COLUMN: usize = 2;
const OR_COLUMN: usize = 3;
const OUTPUT_COLUMN: usize = 4;

struct Layout<'c> {
    origin: Position,
    config: &'c Config,
    next_y: [f32; 5],
}

impl<'c> Layout<'c> {
    fn new(origin: Position, config: &'c Config) -> Self {
        Self { origin, config, next_y: [0.0; 5] }
    }

    // stacks elements down a column, never closer than their own height plus a gap
    fn place(&mut self, column: usize, element: Element) -> Element {
        let y = self.next_y[column];
        self.next_y[column] += self.config.layout_row_spacing.max(element.size.height + self.config.layout_row_gap);
        let position = self.origin.offset(column as f32 * self.config.layout_column_spacing, y);
        Element { position, ..element }
    }
}

/// Builds a two-level AND/OR circuit computing the sum of `terms`, laid out to the right of and below `origin`.
///
/// Each negated variable gets one shared NOT gate, each term with two or more literals one AND gate, and the
/// products feed one OR gate when there is more than one of them. A gate never gets more than
/// `config.max_gate_inputs` inputs; wider products and sums become a tree of gates. Single literals and single
/// products are wired straight through. No terms leaves the output unconnected (constant false); an all don't-care term drives the
/// output from a NOT gate with a floating input (constant true). Connection states start low: stabilize after
/// merging.
pub fn synthesize(num_vars: usize, terms: &[Term], origin: Position, config: &Config) -> Result<Fragment, SynthesisError> {
    check_num_vars(num_vars)?;
    if let Some(term) = terms.iter().find(|term| term.width() != num_vars) {
        return Err(SynthesisError::TermWidthMismatch { term: term.to_string(), width: term.width(), num_vars });
    }

    let mut circuit = Circuit::new();
    let mut layout = Layout::new(origin, config);
    let names = variable_names(num_vars);

    let inputs: Vec<ElementKey> = names.iter().map(|name| circuit.insert_element(layout.place(INPUT_COLUMN, Element::new(ElementKind::Input, origin).with_label(name)))).collect();

    let combined = if terms.iter().any(Term::is_tautology) {
        Some(circuit.insert_element(layout.place(NOT_COLUMN, Element::new(ElementKind::Not, origin).with_label("1"))))
    } else {
        let inverted = shared_inverters(&mut circuit, &mut layout, &inputs, terms)?;
        let mut products = Vec::with_capacity(terms.len());
        for term in terms {
            let literals: Vec<ElementKey> = term.literals().map(|(var, positive)| if positive { inputs[var] } else { inverted[&var] }).collect();
            products.push(product(&mut circuit, &mut layout, &literals, render_term(term, &names))?);
        }
        sum(&mut circuit, &mut layout, &products)?
    };

    let output = circuit.insert_element(layout.place(OUTPUT_COLUMN, Element::new(ElementKind::Output, origin).with_label(OUTPUT_LABEL)));
    if let Some(combined) = combined {
        circuit.connect(combined, output, 0).map_err(internal)?;
    }

    debug!(num_vars, terms = terms.len(), elements = circuit.num_elements(), connections = circuit.num_connections(), "synthesized fragment");
    Ok(Fragment { circuit, inputs, output })
}

fn shared_inverters(circuit: &mut Circuit, layout: &mut Layout<'_>, inputs: &[ElementKey], terms: &[Term]) -> Result<BTreeMap<usize, ElementKey>, SynthesisError> {
    let mut inverted = BTreeMap::new();
    for (var, _) in terms.iter().flat_map(|term| term.literals()).filter(|(_, positive)| !positive) {
        if inverted.contains_key(&var) {
            continue;
        }
        let not = circuit.insert_element(layout.place(NOT_COLUMN, Element::new(ElementKind::Not, layout.origin).with_label(format!("{}'", variable_name(var)))));
        circuit.connect(inputs[var], not, 0).map_err(internal)?;
        inverted.insert(var, not);
    }
    Ok(inverted)
}

fn product(circuit: &mut Circuit, layout: &mut Layout<'_>, literals: &[ElementKey], label: String) -> Result<ElementKey, SynthesisError> {
    let and = gate_tree(circuit, layout, AND_COLUMN, ElementKind::And, literals)?.ok_or_else(|| SynthesisError::Internal("product without literals".to_string()))?;
    if literals.len() > 1 {
        if let Some(element) = circuit.elements.get_mut(and) {
            element.label = label;
        }
    }
    Ok(and)
}

fn sum(circuit: &mut Circuit, layout: &mut Layout<'_>, products: &[ElementKey]) -> Result<Option<ElementKey>, SynthesisError> {
    gate_tree(circuit, layout, OR_COLUMN, ElementKind::Or, products)
}

// joins `signals` with gates of `kind` no wider than the configured maximum, nesting them when there are more
// signals than one gate takes; a lone signal is passed through
fn gate_tree(circuit: &mut Circuit, layout: &mut Layout<'_>, column: usize, kind: ElementKind, signals: &[ElementKey]) -> Result<Option<ElementKey>, SynthesisError> {
    let width = layout.config.max_gate_inputs.max(2);
    let mut level = signals.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(width));
        for chunk in level.chunks(width) {
            if let [signal] = chunk {
                next.push(*signal);
                continue;
            }
            let gate = circuit.insert_element(layout.place(column, Element::with_inputs(kind, chunk.len(), layout.origin)));
            for (pin, signal) in chunk.iter().enumerate() {
                circuit.connect(*signal, gate, pin).map_err(internal)?;
            }
            next.push(gate);
        }
        level = next;
    }
    Ok(level.first().copied())
}

// every connection made here targets a pin the same function just created
fn internal(error: crate::simulation::EditError) -> SynthesisError {
    SynthesisError::Internal(error.to_string())
}

impl Fragment {
    pub fn merge_into(self, circuit: &mut Circuit) -> PlacedFragment {
        let mapping = circuit.merge(self.circuit);
        let mut elements: Vec<ElementKey> = mapping.values().copied().collect();
        elements.sort();
        PlacedFragment { inputs: self.inputs.iter().map(|input| mapping[input]).collect(), output: mapping[&self.output], elements }
    }
}
