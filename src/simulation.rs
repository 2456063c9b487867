pub mod location;
pub mod logic;

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::synthesis::{self, Fragment, PlacedFragment, SynthesisError, TruthTable};
use crate::{export, import};
use location::{Camera, Position, Size};

new_key_type! {
    pub struct ElementKey;
    pub struct ConnectionKey;
}

pub type ElementMap = SlotMap<ElementKey, Element>;
pub type ConnectionMap = SlotMap<ConnectionKey, Connection>;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ElementKind {
    And,
    Or,
    Not,
    Nand,
    Nor,
    Xor,
    Input,
    Output,
    Clock,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Element {
    pub kind: ElementKind,
    pub output: bool,
    pub inputs: Vec<bool>,
    pub position: Position,
    pub size: Size,
    pub label: String,
    pub color: Option<String>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Connection {
    pub source: ElementKey,
    pub source_pin: usize,
    pub target: ElementKey,
    pub target_pin: usize,
    pub state: bool,
    pub style: Option<String>,
    pub color: Option<String>,
}

/// Elements and the wires between them, stored flat and addressed by key.
///
/// Every connection targets a distinct `(element, pin)` pair whose pin exists on that element. Editing through the
/// methods here keeps that true; stale state (outputs that do not match inputs yet) is fixed by [`logic::update`].
#[derive(Clone, Default, Debug)]
pub struct Circuit {
    pub(crate) elements: ElementMap,
    pub(crate) connections: ConnectionMap,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("element {0:?} does not exist")]
    NoSuchElement(ElementKey),
    #[error("connection {0:?} does not exist")]
    NoSuchConnection(ConnectionKey),
    #[error("input pin {pin} is out of range: element has {num_inputs} inputs")]
    InputPinOutOfRange { pin: usize, num_inputs: usize },
    #[error("output pin {0} is out of range: elements have a single output")]
    OutputPinOutOfRange(usize),
    #[error("{0} elements have a fixed number of inputs")]
    FixedInputCount(ElementKind),
    #[error("cannot give a gate {requested} inputs: must be between {min} and {max}")]
    InputCountOutOfRange { requested: usize, min: usize, max: usize },
    #[error("{0} elements cannot be set directly, only INPUT elements can")]
    NotAnInput(ElementKind),
}

impl ElementKind {
    pub const ALL: [ElementKind; 9] = [ElementKind::And, ElementKind::Or, ElementKind::Not, ElementKind::Nand, ElementKind::Nor, ElementKind::Xor, ElementKind::Input, ElementKind::Output, ElementKind::Clock];

    pub fn name(self) -> &'static str {
        match self {
            ElementKind::And => "AND",
            ElementKind::Or => "OR",
            ElementKind::Not => "NOT",
            ElementKind::Nand => "NAND",
            ElementKind::Nor => "NOR",
            ElementKind::Xor => "XOR",
            ElementKind::Input => "INPUT",
            ElementKind::Output => "OUTPUT",
            ElementKind::Clock => "CLOCK",
        }
    }

    pub fn from_name(name: &str) -> Option<ElementKind> {
        ElementKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn default_num_inputs(self) -> usize {
        match self {
            ElementKind::And | ElementKind::Or | ElementKind::Nand | ElementKind::Nor | ElementKind::Xor => 2,
            ElementKind::Not | ElementKind::Output => 1,
            ElementKind::Input | ElementKind::Clock => 0,
        }
    }

    pub fn has_variable_inputs(self) -> bool {
        matches!(self, ElementKind::And | ElementKind::Or | ElementKind::Nand | ElementKind::Nor | ElementKind::Xor)
    }

    /// Sources and clocks are toggled from outside; propagation never writes their output.
    pub fn is_driven_externally(self) -> bool {
        matches!(self, ElementKind::Input | ElementKind::Clock)
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Element {
    pub fn new(kind: ElementKind, position: Position) -> Self {
        Self::with_inputs(kind, kind.default_num_inputs(), position)
    }

    // default value for the output is whatever value results from having all false inputs
    pub fn with_inputs(kind: ElementKind, num_inputs: usize, position: Position) -> Self {
        let inputs = vec![false; num_inputs];
        let output = logic::compute(kind, &inputs, false);
        let size = if kind.has_variable_inputs() || kind == ElementKind::Not { Size::for_inputs(num_inputs) } else { Size::PIN };
        Self { kind, output, inputs, position, size, label: String::new(), color: None }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self { label: label.into(), ..self }
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }
}

impl Connection {
    pub fn new(source: ElementKey, target: ElementKey, target_pin: usize) -> Self {
        Self { source, source_pin: 0, target, target_pin, state: false, style: None, color: None }
    }
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementKey, &Element)> {
        self.elements.iter()
    }
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionKey, &Connection)> {
        self.connections.iter()
    }

    pub fn element(&self, key: ElementKey) -> Option<&Element> {
        self.elements.get(key)
    }
    pub fn connection(&self, key: ConnectionKey) -> Option<&Connection> {
        self.connections.get(key)
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }
    pub fn num_connections(&self) -> usize {
        self.connections.len()
    }

    /// The connection feeding `pin` of `target`, if there is one.
    pub fn connection_to(&self, target: ElementKey, pin: usize) -> Option<ConnectionKey> {
        self.connections.iter().find(|(_, connection)| connection.target == target && connection.target_pin == pin).map(|(key, _)| key)
    }

    pub fn connections_from(&self, source: ElementKey) -> impl Iterator<Item = ConnectionKey> + '_ {
        self.connections.iter().filter(move |(_, connection)| connection.source == source).map(|(key, _)| key)
    }

    pub fn elements_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = ElementKey> + '_ {
        self.elements.iter().filter(move |(_, element)| element.kind == kind).map(|(key, _)| key)
    }

    pub fn find_by_label(&self, label: &str) -> Option<ElementKey> {
        self.elements.iter().find(|(_, element)| element.label == label).map(|(key, _)| key)
    }

    pub fn add_element(&mut self, kind: ElementKind, position: Position) -> ElementKey {
        self.insert_element(Element::new(kind, position))
    }

    pub fn add_element_with_inputs(&mut self, kind: ElementKind, num_inputs: usize, position: Position) -> ElementKey {
        self.insert_element(Element::with_inputs(kind, num_inputs, position))
    }

    pub fn insert_element(&mut self, element: Element) -> ElementKey {
        let key = self.elements.insert(element);
        debug!(?key, kind = %self.elements[key].kind, "added element");
        key
    }

    pub fn connect(&mut self, source: ElementKey, target: ElementKey, target_pin: usize) -> Result<ConnectionKey, EditError> {
        self.insert_connection(Connection::new(source, target, target_pin))
    }

    /// Adds a connection, replacing whatever was already feeding its target pin.
    pub fn insert_connection(&mut self, connection: Connection) -> Result<ConnectionKey, EditError> {
        if !self.elements.contains_key(connection.source) {
            return Err(EditError::NoSuchElement(connection.source));
        }
        if connection.source_pin != 0 {
            return Err(EditError::OutputPinOutOfRange(connection.source_pin));
        }
        let target = self.elements.get(connection.target).ok_or(EditError::NoSuchElement(connection.target))?;
        if connection.target_pin >= target.num_inputs() {
            return Err(EditError::InputPinOutOfRange { pin: connection.target_pin, num_inputs: target.num_inputs() });
        }

        if let Some(old) = self.connection_to(connection.target, connection.target_pin) {
            debug!(?old, "replacing connection on occupied pin");
            self.connections.remove(old);
        }

        let key = self.connections.insert(connection);
        debug!(?key, "added connection");
        Ok(key)
    }

    pub fn disconnect(&mut self, key: ConnectionKey) -> Option<Connection> {
        let removed = self.connections.remove(key);
        if removed.is_some() {
            debug!(?key, "removed connection");
        }
        removed
    }

    /// Removes an element together with every connection attached to it.
    pub fn remove_element(&mut self, key: ElementKey) -> Option<Element> {
        let element = self.elements.remove(key)?;
        let before = self.connections.len();
        self.connections.retain(|_, connection| connection.source != key && connection.target != key);
        debug!(?key, removed_connections = before - self.connections.len(), "removed element");
        Some(element)
    }

    pub fn set_num_inputs(&mut self, key: ElementKey, num_inputs: usize, config: &Config) -> Result<(), EditError> {
        let element = self.elements.get_mut(key).ok_or(EditError::NoSuchElement(key))?;
        if !element.kind.has_variable_inputs() {
            return Err(EditError::FixedInputCount(element.kind));
        }
        if num_inputs < config.min_gate_inputs || num_inputs > config.max_gate_inputs {
            return Err(EditError::InputCountOutOfRange { requested: num_inputs, min: config.min_gate_inputs, max: config.max_gate_inputs });
        }

        element.inputs.resize(num_inputs, false);
        element.size = Size::for_inputs(num_inputs);
        self.connections.retain(|_, connection| connection.target != key || connection.target_pin < num_inputs);
        debug!(?key, num_inputs, "changed number of inputs");
        Ok(())
    }

    pub fn set_input(&mut self, key: ElementKey, value: bool) -> Result<(), EditError> {
        let element = self.elements.get_mut(key).ok_or(EditError::NoSuchElement(key))?;
        if element.kind != ElementKind::Input {
            return Err(EditError::NotAnInput(element.kind));
        }
        element.output = value;
        Ok(())
    }

    pub fn toggle_input(&mut self, key: ElementKey) -> Result<bool, EditError> {
        let current = self.elements.get(key).ok_or(EditError::NoSuchElement(key))?.output;
        self.set_input(key, !current)?;
        Ok(!current)
    }

    /// Flips every clock; returns how many there were.
    pub fn tick_clocks(&mut self) -> usize {
        let mut ticked = 0;
        for (_, element) in self.elements.iter_mut().filter(|(_, element)| element.kind == ElementKind::Clock) {
            element.output = !element.output;
            ticked += 1;
        }
        ticked
    }

    /// Moves every element and connection of `other` into this circuit under fresh keys.
    ///
    /// Returns the mapping from keys in `other` to keys in `self`. Connections of `other` that reference elements
    /// missing from `other` are dropped.
    pub fn merge(&mut self, other: Circuit) -> HashMap<ElementKey, ElementKey> {
        let mapping: HashMap<_, _> = other.elements.into_iter().map(|(old, element)| (old, self.elements.insert(element))).collect();

        for (_, connection) in other.connections {
            if let (Some(&source), Some(&target)) = (mapping.get(&connection.source), mapping.get(&connection.target)) {
                self.connections.insert(Connection { source, target, ..connection });
            }
        }

        debug!(elements = mapping.len(), "merged circuit");
        mapping
    }
}

/// An editing session over one circuit. Every edit leaves the circuit stabilized.
pub struct Simulation {
    pub circuit: Circuit,
    pub camera: Camera,
    pub config: Config,
    pub version: String,
}

impl Simulation {
    pub fn new(config: Config) -> Self {
        Self { circuit: Circuit::new(), camera: Camera::default(), config, version: import::CURRENT_VERSION.to_string() }
    }

    pub fn from_document(document: import::Document, config: Config) -> Self {
        let mut simulation = Self { circuit: document.circuit, camera: document.camera, config, version: document.version };
        simulation.stabilize();
        simulation
    }

    pub fn stabilize(&mut self) -> logic::Settle {
        logic::update(&mut self.circuit, self.config.max_propagation_rounds)
    }

    pub fn add_element(&mut self, kind: ElementKind, position: Position) -> ElementKey {
        let key = self.circuit.add_element(kind, position);
        self.stabilize();
        key
    }

    pub fn connect(&mut self, source: ElementKey, target: ElementKey, target_pin: usize) -> Result<ConnectionKey, EditError> {
        let key = self.circuit.connect(source, target, target_pin)?;
        self.stabilize();
        Ok(key)
    }

    pub fn disconnect(&mut self, key: ConnectionKey) -> Result<Connection, EditError> {
        let connection = self.circuit.disconnect(key).ok_or(EditError::NoSuchConnection(key))?;
        self.stabilize();
        Ok(connection)
    }

    pub fn remove_element(&mut self, key: ElementKey) -> Result<Element, EditError> {
        let element = self.circuit.remove_element(key).ok_or(EditError::NoSuchElement(key))?;
        self.stabilize();
        Ok(element)
    }

    pub fn set_num_inputs(&mut self, key: ElementKey, num_inputs: usize) -> Result<(), EditError> {
        self.circuit.set_num_inputs(key, num_inputs, &self.config)?;
        self.stabilize();
        Ok(())
    }

    pub fn set_input(&mut self, key: ElementKey, value: bool) -> Result<(), EditError> {
        self.circuit.set_input(key, value)?;
        self.stabilize();
        Ok(())
    }

    pub fn toggle_input(&mut self, key: ElementKey) -> Result<bool, EditError> {
        let value = self.circuit.toggle_input(key)?;
        self.stabilize();
        Ok(value)
    }

    pub fn tick_clocks(&mut self) -> logic::Settle {
        self.circuit.tick_clocks();
        self.stabilize()
    }

    /// Minimizes `table`, builds the resulting sum of products at `origin` and merges it into the circuit.
    pub fn place_truth_table(&mut self, table: &TruthTable, origin: Position) -> Result<PlacedFragment, SynthesisError> {
        let terms = synthesis::minimize(table.num_vars(), &table.minterms())?;
        let fragment: Fragment = synthesis::synthesize(table.num_vars(), &terms, origin, &self.config)?;
        let placed = fragment.merge_into(&mut self.circuit);
        self.stabilize();
        Ok(placed)
    }

    /// Replaces the circuit with the one in `text`. On failure nothing changes.
    pub fn load(&mut self, text: &str) -> Result<(), import::ImportError> {
        let document = import::parse_with(text, &self.config)?;
        self.circuit = document.circuit;
        self.camera = document.camera;
        self.version = document.version;
        self.stabilize();
        Ok(())
    }

    pub fn save(&self) -> String {
        export::export(&self.version, &self.circuit, &self.camera)
    }
}
