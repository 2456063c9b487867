use std::collections::HashMap;

use json::JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::simulation::location::{Camera, Position, Size};
use crate::simulation::{Circuit, Connection, Element, ElementKey, ElementKind};

pub const CURRENT_VERSION: &str = "1.0";

#[derive(Debug)]
pub struct Document {
    pub version: String,
    pub circuit: Circuit,
    pub camera: Camera,
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("could not read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("document is not valid json: {0}")]
    Json(#[from] json::Error),
    #[error("{0}")]
    Malformed(String),
    #[error("node {index}: {message}")]
    Node { index: usize, message: String },
    #[error("wire {index}: {message}")]
    Wire { index: usize, message: String },
    #[error("node id {0:?} is used more than once")]
    DuplicateNode(String),
}

pub fn import(filename: &str, config: &Config) -> Result<Document, ImportError> {
    let project = std::fs::read_to_string(filename)?;
    parse_with(&project, config)
}

pub fn parse(project: &str) -> Result<Document, ImportError> {
    parse_with(project, &Config::DEFAULT)
}

/// Reads a document, holding variable-input gates to the input count range of `config`.
pub fn parse_with(project: &str, config: &Config) -> Result<Document, ImportError> {
    let JsonValue::Object(mut project) = json::parse(project)? else {
        return Err(ImportError::Malformed("toplevel json must be object".to_string()));
    };

    let (Some(nodes), Some(wires)) = (project.remove("nodes"), project.remove("wires")) else {
        return Err(ImportError::Malformed("toplevel object must contain keys \"nodes\" and \"wires\"".to_string()));
    };
    let JsonValue::Array(nodes) = nodes else { return Err(ImportError::Malformed("nodes must be array".to_string())) };
    let JsonValue::Array(wires) = wires else { return Err(ImportError::Malformed("wires must be array".to_string())) };

    let version = match project.remove("version") {
        None | Some(JsonValue::Null) => CURRENT_VERSION.to_string(),
        Some(version) => version.as_str().map(str::to_owned).ok_or_else(|| ImportError::Malformed("version must be string".to_string()))?,
    };
    let camera = match project.remove("camera") {
        None | Some(JsonValue::Null) => Camera::default(),
        Some(camera) => parse_camera(camera).map_err(ImportError::Malformed)?,
    };

    let mut circuit = Circuit::new();
    let mut node_mapping = HashMap::new();
    for (index, node) in nodes.into_iter().enumerate() {
        let (id, element) = parse_node(node, config).map_err(|message| ImportError::Node { index, message })?;
        if node_mapping.contains_key(&id) {
            return Err(ImportError::DuplicateNode(id));
        }
        node_mapping.insert(id, circuit.insert_element(element));
    }

    for (index, wire) in wires.into_iter().enumerate() {
        let wire = parse_wire(wire).map_err(|message| ImportError::Wire { index, message })?;
        if let Err(reason) = add_wire(&mut circuit, &node_mapping, &wire) {
            warn!(index, id = wire.id.as_deref().unwrap_or(""), reason, "skipping wire");
        }
    }

    debug!(version = %version, elements = circuit.num_elements(), connections = circuit.num_connections(), "imported document");
    Ok(Document { version, circuit, camera })
}

struct Wire {
    id: Option<String>,
    from: String,
    from_index: usize,
    to: String,
    to_index: usize,
    state: bool,
    style: Option<String>,
    color: Option<String>,
}

fn add_wire(circuit: &mut Circuit, node_mapping: &HashMap<String, ElementKey>, wire: &Wire) -> Result<(), &'static str> {
    let source = *node_mapping.get(&wire.from).ok_or("source node does not exist")?;
    let target = *node_mapping.get(&wire.to).ok_or("target node does not exist")?;
    if circuit.connection_to(target, wire.to_index).is_some() {
        return Err("target pin already has a wire");
    }

    let connection = Connection { source, source_pin: wire.from_index, target, target_pin: wire.to_index, state: wire.state, style: wire.style.clone(), color: wire.color.clone() };
    circuit.insert_connection(connection).map(|_| ()).map_err(|_| "pin out of range")
}

fn parse_node(node: JsonValue, config: &Config) -> Result<(String, Element), String> {
    let JsonValue::Object(mut node) = node else { return Err("node must be object".to_string()) };

    let id = parse_id(node.remove("id").ok_or("node must have field 'id'")?).ok_or("node id must be string or number")?;
    let kind_name = node.remove("type").ok_or("node must have field 'type'")?;
    let kind_name = kind_name.as_str().ok_or("node type must be string")?;
    let kind = ElementKind::from_name(kind_name).ok_or_else(|| format!("invalid node type {}", kind_name))?;

    let mut element = Element::new(kind, Position::default());
    element.position.x = optional_f32(&mut node, "x")?.unwrap_or(0.0);
    element.position.y = optional_f32(&mut node, "y")?.unwrap_or(0.0);
    element.size = Size { width: optional_f32(&mut node, "width")?.unwrap_or(element.size.width), height: optional_f32(&mut node, "height")?.unwrap_or(element.size.height) };
    element.label = optional_string(&mut node, "label")?.unwrap_or_default();
    element.color = optional_string(&mut node, "color")?;

    if let Some(output) = optional_bool(&mut node, "state")? {
        element.output = output;
    }
    match node.remove("inputs") {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::Array(inputs)) => {
            let inputs = inputs.iter().map(JsonValue::as_bool).collect::<Option<Vec<_>>>().ok_or("node inputs must be booleans")?;
            if !kind.has_variable_inputs() && inputs.len() != kind.default_num_inputs() {
                return Err(format!("{} node must have {} inputs, not {}", kind, kind.default_num_inputs(), inputs.len()));
            }
            if kind.has_variable_inputs() && !(config.min_gate_inputs..=config.max_gate_inputs).contains(&inputs.len()) {
                return Err(format!("{} node must have between {} and {} inputs, not {}", kind, config.min_gate_inputs, config.max_gate_inputs, inputs.len()));
            }
            element.inputs = inputs;
        }
        Some(_) => return Err("node inputs must be array".to_string()),
    }

    Ok((id, element))
}

fn parse_wire(wire: JsonValue) -> Result<Wire, String> {
    let JsonValue::Object(mut wire) = wire else { return Err("wire must be object".to_string()) };

    let id = match wire.remove("id") {
        None | Some(JsonValue::Null) => None,
        Some(id) => Some(parse_id(id).ok_or("wire id must be string or number")?),
    };
    let from = parse_id(wire.remove("fromNode").ok_or("wire must have field 'fromNode'")?).ok_or("wire fromNode must be string or number")?;
    let to = parse_id(wire.remove("toNode").ok_or("wire must have field 'toNode'")?).ok_or("wire toNode must be string or number")?;
    let from_index = optional_usize(&mut wire, "fromIndex")?.unwrap_or(0);
    let to_index = optional_usize(&mut wire, "toIndex")?.ok_or("wire must have field 'toIndex'")?;
    let state = optional_bool(&mut wire, "state")?.unwrap_or(false);
    let style = optional_string(&mut wire, "style")?;
    let color = optional_string(&mut wire, "color")?;

    Ok(Wire { id, from, from_index, to, to_index, state, style, color })
}

fn parse_camera(camera: JsonValue) -> Result<Camera, String> {
    let JsonValue::Object(mut camera) = camera else { return Err("camera must be object".to_string()) };
    let default = Camera::default();
    Ok(Camera {
        x: optional_f32(&mut camera, "x")?.unwrap_or(default.x),
        y: optional_f32(&mut camera, "y")?.unwrap_or(default.y),
        zoom: optional_f32(&mut camera, "zoom")?.unwrap_or(default.zoom),
    })
}

fn parse_id(id: JsonValue) -> Option<String> {
    id.as_str().map(str::to_owned).or_else(|| id.as_usize().map(|id| id.to_string()))
}

fn optional<T>(object: &mut json::object::Object, field: &str, convert: impl FnOnce(&JsonValue) -> Option<T>, expected: &str) -> Result<Option<T>, String> {
    match object.remove(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => convert(&value).map(Some).ok_or_else(|| format!("field '{}' must be {}", field, expected)),
    }
}
fn optional_f32(object: &mut json::object::Object, field: &str) -> Result<Option<f32>, String> {
    optional(object, field, JsonValue::as_f32, "number")
}
fn optional_usize(object: &mut json::object::Object, field: &str) -> Result<Option<usize>, String> {
    optional(object, field, JsonValue::as_usize, "non-negative integer")
}
fn optional_bool(object: &mut json::object::Object, field: &str) -> Result<Option<bool>, String> {
    optional(object, field, JsonValue::as_bool, "boolean")
}
fn optional_string(object: &mut json::object::Object, field: &str) -> Result<Option<String>, String> {
    optional(object, field, |value| value.as_str().map(str::to_owned), "string")
}
