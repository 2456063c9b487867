use std::collections::HashMap;

use json::JsonValue;

use crate::simulation::location::Camera;
use crate::simulation::Circuit;

/// Serializes a circuit in the format [`crate::import::parse`] reads. Ids are renumbered `n0`, `n1`, ... and
/// `w0`, `w1`, ... in arena order; wires with a missing endpoint are left out.
pub fn export(version: &str, circuit: &Circuit, camera: &Camera) -> String {
    to_json(version, circuit, camera).pretty(2)
}

pub fn to_json(version: &str, circuit: &Circuit, camera: &Camera) -> JsonValue {
    let ids: HashMap<_, _> = circuit.elements().enumerate().map(|(index, (key, _))| (key, format!("n{}", index))).collect();

    let nodes: Vec<JsonValue> = circuit
        .elements()
        .map(|(key, element)| {
            let mut node = JsonValue::new_object();
            node["id"] = ids[&key].clone().into();
            node["type"] = element.kind.name().into();
            node["x"] = element.position.x.into();
            node["y"] = element.position.y.into();
            node["state"] = element.output.into();
            node["inputs"] = element.inputs.clone().into();
            node["width"] = element.size.width.into();
            node["height"] = element.size.height.into();
            node["label"] = element.label.clone().into();
            if let Some(color) = &element.color {
                node["color"] = color.clone().into();
            }
            node
        })
        .collect();

    let wires: Vec<JsonValue> = circuit
        .connections()
        .filter_map(|(_, connection)| Some((ids.get(&connection.source)?, ids.get(&connection.target)?, connection)))
        .enumerate()
        .map(|(index, (from, to, connection))| {
            let mut wire = JsonValue::new_object();
            wire["id"] = format!("w{}", index).into();
            wire["fromNode"] = from.clone().into();
            wire["fromIndex"] = connection.source_pin.into();
            wire["toNode"] = to.clone().into();
            wire["toIndex"] = connection.target_pin.into();
            wire["state"] = connection.state.into();
            if let Some(style) = &connection.style {
                wire["style"] = style.clone().into();
            }
            if let Some(color) = &connection.color {
                wire["color"] = color.clone().into();
            }
            wire
        })
        .collect();

    let mut camera_json = JsonValue::new_object();
    camera_json["x"] = camera.x.into();
    camera_json["y"] = camera.y.into();
    camera_json["zoom"] = camera.zoom.into();

    let mut document = JsonValue::new_object();
    document["version"] = version.into();
    document["nodes"] = JsonValue::Array(nodes);
    document["wires"] = JsonValue::Array(wires);
    document["camera"] = camera_json;
    document
}
