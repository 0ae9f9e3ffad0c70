use super::{color_for_type, OntologyGraph, OntologyLink, OntologyNode, DEFAULT_NODE_SIZE, LINK_COLOR};
use crate::error::OntologyError;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub const SKYPAD_NAMESPACE: &str = "http://skypad.ai/ontology#";

pub fn parse_graph(raw: &str) -> Result<OntologyGraph, OntologyError> {
    let document: Value = serde_json::from_str(raw)?;
    graph_from_document(&document)
}

/// Builds the node/edge view of a JSON-LD document: named individuals become
/// nodes, skypad-namespaced properties pointing at other nodes become links.
pub fn graph_from_document(document: &Value) -> Result<OntologyGraph, OntologyError> {
    let items = match document {
        Value::Array(items) => items,
        Value::Object(object) => match object.get("@graph") {
            Some(Value::Array(items)) => items,
            _ => return Err(OntologyError::Shape),
        },
        _ => return Err(OntologyError::Shape),
    };

    let mut graph = OntologyGraph::default();
    let mut known = HashSet::new();

    for item in items.iter().filter_map(Value::as_object) {
        let Some(id) = entity_id(item) else {
            continue;
        };
        if !id.contains('#') || id.ends_with("ontology") {
            continue;
        }

        let node_type = node_type(item);
        if node_type == "Class" || node_type == "ObjectProperty" {
            continue;
        }

        let name = id.split('#').nth(1).unwrap_or_default().to_string();
        graph.nodes.push(OntologyNode {
            id: id.to_string(),
            name,
            color: color_for_type(&node_type),
            node_type,
            size: DEFAULT_NODE_SIZE,
            focused: false,
        });
        known.insert(id.to_string());
    }

    for item in items.iter().filter_map(Value::as_object) {
        let Some(source) = entity_id(item).filter(|id| known.contains(*id)) else {
            continue;
        };

        for (key, value) in item {
            let Some(relationship) = key.strip_prefix(SKYPAD_NAMESPACE) else {
                continue;
            };
            for target in values(value).filter_map(|value| value.get("@id")).filter_map(Value::as_str) {
                if known.contains(target) {
                    graph.links.push(OntologyLink {
                        source: source.to_string(),
                        target: target.to_string(),
                        relationship: relationship.to_string(),
                        color: LINK_COLOR,
                    });
                }
            }
        }
    }

    Ok(graph)
}

fn entity_id(item: &Map<String, Value>) -> Option<&str> {
    item.get("@id").and_then(Value::as_str)
}

fn node_type(item: &Map<String, Value>) -> String {
    let first = match item.get("@type") {
        Some(Value::String(kind)) => Some(kind.as_str()),
        Some(Value::Array(kinds)) => kinds.first().and_then(Value::as_str),
        _ => None,
    };
    let Some(first) = first else {
        return "Unknown".to_string();
    };

    let local = match first.split('#').nth(1) {
        Some(local) if !local.is_empty() => local,
        _ => first.rsplit('/').next().unwrap_or_default(),
    };
    if local.is_empty() {
        "Unknown".to_string()
    } else {
        local.to_string()
    }
}

fn values(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(items) => Box::new(items.iter()),
        other => Box::new(std::iter::once(other)),
    }
}
