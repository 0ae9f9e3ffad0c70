use egui::Color32;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use std::collections::HashMap;

pub mod focus;
pub mod geometry;
pub mod jsonld;
pub mod layout;

pub const DEFAULT_NODE_SIZE: f32 = 5.0;
pub const FOCUSED_NODE_SIZE: f32 = 8.0;
pub const LINK_COLOR: Color32 = Color32::from_rgb(0x9C, 0xA3, 0xAF);

#[derive(Debug, Clone, PartialEq)]
pub struct OntologyNode {
    pub id: String,
    pub name: String,
    pub node_type: String,
    pub color: Color32,
    pub size: f32,
    pub focused: bool,
}

impl OntologyNode {
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.size = if focused {
            FOCUSED_NODE_SIZE
        } else {
            DEFAULT_NODE_SIZE
        };
    }

    /// Whether any of `entities` names this node by name, id or type.
    pub fn matches(&self, entities: &[String]) -> bool {
        entities
            .iter()
            .any(|entity| *entity == self.name || *entity == self.id || *entity == self.node_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OntologyLink {
    pub source: String,
    pub target: String,
    pub relationship: String,
    pub color: Color32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OntologyGraph {
    pub nodes: Vec<OntologyNode>,
    pub links: Vec<OntologyLink>,
}

impl OntologyGraph {
    /// Marks exactly the nodes named by `entities` (by name, id or type) as focused.
    pub fn apply_focus(&mut self, entities: &[String]) {
        for node in &mut self.nodes {
            let focused = node.matches(entities);
            node.set_focused(focused);
        }
    }

    /// Directed graph in node order. Links whose ends are unknown or identical
    /// are dropped.
    pub fn to_stable_graph(&self) -> StableGraph<OntologyNode, OntologyLink> {
        let mut graph = StableGraph::with_capacity(self.nodes.len(), self.links.len());
        let indices: HashMap<&str, NodeIndex> = self
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), graph.add_node(node.clone())))
            .collect();

        for link in &self.links {
            let (Some(&source), Some(&target)) = (
                indices.get(link.source.as_str()),
                indices.get(link.target.as_str()),
            ) else {
                continue;
            };
            if source != target {
                graph.add_edge(source, target, link.clone());
            }
        }
        graph
    }

    /// Flips one node's focus, returning the new state.
    pub fn toggle_focus(&mut self, index: usize) -> Option<bool> {
        let node = self.nodes.get_mut(index)?;
        let focused = !node.focused;
        node.set_focused(focused);
        Some(focused)
    }
}

pub fn color_for_type(node_type: &str) -> Color32 {
    match node_type {
        "Project" => Color32::from_rgb(0x3B, 0x82, 0xF6),
        "Designer" => Color32::from_rgb(0x10, 0xB9, 0x81),
        "FurnitureItem" => Color32::from_rgb(0xF5, 0x9E, 0x0B),
        "Client" => Color32::from_rgb(0xEF, 0x44, 0x44),
        "PurchasingAgent" => Color32::from_rgb(0x8B, 0x5C, 0xF6),
        "TeamMember" => Color32::from_rgb(0x6B, 0x72, 0x80),
        "ImageAsset" => Color32::from_rgb(0xF9, 0x73, 0x16),
        "RoomType" => Color32::from_rgb(0x06, 0xB6, 0xD4),
        "DesignStyle" => Color32::from_rgb(0xEC, 0x48, 0x99),
        "ProjectSiteNature" => Color32::from_rgb(0x84, 0xCC, 0x16),
        "FunctionalUseClass" => Color32::from_rgb(0x64, 0x74, 0x8B),
        "BiddingDocument" => Color32::from_rgb(0x14, 0xB8, 0xA6),
        "Deal" => Color32::from_rgb(0xF4, 0x72, 0xB6),
        "DesignDocument" => Color32::from_rgb(0xA8, 0x55, 0xF7),
        "AIModule" => Color32::from_rgb(0x22, 0xD3, 0xEE),
        "REAgent" => Color32::from_rgb(0xFB, 0x71, 0x85),
        _ => LINK_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        color_for_type, OntologyGraph, OntologyLink, OntologyNode, DEFAULT_NODE_SIZE, FOCUSED_NODE_SIZE,
        LINK_COLOR,
    };

    fn node(id: &str, name: &str, node_type: &str) -> OntologyNode {
        OntologyNode {
            id: id.to_string(),
            name: name.to_string(),
            node_type: node_type.to_string(),
            color: color_for_type(node_type),
            size: DEFAULT_NODE_SIZE,
            focused: false,
        }
    }

    fn link(source: &str, target: &str, relationship: &str) -> OntologyLink {
        OntologyLink {
            source: source.to_string(),
            target: target.to_string(),
            relationship: relationship.to_string(),
            color: LINK_COLOR,
        }
    }

    fn focused_names(graph: &OntologyGraph) -> Vec<&str> {
        graph
            .nodes
            .iter()
            .filter(|node| node.focused)
            .map(|node| node.name.as_str())
            .collect()
    }

    #[test]
    fn apply_focus_matches_name_id_or_type() {
        let mut graph = OntologyGraph {
            nodes: vec![
                node("http://skypad.ai/ontology#HotelAurora", "HotelAurora", "Project"),
                node("http://skypad.ai/ontology#JaneDoe", "JaneDoe", "Designer"),
                node("http://skypad.ai/ontology#Lounge", "Lounge", "RoomType"),
            ],
            links: Vec::new(),
        };

        graph.apply_focus(&[
            "Project".to_string(),
            "http://skypad.ai/ontology#JaneDoe".to_string(),
        ]);
        assert_eq!(focused_names(&graph), vec!["HotelAurora", "JaneDoe"]);
        assert_eq!(graph.nodes[0].size, FOCUSED_NODE_SIZE);
        assert_eq!(graph.nodes[2].size, DEFAULT_NODE_SIZE);

        graph.apply_focus(&[]);
        assert!(focused_names(&graph).is_empty());
    }

    #[test]
    fn toggle_focus_flips_state() {
        let mut graph = OntologyGraph {
            nodes: vec![node("x#A", "A", "Deal")],
            links: Vec::new(),
        };
        assert_eq!(graph.toggle_focus(0), Some(true));
        assert_eq!(graph.toggle_focus(0), Some(false));
        assert_eq!(graph.toggle_focus(3), None);
    }

    #[test]
    fn stable_graph_keeps_nodes_in_order_and_drops_dangling_links() {
        let graph = OntologyGraph {
            nodes: vec![node("x#A", "A", "Project"), node("x#B", "B", "Designer")],
            links: vec![
                link("x#A", "x#B", "designedBy"),
                link("x#A", "x#Z", "hasClient"),
                link("x#B", "x#B", "selfRef"),
            ],
        };

        let stable = graph.to_stable_graph();
        let names: Vec<&str> = stable
            .node_indices()
            .map(|index| stable[index].name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(stable.edge_count(), 1);

        let edge = stable.edge_indices().next().expect("one edge");
        let (source, target) = stable.edge_endpoints(edge).expect("endpoints");
        assert_eq!((stable[source].name.as_str(), stable[target].name.as_str()), ("A", "B"));
        assert_eq!(stable[edge].relationship, "designedBy");
    }

    #[test]
    fn unknown_types_use_default_color() {
        assert_eq!(color_for_type("Spaceship"), LINK_COLOR);
        assert_ne!(color_for_type("Project"), LINK_COLOR);
    }
}
