use crate::ontology::geometry::{
    arrow_head, distance_to_segment, font_size, is_finite, label_anchor, node_box, rect_boundary_point,
};
use crate::ontology::layout::{spiral_position, ForceLayout, ForceState};
use crate::ontology::{color_for_type, OntologyGraph, OntologyLink, OntologyNode};
use crate::theme::Theme;
use egui::epaint::{RectShape, TextShape};
use egui::{Color32, CornerRadius, FontId, Frame, Pos2, Rect, RichText, Sense, Shape, Stroke, StrokeKind, Vec2};
use egui_graphs::{
    DisplayEdge, DisplayNode, DrawContext, EdgeProps, Graph, GraphView, Node, NodeProps, SettingsInteraction,
    SettingsNavigation,
};
use petgraph::graph::DefaultIx;
use petgraph::Directed;

const LEGEND: &[(&str, &str)] = &[
    ("Projects", "Project"),
    ("Designers", "Designer"),
    ("Furniture", "FurnitureItem"),
    ("Clients", "Client"),
];
const FOCUS_FILL: Color32 = Color32::from_rgb(0xFF, 0x6B, 0x6B);
const FOCUS_STROKE: Color32 = Color32::from_rgb(0xFB, 0x49, 0x49);
const NODE_OUTLINE: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 51);
const LINK_LABEL_SIZE: f32 = 8.0;
const LINK_LABEL_COLOR: Color32 = Color32::from_rgb(0x33, 0x33, 0x33);
const LINK_HIT_WIDTH: f32 = 4.0;
const FOCUS_REHEAT: f32 = 0.3;

type OntologyCanvas = Graph<OntologyNode, OntologyLink, Directed, DefaultIx, NodeShape, EdgeShape>;
type OntologyGraphNode = Node<OntologyNode, OntologyLink, Directed, DefaultIx, NodeShape>;

/// Rounded label box for one ontology entity.
#[derive(Debug, Clone)]
pub struct NodeShape {
    location: Pos2,
    label: String,
    fill: Color32,
    focused: bool,
    hovered: bool,
    /// Box size in canvas units, re-measured on every draw.
    size: Vec2,
}

impl From<NodeProps<OntologyNode>> for NodeShape {
    fn from(props: NodeProps<OntologyNode>) -> Self {
        let mut shape = Self {
            location: props.location(),
            label: String::new(),
            fill: Color32::GRAY,
            focused: false,
            hovered: false,
            size: Vec2::ZERO,
        };
        shape.update(&props);
        shape.size = node_box(estimated_text_width(&shape.label, shape.focused), shape.focused);
        shape
    }
}

impl DisplayNode<OntologyNode, OntologyLink, Directed, DefaultIx> for NodeShape {
    fn is_inside(&self, pos: Pos2) -> bool {
        Rect::from_center_size(self.location, self.size).contains(pos)
    }

    fn closest_boundary_point(&self, dir: Vec2) -> Pos2 {
        rect_boundary_point(self.location, self.size, dir)
    }

    fn shapes(&mut self, ctx: &DrawContext) -> Vec<Shape> {
        let zoom = ctx.meta.canvas_to_screen_size(1.0);
        let font = FontId::proportional(font_size(self.focused) * zoom);
        let galley = ctx
            .ctx
            .fonts_mut(|fonts| fonts.layout_no_wrap(self.label.clone(), font, Color32::WHITE));
        if zoom > 0.0 {
            self.size = node_box(galley.size().x / zoom, self.focused);
        }

        let rect = Rect::from_center_size(ctx.meta.canvas_to_screen_pos(self.location), self.size * zoom);
        let (fill, stroke) = if self.focused {
            (FOCUS_FILL, Stroke::new(1.5, FOCUS_STROKE))
        } else if self.hovered {
            (self.fill, Stroke::new(2.0, Color32::WHITE))
        } else {
            (self.fill, Stroke::new(1.5, NODE_OUTLINE))
        };

        let text_pos = rect.center() - galley.size() / 2.0;
        vec![
            RectShape::new(rect, CornerRadius::same(5), fill, stroke, StrokeKind::Middle).into(),
            TextShape::new(text_pos, galley, Color32::WHITE).into(),
        ]
    }

    fn update(&mut self, state: &NodeProps<OntologyNode>) {
        self.location = state.location();
        self.hovered = state.hovered;
        self.label = state.payload.name.clone();
        self.fill = state.payload.color;
        self.focused = state.payload.focused;
    }
}

/// Straight arrow from border to border with the relationship on a plate.
#[derive(Debug, Clone)]
pub struct EdgeShape {
    label: String,
    color: Color32,
}

impl From<EdgeProps<OntologyLink>> for EdgeShape {
    fn from(props: EdgeProps<OntologyLink>) -> Self {
        Self {
            label: props.payload.relationship.clone(),
            color: props.payload.color,
        }
    }
}

impl DisplayEdge<OntologyNode, OntologyLink, Directed, DefaultIx, NodeShape> for EdgeShape {
    fn is_inside(&self, start: &OntologyGraphNode, end: &OntologyGraphNode, pos: Pos2) -> bool {
        distance_to_segment(pos, start.location(), end.location()) <= LINK_HIT_WIDTH
    }

    fn shapes(&mut self, start: &OntologyGraphNode, end: &OntologyGraphNode, ctx: &DrawContext) -> Vec<Shape> {
        let dir = end.location() - start.location();
        if dir.length_sq() == 0.0 {
            return Vec::new();
        }
        let from = ctx.meta.canvas_to_screen_pos(start.display().closest_boundary_point(dir));
        let to = ctx.meta.canvas_to_screen_pos(end.display().closest_boundary_point(-dir));
        if !is_finite(from) || !is_finite(to) {
            return Vec::new();
        }

        let mut shapes = vec![Shape::line_segment([from, to], Stroke::new(1.5, self.color))];
        if let Some(head) = arrow_head(from, to) {
            shapes.push(Shape::convex_polygon(head.to_vec(), self.color, Stroke::NONE));
        }

        if !self.label.is_empty() {
            let zoom = ctx.meta.canvas_to_screen_size(1.0);
            let galley = ctx.ctx.fonts_mut(|fonts| {
                fonts.layout_no_wrap(
                    self.label.clone(),
                    FontId::proportional(LINK_LABEL_SIZE * zoom),
                    LINK_LABEL_COLOR,
                )
            });
            let plate = Rect::from_center_size(label_anchor(from, to), galley.size() + egui::vec2(4.0, 2.0));
            shapes.push(Shape::rect_filled(
                plate,
                CornerRadius::ZERO,
                Color32::from_rgba_unmultiplied(255, 255, 255, 204),
            ));
            shapes.push(TextShape::new(plate.center() - galley.size() / 2.0, galley, LINK_LABEL_COLOR).into());
        }
        shapes
    }

    fn update(&mut self, state: &EdgeProps<OntologyLink>) {
        self.label = state.payload.relationship.clone();
        self.color = state.payload.color;
    }
}

fn estimated_text_width(label: &str, focused: bool) -> f32 {
    label.chars().count() as f32 * font_size(focused) * 0.55
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeClick {
    pub name: String,
    pub focused: bool,
}

enum GraphState {
    Idle,
    Loading,
    Ready {
        graph: OntologyGraph,
        canvas: OntologyCanvas,
    },
    Failed(String),
}

pub struct OntologyView {
    state: GraphState,
    fresh_layout: bool,
    heat: Option<f32>,
    auto_fit: bool,
}

impl Default for OntologyView {
    fn default() -> Self {
        Self {
            state: GraphState::Idle,
            fresh_layout: false,
            heat: None,
            auto_fit: true,
        }
    }
}

impl OntologyView {
    pub fn needs_load(&self) -> bool {
        matches!(self.state, GraphState::Idle | GraphState::Failed(_))
    }

    pub fn set_loading(&mut self) {
        self.state = GraphState::Loading;
    }

    pub fn set_failed(&mut self, message: String) {
        self.state = GraphState::Failed(message);
    }

    pub fn set_graph(&mut self, mut graph: OntologyGraph, focused: &[String]) {
        graph.apply_focus(focused);
        let canvas = build_canvas(&graph);
        self.state = GraphState::Ready { graph, canvas };
        self.fresh_layout = true;
        self.heat = None;
        self.auto_fit = true;
    }

    pub fn graph(&self) -> Option<&OntologyGraph> {
        match &self.state {
            GraphState::Ready { graph, .. } => Some(graph),
            _ => None,
        }
    }

    pub fn apply_focus(&mut self, entities: &[String]) {
        if let GraphState::Ready { graph, canvas } = &mut self.state {
            graph.apply_focus(entities);
            sync_focus(canvas, graph);
            self.heat = Some(FOCUS_REHEAT);
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, theme: &Theme) -> Option<NodeClick> {
        ui.horizontal(|ui| {
            ui.heading("Skypad Knowledge Graph");
            ui.add_space(theme.spacing_12);
            for (label, node_type) in LEGEND {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), Sense::hover());
                ui.painter()
                    .rect_filled(rect, CornerRadius::same(2), color_for_type(node_type));
                ui.label(RichText::new(*label).small());
            }
        });
        ui.separator();

        let auto_fit = self.auto_fit;
        let fresh_layout = std::mem::take(&mut self.fresh_layout);
        let heat = self.heat.take();
        let (graph, canvas) = match &mut self.state {
            GraphState::Idle | GraphState::Loading => {
                ui.centered_and_justified(|ui| ui.label("Loading ontology..."));
                return None;
            }
            GraphState::Failed(message) => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new(format!("Failed to load ontology: {message}")).color(theme.danger))
                });
                return None;
            }
            GraphState::Ready { graph, canvas } => (graph, canvas),
        };

        if fresh_layout {
            egui_graphs::set_layout_state::<ForceState>(ui, ForceState::default(), None);
        }
        if let Some(alpha) = heat {
            let mut layout = egui_graphs::get_layout_state::<ForceState>(ui, None);
            layout.reheat(alpha);
            egui_graphs::set_layout_state::<ForceState>(ui, layout, None);
        }

        let interaction = SettingsInteraction::new()
            .with_dragging_enabled(true)
            .with_hover_enabled(true)
            .with_node_clicking_enabled(true)
            .with_node_selection_enabled(true);
        let navigation = SettingsNavigation::new()
            .with_fit_to_screen_enabled(auto_fit)
            .with_fit_to_screen_padding(0.1)
            .with_zoom_and_pan_enabled(!auto_fit);

        let response = Frame::new()
            .fill(theme.graph_canvas)
            .corner_radius(CornerRadius::same(theme.radius_8))
            .show(ui, |ui| {
                ui.add(
                    &mut GraphView::<_, _, _, _, NodeShape, EdgeShape, ForceState, ForceLayout>::new(canvas)
                        .with_interactions(&interaction)
                        .with_navigations(&navigation),
                )
            })
            .inner;

        let touched = response.dragged()
            || (response.hovered()
                && ui.input(|input| input.raw_scroll_delta != Vec2::ZERO || input.zoom_delta() != 1.0));
        let settled = !egui_graphs::get_layout_state::<ForceState>(ui, None).is_active();
        if touched || settled {
            self.auto_fit = false;
        }

        take_node_click(graph, canvas)
    }
}

fn build_canvas(graph: &OntologyGraph) -> OntologyCanvas {
    let stable = graph.to_stable_graph();
    let mut canvas = OntologyCanvas::from(&stable);
    for (slot, index) in stable.node_indices().enumerate() {
        if let Some(node) = canvas.node_mut(index) {
            node.set_location(spiral_position(slot));
            node.set_label(stable[index].name.clone());
        }
    }
    canvas
}

fn sync_focus(canvas: &mut OntologyCanvas, graph: &OntologyGraph) {
    let indices: Vec<_> = canvas.g().node_indices().collect();
    for index in indices {
        let (Some(node), Some(source)) = (canvas.node_mut(index), graph.nodes.get(index.index())) else {
            continue;
        };
        node.payload_mut().set_focused(source.focused);
    }
}

/// Turns a node the view just selected into a focus toggle. Selection is
/// cleared again so the next click on the same node toggles back.
fn take_node_click(graph: &mut OntologyGraph, canvas: &mut OntologyCanvas) -> Option<NodeClick> {
    let index = canvas
        .g()
        .node_indices()
        .find(|&index| canvas.node(index).is_some_and(|node| node.selected()))?;
    let node = canvas.node_mut(index)?;
    node.set_selected(false);

    let focused = graph.toggle_focus(index.index())?;
    node.payload_mut().set_focused(focused);
    Some(NodeClick {
        name: node.payload().name.clone(),
        focused,
    })
}
