pub mod arena;

use compact_str::CompactString;

use crate::color::Color;
use crate::geom::Rect;

use self::arena::{NodeId, RenderNode, RenderTree};

pub use self::arena::ItemId;

/// A node of the producer-supplied weighted tree, immutable at hand-off.
#[derive(Debug, Clone)]
pub struct InputNode {
    /// Display name of the item
    pub label: String,
    /// Caption used when the node's region is rendered as a merged group
    pub group_label: String,
    pub color: Color,
    /// Non-negative weight (line count)
    pub size: f32,
    pub children: Vec<InputNode>,
    /// Identity token, compared for equality only
    pub id: ItemId,
}

/// Measures caption text for the grouping pass. Implementations return
/// bounds with the origin normalized to (0, 0).
pub trait TextMeasurer {
    fn text_bounds(&self, text: &str) -> Rect;
}

/// Proportional-font approximation: 0.58 em per character, 1.2 em line
/// height. Good enough for threshold decisions; applications with a real
/// font stack plug it in through [`TextMeasurer`].
pub struct CharCellMeasurer {
    pub font_size: f32,
}

impl Default for CharCellMeasurer {
    fn default() -> Self {
        Self { font_size: 14.0 }
    }
}

impl TextMeasurer for CharCellMeasurer {
    fn text_bounds(&self, text: &str) -> Rect {
        let width = text.chars().count() as f32 * self.font_size * 0.58;
        Rect::new(0.0, 0.0, width, self.font_size * 1.2)
    }
}

/// Mirror an input tree into a fresh render arena, measuring group captions
/// along the way. Children keep their input order; nothing is built lazily.
pub fn build_render_tree(input: &InputNode, measurer: &dyn TextMeasurer) -> RenderTree {
    let mut tree = RenderTree::new(render_node(input, measurer));
    let root = tree.root;
    add_children(&mut tree, root, input, measurer);
    tracing::info!(
        "built render tree: {} nodes, root '{}' weight {}",
        tree.len(),
        tree.get(tree.root).label,
        tree.get(tree.root).size
    );
    tree
}

fn add_children(
    tree: &mut RenderTree,
    parent: NodeId,
    input: &InputNode,
    measurer: &dyn TextMeasurer,
) {
    for child in &input.children {
        let id = tree.add_child(parent, render_node(child, measurer));
        add_children(tree, id, child, measurer);
    }
}

fn render_node(input: &InputNode, measurer: &dyn TextMeasurer) -> RenderNode {
    let bounds = measurer.text_bounds(&input.group_label);
    RenderNode {
        label: CompactString::new(&input.label),
        group_label: CompactString::new(&input.group_label),
        // normalize to origin; measurers may report offset baselines
        group_label_bounds: Rect::new(0.0, 0.0, bounds.w, bounds.h),
        color: input.color,
        size: input.size,
        item: input.id,
        ..RenderNode::default()
    }
}

/// Strip a common prefix from every `group_label` in the tree. Producers
/// building from a single root directory use this so captions show paths
/// relative to it.
pub fn trim_group_prefix(node: &mut InputNode, prefix: &str) {
    if prefix.is_empty() {
        return;
    }
    if let Some(rest) = node.group_label.strip_prefix(prefix) {
        node.group_label = rest.to_string();
    }
    for child in &mut node.children {
        trim_group_prefix(child, prefix);
    }
}
