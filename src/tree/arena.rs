use compact_str::CompactString;

use crate::color::Color;
use crate::geom::Rect;

/// Index into the arena `Vec<RenderNode>`. Handles stay valid until the next
/// input tree is installed, which rebuilds the whole arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity token assigned by the data producer. Compared for equality,
/// never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ItemId(pub u64);

/// How the culling pass classified a node for the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    /// Outside the viewport; nothing below it is drawn
    #[default]
    CulledViewport,
    /// Past the relative depth limit
    CulledDepth,
    /// An ancestor already draws this region as one block
    CulledChildren,
    /// Drawn as a terminal block, children collapsed into it
    Render,
    /// Drawn by drawing its children
    RenderChildren,
}

/// One strip of a node's subdivision chain. `remaining` is the scene
/// rectangle the strip was carved from (this strip's band plus everything
/// laid out after it), which the grouping pass reuses as the caption region
/// when grouping is vetoed here.
#[derive(Debug, Clone)]
pub struct Subdivision {
    pub remaining: Rect,
    pub nodes: Vec<NodeId>,
}

/// A single node of the render tree, stored in a flat arena.
#[derive(Debug, Clone, Default)]
pub struct RenderNode {
    /// Display name of the item
    pub label: CompactString,
    /// Caption shown when the node hosts a merged group region
    pub group_label: CompactString,
    /// Measured bounds of `group_label`, origin at (0, 0)
    pub group_label_bounds: Rect,
    pub color: Color,
    /// Weight (line count). Should equal the sum of child sizes; any
    /// shortfall becomes filler area during layout.
    pub size: f32,
    /// Identity token copied from the input tree
    pub item: ItemId,
    /// Tree depth, absolute root = 0
    pub depth: u32,
    /// Strip-chain depth accumulated by layout, one step per strip
    pub tree_depth: u32,
    /// Children in input order
    pub children: Vec<NodeId>,
    /// Assigned rectangle in scene space
    pub scene_rect: Rect,
    /// `scene_rect` under the current viewport transform
    pub view_rect: Rect,
    pub render_state: RenderState,
    /// Whether this node renders its own group region (assigned by the
    /// parent during the grouping pass)
    pub responsible_for_group: bool,
    /// Merged-caption region in view space, when this node hosts a group
    pub group_rect: Option<Rect>,
    /// Subdivision chain from the last relayout, filler entries removed
    pub subdivisions: Vec<Subdivision>,
}

/// The render tree as a flat arena. Rebuilt whole on every new input tree;
/// never incrementally patched.
pub struct RenderTree {
    pub nodes: Vec<RenderNode>,
    pub root: NodeId,
}

impl Default for RenderTree {
    fn default() -> Self {
        RenderTree::new(RenderNode::default())
    }
}

impl RenderTree {
    /// Create a tree holding just the given root node.
    pub fn new(mut root: RenderNode) -> Self {
        root.depth = 0;
        RenderTree {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// Add a child under `parent`, preserving insertion order.
    /// Returns the new node's ID.
    pub fn add_child(&mut self, parent: NodeId, mut node: RenderNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.depth = self.nodes[parent.index()].depth + 1;
        self.nodes[parent.index()].children.push(id);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &RenderNode {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut RenderNode {
        &mut self.nodes[id.index()]
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Depth-first identity search. Exact match only.
    pub fn find_by_item(&self, from: NodeId, item: ItemId) -> Option<NodeId> {
        let node = self.get(from);
        if node.item == item {
            return Some(from);
        }
        for &child in &node.children {
            if let Some(found) = self.find_by_item(child, item) {
                return Some(found);
            }
        }
        None
    }
}
