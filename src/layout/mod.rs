pub mod squarify;

pub use squarify::{partition, partition_rects, Strip, StripItem};

use crate::geom::Rect;
use crate::tree::arena::{NodeId, RenderTree, Subdivision};

/// Assign `rect` to `node` and carve it among the node's children by weight,
/// recursing until every positively weighted descendant has a scene
/// rectangle.
///
/// When the children weigh less than the node itself, the difference is laid
/// out as an invisible filler so the children keep their true proportions
/// instead of inflating to fill the parent. Zero-weight children are skipped
/// and never appear in a subdivision.
pub fn relayout(tree: &mut RenderTree, node: NodeId, rect: Rect) {
    {
        let n = tree.get_mut(node);
        n.scene_rect = rect;
        n.subdivisions.clear();
    }

    let (child_ids, node_size, node_tree_depth) = {
        let n = tree.get(node);
        (n.children.clone(), n.size, n.tree_depth)
    };
    if child_ids.is_empty() {
        return;
    }

    let mut ids = Vec::with_capacity(child_ids.len());
    let mut sizes = Vec::with_capacity(child_ids.len() + 1);
    for &child in &child_ids {
        let size = tree.get(child).size;
        if size > 0.0 {
            ids.push(child);
            sizes.push(size);
        }
    }

    let child_total: f32 = sizes.iter().sum();
    // Filler index is one past the real children; it claims area, not a node.
    if child_total < node_size {
        sizes.push(node_size - child_total);
    }

    let mut tree_depth = node_tree_depth;
    for strip in partition(&sizes, rect) {
        tree_depth += 1;
        let mut members = Vec::with_capacity(strip.items.len());
        for item in &strip.items {
            if item.index >= ids.len() {
                continue;
            }
            let child = ids[item.index];
            tree.get_mut(child).tree_depth = tree_depth;
            relayout(tree, child, item.rect);
            members.push(child);
        }
        if !members.is_empty() {
            tree.get_mut(node).subdivisions.push(Subdivision {
                remaining: strip.bounds,
                nodes: members,
            });
        }
    }
}
