use crate::tree::arena::{NodeId, RenderState, RenderTree};

use super::ViewTransform;

/// Thresholds for one culling pass, captured before the walk starts.
pub(crate) struct CullParams {
    /// Depth limit relative to the rendered root; zero or negative disables it.
    pub max_depth: i32,
    /// Nodes whose view rectangle is narrower than this on either axis stop
    /// recursing and render as a single block.
    pub min_pixel_size: f32,
    /// Tree depth of the rendered root, the baseline for relative depth.
    pub root_depth: u32,
}

/// Classify `node` and every laid-out descendant for the current viewport.
///
/// `fully_visible` skips per-node viewport tests once an ancestor is known to
/// be contained; `culled_by_parent` marks subtrees below a node that renders
/// as a single block.
pub(crate) fn update_culling(
    tree: &mut RenderTree,
    node: NodeId,
    transform: &ViewTransform,
    params: &CullParams,
    mut fully_visible: bool,
    culled_by_parent: bool,
) {
    if culled_by_parent {
        tree.get_mut(node).render_state = RenderState::CulledChildren;
        return;
    }

    let relative_depth = tree.get(node).depth.saturating_sub(params.root_depth) as i32;
    if params.max_depth > 0 && relative_depth > params.max_depth {
        tree.get_mut(node).render_state = RenderState::CulledDepth;
        return;
    }

    let scene_rect = tree.get(node).scene_rect;
    if !fully_visible {
        if !transform.viewport.intersects(scene_rect) {
            tree.get_mut(node).render_state = RenderState::CulledViewport;
            return;
        }
        if transform.viewport.contains_rect(scene_rect) {
            fully_visible = true;
        }
    }

    let view_rect = transform.scene_to_view(scene_rect);
    let too_small =
        view_rect.w < params.min_pixel_size || view_rect.h < params.min_pixel_size;
    let too_deep = params.max_depth > 0 && relative_depth >= params.max_depth;
    let childless = tree.get(node).children.is_empty();
    let state = if too_small || too_deep || childless {
        RenderState::Render
    } else {
        RenderState::RenderChildren
    };

    {
        let n = tree.get_mut(node);
        n.view_rect = view_rect;
        n.render_state = state;
    }

    let members: Vec<NodeId> = tree
        .get(node)
        .subdivisions
        .iter()
        .flat_map(|s| s.nodes.iter().copied())
        .collect();
    for member in members {
        update_culling(
            tree,
            member,
            transform,
            params,
            fully_visible,
            state == RenderState::Render,
        );
    }
}
