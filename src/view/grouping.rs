use crate::geom::Rect;
use crate::tree::arena::{NodeId, RenderState, RenderTree};

use super::ViewTransform;

/// Padding added on each side of a group label when testing whether a
/// rectangle has room for it, in view pixels.
pub(crate) const LABEL_PADDING: f32 = 0.5;

/// Inputs for one grouping pass.
pub(crate) struct GroupParams {
    /// Minimum width and height, in view pixels, below which a rectangle
    /// cannot act as a group member or group body.
    pub min_group_size: f32,
    /// Scene units per view pixel, `viewportWidth / canvasWidth`.
    pub ratio: f32,
}

/// Decide per node whether its children render as independent labeled groups
/// or get absorbed under the node's own label.
///
/// Permission flows strip by strip: once a strip contains a member too small
/// to carry a label, or the space left after a strip could not fit the
/// node's own unified label, that strip and all later ones lose permission.
/// The first strip to lose it while the node itself was eligible marks where
/// the unified label gets drawn (`group_rect`, in view space).
pub(crate) fn update_grouping(
    tree: &mut RenderTree,
    node: NodeId,
    rendered_root: NodeId,
    transform: &ViewTransform,
    params: &GroupParams,
) {
    tree.get_mut(node).group_rect = None;

    if node != rendered_root && tree.get(node).render_state != RenderState::RenderChildren {
        tree.get_mut(node).responsible_for_group = false;
        return;
    }

    let mut can_group = tree.get(node).responsible_for_group;
    let strip_count = tree.get(node).subdivisions.len();
    for i in 0..strip_count {
        let (remaining, members) = {
            let s = &tree.get(node).subdivisions[i];
            (s.remaining, s.nodes.clone())
        };

        for &member in &members {
            let m = tree.get(member);
            can_group &= is_potential_group(m.group_label_bounds, m.scene_rect, params);
        }

        // a non-final strip also needs the leftover space to still fit the
        // node's own unified label
        if i + 1 < strip_count {
            let next_remaining = tree.get(node).subdivisions[i + 1].remaining;
            let own_label = tree.get(node).group_label_bounds;
            if !is_potential_group(own_label, next_remaining, params) {
                can_group = false;
            }
        }

        for &member in &members {
            tree.get_mut(member).responsible_for_group = can_group;
        }

        if tree.get(node).group_rect.is_none()
            && tree.get(node).responsible_for_group
            && !can_group
        {
            tree.get_mut(node).group_rect = Some(transform.scene_to_view(remaining));
        }
    }

    // always recurse so stale group rectangles from earlier passes get
    // cleared even in subtrees that lost permission
    let members: Vec<NodeId> = tree
        .get(node)
        .subdivisions
        .iter()
        .flat_map(|s| s.nodes.iter().copied())
        .collect();
    for member in members {
        update_grouping(tree, member, rendered_root, transform, params);
    }
}

fn is_potential_group(label: Rect, scene_rect: Rect, params: &GroupParams) -> bool {
    let min_scene = params.min_group_size * params.ratio;
    scene_rect.w > (label.w + 2.0 * LABEL_PADDING) * params.ratio
        && scene_rect.h > (label.h + 2.0 * LABEL_PADDING) * params.ratio
        && scene_rect.w > min_scene
        && scene_rect.h > min_scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::arena::{RenderNode, Subdivision};

    fn grouped(scene_rect: Rect, label: Rect, state: RenderState) -> RenderNode {
        RenderNode {
            scene_rect,
            group_label_bounds: label,
            render_state: state,
            ..RenderNode::default()
        }
    }

    fn strip(tree: &mut RenderTree, parent: NodeId, remaining: Rect, nodes: Vec<NodeId>) {
        tree.get_mut(parent)
            .subdivisions
            .push(Subdivision { remaining, nodes });
    }

    fn identity() -> ViewTransform {
        ViewTransform {
            viewport: Rect::new(0.0, 0.0, 100.0, 100.0),
            scale: 1.0,
        }
    }

    fn params() -> GroupParams {
        GroupParams {
            min_group_size: 10.0,
            ratio: 1.0,
        }
    }

    const LABEL: Rect = Rect::new(0.0, 0.0, 8.0, 3.0);

    #[test]
    fn roomy_members_keep_permission_and_no_host_rect() {
        let mut tree = RenderTree::new(grouped(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            LABEL,
            RenderState::RenderChildren,
        ));
        let root = tree.root;
        let a = tree.add_child(
            root,
            grouped(
                Rect::new(0.0, 0.0, 50.0, 100.0),
                LABEL,
                RenderState::RenderChildren,
            ),
        );
        let b = tree.add_child(
            root,
            grouped(Rect::new(50.0, 0.0, 50.0, 100.0), LABEL, RenderState::Render),
        );
        let a1 = tree.add_child(
            a,
            grouped(Rect::new(0.0, 0.0, 50.0, 100.0), LABEL, RenderState::Render),
        );
        strip(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0), vec![a, b]);
        strip(&mut tree, a, Rect::new(0.0, 0.0, 50.0, 100.0), vec![a1]);
        tree.get_mut(root).responsible_for_group = true;

        update_grouping(&mut tree, root, root, &identity(), &params());

        // a keeps permission through its own visit; b, as a terminal node,
        // always drops it so the group traversal stops there
        assert!(tree.get(a).responsible_for_group);
        assert!(!tree.get(b).responsible_for_group);
        assert!(tree.get(root).group_rect.is_none());
        assert!(tree.get(a).group_rect.is_none());
    }

    #[test]
    fn cramped_member_vetoes_its_strip_and_marks_the_host() {
        let mut tree = RenderTree::new(grouped(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            LABEL,
            RenderState::RenderChildren,
        ));
        let root = tree.root;
        let a = tree.add_child(
            root,
            grouped(
                Rect::new(0.0, 0.0, 60.0, 100.0),
                LABEL,
                RenderState::RenderChildren,
            ),
        );
        let b = tree.add_child(
            root,
            grouped(Rect::new(60.0, 0.0, 40.0, 90.0), LABEL, RenderState::Render),
        );
        let c = tree.add_child(
            root,
            grouped(Rect::new(60.0, 90.0, 40.0, 10.0), LABEL, RenderState::Render),
        );
        let a1 = tree.add_child(
            a,
            grouped(Rect::new(0.0, 0.0, 60.0, 100.0), LABEL, RenderState::Render),
        );
        strip(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0), vec![a]);
        strip(&mut tree, root, Rect::new(60.0, 0.0, 40.0, 100.0), vec![b, c]);
        strip(&mut tree, a, Rect::new(0.0, 0.0, 60.0, 100.0), vec![a1]);
        tree.get_mut(root).responsible_for_group = true;
        // stale value that the pass must clear despite b losing permission
        tree.get_mut(b).group_rect = Some(Rect::new(1.0, 1.0, 1.0, 1.0));

        update_grouping(&mut tree, root, root, &identity(), &params());

        // c is only 10 high, not strictly above the 10px floor, so the
        // second strip and everything after it loses permission while the
        // first strip keeps it
        assert!(tree.get(a).responsible_for_group);
        assert!(!tree.get(b).responsible_for_group);
        assert!(!tree.get(c).responsible_for_group);
        assert_eq!(
            tree.get(root).group_rect,
            Some(Rect::new(60.0, 0.0, 40.0, 100.0))
        );
        assert!(tree.get(b).group_rect.is_none());
    }

    #[test]
    fn leftover_too_small_for_own_label_vetoes_earlier_strip() {
        let wide_label = Rect::new(0.0, 0.0, 30.0, 4.0);
        let mut tree = RenderTree::new(grouped(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            wide_label,
            RenderState::RenderChildren,
        ));
        let root = tree.root;
        let a = tree.add_child(
            root,
            grouped(
                Rect::new(0.0, 0.0, 80.0, 100.0),
                LABEL,
                RenderState::RenderChildren,
            ),
        );
        let b = tree.add_child(
            root,
            grouped(Rect::new(80.0, 0.0, 20.0, 100.0), LABEL, RenderState::Render),
        );
        let a1 = tree.add_child(
            a,
            grouped(Rect::new(0.0, 0.0, 80.0, 100.0), LABEL, RenderState::Render),
        );
        strip(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0), vec![a]);
        strip(&mut tree, root, Rect::new(80.0, 0.0, 20.0, 100.0), vec![b]);
        strip(&mut tree, a, Rect::new(0.0, 0.0, 80.0, 100.0), vec![a1]);
        tree.get_mut(root).responsible_for_group = true;

        update_grouping(&mut tree, root, root, &identity(), &params());

        // the 20-wide leftover cannot hold a 31px label, so even the roomy
        // first strip loses permission and the host rect covers everything
        assert!(!tree.get(a).responsible_for_group);
        assert_eq!(
            tree.get(root).group_rect,
            Some(Rect::new(0.0, 0.0, 100.0, 100.0))
        );
    }

    #[test]
    fn node_not_rendering_children_loses_permission_and_stops() {
        let mut tree = RenderTree::new(grouped(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            LABEL,
            RenderState::RenderChildren,
        ));
        let root = tree.root;
        let mid = tree.add_child(
            root,
            grouped(Rect::new(0.0, 0.0, 100.0, 100.0), LABEL, RenderState::Render),
        );
        let leaf = tree.add_child(
            mid,
            grouped(Rect::new(0.0, 0.0, 50.0, 50.0), LABEL, RenderState::CulledChildren),
        );
        strip(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0), vec![mid]);
        strip(&mut tree, mid, Rect::new(0.0, 0.0, 100.0, 100.0), vec![leaf]);
        tree.get_mut(root).responsible_for_group = true;
        tree.get_mut(mid).group_rect = Some(Rect::new(2.0, 2.0, 2.0, 2.0));
        tree.get_mut(leaf).responsible_for_group = true;

        update_grouping(&mut tree, root, root, &identity(), &params());

        assert!(!tree.get(mid).responsible_for_group);
        assert!(tree.get(mid).group_rect.is_none());
        // the early exit does not descend further
        assert!(tree.get(leaf).responsible_for_group);
    }

    #[test]
    fn ineligible_node_absorbs_without_hosting() {
        let mut tree = RenderTree::new(grouped(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            LABEL,
            RenderState::RenderChildren,
        ));
        let root = tree.root;
        let small = tree.add_child(
            root,
            grouped(Rect::new(0.0, 0.0, 5.0, 5.0), LABEL, RenderState::Render),
        );
        strip(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0), vec![small]);
        tree.get_mut(root).responsible_for_group = false;

        update_grouping(&mut tree, root, root, &identity(), &params());

        // permission was already lost upstream, so no host rect appears here
        assert!(!tree.get(small).responsible_for_group);
        assert!(tree.get(root).group_rect.is_none());
    }

    #[test]
    fn potential_group_test_scales_with_viewport_ratio() {
        let zoomed = GroupParams {
            min_group_size: 10.0,
            ratio: 2.0,
        };
        // at ratio 2 the floor is 20 scene units and the label needs 18x8
        assert!(is_potential_group(LABEL, Rect::new(0.0, 0.0, 25.0, 25.0), &zoomed));
        assert!(!is_potential_group(LABEL, Rect::new(0.0, 0.0, 19.0, 25.0), &zoomed));

        let identity = params();
        assert!(is_potential_group(LABEL, Rect::new(0.0, 0.0, 15.0, 15.0), &identity));
        assert!(!is_potential_group(LABEL, Rect::new(0.0, 0.0, 15.0, 9.5), &identity));
    }
}
