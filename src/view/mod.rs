mod culling;
mod grouping;

use crate::geom::{div_or_zero, Rect};
use crate::layout::relayout;
use crate::tree::arena::{NodeId, RenderNode, RenderState, RenderTree};
use crate::tree::{build_render_tree, InputNode, ItemId, TextMeasurer};

use culling::{update_culling, CullParams};
use grouping::{update_grouping, GroupParams};

/// Group regions may never be configured smaller than this, in view pixels.
const MIN_GROUP_FLOOR: f32 = 50.0;

/// Scene-to-view projection: translate by the viewport origin, then scale
/// uniformly by `canvasWidth / viewportWidth`.
pub(crate) struct ViewTransform {
    pub viewport: Rect,
    pub scale: f32,
}

impl ViewTransform {
    pub fn scene_to_view(&self, rect: Rect) -> Rect {
        rect.translated(-self.viewport.x, -self.viewport.y)
            .scaled(self.scale)
    }
}

/// Tuning knobs for the culling and grouping passes.
#[derive(Debug, Clone, Copy)]
pub struct ViewConfig {
    /// Depth limit relative to the zoom root; zero or negative disables it.
    pub max_depth: i32,
    /// View-space size below which a node renders as a single block instead
    /// of recursing. Clamped to `[1, min_group_size]`.
    pub min_pixel_size: f32,
    /// View-space size below which a region cannot carry a group label.
    /// Clamped to at least 50.
    pub min_group_size: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_depth: -1,
            min_pixel_size: 20.0,
            min_group_size: 100.0,
        }
    }
}

/// A zoomable, pannable treemap over one weighted tree.
///
/// Owns the render arena plus the view state (canvas size, viewport, zoom
/// stack, thresholds) and keeps every node's scene rectangle, view
/// rectangle, render state and grouping verdict consistent after each
/// mutating call. All geometry is in scene coordinates except where a method
/// says otherwise; view coordinates are pixels on the canvas.
pub struct TreeMapView {
    tree: RenderTree,
    measurer: Box<dyn TextMeasurer>,
    canvas_w: f32,
    canvas_h: f32,
    viewport: Rect,
    zoom_stack: Vec<NodeId>,
    rendered_root: NodeId,
    max_depth: i32,
    min_pixel_size: f32,
    min_group_size: f32,
}

impl TreeMapView {
    pub fn new(
        canvas_w: f32,
        canvas_h: f32,
        config: ViewConfig,
        measurer: Box<dyn TextMeasurer>,
    ) -> Self {
        let min_group_size = config.min_group_size.max(MIN_GROUP_FLOOR);
        let min_pixel_size = config.min_pixel_size.clamp(1.0, min_group_size);
        let tree = RenderTree::default();
        let rendered_root = tree.root;
        Self {
            tree,
            measurer,
            canvas_w,
            canvas_h,
            viewport: Rect::new(0.0, 0.0, canvas_w, canvas_h),
            zoom_stack: Vec::new(),
            rendered_root,
            max_depth: config.max_depth,
            min_pixel_size,
            min_group_size,
        }
    }

    /// Replace the displayed tree. Resets the zoom stack and the viewport,
    /// then runs the full layout, culling and grouping pipeline.
    pub fn set_tree(&mut self, input: &InputNode) {
        self.tree = build_render_tree(input, self.measurer.as_ref());
        self.zoom_stack.clear();
        self.rendered_root = self.tree.root;
        self.viewport = Rect::new(0.0, 0.0, self.canvas_w, self.canvas_h);
        self.relayout_and_refresh();
    }

    /// Move or resize the visible window, in scene coordinates. The viewport
    /// keeps its size where possible but never extends past the canvas; only
    /// the culling and grouping passes re-run.
    pub fn set_viewport(&mut self, rect: Rect) {
        let mut vp = rect;
        if vp.w > self.canvas_w {
            vp.w = self.canvas_w;
        }
        if vp.h > self.canvas_h {
            vp.h = self.canvas_h;
        }
        if vp.x < 0.0 {
            vp.x = 0.0;
        }
        if vp.y < 0.0 {
            vp.y = 0.0;
        }
        if vp.right() > self.canvas_w {
            vp.x = self.canvas_w - vp.w;
        }
        if vp.bottom() > self.canvas_h {
            vp.y = self.canvas_h - vp.h;
        }
        self.viewport = vp;
        self.refresh_culling();
        self.refresh_grouping();
    }

    /// Change the canvas size. The viewport snaps back to cover the whole
    /// canvas and the subtree is laid out again.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.canvas_w = width;
        self.canvas_h = height;
        self.viewport = Rect::new(0.0, 0.0, width, height);
        tracing::info!("canvas resized to {}x{}", width, height);
        self.relayout_and_refresh();
    }

    /// Make the subtree of the node carrying `item` fill the current
    /// viewport. Returns false when no node carries that identity.
    pub fn zoom_in(&mut self, item: ItemId) -> bool {
        let Some(found) = self.tree.find_by_item(self.tree.root, item) else {
            return false;
        };
        self.zoom_stack.push(self.rendered_root);
        self.rendered_root = found;
        tracing::info!(
            "zoom in to '{}' (level {})",
            self.tree.get(found).label,
            self.zoom_stack.len()
        );
        self.relayout_and_refresh();
        true
    }

    /// Step back to the zoom level before the last [`zoom_in`]. Returns
    /// false when already at the outermost level.
    pub fn zoom_out(&mut self) -> bool {
        let Some(previous) = self.zoom_stack.pop() else {
            return false;
        };
        self.rendered_root = previous;
        tracing::info!(
            "zoom out to '{}' (level {})",
            self.tree.get(previous).label,
            self.zoom_stack.len()
        );
        self.relayout_and_refresh();
        true
    }

    /// Number of zoom-in steps currently applied.
    pub fn zoom_depth(&self) -> usize {
        self.zoom_stack.len()
    }

    pub fn set_max_depth(&mut self, max_depth: i32) {
        if self.max_depth != max_depth {
            self.max_depth = max_depth;
            self.refresh_culling();
            self.refresh_grouping();
        }
    }

    pub fn set_min_pixel_size(&mut self, min_pixel_size: f32) {
        let clamped = min_pixel_size.clamp(1.0, self.min_group_size);
        if self.min_pixel_size != clamped {
            self.min_pixel_size = clamped;
            self.refresh_culling();
            self.refresh_grouping();
        }
    }

    /// Lowering the group threshold below the pixel threshold drags the
    /// pixel threshold down with it, keeping `min_pixel_size <=
    /// min_group_size`.
    pub fn set_min_group_size(&mut self, min_group_size: f32) {
        let clamped = min_group_size.max(MIN_GROUP_FLOOR);
        if self.min_group_size != clamped {
            self.min_group_size = clamped;
            if self.min_pixel_size > clamped {
                self.min_pixel_size = clamped;
                self.refresh_culling();
            }
            self.refresh_grouping();
        }
    }

    /// Scale the viewport about a view-space anchor so the content under the
    /// anchor stays put. Factors below 1 zoom in, above 1 zoom out.
    pub fn zoom_viewport(&mut self, factor: f32, anchor_x: f32, anchor_y: f32) {
        let (scene_x, scene_y) = self.view_to_scene_point(anchor_x, anchor_y);
        let w = self.viewport.w * factor;
        let h = self.viewport.h * factor;
        let x = scene_x - div_or_zero(anchor_x, self.canvas_w) * w;
        let y = scene_y - div_or_zero(anchor_y, self.canvas_h) * h;
        self.set_viewport(Rect::new(x, y, w, h));
    }

    /// Shift the viewport by a view-space delta, e.g. from a mouse drag.
    pub fn pan_viewport(&mut self, dx_view: f32, dy_view: f32) {
        let ratio = div_or_zero(self.viewport.w, self.canvas_w);
        self.set_viewport(self.viewport.translated(dx_view * ratio, dy_view * ratio));
    }

    /// Project a scene rectangle into view pixels.
    pub fn scene_to_view(&self, rect: Rect) -> Rect {
        self.transform().scene_to_view(rect)
    }

    /// Inverse projection, view pixels back to scene coordinates.
    pub fn view_to_scene(&self, rect: Rect) -> Rect {
        let ratio = div_or_zero(self.viewport.w, self.canvas_w);
        rect.scaled(ratio).translated(self.viewport.x, self.viewport.y)
    }

    /// Walk the tree from the zoom root, calling `visit` on each node.
    /// Returning true descends into the node's children.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(NodeId, &RenderNode) -> bool,
    {
        self.walk(self.rendered_root, &mut visit);
    }

    /// Hit-test a view-space point. Group label hits resolve to the hosting
    /// node; otherwise the deepest rendered node under the point wins.
    pub fn node_at(&self, x: f32, y: f32) -> Option<NodeId> {
        self.hit_test(self.rendered_root, x, y)
    }

    /// Find the node created for `item`, anywhere in the tree.
    pub fn find_item(&self, item: ItemId) -> Option<NodeId> {
        self.tree.find_by_item(self.tree.root, item)
    }

    pub fn rendered_root(&self) -> NodeId {
        self.rendered_root
    }

    pub fn node(&self, id: NodeId) -> &RenderNode {
        self.tree.get(id)
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn canvas_size(&self) -> (f32, f32) {
        (self.canvas_w, self.canvas_h)
    }

    pub fn max_depth(&self) -> i32 {
        self.max_depth
    }

    pub fn min_pixel_size(&self) -> f32 {
        self.min_pixel_size
    }

    pub fn min_group_size(&self) -> f32 {
        self.min_group_size
    }

    fn relayout_and_refresh(&mut self) {
        let root = self.rendered_root;
        relayout(&mut self.tree, root, self.viewport);
        tracing::debug!(
            "relayout: {} nodes into {:.0}x{:.0}",
            self.tree.len(),
            self.viewport.w,
            self.viewport.h
        );
        self.refresh_culling();
        self.refresh_grouping();
    }

    fn refresh_culling(&mut self) {
        let root = self.rendered_root;
        let params = CullParams {
            max_depth: self.max_depth,
            min_pixel_size: self.min_pixel_size,
            root_depth: self.tree.get(root).depth,
        };
        let transform = self.transform();
        update_culling(&mut self.tree, root, &transform, &params, false, false);
    }

    fn refresh_grouping(&mut self) {
        let root = self.rendered_root;
        // the zoom root starts every pass eligible, whatever an earlier pass
        // at a different level left on it
        self.tree.get_mut(root).responsible_for_group = true;
        let params = GroupParams {
            min_group_size: self.min_group_size,
            ratio: div_or_zero(self.viewport.w, self.canvas_w),
        };
        let transform = self.transform();
        update_grouping(&mut self.tree, root, root, &transform, &params);
    }

    fn transform(&self) -> ViewTransform {
        ViewTransform {
            viewport: self.viewport,
            scale: div_or_zero(self.canvas_w, self.viewport.w),
        }
    }

    fn view_to_scene_point(&self, x: f32, y: f32) -> (f32, f32) {
        let ratio = div_or_zero(self.viewport.w, self.canvas_w);
        (self.viewport.x + x * ratio, self.viewport.y + y * ratio)
    }

    fn walk<F>(&self, node: NodeId, visit: &mut F)
    where
        F: FnMut(NodeId, &RenderNode) -> bool,
    {
        let n = self.tree.get(node);
        if visit(node, n) {
            for &child in &n.children {
                self.walk(child, visit);
            }
        }
    }

    fn hit_test(&self, node: NodeId, x: f32, y: f32) -> Option<NodeId> {
        let n = self.tree.get(node);
        match n.render_state {
            RenderState::Render => n.view_rect.contains_point(x, y).then_some(node),
            RenderState::RenderChildren => {
                if !n.view_rect.contains_point(x, y) {
                    return None;
                }
                if let Some(group_rect) = n.group_rect {
                    if group_rect.contains_point(x, y) {
                        let label = n.group_label_bounds.translated(group_rect.x, group_rect.y);
                        if label.contains_point(x, y) {
                            return Some(node);
                        }
                    }
                }
                n.children.iter().find_map(|&child| self.hit_test(child, x, y))
            }
            _ => None,
        }
    }
}
