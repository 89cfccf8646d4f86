use rand::Rng;

use crate::tree::InputNode;

/// RGBA color with components in [0, 1]. The engine copies it through the
/// pipeline untouched; producers decide what it means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(0.50, 0.50, 0.55)
    }
}

/// Walk the tree pre-order, assigning each node a hue evenly spaced around
/// the wheel with a small jitter from `rng` so neighboring subtrees stay
/// distinguishable. Deterministic for a fixed seed.
pub fn assign_palette<R: Rng>(root: &mut InputNode, rng: &mut R) {
    let total = count_nodes(root);
    let mut curr = 0usize;
    assign_node(root, &mut curr, total, rng);
}

fn assign_node<R: Rng>(node: &mut InputNode, curr: &mut usize, total: usize, rng: &mut R) {
    let hue = *curr as f32 / total.max(1) as f32;
    let jitter = rng.random_range(-0.011..=0.011); // roughly +-4 degrees
    node.color = hsv_to_rgb((hue + jitter).rem_euclid(1.0), 0.55, 0.80);
    *curr += 1;
    for child in &mut node.children {
        assign_node(child, curr, total, rng);
    }
}

fn count_nodes(node: &InputNode) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

/// h, s, v in [0, 1].
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Color {
    let h6 = (h * 6.0).rem_euclid(6.0);
    let i = h6.floor() as i32;
    let f = h6 - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match i {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Color { r, g, b, a: 1.0 }
}
