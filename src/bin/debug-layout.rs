/// Diagnostic tool to verify tree → layout → view pipeline
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use locmap::color::assign_palette;
use locmap::tree::arena::RenderState;
use locmap::tree::{CharCellMeasurer, InputNode, ItemId};
use locmap::view::{TreeMapView, ViewConfig};

const CANVAS_W: f32 = 1280.0;
const CANVAS_H: f32 = 800.0;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("locmap=debug".parse().unwrap()),
        )
        .init();

    let node_budget: usize = std::env::args()
        .nth(1)
        .and_then(|a| a.parse().ok())
        .unwrap_or(400);
    let seed: u64 = std::env::args()
        .nth(2)
        .and_then(|a| a.parse().ok())
        .unwrap_or(42);

    println!("=== DIAGNOSTIC: Tree → Layout → View Pipeline ===");
    println!("Synthetic tree: ~{node_budget} nodes, seed {seed}");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut root = synth_tree(&mut rng, node_budget);
    let total_nodes = count(&root);
    println!("\n[1] Tree built: {} nodes, root weight {:.0}", total_nodes, root.size);

    assign_palette(&mut root, &mut rng);
    println!("\n[2] Palette assigned across {} nodes", total_nodes);

    let mut view = TreeMapView::new(
        CANVAS_W,
        CANVAS_H,
        ViewConfig::default(),
        Box::new(CharCellMeasurer::default()),
    );
    let start = Instant::now();
    view.set_tree(&root);
    println!(
        "\n[3] Pipeline ran in {:.2}ms ({}x{} canvas)",
        start.elapsed().as_secs_f64() * 1000.0,
        CANVAS_W,
        CANVAS_H
    );

    let tally = state_tally(&view);
    println!(
        "\n[4] Render states: render={} render-children={} culled-viewport={} culled-depth={} culled-children={}",
        tally.render,
        tally.render_children,
        tally.culled_viewport,
        tally.culled_depth,
        tally.culled_children
    );

    let mut rendered_area = 0.0;
    let mut group_hosts = 0;
    view.traverse(|_, node| {
        if node.render_state == RenderState::Render {
            rendered_area += node.view_rect.area();
        }
        if node.group_rect.is_some() {
            group_hosts += 1;
        }
        node.render_state == RenderState::RenderChildren
    });
    println!(
        "\n[5] Leaf coverage: {:.1}% of canvas, {} group hosts",
        rendered_area / (CANVAS_W * CANVAS_H) * 100.0,
        group_hosts
    );

    let center = view.node_at(CANVAS_W / 2.0, CANVAS_H / 2.0);
    match center {
        Some(id) => println!("\n[6] Hit test at canvas center: '{}'", view.node(id).label),
        None => println!("\n[6] Hit test at canvas center: nothing rendered there"),
    }

    let target = first_branch(&view);
    match target {
        Some((item, label)) => {
            view.zoom_in(item);
            let zoomed = state_tally(&view);
            let ok = view.zoom_out();
            println!(
                "\n[7] Zoom round trip through '{}': {} rendered while zoomed, restored={}",
                label, zoomed.render, ok
            );
        }
        None => println!("\n[7] Zoom round trip skipped: tree has no branch nodes"),
    }

    view.zoom_viewport(0.5, CANVAS_W / 2.0, CANVAS_H / 2.0);
    let panned = state_tally(&view);
    view.zoom_viewport(2.0, CANVAS_W / 2.0, CANVAS_H / 2.0);
    println!(
        "\n[8] Wheel zoom to half viewport: {} nodes viewport-culled, viewport now {:?}",
        panned.culled_viewport,
        view.viewport()
    );

    println!("\n=== Pipeline diagnostic finished ===");
    Ok(())
}

struct StateTally {
    culled_viewport: usize,
    culled_depth: usize,
    culled_children: usize,
    render: usize,
    render_children: usize,
}

fn state_tally(view: &TreeMapView) -> StateTally {
    let mut tally = StateTally {
        culled_viewport: 0,
        culled_depth: 0,
        culled_children: 0,
        render: 0,
        render_children: 0,
    };
    view.traverse(|_, node| {
        match node.render_state {
            RenderState::CulledViewport => tally.culled_viewport += 1,
            RenderState::CulledDepth => tally.culled_depth += 1,
            RenderState::CulledChildren => tally.culled_children += 1,
            RenderState::Render => tally.render += 1,
            RenderState::RenderChildren => tally.render_children += 1,
        }
        true
    });
    tally
}

fn first_branch(view: &TreeMapView) -> Option<(ItemId, String)> {
    let mut found = None;
    view.traverse(|_, node| {
        if found.is_none() && node.depth == 1 && !node.children.is_empty() {
            found = Some((node.item, node.label.to_string()));
        }
        node.depth == 0
    });
    found
}

fn synth_tree(rng: &mut StdRng, budget: usize) -> InputNode {
    let mut counter = 0;
    grow(rng, &mut counter, budget, 0)
}

fn grow(rng: &mut StdRng, counter: &mut u64, budget: usize, depth: u32) -> InputNode {
    *counter += 1;
    let id = ItemId(*counter);
    let label = format!("n{}", *counter);

    if budget <= 1 || depth >= 6 {
        return InputNode {
            label: label.clone(),
            group_label: label,
            color: Default::default(),
            size: rng.random_range(5.0..2000.0),
            children: Vec::new(),
            id,
        };
    }

    let fanout = rng.random_range(2..=6).min(budget - 1).max(1);
    let mut children = Vec::with_capacity(fanout);
    let mut remaining = budget - 1;
    for i in 0..fanout {
        let share = if i + 1 == fanout {
            remaining
        } else {
            (remaining / (fanout - i)).max(1)
        };
        children.push(grow(rng, counter, share, depth + 1));
        remaining = remaining.saturating_sub(share);
    }

    let child_sum: f32 = children.iter().map(|c| c.size).sum();
    // some directories weigh more than their children, exercising the
    // filler path in the layouter
    let size = if rng.random_range(0..5) == 0 {
        child_sum * 1.1
    } else {
        child_sum
    };

    InputNode {
        label: label.clone(),
        group_label: label,
        color: Default::default(),
        size,
        children,
        id,
    }
}

fn count(node: &InputNode) -> usize {
    1 + node.children.iter().map(count).sum::<usize>()
}
