/// Diagnostic tool to verify tree → layout pipeline
///
/// Usage: debug-layout [PATHS_FILE|-] [WIDTH] [HEIGHT]
/// Without a paths file a synthetic tree is generated.
use std::collections::HashMap;
use std::io::Read;

use anyhow::{Context, Result};
use nestmap::layout::{compute_layout, find_overlaps, Heuristics, LayoutOptions, RenderMode};
use nestmap::tree::{self, arena::Tree};

fn synthetic_paths() -> Vec<String> {
    let mut paths = Vec::new();
    for dir in 0..6 {
        for sub in 0..(dir % 3 + 1) {
            for file in 0..(dir * 2 + sub + 1) {
                paths.push(format!("dir{dir}/sub{sub}/file{file}"));
            }
        }
        paths.push(format!("dir{dir}/README"));
    }
    paths.push("top-level.txt".to_string());
    paths
}

fn load_tree(source: Option<&str>) -> Result<Tree> {
    let text = match source {
        None => return Ok(tree::build_tree("synthetic", synthetic_paths().iter().map(String::as_str))),
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading paths from stdin")?;
            buf
        }
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
    };
    Ok(tree::build_tree(source.unwrap_or("input"), text.lines()))
}

fn parse_dimension(arg: Option<String>, default: f32, name: &str) -> Result<f32> {
    match arg {
        Some(s) => s.parse::<f32>().with_context(|| format!("invalid {name} '{s}'")),
        None => Ok(default),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("nestmap=debug".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let source = args.next();
    let width = parse_dimension(args.next(), 1280.0, "width")?;
    let height = parse_dimension(args.next(), 800.0, "height")?;

    println!("=== DIAGNOSTIC: Tree → Layout Pipeline ===");

    let mut tree = load_tree(source.as_deref())?;
    let root = tree.root;
    println!("\n[1] Tree built: {} nodes, {} leaves", tree.len(), tree.get(root).weight);

    let options = LayoutOptions {
        header_height: 18.0,
        padding: 4.0,
        leaf_min_width: 48.0,
        leaf_min_height: 18.0,
        leaf_pref_width: 96.0,
        leaf_pref_height: 28.0,
        leaf_min_aspect_ratio: 0.5,
        leaf_max_aspect_ratio: 6.0,
    };
    let heuristics = Heuristics::default();

    let start = std::time::Instant::now();
    let layout = compute_layout(&mut tree, root, width, height, &options, &heuristics)?;
    println!(
        "\n[2] Layout computed in {:.2}ms: {} of {} nodes placed in {:.0}x{:.0}",
        start.elapsed().as_secs_f64() * 1000.0,
        layout.len(),
        tree.len(),
        width,
        height
    );

    let mut modes: HashMap<RenderMode, usize> = HashMap::new();
    for node in &layout.nodes {
        *modes.entry(node.mode).or_default() += 1;
    }
    println!(
        "\n[3] Render modes: text={} box={} none={}",
        modes.get(&RenderMode::Text).copied().unwrap_or(0),
        modes.get(&RenderMode::Box).copied().unwrap_or(0),
        modes.get(&RenderMode::None).copied().unwrap_or(0)
    );
    println!(
        "    Hidden: {} direct children of root, {} nodes overall",
        layout.root().hidden_children,
        layout.root().hidden_descendants
    );

    // Show top 10 largest rectangles
    println!("\n[4] Top 10 largest rectangles by area:");
    let mut sorted: Vec<_> = layout.nodes.iter().collect();
    sorted.sort_by(|a, b| b.rect.area().total_cmp(&a.rect.area()));
    for (i, node) in sorted.iter().take(10).enumerate() {
        println!(
            "    [{}] '{}' - {:.1}x{:.1} at ({:.1}, {:.1}) depth={} weight={} mode={:?} hidden={}",
            i,
            tree.display_name(node.node),
            node.rect.w,
            node.rect.h,
            node.rect.x,
            node.rect.y,
            node.depth,
            tree.get(node.node).weight,
            node.mode,
            node.hidden_children
        );
    }

    // Check for anomalies
    println!("\n[5] Checking for anomalies:");
    let escapes = layout
        .nodes
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, node)| {
            node.parent
                .map(|p| !layout.content_rect(p, &options).contains(&node.rect, 0.01))
                .unwrap_or(false)
        })
        .count();
    println!("    Children outside parent content: {}", escapes);
    println!(
        "    Overlap corrections: {}, remaining after pass: {}",
        layout.overlap.corrections, layout.overlap.remaining
    );
    println!(
        "    Overlapping pairs now: {}",
        find_overlaps(&layout, heuristics.overlap_epsilon).len()
    );

    let covered: f32 = layout
        .nodes
        .iter()
        .filter(|n| !n.is_container && n.mode != RenderMode::None)
        .map(|n| n.rect.area())
        .sum();
    let viewport_area = (width * height).max(1.0);
    println!("    Leaf coverage: {:.1}%", covered / viewport_area * 100.0);

    Ok(())
}
