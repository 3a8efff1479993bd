use std::path::{Path, PathBuf};

use flowband::dataset::{read_pair_table, read_weighted_table};
use flowband::{BlockLayout, Sankey, SankeyConfig, SankeyLayout, Side, Theme};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn assert_valid_svg(svg: &str, source: &str) {
    assert!(svg.contains("<svg"), "{source}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{source}: missing </svg tag");
}

fn fruit_layout(config: &SankeyConfig) -> SankeyLayout {
    let sankey = read_pair_table(&fixture("fruit.txt")).expect("fixture read failed");
    sankey
        .layout(&Theme::serif(), config)
        .expect("layout failed")
}

fn side_blocks(layout: &SankeyLayout, side: Side) -> Vec<&BlockLayout> {
    layout.blocks.iter().filter(|b| b.side == side).collect()
}

#[test]
fn fruit_pairs_render_end_to_end() {
    let sankey = read_pair_table(&fixture("fruit.txt")).expect("fixture read failed");
    let svg = sankey
        .to_svg(&Theme::serif(), &SankeyConfig::default())
        .expect("render failed");
    assert_valid_svg(&svg, "fruit.txt");
    // 6 labels per side plus 13 distinct flows.
    assert_eq!(svg.matches("<path").count(), 25);
    assert_eq!(svg.matches("<text").count(), 12);
    for label in ["apple", "banana", "lime", "orange", "kiwi", "blueberry"] {
        assert!(
            svg.contains(&format!(">{label}</text>")),
            "missing caption {label}"
        );
    }
}

#[test]
fn weighted_table_tallies_both_sides() {
    let path = fixture("customers-goods.csv");
    let sankey =
        read_weighted_table(&path, "customer", "good", "revenue").expect("fixture read failed");
    let table = sankey.flow_table().expect("aggregation failed");
    assert_eq!(table.left_labels, ["John", "Mike", "Betty", "Ben"]);
    assert_eq!(table.right_labels, ["fruit", "meat", "drinks", "bread"]);
    assert!((table.left_totals["John"] - 16.5).abs() < 1e-4);
    assert!((table.right_totals["fruit"] - 19.2).abs() < 1e-4);
}

#[test]
fn blocks_stack_contiguously_by_default() {
    let layout = fruit_layout(&SankeyConfig::default());
    for side in [Side::Left, Side::Right] {
        let blocks = side_blocks(&layout, side);
        assert_eq!(blocks.len(), 6);
        for pair in blocks.windows(2) {
            let gap = pair[1].y - (pair[0].y + pair[0].height);
            assert!(gap.abs() < 0.01, "{side}: gap {gap} between stacked blocks");
        }
    }
    // The fixture has equal side sums, so both columns span the same extent.
    let extent = |side| side_blocks(&layout, side).iter().map(|b| b.height).sum::<f32>();
    assert!((extent(Side::Left) - extent(Side::Right)).abs() < 0.01);
}

#[test]
fn strips_partition_their_blocks() {
    let layout = fruit_layout(&SankeyConfig::default());
    for block in &layout.blocks {
        let covered: f32 = layout
            .strips
            .iter()
            .map(|s| match block.side {
                Side::Left if s.left == block.label => s.left_bottom - s.left_top,
                Side::Right if s.right == block.label => s.right_bottom - s.right_top,
                _ => 0.0,
            })
            .sum();
        assert!(
            (covered - block.height).abs() < 0.01,
            "{} {}: strips cover {covered}, block height {}",
            block.side,
            block.label,
            block.height
        );
    }
}

#[test]
fn classic_preset_inserts_gaps() {
    let compact = fruit_layout(&SankeyConfig::default());
    let classic = fruit_layout(&SankeyConfig::classic());
    let first_gap = |layout: &SankeyLayout| {
        let blocks = side_blocks(layout, Side::Left);
        blocks[1].y - (blocks[0].y + blocks[0].height)
    };
    assert!(first_gap(&compact).abs() < 0.01);
    assert!(first_gap(&classic) > 1.0);
}

#[test]
fn single_pair_renders_one_strip() {
    let svg = Sankey::new(["alpha"], ["beta"])
        .to_svg(&Theme::serif(), &SankeyConfig::default())
        .expect("render failed");
    assert_valid_svg(&svg, "single pair");
    // Two blocks and one strip.
    assert_eq!(svg.matches("<path").count(), 3);
}

#[test]
fn explicit_colors_reach_the_svg() {
    let svg = Sankey::new(["a", "b"], ["x", "x"])
        .color("a", "#112233")
        .color("b", "#445566")
        .color("x", "#778899")
        .to_svg(&Theme::serif(), &SankeyConfig::default())
        .expect("render failed");
    assert!(svg.contains("#112233"));
    assert!(svg.contains("#445566"));
    assert!(svg.contains("#778899"));
}

#[test]
fn layout_dump_is_valid_json() {
    let layout = fruit_layout(&SankeyConfig::default());
    let path = std::env::temp_dir().join("flowband-layout-dump.json");
    flowband::write_layout_json(&layout, &path).expect("dump failed");
    let raw = std::fs::read_to_string(&path).expect("dump read failed");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("dump is not JSON");
    let blocks = value["blocks"].as_array().expect("blocks missing");
    assert_eq!(blocks.len(), 12);
    let _ = std::fs::remove_file(&path);
}

#[cfg(feature = "png")]
#[test]
fn png_output_writes_a_file() {
    let sankey = read_pair_table(&fixture("fruit.txt")).expect("fixture read failed");
    let svg = sankey
        .to_svg(&Theme::serif(), &SankeyConfig::default())
        .expect("render failed");
    let path = std::env::temp_dir().join("flowband-smoke.png");
    flowband::write_output_png(&svg, &path, &flowband::RenderConfig::default(), &Theme::serif())
        .expect("png write failed");
    let written = std::fs::metadata(&path).expect("png missing").len();
    assert!(written > 0);
    let _ = std::fs::remove_file(&path);
}
