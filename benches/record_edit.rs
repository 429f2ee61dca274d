//! Benchmark for edit aggregation.
//!
//! Measures recording one leaf edit per section of a wide, three-level tree,
//! followed by a single edit near the root that compacts every section anchor.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tree_change_aggregator::{
    ArenaTree, ChangeAggregator, ChangeKind, ChangeRecord, NodeId, TreeNavigation,
};

/// Build R{S0{L0..L3}, S1{..}, ...} with `sections` sections, returning the leaves.
fn generate_sections(sections: usize) -> (ArenaTree, Vec<NodeId>) {
    let mut tree = ArenaTree::new("document", 0);
    let root = tree.root();
    let mut leaves = Vec::with_capacity(sections * 4);
    for i in 0..sections {
        let section = tree.add_child(root, format!("section_{}", i), 1);
        for j in 0..4 {
            leaves.push(tree.add_child(section, format!("leaf_{}_{}", i, j), 8));
        }
    }
    (tree, leaves)
}

fn benchmark_leaf_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_edit");

    for sections in [10, 100, 500].iter() {
        let (tree, leaves) = generate_sections(*sections);

        group.bench_with_input(
            BenchmarkId::new("one_leaf_per_section", sections),
            &(&tree, &leaves),
            |b, (tree, leaves)| {
                b.iter(|| {
                    let mut changes = ChangeAggregator::new(tree.root());
                    for leaf in leaves.iter().step_by(4) {
                        let record =
                            ChangeRecord::create(ChangeKind::ContentsChanged, *leaf, *tree, None);
                        changes.record_edit(*tree, *leaf, record).expect("well-formed tree");
                    }
                    black_box(changes.len())
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("compact_into_root", sections),
            &(&tree, &leaves),
            |b, (tree, leaves)| {
                b.iter(|| {
                    let mut changes = ChangeAggregator::new(tree.root());
                    for leaf in leaves.iter().step_by(4) {
                        let record =
                            ChangeRecord::create(ChangeKind::ContentsChanged, *leaf, *tree, None);
                        changes.record_edit(*tree, *leaf, record).expect("well-formed tree");
                    }
                    let first_section = tree.children(tree.root())[0];
                    let record = ChangeRecord::create(
                        ChangeKind::ContentsChanged,
                        first_section,
                        *tree,
                        None,
                    );
                    changes
                        .record_edit(*tree, first_section, record)
                        .expect("well-formed tree");
                    black_box(changes.len())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_leaf_edits);
criterion_main!(benches);
