// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use rmg_broad::{Aabb, AabbTree, ProxyId, Vec2};

// Random operation sequences against the tree, with every structural
// invariant re-validated after each step. The seed is pinned so failures
// reproduce across machines and CI; override locally with PROPTEST_SEED or
// by editing SEED_BYTES.

#[derive(Debug, Clone)]
enum Op {
    Insert { x: f32, y: f32, w: f32, h: f32 },
    Remove { pick: usize },
    Update { pick: usize, x: f32, y: f32 },
    Move { pick: usize, x: f32, y: f32, dx: f32, dy: f32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let coord = -100.0f32..100.0f32;
    let extent = 0.1f32..20.0f32;
    let delta = -5.0f32..5.0f32;
    prop_oneof![
        3 => (coord.clone(), coord.clone(), extent.clone(), extent.clone())
            .prop_map(|(x, y, w, h)| Op::Insert { x, y, w, h }),
        1 => any::<usize>().prop_map(|pick| Op::Remove { pick }),
        1 => (any::<usize>(), coord.clone(), coord.clone())
            .prop_map(|(pick, x, y)| Op::Update { pick, x, y }),
        1 => (any::<usize>(), coord.clone(), coord, delta.clone(), delta)
            .prop_map(|(pick, x, y, dx, dy)| Op::Move { pick, x, y, dx, dy }),
    ]
}

#[test]
fn random_op_sequences_uphold_every_invariant() {
    const SEED_BYTES: [u8; 32] = [
        0x42, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0,
    ];

    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(PropConfig::default(), rng);

    let ops = proptest::collection::vec(op_strategy(), 1..120);

    runner
        .run(&ops, |ops| {
            let mut tree: AabbTree<u32> = AabbTree::with_capacity(4);
            let mut live: Vec<ProxyId> = Vec::new();

            for (step, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Insert { x, y, w, h } => {
                        let key = Aabb::from_origin_extents(x, y, w, h);
                        live.push(tree.insert(key, step as u32));
                    }
                    Op::Remove { pick } => {
                        if !live.is_empty() {
                            let slot = pick % live.len();
                            tree.remove(live.swap_remove(slot));
                        }
                    }
                    Op::Update { pick, x, y } => {
                        if !live.is_empty() {
                            let slot = pick % live.len();
                            let _ = tree.update(
                                live[slot],
                                Aabb::from_origin_extents(x, y, 2.0, 2.0),
                            );
                        }
                    }
                    Op::Move { pick, x, y, dx, dy } => {
                        if !live.is_empty() {
                            let slot = pick % live.len();
                            let _ = tree.move_proxy(
                                live[slot],
                                Aabb::from_origin_extents(x, y, 2.0, 2.0),
                                Vec2::new(dx, dy),
                            );
                        }
                    }
                }

                prop_assert!(tree.validate().is_ok(), "invariants broken: {:?}", tree.validate());
                prop_assert_eq!(tree.len(), live.len());
                if live.is_empty() {
                    prop_assert!(tree.bounds().is_none());
                    prop_assert_eq!(tree.node_count(), 0);
                } else {
                    prop_assert_eq!(tree.node_count(), 2 * live.len() - 1);
                    let bounds = tree.bounds().expect("bounds on non-empty tree");
                    prop_assert_eq!(tree.query(&bounds).count(), live.len());
                }
            }
            Ok(())
        })
        .expect("property holds");
}
