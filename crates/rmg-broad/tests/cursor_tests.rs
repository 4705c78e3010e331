// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use rmg_broad::{Aabb, AabbTree, TreeError};

fn rect(x: f32, y: f32, w: f32, h: f32) -> Aabb {
    Aabb::from_origin_extents(x, y, w, h)
}

#[test]
fn mutation_between_advances_fails_loudly() {
    let mut tree = AabbTree::new();
    let _ = tree.insert(rect(0.0, 0.0, 10.0, 10.0), "A");

    let mut cursor = tree.query_cursor(&rect(-50.0, -50.0, 100.0, 100.0));
    let _ = tree.insert(rect(20.0, 20.0, 10.0, 10.0), "B");

    assert_eq!(
        cursor.next_in(&tree).err(),
        Some(TreeError::ConcurrentModification)
    );
    // The failure is sticky; the cursor never resumes with stale state.
    assert_eq!(
        cursor.next_in(&tree).err(),
        Some(TreeError::ConcurrentModification)
    );
}

#[test]
fn removal_invalidates_an_in_flight_cursor() {
    let mut tree = AabbTree::new();
    let a = tree.insert(rect(0.0, 0.0, 10.0, 10.0), "A");
    let _b = tree.insert(rect(20.0, 0.0, 10.0, 10.0), "B");

    let mut cursor = tree.iter_cursor();
    assert!(cursor.next_in(&tree).expect("first advance").is_some());

    tree.remove(a);
    assert_eq!(
        cursor.next_in(&tree).err(),
        Some(TreeError::ConcurrentModification)
    );
}

#[test]
fn exhausted_cursor_refuses_further_advances() {
    let mut tree = AabbTree::new();
    let _ = tree.insert(rect(0.0, 0.0, 10.0, 10.0), "A");

    let mut cursor = tree.iter_cursor();
    assert!(cursor.next_in(&tree).expect("the leaf").is_some());
    assert!(cursor.next_in(&tree).expect("end of sequence").is_none());
    assert_eq!(cursor.next_in(&tree).err(), Some(TreeError::CursorExhausted));
}

#[test]
fn in_place_update_does_not_invalidate_cursors() {
    let mut tree = AabbTree::new();
    let a = tree.insert(rect(0.0, 0.0, 10.0, 10.0), "A");
    let _b = tree.insert(rect(50.0, 50.0, 10.0, 10.0), "B");

    let mut cursor = tree.iter_cursor();
    assert!(cursor.next_in(&tree).expect("first advance").is_some());

    // A contained update rewrites one stored key without touching structure,
    // so the cursor keeps going.
    assert!(!tree.update(a, rect(1.0, 1.0, 8.0, 8.0)));
    assert!(cursor.next_in(&tree).expect("second advance").is_some());
    assert!(cursor.next_in(&tree).expect("end").is_none());
}

#[test]
fn cursor_and_iterator_walk_the_same_sequence() {
    let mut tree = AabbTree::new();
    for i in 0..16u32 {
        let _ = tree.insert(rect(i as f32 * 4.0, 0.0, 6.0, 6.0), i);
    }
    let window = rect(0.0, 0.0, 40.0, 10.0);

    let from_iter: Vec<u32> = tree.query(&window).map(|(_, &v)| v).collect();

    let mut from_cursor = Vec::new();
    let mut cursor = tree.query_cursor(&window);
    while let Some((_, &v)) = cursor.next_in(&tree).expect("no mutation") {
        from_cursor.push(v);
    }
    assert_eq!(from_iter, from_cursor);
    assert!(!from_iter.is_empty());
}

#[test]
fn node_cursor_sees_every_node_once() {
    let mut tree = AabbTree::new();
    for i in 0..8u32 {
        let _ = tree.insert(rect(i as f32 * 10.0, 0.0, 5.0, 5.0), i);
    }

    let mut seen = 0usize;
    let mut cursor = tree.debug_cursor(None);
    while cursor.next_in(&tree).expect("no mutation").is_some() {
        seen += 1;
    }
    assert_eq!(seen, tree.node_count());
    assert_eq!(cursor.next_in(&tree).err(), Some(TreeError::CursorExhausted));
}
