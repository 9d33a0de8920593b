use meshglue::{
    AxisSign, EdgeId, GlueError, MapFile, SurfaceId, Topology,
};

fn resolve(text: &str) -> Result<Topology, GlueError> {
    Topology::resolve(&MapFile::parse_str(text).unwrap())
}

const TWO_CUBES: &str = "\
2
1 2 2 2
2 2 2 2
ONE_TO_ONE 1 2 1 2 1 2 2 1 1 2 1 2 FALSE
";

#[test]
fn pairs_neighbour_surfaces() {
    let topo = resolve(TWO_CUBES).unwrap();
    assert_eq!(
        topo.block(1).surf(2).neighbour,
        Some(SurfaceId { block: 2, surface: 1 })
    );
    assert_eq!(
        topo.block(2).surf(1).neighbour,
        Some(SurfaceId { block: 1, surface: 2 })
    );
    assert_eq!(topo.block(1).surf(1).neighbour, None);
    // Negative surface indexing reaches the same record.
    assert_eq!(
        topo.block(1).surf(-5).neighbour,
        Some(SurfaceId { block: 2, surface: 1 })
    );
}

#[test]
fn aligned_interface_is_identity() {
    let topo = resolve(TWO_CUBES).unwrap();
    let link = topo.link(SurfaceId { block: 1, surface: 2 }).unwrap();
    assert!(!link.orientation.swap);
    assert_eq!(link.orientation.sign_pri, AxisSign::Aligned);
    assert_eq!(link.orientation.sign_sec, AxisSign::Aligned);
    assert_eq!(link.image_of_node(1, 1), Some((1, 1)));
    assert_eq!(link.image_of_node(2, 1), Some((2, 1)));
    assert_eq!(link.image_of_node(1, 2), Some((1, 2)));
    assert_eq!(link.image_of_node(3, 1), None);
    assert_eq!(link.image_of_cell(1, 1), Some((1, 1)));
}

#[test]
fn reversed_primary_flips_the_lattice() {
    let text = "\
2
1 2 3 2
2 2 3 2
ONE_TO_ONE 1 2 1 3 1 2 2 1 3 1 1 2 FALSE
";
    let topo = resolve(text).unwrap();
    let link = topo.link(SurfaceId { block: 1, surface: 2 }).unwrap();
    assert_eq!(link.orientation.sign_pri, AxisSign::Reversed);
    assert_eq!(link.orientation.sign_sec, AxisSign::Aligned);
    for j in 1..=3 {
        for k in 1..=2 {
            assert_eq!(link.image_of_node(j, k), Some((4 - j, k)));
        }
    }
    // The two directed links invert each other.
    let back = topo.link(SurfaceId { block: 2, surface: 1 }).unwrap();
    for j in 1..=3 {
        for k in 1..=2 {
            let (p, s) = link.image_of_node(j, k).unwrap();
            assert_eq!(back.image_of_node(p, s), Some((j, k)));
        }
    }
}

#[test]
fn swapped_axes_cross_over() {
    // Block 1 I-MAX spans 2x3 nodes (J, K); block 2 J-MIN spans 3x2 (I, K).
    let text = "\
2
1 2 2 3
2 3 2 2
ONE_TO_ONE 1 2 1 2 1 3 2 3 1 3 1 2 TRUE
";
    let topo = resolve(text).unwrap();
    let link = topo.link(SurfaceId { block: 1, surface: 2 }).unwrap();
    assert!(link.orientation.swap);
    for j in 1..=2 {
        for k in 1..=3 {
            assert_eq!(link.image_of_node(j, k), Some((k, j)));
        }
    }
    let back = topo.link(SurfaceId { block: 2, surface: 3 }).unwrap();
    assert_eq!(back.image_of_node(3, 2), Some((2, 3)));
}

#[test]
fn rejects_duplicate_interface() {
    let text = "\
3
1 2 2 2
2 2 2 2
3 2 2 2
ONE_TO_ONE 1 2 1 2 1 2 2 1 1 2 1 2 FALSE
ONE_TO_ONE 1 2 1 2 1 2 3 1 1 2 1 2 FALSE
";
    assert!(matches!(
        resolve(text),
        Err(GlueError::DuplicateInterface { .. })
    ));
}

#[test]
fn rejects_self_paired_surface() {
    let text = "\
1
1 2 2 2
ONE_TO_ONE 1 2 1 2 1 2 1 2 1 2 1 2 FALSE
";
    assert!(matches!(
        resolve(text),
        Err(GlueError::DuplicateInterface { .. })
    ));
}

#[test]
fn rejects_axis_counts_that_cannot_pair() {
    // Equal products (6 quad cells each) but 3x4 against 4x3 nodes with
    // swap FALSE cannot be a lattice bijection.
    let text = "\
2
1 2 3 4
2 2 4 3
ONE_TO_ONE 1 2 1 3 1 4 2 1 1 4 1 3 FALSE
";
    assert!(matches!(
        resolve(text),
        Err(GlueError::CounterpartNotFound { .. })
    ));
}

#[test]
fn edge_classes_merge_across_aligned_interface() {
    let topo = resolve(TWO_CUBES).unwrap();
    // Block 1 face 2 frame [10, 11, 6, 7] lands on block 2 face 1 frame
    // [9, 12, 5, 8] without any permutation.
    for (ea, eb) in [(10u8, 9u8), (11, 12), (6, 5), (7, 8)] {
        assert!(topo.same_edge_class(
            EdgeId { block: 1, edge: ea },
            EdgeId { block: 2, edge: eb }
        ));
    }
    assert!(!topo.same_edge_class(
        EdgeId { block: 1, edge: 10 },
        EdgeId { block: 2, edge: 12 }
    ));
    assert!(!topo.same_edge_class(
        EdgeId { block: 1, edge: 1 },
        EdgeId { block: 2, edge: 1 }
    ));
}

#[test]
fn corner_classes_merge_across_aligned_interface() {
    let topo = resolve(TWO_CUBES).unwrap();
    // Block 1 corners on I-MAX pair with block 2 corners on I-MIN.
    for (ca, cb) in [(2u8, 1u8), (3, 4), (6, 5), (7, 8)] {
        assert_eq!(topo.corner_class(1, ca), topo.corner_class(2, cb));
    }
    assert_ne!(topo.corner_class(1, 1), topo.corner_class(2, 1));
}

#[test]
fn counts_subtract_shared_faces() {
    let topo = resolve(TWO_CUBES).unwrap();
    assert_eq!(topo.cell_count(), 2);
    // 12 faces per cube, one shared.
    assert_eq!(topo.face_count(), 11);
}

/// Two blocks glued into a ring along I and K. Consistent as declared;
/// reversing J on one of the four interfaces creates a contradictory
/// cycle over the J-aligned frame edges.
const TORUS_RING: &str = "\
2
1 2 2 2
2 2 2 2
ONE_TO_ONE 1 2 1 2 1 2 2 1 1 2 1 2 FALSE
ONE_TO_ONE 1 1 1 2 1 2 2 2 1 2 1 2 FALSE
ONE_TO_ONE 1 5 1 2 1 2 2 6 1 2 1 2 FALSE
ONE_TO_ONE 1 6 1 2 1 2 2 5 1 2 1 2 FALSE
";

#[test]
fn ring_gluing_is_consistent() {
    let topo = resolve(TORUS_RING).unwrap();
    assert_eq!(topo.face_count(), 24 - 4);
}

#[test]
fn rejects_contradictory_orientations() {
    let twisted = TORUS_RING.replace(
        "ONE_TO_ONE 1 6 1 2 1 2 2 5 1 2 1 2 FALSE",
        "ONE_TO_ONE 1 6 1 2 1 2 2 5 1 2 2 1 FALSE",
    );
    assert!(matches!(
        resolve(&twisted),
        Err(GlueError::OrientationInconsistent { .. })
    ));
}

#[test]
fn partial_patch_keeps_edges_separate() {
    // A quarter patch on a 3x3 surface: nodes map, edges stay distinct.
    let text = "\
2
1 3 3 3
2 3 3 3
ONE_TO_ONE 1 2 1 2 1 2 2 1 1 2 1 2 FALSE
";
    let topo = resolve(text).unwrap();
    let link = topo.link(SurfaceId { block: 1, surface: 2 }).unwrap();
    assert_eq!(link.image_of_node(2, 2), Some((2, 2)));
    assert_eq!(link.image_of_node(3, 3), None);
    assert!(!topo.same_edge_class(
        EdgeId { block: 1, edge: 10 },
        EdgeId { block: 2, edge: 9 }
    ));
}
