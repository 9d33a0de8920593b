use meshglue::{MapFile, Numbering, Topology};

fn number(text: &str) -> (Topology, Numbering) {
    let map = MapFile::parse_str(text).unwrap();
    let mut topo = Topology::resolve(&map).unwrap();
    let numbering = Numbering::build(&mut topo).unwrap();
    (topo, numbering)
}

#[test]
fn single_cube_counts() {
    let text = "\
1
1 2 2 2
WALL 1 1 1 2 1 2
WALL 1 2 1 2 1 2
WALL 1 3 1 2 1 2
WALL 1 4 1 2 1 2
WALL 1 5 1 2 1 2
WALL 1 6 1 2 1 2
";
    let (topo, numbering) = number(text);
    assert_eq!(numbering.node_count(), 8);
    assert_eq!(numbering.face_count(), 6);
    assert_eq!(numbering.cell_count(), 1);
    assert_eq!(numbering.edge_class_count(), 12);
    assert_eq!(numbering.surface_class_count(), 6);
    assert_eq!(numbering.cell_seq(topo.block(1), 1, 1, 1), 1);
    // Faces numbered in surface order 1..6, no internal faces.
    for slot in 1..=6u8 {
        assert_eq!(
            numbering.cell_face(topo.block(1), 1, 1, 1, slot),
            slot as usize
        );
    }
}

const TWO_CUBES: &str = "\
2
1 2 2 2
2 2 2 2
ONE_TO_ONE 1 2 1 2 1 2 2 1 1 2 1 2 FALSE
";

#[test]
fn glued_cubes_share_four_nodes_and_one_face() {
    let (topo, numbering) = number(TWO_CUBES);
    assert_eq!(numbering.node_count(), 12);
    assert_eq!(numbering.face_count(), 11);
    assert_eq!(numbering.cell_count(), 2);
    assert_eq!(numbering.edge_class_count(), 24 - 4);
    assert_eq!(numbering.surface_class_count(), 11);

    let b1 = topo.block(1);
    let b2 = topo.block(2);
    // The I-MAX plane of block 1 carries the same ids as the I-MIN plane
    // of block 2.
    for k in 1..=2 {
        for j in 1..=2 {
            assert_eq!(
                numbering.node_id(b1, 2, j, k),
                numbering.node_id(b2, 1, j, k)
            );
            assert_ne!(
                numbering.node_id(b1, 1, j, k),
                numbering.node_id(b2, 2, j, k)
            );
        }
    }
    // One shared face id on both sides of the interface.
    assert_eq!(
        numbering.cell_face(b1, 1, 1, 1, 2),
        numbering.cell_face(b2, 1, 1, 1, 1)
    );
    // Block 1 is numbered before block 2.
    assert_eq!(numbering.cell_seq(b1, 1, 1, 1), 1);
    assert_eq!(numbering.cell_seq(b2, 1, 1, 1), 2);
    // Block 1 boundary faces take 1..6; block 2 adds only five fresh ones.
    let shared = numbering.cell_face(b1, 1, 1, 1, 2);
    assert!(shared <= 6);
    for slot in [2u8, 3, 4, 5, 6] {
        assert!(numbering.cell_face(b2, 1, 1, 1, slot) > 6);
    }

    // Paired surfaces share one dense id.
    assert_eq!(
        topo.block(1).surf(2).global_index,
        topo.block(2).surf(1).global_index
    );
    assert_ne!(topo.block(1).surf(1).global_index, 0);
}

#[test]
fn swapped_interface_identifies_six_nodes() {
    // Block 1 I-MAX (2x3 nodes over J, K) onto block 2 J-MIN (3x2 over
    // I, K): J of block 1 runs along K of block 2 and vice versa.
    let text = "\
2
1 2 2 3
2 3 2 2
ONE_TO_ONE 1 2 1 2 1 3 2 3 1 3 1 2 TRUE
";
    let (topo, numbering) = number(text);
    // 12 nodes per block, 6 on the shared surface.
    assert_eq!(numbering.node_count(), 12 + 12 - 6);
    let b1 = topo.block(1);
    let b2 = topo.block(2);
    for j in 1..=2 {
        for k in 1..=3 {
            assert_eq!(
                numbering.node_id(b1, 2, j, k),
                numbering.node_id(b2, k, 1, j)
            );
        }
    }
    // 2 quad cells shared.
    assert_eq!(numbering.face_count(), 11 + 11 - 2);
}

#[test]
fn reversed_interface_mirrors_node_ids() {
    let text = "\
2
1 2 2 2
2 2 2 2
ONE_TO_ONE 1 2 1 2 1 2 2 1 2 1 1 2 FALSE
";
    let (topo, numbering) = number(text);
    assert_eq!(numbering.node_count(), 12);
    let b1 = topo.block(1);
    let b2 = topo.block(2);
    for j in 1..=2usize {
        for k in 1..=2 {
            assert_eq!(
                numbering.node_id(b1, 2, j, k),
                numbering.node_id(b2, 1, 3 - j, k)
            );
        }
    }
}

#[test]
fn three_blocks_around_an_edge_agree_transitively() {
    // Blocks 2 and 3 stack behind block 1's I-MAX; the lattice line where
    // all three meet must carry a single id per node even though blocks 1
    // and 3 share no interface entry.
    let text = "\
3
1 2 2 2
2 2 2 2
3 2 2 2
ONE_TO_ONE 1 2 1 2 1 2 2 1 1 2 1 2 FALSE
ONE_TO_ONE 2 4 1 2 1 2 3 3 1 2 1 2 FALSE
";
    let (topo, numbering) = number(text);
    assert_eq!(numbering.node_count(), 24 - 4 - 4);
    let b1 = topo.block(1);
    let b2 = topo.block(2);
    let b3 = topo.block(3);
    for k in 1..=2 {
        let id = numbering.node_id(b2, 1, 2, k);
        assert_eq!(numbering.node_id(b1, 2, 2, k), id);
        assert_eq!(numbering.node_id(b3, 1, 1, k), id);
    }
    assert_eq!(numbering.face_count(), 36 - 2);
}

#[test]
fn internal_faces_precede_boundary_faces() {
    let text = "\
1
1 3 2 2
";
    let (topo, numbering) = number(text);
    let b = topo.block(1);
    // One internal face between the two cells, numbered first.
    assert_eq!(numbering.cell_face(b, 2, 1, 1, 1), 1);
    assert_eq!(numbering.cell_face(b, 1, 1, 1, 2), 1);
    assert_eq!(numbering.face_count(), 11);
    // Boundary sweep starts after the internal faces.
    assert_eq!(numbering.cell_face(b, 1, 1, 1, 1), 2);
    assert_eq!(numbering.node_count(), 12);
}

#[test]
fn partial_interface_numbers_the_overlap_once() {
    // Only the lower 2x2-node patch of each 3x3 surface is glued.
    let text = "\
2
1 3 3 3
2 3 3 3
ONE_TO_ONE 1 2 1 2 1 2 2 1 1 2 1 2 FALSE
";
    let (topo, numbering) = number(text);
    // 27 nodes each, 4 shared on the patch.
    assert_eq!(numbering.node_count(), 27 + 27 - 4);
    // 36 faces gross per block, one shared quad cell.
    assert_eq!(numbering.face_count(), 36 + 36 - 1);
    let b1 = topo.block(1);
    let b2 = topo.block(2);
    assert_eq!(numbering.node_id(b1, 3, 2, 2), numbering.node_id(b2, 1, 2, 2));
    assert_ne!(numbering.node_id(b1, 3, 3, 3), numbering.node_id(b2, 1, 3, 3));
    assert_eq!(
        numbering.cell_face(b1, 2, 1, 1, 2),
        numbering.cell_face(b2, 1, 1, 1, 1)
    );
    assert_ne!(
        numbering.cell_face(b1, 2, 2, 2, 2),
        numbering.cell_face(b2, 1, 2, 2, 1)
    );
}
