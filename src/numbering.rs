//! Global numbering of cells, nodes and faces.
//!
//! Cells are numbered per block in K-major order. Nodes are colored by BFS
//! over their interface images so that every lattice point of an
//! equivalence class receives one id, no matter which block reaches it
//! first. Faces are numbered per block (internal I, J, K sweeps, then
//! surfaces 1..6) and shared surface faces reuse the id the counterpart
//! side already holds.

use std::collections::{HashMap, VecDeque};

use log::info;

use crate::block::{EdgeId, TopoBlock, NUM_EDGES, NUM_SURFACES};
use crate::connectivity::Topology;
use crate::error::{GlueError, GlueResult};

/// Dense 1-based ids for every entity of a resolved topology.
pub struct Numbering {
    node_count: usize,
    cell_count: usize,
    face_count: usize,
    edge_class_count: usize,
    surface_class_count: usize,
    node_ids: Vec<Vec<usize>>,
    cell_seqs: Vec<Vec<usize>>,
    cell_faces: Vec<Vec<[usize; NUM_SURFACES]>>,
}

impl Numbering {
    /// Run the three numbering sweeps and write the edge/surface class ids
    /// back into the topology, freezing it.
    pub fn build(topo: &mut Topology) -> GlueResult<Self> {
        let cell_seqs = number_cells(topo)?;
        let (node_ids, node_count) = number_nodes(topo)?;
        let (cell_faces, face_count) = number_faces(topo)?;
        let edge_class_count = color_edges(topo);
        let surface_class_count = color_surfaces(topo);

        let numbering = Self {
            node_count,
            cell_count: topo.cell_count(),
            face_count,
            edge_class_count,
            surface_class_count,
            node_ids,
            cell_seqs,
            cell_faces,
        };
        info!(
            "numbered {} nodes, {} faces, {} cells, {} edge classes",
            numbering.node_count, numbering.face_count, numbering.cell_count,
            numbering.edge_class_count
        );
        Ok(numbering)
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn face_count(&self) -> usize {
        self.face_count
    }

    pub fn edge_class_count(&self) -> usize {
        self.edge_class_count
    }

    pub fn surface_class_count(&self) -> usize {
        self.surface_class_count
    }

    /// Global id of node `(i, j, k)` of a block.
    pub fn node_id(&self, block: &TopoBlock, i: usize, j: usize, k: usize) -> usize {
        self.node_ids[block.index() - 1][block.node_offset(i, j, k)]
    }

    /// Global id of cell `(i, j, k)` of a block.
    pub fn cell_seq(&self, block: &TopoBlock, i: usize, j: usize, k: usize) -> usize {
        self.cell_seqs[block.index() - 1][block.cell_offset(i, j, k)]
    }

    /// Global id of face `slot` (1..6) of cell `(i, j, k)` of a block.
    pub fn cell_face(&self, block: &TopoBlock, i: usize, j: usize, k: usize, slot: u8) -> usize {
        self.cell_faces[block.index() - 1][block.cell_offset(i, j, k)][slot as usize - 1]
    }

    /// The eight node ids of a cell in canonical hex ordering.
    pub fn cell_nodes(&self, block: &TopoBlock, i: usize, j: usize, k: usize) -> [usize; 8] {
        [
            self.node_id(block, i, j, k),
            self.node_id(block, i + 1, j, k),
            self.node_id(block, i + 1, j + 1, k),
            self.node_id(block, i, j + 1, k),
            self.node_id(block, i, j, k + 1),
            self.node_id(block, i + 1, j, k + 1),
            self.node_id(block, i + 1, j + 1, k + 1),
            self.node_id(block, i, j + 1, k + 1),
        ]
    }
}

fn number_cells(topo: &Topology) -> GlueResult<Vec<Vec<usize>>> {
    let mut seqs = Vec::with_capacity(topo.nblocks());
    let mut cnt = 0usize;
    for block in topo.blocks() {
        let (ni, nj, nk) = block.dims();
        let mut seq = vec![0usize; block.cell_num()];
        for k in 1..nk {
            for j in 1..nj {
                for i in 1..ni {
                    cnt += 1;
                    seq[block.cell_offset(i, j, k)] = cnt;
                }
            }
        }
        seqs.push(seq);
    }
    if cnt != topo.cell_count() {
        return Err(GlueError::IndexCollision {
            context: format!("{} cells numbered, {} expected", cnt, topo.cell_count()),
        });
    }
    Ok(seqs)
}

fn number_nodes(topo: &Topology) -> GlueResult<(Vec<Vec<usize>>, usize)> {
    let mut ids: Vec<Vec<usize>> = topo
        .blocks()
        .iter()
        .map(|b| vec![0usize; b.node_num()])
        .collect();
    let mut cnt = 0usize;
    let mut queue: VecDeque<(usize, usize, usize, usize)> = VecDeque::new();

    for bi in 1..=topo.nblocks() {
        let (ni, nj, nk) = topo.block(bi).dims();
        for k in 1..=nk {
            for j in 1..=nj {
                for i in 1..=ni {
                    if ids[bi - 1][topo.block(bi).node_offset(i, j, k)] != 0 {
                        continue;
                    }
                    cnt += 1;
                    queue.push_back((bi, i, j, k));
                    while let Some((b2, i2, j2, k2)) = queue.pop_front() {
                        let block = topo.block(b2);
                        let off = block.node_offset(i2, j2, k2);
                        match ids[b2 - 1][off] {
                            0 => ids[b2 - 1][off] = cnt,
                            id if id == cnt => continue,
                            id => {
                                return Err(GlueError::IndexCollision {
                                    context: format!(
                                        "node ({i2},{j2},{k2}) of block {b2} reached as {cnt} but already numbered {id}"
                                    ),
                                })
                            }
                        }
                        for face in block.surfaces_of_node(i2, j2, k2) {
                            let (p, s) = block.node_to_surface(face, i2, j2, k2);
                            if let Some((to, p2, s2)) = topo.shared_node_image(b2, face, p, s) {
                                let target = topo.block(to.block);
                                let (i3, j3, k3) = target.surface_to_node(to.surface, p2, s2);
                                if ids[to.block - 1][target.node_offset(i3, j3, k3)] == 0 {
                                    queue.push_back((to.block, i3, j3, k3));
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    Ok((ids, cnt))
}

fn number_faces(topo: &Topology) -> GlueResult<(Vec<Vec<[usize; NUM_SURFACES]>>, usize)> {
    let mut faces: Vec<Vec<[usize; NUM_SURFACES]>> = topo
        .blocks()
        .iter()
        .map(|b| vec![[0usize; NUM_SURFACES]; b.cell_num()])
        .collect();
    let mut cnt = 0usize;

    for bi in 1..=topo.nblocks() {
        let block = topo.block(bi);
        let (ni, nj, nk) = block.dims();

        // Internal faces normal to I, J, K, in that order.
        for k in 1..nk {
            for j in 1..nj {
                for i in 2..ni {
                    cnt += 1;
                    faces[bi - 1][block.cell_offset(i, j, k)][0] = cnt;
                    faces[bi - 1][block.cell_offset(i - 1, j, k)][1] = cnt;
                }
            }
        }
        for k in 1..nk {
            for i in 1..ni {
                for j in 2..nj {
                    cnt += 1;
                    faces[bi - 1][block.cell_offset(i, j, k)][2] = cnt;
                    faces[bi - 1][block.cell_offset(i, j - 1, k)][3] = cnt;
                }
            }
        }
        for i in 1..ni {
            for j in 1..nj {
                for k in 2..nk {
                    cnt += 1;
                    faces[bi - 1][block.cell_offset(i, j, k)][4] = cnt;
                    faces[bi - 1][block.cell_offset(i, j, k - 1)][5] = cnt;
                }
            }
        }

        // Boundary faces, surfaces 1..6. Shared faces reuse the id when
        // the counterpart block has already been swept.
        for face in 1..=NUM_SURFACES as u8 {
            let (pn, sn) = block.surface_extent(face);
            for s in 1..sn {
                for p in 1..pn {
                    let (ci, cj, ck) = block.boundary_cell(face, p, s);
                    let off = block.cell_offset(ci, cj, ck);
                    let slot = face as usize - 1;
                    debug_assert_eq!(faces[bi - 1][off][slot], 0);
                    let id = match topo.shared_cell_image(bi, face, p, s) {
                        Some((to, pc, sc)) => {
                            let target = topo.block(to.block);
                            let (ti, tj, tk) = target.boundary_cell(to.surface, pc, sc);
                            let existing = faces[to.block - 1][target.cell_offset(ti, tj, tk)]
                                [to.surface as usize - 1];
                            if existing != 0 {
                                existing
                            } else {
                                cnt += 1;
                                cnt
                            }
                        }
                        None => {
                            cnt += 1;
                            cnt
                        }
                    };
                    faces[bi - 1][off][slot] = id;
                }
            }
        }
    }

    if cnt != topo.face_count() {
        return Err(GlueError::IndexCollision {
            context: format!("{} faces numbered, {} expected", cnt, topo.face_count()),
        });
    }
    Ok((faces, cnt))
}

/// Dense ids over edge equivalence classes, written into the blocks.
fn color_edges(topo: &mut Topology) -> usize {
    let mut class_ids: HashMap<usize, usize> = HashMap::new();
    let mut next = 0usize;
    for bi in 1..=topo.nblocks() {
        for e in 1..=NUM_EDGES as u8 {
            let root = topo.edge_class(EdgeId { block: bi, edge: e });
            let id = *class_ids.entry(root).or_insert_with(|| {
                next += 1;
                next
            });
            topo.block_mut(bi).edge_mut(e as i32).global_index = id;
        }
    }
    next
}

/// Dense ids over paired surfaces, written into the blocks.
fn color_surfaces(topo: &mut Topology) -> usize {
    let mut next = 0usize;
    for bi in 1..=topo.nblocks() {
        for f in 1..=NUM_SURFACES as u8 {
            if topo.block(bi).surf(f as i32).global_index != 0 {
                continue;
            }
            next += 1;
            topo.block_mut(bi).surf_mut(f as i32).global_index = next;
            if let Some(other) = topo.block(bi).surf(f as i32).neighbour {
                topo.block_mut(other.block)
                    .surf_mut(other.surface as i32)
                    .global_index = next;
            }
        }
    }
    next
}
