//! Unstructured mesh records and their assembly from a numbered topology
//! plus PLOT3D coordinates.
//!
//! Faces are wound by the right-hand convention: the quad normal computed
//! from the stored node order points from `right_cell` toward `left_cell`,
//! which on boundary faces (`left_cell` = 0) is outward of the domain.

use std::fmt;
use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use crate::bc::BcType;
use crate::block::NUM_SURFACES;
use crate::connectivity::Topology;
use crate::error::{GlueError, GlueResult};
use crate::geom::{self, Point};
use crate::nmf;
use crate::numbering::Numbering;
use crate::plot3d::{self, GridBlock};

/// Node order of each cell face, as indices into the canonical 8-node hex
/// ordering, for surfaces 1..6. Internal faces normal to I, J and K use
/// the surface 1, 3 and 5 orderings of their high-side cell.
const SURFACE_FACE_NODES: [[usize; 4]; NUM_SURFACES] = [
    [0, 4, 7, 3], // 1: I-MIN
    [1, 2, 6, 5], // 2: I-MAX
    [5, 4, 0, 1], // 3: J-MIN
    [2, 3, 7, 6], // 4: J-MAX
    [3, 2, 1, 0], // 5: K-MIN
    [7, 4, 5, 6], // 6: K-MAX
];

/// A mesh node.
#[derive(Clone, Debug, Serialize)]
pub struct Node {
    /// 1-based global id.
    pub id: usize,
    pub coordinate: Point,
}

/// A quadrilateral mesh face with its two cell neighbours.
#[derive(Clone, Debug, Serialize)]
pub struct Face {
    /// 1-based global id.
    pub id: usize,
    /// Node ids wound outward from `right_cell`.
    pub nodes: [usize; 4],
    /// Cell on the low side, 0 for an external boundary.
    pub left_cell: usize,
    /// Cell on the high side.
    pub right_cell: usize,
    /// Boundary marker; `None` on interior faces.
    pub bc: Option<BcType>,
}

impl Face {
    pub fn is_boundary(&self) -> bool {
        self.left_cell == 0 || self.right_cell == 0
    }
}

/// A hexahedral mesh cell.
#[derive(Clone, Debug, Serialize)]
pub struct Cell {
    /// 1-based global id.
    pub id: usize,
    /// Node ids in canonical hex ordering.
    pub nodes: [usize; 8],
    /// Face ids in surface order I-MIN .. K-MAX.
    pub faces: [usize; NUM_SURFACES],
}

/// Connectivity-complete unstructured mesh.
#[derive(Clone, Debug, Serialize)]
pub struct UnstructuredMesh {
    pub nodes: Vec<Node>,
    pub faces: Vec<Face>,
    pub cells: Vec<Cell>,
}

impl UnstructuredMesh {
    /// Merge PLOT3D coordinates into a numbered topology and emit the
    /// node, face and cell records.
    pub fn assemble(
        topo: &Topology,
        numbering: &Numbering,
        grid: &[GridBlock],
    ) -> GlueResult<Self> {
        check_dimensions(topo, grid)?;

        let nodes = collect_nodes(topo, numbering, grid)?;
        let cells = collect_cells(topo, numbering)?;
        let faces = collect_faces(topo, numbering)?;

        info!(
            "assembled mesh: {} nodes, {} faces, {} cells",
            nodes.len(),
            faces.len(),
            cells.len()
        );
        Ok(Self { nodes, faces, cells })
    }

    /// Centroid of a cell as the mean of its eight nodes.
    pub fn cell_centroid(&self, cell: &Cell) -> Point {
        let mut sum = nalgebra::Vector3::zeros();
        for &n in &cell.nodes {
            sum += self.nodes[n - 1].coordinate.coords;
        }
        Point::from(sum / 8.0)
    }

    /// Run the structural and orientation checks and summarize the mesh.
    pub fn report(&self) -> MeshReport {
        let mut boundary = 0usize;
        let mut interior = 0usize;
        let mut incidence_ok = true;
        let mut ids_ok = true;
        let mut orientation_ok = true;

        for (idx, node) in self.nodes.iter().enumerate() {
            if node.id != idx + 1 {
                ids_ok = false;
            }
        }
        for (idx, cell) in self.cells.iter().enumerate() {
            if cell.id != idx + 1 {
                ids_ok = false;
            }
            for &n in &cell.nodes {
                if n < 1 || n > self.nodes.len() {
                    ids_ok = false;
                }
            }
            for &f in &cell.faces {
                if f < 1 || f > self.faces.len() {
                    ids_ok = false;
                } else {
                    let face = &self.faces[f - 1];
                    if face.left_cell != cell.id && face.right_cell != cell.id {
                        incidence_ok = false;
                    }
                }
            }
        }

        // Every face id must be referenced twice (interior) or once
        // (boundary) across the cell face lists.
        let mut refs = vec![0usize; self.faces.len()];
        for cell in &self.cells {
            for &f in &cell.faces {
                if f >= 1 && f <= self.faces.len() {
                    refs[f - 1] += 1;
                }
            }
        }

        for (idx, face) in self.faces.iter().enumerate() {
            if face.id != idx + 1 {
                ids_ok = false;
            }
            if face.is_boundary() {
                boundary += 1;
                if refs[idx] != 1 {
                    incidence_ok = false;
                }
            } else {
                interior += 1;
                if refs[idx] != 2 {
                    incidence_ok = false;
                }
            }
            if face.left_cell == face.right_cell || face.right_cell == 0 {
                incidence_ok = false;
            }
            if !self.face_oriented(face) {
                orientation_ok = false;
            }
        }

        MeshReport {
            node_count: self.nodes.len(),
            face_count: self.faces.len(),
            cell_count: self.cells.len(),
            boundary_face_count: boundary,
            interior_face_count: interior,
            ids_ok,
            incidence_ok,
            orientation_ok,
        }
    }

    /// True when the face normal points from `right_cell` toward
    /// `left_cell` (outward on boundaries). Degenerate quads pass.
    fn face_oriented(&self, face: &Face) -> bool {
        let p = |n: usize| self.nodes[n - 1].coordinate;
        let [n1, n2, n3, n4] = face.nodes;
        let normal = geom::quadrilateral_normal(&p(n1), &p(n2), &p(n3), &p(n4));
        if normal == nalgebra::Vector3::zeros() {
            return true;
        }
        if face.right_cell == 0 {
            return false;
        }
        let right = self.cell_centroid(&self.cells[face.right_cell - 1]);
        let toward = if face.left_cell == 0 {
            geom::quadrilateral_center(&p(n1), &p(n2), &p(n3), &p(n4)) - right
        } else {
            self.cell_centroid(&self.cells[face.left_cell - 1]) - right
        };
        normal.dot(&toward) > 0.0
    }
}

/// Counts and consistency flags of an assembled mesh.
#[derive(Clone, Debug, Serialize)]
pub struct MeshReport {
    pub node_count: usize,
    pub face_count: usize,
    pub cell_count: usize,
    pub boundary_face_count: usize,
    pub interior_face_count: usize,
    pub ids_ok: bool,
    pub incidence_ok: bool,
    pub orientation_ok: bool,
}

impl MeshReport {
    pub fn is_valid(&self) -> bool {
        self.ids_ok && self.incidence_ok && self.orientation_ok
    }
}

impl fmt::Display for MeshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh report:")?;
        writeln!(f, "  nodes: {}", self.node_count)?;
        writeln!(
            f,
            "  faces: {} ({} interior, {} boundary)",
            self.face_count, self.interior_face_count, self.boundary_face_count
        )?;
        writeln!(f, "  cells: {}", self.cell_count)?;
        write!(
            f,
            "  ids {}, incidence {}, orientation {}",
            flag(self.ids_ok),
            flag(self.incidence_ok),
            flag(self.orientation_ok)
        )
    }
}

fn flag(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "BROKEN"
    }
}

/// Full conversion: map file plus ASCII PLOT3D grid to unstructured mesh.
pub fn convert(nmf_path: impl AsRef<Path>, grid_path: impl AsRef<Path>) -> GlueResult<UnstructuredMesh> {
    let map = nmf::read_nmf(nmf_path)?;
    let mut topo = Topology::resolve(&map)?;
    let numbering = Numbering::build(&mut topo)?;
    let grid = plot3d::read_ascii(grid_path)?;
    UnstructuredMesh::assemble(&topo, &numbering, &grid)
}

fn check_dimensions(topo: &Topology, grid: &[GridBlock]) -> GlueResult<()> {
    if grid.len() != topo.nblocks() {
        return Err(GlueError::DimensionInconsistent {
            context: format!(
                "map file declares {} blocks but the grid holds {}",
                topo.nblocks(),
                grid.len()
            ),
        });
    }
    for (n, g) in grid.iter().enumerate() {
        let block = topo.block(n + 1);
        if block.dims() != g.dims() {
            let (ni, nj, nk) = block.dims();
            let (gi, gj, gk) = g.dims();
            return Err(GlueError::DimensionInconsistent {
                context: format!(
                    "block {}: map file says {}x{}x{} nodes, grid says {}x{}x{}",
                    n + 1,
                    ni,
                    nj,
                    nk,
                    gi,
                    gj,
                    gk
                ),
            });
        }
    }
    Ok(())
}

fn collect_nodes(
    topo: &Topology,
    numbering: &Numbering,
    grid: &[GridBlock],
) -> GlueResult<Vec<Node>> {
    let mut nodes: Vec<Option<Node>> = vec![None; numbering.node_count()];
    for bi in 1..=topo.nblocks() {
        let block = topo.block(bi);
        let g = &grid[bi - 1];
        let (ni, nj, nk) = block.dims();
        for k in 1..=nk {
            for j in 1..=nj {
                for i in 1..=ni {
                    let id = numbering.node_id(block, i, j, k);
                    if nodes[id - 1].is_none() {
                        nodes[id - 1] = Some(Node {
                            id,
                            coordinate: g.point(i, j, k),
                        });
                    }
                }
            }
        }
    }
    nodes
        .into_iter()
        .enumerate()
        .map(|(idx, n)| {
            n.ok_or_else(|| GlueError::IndexCollision {
                context: format!("node id {} was never populated", idx + 1),
            })
        })
        .collect()
}

fn collect_cells(topo: &Topology, numbering: &Numbering) -> GlueResult<Vec<Cell>> {
    let mut cells: Vec<Option<Cell>> = vec![None; numbering.cell_count()];
    for bi in 1..=topo.nblocks() {
        let block = topo.block(bi);
        let (ni, nj, nk) = block.dims();
        for k in 1..nk {
            for j in 1..nj {
                for i in 1..ni {
                    let id = numbering.cell_seq(block, i, j, k);
                    let mut faces = [0usize; NUM_SURFACES];
                    for slot in 1..=NUM_SURFACES as u8 {
                        faces[slot as usize - 1] = numbering.cell_face(block, i, j, k, slot);
                    }
                    cells[id - 1] = Some(Cell {
                        id,
                        nodes: numbering.cell_nodes(block, i, j, k),
                        faces,
                    });
                }
            }
        }
    }
    cells
        .into_iter()
        .enumerate()
        .map(|(idx, c)| {
            c.ok_or_else(|| GlueError::IndexCollision {
                context: format!("cell id {} was never populated", idx + 1),
            })
        })
        .collect()
}

fn face_nodes(cell_nodes: &[usize; 8], surface: u8) -> [usize; 4] {
    SURFACE_FACE_NODES[surface as usize - 1].map(|n| cell_nodes[n])
}

fn collect_faces(topo: &Topology, numbering: &Numbering) -> GlueResult<Vec<Face>> {
    let mut faces: Vec<Option<Face>> = vec![None; numbering.face_count()];

    for bi in 1..=topo.nblocks() {
        let block = topo.block(bi);
        let (ni, nj, nk) = block.dims();

        // Internal sweeps. The face at a given station belongs to the
        // high-side cell, the low-side cell becomes its left neighbour.
        for k in 1..nk {
            for j in 1..nj {
                for i in 2..ni {
                    let id = numbering.cell_face(block, i, j, k, 1);
                    place_internal(
                        &mut faces,
                        id,
                        face_nodes(&numbering.cell_nodes(block, i, j, k), 1),
                        numbering.cell_seq(block, i - 1, j, k),
                        numbering.cell_seq(block, i, j, k),
                    )?;
                }
            }
        }
        for k in 1..nk {
            for i in 1..ni {
                for j in 2..nj {
                    let id = numbering.cell_face(block, i, j, k, 3);
                    place_internal(
                        &mut faces,
                        id,
                        face_nodes(&numbering.cell_nodes(block, i, j, k), 3),
                        numbering.cell_seq(block, i, j - 1, k),
                        numbering.cell_seq(block, i, j, k),
                    )?;
                }
            }
        }
        for i in 1..ni {
            for j in 1..nj {
                for k in 2..nk {
                    let id = numbering.cell_face(block, i, j, k, 5);
                    place_internal(
                        &mut faces,
                        id,
                        face_nodes(&numbering.cell_nodes(block, i, j, k), 5),
                        numbering.cell_seq(block, i, j, k - 1),
                        numbering.cell_seq(block, i, j, k),
                    )?;
                }
            }
        }

        // Surface sweeps. A shared face is created by whichever block
        // arrives first with left_cell = 0, and the counterpart block
        // patches the missing neighbour in.
        for face in 1..=NUM_SURFACES as u8 {
            let (pn, sn) = block.surface_extent(face);
            for s in 1..sn {
                for p in 1..pn {
                    let (ci, cj, ck) = block.boundary_cell(face, p, s);
                    let id = numbering.cell_face(block, ci, cj, ck, face);
                    let seq = numbering.cell_seq(block, ci, cj, ck);
                    match &mut faces[id - 1] {
                        Some(existing) => {
                            if existing.bc.is_some() {
                                return Err(GlueError::NonManifold {
                                    context: format!("boundary face {id} visited twice"),
                                });
                            }
                            if existing.left_cell == 0 {
                                existing.left_cell = seq;
                            } else if existing.right_cell == 0 {
                                existing.right_cell = seq;
                            } else {
                                return Err(GlueError::NonManifold {
                                    context: format!(
                                        "face {id} already joins cells {} and {}",
                                        existing.left_cell, existing.right_cell
                                    ),
                                });
                            }
                        }
                        slot @ None => {
                            let shared = topo.shared_cell_image(bi, face, p, s).is_some();
                            let bc = if shared {
                                None
                            } else {
                                Some(topo.boundary_kind(bi, face, p, s))
                            };
                            *slot = Some(Face {
                                id,
                                nodes: face_nodes(
                                    &numbering.cell_nodes(block, ci, cj, ck),
                                    face,
                                ),
                                left_cell: 0,
                                right_cell: seq,
                                bc,
                            });
                        }
                    }
                }
            }
        }
        debug!("block {bi}: faces placed");
    }

    faces
        .into_iter()
        .enumerate()
        .map(|(idx, f)| {
            let face = f.ok_or_else(|| GlueError::IndexCollision {
                context: format!("face id {} was never populated", idx + 1),
            })?;
            if face.bc.is_none() && face.is_boundary() {
                return Err(GlueError::CounterpartNotFound {
                    context: format!(
                        "shared face {} was never completed by its counterpart block",
                        face.id
                    ),
                });
            }
            if face.left_cell == face.right_cell {
                return Err(GlueError::NonManifold {
                    context: format!("face {} lists the same cell on both sides", face.id),
                });
            }
            Ok(face)
        })
        .collect()
}

fn place_internal(
    faces: &mut [Option<Face>],
    id: usize,
    nodes: [usize; 4],
    left: usize,
    right: usize,
) -> GlueResult<()> {
    if faces[id - 1].is_some() {
        return Err(GlueError::NonManifold {
            context: format!("internal face {id} visited twice"),
        });
    }
    faces[id - 1] = Some(Face {
        id,
        nodes,
        left_cell: left,
        right_cell: right,
        bc: None,
    });
    Ok(())
}
