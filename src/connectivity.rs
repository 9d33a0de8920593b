//! Inter-block connectivity resolution.
//!
//! Walks the ONE_TO_ONE entries of a parsed map file, pairs the declared
//! surfaces, and resolves each interface into an affine lattice map
//! (axis permutation plus a sign per axis). The induced equivalences over
//! frame edges and block corners are merged with union-find so that
//! contradictory orientation declarations are detected up front.

use std::collections::HashMap;

use log::{debug, info};

use crate::bc::BcType;
use crate::block::{
    EdgeId, SurfaceId, TopoBlock, NUM_CORNERS, NUM_EDGES, SURFACE_FRAME,
};
use crate::error::{GlueError, GlueResult};
use crate::nmf::{FaceRange, MapEntry, MapFile};

/// Relative direction of two paired in-surface axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AxisSign {
    Aligned,
    Reversed,
}

impl AxisSign {
    fn between(da: i64, db: i64) -> Self {
        if da == db {
            Self::Aligned
        } else {
            Self::Reversed
        }
    }
}

/// Orientation of an interface: whether the primary axes cross over, and
/// the relative direction along each paired axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OrientationMap {
    pub swap: bool,
    pub sign_pri: AxisSign,
    pub sign_sec: AxisSign,
}

/// Directed lattice map from one interface side onto its counterpart.
///
/// Every ONE_TO_ONE entry yields two of these, one per direction; the two
/// are exact inverses of each other.
#[derive(Clone, Debug)]
pub struct InterfaceLink {
    pub from: SurfaceId,
    pub to: SurfaceId,
    pub range_from: FaceRange,
    pub range_to: FaceRange,
    pub orientation: OrientationMap,
}

fn dir(s: usize, e: usize) -> i64 {
    if e >= s {
        1
    } else {
        -1
    }
}

impl InterfaceLink {
    fn new(range_from: FaceRange, range_to: FaceRange, swap: bool) -> Self {
        let d1a = dir(range_from.s1, range_from.e1);
        let d2a = dir(range_from.s2, range_from.e2);
        let d1b = dir(range_to.s1, range_to.e1);
        let d2b = dir(range_to.s2, range_to.e2);
        let orientation = if swap {
            OrientationMap {
                swap,
                sign_pri: AxisSign::between(d1a, d2b),
                sign_sec: AxisSign::between(d2a, d1b),
            }
        } else {
            OrientationMap {
                swap,
                sign_pri: AxisSign::between(d1a, d1b),
                sign_sec: AxisSign::between(d2a, d2b),
            }
        };
        Self {
            from: SurfaceId {
                block: range_from.block,
                surface: range_from.face,
            },
            to: SurfaceId {
                block: range_to.block,
                surface: range_to.face,
            },
            range_from,
            range_to,
            orientation,
        }
    }

    /// Image of lattice node `(p, s)` on the counterpart surface, or
    /// `None` when the node lies outside the interface range.
    pub fn image_of_node(&self, p: usize, s: usize) -> Option<(usize, usize)> {
        if !self.range_from.contains(p, s) {
            return None;
        }
        let ra = &self.range_from;
        let rb = &self.range_to;
        // Steps from the range start, measured along the declared run.
        let u = (p as i64 - ra.s1 as i64) * dir(ra.s1, ra.e1);
        let v = (s as i64 - ra.s2 as i64) * dir(ra.s2, ra.e2);
        let (up, vp) = if self.orientation.swap { (v, u) } else { (u, v) };
        let p2 = rb.s1 as i64 + up * dir(rb.s1, rb.e1);
        let s2 = rb.s2 as i64 + vp * dir(rb.s2, rb.e2);
        debug_assert!(p2 >= 1 && s2 >= 1);
        Some((p2 as usize, s2 as usize))
    }

    /// Image of the quad cell whose lower lattice corner is `(p, s)`, as
    /// the lower corner of the counterpart cell. `None` when any part of
    /// the cell leaves the interface range.
    pub fn image_of_cell(&self, p: usize, s: usize) -> Option<(usize, usize)> {
        let (a_p, a_s) = self.image_of_node(p, s)?;
        let (b_p, b_s) = self.image_of_node(p + 1, s + 1)?;
        Some((a_p.min(b_p), a_s.min(b_s)))
    }
}

/// Union-find with a sign label on every relation, for detecting
/// orientation contradictions when two entries disagree.
struct SignedUnionFind {
    parent: Vec<usize>,
    /// Sign of the element relative to its parent.
    sign: Vec<i8>,
}

impl SignedUnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            sign: vec![1; n],
        }
    }

    fn find(&mut self, x: usize) -> (usize, i8) {
        if self.parent[x] == x {
            return (x, 1);
        }
        let (root, parent_sign) = self.find(self.parent[x]);
        let total = self.sign[x] * parent_sign;
        self.parent[x] = root;
        self.sign[x] = total;
        (root, total)
    }

    /// Record `a = rel * b`. `Err(())` when the relation contradicts an
    /// existing one.
    fn union(&mut self, a: usize, b: usize, rel: i8) -> Result<(), ()> {
        let (ra, sa) = self.find(a);
        let (rb, sb) = self.find(b);
        if ra == rb {
            if sa != rel * sb {
                return Err(());
            }
            return Ok(());
        }
        // Attach rb below ra so that the invariant keeps holding.
        self.parent[rb] = ra;
        self.sign[rb] = sa * rel * sb;
        Ok(())
    }
}

/// Resolved multi-block topology, frozen after construction except for the
/// global indices assigned by the numbering stage.
pub struct Topology {
    blocks: Vec<TopoBlock>,
    entries: Vec<MapEntry>,
    links: HashMap<SurfaceId, InterfaceLink>,
    edge_root: Vec<usize>,
    corner_root: Vec<usize>,
}

impl Topology {
    /// Build the topology from a parsed map file: pair surfaces, orient
    /// every interface, and merge the induced edge/corner equivalences.
    pub fn resolve(map: &MapFile) -> GlueResult<Self> {
        let blocks: Vec<TopoBlock> = map
            .blocks
            .iter()
            .map(|b| TopoBlock::new(b.index, b.ni, b.nj, b.nk))
            .collect();
        let mut topo = Self {
            blocks,
            entries: map.entries.clone(),
            links: HashMap::new(),
            edge_root: Vec::new(),
            corner_root: Vec::new(),
        };

        for entry in &map.entries {
            if let MapEntry::Interface { range1, range2, swap } = entry {
                topo.pair_surfaces(range1, range2, *swap)?;
            }
        }
        topo.merge_equivalences()?;

        info!(
            "resolved topology: {} blocks, {} interfaces",
            topo.blocks.len(),
            topo.links.len() / 2
        );
        Ok(topo)
    }

    fn pair_surfaces(
        &mut self,
        range1: &FaceRange,
        range2: &FaceRange,
        swap: bool,
    ) -> GlueResult<()> {
        let a = SurfaceId {
            block: range1.block,
            surface: range1.face,
        };
        let b = SurfaceId {
            block: range2.block,
            surface: range2.face,
        };
        if a == b {
            return Err(GlueError::DuplicateInterface {
                context: format!("block {} face {} is paired with itself", a.block, a.surface),
            });
        }

        // The parser checks the cell-count product; the per-axis node
        // counts must also line up under the declared permutation.
        let (na1, na2) = (range1.pri_node_num(), range1.sec_node_num());
        let (nb1, nb2) = (range2.pri_node_num(), range2.sec_node_num());
        let compatible = if swap {
            na1 == nb2 && na2 == nb1
        } else {
            na1 == nb1 && na2 == nb2
        };
        if !compatible {
            return Err(GlueError::CounterpartNotFound {
                context: format!(
                    "block {} face {} spans {}x{} nodes but block {} face {} spans {}x{} (swap={})",
                    a.block, a.surface, na1, na2, b.block, b.surface, nb1, nb2, swap
                ),
            });
        }

        for id in [a, b] {
            if self.links.contains_key(&id)
                || self.block(id.block).surf(id.surface as i32).neighbour.is_some()
            {
                return Err(GlueError::DuplicateInterface {
                    context: format!(
                        "block {} face {} appears in more than one ONE_TO_ONE entry",
                        id.block, id.surface
                    ),
                });
            }
        }

        self.block_mut(a.block).surf_mut(a.surface as i32).neighbour = Some(b);
        self.block_mut(b.block).surf_mut(b.surface as i32).neighbour = Some(a);
        self.links
            .insert(a, InterfaceLink::new(*range1, *range2, swap));
        self.links
            .insert(b, InterfaceLink::new(*range2, *range1, swap));
        debug!(
            "paired block {} face {} with block {} face {} (swap={})",
            a.block, a.surface, b.block, b.surface, swap
        );
        Ok(())
    }

    /// Merge the edge and corner equivalence classes induced by every
    /// whole-surface interface.
    fn merge_equivalences(&mut self) -> GlueResult<()> {
        let nblk = self.blocks.len();
        let mut edges = SignedUnionFind::new(nblk * NUM_EDGES);
        let mut corners = SignedUnionFind::new(nblk * NUM_CORNERS);

        let entries = self.entries.clone();
        for entry in &entries {
            let MapEntry::Interface { range1, .. } = entry else {
                continue;
            };
            let a = SurfaceId {
                block: range1.block,
                surface: range1.face,
            };
            let link = self.links[&a].clone();
            let block_a = self.block(link.from.block);
            let block_b = self.block(link.to.block);
            let (pa, sa) = block_a.surface_extent(link.from.surface);
            let (pb, sb) = block_b.surface_extent(link.to.surface);
            if !link.range_from.covers_surface(pa, sa) || !link.range_to.covers_surface(pb, sb) {
                // Partial patch: node numbering still maps the shared
                // lattice, but no whole-edge identification is implied.
                continue;
            }
            self.merge_link_edges(&link, &mut edges)?;
            self.merge_link_corners(&link, &mut corners)?;
        }

        self.edge_root = (0..nblk * NUM_EDGES).map(|x| edges.find(x).0).collect();
        self.corner_root = (0..nblk * NUM_CORNERS).map(|x| corners.find(x).0).collect();
        Ok(())
    }

    fn merge_link_edges(
        &self,
        link: &InterfaceLink,
        uf: &mut SignedUnionFind,
    ) -> GlueResult<()> {
        let block_a = self.block(link.from.block);
        let block_b = self.block(link.to.block);
        let (pa, sa) = block_a.surface_extent(link.from.surface);
        let (pb, sb) = block_b.surface_extent(link.to.surface);
        let frame_a = SURFACE_FRAME[link.from.surface as usize - 1];
        let frame_b = SURFACE_FRAME[link.to.surface as usize - 1];

        // Frame sides in [p=1, p=P, s=1, s=S] order, with their two
        // lattice endpoints listed in increasing edge parameter.
        let sides = [
            ((1, 1), (1, sa)),
            ((pa, 1), (pa, sa)),
            ((1, 1), (pa, 1)),
            ((1, sa), (pa, sa)),
        ];
        for (side, ((q1p, q1s), (q2p, q2s))) in sides.into_iter().enumerate() {
            let img1 = link.image_of_node(q1p, q1s).expect("frame node inside range");
            let img2 = link.image_of_node(q2p, q2s).expect("frame node inside range");
            let (side_b, t1, t2) = if img1.0 == img2.0 {
                let side_b = if img1.0 == 1 {
                    0
                } else if img1.0 == pb {
                    1
                } else {
                    return Err(GlueError::CounterpartNotFound {
                        context: format!(
                            "frame edge of block {} face {} maps into the interior of block {} face {}",
                            link.from.block, link.from.surface, link.to.block, link.to.surface
                        ),
                    });
                };
                (side_b, img1.1, img2.1)
            } else {
                debug_assert_eq!(img1.1, img2.1);
                let side_b = if img1.1 == 1 {
                    2
                } else if img1.1 == sb {
                    3
                } else {
                    return Err(GlueError::CounterpartNotFound {
                        context: format!(
                            "frame edge of block {} face {} maps into the interior of block {} face {}",
                            link.from.block, link.from.surface, link.to.block, link.to.surface
                        ),
                    });
                };
                (side_b, img1.0, img2.0)
            };
            let rel: i8 = if t2 > t1 { 1 } else { -1 };
            let ea = EdgeId {
                block: link.from.block,
                edge: frame_a[side],
            };
            let eb = EdgeId {
                block: link.to.block,
                edge: frame_b[side_b],
            };
            uf.union(edge_flat(ea), edge_flat(eb), rel).map_err(|_| {
                GlueError::OrientationInconsistent {
                    context: format!(
                        "edge {} of block {} and edge {} of block {} are already related with the opposite direction",
                        ea.edge, ea.block, eb.edge, eb.block
                    ),
                }
            })?;
        }
        Ok(())
    }

    fn merge_link_corners(
        &self,
        link: &InterfaceLink,
        uf: &mut SignedUnionFind,
    ) -> GlueResult<()> {
        let block_a = self.block(link.from.block);
        let block_b = self.block(link.to.block);
        let (pa, sa) = block_a.surface_extent(link.from.surface);
        for (p, s) in [(1, 1), (pa, 1), (1, sa), (pa, sa)] {
            let (p2, s2) = link.image_of_node(p, s).expect("corner inside range");
            let (i, j, k) = block_a.surface_to_node(link.from.surface, p, s);
            let ca = block_a.corner_of_node(i, j, k).expect("surface corner");
            let (i2, j2, k2) = block_b.surface_to_node(link.to.surface, p2, s2);
            let cb = block_b.corner_of_node(i2, j2, k2).ok_or_else(|| {
                GlueError::CounterpartNotFound {
                    context: format!(
                        "corner of block {} face {} maps to a non-corner node of block {}",
                        link.from.block, link.from.surface, link.to.block
                    ),
                }
            })?;
            uf.union(
                corner_flat(link.from.block, ca),
                corner_flat(link.to.block, cb),
                1,
            )
            .expect("unsigned corner unions cannot conflict");
        }
        Ok(())
    }

    pub fn nblocks(&self) -> usize {
        self.blocks.len()
    }

    /// Block accessor, 1-based.
    pub fn block(&self, idx: usize) -> &TopoBlock {
        &self.blocks[idx - 1]
    }

    pub(crate) fn block_mut(&mut self, idx: usize) -> &mut TopoBlock {
        &mut self.blocks[idx - 1]
    }

    pub fn blocks(&self) -> &[TopoBlock] {
        &self.blocks
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    /// Directed link leaving `surface`, when it is an interface side.
    pub fn link(&self, surface: SurfaceId) -> Option<&InterfaceLink> {
        self.links.get(&surface)
    }

    /// Total hex cells over all blocks.
    pub fn cell_count(&self) -> usize {
        self.blocks.iter().map(TopoBlock::cell_num).sum()
    }

    /// Total distinct quad faces: per-block counts minus one copy of every
    /// shared interface rectangle.
    pub fn face_count(&self) -> usize {
        let gross: usize = self.blocks.iter().map(TopoBlock::face_num).sum();
        let shared: usize = self
            .entries
            .iter()
            .filter_map(|e| match e {
                MapEntry::Interface { range1, .. } => Some(range1.face_num()),
                MapEntry::Boundary { .. } => None,
            })
            .sum();
        gross - shared
    }

    /// Counterpart of a shared surface node, when `(p, s)` lies inside an
    /// interface range of the surface.
    pub fn shared_node_image(
        &self,
        block: usize,
        face: u8,
        p: usize,
        s: usize,
    ) -> Option<(SurfaceId, usize, usize)> {
        let link = self.links.get(&SurfaceId { block, surface: face })?;
        let (p2, s2) = link.image_of_node(p, s)?;
        Some((link.to, p2, s2))
    }

    /// Counterpart of a shared surface cell, when the whole cell lies
    /// inside an interface range of the surface.
    pub fn shared_cell_image(
        &self,
        block: usize,
        face: u8,
        p: usize,
        s: usize,
    ) -> Option<(SurfaceId, usize, usize)> {
        let link = self.links.get(&SurfaceId { block, surface: face })?;
        let (p2, s2) = link.image_of_cell(p, s)?;
        Some((link.to, p2, s2))
    }

    /// Boundary marker for the surface cell with lower corner `(p, s)`,
    /// copied from the first single-side entry covering it.
    pub fn boundary_kind(&self, block: usize, face: u8, p: usize, s: usize) -> BcType {
        for entry in &self.entries {
            if let MapEntry::Boundary { kind, range } = entry {
                if range.block == block
                    && range.face == face
                    && range.contains(p, s)
                    && range.contains(p + 1, s + 1)
                {
                    return *kind;
                }
            }
        }
        BcType::Unprocessed
    }

    /// Representative of the equivalence class of a frame edge.
    pub fn edge_class(&self, edge: EdgeId) -> usize {
        self.edge_root[edge_flat(edge)]
    }

    /// True when two frame edges were identified across interfaces.
    pub fn same_edge_class(&self, a: EdgeId, b: EdgeId) -> bool {
        self.edge_class(a) == self.edge_class(b)
    }

    /// Representative of the equivalence class of a block corner (1..8).
    pub fn corner_class(&self, block: usize, corner: u8) -> usize {
        self.corner_root[corner_flat(block, corner)]
    }
}

fn edge_flat(edge: EdgeId) -> usize {
    (edge.block - 1) * NUM_EDGES + (edge.edge as usize - 1)
}

fn corner_flat(block: usize, corner: u8) -> usize {
    (block - 1) * NUM_CORNERS + (corner as usize - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_union_find_detects_conflicts() {
        let mut uf = SignedUnionFind::new(4);
        uf.union(0, 1, 1).unwrap();
        uf.union(1, 2, -1).unwrap();
        // 0 ~ +1 and 1 ~ -2 transitively give 0 ~ -2.
        assert!(uf.union(0, 2, -1).is_ok());
        assert!(uf.union(0, 2, 1).is_err());
        assert_eq!(uf.find(3).0, 3);
    }
}
