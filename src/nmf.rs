//! Neutral Map File parsing and writing.
//!
//! The format is line based: `#` lines and blank lines are ignored, the
//! first significant line is the block count, followed by one dimension
//! line per block and any number of boundary/interface entries.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::bc::BcType;
use crate::error::{GlueError, GlueResult};

/// Declared node dimensions of one block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlockDims {
    /// 1-based block id.
    pub index: usize,
    pub ni: usize,
    pub nj: usize,
    pub nk: usize,
}

impl BlockDims {
    /// Node extents `(P, S)` of `face` in its (primary, secondary) frame.
    pub fn surface_extent(&self, face: u8) -> (usize, usize) {
        match face {
            1 | 2 => (self.nj, self.nk),
            3 | 4 => (self.ni, self.nk),
            _ => (self.ni, self.nj),
        }
    }
}

/// Rectangular index range on one block surface.
///
/// `s1..e1` runs along the surface's primary direction, `s2..e2` along the
/// secondary one. Interface ranges may run backwards (`s > e`) to express a
/// reversed orientation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FaceRange {
    /// Host block, 1-based.
    pub block: usize,
    /// Host surface, 1..6.
    pub face: u8,
    pub s1: usize,
    pub e1: usize,
    pub s2: usize,
    pub e2: usize,
}

impl FaceRange {
    /// Nodes along the primary direction.
    pub fn pri_node_num(&self) -> usize {
        self.s1.abs_diff(self.e1) + 1
    }

    /// Nodes along the secondary direction.
    pub fn sec_node_num(&self) -> usize {
        self.s2.abs_diff(self.e2) + 1
    }

    /// Total nodes in the range.
    pub fn node_num(&self) -> usize {
        self.pri_node_num() * self.sec_node_num()
    }

    /// Total quad cells in the range.
    pub fn face_num(&self) -> usize {
        (self.pri_node_num() - 1) * (self.sec_node_num() - 1)
    }

    /// Whether lattice point `(p, s)` lies inside the range.
    pub fn contains(&self, p: usize, s: usize) -> bool {
        let (p0, p1) = (self.s1.min(self.e1), self.s1.max(self.e1));
        let (s0, s1) = (self.s2.min(self.e2), self.s2.max(self.e2));
        p0 <= p && p <= p1 && s0 <= s && s <= s1
    }

    /// Whether the range spans the whole surface of extent `(pn, sn)`.
    pub fn covers_surface(&self, pn: usize, sn: usize) -> bool {
        self.s1.min(self.e1) == 1
            && self.s1.max(self.e1) == pn
            && self.s2.min(self.e2) == 1
            && self.s2.max(self.e2) == sn
    }
}

/// One connectivity entry of the map file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum MapEntry {
    /// Single-sided boundary patch.
    Boundary { kind: BcType, range: FaceRange },
    /// ONE_TO_ONE internal interface between two surfaces.
    Interface {
        range1: FaceRange,
        range2: FaceRange,
        swap: bool,
    },
}

impl MapEntry {
    /// Boundary-condition kind of the entry.
    pub fn kind(&self) -> BcType {
        match self {
            Self::Boundary { kind, .. } => *kind,
            Self::Interface { .. } => BcType::OneToOne,
        }
    }

    /// All ranges of the entry, one for boundaries, two for interfaces.
    pub fn ranges(&self) -> impl Iterator<Item = &FaceRange> + '_ {
        let (first, second) = match self {
            Self::Boundary { range, .. } => (range, None),
            Self::Interface { range1, range2, .. } => (range1, Some(range2)),
        };
        std::iter::once(first).chain(second)
    }
}

/// Parsed Neutral Map File: block dimensions plus connectivity entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MapFile {
    /// Blocks sorted by id; ids form the set `1..=len`.
    pub blocks: Vec<BlockDims>,
    pub entries: Vec<MapEntry>,
}

impl MapFile {
    pub fn nblocks(&self) -> usize {
        self.blocks.len()
    }

    /// Parse from any buffered reader. See [`read_nmf`] for the file-path
    /// convenience wrapper.
    pub fn parse(reader: impl BufRead) -> GlueResult<Self> {
        let mut lines = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| GlueError::io("reading map file", e))?;
            let trimmed = line.trim().to_owned();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            lines.push((lineno + 1, trimmed));
        }

        let mut it = lines.into_iter();
        let (lineno, header) = it.next().ok_or_else(|| GlueError::MalformedHeader {
            context: "map file has no significant lines".into(),
        })?;
        let nblk = parse_usize(&header, lineno, "block count")?;
        if header.split_whitespace().count() != 1 || nblk == 0 {
            return Err(GlueError::MalformedHeader {
                context: format!("line {lineno}: expected a single positive block count"),
            });
        }

        let mut blocks: Vec<Option<BlockDims>> = vec![None; nblk];
        for _ in 0..nblk {
            let (lineno, line) = it.next().ok_or_else(|| GlueError::BlockCountMismatch {
                context: format!("{nblk} blocks declared but dimension lines ran out"),
            })?;
            let fields = parse_usize_fields(&line, lineno, 4, "block dimensions")?;
            let (idx, ni, nj, nk) = (fields[0], fields[1], fields[2], fields[3]);
            if idx < 1 || idx > nblk {
                return Err(GlueError::BlockCountMismatch {
                    context: format!("line {lineno}: block id {idx} outside 1..={nblk}"),
                });
            }
            if ni < 2 || nj < 2 || nk < 2 {
                return Err(GlueError::DimensionTooSmall {
                    context: format!("line {lineno}: block {idx} is {ni}x{nj}x{nk}"),
                });
            }
            if blocks[idx - 1].is_some() {
                return Err(GlueError::BlockCountMismatch {
                    context: format!("line {lineno}: block id {idx} declared twice"),
                });
            }
            blocks[idx - 1] = Some(BlockDims { index: idx, ni, nj, nk });
        }
        let blocks: Vec<BlockDims> = blocks.into_iter().map(Option::unwrap).collect();

        let mut entries = Vec::new();
        for (lineno, line) in it {
            entries.push(parse_entry(&line, lineno, &blocks)?);
        }

        debug!(
            "parsed map file: {} blocks, {} entries",
            blocks.len(),
            entries.len()
        );
        Ok(Self { blocks, entries })
    }

    /// Parse directly from in-memory text.
    pub fn parse_str(text: &str) -> GlueResult<Self> {
        Self::parse(text.as_bytes())
    }

    /// Write the model back out in the canonical fixed-width layout.
    pub fn write(&self, mut w: impl Write) -> GlueResult<()> {
        let ctx = "writing map file";
        let io = |e| GlueError::io(ctx, e);

        writeln!(
            w,
            "# =============================== Neutral Map File generated by meshglue ====================================="
        )
        .map_err(io)?;
        writeln!(w, "# {}", "=".repeat(108)).map_err(io)?;
        writeln!(w, "# Block#    IDIM    JDIM    KDIM").map_err(io)?;
        writeln!(w, "# {}", "-".repeat(108)).map_err(io)?;
        writeln!(w, "{:>8}", self.blocks.len()).map_err(io)?;
        for b in &self.blocks {
            writeln!(w, "{:>8}{:>8}{:>8}{:>8}", b.index, b.ni, b.nj, b.nk).map_err(io)?;
        }
        writeln!(w, "# {}", "=".repeat(108)).map_err(io)?;
        writeln!(
            w,
            "# Type           B1    F1       S1    E1       S2    E2       B2    F2       S1    E1       S2    E2      Swap"
        )
        .map_err(io)?;
        writeln!(w, "# {}", "-".repeat(108)).map_err(io)?;
        for entry in &self.entries {
            write!(w, "{:<13}", entry.kind().keyword()).map_err(io)?;
            let mut ranges = entry.ranges();
            let r1 = ranges.next().expect("entry has a range");
            write!(
                w,
                "{:>6}{:>6}{:>9}{:>6}{:>9}{:>6}",
                r1.block, r1.face, r1.s1, r1.e1, r1.s2, r1.e2
            )
            .map_err(io)?;
            if let MapEntry::Interface { range2, swap, .. } = entry {
                write!(
                    w,
                    "{:>9}{:>6}{:>9}{:>6}{:>9}{:>6}{:>10}",
                    range2.block,
                    range2.face,
                    range2.s1,
                    range2.e1,
                    range2.s2,
                    range2.e2,
                    if *swap { "TRUE" } else { "FALSE" }
                )
                .map_err(io)?;
            }
            writeln!(w).map_err(io)?;
        }
        Ok(())
    }
}

/// Read a Neutral Map File from disk.
pub fn read_nmf(path: impl AsRef<Path>) -> GlueResult<MapFile> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| GlueError::io(path.display().to_string(), e))?;
    MapFile::parse(BufReader::new(file))
}

/// Write a Neutral Map File to disk.
pub fn write_nmf(path: impl AsRef<Path>, map: &MapFile) -> GlueResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| GlueError::io(path.display().to_string(), e))?;
    map.write(BufWriter::new(file))
}

fn parse_usize(token: &str, lineno: usize, what: &str) -> GlueResult<usize> {
    token
        .split_whitespace()
        .next()
        .unwrap_or("")
        .parse()
        .map_err(|_| GlueError::MalformedHeader {
            context: format!("line {lineno}: expected {what}, found {token:?}"),
        })
}

fn parse_usize_fields(
    line: &str,
    lineno: usize,
    count: usize,
    what: &str,
) -> GlueResult<Vec<usize>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != count {
        return Err(GlueError::MalformedHeader {
            context: format!("line {lineno}: expected {count} integers for {what}"),
        });
    }
    tokens
        .iter()
        .map(|t| {
            t.parse().map_err(|_| GlueError::MalformedHeader {
                context: format!("line {lineno}: {t:?} is not an integer in {what}"),
            })
        })
        .collect()
}

fn parse_entry(line: &str, lineno: usize, blocks: &[BlockDims]) -> GlueResult<MapEntry> {
    let mut tokens = line.split_whitespace();
    let keyword = tokens.next().expect("significant lines are non-empty");
    let kind = BcType::from_keyword(keyword).ok_or_else(|| GlueError::UnknownBc {
        context: format!("line {lineno}: {keyword:?}"),
    })?;
    let rest: Vec<&str> = tokens.collect();

    if kind.is_interface() {
        if rest.len() != 13 {
            return Err(GlueError::MalformedHeader {
                context: format!(
                    "line {lineno}: ONE_TO_ONE takes 12 integers and a swap flag, found {} fields",
                    rest.len()
                ),
            });
        }
        let ints = parse_usize_fields(&rest[..12].join(" "), lineno, 12, "interface ranges")?;
        let swap = match BcType::formalize(rest[12]).as_str() {
            "TRUE" => true,
            "FALSE" => false,
            other => {
                return Err(GlueError::MalformedHeader {
                    context: format!("line {lineno}: swap flag must be TRUE or FALSE, found {other:?}"),
                })
            }
        };
        let range1 = range_from_fields(&ints[..6], lineno, blocks)?;
        let range2 = range_from_fields(&ints[6..], lineno, blocks)?;
        if range1.face_num() != range2.face_num() {
            return Err(GlueError::AreaMismatch {
                context: format!(
                    "line {lineno}: {} quad cells on block {} face {} but {} on block {} face {}",
                    range1.face_num(),
                    range1.block,
                    range1.face,
                    range2.face_num(),
                    range2.block,
                    range2.face
                ),
            });
        }
        Ok(MapEntry::Interface { range1, range2, swap })
    } else {
        if rest.len() != 6 {
            return Err(GlueError::MalformedHeader {
                context: format!(
                    "line {lineno}: {} takes 6 integers, found {} fields",
                    kind.keyword(),
                    rest.len()
                ),
            });
        }
        let ints = parse_usize_fields(&rest.join(" "), lineno, 6, "boundary range")?;
        let range = range_from_fields(&ints, lineno, blocks)?;
        Ok(MapEntry::Boundary { kind, range })
    }
}

fn range_from_fields(fields: &[usize], lineno: usize, blocks: &[BlockDims]) -> GlueResult<FaceRange> {
    let block = fields[0];
    let face = fields[1];
    if block < 1 || block > blocks.len() {
        return Err(GlueError::RangeOutOfBounds {
            context: format!("line {lineno}: block {block} does not exist"),
        });
    }
    // Bounds-check before narrowing so oversized face fields cannot wrap.
    if !(1..=6).contains(&face) {
        return Err(GlueError::RangeOutOfBounds {
            context: format!("line {lineno}: face {face} outside 1..=6"),
        });
    }
    let range = FaceRange {
        block,
        face: face as u8,
        s1: fields[2],
        e1: fields[3],
        s2: fields[4],
        e2: fields[5],
    };
    let dims = &blocks[block - 1];
    let (pn, sn) = dims.surface_extent(range.face);
    let pri_ok = range.s1.min(range.e1) >= 1 && range.s1.max(range.e1) <= pn;
    let sec_ok = range.s2.min(range.e2) >= 1 && range.s2.max(range.e2) <= sn;
    if !pri_ok || !sec_ok {
        return Err(GlueError::RangeOutOfBounds {
            context: format!(
                "line {lineno}: range [{}..{}]x[{}..{}] leaves the {}x{} surface {} of block {}",
                range.s1, range.e1, range.s2, range.e2, pn, sn, range.face, range.block
            ),
        });
    }
    Ok(range)
}
