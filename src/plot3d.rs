//! PLOT3D whole-grid readers and writer.
//!
//! Supported layouts: ASCII, raw binary, and Fortran unformatted binary
//! (length-prefixed records), with selectable endianness and float width.
//! Coordinates are stored per block as a single point array, i fastest,
//! addressed with 1-based structured indices.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::debug;

use crate::error::{GlueError, GlueResult};
use crate::geom::Point;

#[derive(Copy, Clone, Debug)]
pub enum Endian {
    Little,
    Big,
}

#[derive(Copy, Clone, Debug)]
pub enum BinaryFormat {
    /// Plain sequence of values.
    Raw,
    /// Fortran unformatted: `[len:u32] payload [len:u32]` records.
    Fortran,
}

#[derive(Copy, Clone, Debug)]
pub enum Precision {
    F32,
    F64,
}

/// Coordinates of one structured block.
#[derive(Clone, Debug)]
pub struct GridBlock {
    ni: usize,
    nj: usize,
    nk: usize,
    points: Vec<Point>,
}

impl GridBlock {
    /// Wrap a point array of length `ni * nj * nk`, i fastest.
    pub fn new(ni: usize, nj: usize, nk: usize, points: Vec<Point>) -> Self {
        assert_eq!(points.len(), ni * nj * nk, "point count must match dims");
        Self { ni, nj, nk, points }
    }

    /// Build from separate coordinate planes in file order.
    pub fn from_xyz(ni: usize, nj: usize, nk: usize, x: &[f64], y: &[f64], z: &[f64]) -> Self {
        let n = ni * nj * nk;
        assert!(x.len() == n && y.len() == n && z.len() == n);
        let points = (0..n).map(|idx| Point::new(x[idx], y[idx], z[idx])).collect();
        Self { ni, nj, nk, points }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.ni, self.nj, self.nk)
    }

    pub fn npoints(&self) -> usize {
        self.points.len()
    }

    /// Node coordinate at 1-based `(i, j, k)`.
    #[inline]
    pub fn point(&self, i: usize, j: usize, k: usize) -> Point {
        debug_assert!(1 <= i && i <= self.ni && 1 <= j && j <= self.nj && 1 <= k && k <= self.nk);
        self.points[(i - 1) + self.ni * ((j - 1) + self.nj * (k - 1))]
    }
}

/// Read an ASCII PLOT3D grid.
pub fn read_ascii(path: impl AsRef<Path>) -> GlueResult<Vec<GridBlock>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| GlueError::io(path.display().to_string(), e))?;
    let mut tokens = text.split_whitespace();
    let ctx = path.display().to_string();

    let nblocks = next_usize(&mut tokens, &ctx, "block count")?;
    let mut dims = Vec::with_capacity(nblocks);
    for _ in 0..nblocks {
        let ni = next_usize(&mut tokens, &ctx, "I dimension")?;
        let nj = next_usize(&mut tokens, &ctx, "J dimension")?;
        let nk = next_usize(&mut tokens, &ctx, "K dimension")?;
        dims.push((ni, nj, nk));
    }

    let mut blocks = Vec::with_capacity(nblocks);
    for (ni, nj, nk) in dims {
        let n = ni * nj * nk;
        let x = next_floats(&mut tokens, n, &ctx)?;
        let y = next_floats(&mut tokens, n, &ctx)?;
        let z = next_floats(&mut tokens, n, &ctx)?;
        blocks.push(GridBlock::from_xyz(ni, nj, nk, &x, &y, &z));
    }
    debug!("read {} grid blocks from {}", blocks.len(), ctx);
    Ok(blocks)
}

/// Read a binary PLOT3D grid.
pub fn read_binary(
    path: impl AsRef<Path>,
    format: BinaryFormat,
    precision: Precision,
    endian: Endian,
) -> GlueResult<Vec<GridBlock>> {
    let path = path.as_ref();
    let ctx = path.display().to_string();
    let mut file = File::open(path).map_err(|e| GlueError::io(ctx.clone(), e))?;
    match endian {
        Endian::Little => read_binary_with::<LittleEndian>(&mut file, format, precision, &ctx),
        Endian::Big => read_binary_with::<BigEndian>(&mut file, format, precision, &ctx),
    }
}

fn read_binary_with<E: ByteOrder>(
    r: &mut impl Read,
    format: BinaryFormat,
    precision: Precision,
    ctx: &str,
) -> GlueResult<Vec<GridBlock>> {
    match format {
        BinaryFormat::Raw => {
            let nblocks = read_u32_raw::<E>(r, ctx)? as usize;
            let mut dims = Vec::with_capacity(nblocks);
            for _ in 0..nblocks {
                let ni = read_u32_raw::<E>(r, ctx)? as usize;
                let nj = read_u32_raw::<E>(r, ctx)? as usize;
                let nk = read_u32_raw::<E>(r, ctx)? as usize;
                dims.push((ni, nj, nk));
            }
            let mut blocks = Vec::with_capacity(nblocks);
            for (ni, nj, nk) in dims {
                let n = ni * nj * nk;
                let bytes = value_size(precision) * n;
                let mut buf = vec![0u8; 3 * bytes];
                r.read_exact(&mut buf)
                    .map_err(|e| GlueError::io(ctx.to_owned(), e))?;
                let x = decode_floats::<E>(&buf[..bytes], precision);
                let y = decode_floats::<E>(&buf[bytes..2 * bytes], precision);
                let z = decode_floats::<E>(&buf[2 * bytes..], precision);
                blocks.push(GridBlock::from_xyz(ni, nj, nk, &x, &y, &z));
            }
            Ok(blocks)
        }
        BinaryFormat::Fortran => {
            let header = read_record::<E>(r, ctx)?;
            if header.len() < 4 {
                return Err(malformed(ctx, "short block-count record"));
            }
            let nblocks = E::read_u32(&header[..4]) as usize;
            let mut dims = Vec::with_capacity(nblocks);
            for _ in 0..nblocks {
                let rec = read_record::<E>(r, ctx)?;
                if rec.len() < 12 {
                    return Err(malformed(ctx, "short dimension record"));
                }
                dims.push((
                    E::read_u32(&rec[0..4]) as usize,
                    E::read_u32(&rec[4..8]) as usize,
                    E::read_u32(&rec[8..12]) as usize,
                ));
            }
            let mut blocks = Vec::with_capacity(nblocks);
            for (ni, nj, nk) in dims {
                let n = ni * nj * nk;
                let mut planes = Vec::with_capacity(3);
                for axis in ["X", "Y", "Z"] {
                    let rec = read_record::<E>(r, ctx)?;
                    let vals = decode_floats::<E>(&rec, precision);
                    if vals.len() != n {
                        return Err(malformed(
                            ctx,
                            &format!("{axis} record holds {} values, {n} expected", vals.len()),
                        ));
                    }
                    planes.push(vals);
                }
                blocks.push(GridBlock::from_xyz(ni, nj, nk, &planes[0], &planes[1], &planes[2]));
            }
            Ok(blocks)
        }
    }
}

/// Write an ASCII PLOT3D grid, six values per line.
pub fn write_ascii(path: impl AsRef<Path>, blocks: &[GridBlock]) -> GlueResult<()> {
    let path = path.as_ref();
    let ctx = path.display().to_string();
    let io = |e| GlueError::io(ctx.clone(), e);
    let mut w = BufWriter::new(File::create(path).map_err(|e| GlueError::io(ctx.clone(), e))?);

    writeln!(w, "{}", blocks.len()).map_err(io)?;
    for b in blocks {
        writeln!(w, "{} {} {}", b.ni, b.nj, b.nk).map_err(io)?;
    }
    for b in blocks {
        for axis in 0..3 {
            for (idx, p) in b.points.iter().enumerate() {
                write!(w, "{:.8}", p.coords[axis]).map_err(io)?;
                if (idx + 1) % 6 == 0 {
                    writeln!(w).map_err(io)?;
                } else {
                    write!(w, " ").map_err(io)?;
                }
            }
            if b.points.len() % 6 != 0 {
                writeln!(w).map_err(io)?;
            }
        }
    }
    Ok(())
}

fn malformed(ctx: &str, detail: &str) -> GlueError {
    GlueError::MalformedHeader {
        context: format!("{ctx}: {detail}"),
    }
}

fn next_usize<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    ctx: &str,
    what: &str,
) -> GlueResult<usize> {
    tokens
        .next()
        .ok_or_else(|| malformed(ctx, &format!("missing {what}")))?
        .parse()
        .map_err(|_| malformed(ctx, &format!("bad {what}")))
}

fn next_floats<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    n: usize,
    ctx: &str,
) -> GlueResult<Vec<f64>> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let t = tokens
            .next()
            .ok_or_else(|| malformed(ctx, "coordinate payload ran out"))?;
        out.push(
            t.parse()
                .map_err(|_| malformed(ctx, &format!("{t:?} is not a number")))?,
        );
    }
    Ok(out)
}

fn read_u32_raw<E: ByteOrder>(r: &mut impl Read, ctx: &str) -> GlueResult<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .map_err(|e| GlueError::io(ctx.to_owned(), e))?;
    Ok(E::read_u32(&buf))
}

fn read_record<E: ByteOrder>(r: &mut impl Read, ctx: &str) -> GlueResult<Vec<u8>> {
    let len = read_u32_raw::<E>(r, ctx)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)
        .map_err(|e| GlueError::io(ctx.to_owned(), e))?;
    let trailer = read_u32_raw::<E>(r, ctx)? as usize;
    if trailer != len {
        return Err(malformed(ctx, "record length markers disagree"));
    }
    Ok(buf)
}

fn value_size(precision: Precision) -> usize {
    match precision {
        Precision::F32 => 4,
        Precision::F64 => 8,
    }
}

fn decode_floats<E: ByteOrder>(buf: &[u8], precision: Precision) -> Vec<f64> {
    match precision {
        Precision::F32 => buf
            .chunks_exact(4)
            .map(|c| E::read_f32(c) as f64)
            .collect(),
        Precision::F64 => buf.chunks_exact(8).map(E::read_f64).collect(),
    }
}
