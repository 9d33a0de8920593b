//! Legacy ASCII VTK export of the unstructured mesh.
//!
//! The canonical hex node ordering used by the cell records matches
//! `VTK_HEXAHEDRON` directly, so cells are emitted without reordering.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{GlueError, GlueResult};
use crate::mesh::UnstructuredMesh;

const VTK_HEXAHEDRON: u8 = 12;

/// Write `mesh` as a legacy VTK unstructured grid.
pub fn write_vtk(path: impl AsRef<Path>, mesh: &UnstructuredMesh, title: &str) -> GlueResult<()> {
    let path = path.as_ref();
    let ctx = path.display().to_string();
    let io = |e| GlueError::io(ctx.clone(), e);
    let mut w = BufWriter::new(File::create(path).map_err(|e| GlueError::io(ctx.clone(), e))?);

    writeln!(w, "# vtk DataFile Version 3.0").map_err(io)?;
    writeln!(w, "{}", title.lines().next().unwrap_or("mesh")).map_err(io)?;
    writeln!(w, "ASCII").map_err(io)?;
    writeln!(w, "DATASET UNSTRUCTURED_GRID").map_err(io)?;

    writeln!(w, "POINTS {} double", mesh.nodes.len()).map_err(io)?;
    for node in &mesh.nodes {
        let c = &node.coordinate;
        writeln!(w, "{:.12e} {:.12e} {:.12e}", c.x, c.y, c.z).map_err(io)?;
    }

    writeln!(w, "CELLS {} {}", mesh.cells.len(), mesh.cells.len() * 9).map_err(io)?;
    for cell in &mesh.cells {
        write!(w, "8").map_err(io)?;
        for &n in &cell.nodes {
            write!(w, " {}", n - 1).map_err(io)?;
        }
        writeln!(w).map_err(io)?;
    }

    writeln!(w, "CELL_TYPES {}", mesh.cells.len()).map_err(io)?;
    for _ in &mesh.cells {
        writeln!(w, "{VTK_HEXAHEDRON}").map_err(io)?;
    }
    Ok(())
}
