pub mod bc;
pub mod block;
pub mod connectivity;
pub mod error;
pub mod geom;
pub mod mesh;
pub mod nmf;
pub mod numbering;
pub mod plot3d;
pub mod vtk;

pub use bc::BcType;
pub use block::{Edge, EdgeId, Surface, SurfaceId, TopoBlock};
pub use connectivity::{AxisSign, InterfaceLink, OrientationMap, Topology};
pub use error::{GlueError, GlueResult};
pub use mesh::{convert, Cell, Face, MeshReport, Node, UnstructuredMesh};
pub use nmf::{read_nmf, write_nmf, BlockDims, FaceRange, MapEntry, MapFile};
pub use numbering::Numbering;
pub use plot3d::{read_ascii, read_binary, write_ascii, BinaryFormat, Endian, GridBlock, Precision};
pub use vtk::write_vtk;
