//! Bit-set naming the derived tables of a mesh.
//!
//! `NODES` and `ELEMS` stand for the raw geometry and are always present.
//! The six *table* bits are the structures the [`Coordinator`] builds. The
//! remaining *macro* bits are shorthands that [`expand`] turns into the
//! concrete tables an operation depends on.
//!
//! [`Coordinator`]: super::coordinator::Coordinator

use bitflags::bitflags;

bitflags! {
    /// Set of mesh tables, used both for requests and for the synchronized state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TableMask: u32 {
        const NODES = 1 << 0;
        const ELEMS = 1 << 1;
        const EDGES = 1 << 2;
        const FACES = 1 << 3;
        const NODE_NEIGHBORS = 1 << 4;
        const BOUNDING_BOX = 1 << 5;
        const NODE_LOCATE = 1 << 6;
        const ELEM_LOCATE = 1 << 7;

        /// Element-to-element adjacency (faces for volumes, edges for surfaces).
        const ELEM_NEIGHBORS = 1 << 8;
        /// Sub-dimensional entities of an element (faces or edges).
        const DELEMS = 1 << 9;
        const FIND_CLOSEST_NODE = 1 << 10;
        const FIND_CLOSEST_ELEM = 1 << 11;

        /// Raw geometry, valid for the lifetime of the mesh.
        const RAW = Self::NODES.bits() | Self::ELEMS.bits();
        /// Every table the coordinator can build.
        const TABLES = Self::EDGES.bits()
            | Self::FACES.bits()
            | Self::NODE_NEIGHBORS.bits()
            | Self::BOUNDING_BOX.bits()
            | Self::NODE_LOCATE.bits()
            | Self::ELEM_LOCATE.bits();
    }
}

/// One concrete derived table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Edges,
    Faces,
    NodeNeighbors,
    BoundingBox,
    NodeLocateGrid,
    ElemLocateGrid,
}

impl Table {
    /// All tables, in an order where every table follows its dependencies.
    pub const ALL: [Table; 6] = [
        Table::Edges,
        Table::Faces,
        Table::NodeNeighbors,
        Table::BoundingBox,
        Table::NodeLocateGrid,
        Table::ElemLocateGrid,
    ];

    /// The bit of this table.
    pub const fn mask(self) -> TableMask {
        match self {
            Table::Edges => TableMask::EDGES,
            Table::Faces => TableMask::FACES,
            Table::NodeNeighbors => TableMask::NODE_NEIGHBORS,
            Table::BoundingBox => TableMask::BOUNDING_BOX,
            Table::NodeLocateGrid => TableMask::NODE_LOCATE,
            Table::ElemLocateGrid => TableMask::ELEM_LOCATE,
        }
    }

    /// Dense position, used for per-table counters.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Search grids are sized from the bounding box and must wait for it.
    pub const fn needs_bounding_box(self) -> bool {
        matches!(self, Table::NodeLocateGrid | Table::ElemLocateGrid)
    }
}

impl TableMask {
    /// The concrete tables in this mask, in dependency order.
    pub fn tables(self) -> impl Iterator<Item = Table> {
        Table::ALL.into_iter().filter(move |t| self.contains(t.mask()))
    }
}

/// Expands macro bits into the dependency-closed set of concrete tables.
///
/// `dimension` is the topological dimension of the element family: volume
/// meshes find neighbors across faces, surface meshes across edges. The
/// result only contains bits of [`TableMask::TABLES`].
pub fn expand(requested: TableMask, dimension: u8) -> TableMask {
    let mut out = requested & TableMask::TABLES;

    if requested.intersects(TableMask::ELEM_NEIGHBORS | TableMask::DELEMS) {
        out |= if dimension >= 3 {
            TableMask::FACES
        } else {
            TableMask::EDGES
        };
    }
    if requested.contains(TableMask::FIND_CLOSEST_NODE) {
        out |= TableMask::NODE_LOCATE;
    }
    if requested.contains(TableMask::FIND_CLOSEST_ELEM) {
        // closest-element probes the boundary faces of every candidate
        out |= TableMask::ELEM_LOCATE | TableMask::FACES;
    }
    if out.intersects(TableMask::NODE_LOCATE | TableMask::ELEM_LOCATE) {
        out |= TableMask::BOUNDING_BOX;
    }
    out
}
