//! Cell type metadata and the static adjacency tables of each element family.
//!
//! Every family supplies its arity and the fixed local tables the topology
//! engine works from. The reference elements use the following ordering:
//! - Quadrilateral: `[v0, v1, v2, v3]` counter-clockwise.
//! - Prism: bottom triangle `[v0, v1, v2]`, top triangle `[v3, v4, v5]`.
//! - Hexahedron: bottom quad `[v0, v1, v2, v3]`, top quad `[v4, v5, v6, v7]`.
//!
//! Faces are listed so that each is entered consistently (all outward or all
//! inward) for a well-formed element; triangles have 3 entries.

/// Common cell types for mesh elements.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellType {
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D wedge/prism.
    Prism,
    /// 3D tensor-product cell (hex).
    Hexahedron,
}

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Quadrilateral => 2,
            CellType::Prism | CellType::Hexahedron => 3,
        }
    }

    /// Number of nodes of a linear element of this type.
    pub fn vertex_count(self) -> usize {
        match self {
            CellType::Quadrilateral => 4,
            CellType::Prism => 6,
            CellType::Hexahedron => 8,
        }
    }
}

/// A mesh family: arity plus the static local adjacency tables.
///
/// All tables are indexed by *local* slots. `NODE_EDGES[k]` lists the local
/// edges touching local node `k`, `EDGE_FACES[e]` the local faces containing
/// local edge `e`, and so on.
pub trait ElementShape:
    Copy + Default + std::fmt::Debug + PartialEq + Eq + Send + Sync + 'static
{
    const CELL_TYPE: CellType;
    /// Nodes per element.
    const ARITY: usize;
    /// Local node pairs of every edge.
    const EDGES: &'static [[usize; 2]];
    /// Local node loops of every face.
    const FACES: &'static [&'static [usize]];
    const NODE_EDGES: &'static [&'static [usize]];
    const NODE_FACES: &'static [&'static [usize]];
    const EDGE_FACES: &'static [&'static [usize]];
    const FACE_EDGES: &'static [&'static [usize]];
    /// Reference coordinates of every local node.
    const REFERENCE_VERTICES: &'static [[f64; 3]];
    /// Reference coordinates of the element center.
    const REFERENCE_CENTER: [f64; 3];
    /// Split of the element into simplices (tetrahedra for volumes,
    /// triangles for surfaces), as local node lists.
    const SIMPLICES: &'static [&'static [usize]];

    /// Topological dimension of the family.
    #[inline]
    fn dimension() -> u8 {
        Self::CELL_TYPE.dimension()
    }
}

/// Eight-node hexahedron.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HexShape;

/// Six-node triangular prism.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrismShape;

/// Four-node quadrilateral surface element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuadShape;

impl ElementShape for HexShape {
    const CELL_TYPE: CellType = CellType::Hexahedron;
    const ARITY: usize = 8;
    const EDGES: &'static [[usize; 2]] = &[
        [0, 1],
        [1, 2],
        [2, 3],
        [3, 0],
        [4, 5],
        [5, 6],
        [6, 7],
        [7, 4],
        [0, 4],
        [5, 1],
        [2, 6],
        [7, 3],
    ];
    const FACES: &'static [&'static [usize]] = &[
        &[0, 1, 2, 3],
        &[7, 6, 5, 4],
        &[0, 4, 5, 1],
        &[2, 6, 7, 3],
        &[3, 7, 4, 0],
        &[1, 5, 6, 2],
    ];
    const NODE_EDGES: &'static [&'static [usize]] = &[
        &[0, 3, 8],
        &[0, 1, 9],
        &[1, 2, 10],
        &[2, 3, 11],
        &[4, 7, 8],
        &[4, 5, 9],
        &[5, 6, 10],
        &[6, 7, 11],
    ];
    const NODE_FACES: &'static [&'static [usize]] = &[
        &[0, 2, 4],
        &[0, 2, 5],
        &[0, 3, 5],
        &[0, 3, 4],
        &[1, 2, 4],
        &[1, 2, 5],
        &[1, 3, 5],
        &[1, 3, 4],
    ];
    const EDGE_FACES: &'static [&'static [usize]] = &[
        &[0, 2],
        &[0, 5],
        &[0, 3],
        &[0, 4],
        &[1, 2],
        &[1, 5],
        &[1, 3],
        &[1, 4],
        &[2, 4],
        &[2, 5],
        &[3, 5],
        &[3, 4],
    ];
    const FACE_EDGES: &'static [&'static [usize]] = &[
        &[0, 1, 2, 3],
        &[6, 5, 4, 7],
        &[8, 4, 9, 0],
        &[10, 6, 11, 2],
        &[11, 7, 8, 3],
        &[9, 5, 10, 1],
    ];
    const REFERENCE_VERTICES: &'static [[f64; 3]] = &[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    const REFERENCE_CENTER: [f64; 3] = [0.5, 0.5, 0.5];
    const SIMPLICES: &'static [&'static [usize]] = &[
        &[0, 1, 2, 5],
        &[0, 2, 3, 7],
        &[0, 5, 2, 7],
        &[0, 5, 7, 4],
        &[5, 2, 7, 6],
    ];
}

impl ElementShape for PrismShape {
    const CELL_TYPE: CellType = CellType::Prism;
    const ARITY: usize = 6;
    const EDGES: &'static [[usize; 2]] = &[
        [0, 1],
        [1, 2],
        [2, 0],
        [3, 4],
        [4, 5],
        [5, 3],
        [0, 3],
        [4, 1],
        [2, 5],
    ];
    const FACES: &'static [&'static [usize]] = &[
        &[0, 1, 2],
        &[5, 4, 3],
        &[1, 4, 5, 2],
        &[2, 5, 3, 0],
        &[0, 3, 4, 1],
    ];
    const NODE_EDGES: &'static [&'static [usize]] = &[
        &[0, 2, 6],
        &[0, 1, 7],
        &[1, 2, 8],
        &[3, 5, 6],
        &[3, 4, 7],
        &[4, 5, 8],
    ];
    const NODE_FACES: &'static [&'static [usize]] = &[
        &[0, 3, 4],
        &[0, 2, 4],
        &[0, 2, 3],
        &[1, 3, 4],
        &[1, 2, 4],
        &[1, 2, 3],
    ];
    const EDGE_FACES: &'static [&'static [usize]] = &[
        &[0, 4],
        &[0, 2],
        &[0, 3],
        &[1, 4],
        &[1, 2],
        &[1, 3],
        &[3, 4],
        &[2, 4],
        &[2, 3],
    ];
    const FACE_EDGES: &'static [&'static [usize]] = &[
        &[0, 1, 2],
        &[4, 3, 5],
        &[7, 4, 8, 1],
        &[8, 5, 6, 2],
        &[6, 3, 7, 0],
    ];
    const REFERENCE_VERTICES: &'static [[f64; 3]] = &[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    const REFERENCE_CENTER: [f64; 3] = [1.0 / 3.0, 1.0 / 3.0, 0.5];
    const SIMPLICES: &'static [&'static [usize]] = &[&[0, 1, 2, 4], &[3, 4, 5, 0], &[0, 2, 4, 5]];
}

impl ElementShape for QuadShape {
    const CELL_TYPE: CellType = CellType::Quadrilateral;
    const ARITY: usize = 4;
    const EDGES: &'static [[usize; 2]] = &[[0, 1], [1, 2], [2, 3], [3, 0]];
    const FACES: &'static [&'static [usize]] = &[&[0, 1, 2, 3]];
    const NODE_EDGES: &'static [&'static [usize]] = &[&[0, 3], &[0, 1], &[1, 2], &[2, 3]];
    const NODE_FACES: &'static [&'static [usize]] = &[&[0], &[0], &[0], &[0]];
    const EDGE_FACES: &'static [&'static [usize]] = &[&[0], &[0], &[0], &[0]];
    const FACE_EDGES: &'static [&'static [usize]] = &[&[0, 1, 2, 3]];
    const REFERENCE_VERTICES: &'static [[f64; 3]] =
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
    const REFERENCE_CENTER: [f64; 3] = [0.5, 0.5, 0.0];
    const SIMPLICES: &'static [&'static [usize]] = &[&[0, 1, 2], &[2, 3, 0]];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn edge_nodes<S: ElementShape>(e: usize) -> BTreeSet<usize> {
        S::EDGES[e].iter().copied().collect()
    }

    /// Cross-check the derived tables against `EDGES` / `FACES`.
    fn check_tables<S: ElementShape>() {
        assert_eq!(S::NODE_EDGES.len(), S::ARITY);
        assert_eq!(S::NODE_FACES.len(), S::ARITY);
        assert_eq!(S::EDGE_FACES.len(), S::EDGES.len());
        assert_eq!(S::FACE_EDGES.len(), S::FACES.len());
        assert!(S::FACES.len() <= 8, "boundary mask is one u8 per element");
        assert_eq!(S::REFERENCE_VERTICES.len(), S::ARITY);
        for simplex in S::SIMPLICES {
            assert_eq!(simplex.len(), S::dimension() as usize + 1);
            assert!(simplex.iter().all(|&k| k < S::ARITY));
        }

        for node in 0..S::ARITY {
            let want: BTreeSet<usize> = (0..S::EDGES.len())
                .filter(|&e| S::EDGES[e].contains(&node))
                .collect();
            let got: BTreeSet<usize> = S::NODE_EDGES[node].iter().copied().collect();
            assert_eq!(got, want, "NODE_EDGES[{node}]");

            let want: BTreeSet<usize> = (0..S::FACES.len())
                .filter(|&f| S::FACES[f].contains(&node))
                .collect();
            let got: BTreeSet<usize> = S::NODE_FACES[node].iter().copied().collect();
            assert_eq!(got, want, "NODE_FACES[{node}]");
        }

        for (f, face) in S::FACES.iter().enumerate() {
            let n = face.len();
            let want: BTreeSet<BTreeSet<usize>> = (0..n)
                .map(|k| [face[k], face[(k + 1) % n]].into_iter().collect())
                .collect();
            let got: BTreeSet<BTreeSet<usize>> =
                S::FACE_EDGES[f].iter().map(|&e| edge_nodes::<S>(e)).collect();
            assert_eq!(got, want, "FACE_EDGES[{f}]");
        }

        for e in 0..S::EDGES.len() {
            let want: BTreeSet<usize> = (0..S::FACES.len())
                .filter(|&f| S::FACE_EDGES[f].contains(&e))
                .collect();
            let got: BTreeSet<usize> = S::EDGE_FACES[e].iter().copied().collect();
            assert_eq!(got, want, "EDGE_FACES[{e}]");
        }
    }

    #[test]
    fn hex_tables_are_consistent() {
        check_tables::<HexShape>();
        assert_eq!(HexShape::EDGES.len(), 12);
        assert_eq!(HexShape::FACES.len(), 6);
    }

    #[test]
    fn prism_tables_are_consistent() {
        check_tables::<PrismShape>();
        assert_eq!(PrismShape::EDGES.len(), 9);
        assert_eq!(PrismShape::FACES.len(), 5);
    }

    #[test]
    fn quad_tables_are_consistent() {
        check_tables::<QuadShape>();
        assert_eq!(QuadShape::dimension(), 2);
    }

    #[test]
    fn vertex_count_matches_arity() {
        assert_eq!(CellType::Hexahedron.vertex_count(), HexShape::ARITY);
        assert_eq!(CellType::Prism.vertex_count(), PrismShape::ARITY);
        assert_eq!(CellType::Quadrilateral.vertex_count(), QuadShape::ARITY);
    }
}
