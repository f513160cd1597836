//! Canonical keys for edges and faces.
//!
//! Two elements that share an edge or a face must produce the same key for
//! it, whatever local slot and orientation they see it in:
//! - an edge key is its node pair sorted ascending;
//! - a face key is its node loop rotated so the smallest id comes first,
//!   with degenerate quads folded into triangles. A triangle is a 4-slot key
//!   whose last slot is [`NodeId::DUMMY`]. Equality ignores winding.

use crate::topology::point::NodeId;

const DUMMY: NodeId = NodeId::DUMMY;

/// Sorted node pair identifying an edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey([NodeId; 2]);

impl EdgeKey {
    /// `None` for a degenerate edge (both ends on the same node).
    pub fn new(a: NodeId, b: NodeId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(EdgeKey([a, b])),
            std::cmp::Ordering::Greater => Some(EdgeKey([b, a])),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[inline]
    pub fn nodes(&self) -> [NodeId; 2] {
        self.0
    }
}

/// Rotates a face loop into canonical position.
///
/// `nodes[3] == NodeId::DUMMY` marks a triangle. Returns `None` for faces that
/// are degenerate: a quad whose opposite corners coincide, a quad that
/// collapses to a line, or a triangle with a repeated node. Winding is
/// preserved (the loop is rotated, never reflected). A quad with exactly one
/// repeated adjacent pair is folded into a triangle.
pub fn order_face_nodes(nodes: [NodeId; 4]) -> Option<[NodeId; 4]> {
    let [n0, n1, n2, n3] = nodes;

    if n3 == DUMMY {
        if n0 == n1 || n1 == n2 || n0 == n2 {
            return None;
        }
        let r = if n0 < n1 && n0 < n2 {
            [n0, n1, n2]
        } else if n1 < n2 {
            [n1, n2, n0]
        } else {
            [n2, n0, n1]
        };
        return Some([r[0], r[1], r[2], DUMMY]);
    }

    if n0 == n2 || n1 == n3 {
        return None;
    }

    let [a, mut b, mut c, mut d] = if n0 < n1 && n0 < n2 && n0 < n3 {
        [n0, n1, n2, n3]
    } else if n1 < n2 && n1 < n3 {
        [n1, n2, n3, n0]
    } else if n2 < n3 {
        [n2, n3, n0, n1]
    } else {
        [n3, n0, n1, n2]
    };

    if a == b {
        if c == d {
            return None;
        }
        b = c;
        c = d;
    } else if b == c {
        if a == d {
            return None;
        }
        c = d;
    } else if d == a {
        d = c;
    }
    if c == d {
        d = DUMMY;
    }
    Some([a, b, c, d])
}

/// Hash key of a canonical face.
///
/// Built from the output of [`order_face_nodes`]; the two neighbors of the
/// first node are stored sorted so that both windings of a face compare
/// equal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceKey([NodeId; 4]);

impl FaceKey {
    /// Canonicalizes a face loop.
    ///
    /// Returns the key together with the rotated loop, which keeps the
    /// winding of `nodes`.
    pub fn new(nodes: [NodeId; 4]) -> Option<(FaceKey, [NodeId; 4])> {
        let ordered = order_face_nodes(nodes)?;
        Some((FaceKey::from_ordered(ordered), ordered))
    }

    fn from_ordered(o: [NodeId; 4]) -> FaceKey {
        if o[3] == DUMMY {
            FaceKey([o[0], o[1].min(o[2]), o[1].max(o[2]), DUMMY])
        } else {
            FaceKey([o[0], o[1].min(o[3]), o[2], o[1].max(o[3])])
        }
    }

    #[inline]
    pub fn is_triangle(&self) -> bool {
        self.0[3] == DUMMY
    }

    /// Distinct nodes of the face (3 or 4), not in winding order.
    pub fn nodes(&self) -> &[NodeId] {
        if self.is_triangle() {
            &self.0[..3]
        } else {
            &self.0
        }
    }
}

/// Pads a 3- or 4-node loop into the 4-slot face representation.
pub fn face_slots(loop_nodes: &[NodeId]) -> Option<[NodeId; 4]> {
    match *loop_nodes {
        [a, b, c] => Some([a, b, c, DUMMY]),
        [a, b, c, d] => Some([a, b, c, d]),
        _ => None,
    }
}
