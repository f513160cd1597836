mod util;

use mesh_locate::prelude::*;
use util::*;

#[test]
fn json_round_trip_rebuilds_identical_topology() {
    let mesh = prism_block(2);
    mesh.synchronize(TableMask::EDGES | TableMask::FACES).unwrap();

    let json = serde_json::to_string(&mesh.to_data()).unwrap();
    let data: MeshData = serde_json::from_str(&json).unwrap();
    let back = PrismVolMesh::from_data(data).unwrap();

    assert!(!back.is_synchronized(TableMask::EDGES));
    back.synchronize(TableMask::EDGES | TableMask::FACES).unwrap();
    assert_eq!(
        back.edge_table("t").unwrap().len(),
        mesh.edge_table("t").unwrap().len()
    );
    let a: Vec<_> = mesh.face_table("t").unwrap().iter().map(|(_, f)| f.nodes).collect();
    let b: Vec<_> = back.face_table("t").unwrap().iter().map(|(_, f)| f.nodes).collect();
    assert_eq!(a, b);
}

#[test]
fn bincode_round_trip_answers_the_same_queries() {
    let mesh = hex_block(2);
    let bytes = bincode::serialize(&mesh.to_data()).unwrap();
    let back = HexVolMesh::from_data(bincode::deserialize(&bytes).unwrap()).unwrap();

    for p in random_points(3, 50, -0.5, 2.5) {
        assert_eq!(mesh.locate_element(p).unwrap(), back.locate_element(p).unwrap());
        assert_eq!(
            mesh.find_closest_node(p, -1.0).unwrap(),
            back.find_closest_node(p, -1.0).unwrap()
        );
    }
}

#[test]
fn ids_serialize_transparently() {
    let json = serde_json::to_string(&[NodeId::new(3), NodeId::new(9)]).unwrap();
    assert_eq!(json, "[3,9]");
    let data = MeshData {
        cell_type: CellType::Quadrilateral,
        points: vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
        elements: vec![NodeId::new(0), NodeId::new(1), NodeId::new(2)],
    };
    // three ids are not a whole quad
    assert_eq!(
        QuadSurfMesh::from_data(data).unwrap_err(),
        MeshError::RaggedConnectivity { len: 3, arity: 4 }
    );
}
