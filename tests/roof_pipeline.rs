#![allow(clippy::unwrap_used)]

use approx::assert_abs_diff_eq;
use roofsmith::math::Point3;
use roofsmith::operations::{ExtractFootprint, RoofSkeleton};
use roofsmith::tessellation::TriangulateRoof;
use roofsmith::{FootprintPolygon, SlopeSpec};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn l_shape() -> FootprintPolygon {
    FootprintPolygon::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 2.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(2.0, 4.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ],
        Vec::new(),
    )
}

#[test]
fn triangulated_roof_edges_yield_the_same_footprint() {
    init_tracing();
    let footprint = l_shape();
    let roof = RoofSkeleton::from_polygon(&footprint, SlopeSpec::from_degrees(30.0))
        .execute()
        .unwrap();
    let triangles = TriangulateRoof::new(&roof).execute().unwrap();

    let recovered = ExtractFootprint::new(triangles.edge_segments())
        .execute()
        .unwrap();
    assert!(recovered.holes.is_empty());
    assert_eq!(recovered.outer.len(), footprint.outer.len());
    assert_abs_diff_eq!(recovered.area(), footprint.area(), epsilon = 1e-6);
    for p in &footprint.outer {
        assert!(recovered
            .outer
            .iter()
            .any(|q| (q - p).norm() < 1e-6));
    }
}

#[test]
fn triangulation_preserves_roof_area() {
    init_tracing();
    let roof = RoofSkeleton::from_polygon(&l_shape(), SlopeSpec::Height(1.5))
        .execute()
        .unwrap();
    let triangles = TriangulateRoof::new(&roof).execute().unwrap();
    assert_abs_diff_eq!(triangles.area(), roof.surface_area(), epsilon = 1e-6);
    assert!(triangles.normals.iter().all(|n| n.z > 0.0));
}

#[test]
fn courtyard_roof_keeps_eaves_on_both_rings() {
    init_tracing();
    let outer = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(12.0, 0.0, 0.0),
        Point3::new(12.0, 12.0, 0.0),
        Point3::new(0.0, 12.0, 0.0),
    ];
    let hole = vec![
        Point3::new(4.0, 4.0, 0.0),
        Point3::new(8.0, 4.0, 0.0),
        Point3::new(8.0, 8.0, 0.0),
        Point3::new(4.0, 8.0, 0.0),
    ];
    let roof = RoofSkeleton::from_polygon(
        &FootprintPolygon::new(outer, vec![hole]),
        SlopeSpec::from_degrees(45.0),
    )
    .execute()
    .unwrap();
    assert_eq!(roof.footprint.len(), 2);
    assert_eq!(roof.footprint_vertex_count(), 8);
    assert_eq!(roof.footprint_edges().len(), 8);
    assert_abs_diff_eq!(roof.apex_height(), 2.0, epsilon = 1e-6);
}
