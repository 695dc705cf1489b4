use criterion::{black_box, criterion_group, criterion_main, Criterion};

use whitebox::{shape, WhiteBoxMesh};

fn build_unit_cube(c: &mut Criterion) {
    c.bench_function("build_unit_cube", |b| {
        b.iter(|| {
            let mut mesh = WhiteBoxMesh::new();
            shape::unit_cube(&mut mesh);
            black_box(mesh.num_faces())
        })
    });
}

fn extrude_top_polygon(c: &mut Criterion) {
    c.bench_function("extrude_top_polygon", |b| {
        b.iter(|| {
            let mut mesh = WhiteBoxMesh::new();
            let polygons = shape::unit_cube(&mut mesh);
            let appended = mesh.translate_polygon_append(&polygons[0], 1.0);
            black_box(appended.face_handles.len())
        })
    });
}

fn polygon_flood_fill(c: &mut Criterion) {
    let mut mesh = WhiteBoxMesh::new();
    let polygons = shape::unit_cube(&mut mesh);
    for polygon in polygons.iter().take(4) {
        let polygon = mesh.face_polygon_handle(polygon.face_handles[0]);
        mesh.translate_polygon_append(&polygon, 1.0);
    }

    c.bench_function("mesh_polygon_handles", |b| {
        b.iter(|| black_box(mesh.mesh_polygon_handles().len()))
    });
}

criterion_group!(benches, build_unit_cube, extrude_top_polygon, polygon_flood_fill);
criterion_main!(benches);
