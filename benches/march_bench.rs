// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use eikonal_fmm::{FastMarching, Mesh};

/// Level set of a circular hole, scaled so the march has real work to do.
fn circle_field(mesh: &Mesh, radius: f64) -> Vec<f64> {
    let cx = mesh.width() as f64 / 2.0;
    let cy = mesh.height() as f64 / 2.0;
    mesh.nodes
        .iter()
        .map(|n| 2.0 * ((n.coord.x - cx).hypot(n.coord.y - cy) - radius))
        .collect()
}

/// Distance only: 256^2 with one circular front.
fn bench_distance_256(c: &mut Criterion) {
    let mesh = Mesh::new(256, 256).unwrap();
    let field = circle_field(&mesh, 64.0);
    c.bench_function("march_256x256", |b| {
        b.iter_with_setup(
            || field.clone(),
            |mut phi| {
                let mut fmm = FastMarching::new(&mesh);
                fmm.march(&mut phi).unwrap();
                black_box(phi)
            },
        );
    });
}

/// Distance plus velocity extension on the same problem.
fn bench_velocity_256(c: &mut Criterion) {
    let mesh = Mesh::new(256, 256).unwrap();
    let field = circle_field(&mesh, 64.0);
    let velocity: Vec<f64> = mesh.nodes.iter().map(|n| n.coord.y).collect();
    c.bench_function("march_velocity_256x256", |b| {
        b.iter_with_setup(
            || (field.clone(), velocity.clone()),
            |(mut phi, mut vel)| {
                let mut fmm = FastMarching::new(&mesh);
                fmm.march_with_velocity(&mut phi, &mut vel).unwrap();
                black_box((phi, vel))
            },
        );
    });
}

/// Grid size scaling with a front of proportional radius.
fn bench_grid_size_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_size_scaling");
    for &n in &[64, 128, 256, 512] {
        let mesh = Mesh::new(n, n).unwrap();
        let field = circle_field(&mesh, n as f64 / 4.0);
        group.bench_function(format!("{}x{}", n, n), |b| {
            b.iter_with_setup(
                || field.clone(),
                |mut phi| {
                    let mut fmm = FastMarching::new(&mesh);
                    fmm.march(&mut phi).unwrap();
                    black_box(phi)
                },
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_distance_256,
    bench_velocity_256,
    bench_grid_size_scaling,
);
criterion_main!(benches);
