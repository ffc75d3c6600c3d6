//! # Trajectory Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nalgebra::Vector2;
use race_lib::{
    loc::Pose,
    track::Track,
    traj_ctrl::{Params, TrackGeometry, TrajCtrl},
};

fn traj_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a dummy track ----

    let track = Track::ellipse(Vector2::zeros(), 3000.0, 1500.0, 40, 200.0).unwrap();
    let params = Params::default();

    c.bench_function("TrackGeometry::build", |b| {
        b.iter(|| TrackGeometry::build(black_box(track.clone()), &params))
    });

    let mut traj_ctrl = TrajCtrl::new(track.clone(), params).unwrap();

    // Between the first two waypoints, facing along the track
    let position_m = (track.waypoint(0) + track.waypoint(1)) / 2.0;
    let pose = Pose::new(position_m, std::f64::consts::FRAC_PI_2);
    let velocity_ms = pose.forward() * 150.0;

    c.bench_function("TrajCtrl::compute_command", |b| {
        b.iter(|| {
            traj_ctrl
                .compute_command(black_box(1), &pose, &velocity_ms)
                .unwrap()
        })
    });
}

criterion_group!(benches, traj_ctrl_benchmark);
criterion_main!(benches);
