//! # Twist Controller Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dbw_lib::twist_ctrl::{Controller, Params, YawController};

fn twist_ctrl_benchmark(c: &mut Criterion) {
    let params = Params::default();

    let mut controller = Controller::new(&params).unwrap();
    let yaw_ctrl = YawController::new(&params.vehicle);

    // One full control tick, alternating the measured speed so the filter and
    // integrator keep moving
    let mut current_vel_ms = 4.0;
    c.bench_function("Controller::control", |b| {
        b.iter(|| {
            current_vel_ms = if current_vel_ms > 4.0 { 3.9 } else { 4.1 };
            controller.control(
                black_box(current_vel_ms),
                black_box(true),
                black_box(5.0),
                black_box(0.1),
            )
        })
    });

    c.bench_function("YawController::get_steering", |b| {
        b.iter(|| yaw_ctrl.get_steering(black_box(5.0), black_box(0.3), black_box(4.0)))
    });
}

criterion_group!(benches, twist_ctrl_benchmark);
criterion_main!(benches);
