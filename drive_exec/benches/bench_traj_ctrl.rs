//! # Trajectory Control Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use drive_lib::{
    kinematics::WheelPair,
    loc::Pose,
    traj_ctrl::{Params, TrajCtrl, Trajectory, TrajectorySample},
    vel_ctrl::{self, WheelVelCtrl},
};

fn traj_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a constant-curvature arc to track ----

    // 10 s arc at 1 m/s, radius 2 m, sampled at the cycle rate
    let samples: Vec<TrajectorySample> = (0..=500)
        .map(|i| {
            let t = i as f64 * 0.02;
            let heading = 0.5 * t;
            TrajectorySample {
                time_s: t,
                pose: Pose::new(2.0 * heading.sin(), 2.0 * (1.0 - heading.cos()), heading),
                velocity_ms: 1.0,
                angular_velocity_rads: 0.5,
                curvature_per_m: 0.5,
            }
        })
        .collect();

    let trajectory = Trajectory::new(samples).unwrap();

    let mut tracker = TrajCtrl::from_params(Params {
        ramsete_b: 2.0,
        ramsete_zeta: 0.7,
        track_width_m: 0.66,
    })
    .unwrap();

    let vel_params = vel_ctrl::Params {
        k_p: 1.2,
        k_d: 0.05,
        k_s: 0.55,
        k_v: 2.3,
        k_a: 0.12,
    };
    let mut servos = WheelPair::new(
        WheelVelCtrl::new(&vel_params),
        WheelVelCtrl::new(&vel_params),
    );

    // A pose slightly off the path, mid-trajectory
    let pose = Pose::new(1.62, 1.1, 0.85);
    let measured = WheelPair::new(0.85, 1.15);

    c.bench_function("TrajCtrl::proc", |b| {
        b.iter(|| tracker.proc(&trajectory, 3.456, &pose, &measured, &mut servos, 0.02))
    });
}

criterion_group!(benches, traj_ctrl_benchmark);
criterion_main!(benches);
