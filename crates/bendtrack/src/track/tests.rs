use super::*;
use crate::bend::BendSpec;
use crate::cfg::{BeamCfg, TrackingCfg};
use crate::C_LIGHT_GEV;
use nalgebra::{vector, Vector3};
use proptest::prelude::*;

fn advancer(b_y: f64, charge: f64) -> DipoleAdvancer<UniformField> {
    DipoleAdvancer::new(TrackingCfg::default(), UniformField::dipole(b_y), charge)
}

#[test]
fn zero_field_moves_straight_exactly() {
    let adv = advancer(0.0, 1.0);
    let s = ParticleState::new(vector![0.1, -0.2, 0.3], vector![0.1, 0.0, 1.0], 1.2);
    let h = 0.7;
    let out = adv.advance(&s, h);
    assert_eq!(out.mode, StepMode::Linear);
    assert_eq!(out.state.position, s.position + s.direction * h);
    assert_eq!(out.state.direction, s.direction);
    assert_eq!(out.state.momentum, s.momentum);
    assert_eq!(out.error.norm(), 0.0);
    assert_eq!(out.dist_chord, 0.0);
}

#[test]
fn neutral_particle_moves_straight() {
    let adv = advancer(2.0, 0.0);
    let s = ParticleState::new(Vector3::zeros(), Vector3::z(), 1.0);
    let out = adv.advance(&s, 1.5);
    assert_eq!(out.mode, StepMode::Linear);
    assert_eq!(out.state.position, vector![0.0, 0.0, 1.5]);
}

#[test]
fn helix_step_retraces_with_negative_length() {
    let adv = advancer(0.5, -1.0);
    let s = ParticleState::new(vector![0.01, 0.0, 0.0], vector![0.02, 0.0, 1.0], 1.0);
    let fwd = adv.advance(&s, 0.5);
    assert_eq!(fwd.mode, StepMode::Helix);
    let back = adv.advance(&fwd.state, -0.5);
    assert_eq!(back.mode, StepMode::Helix);
    assert!((back.state.position - s.position).norm() < 1e-12);
    assert!((back.state.direction - s.direction).norm() < 1e-12);
}

#[test]
fn helix_matches_general_helix_and_circle() {
    let (b, q, p) = (0.8, 1.0, 0.6);
    let adv = advancer(b, q);
    let s = ParticleState::new(Vector3::zeros(), Vector3::z(), p);
    let h = 0.25;
    let out = adv.advance(&s, h);
    assert_eq!(out.mode, StepMode::Helix);

    let (exact, radius) = advance_helix(&s, &vector![0.0, b, 0.0], q, h);
    assert!((out.state.position - exact.position).norm() < 1e-12);
    assert!((out.state.direction - exact.direction).norm() < 1e-12);

    let r = p / (C_LIGHT_GEV * q * b);
    assert!((radius - r).abs() < 1e-12);
    let theta = h / r;
    // positive q·B bends towards −x
    assert!((out.state.position.x + r * (1.0 - theta.cos())).abs() < 1e-12);
    assert!((out.state.position.z - r * theta.sin()).abs() < 1e-12);
    assert!((out.dist_chord - r * (1.0 - (0.5 * theta).cos())).abs() < 1e-15);
    assert_eq!(out.state.momentum, p);
}

#[test]
fn helix_error_vanishes_in_uniform_field_only() {
    let s = ParticleState::new(Vector3::zeros(), vector![0.05, 0.0, 1.0], 0.5);
    let uniform = advancer(1.0, 1.0).advance(&s, 0.2);
    assert_eq!(uniform.mode, StepMode::Helix);
    assert!(uniform.error.norm() < 1e-12);

    // field grows with x: the midpoint sample differs from the start sample
    let graded = |r: &Vector3<f64>| vector![0.0, 1.0 + 5.0 * r.x, 0.0];
    let adv = DipoleAdvancer::new(TrackingCfg::default(), graded, 1.0);
    let out = adv.advance(&s, 0.2);
    assert_eq!(out.mode, StepMode::Helix);
    assert!(out.error.norm() > 1e-8);
}

#[test]
fn spiralling_moves_one_step_along_field() {
    let field = UniformField::new(vector![0.3, 1.0, 0.0]);
    let adv = DipoleAdvancer::new(TrackingCfg::default(), field, 1.0);
    // R = 1e-3 / (0.2998 · 1.04) ≈ 3 mm, under the 5 cm floor
    let s = ParticleState::new(vector![0.0, 0.0, 0.1], vector![0.0, 0.0, 1.0], 1e-3);
    let h = 0.02;
    let out = adv.advance(&s, h);
    assert_eq!(out.mode, StepMode::Spiralling);
    let delta = out.state.position - s.position;
    assert!((delta.norm() - h).abs() < 1e-15);
    assert!(delta.normalize().cross(&field.b.normalize()).norm() < 1e-12);
    assert_eq!(out.state.momentum, s.momentum);
    assert_eq!(out.error[0], 1e-20);
    assert_eq!(out.error[5], 1e-40);
}

#[test]
fn transverse_motion_falls_back_to_rk4() {
    let (b, q) = (1.0, 1.0);
    let adv = advancer(b, q);
    let s = ParticleState::new(Vector3::zeros(), Vector3::x(), 1.0);
    let h = 0.01;
    let out = adv.advance(&s, h);
    assert_eq!(out.mode, StepMode::RungeKutta);
    let (exact, _) = advance_helix(&s, &vector![0.0, b, 0.0], q, h);
    assert!((out.state.position - exact.position).norm() < 1e-10);
    let r = 1.0 / (C_LIGHT_GEV * b);
    let sagitta = r * (1.0 - (0.5 * h / r).cos());
    assert!((out.dist_chord - sagitta).abs() < 1e-9);
}

#[test]
fn mode_table() {
    let cfg = TrackingCfg::default();
    let fwd = ParticleState::new(Vector3::zeros(), Vector3::z(), 1.0);
    let y = vector![0.0, 1.0, 0.0];
    assert_eq!(select_mode(&cfg, &Vector3::zeros(), 1.0, &fwd), StepMode::Linear);
    assert_eq!(select_mode(&cfg, &y, 0.0, &fwd), StepMode::Linear);
    assert_eq!(select_mode(&cfg, &y, 1.0, &fwd), StepMode::Helix);
    // slow but not spiralling: R = 0.03 / 0.02998 ≈ 1 m
    let slow = ParticleState { momentum: 0.03, ..fwd };
    assert_eq!(select_mode(&cfg, &(y * 0.1), 1.0, &slow), StepMode::RungeKutta);
    // steep angle to the axis
    let steep = ParticleState::new(Vector3::zeros(), vector![1.0, 0.0, 1.0], 1.0);
    assert_eq!(select_mode(&cfg, &y, 1.0, &steep), StepMode::RungeKutta);
    // field with a component off the dipole axis
    assert_eq!(
        select_mode(&cfg, &vector![0.5, 0.0, 0.0], 1.0, &fwd),
        StepMode::RungeKutta
    );
    // tiny bending radius wins over everything but a vanishing field
    let soft = ParticleState { momentum: 1e-4, ..fwd };
    assert_eq!(select_mode(&cfg, &y, 1.0, &soft), StepMode::Spiralling);
    assert_eq!(adv_mode(&soft), StepMode::Spiralling);
}

fn adv_mode(s: &ParticleState) -> StepMode {
    advancer(1.0, 1.0).mode_for(s)
}

#[test]
fn drive_lands_on_path_length() {
    let adv = advancer(0.4, 1.0);
    let s = ParticleState::new(Vector3::zeros(), Vector3::z(), 2.0);
    let traj = drive(&adv, s, 1.0, 0.3);
    assert_eq!(traj.len(), 5);
    assert_eq!(traj.points[0].mode, None);
    let last = traj.last().unwrap();
    assert!((last.s - 1.0).abs() < 1e-12);
    assert_eq!(traj.count_mode(StepMode::Helix), 4);
    let (exact, _) = advance_helix(&s, &vector![0.0, 0.4, 0.0], 1.0, 1.0);
    assert!((last.state.position - exact.position).norm() < 1e-12);
    assert!(traj.max_dist_chord() > 0.0);
}

#[test]
fn drive_with_bad_step_records_start_only() {
    let adv = advancer(0.4, 1.0);
    let s = ParticleState::new(Vector3::zeros(), Vector3::z(), 2.0);
    assert_eq!(drive(&adv, s, 1.0, 0.0).len(), 1);
    assert_eq!(drive(&adv, s, -1.0, 0.1).len(), 1);
    assert_eq!(drive(&adv, s, 1.0, f64::NAN).len(), 1);
}

#[test]
fn drive_with_vanishing_step_records_start_only() {
    let adv = advancer(0.4, 1.0);
    let s = ParticleState::new(Vector3::zeros(), Vector3::z(), 2.0);
    let traj = drive(&adv, s, 1.0, 1e-300);
    assert_eq!(traj.len(), 1);
    assert_eq!(traj.points[0].state, s);
    // just past the cap is refused, a coarse step is not
    assert_eq!(drive(&adv, s, 1.0, 1.0 / (MAX_DRIVE_STEPS as f64 * 2.0)).len(), 1);
    assert_eq!(drive(&adv, s, 1.0, 0.5).len(), 3);
}

#[test]
fn nominal_particle_turns_through_bend_angle() {
    let beam = BeamCfg::default();
    let (length, angle) = (2.0, 0.15);
    let spec = BendSpec::from_nominal("sb", length, angle, &beam);
    let adv = DipoleAdvancer::new(
        TrackingCfg::default(),
        UniformField::dipole(spec.field),
        beam.charge,
    );
    let s = ParticleState::new(Vector3::zeros(), Vector3::z(), beam.nominal_momentum());
    let traj = drive(&adv, s, length, 0.1);
    let end = traj.last().unwrap().state;
    let turned = (-end.direction.x).atan2(end.direction.z);
    assert!((turned - angle).abs() < 1e-12);
    // ends on the arc of radius L/θ
    let rho = length / angle;
    let expect = vector![-rho * (1.0 - angle.cos()), 0.0, rho * angle.sin()];
    assert!((end.position - expect).norm() < 1e-9);
}

#[test]
fn advancers_run_independently_per_thread() {
    let adv = advancer(0.7, 1.0);
    let starts: Vec<ParticleState> = (0..4)
        .map(|i| ParticleState::new(vector![0.001 * i as f64, 0.0, 0.0], Vector3::z(), 1.0))
        .collect();
    let serial: Vec<_> = starts.iter().map(|s| adv.advance(s, 0.3).state).collect();
    let parallel: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = starts
            .iter()
            .map(|s| {
                let local = adv.clone();
                scope.spawn(move || local.advance(s, 0.3).state)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(serial, parallel);
}

proptest! {
    #[test]
    fn helix_conserves_momentum_and_reverses(
        b in prop_oneof![-2.0f64..-0.1, 0.1f64..2.0],
        xp in -0.2f64..0.2,
        p in 0.5f64..10.0,
        h in 0.01f64..1.0,
    ) {
        let adv = advancer(b, 1.0);
        let s = ParticleState::new(Vector3::zeros(), vector![xp, 0.0, 1.0], p);
        let fwd = adv.advance(&s, h);
        prop_assume!(fwd.mode == StepMode::Helix);
        prop_assert_eq!(fwd.state.momentum, p);
        prop_assert!((fwd.state.direction.norm() - 1.0).abs() < 1e-12);
        let back = adv.advance(&fwd.state, -h);
        prop_assume!(back.mode == StepMode::Helix);
        prop_assert!((back.state.position - s.position).norm() < 1e-9);
    }

    #[test]
    fn spiralling_displacement_equals_step(
        bx in -1.0f64..1.0,
        by in 0.5f64..3.0,
        h in 1e-4f64..0.5,
    ) {
        let adv = DipoleAdvancer::new(
            TrackingCfg::default(),
            UniformField::new(vector![bx, by, 0.0]),
            1.0,
        );
        let s = ParticleState::new(Vector3::zeros(), Vector3::z(), 1e-4);
        let out = adv.advance(&s, h);
        prop_assert_eq!(out.mode, StepMode::Spiralling);
        prop_assert!(((out.state.position - s.position).norm() - h).abs() < 1e-12 * h.max(1.0));
    }
}
