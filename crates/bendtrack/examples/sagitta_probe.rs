//! Sagitta probe for a split sector bend.
//!
//! Purpose
//! - Show, for one bend, how the segment count follows the precision and how
//!   far the tracked arc strays from each segment's chord.
//!
//! Why this shape
//! - The nominal particle is driven with one step per body segment, so the
//!   reported sagitta is the per-segment chord error the split is sized for.
//!
//! Code: crates/bendtrack/src/bend/count.rs::segment_count

use std::time::Instant;

use bendtrack::api::{
    build_sbend, drive, segment_count, BendSpec, DipoleAdvancer, ParticleState, UniformField,
};
use bendtrack::{Config, Vec3};

fn main() {
    let mut cfg = Config::default();
    let spec = BendSpec::from_nominal("probe", 2.0, 0.2, &cfg.beam).with_polefaces(0.05, 0.05);

    for precision in [1e-2, 1e-3, 1e-4, 1e-5] {
        cfg.bend.precision = precision;
        let n = segment_count(&spec, &cfg.bend);
        let line = build_sbend(&spec, &cfg.bend).expect("probe bend is valid");

        let field = UniformField::dipole(spec.field);
        let advancer = DipoleAdvancer::new(cfg.tracking, field, cfg.beam.charge);
        let start = ParticleState::new(Vec3::zeros(), Vec3::z(), cfg.beam.nominal_momentum());
        let t0 = Instant::now();
        let traj = drive(&advancer, start, spec.length, spec.length / n as f64);
        let elapsed_us = t0.elapsed().as_secs_f64() * 1e6;

        println!(
            "precision={precision:.0e} n={n} segments={} sagitta={:.3e} m drive={elapsed_us:.1} us",
            line.len(),
            traj.max_dist_chord(),
        );
    }
}
