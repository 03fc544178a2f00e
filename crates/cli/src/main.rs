use anyhow::{bail, Context, Result};
use bendtrack::api::{
    build_rbend, build_sbend, drive, sample_bunch, BendLine, BendSpec, BunchCfg, Config,
    DipoleAdvancer, ParticleState, RBendNeighbours, StepMode, Trajectory, UniformField,
};
use bendtrack::Vec3;
use clap::{Parser, Subcommand};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;

use provenance::Sidecar;

#[derive(Parser)]
#[command(name = "bendtrack-cli")]
#[command(about = "Split bends into segments and track bunches through dipoles")]
struct Cmd {
    /// Optional JSON config; missing fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Split a bend and print or write the segment table
    Segments {
        #[arg(long, default_value = "bend")]
        name: String,
        #[arg(long)]
        length: f64,
        #[arg(long, allow_hyphen_values = true)]
        angle: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        e1: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        e2: f64,
        /// Rectangular bend instead of a sector bend
        #[arg(long)]
        rbend: bool,
        /// Max sagitta per segment [m]; overrides the config
        #[arg(long)]
        precision: Option<f64>,
        #[arg(long)]
        dont_split: bool,
        #[arg(long)]
        no_fringe: bool,
        /// CSV output; prints the table when omitted
        #[arg(long)]
        out: Option<String>,
    },
    /// Track a Gaussian bunch through a uniform dipole
    Track {
        #[arg(long)]
        length: f64,
        #[arg(long, allow_hyphen_values = true)]
        angle: f64,
        /// Field [T]; defaults to the nominal field for `angle`
        #[arg(long, allow_hyphen_values = true)]
        field: Option<f64>,
        /// Number of steps over `length`
        #[arg(long, default_value_t = 100)]
        steps: usize,
        #[arg(long, default_value_t = 16)]
        particles: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// CSV with columns x,y,xp,yp,p; replaces the sampled bunch
        #[arg(long)]
        bunch: Option<String>,
        #[arg(long)]
        out: String,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    let mut cfg = load_config(cmd.config.as_deref())?;
    match cmd.action {
        Action::Segments {
            name,
            length,
            angle,
            e1,
            e2,
            rbend,
            precision,
            dont_split,
            no_fringe,
            out,
        } => {
            apply_bend_flags(&mut cfg, precision, dont_split, no_fringe)?;
            let spec =
                BendSpec::from_nominal(name, length, angle, &cfg.beam).with_polefaces(e1, e2);
            segments(&cfg, &spec, rbend, out.as_deref())
        }
        Action::Track {
            length,
            angle,
            field,
            steps,
            particles,
            seed,
            bunch,
            out,
        } => {
            let mut spec = BendSpec::from_nominal("track", length, angle, &cfg.beam);
            if let Some(b) = field {
                spec = spec.with_field(b);
            }
            let run = TrackRun {
                steps,
                particles,
                seed,
                bunch,
            };
            track(&cfg, &spec, &run, &out)
        }
        Action::Report => report(),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(p) => {
            let bytes = std::fs::read(p).with_context(|| format!("reading {}", p.display()))?;
            serde_json::from_slice::<Config>(&bytes)
                .with_context(|| format!("parsing {}", p.display()))?
        }
        None => Config::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Command-line flags win over the config file.
fn apply_bend_flags(
    cfg: &mut Config,
    precision: Option<f64>,
    dont_split: bool,
    no_fringe: bool,
) -> Result<()> {
    if let Some(p) = precision {
        cfg.bend.precision = p;
    }
    cfg.bend.dont_split |= dont_split;
    if no_fringe {
        cfg.bend.include_fringe = false;
    }
    cfg.validate()?;
    Ok(())
}

fn segments(cfg: &Config, spec: &BendSpec, rbend: bool, out: Option<&str>) -> Result<()> {
    tracing::info!(
        name = %spec.name,
        length = spec.length,
        angle = spec.angle,
        e1 = spec.e1,
        e2 = spec.e2,
        rbend,
        "segments"
    );
    let line = if rbend {
        build_rbend(spec, RBendNeighbours::default(), &cfg.bend)?
    } else {
        build_sbend(spec, &cfg.bend)?
    };
    tracing::info!(
        segments = line.len(),
        body = line.n_body(),
        total_angle = line.total_angle(),
        "split done"
    );
    let mut df = segment_table(&line)?;
    match out {
        Some(out) => {
            write_csv(&mut df, out)?;
            let params = serde_json::json!({
                "spec": {
                    "name": spec.name,
                    "length": spec.length,
                    "angle": spec.angle,
                    "e1": spec.e1,
                    "e2": spec.e2,
                    "field": spec.field,
                    "rbend": rbend
                },
                "bend": cfg.bend,
                "segments": line.len()
            });
            Sidecar::new("segments", Path::new(out), df.height(), params).write()?;
        }
        None => println!("{df}"),
    }
    Ok(())
}

fn segment_table(line: &BendLine) -> PolarsResult<DataFrame> {
    let name: Vec<&str> = line.iter().map(|s| s.name.as_str()).collect();
    let kind: Vec<&str> = line
        .iter()
        .map(|s| if s.is_fringe() { "fringe" } else { "body" })
        .collect();
    let length: Vec<f64> = line.iter().map(|s| s.length).collect();
    let angle: Vec<f64> = line.iter().map(|s| s.angle).collect();
    let angle_in: Vec<f64> = line.iter().map(|s| s.angle_in).collect();
    let angle_out: Vec<f64> = line.iter().map(|s| s.angle_out).collect();
    let field: Vec<f64> = line.iter().map(|s| s.field).collect();
    df!(
        "name" => name,
        "kind" => kind,
        "length" => length,
        "angle" => angle,
        "angle_in" => angle_in,
        "angle_out" => angle_out,
        "field" => field
    )
}

struct TrackRun {
    steps: usize,
    particles: usize,
    seed: u64,
    bunch: Option<String>,
}

fn track(cfg: &Config, spec: &BendSpec, run: &TrackRun, out: &str) -> Result<()> {
    spec.validate()?;
    if run.steps == 0 {
        bail!("--steps must be at least 1");
    }
    tracing::info!(
        length = spec.length,
        angle = spec.angle,
        field = spec.field,
        steps = run.steps,
        "track"
    );
    let starts = match &run.bunch {
        Some(path) => read_bunch(path)?,
        None => {
            let bunch_cfg = BunchCfg {
                momentum: cfg.beam.nominal_momentum(),
                ..BunchCfg::default()
            };
            sample_bunch(&bunch_cfg, run.particles, run.seed)?
        }
    };
    let advancer = DipoleAdvancer::new(
        cfg.tracking,
        UniformField::dipole(spec.field),
        cfg.beam.charge,
    );
    let step = spec.length / run.steps as f64;
    let trajectories: Vec<Trajectory> = starts
        .iter()
        .map(|s| drive(&advancer, *s, spec.length, step))
        .collect();
    let helix: usize = trajectories.iter().map(|t| t.count_mode(StepMode::Helix)).sum();
    let rk4: usize = trajectories
        .iter()
        .map(|t| t.count_mode(StepMode::RungeKutta))
        .sum();
    tracing::info!(particles = starts.len(), helix, rk4, "tracking done");

    let mut df = trajectory_table(&trajectories)?;
    write_csv(&mut df, out)?;
    let params = serde_json::json!({
        "length": spec.length,
        "angle": spec.angle,
        "field": spec.field,
        "steps": run.steps,
        "particles": starts.len(),
        "seed": run.seed,
        "bunch": run.bunch,
        "tracking": cfg.tracking,
        "beam": cfg.beam
    });
    Sidecar::new("track", Path::new(out), df.height(), params).write()?;
    Ok(())
}

fn mode_label(mode: Option<StepMode>) -> &'static str {
    match mode {
        None => "start",
        Some(StepMode::Linear) => "linear",
        Some(StepMode::Spiralling) => "spiralling",
        Some(StepMode::Helix) => "helix",
        Some(StepMode::RungeKutta) => "runge_kutta",
    }
}

fn trajectory_table(trajectories: &[Trajectory]) -> PolarsResult<DataFrame> {
    let rows = trajectories.iter().map(Trajectory::len).sum();
    let mut particle = Vec::with_capacity(rows);
    let mut s = Vec::with_capacity(rows);
    let mut x = Vec::with_capacity(rows);
    let mut y = Vec::with_capacity(rows);
    let mut z = Vec::with_capacity(rows);
    let mut px = Vec::with_capacity(rows);
    let mut py = Vec::with_capacity(rows);
    let mut pz = Vec::with_capacity(rows);
    let mut mode = Vec::with_capacity(rows);
    let mut dist_chord = Vec::with_capacity(rows);
    for (i, t) in trajectories.iter().enumerate() {
        for pt in &t.points {
            let p = pt.state.momentum_vector();
            particle.push(i as u32);
            s.push(pt.s);
            x.push(pt.state.position.x);
            y.push(pt.state.position.y);
            z.push(pt.state.position.z);
            px.push(p.x);
            py.push(p.y);
            pz.push(p.z);
            mode.push(mode_label(pt.mode));
            dist_chord.push(pt.dist_chord);
        }
    }
    df!(
        "particle" => particle,
        "s" => s,
        "x" => x,
        "y" => y,
        "z" => z,
        "px" => px,
        "py" => py,
        "pz" => pz,
        "mode" => mode,
        "dist_chord" => dist_chord
    )
}

fn read_bunch(path: &str) -> Result<Vec<ParticleState>> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(100))
        .finish()?
        .collect()
        .with_context(|| format!("reading bunch {path}"))?;
    let column = |name: &str| -> Result<Vec<f64>> {
        let values = df
            .column(name)
            .with_context(|| format!("bunch column {name}"))?
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .collect::<Vec<Option<f64>>>();
        if let Some(row) = values.iter().position(Option::is_none) {
            bail!("bunch column {name}: empty cell in row {row}");
        }
        Ok(values.into_iter().flatten().collect())
    };
    let (x, y, xp, yp, p) = (
        column("x")?,
        column("y")?,
        column("xp")?,
        column("yp")?,
        column("p")?,
    );
    let states = (0..df.height())
        .map(|i| {
            ParticleState::new(
                Vec3::new(x[i], y[i], 0.0),
                Vec3::new(xp[i], yp[i], 1.0),
                p[i],
            )
        })
        .collect::<Vec<_>>();
    if let Some(bad) = states.iter().position(|s| !(s.momentum > 0.0)) {
        bail!("bunch row {bad}: momentum must be > 0");
    }
    tracing::info!(rows = states.len(), path, "bunch loaded");
    Ok(states)
}

fn write_csv(df: &mut DataFrame, out: &str) -> Result<()> {
    let out_path = Path::new(out);
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(out_path).with_context(|| format!("creating {out}"))?;
    CsvWriter::new(&mut file).finish(df)?;
    tracing::info!(rows = df.height(), out, "wrote table");
    Ok(())
}

fn report() -> Result<()> {
    let obj = serde_json::json!({
        "code_rev": provenance::code_rev(),
        "bendtrack": bendtrack::VERSION,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
