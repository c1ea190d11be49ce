use std::{
    convert::Infallible,
    error::Error,
    f64::consts::PI,
    fs::File,
    future::Future,
    io::BufWriter,
    path::PathBuf,
    sync::Arc,
};

use clap::Parser;
use joint_retimer::{
    config::RetimeJob,
    path::sample_curve,
    playback::{launch_playback_thread, JointCommandSink, CONTROL_PERIOD},
    retiming::SmoothingPolicy,
    trajectories::{RetimeDiagnostics, TrajectorySample},
    JointLimits, JointVector, RetimeOptions,
};
use serde::Serialize;
use tokio::{select, sync::watch};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Time-optimal retiming of joint-space paths")]
struct Cli {
    /// JSON job (waypoints, limits, options), the built-in demo curve when omitted
    job: Option<PathBuf>,

    /// Where to write the diagnostics (and dense samples) as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Dense sampling step in seconds
    #[arg(long)]
    sample_step: Option<f64>,

    /// Round corners with this bevel radius
    #[arg(long)]
    smoothing_radius: Option<f64>,

    /// Max points inserted per smoothed corner
    #[arg(long, default_value_t = 8)]
    max_subdivisions: usize,

    /// Stream the trajectory at the control rate once retimed
    #[arg(long)]
    play: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    diagnostics: RetimeDiagnostics,
    samples: Option<&'a [TrajectorySample]>,
}

/// 3-joint curve sampled every 0.1 s over 20 s
fn demo_job() -> RetimeJob {
    let curve = |t: f64| {
        JointVector::from([
            if t < 10. { t } else { 20. - t },
            5. * (2. * PI / 20. * t).sin(),
            -t * t / 10. + 2. * t,
        ])
    };
    RetimeJob {
        waypoints: sample_curve(curve, 20., 0.1),
        limits: JointLimits::new([1., 0.5, 0.5], [0.2, 0.3, 0.5]),
        options: RetimeOptions::default(),
    }
}

struct LoggingSink;

impl JointCommandSink<Infallible> for LoggingSink {
    fn send_setpoint(
        &mut self,
        sample: &TrajectorySample,
    ) -> impl Future<Output = Result<(), Infallible>> + Send {
        debug!(
            t = sample.t,
            position = ?sample.position,
            velocity = ?sample.velocity,
            "setpoint"
        );
        async { Ok(()) }
    }

    fn close(self) -> impl Future<Output = Result<(), Infallible>> + Send {
        info!("playback closed");
        async { Ok(()) }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut job = match &cli.job {
        Some(path) => RetimeJob::from_json_file(path)?,
        None => {
            info!("no job given, retiming the demo curve");
            demo_job()
        }
    };
    if let Some(radius) = cli.smoothing_radius {
        job.options.smoothing = SmoothingPolicy::FixedRadius {
            radius,
            max_subdivisions: cli.max_subdivisions,
        };
    }
    if let Some(dt) = cli.sample_step {
        job.options.sample_interval = Some(dt);
    }

    let trajectory = job.run()?;
    let diagnostics = trajectory.diagnostics();
    info!(
        total_duration = diagnostics.total_duration,
        iterations = diagnostics.iterations,
        zero_nodes = ?diagnostics.zero_nodes,
        peak_joint_speeds = ?trajectory.peak_joint_speeds(),
        "done"
    );

    if let Some(path) = &cli.output {
        let report = Report {
            diagnostics,
            samples: trajectory.dense_samples(),
        };
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &report)?;
        info!("diagnostics written to {}", path.display());
    }

    if cli.play {
        let (sender, receiver) = watch::channel(Arc::new(trajectory));
        let (stop, mut handle) = launch_playback_thread(receiver, LoggingSink, CONTROL_PERIOD);
        // nothing else will be played, let the task end with this trajectory
        drop(sender);

        let finished = select! {
            outcome = &mut handle => Some(outcome),
            _ = tokio::signal::ctrl_c() => None,
        };
        let outcome = match finished {
            Some(outcome) => outcome,
            None => {
                info!("interrupted, stopping playback");
                let _ = stop.send(());
                handle.await
            }
        };
        outcome??;
    }

    Ok(())
}
