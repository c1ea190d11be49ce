//! Streams a retimed trajectory to an executor at a fixed control rate.

use std::{fmt::Debug, future::Future, sync::Arc, time::Duration};

use tokio::{
    select,
    sync::{
        oneshot::{self, Sender},
        watch,
    },
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info};

use crate::trajectories::{RetimedTrajectory, TrajectorySample};

pub const CONTROL_PERIOD: Duration = Duration::from_millis(10);

/// Whatever consumes joint setpoints: a motor bus, a simulator, a log.
pub trait JointCommandSink<E>
where
    E: Debug,
{
    fn send_setpoint(
        &mut self,
        sample: &TrajectorySample,
    ) -> impl Future<Output = Result<(), E>> + Send;

    fn close(self) -> impl Future<Output = Result<(), E>> + Send;
}

fn take_latest(
    trajectories: &mut watch::Receiver<Arc<RetimedTrajectory>>,
) -> Arc<RetimedTrajectory> {
    let trajectory = trajectories.borrow_and_update().clone();
    info!(
        total_duration = trajectory.total_duration(),
        "playing new trajectory"
    );
    trajectory
}

async fn playback_loop<E: Debug, S: JointCommandSink<E>>(
    trajectories: &mut watch::Receiver<Arc<RetimedTrajectory>>,
    sink: &mut S,
    period: Duration,
) -> Result<(), E> {
    let mut current = take_latest(trajectories);
    let mut started = Instant::now();
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await; // first tick ticks immediately that's why it's at the beginning

        if trajectories.has_changed().unwrap_or(false) {
            current = take_latest(trajectories);
            started = Instant::now();
        }

        let t = started.elapsed().as_secs_f64();
        let setpoint = current.sample_at(t);
        sink.send_setpoint(&setpoint).await?;

        if t >= current.total_duration() {
            // the final setpoint was sent, hold it until something new shows up
            debug!("trajectory finished, waiting for the next one");
            if trajectories.changed().await.is_err() {
                debug!("trajectory sender dropped, ending playback");
                return Ok(());
            }
            current = take_latest(trajectories);
            started = Instant::now();
            interval.reset();
        }
    }
}

/// Spawns the playback task. The task plays whatever trajectory is currently in
/// `trajectories`, switches to newer ones as they are sent, and ends when the
/// returned sender fires (or is dropped) or when the watch sender is dropped
/// after the last trajectory finished.
pub fn launch_playback_thread<E, S>(
    mut trajectories: watch::Receiver<Arc<RetimedTrajectory>>,
    mut sink: S,
    period: Duration,
) -> (Sender<()>, JoinHandle<Result<(), E>>)
where
    E: Debug + Send + 'static,
    S: JointCommandSink<E> + Send + 'static,
{
    let (stop_sender, stop_receiver) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let outcome = select! {
            outcome = playback_loop(&mut trajectories, &mut sink, period) => outcome,
            _ = stop_receiver => {
                info!("playback thread received stop signal");
                Ok(())
            }
        };

        let closed = sink.close().await;
        outcome.and(closed)
    });
    (stop_sender, handle)
}
