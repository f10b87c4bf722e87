//! Staged virtual-user ramp
//!
//! The controller ticks at a fixed interval, computes the target number of
//! virtual users by linear interpolation across the stages, spawns users up to
//! the target and asks the most recently started ones to stop when the target
//! drops. A stopped user finishes the iteration it is in.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::draws::RngDraws;
use crate::scenario;
use crate::setup::SetupContext;

/// One ramp step: reach `target` virtual users over `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    pub fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

/// Number of virtual users that should be running `elapsed` into the ramp
///
/// Interpolates from the previous stage's target (0 before the first stage)
/// to the current stage's target. Past the last stage, holds its target.
pub fn target_at(stages: &[Stage], elapsed: Duration) -> usize {
    let mut from = 0usize;
    let mut stage_start = Duration::ZERO;

    for stage in stages {
        let stage_end = stage_start + stage.duration;
        if elapsed < stage_end {
            let progress = (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();
            let value = from as f64 + (stage.target as f64 - from as f64) * progress;
            return value.round().max(0.0) as usize;
        }
        from = stage.target;
        stage_start = stage_end;
    }
    from
}

/// Counters from one ramp execution
#[derive(Debug, Clone, Default)]
pub struct RampStats {
    pub iterations: u64,
    pub peak_vus: usize,
    /// Users still mid-iteration when the graceful window ran out
    pub interrupted: usize,
    pub duration: Duration,
}

struct VirtualUser {
    id: usize,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Drives virtual users through the configured stages
pub struct Ramp {
    stages: Vec<Stage>,
    graceful_stop: Duration,
    tick: Duration,
}

impl Ramp {
    pub fn new(stages: Vec<Stage>, graceful_stop: Duration) -> Self {
        Self {
            stages,
            graceful_stop,
            tick: Duration::from_millis(100),
        }
    }

    /// Override the controller tick (tests use shorter ramps)
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub async fn run(&self, ctx: Arc<SetupContext>, client: ApiClient) -> RampStats {
        let start = Instant::now();
        let total = self.total_duration();
        let iterations = Arc::new(AtomicU64::new(0));

        let mut active: Vec<VirtualUser> = Vec::new();
        let mut stopping: Vec<VirtualUser> = Vec::new();
        let mut next_id = 0usize;
        let mut peak = 0usize;
        let mut last_target = 0usize;

        let mut ticker = tokio::time::interval(self.tick);
        loop {
            ticker.tick().await;
            let elapsed = start.elapsed();
            if elapsed >= total {
                break;
            }

            let target = target_at(&self.stages, elapsed);
            if target != last_target {
                debug!("Ramp at {:?}: target {} virtual users", elapsed, target);
                last_target = target;
            }

            while active.len() < target {
                active.push(spawn_user(
                    next_id,
                    ctx.clone(),
                    client.clone(),
                    iterations.clone(),
                ));
                next_id += 1;
            }
            while active.len() > target {
                if let Some(vu) = active.pop() {
                    debug!("Stopping virtual user {}", vu.id);
                    vu.stop.store(true, Ordering::SeqCst);
                    stopping.push(vu);
                }
            }
            stopping.retain(|vu| !vu.handle.is_finished());
            peak = peak.max(active.len());
        }

        for vu in active.drain(..) {
            vu.stop.store(true, Ordering::SeqCst);
            stopping.push(vu);
        }
        let interrupted = self.drain(stopping).await;

        let stats = RampStats {
            iterations: iterations.load(Ordering::SeqCst),
            peak_vus: peak,
            interrupted,
            duration: start.elapsed(),
        };
        info!(
            "Ramp finished: {} iterations, peak {} virtual users, {:.1}s",
            stats.iterations,
            stats.peak_vus,
            stats.duration.as_secs_f64()
        );
        stats
    }

    /// Wait for stopped users, aborting whoever is still running after the graceful window
    async fn drain(&self, users: Vec<VirtualUser>) -> usize {
        if users.is_empty() {
            return 0;
        }

        let aborts: Vec<_> = users.iter().map(|vu| vu.handle.abort_handle()).collect();
        let handles: Vec<_> = users.into_iter().map(|vu| vu.handle).collect();

        match tokio::time::timeout(self.graceful_stop, join_all(handles)).await {
            Ok(_) => 0,
            Err(_) => {
                let unfinished: Vec<_> = aborts.iter().filter(|a| !a.is_finished()).collect();
                warn!(
                    "{} virtual users did not finish within {:?}, aborting",
                    unfinished.len(),
                    self.graceful_stop
                );
                for handle in &unfinished {
                    handle.abort();
                }
                unfinished.len()
            }
        }
    }
}

fn spawn_user(
    id: usize,
    ctx: Arc<SetupContext>,
    client: ApiClient,
    iterations: Arc<AtomicU64>,
) -> VirtualUser {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();

    let handle = tokio::spawn(async move {
        let mut draws = RngDraws::new();
        while !flag.load(Ordering::SeqCst) {
            scenario::iteration(&ctx, &client, &mut draws).await;
            iterations.fetch_add(1, Ordering::SeqCst);
            // disabled branches never await; give other users a turn
            tokio::task::yield_now().await;
        }
    });

    debug!("Started virtual user {}", id);
    VirtualUser { id, stop, handle }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn spike_stages() -> Vec<Stage> {
        vec![
            Stage::new(secs(20), 25),
            Stage::new(secs(40), 35),
            Stage::new(secs(20), 50),
            Stage::new(secs(20), 0),
        ]
    }

    #[test]
    fn test_target_interpolates_within_stage() {
        let stages = spike_stages();
        assert_eq!(target_at(&stages, Duration::ZERO), 0);
        assert_eq!(target_at(&stages, secs(10)), 13); // 12.5 rounds up
        assert_eq!(target_at(&stages, secs(20)), 25);
        assert_eq!(target_at(&stages, secs(40)), 30);
        assert_eq!(target_at(&stages, secs(60)), 35);
        assert_eq!(target_at(&stages, secs(70)), 43);
        assert_eq!(target_at(&stages, secs(80)), 50);
        assert_eq!(target_at(&stages, secs(90)), 25);
    }

    #[test]
    fn test_target_after_last_stage() {
        assert_eq!(target_at(&spike_stages(), secs(500)), 0);
        assert_eq!(target_at(&[Stage::new(secs(1), 4)], secs(2)), 4);
        assert_eq!(target_at(&[], secs(2)), 0);
    }

    #[test]
    fn test_zero_length_stage_jumps() {
        let stages = vec![Stage::new(Duration::ZERO, 10), Stage::new(secs(10), 10)];
        assert_eq!(target_at(&stages, Duration::ZERO), 10);
        assert_eq!(target_at(&stages, secs(5)), 10);
    }

    #[test]
    fn test_total_duration() {
        let ramp = Ramp::new(spike_stages(), secs(30));
        assert_eq!(ramp.total_duration(), secs(100));
    }
}
