use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{error, info};

use crate::collector::Collect;
use crate::error::CollectError;

/// Source of cycle triggers, injected so the scheduler's state machine
/// can be driven without real timers in tests.
#[async_trait]
pub trait TickSource: Send {
    async fn tick(&mut self);
}

/// Fires every `period`, starting one full period after construction so
/// no cycle runs at startup. A cycle that overruns the period delays the
/// next tick instead of bursting, so cycles never overlap.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> IntervalTicker {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        IntervalTicker { interval }
    }
}

#[async_trait]
impl TickSource for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

/// Drives the collector once per tick until shutdown or a fatal
/// collection error. Stopped is terminal; the loop never resumes.
pub struct Scheduler<C, T> {
    collector: C,
    ticker: T,
    state: SchedulerState,
}

impl<C: Collect, T: TickSource> Scheduler<C, T> {
    pub fn new(collector: C, ticker: T) -> Scheduler<C, T> {
        Scheduler {
            collector,
            ticker,
            state: SchedulerState::Running,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Run until the shutdown future resolves or a cycle fails fatally.
    /// The in-flight cycle is raced against shutdown, so a cancellation
    /// drops pending fetch/publish futures instead of finishing the
    /// cycle.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<(), CollectError>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);

        while self.state == SchedulerState::Running {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, stopping scheduler");
                    self.state = SchedulerState::Stopped;
                    break;
                }
                _ = self.ticker.tick() => {}
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, abandoning in-flight cycle");
                    self.state = SchedulerState::Stopped;
                }
                result = self.collector.collect_and_publish() => {
                    if let Err(err) = result {
                        error!(error = %err, "stopping scheduler after fatal collection error");
                        self.state = SchedulerState::Stopped;
                        return Err(err);
                    }
                }
            }
        }

        Ok(())
    }
}
