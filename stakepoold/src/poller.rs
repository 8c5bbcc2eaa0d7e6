//! Schedules reconciliation passes.
//!
//! A pass runs when the poller starts, on every connected block and on a
//! fixed interval in between, so a quiet chain still gets refreshed.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn, Instrument};

use crate::context::{AppContext, TicketSnapshot};
use crate::notifications::NodeEvent;
use crate::shutdown::ShutdownSignal;
use crate::tickets::wallet_get_tickets;
use crate::tracing_spans::block_connected_span;

/// Why [`TicketPoller::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerExit {
    Shutdown,
    /// The node event channel closed, i.e. its session went away.
    EventsClosed,
}

pub struct TicketPoller {
    ctx: AppContext,
    interval: Duration,
    height: i64,
}

impl TicketPoller {
    pub fn new(ctx: AppContext, interval: Duration) -> Self {
        Self {
            ctx,
            interval,
            height: 0,
        }
    }

    /// Run passes until shutdown or until `events` closes.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<NodeEvent>,
        shutdown: &mut ShutdownSignal,
    ) -> PollerExit {
        self.refresh_height().await;
        self.pass().await;

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("ticket poller stopping");
                    return PollerExit::Shutdown;
                }
                event = events.recv() => match event {
                    Some(NodeEvent::BlockConnected { height }) => {
                        self.height = height as i64;
                        self.pass().instrument(block_connected_span(height)).await;
                        ticker.reset();
                    }
                    None => {
                        debug!("node event channel closed");
                        return PollerExit::EventsClosed;
                    }
                },
                _ = ticker.tick() => {
                    self.refresh_height().await;
                    self.pass().await;
                }
            }
        }
    }

    async fn refresh_height(&mut self) {
        match self.ctx.node.get_best_block().await {
            Ok(best) => self.height = best.height,
            Err(e) => warn!(error = %e, last_height = self.height, "unable to get best block"),
        }
    }

    async fn pass(&self) {
        let tickets = wallet_get_tickets(&self.ctx, self.height).await;
        self.ctx.state.publish(TicketSnapshot {
            height: self.height,
            tickets,
        });
    }
}
