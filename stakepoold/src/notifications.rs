//! Notification handler sets for the node and wallet sessions.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use stakepool_rpc::NotificationHandlers;

/// Chain events the poller reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    BlockConnected { height: u32 },
}

/// Handlers for the node session: block connections are forwarded to the
/// poller, everything else is logged.
pub fn node_notification_handlers(events: mpsc::UnboundedSender<NodeEvent>) -> NotificationHandlers {
    NotificationHandlers::new()
        .on_client_connected(|| info!("node RPC client connected"))
        .on_block_connected(move |block| match block.height() {
            Some(height) => {
                debug!(height, "block connected");
                if events.send(NodeEvent::BlockConnected { height }).is_err() {
                    debug!(height, "no poller listening for blocks");
                }
            }
            None => warn!(len = block.header.len(), "block connected with a short header"),
        })
        .on_winning_tickets(|winners| {
            debug!(
                block_hash = %winners.block_hash,
                height = winners.block_height,
                tickets = winners.tickets.len(),
                "winning tickets"
            )
        })
}

/// Handlers for the wallet session.
pub fn wallet_notification_handlers() -> NotificationHandlers {
    NotificationHandlers::new()
        .on_client_connected(|| info!("wallet RPC client connected"))
        .on_unknown(|method, _| debug!(method, "ignoring wallet notification"))
}
