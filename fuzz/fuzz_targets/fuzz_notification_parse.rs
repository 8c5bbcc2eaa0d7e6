#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use stakepool_rpc::NotificationHandlers;

// Feed arbitrary JSON params to every notification the daemon subscribes to.
fuzz_target!(|data: &[u8]| {
    let Ok(Value::Array(params)) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let handlers = NotificationHandlers::new()
        .on_block_connected(|block| {
            let _ = block.height();
        })
        .on_block_disconnected(|block| {
            let _ = block.height();
        })
        .on_winning_tickets(|_| {});

    for method in ["blockconnected", "blockdisconnected", "winningtickets", "other"] {
        let _ = handlers.dispatch(method, &params);
    }
});
