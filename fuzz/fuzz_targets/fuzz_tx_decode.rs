#![no_main]

use libfuzzer_sys::fuzz_target;
use stakepool_transactions::MsgTx;

// Decoding arbitrary bytes must never panic, and whatever decodes must
// decode again to the same transaction after re-encoding.
fuzz_target!(|data: &[u8]| {
    let Ok(tx) = MsgTx::from_bytes(data) else {
        return;
    };
    let encoded = tx.to_bytes();
    assert_eq!(MsgTx::from_bytes(&encoded).ok(), Some(tx.clone()));

    // Commitment parsing walks every output script.
    let _ = tx.ticket_price();
    let _ = tx.ticket_commitments();
});
