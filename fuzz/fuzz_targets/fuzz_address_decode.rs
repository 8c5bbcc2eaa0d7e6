#![no_main]

use libfuzzer_sys::fuzz_target;
use stakepool_types::{NetworkId, StakeAddress};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    for network in [NetworkId::Mainnet, NetworkId::Testnet, NetworkId::Simnet] {
        if let Ok(address) = StakeAddress::decode(s, network) {
            assert_eq!(address.as_str(), s);
        }
    }
    let _ = s.parse::<stakepool_types::ChainHash>();
});
