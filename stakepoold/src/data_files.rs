//! Operator-maintained JSON files: user voting configuration and the
//! tickets already flagged as low fee.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use stakepool_types::{ChainHash, UserVotingConfig, UserVotingConfigMap};

use crate::context::TicketOwners;
use crate::StakepooldError;

/// Load a JSON array of user voting configurations.
///
/// Pool tickets pay to the user's multisig voting address, so that is the
/// address the wallet reports for them and the key used here.
pub fn load_user_voting_config(path: &Path) -> Result<UserVotingConfigMap, StakepooldError> {
    let users: Vec<UserVotingConfig> = read_json(path, "voting config")?;
    let map: UserVotingConfigMap = users
        .into_iter()
        .map(|user| (user.multisig_address.clone(), user))
        .collect();
    info!(path = %path.display(), users = map.len(), "loaded user voting config");
    Ok(map)
}

/// Load a JSON object mapping ticket hash to the owner's multisig address.
pub fn load_added_low_fee_tickets(path: &Path) -> Result<TicketOwners, StakepooldError> {
    let raw: HashMap<String, String> = read_json(path, "added low fee tickets")?;
    let mut tickets = TicketOwners::with_capacity(raw.len());
    for (hash, owner) in raw {
        let ticket: ChainHash = hash.parse().map_err(|e| StakepooldError::DataFile {
            what: "added low fee tickets",
            path: path.to_path_buf(),
            reason: format!("ticket {hash}: {e}"),
        })?;
        tickets.insert(ticket, owner);
    }
    info!(path = %path.display(), tickets = tickets.len(), "loaded added low fee tickets");
    Ok(tickets)
}

fn read_json<T: for<'de> Deserialize<'de>>(
    path: &Path,
    what: &'static str,
) -> Result<T, StakepooldError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| StakepooldError::DataFile {
        what,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn voting_config_is_keyed_by_multisig_address() {
        let file = write_temp(
            r#"[{"user_id": 1, "multisig_address": "DcAlice"},
                {"user_id": 2, "multisig_address": "DcBob", "vote_bits": 5}]"#,
        );
        let map = load_user_voting_config(file.path()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["DcBob"].vote_bits, 5);
        assert_eq!(map["DcAlice"].user_id, 1);
    }

    #[test]
    fn added_low_fee_tickets_parse_hashes() {
        let hash = ChainHash::new([3u8; 32]);
        let file = write_temp(&format!(r#"{{"{hash}": "DcAlice"}}"#));
        let tickets = load_added_low_fee_tickets(file.path()).unwrap();
        assert_eq!(tickets.get(&hash).map(String::as_str), Some("DcAlice"));
    }

    #[test]
    fn bad_ticket_hash_is_reported() {
        let file = write_temp(r#"{"nothex": "DcAlice"}"#);
        assert!(matches!(
            load_added_low_fee_tickets(file.path()),
            Err(StakepooldError::DataFile { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_user_voting_config(Path::new("/nonexistent/voting.json")),
            Err(StakepooldError::Io(_))
        ));
    }
}
