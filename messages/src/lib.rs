//! Gossip message types for stakenet node-to-node communication.
//!
//! Every message is a JSON object whose `type` field names the variant, e.g.
//! `{"type":"REQUEST_CHAIN"}` or `{"type":"BLOCK","block":{...}}`.

use serde::{Deserialize, Serialize};
use stakenet_ledger::Block;
use stakenet_stake::StakeInfo;
use stakenet_transactions::Transaction;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// The sender's full chain. Adopted if longer and valid.
    Chain { chain: Vec<Block> },

    /// Ask the peer to reply with `Chain`.
    RequestChain,

    /// A pending transaction to merge into the pool.
    Transaction { transaction: Transaction },

    /// A newly produced block.
    Block { block: Block },

    /// One validator's stake record.
    Stake {
        #[serde(rename = "stakeInfo")]
        stake_info: StakeInfo,
    },

    /// The sender's whole stake table.
    StakeSync { stakes: Vec<StakeInfo> },
}

impl Message {
    /// The wire name of this message's type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chain { .. } => "CHAIN",
            Self::RequestChain => "REQUEST_CHAIN",
            Self::Transaction { .. } => "TRANSACTION",
            Self::Block { .. } => "BLOCK",
            Self::Stake { .. } => "STAKE",
            Self::StakeSync { .. } => "STAKE_SYNC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stakenet_stake::StakeRecord;
    use stakenet_types::{PublicKey, Timestamp};

    #[test]
    fn test_request_chain_shape() {
        let value = serde_json::to_value(Message::RequestChain).unwrap();
        assert_eq!(value, json!({ "type": "REQUEST_CHAIN" }));
    }

    #[test]
    fn test_stake_uses_stake_info_field() {
        let info = StakeInfo::new(PublicKey([1; 32]), StakeRecord::bonded(1000, Timestamp::new(7)));
        let msg = Message::Stake { stake_info: info };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "STAKE");
        assert_eq!(value["stakeInfo"]["amount"], 1000);
        assert_eq!(msg.kind(), "STAKE");
    }

    #[test]
    fn test_stake_sync_decodes() {
        let key = PublicKey([2; 32]).to_string();
        let raw = json!({
            "type": "STAKE_SYNC",
            "stakes": [{
                "publicKey": key,
                "amount": 2500,
                "timestamp": 10,
                "lastRewardClaim": 10,
                "active": true
            }]
        });
        let Message::StakeSync { stakes } = serde_json::from_value(raw).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(stakes.len(), 1);
        assert!(stakes[0].record.active);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let raw = json!({ "type": "PING" });
        assert!(serde_json::from_value::<Message>(raw).is_err());
    }
}
