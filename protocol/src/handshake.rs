//! Connection handshake.
//!
//! On every new connection, inbound or outbound, a node sends its chain,
//! then its stake table, then asks for the peer's chain. Both sides converge
//! without waiting for the next sync interval.

use stakenet_ledger::Block;
use stakenet_messages::Message;
use stakenet_stake::StakeInfo;

/// The three messages sent when a connection opens, in order.
pub fn handshake_messages(chain: &[Block], stakes: Vec<StakeInfo>) -> [Message; 3] {
    [
        Message::Chain {
            chain: chain.to_vec(),
        },
        Message::StakeSync { stakes },
        Message::RequestChain,
    ]
}
