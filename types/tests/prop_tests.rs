use proptest::prelude::*;

use stakenet_types::{BlockHash, PublicKey, Timestamp, TxHash};

proptest! {
    /// BlockHash JSON roundtrip through its hex string form.
    #[test]
    fn block_hash_json_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        let encoded = serde_json::to_string(&hash).unwrap();
        let decoded: BlockHash = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, hash);
    }

    /// BlockHash::is_zero is true only for all-zero bytes.
    #[test]
    fn block_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// TxHash::is_zero is true only for all-zero bytes.
    #[test]
    fn tx_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = TxHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// PublicKey ordering matches byte ordering (election walks keys in this order).
    #[test]
    fn public_key_order_matches_bytes(
        a in prop::array::uniform32(0u8..),
        b in prop::array::uniform32(0u8..),
    ) {
        prop_assert_eq!(PublicKey(a) < PublicKey(b), a < b);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// elapsed_since never underflows.
    #[test]
    fn elapsed_since_saturates(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let elapsed = Timestamp::new(a).elapsed_since(Timestamp::new(b));
        prop_assert_eq!(elapsed, b.saturating_sub(a));
    }
}
