/// Domain prefixes mixed into every consensus-defining hash.
///
/// Each prefix is three ASCII characters packed into the top bytes of a
/// `u32`, serialized big-endian ahead of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum HashPrefix {
    /// "TXN\0" - transaction id
    TransactionId = 0x5458_4E00,
    /// "SND\0" - transaction node in the tx tree
    TxNode = 0x534E_4400,
    /// "MLN\0" - state tree leaf node
    LeafNode = 0x4D4C_4E00,
    /// "MIN\0" - state tree inner node
    InnerNode = 0x4D49_4E00,
    /// "LWR\0" - ledger header
    LedgerMaster = 0x4C57_5200,
    /// "STX\0" - single-signature signing payload
    TxSign = 0x5354_5800,
    /// "SMT\0" - multi-signature signing payload
    TxMultiSign = 0x534D_5400,
    /// "CLM\0" - payment channel claim authorization
    PaymentChannelClaim = 0x434C_4D00,
}

impl HashPrefix {
    /// The prefix as the four bytes that precede the hashed payload.
    pub const fn to_bytes(self) -> [u8; 4] {
        (self as u32).to_be_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_bytes() {
        assert_eq!(&HashPrefix::TransactionId.to_bytes(), b"TXN\0");
        assert_eq!(&HashPrefix::TxSign.to_bytes(), b"STX\0");
        assert_eq!(&HashPrefix::TxMultiSign.to_bytes(), b"SMT\0");
        assert_eq!(&HashPrefix::PaymentChannelClaim.to_bytes(), b"CLM\0");
        assert_eq!(&HashPrefix::LedgerMaster.to_bytes(), b"LWR\0");
        assert_eq!(&HashPrefix::LeafNode.to_bytes(), b"MLN\0");
        assert_eq!(&HashPrefix::InnerNode.to_bytes(), b"MIN\0");
        assert_eq!(&HashPrefix::TxNode.to_bytes(), b"SND\0");
    }

    #[test]
    fn test_prefix_values() {
        assert_eq!(HashPrefix::TransactionId as u32, 0x54584E00);
        assert_eq!(HashPrefix::TxSign as u32, 0x53545800);
        assert_eq!(HashPrefix::TxMultiSign as u32, 0x534D5400);
        assert_eq!(HashPrefix::PaymentChannelClaim as u32, 0x434C4D00);
    }
}
