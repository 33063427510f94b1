//! The serialized-field table.
//!
//! Every field that can appear in a transaction, a ledger entry or metadata
//! is listed here with its (type code, field code) pair. Objects serialize
//! their fields ascending by that pair.

use xrpl_serialization::FieldHeader;

/// Serialization type codes.
pub mod type_code {
    /// 16-bit integers.
    pub const UINT16: u8 = 1;
    /// 32-bit integers.
    pub const UINT32: u8 = 2;
    /// 64-bit integers.
    pub const UINT64: u8 = 3;
    /// 128-bit hashes.
    pub const HASH128: u8 = 4;
    /// 256-bit hashes.
    pub const HASH256: u8 = 5;
    /// Amounts (8 or 48 bytes).
    pub const AMOUNT: u8 = 6;
    /// Variable-length blobs.
    pub const BLOB: u8 = 7;
    /// Account ids.
    pub const ACCOUNT: u8 = 8;
    /// Inner objects.
    pub const OBJECT: u8 = 14;
    /// Arrays of objects.
    pub const ARRAY: u8 = 15;
    /// 8-bit integers.
    pub const UINT8: u8 = 16;
    /// 160-bit values (currencies and similar).
    pub const HASH160: u8 = 17;
    /// Path sets.
    pub const PATHSET: u8 = 18;
    /// Vectors of 256-bit hashes.
    pub const VECTOR256: u8 = 19;
}

macro_rules! sfields {
    ($($name:ident = ($type:expr, $field:expr);)*) => {
        $(
            /// Field header constant.
            pub const $name: FieldHeader = FieldHeader::new($type, $field);
        )*
    };
}

use type_code::*;

sfields! {
    // UInt8
    CLOSE_RESOLUTION = (UINT8, 1);
    METHOD = (UINT8, 2);
    TRANSACTION_RESULT = (UINT8, 3);
    SCALE = (UINT8, 4);
    TICK_SIZE = (UINT8, 16);

    // UInt16
    LEDGER_ENTRY_TYPE = (UINT16, 1);
    TRANSACTION_TYPE = (UINT16, 2);
    SIGNER_WEIGHT = (UINT16, 3);

    // UInt32
    FLAGS = (UINT32, 2);
    SOURCE_TAG = (UINT32, 3);
    SEQUENCE = (UINT32, 4);
    PREVIOUS_TXN_LGR_SEQ = (UINT32, 5);
    LEDGER_SEQUENCE = (UINT32, 6);
    CLOSE_TIME = (UINT32, 7);
    PARENT_CLOSE_TIME = (UINT32, 8);
    SIGNING_TIME = (UINT32, 9);
    EXPIRATION = (UINT32, 10);
    TRANSFER_RATE = (UINT32, 11);
    OWNER_COUNT = (UINT32, 13);
    DESTINATION_TAG = (UINT32, 14);
    LAST_UPDATE_TIME = (UINT32, 15);
    HIGH_QUALITY_IN = (UINT32, 16);
    HIGH_QUALITY_OUT = (UINT32, 17);
    LOW_QUALITY_IN = (UINT32, 18);
    LOW_QUALITY_OUT = (UINT32, 19);
    QUALITY_IN = (UINT32, 20);
    QUALITY_OUT = (UINT32, 21);
    OFFER_SEQUENCE = (UINT32, 25);
    LAST_LEDGER_SEQUENCE = (UINT32, 27);
    TRANSACTION_INDEX = (UINT32, 28);
    RESERVE_BASE = (UINT32, 31);
    RESERVE_INCREMENT = (UINT32, 32);
    SET_FLAG = (UINT32, 33);
    CLEAR_FLAG = (UINT32, 34);
    SIGNER_QUORUM = (UINT32, 35);
    CANCEL_AFTER = (UINT32, 36);
    FINISH_AFTER = (UINT32, 37);
    SETTLE_DELAY = (UINT32, 39);
    TICKET_COUNT = (UINT32, 40);
    TICKET_SEQUENCE = (UINT32, 41);
    ORACLE_DOCUMENT_ID = (UINT32, 51);

    // UInt64
    INDEX_NEXT = (UINT64, 1);
    INDEX_PREVIOUS = (UINT64, 2);
    BOOK_NODE = (UINT64, 3);
    OWNER_NODE = (UINT64, 4);
    BASE_FEE = (UINT64, 5);
    EXCHANGE_RATE = (UINT64, 6);
    LOW_NODE = (UINT64, 7);
    HIGH_NODE = (UINT64, 8);
    DESTINATION_NODE = (UINT64, 9);
    ASSET_PRICE = (UINT64, 19);

    // Hash128
    EMAIL_HASH = (HASH128, 1);

    // Hash256
    LEDGER_HASH = (HASH256, 1);
    PARENT_HASH = (HASH256, 2);
    TRANSACTION_HASH = (HASH256, 3);
    ACCOUNT_HASH = (HASH256, 4);
    PREVIOUS_TXN_ID = (HASH256, 5);
    LEDGER_INDEX = (HASH256, 6);
    WALLET_LOCATOR = (HASH256, 7);
    ROOT_INDEX = (HASH256, 8);
    ACCOUNT_TXN_ID = (HASH256, 9);
    BOOK_DIRECTORY = (HASH256, 16);
    INVOICE_ID = (HASH256, 17);
    CHANNEL = (HASH256, 22);

    // Hash160
    TAKER_PAYS_CURRENCY = (HASH160, 1);
    TAKER_PAYS_ISSUER = (HASH160, 2);
    TAKER_GETS_CURRENCY = (HASH160, 3);
    TAKER_GETS_ISSUER = (HASH160, 4);
    BASE_ASSET = (HASH160, 5);
    QUOTE_ASSET = (HASH160, 6);

    // Amount
    AMOUNT = (type_code::AMOUNT, 1);
    BALANCE = (type_code::AMOUNT, 2);
    LIMIT_AMOUNT = (type_code::AMOUNT, 3);
    TAKER_PAYS = (type_code::AMOUNT, 4);
    TAKER_GETS = (type_code::AMOUNT, 5);
    LOW_LIMIT = (type_code::AMOUNT, 6);
    HIGH_LIMIT = (type_code::AMOUNT, 7);
    FEE = (type_code::AMOUNT, 8);
    SEND_MAX = (type_code::AMOUNT, 9);
    DELIVER_MIN = (type_code::AMOUNT, 10);
    DELIVERED_AMOUNT = (type_code::AMOUNT, 18);

    // Blob
    PUBLIC_KEY = (BLOB, 1);
    MESSAGE_KEY = (BLOB, 2);
    SIGNING_PUB_KEY = (BLOB, 3);
    TXN_SIGNATURE = (BLOB, 4);
    URI = (BLOB, 5);
    SIGNATURE = (BLOB, 6);
    DOMAIN = (BLOB, 7);
    MEMO_TYPE = (BLOB, 12);
    MEMO_DATA = (BLOB, 13);
    MEMO_FORMAT = (BLOB, 14);
    ASSET_CLASS = (BLOB, 25);
    PROVIDER = (BLOB, 26);

    // AccountID
    ACCOUNT_FIELD = (ACCOUNT, 1);
    OWNER = (ACCOUNT, 2);
    DESTINATION = (ACCOUNT, 3);
    ISSUER = (ACCOUNT, 4);
    AUTHORIZE = (ACCOUNT, 5);
    UNAUTHORIZE = (ACCOUNT, 6);
    REGULAR_KEY = (ACCOUNT, 8);

    // Object
    OBJECT_END_MARKER = (OBJECT, 1);
    CREATED_NODE = (OBJECT, 3);
    DELETED_NODE = (OBJECT, 4);
    MODIFIED_NODE = (OBJECT, 5);
    PREVIOUS_FIELDS = (OBJECT, 6);
    FINAL_FIELDS = (OBJECT, 7);
    NEW_FIELDS = (OBJECT, 8);
    MEMO = (OBJECT, 10);
    SIGNER_ENTRY = (OBJECT, 11);
    SIGNER = (OBJECT, 16);
    PRICE_DATA = (OBJECT, 32);

    // Array
    ARRAY_END_MARKER = (ARRAY, 1);
    SIGNERS = (ARRAY, 3);
    SIGNER_ENTRIES = (ARRAY, 4);
    AFFECTED_NODES = (ARRAY, 8);
    MEMOS = (ARRAY, 9);
    PRICE_DATA_SERIES = (ARRAY, 24);

    // PathSet
    PATHS = (PATHSET, 1);

    // Vector256
    INDEXES = (VECTOR256, 1);
    HASHES = (VECTOR256, 2);
    AMENDMENTS = (VECTOR256, 3);
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrpl_serialization::{FieldHeaderSerializer, Serializer};

    fn header_hex(header: FieldHeader) -> String {
        let mut buffer = Vec::new();
        FieldHeaderSerializer::new()
            .serialize(&header, &mut buffer)
            .unwrap();
        hex::encode(buffer)
    }

    #[test]
    fn test_known_header_bytes() {
        assert_eq!(header_hex(TRANSACTION_TYPE), "12");
        assert_eq!(header_hex(LEDGER_ENTRY_TYPE), "11");
        assert_eq!(header_hex(FLAGS), "22");
        assert_eq!(header_hex(SOURCE_TAG), "23");
        assert_eq!(header_hex(SEQUENCE), "24");
        assert_eq!(header_hex(DESTINATION_TAG), "2e");
        assert_eq!(header_hex(OWNER_NODE), "34");
        assert_eq!(header_hex(EMAIL_HASH), "41");
        assert_eq!(header_hex(FEE), "68");
        assert_eq!(header_hex(ACCOUNT_FIELD), "81");
    }

    #[test]
    fn test_common_envelope_field_order() {
        let expected = [
            TRANSACTION_TYPE,
            FLAGS,
            SOURCE_TAG,
            SEQUENCE,
            DESTINATION_TAG,
            FEE,
            ACCOUNT_FIELD,
        ];
        let mut sorted = expected;
        sorted.sort_by_key(|h| h.ordinal());
        assert_eq!(sorted, expected);
    }
}
