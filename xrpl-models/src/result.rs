//! Transaction result codes.
//!
//! Five disjoint classes, selected by numeric range: `tes` success (0),
//! `tec` claimed failure (100..=199), `tef` permanent failure
//! (-199..=-100), `ter` retry (-99..=-1) and `tem` malformed
//! (-299..=-200). The class, not the individual code, decides whether the
//! fee is claimed, the sequence advances and the transaction persists.

use serde::{Deserialize, Serialize};

/// A transaction result code. Numeric values are part of the protocol.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, Hash)]
#[repr(i32)]
#[allow(non_camel_case_types)]
pub enum TransactionResult {
    /// The transaction was applied.
    tesSUCCESS = 0,

    /// Fee claimed. No action taken.
    tecCLAIM = 100,
    /// Payment delivered less than the full amount.
    tecPATH_PARTIAL = 101,
    /// Offer was fully unfunded when crossed.
    tecUNFUNDED_OFFER = 103,
    /// Insufficient XRP balance to send.
    tecUNFUNDED_PAYMENT = 104,
    /// A directory ran out of pages.
    tecDIR_FULL = 121,
    /// Reserve too low to create a trust line.
    tecINSUF_RESERVE_LINE = 122,
    /// Reserve too low to create an offer.
    tecINSUF_RESERVE_OFFER = 123,
    /// Destination account does not exist.
    tecNO_DST = 124,
    /// Destination missing and the payment is too small to create it.
    tecNO_DST_INSUF_XRP = 125,
    /// Reserve too low to create the trust line.
    tecNO_LINE_INSUF_RESERVE = 126,
    /// Cannot set a non-existent line to its default state.
    tecNO_LINE_REDUNDANT = 127,
    /// No liquidity along any path.
    tecPATH_DRY = 128,
    /// Insufficient funds in the source line.
    tecUNFUNDED = 129,
    /// Disabling the master key requires another way to sign.
    tecNO_ALTERNATIVE_KEY = 130,
    /// Operation would leave the owner with obligations it cannot hold.
    tecOWNERS = 132,
    /// The issuer account does not exist.
    tecNO_ISSUER = 133,
    /// The trust line is not authorized.
    tecNO_AUTH = 134,
    /// No trust line exists.
    tecNO_LINE = 135,
    /// The trust line or issuer is frozen.
    tecFROZEN = 137,
    /// The referenced target entry does not exist.
    tecNO_TARGET = 138,
    /// The operation is not permitted.
    tecNO_PERMISSION = 139,
    /// The referenced entry does not exist.
    tecNO_ENTRY = 140,
    /// Insufficient reserve to complete the operation.
    tecINSUFFICIENT_RESERVE = 141,
    /// A destination tag is required.
    tecDST_TAG_NEEDED = 143,
    /// Internal invariant violated while applying; only the fee is kept.
    tecINTERNAL = 144,
    /// The entry has expired.
    tecEXPIRED = 148,
    /// The entry already exists.
    tecDUPLICATE = 149,
    /// Fill-or-kill offer was killed.
    tecKILLED = 150,
    /// The account still has obligations.
    tecHAS_OBLIGATIONS = 151,
    /// The operation is not allowed this early.
    tecTOO_SOON = 152,
    /// Oracle update time is out of bounds.
    tecINVALID_UPDATE_TIME = 170,
    /// Oracle deletion named a missing pair.
    tecTOKEN_PAIR_NOT_FOUND = 171,
    /// Resulting series would be empty.
    tecARRAY_EMPTY = 172,
    /// Resulting series would exceed its cap.
    tecARRAY_TOO_LARGE = 173,
    /// Presented credentials are not acceptable.
    tecBAD_CREDENTIALS = 193,

    /// Generic permanent failure.
    tefFAILURE = -199,
    /// Authorization does not match the account.
    tefBAD_AUTH = -196,
    /// Unexpected exception while applying.
    tefEXCEPTION = -193,
    /// Internal error while applying.
    tefINTERNAL = -192,
    /// The account does not require authorization.
    tefNO_AUTH_REQUIRED = -191,
    /// Sequence number has already passed.
    tefPAST_SEQ = -190,
    /// AccountTxnID does not match the account's last transaction.
    tefWRONG_PRIOR = -189,
    /// The master key is disabled.
    tefMASTER_DISABLED = -188,
    /// LastLedgerSequence is in the past.
    tefMAX_LEDGER = -187,
    /// A multisig signature is invalid.
    tefBAD_SIGNATURE = -186,
    /// Signatures do not meet the quorum.
    tefBAD_QUORUM = -185,
    /// The account has no signer list.
    tefNOT_MULTI_SIGNING = -184,
    /// The referenced ticket does not exist and never will.
    tefNO_TICKET = -180,

    /// Malformed transaction.
    temMALFORMED = -299,
    /// Can only send positive amounts.
    temBAD_AMOUNT = -298,
    /// Invalid currency code.
    temBAD_CURRENCY = -297,
    /// Invalid expiration.
    temBAD_EXPIRATION = -296,
    /// Invalid fee, negative or not XRP.
    temBAD_FEE = -295,
    /// Invalid issuer.
    temBAD_ISSUER = -294,
    /// Invalid trust-line limit.
    temBAD_LIMIT = -293,
    /// Malformed offer.
    temBAD_OFFER = -292,
    /// Malformed path.
    temBAD_PATH = -291,
    /// A path loops through an account twice.
    temBAD_PATH_LOOP = -290,
    /// Malformed regular key.
    temBAD_REGKEY = -289,
    /// Native payments cannot carry a quality limit.
    temBAD_SEND_XRP_LIMIT = -288,
    /// XRP cannot carry a SendMax.
    temBAD_SEND_XRP_MAX = -287,
    /// Native payments cannot suppress the direct path.
    temBAD_SEND_XRP_NO_DIRECT = -286,
    /// Native payments cannot be partial.
    temBAD_SEND_XRP_PARTIAL = -285,
    /// Native payments cannot carry paths.
    temBAD_SEND_XRP_PATHS = -284,
    /// Sequence number must be valid.
    temBAD_SEQUENCE = -283,
    /// The signature is invalid.
    temBAD_SIGNATURE = -282,
    /// The source account is malformed.
    temBAD_SRC_ACCOUNT = -281,
    /// Transfer rate out of range.
    temBAD_TRANSFER_RATE = -280,
    /// Destination may not be source.
    temDST_IS_SRC = -279,
    /// Destination is required.
    temDST_NEEDED = -278,
    /// The transaction is ill-formed.
    temINVALID = -277,
    /// Invalid flags.
    temINVALID_FLAG = -276,
    /// The transaction would accomplish nothing.
    temREDUNDANT = -275,
    /// The transaction requires a disabled amendment.
    temDISABLED = -273,
    /// Malformed signer entry.
    temBAD_SIGNER = -272,
    /// Quorum out of range.
    temBAD_QUORUM = -271,
    /// Signer weight out of range.
    temBAD_WEIGHT = -270,
    /// Tick size out of range.
    temBAD_TICK_SIZE = -269,
    /// Cannot preauthorize self.
    temCAN_NOT_PREAUTH_SELF = -267,
    /// Count out of range.
    temINVALID_COUNT = -266,
    /// Sequence and TicketSequence are both present.
    temSEQ_AND_TICKET = -263,
    /// A required array is empty.
    temARRAY_EMPTY = -253,
    /// An array exceeds its cap.
    temARRAY_TOO_LARGE = -252,

    /// Generic retry.
    terRETRY = -99,
    /// Account balance cannot pay the fee.
    terINSUF_FEE_B = -97,
    /// The source account does not exist.
    terNO_ACCOUNT = -96,
    /// The trust line is not authorized yet.
    terNO_AUTH = -95,
    /// No trust line exists yet.
    terNO_LINE = -94,
    /// The account still owns entries.
    terOWNERS = -93,
    /// Sequence is ahead of the account; retry later.
    terPRE_SEQ = -92,
    /// Rippling is disabled on the line.
    terNO_RIPPLE = -90,
    /// The ticket is not created yet; retry later.
    terPRE_TICKET = -88,
}

impl TransactionResult {
    /// The numeric protocol value.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// `tesSUCCESS`.
    pub fn is_success(self) -> bool {
        self == TransactionResult::tesSUCCESS
    }

    /// Claimed-failure class.
    pub fn is_tec(self) -> bool {
        (100..200).contains(&self.code())
    }

    /// Permanent-failure class.
    pub fn is_tef(self) -> bool {
        (-199..=-100).contains(&self.code())
    }

    /// Malformed class.
    pub fn is_tem(self) -> bool {
        (-299..=-200).contains(&self.code())
    }

    /// Retry class.
    pub fn is_ter(self) -> bool {
        (-99..=-1).contains(&self.code())
    }

    /// True when the transaction is recorded in the ledger: success and
    /// every claimed failure.
    pub fn is_applied(self) -> bool {
        self.is_success() || self.is_tec()
    }

    /// The exact protocol spelling of the code.
    pub fn name(self) -> &'static str {
        macro_rules! names {
            ($($variant:ident),*) => {
                match self {
                    $(TransactionResult::$variant => stringify!($variant),)*
                }
            };
        }
        names!(
            tesSUCCESS,
            tecCLAIM,
            tecPATH_PARTIAL,
            tecUNFUNDED_OFFER,
            tecUNFUNDED_PAYMENT,
            tecDIR_FULL,
            tecINSUF_RESERVE_LINE,
            tecINSUF_RESERVE_OFFER,
            tecNO_DST,
            tecNO_DST_INSUF_XRP,
            tecNO_LINE_INSUF_RESERVE,
            tecNO_LINE_REDUNDANT,
            tecPATH_DRY,
            tecUNFUNDED,
            tecNO_ALTERNATIVE_KEY,
            tecOWNERS,
            tecNO_ISSUER,
            tecNO_AUTH,
            tecNO_LINE,
            tecFROZEN,
            tecNO_TARGET,
            tecNO_PERMISSION,
            tecNO_ENTRY,
            tecINSUFFICIENT_RESERVE,
            tecDST_TAG_NEEDED,
            tecINTERNAL,
            tecEXPIRED,
            tecDUPLICATE,
            tecKILLED,
            tecHAS_OBLIGATIONS,
            tecTOO_SOON,
            tecINVALID_UPDATE_TIME,
            tecTOKEN_PAIR_NOT_FOUND,
            tecARRAY_EMPTY,
            tecARRAY_TOO_LARGE,
            tecBAD_CREDENTIALS,
            tefFAILURE,
            tefBAD_AUTH,
            tefEXCEPTION,
            tefINTERNAL,
            tefNO_AUTH_REQUIRED,
            tefPAST_SEQ,
            tefWRONG_PRIOR,
            tefMASTER_DISABLED,
            tefMAX_LEDGER,
            tefBAD_SIGNATURE,
            tefBAD_QUORUM,
            tefNOT_MULTI_SIGNING,
            tefNO_TICKET,
            temMALFORMED,
            temBAD_AMOUNT,
            temBAD_CURRENCY,
            temBAD_EXPIRATION,
            temBAD_FEE,
            temBAD_ISSUER,
            temBAD_LIMIT,
            temBAD_OFFER,
            temBAD_PATH,
            temBAD_PATH_LOOP,
            temBAD_REGKEY,
            temBAD_SEND_XRP_LIMIT,
            temBAD_SEND_XRP_MAX,
            temBAD_SEND_XRP_NO_DIRECT,
            temBAD_SEND_XRP_PARTIAL,
            temBAD_SEND_XRP_PATHS,
            temBAD_SEQUENCE,
            temBAD_SIGNATURE,
            temBAD_SRC_ACCOUNT,
            temBAD_TRANSFER_RATE,
            temDST_IS_SRC,
            temDST_NEEDED,
            temINVALID,
            temINVALID_FLAG,
            temREDUNDANT,
            temDISABLED,
            temBAD_SIGNER,
            temBAD_QUORUM,
            temBAD_WEIGHT,
            temBAD_TICK_SIZE,
            temCAN_NOT_PREAUTH_SELF,
            temINVALID_COUNT,
            temSEQ_AND_TICKET,
            temARRAY_EMPTY,
            temARRAY_TOO_LARGE,
            terRETRY,
            terINSUF_FEE_B,
            terNO_ACCOUNT,
            terNO_AUTH,
            terNO_LINE,
            terOWNERS,
            terPRE_SEQ,
            terNO_RIPPLE,
            terPRE_TICKET
        )
    }
}

impl TransactionResult {
    /// A human-readable explanation for the collaborator surface; codes
    /// without a dedicated message fall back to their spelling.
    pub fn message(self) -> &'static str {
        use TransactionResult::*;
        match self {
            tesSUCCESS => "The transaction was applied. Only final in a validated ledger.",
            tecUNFUNDED_PAYMENT => "Insufficient XRP balance to send.",
            tecNO_DST => "Destination account does not exist.",
            tecNO_DST_INSUF_XRP => {
                "Destination account does not exist. Too little XRP sent to create it."
            }
            tecINSUFFICIENT_RESERVE => {
                "Insufficient reserve to complete requested operation."
            }
            tecDST_TAG_NEEDED => "A destination tag is required.",
            tecPATH_DRY => "Path could not send partial amount.",
            tecPATH_PARTIAL => "Path could not send full amount.",
            tecINTERNAL => "An internal error occurred during processing.",
            temBAD_AMOUNT => "Can only send positive amounts.",
            temBAD_FEE => "Invalid fee, negative or not XRP.",
            temDST_IS_SRC => "Destination may not be source.",
            temINVALID => "The transaction is ill-formed.",
            temINVALID_FLAG => "Invalid flags.",
            temREDUNDANT => "The transaction would accomplish nothing.",
            temDISABLED => "The transaction requires an amendment that is not enabled.",
            terNO_ACCOUNT => "The source account does not exist.",
            terPRE_SEQ => "Missing/inapplicable prior transaction.",
            terINSUF_FEE_B => "Account balance can't pay fee.",
            tefBAD_SIGNATURE => "A signature is provided for a non-signer.",
            tefPAST_SEQ => "This sequence number has already passed.",
            other => other.name(),
        }
    }
}

impl std::fmt::Display for TransactionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
