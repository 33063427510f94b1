//! Keylet derivation: the typed 256-bit identifiers of ledger entries.
//!
//! Key = SHA-512-Half(namespace || canonically-ordered inputs). The 16-bit
//! namespace keeps the key spaces of the entry types disjoint; input order
//! is part of the protocol.

use crate::account::AccountId;
use crate::currency::Currency;
use crate::entry::LedgerEntryType;
use xrpl_hash::Hash;

/// Namespace tags, each an ASCII character widened to 16 bits.
mod space {
    pub const ACCOUNT: u16 = b'a' as u16;
    pub const DIR_NODE: u16 = b'd' as u16;
    pub const RIPPLE_STATE: u16 = b'r' as u16;
    pub const OFFER: u16 = b'o' as u16;
    pub const OWNER_DIR: u16 = b'O' as u16;
    pub const BOOK_DIR: u16 = b'B' as u16;
    pub const SKIP_LIST: u16 = b's' as u16;
    // payment channels share this space; the input arities differ so the
    // two families cannot collide
    pub const ESCROW: u16 = b'u' as u16;
    pub const AMENDMENTS: u16 = b'f' as u16;
    pub const FEES: u16 = b'e' as u16;
    pub const TICKET: u16 = b'T' as u16;
    pub const SIGNER_LIST: u16 = b'S' as u16;
    pub const DEPOSIT_PREAUTH: u16 = b'p' as u16;
    pub const ORACLE: u16 = b'R' as u16;
}

/// An addressable location in the ledger state: entry type plus 256-bit key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Keylet {
    /// The type of entry expected at this key.
    pub entry_type: LedgerEntryType,
    /// The 256-bit key.
    pub key: Hash,
}

fn index_hash(space: u16, data: &[&[u8]]) -> Hash {
    let space_bytes = space.to_be_bytes();
    let mut parts: Vec<&[u8]> = Vec::with_capacity(data.len() + 1);
    parts.push(&space_bytes);
    parts.extend_from_slice(data);
    Hash::compute_from_parts(&parts)
}

impl Keylet {
    /// Account root.
    pub fn account(account: &AccountId) -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::AccountRoot,
            key: index_hash(space::ACCOUNT, &[account.to_bytes()]),
        }
    }

    /// Singleton fee settings.
    pub fn fees() -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::FeeSettings,
            key: index_hash(space::FEES, &[]),
        }
    }

    /// Singleton amendments entry.
    pub fn amendments() -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::Amendments,
            key: index_hash(space::AMENDMENTS, &[]),
        }
    }

    /// Skip list / recent ledger hashes.
    pub fn ledger_hashes() -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::LedgerHashes,
            key: index_hash(space::SKIP_LIST, &[]),
        }
    }

    /// An offer, identified by owner and creating sequence.
    pub fn offer(account: &AccountId, sequence: u32) -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::Offer,
            key: index_hash(space::OFFER, &[account.to_bytes(), &sequence.to_be_bytes()]),
        }
    }

    /// Root page of an account's owner directory.
    pub fn owner_dir(account: &AccountId) -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::DirectoryNode,
            key: index_hash(space::OWNER_DIR, &[account.to_bytes()]),
        }
    }

    /// A specific page of a directory; page 0 is the root itself.
    pub fn dir_page(root: &Keylet, page: u64) -> Keylet {
        if page == 0 {
            return Keylet {
                entry_type: LedgerEntryType::DirectoryNode,
                key: root.key,
            };
        }
        Keylet {
            entry_type: LedgerEntryType::DirectoryNode,
            key: index_hash(
                space::DIR_NODE,
                &[root.key.to_bytes(), &page.to_be_bytes()],
            ),
        }
    }

    /// A trust line between two accounts. The account pair is sorted so
    /// both sides derive the same key.
    pub fn line(a: &AccountId, b: &AccountId, currency: &Currency) -> Keylet {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Keylet {
            entry_type: LedgerEntryType::RippleState,
            key: index_hash(
                space::RIPPLE_STATE,
                &[low.to_bytes(), high.to_bytes(), currency.to_bytes()],
            ),
        }
    }

    /// A signer list. The trailing zero word is the signer list id; only
    /// id 0 exists today.
    pub fn signer_list(account: &AccountId) -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::SignerList,
            key: index_hash(
                space::SIGNER_LIST,
                &[account.to_bytes(), &0u32.to_be_bytes()],
            ),
        }
    }

    /// A ticket, identified by owner and ticket sequence.
    pub fn ticket(account: &AccountId, ticket_sequence: u32) -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::Ticket,
            key: index_hash(
                space::TICKET,
                &[account.to_bytes(), &ticket_sequence.to_be_bytes()],
            ),
        }
    }

    /// A deposit preauthorization from `owner` towards `authorized`.
    pub fn deposit_preauth(owner: &AccountId, authorized: &AccountId) -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::DepositPreauth,
            key: index_hash(
                space::DEPOSIT_PREAUTH,
                &[owner.to_bytes(), authorized.to_bytes()],
            ),
        }
    }

    /// A payment channel from `source` to `destination`.
    pub fn pay_channel(source: &AccountId, destination: &AccountId, sequence: u32) -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::PayChannel,
            key: index_hash(
                space::ESCROW,
                &[
                    source.to_bytes(),
                    destination.to_bytes(),
                    &sequence.to_be_bytes(),
                ],
            ),
        }
    }

    /// A price oracle, identified by owner and document id.
    pub fn oracle(account: &AccountId, document_id: u32) -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::Oracle,
            key: index_hash(
                space::ORACLE,
                &[account.to_bytes(), &document_id.to_be_bytes()],
            ),
        }
    }

    /// The root directory page of an offer book for the given issue pair.
    pub fn book_dir(
        pays_currency: &Currency,
        pays_issuer: &AccountId,
        gets_currency: &Currency,
        gets_issuer: &AccountId,
    ) -> Keylet {
        Keylet {
            entry_type: LedgerEntryType::DirectoryNode,
            key: index_hash(
                space::BOOK_DIR,
                &[
                    pays_currency.to_bytes(),
                    pays_issuer.to_bytes(),
                    gets_currency.to_bytes(),
                    gets_issuer.to_bytes(),
                ],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 20])
    }

    #[test]
    fn test_line_is_order_independent() {
        let usd = Currency::from_standard_code("USD").unwrap();
        let a = account(1);
        let b = account(2);
        assert_eq!(Keylet::line(&a, &b, &usd), Keylet::line(&b, &a, &usd));
    }

    #[test]
    fn test_distinct_inputs_distinct_keys() {
        let a = account(1);
        assert_ne!(Keylet::offer(&a, 1).key, Keylet::offer(&a, 2).key);
        assert_ne!(Keylet::account(&a).key, Keylet::owner_dir(&a).key);
        assert_ne!(
            Keylet::ticket(&a, 5).key,
            Keylet::offer(&a, 5).key,
            "namespaces keep equal inputs apart"
        );
    }

    #[test]
    fn test_dir_page_zero_is_root() {
        let root = Keylet::owner_dir(&account(3));
        assert_eq!(Keylet::dir_page(&root, 0).key, root.key);
        assert_ne!(Keylet::dir_page(&root, 1).key, root.key);
    }

    #[test]
    fn test_channel_and_escrow_arity_differ() {
        // same namespace, different input lengths
        let src = account(4);
        let dst = account(5);
        let channel = Keylet::pay_channel(&src, &dst, 7);
        assert_eq!(channel.entry_type, LedgerEntryType::PayChannel);
    }

    #[test]
    fn test_singletons_are_stable() {
        assert_eq!(Keylet::fees().key, Keylet::fees().key);
        assert_ne!(Keylet::fees().key, Keylet::amendments().key);
        assert_ne!(Keylet::fees().key, Keylet::ledger_hashes().key);
    }
}
