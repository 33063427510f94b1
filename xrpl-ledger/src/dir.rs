//! Directory management: the paging layer under owner directories and
//! order books.
//!
//! A directory is a chain of `DirectoryNode` pages, each holding up to 32
//! keys. Insertion and removal are atomic with the entry they index. Book
//! directories additionally encode the page quality into the low 8 bytes of
//! the page key, so walking keys in order walks qualities best-first.

use crate::error::LedgerError;
use crate::view::WriteView;
use tracing::debug;
use xrpl_hash::Hash;
use xrpl_models::account::AccountId;
use xrpl_models::amount::IouValue;
use xrpl_models::config::DIR_NODE_MAX;
use xrpl_models::currency::Currency;
use xrpl_models::entry::{DirectoryNode, LedgerEntry};
use xrpl_models::issue::Issue;
use xrpl_models::keylet::Keylet;

/// Most pages one directory may chain before insertions fail `tecDIR_FULL`.
pub const DIR_MAX_PAGES: u64 = 262_144;

/// Insert `key` into the directory rooted at `root`, creating pages as
/// needed. `make_node` builds the page skeleton (owner or book fields) when
/// a page must be created. Returns the page number the key landed on.
fn dir_insert(
    view: &mut dyn WriteView,
    root: &Keylet,
    key: Hash,
    make_node: impl Fn(&Keylet) -> DirectoryNode,
) -> Result<u64, LedgerError> {
    let mut page = 0u64;
    loop {
        let page_keylet = Keylet::dir_page(root, page);
        match view.get(&page_keylet.key) {
            None => {
                // fresh page; link it to the previous one
                let mut node = make_node(root);
                node.indexes.push(key);
                if page != 0 {
                    node.index_previous = Some(page - 1);
                    let prev_keylet = Keylet::dir_page(root, page - 1);
                    let Some(LedgerEntry::DirectoryNode(mut prev)) = view.get(&prev_keylet.key)
                    else {
                        return Err(LedgerError::WrongType(
                            "directory chain broken".to_string(),
                        ));
                    };
                    prev.index_next = Some(page);
                    view.update(prev_keylet.key, LedgerEntry::DirectoryNode(prev));
                }
                view.insert(page_keylet.key, LedgerEntry::DirectoryNode(node));
                return Ok(page);
            }
            Some(LedgerEntry::DirectoryNode(mut node)) => {
                if node.indexes.len() < DIR_NODE_MAX {
                    node.indexes.push(key);
                    view.update(page_keylet.key, LedgerEntry::DirectoryNode(node));
                    return Ok(page);
                }
                match node.index_next {
                    Some(next) => page = next,
                    None => {
                        page += 1;
                        if page >= DIR_MAX_PAGES {
                            return Err(LedgerError::DirFull);
                        }
                    }
                }
            }
            Some(_) => {
                return Err(LedgerError::WrongType(
                    "non-directory entry at directory key".to_string(),
                ))
            }
        }
    }
}

/// Remove `key` from the directory rooted at `root`, starting at the page
/// hint. Empty non-root pages are unlinked; an empty root with no other
/// pages is deleted.
fn dir_remove(
    view: &mut dyn WriteView,
    root: &Keylet,
    page_hint: u64,
    key: &Hash,
) -> Result<(), LedgerError> {
    let page_keylet = Keylet::dir_page(root, page_hint);
    let Some(LedgerEntry::DirectoryNode(mut node)) = view.get(&page_keylet.key) else {
        return Err(LedgerError::NotFound);
    };
    let Some(position) = node.indexes.iter().position(|k| k == key) else {
        return Err(LedgerError::NotFound);
    };
    node.indexes.remove(position);

    if !node.indexes.is_empty() {
        view.update(page_keylet.key, LedgerEntry::DirectoryNode(node));
        return Ok(());
    }

    if page_hint == 0 {
        // the root stays while other pages exist
        if node.index_next.is_some() {
            view.update(page_keylet.key, LedgerEntry::DirectoryNode(node));
        } else {
            view.erase(&page_keylet.key);
            debug!("deleted empty directory root");
        }
        return Ok(());
    }

    // unlink the empty page from its neighbors
    if let Some(previous) = node.index_previous {
        let prev_keylet = Keylet::dir_page(root, previous);
        if let Some(LedgerEntry::DirectoryNode(mut prev)) = view.get(&prev_keylet.key) {
            prev.index_next = node.index_next;
            view.update(prev_keylet.key, LedgerEntry::DirectoryNode(prev));
        }
    }
    if let Some(next) = node.index_next {
        let next_keylet = Keylet::dir_page(root, next);
        if let Some(LedgerEntry::DirectoryNode(mut next_node)) = view.get(&next_keylet.key) {
            next_node.index_previous = node.index_previous;
            view.update(next_keylet.key, LedgerEntry::DirectoryNode(next_node));
        }
    }
    view.erase(&page_keylet.key);
    Ok(())
}

/// Insert `key` into `owner`'s owner directory.
pub fn owner_dir_insert(
    view: &mut dyn WriteView,
    owner: &AccountId,
    key: Hash,
) -> Result<u64, LedgerError> {
    let root = Keylet::owner_dir(owner);
    let owner = *owner;
    dir_insert(view, &root, key, move |root| DirectoryNode {
        root_index: root.key,
        owner: Some(owner),
        ..Default::default()
    })
}

/// Remove `key` from `owner`'s owner directory.
pub fn owner_dir_remove(
    view: &mut dyn WriteView,
    owner: &AccountId,
    page_hint: u64,
    key: &Hash,
) -> Result<(), LedgerError> {
    let root = Keylet::owner_dir(owner);
    dir_remove(view, &root, page_hint, key)
}

/// Remove `key` from `owner`'s owner directory without a page hint,
/// walking the chain. Trust lines carry no page hints.
pub fn owner_dir_remove_search(
    view: &mut dyn WriteView,
    owner: &AccountId,
    key: &Hash,
) -> Result<(), LedgerError> {
    let root = Keylet::owner_dir(owner);
    let mut page = 0u64;
    loop {
        let page_keylet = Keylet::dir_page(&root, page);
        match view.get(&page_keylet.key) {
            None => return Err(LedgerError::NotFound),
            Some(LedgerEntry::DirectoryNode(node)) => {
                if node.indexes.contains(key) {
                    return dir_remove(view, &root, page, key);
                }
                match node.index_next {
                    Some(next) => page = next,
                    None => return Err(LedgerError::NotFound),
                }
            }
            Some(_) => {
                return Err(LedgerError::WrongType(
                    "non-directory entry at directory key".to_string(),
                ))
            }
        }
    }
}

/// Every key indexed in `owner`'s owner directory, in page order.
pub fn owner_dir_entries(
    view: &dyn WriteView,
    owner: &AccountId,
) -> Result<Vec<Hash>, LedgerError> {
    let root = Keylet::owner_dir(owner);
    let mut keys = Vec::new();
    let mut page = 0u64;
    loop {
        let page_keylet = Keylet::dir_page(&root, page);
        match view.get(&page_keylet.key) {
            None => return Ok(keys),
            Some(LedgerEntry::DirectoryNode(node)) => {
                keys.extend_from_slice(&node.indexes);
                match node.index_next {
                    Some(next) => page = next,
                    None => return Ok(keys),
                }
            }
            Some(_) => {
                return Err(LedgerError::WrongType(
                    "non-directory entry at directory key".to_string(),
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Order books
// ---------------------------------------------------------------------------

/// Encode an offer quality into the 64-bit directory form: one biased
/// exponent byte over a 56-bit mantissa.
pub fn encode_quality(quality: IouValue) -> u64 {
    if quality.is_zero() {
        return 0;
    }
    let exponent = (quality.exponent() + 100) as u64;
    (exponent << 56) | quality.mantissa().unsigned_abs()
}

/// The base key of the book for an issue pair: the low 8 bytes, where the
/// quality lives, are zeroed.
pub fn book_base(pays: &Issue, gets: &Issue) -> Hash {
    let keylet = Keylet::book_dir(
        &pays.currency(),
        &pays.issuer(),
        &gets.currency(),
        &gets.issuer(),
    );
    let mut bytes = *keylet.key.to_bytes();
    bytes[24..].fill(0);
    Hash::from_bytes(&bytes)
}

/// The page key of `base` at `quality`.
pub fn book_page_key(base: &Hash, quality: u64) -> Hash {
    let mut bytes = *base.to_bytes();
    bytes[24..].copy_from_slice(&quality.to_be_bytes());
    Hash::from_bytes(&bytes)
}

/// The highest key still belonging to the book at `base`.
pub fn book_last_key(base: &Hash) -> Hash {
    book_page_key(base, u64::MAX)
}

/// The quality encoded in a book page key.
pub fn book_page_quality(key: &Hash) -> u64 {
    // the slice is exactly 8 bytes
    u64::from_be_bytes(key.to_bytes()[24..].try_into().unwrap())
}

/// Insert an offer into its book page directory, creating the page if
/// needed. Returns the page key; offers store it as their BookDirectory.
pub fn book_dir_insert(
    view: &mut dyn WriteView,
    pays: &Issue,
    gets: &Issue,
    quality: u64,
    offer_key: Hash,
) -> Result<Hash, LedgerError> {
    let base = book_base(pays, gets);
    let page_key = book_page_key(&base, quality);
    match view.get(&page_key) {
        None => {
            let node = DirectoryNode {
                root_index: page_key,
                indexes: vec![offer_key],
                exchange_rate: Some(quality),
                taker_pays_currency: Some(pays.currency()),
                taker_pays_issuer: Some(pays.issuer()),
                taker_gets_currency: Some(gets.currency()),
                taker_gets_issuer: Some(gets.issuer()),
                ..Default::default()
            };
            view.insert(page_key, LedgerEntry::DirectoryNode(node));
            Ok(page_key)
        }
        Some(LedgerEntry::DirectoryNode(mut node)) => {
            if node.indexes.len() >= DIR_NODE_MAX {
                return Err(LedgerError::DirFull);
            }
            node.indexes.push(offer_key);
            view.update(page_key, LedgerEntry::DirectoryNode(node));
            Ok(page_key)
        }
        Some(_) => Err(LedgerError::WrongType(
            "non-directory entry at book page key".to_string(),
        )),
    }
}

/// Remove an offer from its book page, deleting the page when it empties.
pub fn book_dir_remove(
    view: &mut dyn WriteView,
    page_key: &Hash,
    offer_key: &Hash,
) -> Result<(), LedgerError> {
    let Some(LedgerEntry::DirectoryNode(mut node)) = view.get(page_key) else {
        return Err(LedgerError::NotFound);
    };
    let Some(position) = node.indexes.iter().position(|k| k == offer_key) else {
        return Err(LedgerError::NotFound);
    };
    node.indexes.remove(position);
    if node.indexes.is_empty() {
        view.erase(page_key);
    } else {
        view.update(*page_key, LedgerEntry::DirectoryNode(node));
    }
    Ok(())
}
