//! Strand construction: turning a payment's paths into executable step
//! sequences.

use super::step::Step;
use crate::common::{line_authorized_by, line_no_ripple_by, trust_line};
use std::collections::BTreeSet;
use xrpl_ledger::ReadView;
use xrpl_models::account::AccountId;
use xrpl_models::currency::Currency;
use xrpl_models::entry::account_flags;
use xrpl_models::issue::Issue;
use xrpl_models::paths::{Path, PathSet};
use xrpl_models::result::TransactionResult;

/// One executable strand.
#[derive(Clone, Debug)]
pub struct Strand {
    /// The steps, head to tail.
    pub steps: Vec<Step>,
    /// The paying account.
    pub source: AccountId,
    /// The receiving account.
    pub destination: AccountId,
}

/// A failed strand construction: either a malformed path (surface the
/// code) or an unusable path (skip it quietly).
pub enum StrandError {
    /// Reject the whole transaction with this code.
    Fatal(TransactionResult),
    /// The path cannot currently be used; skip it.
    Unusable,
}

/// One node of the normalized path: an account hop or an issue change.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Node {
    Account(AccountId),
    Book(Issue),
}

/// Build every strand for a payment. The default path (no explicit hops)
/// is prepended unless suppressed; explicit paths yielding duplicates are
/// dropped.
pub fn build_strands(
    view: &dyn ReadView,
    source: AccountId,
    destination: AccountId,
    deliver: Issue,
    send_max: Option<Issue>,
    paths: &PathSet,
    add_default_path: bool,
) -> Result<Vec<Strand>, TransactionResult> {
    let mut strands: Vec<Strand> = Vec::new();
    let mut fatal: Option<TransactionResult> = None;

    if add_default_path {
        match build_strand(view, source, destination, deliver, send_max, None) {
            Ok(strand) => strands.push(strand),
            Err(StrandError::Fatal(result)) => fatal = Some(result),
            Err(StrandError::Unusable) => {}
        }
    }
    for path in &paths.0 {
        match build_strand(view, source, destination, deliver, send_max, Some(path)) {
            Ok(strand) => {
                if !strands
                    .iter()
                    .any(|existing| existing.steps == strand.steps)
                {
                    strands.push(strand);
                }
            }
            Err(StrandError::Fatal(result)) => return Err(result),
            Err(StrandError::Unusable) => {}
        }
    }

    if strands.is_empty() {
        return Err(fatal.unwrap_or(TransactionResult::tecPATH_DRY));
    }
    Ok(strands)
}

/// Build one strand from an optional explicit path, inserting the implied
/// nodes: the source, the send-max issuer, the book on a currency change,
/// the deliver issuer and the destination.
fn build_strand(
    view: &dyn ReadView,
    source: AccountId,
    destination: AccountId,
    deliver: Issue,
    send_max: Option<Issue>,
    path: Option<&Path>,
) -> Result<Strand, StrandError> {
    let source_issue = send_max.unwrap_or(match deliver {
        Issue::Xrp => Issue::Xrp,
        Issue::Iou { currency, .. } => Issue::new(currency, source),
    });

    let mut nodes: Vec<Node> = vec![Node::Account(source)];

    // the send-max issuer sits right after the source when it differs
    if let Issue::Iou { issuer, .. } = source_issue {
        if issuer != source {
            let first_explicit_account = path
                .and_then(|path| path.0.first())
                .and_then(|element| element.account);
            if first_explicit_account != Some(issuer) {
                nodes.push(Node::Account(issuer));
            }
        }
    }

    let mut current_currency = source_issue.currency();
    if let Some(path) = path {
        for element in &path.0 {
            if element.is_empty() {
                return Err(StrandError::Fatal(TransactionResult::temBAD_PATH));
            }
            if let Some(account) = element.account {
                if element.currency.is_some() || element.issuer.is_some() {
                    // mixed elements are ambiguous
                    return Err(StrandError::Fatal(TransactionResult::temBAD_PATH));
                }
                nodes.push(Node::Account(account));
            } else {
                let currency = element.currency.unwrap_or(current_currency);
                let issuer = element
                    .issuer
                    .unwrap_or(if currency.is_xrp() { AccountId::zero() } else { source });
                nodes.push(Node::Book(Issue::new(currency, issuer)));
                current_currency = currency;
            }
        }
    }

    // an implied book bridges a currency change to the deliver issue
    let last_currency = nodes
        .iter()
        .rev()
        .find_map(|node| match node {
            Node::Book(issue) => Some(issue.currency()),
            Node::Account(_) => None,
        })
        .unwrap_or(source_issue.currency());
    if last_currency != deliver.currency() {
        nodes.push(Node::Book(deliver));
    }

    // the deliver issuer joins unless it is already last or the
    // destination issues for itself
    if let Issue::Iou { issuer, .. } = deliver {
        let last_account = nodes.iter().rev().find_map(|node| match node {
            Node::Account(account) => Some(*account),
            Node::Book(_) => None,
        });
        let last_is_issuer = matches!(nodes.last(), Some(Node::Account(account)) if *account == issuer);
        if !last_is_issuer && issuer != destination && last_account != Some(issuer) {
            nodes.push(Node::Account(issuer));
        }
    }

    if !matches!(nodes.last(), Some(Node::Account(account)) if *account == destination) {
        nodes.push(Node::Account(destination));
    }

    // no account may appear twice, and no book output may repeat
    let mut seen_accounts: BTreeSet<AccountId> = BTreeSet::new();
    let mut seen_books: BTreeSet<Issue> = BTreeSet::new();
    for node in &nodes {
        match node {
            Node::Account(account) => {
                if !seen_accounts.insert(*account) {
                    return Err(StrandError::Fatal(TransactionResult::temBAD_PATH_LOOP));
                }
            }
            Node::Book(issue) => {
                if !seen_books.insert(*issue) {
                    return Err(StrandError::Fatal(TransactionResult::temBAD_PATH_LOOP));
                }
            }
        }
    }

    nodes_to_steps(view, &nodes, source, destination, source_issue)
}

/// The nearest account node at or after `start`.
fn account_after(nodes: &[Node], start: usize, fallback: AccountId) -> AccountId {
    nodes[start..]
        .iter()
        .find_map(|node| match node {
            Node::Account(account) => Some(*account),
            Node::Book(_) => None,
        })
        .unwrap_or(fallback)
}

/// The nearest account node at or before `end`.
fn account_before(nodes: &[Node], end: usize, fallback: AccountId) -> AccountId {
    nodes[..=end]
        .iter()
        .rev()
        .find_map(|node| match node {
            Node::Account(account) => Some(*account),
            Node::Book(_) => None,
        })
        .unwrap_or(fallback)
}

fn nodes_to_steps(
    view: &dyn ReadView,
    nodes: &[Node],
    source: AccountId,
    destination: AccountId,
    source_issue: Issue,
) -> Result<Strand, StrandError> {
    let mut steps: Vec<Step> = Vec::new();
    let mut current_issue = source_issue;

    for position in 0..nodes.len() - 1 {
        let from = nodes[position];
        let to = nodes[position + 1];
        match (from, to) {
            (Node::Account(from), Node::Account(to)) => {
                if current_issue.is_xrp() {
                    // native value moves only at the endpoints
                    if from == source {
                        steps.push(Step::XrpSrc { account: from });
                    }
                    if to == destination {
                        steps.push(Step::XrpDst { account: to });
                    }
                } else {
                    check_direct(view, &from, &to, &current_issue.currency(), &source)?;
                    steps.push(Step::Direct {
                        from,
                        to,
                        currency: current_issue.currency(),
                        is_strand_head: from == source,
                    });
                    // crossing an account keeps the currency but moves the
                    // obligation family
                    current_issue = Issue::new(current_issue.currency(), to);
                }
            }
            (Node::Account(from), Node::Book(output)) => {
                if current_issue == output {
                    return Err(StrandError::Fatal(TransactionResult::temBAD_PATH));
                }
                if current_issue.is_xrp() && from == source {
                    steps.push(Step::XrpSrc { account: from });
                }
                steps.push(Step::Book {
                    prev: from,
                    next: account_after(nodes, position + 2, destination),
                    input: current_issue,
                    output,
                });
                current_issue = output;
            }
            (Node::Book(_), Node::Account(to)) => {
                // the book step already delivers to this account
                if current_issue.is_xrp() && to == destination {
                    steps.push(Step::XrpDst { account: to });
                } else if !current_issue.is_xrp() {
                    current_issue = Issue::new(current_issue.currency(), to);
                }
            }
            (Node::Book(_), Node::Book(output)) => {
                if current_issue == output {
                    return Err(StrandError::Fatal(TransactionResult::temBAD_PATH));
                }
                steps.push(Step::Book {
                    prev: account_before(nodes, position, source),
                    next: account_after(nodes, position + 2, destination),
                    input: current_issue,
                    output,
                });
                current_issue = output;
            }
        }
    }

    if steps.is_empty() {
        return Err(StrandError::Unusable);
    }
    Ok(Strand {
        steps,
        source,
        destination,
    })
}

/// Direct-step viability: the line must exist, be authorized where the
/// issuer demands it, not be frozen against the movement, and permit
/// rippling through the middle account.
fn check_direct(
    view: &dyn ReadView,
    from: &AccountId,
    to: &AccountId,
    currency: &Currency,
    strand_source: &AccountId,
) -> Result<(), StrandError> {
    let Some(line) = trust_line(view, from, to, currency) else {
        return Err(StrandError::Fatal(TransactionResult::terNO_LINE));
    };
    // the issuer side demanding auth must have granted it
    for side in [from, to] {
        if let Some(root) = crate::common::account_root(view, side) {
            if root.has_flag(account_flags::LSF_REQUIRE_AUTH) && !line_authorized_by(&line, side) {
                return Err(StrandError::Fatal(TransactionResult::terNO_AUTH));
            }
        }
    }
    // rippling through `from` requires from not to have fenced this line
    if from != strand_source && line_no_ripple_by(&line, from) {
        return Err(StrandError::Fatal(TransactionResult::terNO_RIPPLE));
    }
    Ok(())
}
