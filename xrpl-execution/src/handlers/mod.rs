//! Per-transaction-type handlers, each in the three-phase shape: a
//! stateless preflight, a read-only preclaim and a sandboxed doApply.

pub mod account;
pub mod deposit_preauth;
pub mod offer;
pub mod oracle;
pub mod paychan;
pub mod payment;
pub mod signer_list;
pub mod ticket;
pub mod trustset;
