//! Engine scenario tests: a small environment builder plus one module per
//! functional area.

mod env;
mod scenarios_account;
mod scenarios_multisig;
mod scenarios_offer;
mod scenarios_oracle;
