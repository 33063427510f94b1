//! Result and metadata types handed back to collaborators.

use serde::{Deserialize, Serialize};
use xrpl_hash::Hash;
use xrpl_models::entry::LedgerEntryType;
use xrpl_models::result::TransactionResult;
use xrpl_models::sfield;
use xrpl_models::writer::CanonicalWriter;
use xrpl_models::ModelsError;

/// How one ledger entry was affected by a transaction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NodeChange {
    /// The entry was created.
    Created,
    /// The entry was modified.
    Modified,
    /// The entry was deleted.
    Deleted,
}

/// One affected ledger entry, with its canonical field images.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AffectedNode {
    /// What happened to the entry.
    pub change: NodeChange,
    /// The entry's type.
    pub entry_type: LedgerEntryType,
    /// The entry's key.
    pub ledger_index: Hash,
    /// Canonical form before the transaction (Modified and Deleted).
    pub previous_fields: Option<Vec<u8>>,
    /// Canonical form after the transaction (Created and Modified).
    pub final_fields: Option<Vec<u8>>,
}

fn object_end(payload: &mut Vec<u8>) -> Result<(), ModelsError> {
    use xrpl_serialization::{FieldHeaderSerializer, Serializer};
    FieldHeaderSerializer::new()
        .serialize(&sfield::OBJECT_END_MARKER, payload)
        .map_err(|err| ModelsError::SerializeError(err.to_string()))
}

/// The metadata a transaction leaves behind: every entry it created,
/// modified or deleted, plus its position and result within the ledger.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Affected entries in key order.
    pub affected_nodes: Vec<AffectedNode>,
    /// Index of the transaction within the ledger.
    pub transaction_index: u32,
    /// The result the transaction ended with.
    pub transaction_result: Option<TransactionResult>,
    /// What a payment actually delivered (differs from Amount on partial
    /// payments).
    pub delivered_amount: Option<xrpl_models::Amount>,
}

impl Metadata {
    /// Canonical serialization of the metadata blob.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, ModelsError> {
        let mut writer = CanonicalWriter::new();
        writer.put_u32(sfield::TRANSACTION_INDEX, self.transaction_index)?;
        if let Some(result) = self.transaction_result {
            // only applied results are recorded; their codes fit one byte
            writer.put_u8(sfield::TRANSACTION_RESULT, result.code() as u8)?;
        }
        if let Some(delivered) = &self.delivered_amount {
            writer.put_amount(sfield::DELIVERED_AMOUNT, delivered)?;
        }
        let mut nodes = Vec::with_capacity(self.affected_nodes.len());
        for node in &self.affected_nodes {
            let mut inner = CanonicalWriter::new();
            inner.put_u16(sfield::LEDGER_ENTRY_TYPE, u16::from(node.entry_type))?;
            inner.put_hash256(sfield::LEDGER_INDEX, &node.ledger_index)?;
            // the field images are already canonical field runs; close them
            // with the object end marker to form inner objects
            if let Some(previous) = &node.previous_fields {
                let mut payload = previous.clone();
                object_end(&mut payload)?;
                inner.put_raw(sfield::PREVIOUS_FIELDS, payload);
            }
            if let Some(fin) = &node.final_fields {
                let mut payload = fin.clone();
                object_end(&mut payload)?;
                inner.put_raw(sfield::FINAL_FIELDS, payload);
            }
            let header = match node.change {
                NodeChange::Created => sfield::CREATED_NODE,
                NodeChange::Modified => sfield::MODIFIED_NODE,
                NodeChange::Deleted => sfield::DELETED_NODE,
            };
            nodes.push((header, inner));
        }
        writer.put_array(sfield::AFFECTED_NODES, nodes)?;
        writer.finish()
    }

    /// Find the node for a key, for assertions and queries.
    pub fn node(&self, key: &Hash) -> Option<&AffectedNode> {
        self.affected_nodes.iter().find(|n| n.ledger_index == *key)
    }
}

/// The outcome of applying one transaction.
#[derive(Clone, Debug)]
pub struct ApplyResult {
    /// The result code.
    pub result: TransactionResult,
    /// Whether the transaction is recorded in the ledger (`tes` or `tec`).
    pub applied: bool,
    /// The fee actually claimed, in drops.
    pub fee_claimed: i64,
    /// The metadata, present when the transaction was applied.
    pub metadata: Metadata,
}
