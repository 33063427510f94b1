//! Canonical object writer.
//!
//! Serializers for transactions, ledger entries and metadata push typed
//! fields here in any order; `finish` emits them sorted ascending by
//! (type code, field code), which is the only order the network accepts.
//! Collect-then-sort makes the canonical order a property of the writer
//! rather than of every call site.

use crate::account::{AccountId, AccountIdSerializer};
use crate::amount::{Amount, AmountSerializer};
use crate::currency::Currency;
use crate::error::ModelsError;
use crate::sfield;
use xrpl_hash::Hash;
use xrpl_serialization::{
    FieldHeader, FieldHeaderSerializer, Serializer, U16BeSerializer, U32BeSerializer,
    U64BeSerializer, U8Serializer, VecU8Serializer,
};

/// Accumulates fields of one object and emits them canonically ordered.
#[derive(Default)]
pub struct CanonicalWriter {
    fields: Vec<(FieldHeader, Vec<u8>)>,
}

impl CanonicalWriter {
    /// Fresh empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, header: FieldHeader, payload: Vec<u8>) {
        self.fields.push((header, payload));
    }

    /// 8-bit field.
    pub fn put_u8(&mut self, header: FieldHeader, value: u8) -> Result<(), ModelsError> {
        let mut payload = Vec::with_capacity(1);
        U8Serializer::new().serialize(&value, &mut payload)?;
        self.push(header, payload);
        Ok(())
    }

    /// 16-bit field.
    pub fn put_u16(&mut self, header: FieldHeader, value: u16) -> Result<(), ModelsError> {
        let mut payload = Vec::with_capacity(2);
        U16BeSerializer::new().serialize(&value, &mut payload)?;
        self.push(header, payload);
        Ok(())
    }

    /// 32-bit field.
    pub fn put_u32(&mut self, header: FieldHeader, value: u32) -> Result<(), ModelsError> {
        let mut payload = Vec::with_capacity(4);
        U32BeSerializer::new().serialize(&value, &mut payload)?;
        self.push(header, payload);
        Ok(())
    }

    /// 64-bit field.
    pub fn put_u64(&mut self, header: FieldHeader, value: u64) -> Result<(), ModelsError> {
        let mut payload = Vec::with_capacity(8);
        U64BeSerializer::new().serialize(&value, &mut payload)?;
        self.push(header, payload);
        Ok(())
    }

    /// 256-bit hash field.
    pub fn put_hash256(&mut self, header: FieldHeader, value: &Hash) -> Result<(), ModelsError> {
        self.push(header, value.to_bytes().to_vec());
        Ok(())
    }

    /// 160-bit field (currency codes and issuer ids in oracle pairs and
    /// book pages).
    pub fn put_hash160(&mut self, header: FieldHeader, value: &[u8; 20]) -> Result<(), ModelsError> {
        self.push(header, value.to_vec());
        Ok(())
    }

    /// Amount field (8 or 48 bytes).
    pub fn put_amount(&mut self, header: FieldHeader, value: &Amount) -> Result<(), ModelsError> {
        let mut payload = Vec::with_capacity(48);
        AmountSerializer::new().serialize(value, &mut payload)?;
        self.push(header, payload);
        Ok(())
    }

    /// VL-prefixed blob field.
    pub fn put_blob(&mut self, header: FieldHeader, value: &[u8]) -> Result<(), ModelsError> {
        let mut payload = Vec::with_capacity(value.len() + 2);
        VecU8Serializer::new().serialize(&value.to_vec(), &mut payload)?;
        self.push(header, payload);
        Ok(())
    }

    /// Account field (VL-prefixed 20 bytes).
    pub fn put_account(
        &mut self,
        header: FieldHeader,
        value: &AccountId,
    ) -> Result<(), ModelsError> {
        let mut payload = Vec::with_capacity(21);
        AccountIdSerializer::new().serialize(value, &mut payload)?;
        self.push(header, payload);
        Ok(())
    }

    /// Inner object field: the nested writer's fields plus the end marker.
    pub fn put_object(
        &mut self,
        header: FieldHeader,
        inner: CanonicalWriter,
    ) -> Result<(), ModelsError> {
        let mut payload = inner.finish()?;
        FieldHeaderSerializer::new().serialize(&sfield::OBJECT_END_MARKER, &mut payload)?;
        self.push(header, payload);
        Ok(())
    }

    /// Array field: each element is an (object header, fields, end marker)
    /// run, closed by the array end marker.
    pub fn put_array(
        &mut self,
        header: FieldHeader,
        elements: Vec<(FieldHeader, CanonicalWriter)>,
    ) -> Result<(), ModelsError> {
        let header_serializer = FieldHeaderSerializer::new();
        let mut payload = Vec::new();
        for (element_header, element) in elements {
            header_serializer.serialize(&element_header, &mut payload)?;
            payload.extend(element.finish()?);
            header_serializer.serialize(&sfield::OBJECT_END_MARKER, &mut payload)?;
        }
        header_serializer.serialize(&sfield::ARRAY_END_MARKER, &mut payload)?;
        self.push(header, payload);
        Ok(())
    }

    /// Vector of 256-bit hashes: VL prefix over the packed bytes.
    pub fn put_vector256(
        &mut self,
        header: FieldHeader,
        values: &[Hash],
    ) -> Result<(), ModelsError> {
        let mut packed = Vec::with_capacity(values.len() * 32);
        for value in values {
            packed.extend_from_slice(value.to_bytes());
        }
        self.put_blob(header, &packed)
    }

    /// Raw pre-encoded payload (path sets frame themselves).
    pub fn put_raw(&mut self, header: FieldHeader, payload: Vec<u8>) {
        self.push(header, payload);
    }

    /// Emit every field ascending by (type code, field code).
    pub fn finish(mut self) -> Result<Vec<u8>, ModelsError> {
        self.fields.sort_by_key(|(header, _)| header.ordinal());
        let header_serializer = FieldHeaderSerializer::new();
        let mut buffer = Vec::new();
        for (header, payload) in &self.fields {
            header_serializer.serialize(header, &mut buffer)?;
            buffer.extend_from_slice(payload);
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sfield;

    #[test]
    fn test_fields_sorted_regardless_of_push_order() {
        let mut forward = CanonicalWriter::new();
        forward.put_u16(sfield::TRANSACTION_TYPE, 0).unwrap();
        forward.put_u32(sfield::SEQUENCE, 7).unwrap();

        let mut reversed = CanonicalWriter::new();
        reversed.put_u32(sfield::SEQUENCE, 7).unwrap();
        reversed.put_u16(sfield::TRANSACTION_TYPE, 0).unwrap();

        assert_eq!(forward.finish().unwrap(), reversed.finish().unwrap());
    }

    #[test]
    fn test_known_layout() {
        let mut writer = CanonicalWriter::new();
        writer.put_u32(sfield::FLAGS, 0x0008_0000).unwrap();
        writer.put_u16(sfield::TRANSACTION_TYPE, 0).unwrap();
        // TransactionType (0x12) sorts before Flags (0x22)
        assert_eq!(hex::encode(writer.finish().unwrap()), "1200002200080000");
    }

    #[test]
    fn test_object_end_markers() {
        let mut inner = CanonicalWriter::new();
        inner.put_u16(sfield::SIGNER_WEIGHT, 1).unwrap();
        let mut outer = CanonicalWriter::new();
        outer.put_object(sfield::SIGNER_ENTRY, inner).unwrap();
        let bytes = outer.finish().unwrap();
        // EB (object 14, field 11) .. 13 0001 .. E1 marker
        assert_eq!(hex::encode(bytes), "eb130001e1");
    }
}
