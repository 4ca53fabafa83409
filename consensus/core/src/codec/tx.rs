//! Wire format of transactions. All integers are little-endian, including outpoint
//! indices (unlike the big-endian outpoint storage keys).
//!
//! ```text
//! version u16 | varint #inputs | inputs | varint #outputs | outputs | lock_time u64 | subnetwork id | gas u64 | var payload
//! input  := tx id | index u32 | var signature script | sequence u64
//! output := value u64 | script version u16 | var script
//! ```

use super::{CodecResult, WireElement, WireReader, WireWrite, write_var_bytes, write_varint};
use crate::{
    config::constants::codec::{MAX_COLLECTION_LEN, MAX_PAYLOAD_LEN, MAX_SCRIPT_PUBLIC_KEY_LEN, MAX_SIGNATURE_SCRIPT_LEN},
    tx::{ScriptPublicKey, ScriptVec, Transaction, TransactionInput, TransactionOutpoint, TransactionOutput},
};

/// Selects which transaction fields are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxEncoding {
    Full,
    /// Signature scripts are replaced by empty byte arrays
    ExcludeSignatureScript,
}

pub fn write_transaction<W: WireWrite>(w: &mut W, tx: &Transaction, encoding: TxEncoding) {
    w.write_element(WireElement::U16(tx.version));
    write_varint(w, tx.inputs.len() as u64);
    for input in tx.inputs.iter() {
        write_input(w, input, encoding);
    }
    write_varint(w, tx.outputs.len() as u64);
    for output in tx.outputs.iter() {
        write_output(w, output);
    }
    w.write_element(WireElement::U64(tx.lock_time));
    w.write_element(WireElement::SubnetworkId(tx.subnetwork_id));
    w.write_element(WireElement::U64(tx.gas));
    write_var_bytes(w, &tx.payload);
}

#[inline]
fn write_input<W: WireWrite>(w: &mut W, input: &TransactionInput, encoding: TxEncoding) {
    w.write_element(WireElement::Hash(input.previous_outpoint.transaction_id));
    w.write_element(WireElement::U32(input.previous_outpoint.index));
    match encoding {
        TxEncoding::Full => write_var_bytes(w, &input.signature_script),
        TxEncoding::ExcludeSignatureScript => write_var_bytes(w, &[]),
    }
    w.write_element(WireElement::U64(input.sequence));
}

#[inline]
fn write_output<W: WireWrite>(w: &mut W, output: &TransactionOutput) {
    w.write_element(WireElement::U64(output.value));
    w.write_element(WireElement::U16(output.script_public_key.version));
    write_var_bytes(w, output.script_public_key.script());
}

pub fn read_transaction(r: &mut WireReader<'_>) -> CodecResult<Transaction> {
    let version = r.read_u16()?;
    let inputs_len = r.read_collection_len(MAX_COLLECTION_LEN)?;
    let inputs = (0..inputs_len).map(|_| read_input(r)).collect::<CodecResult<Vec<_>>>()?;
    let outputs_len = r.read_collection_len(MAX_COLLECTION_LEN)?;
    let outputs = (0..outputs_len).map(|_| read_output(r)).collect::<CodecResult<Vec<_>>>()?;
    let lock_time = r.read_u64()?;
    let subnetwork_id = r.read_subnetwork_id()?;
    let gas = r.read_u64()?;
    let payload = r.read_var_bytes(MAX_PAYLOAD_LEN)?.to_vec();
    Ok(Transaction::new(version, inputs, outputs, lock_time, subnetwork_id, gas, payload))
}

fn read_input(r: &mut WireReader<'_>) -> CodecResult<TransactionInput> {
    let transaction_id = r.read_hash()?;
    let index = r.read_u32()?;
    let signature_script = r.read_var_bytes(MAX_SIGNATURE_SCRIPT_LEN)?.to_vec();
    let sequence = r.read_u64()?;
    Ok(TransactionInput::new(TransactionOutpoint::new(transaction_id, index), signature_script, sequence))
}

fn read_output(r: &mut WireReader<'_>) -> CodecResult<TransactionOutput> {
    let value = r.read_u64()?;
    let version = r.read_u16()?;
    let script = r.read_var_bytes(MAX_SCRIPT_PUBLIC_KEY_LEN)?;
    Ok(TransactionOutput::new(value, ScriptPublicKey::new(version, ScriptVec::from_slice(script))))
}

pub fn transaction_to_bytes(tx: &Transaction) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_transaction(&mut bytes, tx, TxEncoding::Full);
    bytes
}

pub fn transaction_from_bytes(bytes: &[u8]) -> CodecResult<Transaction> {
    let mut reader = WireReader::new(bytes);
    let tx = read_transaction(&mut reader)?;
    reader.finish()?;
    Ok(tx)
}
