use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use utxodag_consensus_core::{
    codec::utxo::{utxo_diff_data_from_bytes, utxo_diff_data_to_bytes},
    tx::{ScriptPublicKey, TransactionId, TransactionOutpoint, UtxoEntry, scriptvec},
    utxo::{utxo_diff::UtxoDiff, utxo_diff_data::UtxoDiffData},
};

fn build_diff(start: u64, len: u64, blue_score: u64) -> UtxoDiff {
    let mut diff = UtxoDiff::default();
    for i in start..start + len {
        let outpoint = TransactionOutpoint::new(TransactionId::from_u64_word(i), (i % 4) as u32);
        let entry = UtxoEntry::new(i * 10, ScriptPublicKey::new(0, scriptvec![0x20; 34]), blue_score, false);
        if i % 3 == 0 {
            diff.remove.insert(outpoint, entry);
        } else {
            diff.add.insert(outpoint, entry);
        }
    }
    diff
}

fn diff_algebra_benchmark(c: &mut Criterion) {
    // Overlapping ranges exercise both the cancelling and the disjoint paths
    let this = build_diff(0, 2000, 1);
    let other = build_diff(1000, 2000, 1);

    c.bench_function("UtxoDiff::diff_from", |b| b.iter(|| black_box(&this).diff_from(black_box(&other))));
    let delta = this.diff_from(&other).unwrap();
    c.bench_function("UtxoDiff::with_diff", |b| b.iter(|| black_box(&this).with_diff(black_box(&delta))));
}

fn diff_codec_benchmark(c: &mut Criterion) {
    let data = UtxoDiffData::new(build_diff(0, 2000, 1), Some(TransactionId::from_u64_word(1)));
    let bytes = utxo_diff_data_to_bytes(&data).unwrap();

    c.bench_function("Serialize UtxoDiffData", |b| b.iter(|| utxo_diff_data_to_bytes(black_box(&data))));
    c.bench_function("Deserialize UtxoDiffData", |b| b.iter(|| utxo_diff_data_from_bytes(black_box(&bytes))));
}

criterion_group!(benches, diff_algebra_benchmark, diff_codec_benchmark);
criterion_main!(benches);
