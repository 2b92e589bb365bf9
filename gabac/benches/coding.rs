use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use gabac::_internal_test_data::{drifting_symbols, run_heavy_symbols};
use gabac::config::{
    Binarization, ContextSelection, EncodingConfiguration, SequenceTransform, StreamConfiguration,
};
use gabac::data_block::DataBlock;
use gabac::decode::decode;
use gabac::encode::encode;

const NUM_SYMBOLS: usize = 1_000_000;

fn order1_config() -> EncodingConfiguration {
    EncodingConfiguration::new(
        1,
        SequenceTransform::None,
        vec![StreamConfiguration::for_word_size(
            1,
            Binarization::TruncatedExpGolomb { c_max_teg: 4 },
            ContextSelection::AdaptiveOrder1,
        )],
    )
    .unwrap()
}

fn rle_config() -> EncodingConfiguration {
    EncodingConfiguration::new(
        1,
        SequenceTransform::Rle { guard: 16 },
        vec![
            StreamConfiguration::for_word_size(
                1,
                Binarization::Binary,
                ContextSelection::AdaptiveOrder1,
            ),
            StreamConfiguration::for_word_size(
                1,
                Binarization::TruncatedUnary { c_max: 16 },
                ContextSelection::AdaptiveOrder0,
            ),
        ],
    )
    .unwrap()
}

fn bench_coding(c: &mut Criterion) {
    let drift = drifting_symbols(NUM_SYMBOLS, 255, 3);
    let runs = run_heavy_symbols(NUM_SYMBOLS, 200, 50, 5);

    let mut group = c.benchmark_group("coding_1m");
    group.throughput(Throughput::Bytes(NUM_SYMBOLS as u64));

    let config = order1_config();
    let block = DataBlock::from_symbols(&drift, 1);
    group.bench_function("encode_teg_order1", |b| {
        b.iter(|| {
            let mut compressed = Vec::new();
            encode(&config, black_box(block.clone()), &mut compressed).unwrap();
            compressed
        })
    });

    let mut compressed = Vec::new();
    encode(&config, block, &mut compressed).unwrap();
    group.bench_function("decode_teg_order1", |b| {
        b.iter(|| decode(&config, &mut black_box(compressed.as_slice())).unwrap())
    });

    let config = rle_config();
    let block = DataBlock::from_symbols(&runs, 1);
    group.bench_function("encode_rle_bi_order1", |b| {
        b.iter(|| {
            let mut compressed = Vec::new();
            encode(&config, black_box(block.clone()), &mut compressed).unwrap();
            compressed
        })
    });

    group.finish();
}

criterion_group!(benches, bench_coding);
criterion_main!(benches);
