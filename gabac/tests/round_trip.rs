use gabac::_internal_test_data::{
    random_symbols, SYMBOLS_DRIFT_1K, SYMBOLS_RANDOM_1K, SYMBOLS_RUNS_1K,
};
use gabac::config::{
    Binarization, ContextSelection, EncodingConfiguration, SequenceTransform, StreamConfiguration,
};
use gabac::data_block::DataBlock;
use gabac::decode::decode;
use gabac::encode::encode;

fn round_trip(config: &EncodingConfiguration, symbols: &[u64]) {
    let block = DataBlock::from_symbols(symbols, config.word_size);

    let mut compressed = Vec::new();
    encode(config, block.clone(), &mut compressed).unwrap();

    let decoded = decode(config, &mut compressed.as_slice()).unwrap();
    assert_eq!(
        decoded, block,
        "configuration: {:?}",
        config.stream_configs[0]
    );
}

fn single_stream_config(
    word_size: u8,
    binarization: Binarization,
    context_selection: ContextSelection,
) -> EncodingConfiguration {
    EncodingConfiguration::new(
        word_size,
        SequenceTransform::None,
        vec![StreamConfiguration::for_word_size(
            word_size,
            binarization,
            context_selection,
        )],
    )
    .unwrap()
}

fn byte_wide_binarizations() -> Vec<Binarization> {
    vec![
        Binarization::Binary,
        Binarization::TruncatedUnary { c_max: 255 },
        Binarization::ExponentialGolomb,
        Binarization::SignedExponentialGolomb,
        Binarization::TruncatedExpGolomb { c_max_teg: 17 },
        Binarization::SignedTruncatedExpGolomb { c_max_teg: 17 },
        Binarization::SplitUnitwiseTruncatedUnary { split_unit_size: 3 },
        Binarization::SignedSplitUnitwiseTruncatedUnary { split_unit_size: 3 },
        Binarization::DoubleTruncatedUnary {
            split_unit_size: 2,
            c_max_dtu: 3,
        },
        Binarization::SignedDoubleTruncatedUnary {
            split_unit_size: 2,
            c_max_dtu: 3,
        },
    ]
}

#[test]
fn test_round_trip_all_binarizations_bypass() {
    for binarization in byte_wide_binarizations() {
        let config = single_stream_config(1, binarization, ContextSelection::Bypass);
        round_trip(&config, &SYMBOLS_RANDOM_1K);
    }
}

#[test]
fn test_round_trip_all_binarizations_order0() {
    for binarization in byte_wide_binarizations() {
        let config = single_stream_config(1, binarization, ContextSelection::AdaptiveOrder0);
        round_trip(&config, &SYMBOLS_RANDOM_1K);
    }
}

#[test_log::test]
fn test_round_trip_all_binarizations_order1() {
    for binarization in byte_wide_binarizations() {
        let config = single_stream_config(1, binarization, ContextSelection::AdaptiveOrder1);
        round_trip(&config, &SYMBOLS_RUNS_1K);
    }
}

#[test]
fn test_round_trip_order2_narrow_subsymbols() {
    // order-2 context tables scale with the alphabet squared; keep the
    // subsymbols narrow
    let binarizations = [
        Binarization::Binary,
        Binarization::TruncatedUnary { c_max: 3 },
        Binarization::ExponentialGolomb,
        Binarization::SignedExponentialGolomb,
        Binarization::TruncatedExpGolomb { c_max_teg: 2 },
        Binarization::SignedTruncatedExpGolomb { c_max_teg: 2 },
    ];

    for binarization in binarizations {
        let mut stream_config =
            StreamConfiguration::for_word_size(1, binarization, ContextSelection::AdaptiveOrder2);
        stream_config.coding_subsym_size = 2;
        let config =
            EncodingConfiguration::new(1, SequenceTransform::None, vec![stream_config]).unwrap();

        round_trip(&config, &SYMBOLS_RUNS_1K);
    }
}

#[test]
fn test_round_trip_empty_and_single_element() {
    for context_selection in [
        ContextSelection::Bypass,
        ContextSelection::AdaptiveOrder0,
        ContextSelection::AdaptiveOrder1,
    ] {
        let config = single_stream_config(1, Binarization::Binary, context_selection);
        round_trip(&config, &[]);
        round_trip(&config, &[0]);
        round_trip(&config, &[255]);
    }
}

#[test]
fn test_round_trip_wide_word_sizes() {
    for (word_size, max) in [(2, 0xFFFF), (4, 0xFFFF_FFFF), (8, u64::MAX)] {
        let config = single_stream_config(word_size, Binarization::Binary, ContextSelection::AdaptiveOrder0);
        let symbols = random_symbols(300, max, word_size as u64);
        round_trip(&config, &symbols);
    }
}

#[test]
fn test_round_trip_multi_subsymbol_truncated_unary() {
    // 16-bit symbols split into two 8-bit subsymbols
    let mut stream_config = StreamConfiguration::for_word_size(
        2,
        Binarization::TruncatedUnary { c_max: 255 },
        ContextSelection::AdaptiveOrder1,
    );
    stream_config.coding_subsym_size = 8;
    let config = EncodingConfiguration::new(2, SequenceTransform::None, vec![stream_config]).unwrap();

    let symbols = random_symbols(500, 0xFFFF, 21);
    round_trip(&config, &symbols);
}

#[test]
fn test_round_trip_diff_coding_drifting_values() {
    for binarization in [
        Binarization::Binary,
        Binarization::SignedExponentialGolomb,
        Binarization::SignedTruncatedExpGolomb { c_max_teg: 3 },
    ] {
        let mut stream_config =
            StreamConfiguration::for_word_size(1, binarization, ContextSelection::AdaptiveOrder0);
        stream_config.diff_coding = true;
        let config =
            EncodingConfiguration::new(1, SequenceTransform::None, vec![stream_config]).unwrap();

        round_trip(&config, &SYMBOLS_DRIFT_1K);
    }
}

#[test]
fn test_round_trip_equality_transform() {
    let config = EncodingConfiguration::new(
        1,
        SequenceTransform::Equality,
        vec![
            StreamConfiguration::for_word_size(
                1,
                Binarization::ExponentialGolomb,
                ContextSelection::AdaptiveOrder1,
            ),
            StreamConfiguration::for_word_size(
                1,
                Binarization::TruncatedUnary { c_max: 1 },
                ContextSelection::AdaptiveOrder1,
            ),
        ],
    )
    .unwrap();

    round_trip(&config, &SYMBOLS_RUNS_1K);
}

#[test_log::test]
fn test_round_trip_rle_transform() {
    for guard in [1, 3, 16, 255] {
        let config = EncodingConfiguration::new(
            1,
            SequenceTransform::Rle { guard },
            vec![
                StreamConfiguration::for_word_size(
                    1,
                    Binarization::Binary,
                    ContextSelection::AdaptiveOrder1,
                ),
                StreamConfiguration::for_word_size(
                    1,
                    Binarization::TruncatedUnary { c_max: 255 },
                    ContextSelection::AdaptiveOrder0,
                ),
            ],
        )
        .unwrap();

        round_trip(&config, &SYMBOLS_RUNS_1K);
    }
}

#[test]
fn test_round_trip_with_context_initialization() {
    // TU over one 8-bit subsymbol at order 0: 255 contexts
    let mut stream_config = StreamConfiguration::for_word_size(
        1,
        Binarization::TruncatedUnary { c_max: 255 },
        ContextSelection::AdaptiveOrder0,
    );
    stream_config.context_init = Some((0..255).map(|i| (i % 128) as u8).collect());
    let config = EncodingConfiguration::new(1, SequenceTransform::None, vec![stream_config]).unwrap();

    round_trip(&config, &SYMBOLS_RANDOM_1K);
}

#[test]
fn test_encode_scenario_diff_with_binary_bypass() {
    let mut stream_config =
        StreamConfiguration::for_word_size(1, Binarization::Binary, ContextSelection::Bypass);
    stream_config.diff_coding = true;
    let config = EncodingConfiguration::new(1, SequenceTransform::None, vec![stream_config]).unwrap();

    round_trip(&config, &[0, 0, 0, 1, 1, 1, 1, 2]);
}

#[test]
fn test_decode_rejects_truncated_input() {
    let config = single_stream_config(1, Binarization::Binary, ContextSelection::AdaptiveOrder0);
    let block = DataBlock::from_symbols(&SYMBOLS_RANDOM_1K, 1);

    let mut compressed = Vec::new();
    encode(&config, block, &mut compressed).unwrap();
    compressed.truncate(compressed.len() / 2);

    assert!(decode(&config, &mut compressed.as_slice()).is_err());
}

#[test]
fn test_identical_input_produces_identical_output() {
    let config = single_stream_config(1, Binarization::TruncatedExpGolomb { c_max_teg: 4 }, ContextSelection::AdaptiveOrder1);
    let block = DataBlock::from_symbols(&SYMBOLS_RUNS_1K, 1);

    let mut first = Vec::new();
    encode(&config, block.clone(), &mut first).unwrap();
    let mut second = Vec::new();
    encode(&config, block, &mut second).unwrap();

    assert_eq!(first, second);
}
