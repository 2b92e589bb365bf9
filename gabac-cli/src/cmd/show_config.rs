use anyhow::Context;
use gabac::config::{
    Binarization, ContextSelection, EncodingConfiguration, SequenceTransform, StreamConfiguration,
};

/// Prints a working configuration template for the given word size.
pub fn show_config(word_size: u8) -> anyhow::Result<()> {
    // order-1 context tables scale with the subsymbol alphabet; fall
    // back to order 0 for wide subsymbols
    let context_selection = if word_size <= 2 {
        ContextSelection::AdaptiveOrder1
    } else {
        ContextSelection::AdaptiveOrder0
    };

    let config = EncodingConfiguration::new(
        word_size,
        SequenceTransform::None,
        vec![StreamConfiguration::for_word_size(
            word_size,
            Binarization::TruncatedExpGolomb { c_max_teg: 4 },
            context_selection,
        )],
    )
    .context("No template available for this word size")?;

    println!("{}", config.to_json());

    Ok(())
}
