use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context};
use gabac::data_block::DataBlock;
use gabac::encode::encode;
use log::info;

use crate::cmd::read_configuration;

pub fn compress(config_path: &Path, input: &Path, output: &Path) -> anyhow::Result<()> {
    let config = read_configuration(config_path)?;

    let bytes = fs::read(input)
        .with_context(|| format!("Could not read the input file `{}`", input.display()))?;
    let input_size = bytes.len();
    let block = DataBlock::from_bytes(bytes, config.word_size).ok_or_else(|| {
        anyhow!(
            "Input size {} is not a multiple of the configured word size {}",
            input_size,
            config.word_size
        )
    })?;

    info!(
        "Compressing {} symbols ({} bytes)",
        block.len(),
        input_size
    );

    let file = File::create(output)
        .with_context(|| format!("Could not create the output file `{}`", output.display()))?;
    let mut writer = BufWriter::new(file);
    encode(&config, block, &mut writer).context("Failed to compress the input")?;
    writer.flush()?;

    let output_size = fs::metadata(output)?.len();
    info!(
        "Compressed {} bytes into {} bytes ({:.2}%)",
        input_size,
        output_size,
        output_size as f64 / input_size.max(1) as f64 * 100.0
    );

    Ok(())
}
