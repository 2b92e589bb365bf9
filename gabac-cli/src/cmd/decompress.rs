use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use gabac::decode::decode;
use log::info;

use crate::cmd::read_configuration;

pub fn decompress(config_path: &Path, input: &Path, output: &Path) -> anyhow::Result<()> {
    let config = read_configuration(config_path)?;

    let file = File::open(input)
        .with_context(|| format!("Could not open the input file `{}`", input.display()))?;
    let mut reader = BufReader::new(file);

    let block = decode(&config, &mut reader).context("Failed to decompress the input")?;
    info!("Decompressed {} symbols", block.len());

    fs::write(output, block.as_bytes())
        .with_context(|| format!("Could not write the output file `{}`", output.display()))?;

    Ok(())
}
