use std::fs;
use std::path::Path;

use anyhow::Context;
use gabac::config::EncodingConfiguration;

pub mod compress;
pub mod decompress;
pub mod show_config;

pub fn read_configuration(path: &Path) -> anyhow::Result<EncodingConfiguration> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Could not read the configuration file `{}`", path.display()))?;
    let config = EncodingConfiguration::from_json(&json)
        .with_context(|| format!("Invalid encoding configuration in `{}`", path.display()))?;

    Ok(config)
}
