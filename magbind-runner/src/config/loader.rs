//! Configuration loading
//!
//! Tries TOML first and falls back to the compiled postcard form.

use std::fs;
use std::path::Path;
use std::str;

use eyre::{bail, eyre, Result, WrapErr};
use tracing::{debug, info, warn};

use super::{RunConfig, CONFIG_VERSION};

/// Read and decode a run config from disk
pub fn load(path: &Path) -> Result<RunConfig> {
    let bytes = fs::read(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    decode(&bytes).wrap_err_with(|| format!("loading {}", path.display()))
}

/// Decode TOML text or compiled bytes
pub fn decode(bytes: &[u8]) -> Result<RunConfig> {
    let config = match str::from_utf8(bytes) {
        Ok(text) => match toml::from_str::<RunConfig>(text) {
            Ok(config) => {
                info!("Loaded configuration from TOML");
                config
            }
            Err(toml_error) => {
                debug!("Not a TOML config, trying binary format");
                decode_binary(bytes)
                    .map_err(|_| eyre!(toml_error))
                    .wrap_err("invalid TOML run config")?
            }
        },
        Err(_) => decode_binary(bytes)?,
    };

    if config.version != CONFIG_VERSION {
        warn!(
            "Config version mismatch: found {}, expected {}",
            config.version, CONFIG_VERSION
        );
        bail!(
            "config version {} is not supported (expected {})",
            config.version,
            CONFIG_VERSION
        );
    }

    log_config_summary(&config);
    Ok(config)
}

/// Serialize a config to its compiled form
pub fn encode(config: &RunConfig) -> Result<Vec<u8>> {
    postcard::to_allocvec(config).map_err(|e| eyre!("encoding run config: {e}"))
}

/// Load a TOML config, check that its grids parse and write the compiled form
pub fn compile(config: &Path, out: &Path) -> Result<RunConfig> {
    let config = load(config)?;
    crate::run::check(&config)?;
    let bytes = encode(&config)?;
    fs::write(out, &bytes).wrap_err_with(|| format!("writing {}", out.display()))?;
    info!("Wrote {} bytes to {}", bytes.len(), out.display());
    Ok(config)
}

fn decode_binary(bytes: &[u8]) -> Result<RunConfig> {
    let config: RunConfig =
        postcard::from_bytes(bytes).map_err(|e| eyre!("decoding compiled run config: {e}"))?;
    info!("Loaded configuration from compiled form");
    Ok(config)
}

fn log_config_summary(config: &RunConfig) {
    info!("Protocol: {}", config.protocol);
    debug!("  instruments: {:?}", config.instruments());
    debug!("  settings: {:?}", config.settings());
    debug!("  fill rule: {:?}", config.fill());
}

#[cfg(test)]
mod tests {
    use super::*;
    use magbind_core::grid::FillRule;
    use magbind_core::plate::Volume;
    use magbind_protocols::Protocol;

    const SAMPLE: &str = include_str!("../../run.toml");

    #[test]
    fn test_sample_config() {
        let config = decode(SAMPLE.as_bytes()).unwrap();
        assert_eq!(config.protocol, Protocol::TotalRna);
        assert_eq!(config.fill(), FillRule::ColumnContiguous);
        assert!(config.grid.is_some());
        assert_eq!(config.settings().mix_repetitions, 50);
    }

    #[test]
    fn test_compiled_form_falls_back() {
        let mut config = RunConfig::new(Protocol::Dilution);
        config.dilution = Some(Default::default());
        let bytes = encode(&config).unwrap();
        assert_eq!(decode(&bytes).unwrap(), config);
    }

    #[test]
    fn test_overrides() {
        let text = r#"
protocol = "pooling"
fill = "column-contiguous"

[settings]
settle_s = 5
supernatant_volume = 20000
"#;
        let config = decode(text.as_bytes()).unwrap();
        assert_eq!(config.fill(), FillRule::ColumnContiguous);
        assert_eq!(config.settings().settle_s, 5);
        assert_eq!(config.settings().supernatant_volume, Volume::from_ul(200));
        assert_eq!(config.settings().mix_repetitions, 10);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let text = "version = 2\nprotocol = \"dilution\"\n";
        let err = decode(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("version 2"));
    }

    #[test]
    fn test_bad_toml_reports_toml_error() {
        let err = decode(b"protocol = \"centrifuge\"").unwrap_err();
        assert!(format!("{err:#}").contains("invalid TOML run config"));
    }
}
