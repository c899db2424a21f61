//! TOML configuration deserialisation for spectrum jobs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use irdiel_core::constants::DEFAULT_DIVISIONS;
use irdiel_core::{Broadening, SpectrumParams};
use serde::Deserialize;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the dielectric model record lives.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    /// Path to a saved model JSON. Relative paths are taken from the
    /// directory of the job file.
    pub path: PathBuf,
}

/// Grid and damping parameters.
#[derive(Debug, Deserialize)]
pub struct SpectrumConfig {
    /// A single broadening or one per mode.
    #[serde(default)]
    pub broadening: Broadening,
    /// Lower grid bound in eV (default: 0).
    #[serde(default)]
    pub freq_min: f64,
    /// Upper grid bound in eV. Chosen from the phonon frequencies when absent.
    #[serde(default)]
    pub freq_max: Option<f64>,
    #[serde(default = "default_divisions")]
    pub divisions: usize,
    /// Compute backend: "auto", "cpu", or "serial". Default: "auto".
    #[serde(default = "default_backend")]
    pub backend: String,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            broadening: Broadening::default(),
            freq_min: 0.0,
            freq_max: None,
            divisions: default_divisions(),
            backend: default_backend(),
        }
    }
}

impl SpectrumConfig {
    pub fn params(&self) -> SpectrumParams {
        SpectrumParams {
            broadening: self.broadening.clone(),
            freq_min: self.freq_min,
            freq_max: self.freq_max,
            divisions: self.divisions,
        }
    }
}

fn default_divisions() -> usize {
    DEFAULT_DIVISIONS
}

fn default_backend() -> String {
    "auto".into()
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Tensor components to plot, e.g. `["xx", "yz"]` or `["00"]`.
    #[serde(default = "default_components")]
    pub components: Vec<String>,
    /// Parts to plot: any string containing "re" and/or "im".
    #[serde(default = "default_parts")]
    pub parts: String,
    /// Write curves.csv (default: true).
    #[serde(default = "default_true")]
    pub save_curves: bool,
    /// Also write the full plot description as curves.json (default: false).
    #[serde(default)]
    pub save_json: bool,
    /// Mark the optical phonon frequencies on the frequency axis (default: true).
    #[serde(default = "default_true")]
    pub show_phonon_frequencies: bool,
    /// Optional x-axis limits in meV.
    #[serde(default)]
    pub xlim: Option<[f64; 2]>,
    /// Optional y-axis limits.
    #[serde(default)]
    pub ylim: Option<[f64; 2]>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            components: default_components(),
            parts: default_parts(),
            save_curves: true,
            save_json: false,
            show_phonon_frequencies: true,
            xlim: None,
            ylim: None,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_components() -> Vec<String> {
    vec!["xx".into()]
}
fn default_parts() -> String {
    "reim".into()
}
fn default_true() -> bool {
    true
}

impl JobConfig {
    /// Model path resolved against the directory holding the job file.
    pub fn model_path(&self, config_path: &Path) -> PathBuf {
        match config_path.parent() {
            Some(dir) if self.model.path.is_relative() => dir.join(&self.model.path),
            _ => self.model.path.clone(),
        }
    }
}

/// Parse a TOML job configuration from a string.
pub fn parse_config(content: &str) -> anyhow::Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    Ok(config)
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read job file {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid job file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let job = parse_config("[model]\npath = \"gaas.json\"\n").unwrap();
        assert_eq!(job.spectrum.broadening, Broadening::Uniform(5e-5));
        assert_eq!(job.spectrum.divisions, 500);
        assert_eq!(job.spectrum.freq_max, None);
        assert_eq!(job.spectrum.backend, "auto");
        assert_eq!(job.output.components, vec!["xx".to_string()]);
        assert_eq!(job.output.parts, "reim");
        assert!(job.output.save_curves);
        assert!(!job.output.save_json);
        assert!(job.output.show_phonon_frequencies);
    }

    #[test]
    fn test_list_broadening() {
        let job = parse_config(
            "[model]\npath = \"m.json\"\n[spectrum]\nbroadening = [0.0, 0.0, 0.0, 0.001]\nfreq_max = 0.06\n",
        )
        .unwrap();
        assert_eq!(job.spectrum.broadening, Broadening::PerMode(vec![0.0, 0.0, 0.0, 0.001]));
        let params = job.spectrum.params();
        assert_eq!(params.freq_max, Some(0.06));
    }

    #[test]
    fn test_missing_model_section() {
        assert!(parse_config("[spectrum]\ndivisions = 10\n").is_err());
    }

    #[test]
    fn test_relative_model_path() {
        let job = parse_config("[model]\npath = \"data/m.json\"\n").unwrap();
        let resolved = job.model_path(Path::new("/jobs/run.toml"));
        assert_eq!(resolved, PathBuf::from("/jobs/data/m.json"));

        let job = parse_config("[model]\npath = \"/abs/m.json\"\n").unwrap();
        assert_eq!(job.model_path(Path::new("/jobs/run.toml")), PathBuf::from("/abs/m.json"));
    }
}
