//! Job runner: ties together the model, the spectrum solver and the writers.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;
use serde::Deserialize;

use irdiel_compute::{ComputeBackend, ComputeError, SerialBackend};
use irdiel_core::{extract, Component, DielectricModel, LabeledCurve, Parts, SampledTensorField, SpectrumSolver};
use irdiel_structure::parsers::read_structure;

use crate::config::JobConfig;
use crate::plot::SpectrumPlot;

/// Results from a job run.
pub struct RunOutput {
    pub model: DielectricModel,
    pub field: SampledTensorField,
    pub plot: SpectrumPlot,
}

/// Everything `validate` checks, resolved but not computed.
pub struct ValidatedJob {
    pub model: DielectricModel,
    pub components: Vec<Component>,
    pub parts: Parts,
    pub broadening: Vec<f64>,
}

/// Load the model and resolve every job setting without computing a spectrum.
///
/// # Arguments
/// * `job` - Parsed job file.
/// * `config_path` - Location of the job file; relative model paths are
///   resolved against it.
pub fn validate_job(job: &JobConfig, config_path: &Path) -> Result<ValidatedJob> {
    let model_path = job.model_path(config_path);
    let model = DielectricModel::load(&model_path)
        .with_context(|| format!("Cannot load model {}", model_path.display()))?;

    let components = job
        .output
        .components
        .iter()
        .map(|c| c.parse::<Component>())
        .collect::<Result<Vec<_>, _>>()?;
    let parts: Parts = job.output.parts.parse()?;
    let broadening = job.spectrum.broadening.resolve(model.mode_count())?;

    Ok(ValidatedJob {
        model,
        components,
        parts,
        broadening,
    })
}

/// Run a full job: load, compute, extract.
pub fn run_job(job: &JobConfig, config_path: &Path) -> Result<RunOutput> {
    let ValidatedJob {
        model,
        components,
        parts,
        ..
    } = validate_job(job, config_path)?;

    println!(
        "Model: {} ({} modes, max frequency {:.4} eV)",
        model.structure().formula(),
        model.mode_count(),
        model.max_frequency()
    );

    let backend = create_backend(&job.spectrum.backend)?;
    let solver = SpectrumSolver::new(backend);
    let field = solver
        .compute_spectrum(&model, &job.spectrum.params())
        .context("Spectrum evaluation failed")?;

    if !field.is_empty() {
        println!(
            "Sampled {} points in [{:.4}, {:.4}] eV",
            field.len(),
            field.frequencies[0],
            field.frequencies[field.len() - 1]
        );
    }

    let curves = extract(&field, &components, parts);
    let plot = SpectrumPlot::new(&model, curves, job.output.show_phonon_frequencies)
        .with_limits(job.output.xlim, job.output.ylim);

    Ok(RunOutput { model, field, plot })
}

/// Create a compute backend based on the user's preference string.
///
/// - `"serial"`: single thread.
/// - `"cpu"`: Rayon; fails if the binary was built without the `cpu` feature.
/// - `"auto"` (default): Rayon when available, serial otherwise.
pub fn create_backend(preference: &str) -> Result<Arc<dyn ComputeBackend>> {
    let backend: Arc<dyn ComputeBackend> = match preference {
        "serial" => Arc::new(SerialBackend),
        "cpu" => {
            #[cfg(feature = "cpu")]
            {
                Arc::new(irdiel_compute::CpuBackend::new())
            }
            #[cfg(not(feature = "cpu"))]
            {
                return Err(ComputeError::Unavailable(
                    "CPU backend requested but binary was built without --features cpu".into(),
                )
                .into());
            }
        }
        "auto" => irdiel_compute::default_backend(),
        other => {
            return Err(ComputeError::Unavailable(format!(
                "unknown backend '{}'. Valid values: auto, cpu, serial",
                other
            ))
            .into())
        }
    };
    info!("Backend: {}", backend.device_info().name);
    Ok(backend)
}

/// Raw phonon output as produced by the upstream phonon code.
///
/// Complex oscillator strengths are `[re, im]` pairs.
#[derive(Debug, Deserialize)]
pub struct RawPhonons {
    pub oscillator_strength: Vec<[[Complex64; 3]; 3]>,
    pub phfreqs_gamma: Vec<f64>,
    pub epsilon_infinity: [[f64; 3]; 3],
}

/// Assemble a model from a structure file and a raw phonon JSON file.
pub fn import_model(structure_path: &Path, phonons_path: &Path) -> Result<DielectricModel> {
    let structure = read_structure(structure_path)
        .with_context(|| format!("Cannot read structure {}", structure_path.display()))?;

    let content = std::fs::read_to_string(phonons_path)
        .with_context(|| format!("Cannot read phonon file {}", phonons_path.display()))?;
    let raw: RawPhonons = serde_json::from_str(&content)
        .with_context(|| format!("Invalid phonon file {}", phonons_path.display()))?;

    let n = raw.oscillator_strength.len();
    let strength = Array3::from_shape_fn((n, 3, 3), |(m, i, j)| raw.oscillator_strength[m][i][j]);
    let eps_inf = Array2::from_shape_fn((3, 3), |(i, j)| raw.epsilon_infinity[i][j]);

    let model = DielectricModel::new(strength, Array1::from(raw.phfreqs_gamma), eps_inf, structure)?;
    Ok(model)
}

/// Write curves to a CSV file with a metadata header.
///
/// One column per curve, sharing the frequency column.
pub fn write_curves_csv(plot: &SpectrumPlot, path: &Path, job: &JobConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);

    writeln!(file, "# IRDiel: {}", plot.title)?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# model: {}", job.model.path.display())?;
    writeln!(file, "# divisions: {}", job.spectrum.divisions)?;
    for marker in &plot.markers {
        writeln!(file, "# phonon mode {}: {:.4} meV", marker.mode, marker.x)?;
    }
    writeln!(file, "#")?;

    let header: Vec<String> = std::iter::once("frequency_meV".to_string())
        .chain(plot.curves.iter().map(csv_column))
        .collect();
    writeln!(file, "{}", header.join(","))?;

    for k in 0..plot.samples() {
        let x = plot.curves[0].x[k];
        write!(file, "{:.6}", x)?;
        for curve in &plot.curves {
            write!(file, ",{:.8e}", curve.y[k])?;
        }
        writeln!(file)?;
    }
    file.flush()?;

    println!("Curves written to: {}", path.display());
    Ok(())
}

/// Column name for a curve, e.g. `re_xx`.
fn csv_column(curve: &LabeledCurve) -> String {
    format!("{}_{}", curve.part.label().to_lowercase(), curve.component)
}

/// Write the full plot description to a JSON file.
pub fn write_plot_json(plot: &SpectrumPlot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(plot)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;

    println!("Plot (JSON) written to: {}", path.display());
    Ok(())
}
