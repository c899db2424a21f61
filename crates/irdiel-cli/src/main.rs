//! IRDiel command-line interface.
//!
//! Compute infrared dielectric spectra from TOML job files:
//! ```sh
//! irdiel run job.toml
//! irdiel validate job.toml
//! irdiel info gaas_ir.json
//! irdiel import --structure gaas.xyz --phonons gaas_phonons.json -o gaas_ir.json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use irdiel_cli::{config, runner};
use irdiel_core::constants::PRESENTATION_SCALE;
use irdiel_core::DielectricModel;

#[derive(Parser)]
#[command(name = "irdiel")]
#[command(about = "IRDiel: infrared dielectric tensors from zone-centre phonons")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a spectrum from a TOML job file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a job file and its model without computing anything.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Summarise a saved dielectric model.
    Info {
        /// Path to the model JSON.
        model: PathBuf,
    },
    /// Build a model file from a structure and raw phonon data.
    Import {
        /// Structure file (.xyz, .extxyz or .json record).
        #[arg(long)]
        structure: PathBuf,
        /// Phonon JSON with complex oscillator strengths.
        #[arg(long)]
        phonons: PathBuf,
        /// Where to write the model JSON.
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("IRDiel Spectrum");
            println!("===============");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let result = runner::run_job(&job, &config)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_curves {
                runner::write_curves_csv(&result.plot, &out_dir.join("curves.csv"), &job)?;
            }
            if job.output.save_json {
                runner::write_plot_json(&result.plot, &out_dir.join("curves.json"))?;
            }

            println!("Computed {} curves.", result.plot.curves.len());
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let checked = runner::validate_job(&job, &config)?;
            println!("Configuration is valid: {}", config.display());
            println!("  model:       {} modes", checked.model.mode_count());
            println!(
                "  components:  {}",
                checked
                    .components
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!(
                "  parts:       {}",
                checked
                    .parts
                    .iter()
                    .map(|p| p.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!(
                "  broadening:  max {:.3e}",
                checked.broadening.iter().copied().fold(0.0, f64::max)
            );
            Ok(())
        }
        Commands::Info { model } => {
            let m = DielectricModel::load(&model)
                .with_context(|| format!("Cannot load model {}", model.display()))?;
            print_model_info(&m);
            Ok(())
        }
        Commands::Import {
            structure,
            phonons,
            output,
        } => {
            let model = runner::import_model(&structure, &phonons)?;
            model
                .save(&output)
                .with_context(|| format!("Cannot write model {}", output.display()))?;
            println!(
                "Model with {} modes written to: {}",
                model.mode_count(),
                output.display()
            );
            Ok(())
        }
    }
}

fn print_model_info(model: &DielectricModel) {
    println!("Structure: {} ({} sites)", model.structure().formula(), model.structure().num_sites());
    let structure = model.structure();
    for (site, cart) in structure.sites().iter().zip(structure.cart_coords()) {
        println!(
            "  {:<4} frac [{:>7.4} {:>7.4} {:>7.4}]  cart [{:>8.4} {:>8.4} {:>8.4}] Å",
            site.label(),
            site.frac_coords[0],
            site.frac_coords[1],
            site.frac_coords[2],
            cart[0],
            cart[1],
            cart[2]
        );
    }
    println!("Modes:     {}", model.mode_count());
    println!("Max freq:  {:.4} eV ({:.2} meV)", model.max_frequency(), model.max_frequency() * PRESENTATION_SCALE);
    println!();
    println!("  mode    freq (meV)   tr S");
    for mode in model.modes() {
        let trace: f64 = (0..3).map(|i| mode.oscillator_strength[[i, i]]).sum();
        let tag = if mode.is_acoustic() { " (acoustic)" } else { "" };
        println!("  {:>4}  {:>12.4}   {:.4e}{}", mode.index, mode.frequency * PRESENTATION_SCALE, trace, tag);
    }
    println!();
    print_tensor("epsilon_inf", &model.epsilon_infinity().view());
    print_tensor("epsilon_0", &model.static_dielectric_tensor().view());
}

fn print_tensor(name: &str, t: &ndarray::ArrayView2<'_, f64>) {
    println!("{}:", name);
    for row in t.rows() {
        println!("  [{:>10.4} {:>10.4} {:>10.4}]", row[0], row[1], row[2]);
    }
}
