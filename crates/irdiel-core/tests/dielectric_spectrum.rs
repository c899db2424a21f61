//! End-to-end checks of model persistence, spectrum generation and
//! component extraction.

use std::sync::Arc;

use approx::assert_relative_eq;
use irdiel_compute::SerialBackend;
use irdiel_core::{
    extract_named, Broadening, DielectricError, DielectricModel, SpectrumParams, SpectrumSolver,
};
use irdiel_structure::{Lattice, Site, Structure};
use ndarray::{arr1, Array2, Array3};
use num_complex::Complex64;

fn zincblende() -> Structure {
    Structure::new(
        Lattice::fcc(5.66).unwrap(),
        vec![Site::new("Ga", [0.0; 3]), Site::new("As", [0.25; 3])],
    )
    .unwrap()
}

/// Five modes: three acoustic, then `5 I` at 10 and 20 eV, with $\epsilon_\infty = 2 I$.
fn scenario_model() -> DielectricModel {
    let mut s = Array3::<f64>::zeros((5, 3, 3));
    for m in 3..5 {
        for i in 0..3 {
            s[[m, i, i]] = 5.0;
        }
    }
    DielectricModel::from_real(
        s,
        arr1(&[0.0, 0.0, 0.0, 10.0, 20.0]),
        Array2::eye(3) * 2.0,
        zincblende(),
    )
    .unwrap()
}

/// A GaAs-like model with an anisotropic strength on the optical mode.
fn gaas_like() -> DielectricModel {
    let mut s = Array3::<f64>::zeros((6, 3, 3));
    for m in 3..6 {
        s[[m, 0, 0]] = 2.0e-4;
        s[[m, 1, 1]] = 1.5e-4;
        s[[m, 2, 2]] = 1.0e-4;
        s[[m, 0, 1]] = 2.0e-5;
        s[[m, 1, 0]] = 2.0e-5;
    }
    DielectricModel::from_real(
        s,
        arr1(&[-1e-6, 0.0, 1e-6, 0.0332, 0.0332, 0.0332]),
        Array2::eye(3) * 10.9,
        zincblende(),
    )
    .unwrap()
}

fn serial() -> SpectrumSolver {
    SpectrumSolver::new(Arc::new(SerialBackend))
}

#[test]
fn test_concrete_scenario() {
    let params = SpectrumParams {
        broadening: Broadening::Uniform(0.1),
        freq_min: 0.0,
        freq_max: Some(5.0),
        divisions: 5,
    };
    let field = serial().compute_spectrum(&scenario_model(), &params).unwrap();

    assert_eq!(field.len(), 5);
    assert_eq!(field.frequencies.to_vec(), vec![0.0, 1.25, 2.5, 3.75, 5.0]);

    let at_zero = field.tensor(0);
    for i in 0..3 {
        assert_relative_eq!(at_zero[[i, i]].re, 2.0 + 5.0 / 100.0 + 5.0 / 400.0, epsilon = 1e-4);
        assert!(at_zero[[i, i]].im > 0.0);
        assert!(at_zero[[i, i]].im < 1e-3);
    }
    for (_, t) in field.iter() {
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    assert_eq!(t[[i, j]], Complex64::new(0.0, 0.0));
                }
            }
        }
    }
}

#[test]
fn test_grid_shape_and_order() {
    let params = SpectrumParams {
        freq_min: 0.01,
        freq_max: Some(0.05),
        divisions: 37,
        ..SpectrumParams::default()
    };
    let field = serial().compute_spectrum(&gaas_like(), &params).unwrap();

    assert_eq!(field.tensors.shape(), &[37, 3, 3]);
    assert_eq!(field.frequencies[0], 0.01);
    assert_eq!(field.frequencies[36], 0.05);
    assert!(field.frequencies.windows(2).into_iter().all(|w| w[1] > w[0]));
}

#[test]
fn test_background_limit() {
    let params = SpectrumParams {
        broadening: Broadening::Uniform(1e-6),
        freq_min: 50.0,
        freq_max: Some(100.0),
        divisions: 6,
    };
    let model = gaas_like();
    let field = serial().compute_spectrum(&model, &params).unwrap();
    let eps_inf = model.epsilon_infinity();

    for (_, t) in field.iter() {
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(t[[i, j]].re, eps_inf[[i, j]], epsilon = 1e-6);
                assert_relative_eq!(t[[i, j]].im, 0.0, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn test_scalar_broadening_equals_list() {
    let model = gaas_like();
    let scalar = SpectrumParams {
        broadening: Broadening::from(0.01),
        divisions: 64,
        ..SpectrumParams::default()
    };
    let list = SpectrumParams {
        broadening: Broadening::from(vec![0.01; model.mode_count()]),
        ..scalar.clone()
    };
    let a = serial().compute_spectrum(&model, &scalar).unwrap();
    let b = serial().compute_spectrum(&model, &list).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_broadening_list_mismatch() {
    let params = SpectrumParams {
        broadening: Broadening::PerMode(vec![0.01; 4]),
        ..SpectrumParams::default()
    };
    assert!(matches!(
        serial().compute_spectrum(&gaas_like(), &params),
        Err(DielectricError::BroadeningLengthMismatch { expected: 6, found: 4 })
    ));
}

#[test]
fn test_loss_peak_at_mode_frequency() {
    let model = gaas_like();
    let params = SpectrumParams {
        broadening: Broadening::from(0.01),
        freq_min: 0.02,
        freq_max: Some(0.05),
        divisions: 301,
    };
    let field = serial().compute_spectrum(&model, &params).unwrap();
    let im_xx: Vec<f64> = field.component("xx".parse().unwrap()).iter().map(|z| z.im).collect();
    let peak = im_xx
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(k, _)| field.frequencies[k])
        .unwrap();
    assert_relative_eq!(peak, 0.0332, epsilon = 2e-4);
}

#[cfg(feature = "cpu")]
#[test]
fn test_cpu_backend_matches_serial() {
    use irdiel_compute::CpuBackend;

    let params = SpectrumParams {
        divisions: 1000,
        ..SpectrumParams::default()
    };
    let model = gaas_like();
    let a = serial().compute_spectrum(&model, &params).unwrap();
    let b = SpectrumSolver::new(Arc::new(CpuBackend::new()))
        .compute_spectrum(&model, &params)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_named_and_numeric_components_agree() {
    let params = SpectrumParams {
        divisions: 20,
        ..SpectrumParams::default()
    };
    let field = serial().compute_spectrum(&gaas_like(), &params).unwrap();

    let named = extract_named(&field, &["xy", "zz"], "reim").unwrap();
    let numeric = extract_named(&field, &["01", "22"], "re im").unwrap();
    assert_eq!(named.len(), 4);
    for (a, b) in named.iter().zip(&numeric) {
        assert_eq!(a.y, b.y);
        assert_eq!(a.label, b.label);
    }
    assert_eq!(named[0].label, "Re{$\\epsilon_{xy}$}");
    assert_relative_eq!(named[0].x[19], field.frequencies[19] * 1000.0, epsilon = 1e-12);
}

#[test]
fn test_model_save_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gaas_ir.json");
    let model = gaas_like();

    model.save(&path).unwrap();
    let back = DielectricModel::load(&path).unwrap();
    assert_eq!(back, model);

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["@class"], "IRDielectricTensor");
    assert_eq!(value["phfreqs_gamma"][3], 0.0332);
}

#[test]
fn test_save_to_unwritable_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("model.json");
    assert!(matches!(gaas_like().save(&path), Err(DielectricError::Io(_))));
}

#[test]
fn test_static_tensor_matches_low_frequency_limit() {
    let model = gaas_like();
    let params = SpectrumParams {
        broadening: Broadening::from(0.0),
        freq_min: 0.0,
        freq_max: Some(0.0),
        divisions: 1,
    };
    let field = serial().compute_spectrum(&model, &params).unwrap();
    let eps0 = model.static_dielectric_tensor();
    for i in 0..3 {
        for j in 0..3 {
            assert_relative_eq!(field.tensor(0)[[i, j]].re, eps0[[i, j]], epsilon = 1e-9);
        }
    }
}

#[test]
fn test_zero_broadening_on_a_mode_is_not_masked() {
    let mut s = Array3::<f64>::zeros((4, 3, 3));
    for i in 0..3 {
        s[[3, i, i]] = 5.0;
    }
    let model = DielectricModel::from_real(
        s,
        arr1(&[0.0, 0.0, 0.0, 1.0]),
        Array2::eye(3) * 2.0,
        zincblende(),
    )
    .unwrap();
    let params = SpectrumParams {
        broadening: Broadening::Uniform(0.0),
        freq_min: 0.0,
        freq_max: Some(2.0),
        divisions: 3,
    };
    let field = serial().compute_spectrum(&model, &params).unwrap();
    assert_eq!(field.frequencies.to_vec(), vec![0.0, 1.0, 2.0]);

    let finite = |z: Complex64| z.re.is_finite() && z.im.is_finite();
    assert!(!finite(field.tensor(1)[[0, 0]]));
    for k in [0, 2] {
        assert!(field.tensor(k).iter().all(|&z| finite(z)));
    }
    assert_relative_eq!(field.tensor(0)[[0, 0]].re, 7.0, epsilon = 1e-12);
    assert_relative_eq!(field.tensor(2)[[0, 0]].re, 2.0 - 5.0 / 3.0, epsilon = 1e-12);
}
