/// Tests for the prediction service state machine and artifact loading
///
/// Run with: cargo test --test service_tests -- --nocapture

use anyhow::{anyhow, Result};
use carbon_api::{
    encoding::CategoryEncoder,
    error::PredictError,
    features::FeatureVector,
    model::{ArtifactLoader, ModelLoader, Regressor},
    service::PredictionService,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::{
    io::Write,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

/// Returns a fixed value and remembers every vector it saw.
struct Recording {
    output: f64,
    seen: Mutex<Vec<FeatureVector>>,
}

impl Regressor for Recording {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self.seen.lock().push(*features);
        Ok(self.output)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Fails until `available` is flipped; counts load attempts.
struct SwitchLoader {
    available: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
    model: Arc<Recording>,
    delay: Duration,
}

impl SwitchLoader {
    fn new(available: bool, output: f64) -> Self {
        Self {
            available: Arc::new(AtomicBool::new(available)),
            attempts: Arc::new(AtomicUsize::new(0)),
            model: Arc::new(Recording { output, seen: Mutex::new(Vec::new()) }),
            delay: Duration::ZERO,
        }
    }
}

impl ModelLoader for SwitchLoader {
    fn load(&self) -> Result<Arc<dyn Regressor>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        if self.available.load(Ordering::SeqCst) {
            let model: Arc<dyn Regressor> = self.model.clone();
            Ok(model)
        } else {
            Err(anyhow!("carbon_model.json not found"))
        }
    }

    fn source(&self) -> String {
        "switch".to_string()
    }
}

fn example_payload() -> Value {
    json!({
        "transport_mode": "car",
        "km_per_day": 25,
        "diet_type": "mixed",
        "electricity_kWh_per_day": 12.5,
        "waste_kg_per_day": 1.8
    })
}

#[test]
fn test_startup_success_is_ready() {
    let loader = SwitchLoader::new(true, 12.3456);
    let model = loader.model.clone();
    let svc = PredictionService::start(Box::new(loader), CategoryEncoder::default());

    let h = svc.health();
    assert!(h.model_loaded);
    assert_eq!(h.model_name.as_deref(), Some("recording"));

    let out = svc.predict(&example_payload()).unwrap();
    assert_eq!(out.carbon_footprint, 12.35);
    assert_eq!(out.request.km_per_day, 25.0);
    assert_eq!(model.seen.lock().as_slice(), &[FeatureVector([0.0, 25.0, 2.0, 12.5, 1.8])]);
}

#[test]
fn test_failed_startup_then_lazy_reload() {
    println!("\n=== Test: Lazy Reload ===");
    let loader = SwitchLoader::new(false, 4.0);
    let available = loader.available.clone();
    let attempts = loader.attempts.clone();
    let svc = PredictionService::start(Box::new(loader), CategoryEncoder::default());

    let h = svc.health();
    assert!(!h.model_loaded);
    assert!(h.last_error.unwrap().contains("not found"));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    // health has no side effects
    svc.health();
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    let err = svc.predict(&example_payload()).unwrap_err();
    assert!(matches!(err, PredictError::ModelUnavailable));
    assert!(!err.is_client_error());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);

    available.store(true, Ordering::SeqCst);
    let out = svc.predict(&example_payload()).unwrap();
    assert_eq!(out.carbon_footprint, 4.0);
    assert!(svc.health().model_loaded);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    // ready: no more loads
    svc.predict(&example_payload()).unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    println!("✓ Service recovered after artifact appeared");
}

#[test]
fn test_concurrent_requests_share_one_reload() {
    let mut loader = SwitchLoader::new(true, 1.0);
    loader.delay = Duration::from_millis(50);
    let attempts = loader.attempts.clone();
    let svc = Arc::new(PredictionService::new(Box::new(loader), CategoryEncoder::default()));
    assert!(!svc.health().model_loaded);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let svc = svc.clone();
            thread::spawn(move || svc.predict(&example_payload()).map(|p| p.carbon_footprint))
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap().unwrap(), 1.0);
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1, "only one load should run");
}

#[test]
fn test_validation_errors_do_not_change_state() {
    let svc = PredictionService::start(Box::new(SwitchLoader::new(true, 2.0)), CategoryEncoder::default());

    let mut bad = example_payload();
    bad["diet_type"] = json!("keto");
    let err = svc.predict(&bad).unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains("Valid options: vegan, vegetarian, mixed"));

    assert!(svc.health().model_loaded);
    assert_eq!(svc.predict(&example_payload()).unwrap().carbon_footprint, 2.0);
}

#[test]
fn test_negative_model_output_clamped() {
    let svc = PredictionService::start(Box::new(SwitchLoader::new(true, -7.25)), CategoryEncoder::default());
    let out = svc.predict(&example_payload()).unwrap();
    assert_eq!(out.carbon_footprint, 0.0);
}

#[test]
fn test_non_finite_model_output_is_internal() {
    let svc = PredictionService::start(Box::new(SwitchLoader::new(true, f64::NAN)), CategoryEncoder::default());
    let err = svc.predict(&example_payload()).unwrap_err();
    assert!(matches!(err, PredictError::Internal(_)));
    assert_eq!(err.public_message(), "Internal server error during prediction");
}

#[test]
fn test_results_rounded_for_many_inputs() {
    let svc = PredictionService::start(
        Box::new(ArtifactLoader::new(concat!(env!("CARGO_MANIFEST_DIR"), "/models/carbon_model.json"))),
        CategoryEncoder::default(),
    );
    assert!(svc.health().model_loaded);

    for transport in ["car", "bus", "train", "bike"] {
        for diet in ["vegan", "vegetarian", "mixed"] {
            for km in [0.0, f64::MIN_POSITIVE, 0.333, 17.77, 123.456, 1e15 + 0.375, 1e300, 1e308] {
                let payload = json!({
                    "transport_mode": transport,
                    "km_per_day": km,
                    "diet_type": diet,
                    "electricity_kWh_per_day": km / 3.0,
                    "waste_kg_per_day": 0.117,
                });
                let y = svc.predict(&payload).unwrap().carbon_footprint;
                assert!(y.is_finite() && y >= 0.0, "km={} gave {}", km, y);
                assert!(at_most_two_decimals(y), "{} has more than 2 decimals", y);
            }
        }
    }
}

fn at_most_two_decimals(y: f64) -> bool {
    if y.abs() >= 1e16 {
        return y.fract() == 0.0;
    }
    let cents = y * 100.0;
    (cents - cents.round()).abs() < 1e-6 * cents.abs().max(1.0)
}

#[test]
fn test_artifact_loader_formats() {
    let forest = r#"{
        "kind": "random_forest",
        "n_features": 5,
        "trees": [
            {"nodes": [{"feature": 0, "threshold": 0.5, "left": 1, "right": 2}, {"value": 10.0}, {"value": 2.0}]},
            {"nodes": [{"value": 4.0}]}
        ]
    }"#;
    let linear = r#"{"kind": "linear", "intercept": 1.0, "coefficients": [0.0, 0.2, 0.0, 0.4, 1.0]}"#;
    let x = FeatureVector([0.0, 25.0, 2.0, 12.5, 1.8]);

    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(forest.as_bytes()).unwrap();
    let m = ArtifactLoader::new(f.path()).load().unwrap();
    assert_eq!(m.name(), "random_forest");
    assert_eq!(m.predict(&x).unwrap(), 7.0);

    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(linear.as_bytes()).unwrap();
    let m = ArtifactLoader::new(f.path()).load().unwrap();
    assert!((m.predict(&x).unwrap() - (1.0 + 5.0 + 5.0 + 1.8)).abs() < 1e-9);
}

#[test]
fn test_artifact_loader_failures() {
    let missing = ArtifactLoader::new("/nonexistent/carbon_model.json");
    let err = missing.load().err().unwrap();
    assert!(format!("{:#}", err).contains("failed to read model artifact"));

    for bad in [
        "not json",
        r#"{"kind": "gradient_boosting"}"#,
        r#"{"kind": "linear", "intercept": 0.0, "coefficients": [1.0, 2.0]}"#,
        r#"{"kind": "random_forest", "n_features": 5, "trees": []}"#,
        r#"{"kind": "random_forest", "n_features": 5, "trees": [{"nodes": [{"feature": 9, "threshold": 1.0, "left": 1, "right": 2}, {"value": 1.0}, {"value": 2.0}]}]}"#,
        r#"{"kind": "emission_factors", "transport_kg_per_km": [0.1]}"#,
    ] {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bad.as_bytes()).unwrap();
        assert!(ArtifactLoader::new(f.path()).load().is_err(), "accepted {}", bad);
    }
}
