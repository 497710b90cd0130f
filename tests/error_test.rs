//! Tests for error types

use trueno_ab::Error;

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("successes exceed trials".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid input"));
    assert!(error_str.contains("successes exceed trials"));
}

#[test]
fn test_invalid_configuration_error() {
    let error = Error::InvalidConfiguration("multiple control variants (a, b)".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid configuration"));
    assert!(error_str.contains("multiple control variants"));
    assert!(error_str.contains("Fix the experiment setup"));
}

#[test]
fn test_no_variants_error() {
    let error = Error::NoVariants("exp-7".to_string());
    assert_eq!(format!("{error}"), "Experiment exp-7 has no variants to assign to");
}

#[test]
fn test_invalid_transition_error() {
    let error = Error::InvalidTransition {
        from: "archived".to_string(),
        to: "running".to_string(),
    };
    assert_eq!(format!("{error}"), "Invalid status transition: archived -> running");
}

#[test]
fn test_not_found_error() {
    let error = Error::NotFound("experiment exp-404".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Not found"));
    assert!(error_str.contains("exp-404"));
}

#[test]
fn test_storage_error() {
    let error = Error::StorageError("backend unavailable".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Storage error"));
    assert!(error_str.contains("backend unavailable"));
}

#[test]
fn test_serialization_error_from_serde() {
    let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
    let error: Error = json_err.into();
    assert!(matches!(error, Error::Serialization(_)));
    assert!(format!("{error}").contains("Serialization error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    assert_eq!(format!("{error}"), "custom error message");
}

#[test]
fn test_error_debug() {
    let error = Error::NoVariants("exp-1".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("NoVariants"));
}

#[test]
fn test_error_converts_to_anyhow() {
    fn run() -> anyhow::Result<()> {
        Err(Error::NotFound("metric conv".to_string()))?;
        Ok(())
    }
    let err = run().unwrap_err();
    assert!(err.to_string().contains("metric conv"));
}
