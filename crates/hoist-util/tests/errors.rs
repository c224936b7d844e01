use hoist_util::errors::HoistError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = HoistError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_config_error_display() {
    let err = HoistError::Config {
        message: "bad syntax".to_string(),
    };
    assert_eq!(err.to_string(), "Config error: bad syntax");
}

#[test]
fn test_validation_error_display() {
    let err = HoistError::Validation {
        message: "module.group is empty".to_string(),
    };
    assert_eq!(err.to_string(), "Validation failed: module.group is empty");
}

#[test]
fn test_authentication_error_names_repository() {
    let err = HoistError::Authentication {
        repository: "vintageforge".to_string(),
        message: "no password".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Authentication failed for repository 'vintageforge': no password"
    );
}

#[test]
fn test_upload_error_display() {
    let err = HoistError::Upload {
        path: "org/ow2/asm/asm/9.9/asm-9.9.jar".to_string(),
        message: "HTTP 502".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Upload of org/ow2/asm/asm/9.9/asm-9.9.jar failed: HTTP 502"
    );
}

#[test]
fn test_generic_error_display() {
    let err = HoistError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_downcast_from_report() {
    let report: miette::Report = HoistError::Validation {
        message: "x".to_string(),
    }
    .into();
    assert!(matches!(
        report.downcast_ref::<HoistError>(),
        Some(HoistError::Validation { .. })
    ));
}
