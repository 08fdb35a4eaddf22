use super::*;

#[test]
fn status_mapping() {
    assert_eq!(AppError::network("connect", "refused").status(), Some(0));
    assert_eq!(AppError::http(404, "missing", None).status(), Some(404));
    assert_eq!(AppError::unauthorized("expired", "token expired").status(), Some(401));
    assert_eq!(AppError::user("bad_input", "oops").status(), None);
    assert_eq!(AppError::storage("io", "disk").status(), None);
    assert_eq!(AppError::decode("json", "bad").status(), None);
    assert_eq!(AppError::internal("internal", "panic").status(), None);
}

#[test]
fn unauthorized_is_only_401() {
    assert!(AppError::unauthorized("auth", "no").is_unauthorized());
    assert!(AppError::http(401, "no", None).is_unauthorized());
    assert!(!AppError::http(403, "forbidden", None).is_unauthorized());
    assert!(!AppError::network("connect", "refused").is_unauthorized());
}

#[test]
fn display_and_accessors() {
    let e = AppError::http(422, "validation failed", Some("title is required".into()));
    assert_eq!(e.code_str(), "http_error");
    assert_eq!(e.message(), "validation failed");
    assert_eq!(e.server_message(), Some("title is required"));
    assert_eq!(e.to_string(), "http_error: HTTP 422: validation failed");

    let n = AppError::network("connect", "refused");
    assert!(n.is_network());
    assert_eq!(n.server_message(), None);
    assert_eq!(n.to_string(), "connect: refused");
}

#[test]
fn conversions() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let e: AppError = json_err.into();
    assert_eq!(e.code_str(), "decode_error");

    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let e: AppError = io.into();
    assert_eq!(e.code_str(), "io_error");

    let e: AppError = anyhow::anyhow!("boom").into();
    assert_eq!(e.code_str(), "internal_error");
    assert_eq!(e.message(), "boom");
}
