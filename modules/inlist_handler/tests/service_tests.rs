use std::fs;
use std::io::Write;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use inlist_handler::domain::InlistSource;
use inlist_handler::{
    DomainError, InlistBackend, InlistHandler, InlistHandlerConfig, InlistHandlerModule,
    InlistService, InlistValue, ServiceConfig, TomlInlistHandler,
};
use tempfile::TempDir;

fn service(config: ServiceConfig) -> InlistService {
    let backends: Vec<Arc<dyn InlistBackend>> = vec![
        Arc::new(InlistHandler::new()),
        Arc::new(TomlInlistHandler::new()),
    ];
    InlistService::new(backends, config)
}

/// `<root>/runs/<file>` with `<root>/defaults/<stem>.defaults`
fn layout(tmp: &TempDir, file: &str, body: &str, defaults: Option<&str>) -> std::path::PathBuf {
    let runs = tmp.path().join("runs");
    fs::create_dir_all(&runs).unwrap();
    if let Some(defaults) = defaults {
        let dir = tmp.path().join("defaults");
        fs::create_dir_all(&dir).unwrap();
        let stem = file.split('.').next().unwrap();
        fs::write(dir.join(format!("{stem}.defaults")), defaults).unwrap();
    }
    let path = runs.join(file);
    fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn routes_by_extension() {
    let tmp = TempDir::new().unwrap();
    let inlist = layout(&tmp, "star.in", "mass = 2.5\n", Some("mass = 1.0\nz = 0.014\n"));
    let toml = layout(&tmp, "star.toml", "mass = 3.5\n", None);
    let svc = service(ServiceConfig::default());

    let doc = svc.parse_local(&inlist).await.unwrap();
    assert_eq!(doc.meta.format, "inlist");
    assert_eq!(doc.values["mass"], InlistValue::Float(2.5));
    assert_eq!(doc.values["z"], InlistValue::Float(0.014));
    assert!(doc.meta.defaults_path.as_deref().unwrap().ends_with("defaults/star.defaults"));

    let doc = svc.parse_local(&toml).await.unwrap();
    assert_eq!(doc.meta.format, "toml");
    assert_eq!(doc.values["mass"], InlistValue::Float(3.5));
    assert!(doc.meta.defaults_path.is_none());
}

#[tokio::test]
async fn extension_match_is_case_insensitive() {
    let tmp = TempDir::new().unwrap();
    let path = layout(&tmp, "grid.TOML", "n = 4\n", None);

    let doc = service(ServiceConfig::default()).parse_local(&path).await.unwrap();

    assert_eq!(doc.meta.format, "toml");
}

#[tokio::test]
async fn unknown_extension_uses_fallback() {
    let tmp = TempDir::new().unwrap();
    let path = layout(&tmp, "model.cfg", "n = 4\n", Some("n = 1\nm = 2\n"));

    let doc = service(ServiceConfig::default()).parse_local(&path).await.unwrap();
    assert_eq!(doc.meta.format, "inlist");
    assert_eq!(doc.values["m"], InlistValue::Int(2));

    let strict = service(ServiceConfig {
        fallback_backend: None,
        ..ServiceConfig::default()
    });
    assert_eq!(
        strict.parse_local(&path).await.unwrap_err(),
        DomainError::no_parser_available("cfg")
    );
}

#[tokio::test]
async fn forced_backend() {
    let tmp = TempDir::new().unwrap();
    let path = layout(&tmp, "settings.in", "[solver]\nsteps = 12\n", None);
    let svc = service(ServiceConfig::default());

    let doc = svc.parse_local_as("toml", &path).await.unwrap();
    let solver = doc.values["solver"].as_table().unwrap();
    assert_eq!(solver["steps"], InlistValue::Int(12));

    assert!(matches!(
        svc.parse_local_as("xml", &path).await,
        Err(DomainError::NoParserAvailable { .. })
    ));
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// ERROR-level output emitted while `f` runs
fn error_logs(f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::ERROR)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = logs.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = service(ServiceConfig::default())
        .parse_local(&tmp.path().join("runs/absent.in"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::FileNotFound { .. }));
}

#[tokio::test]
async fn missing_file_is_reported_before_routing() {
    let tmp = TempDir::new().unwrap();
    let strict = service(ServiceConfig {
        fallback_backend: None,
        ..ServiceConfig::default()
    });

    let err = strict
        .parse_local(&tmp.path().join("runs/model.cfg"))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::FileNotFound { ref path } if path.ends_with("model.cfg")));
}

#[tokio::test]
async fn directories_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("runs.in");
    fs::create_dir_all(&dir).unwrap();

    assert!(matches!(
        service(ServiceConfig::default()).parse_local(&dir).await,
        Err(DomainError::InvalidRequest { .. })
    ));
}

#[test]
fn rejections_are_logged_at_error() {
    let tmp = TempDir::new().unwrap();
    let cfg = layout(&tmp, "model.cfg", "n = 4\n", None);
    let big = layout(&tmp, "big.in", &format!("x = '{}'\n", "y".repeat(64)), Some(""));
    let strict = service(ServiceConfig {
        max_file_size_bytes: 32,
        fallback_backend: None,
    });

    let logs = error_logs(|| {
        tokio_test::block_on(async {
            assert!(strict.parse_local_as("xml", &cfg).await.is_err());
            assert!(strict.parse_local(&cfg).await.is_err());
            assert!(strict.parse_local(tmp.path()).await.is_err());
            assert!(strict.parse_local(&big).await.is_err());
            assert!(strict
                .parse_bytes(Some("big.in"), Bytes::from(vec![b' '; 64]))
                .await
                .is_err());
            assert!(strict
                .parse_bytes(Some("notes.txt"), Bytes::from_static(b"a = 1"))
                .await
                .is_err());
        })
    });

    for message in [
        "unknown backend",
        "no backend for local file",
        "not a regular file",
        "inlist too large",
        "upload rejected",
        "no backend for upload",
    ] {
        assert!(logs.contains(message), "missing '{message}' in:\n{logs}");
    }
    assert!(logs.contains("ERROR"));
}

#[tokio::test]
async fn size_limit_applies_to_files_and_bytes() {
    let tmp = TempDir::new().unwrap();
    let body = format!("payload = '{}'\n", "x".repeat(64));
    let path = layout(&tmp, "big.in", &body, Some(""));
    let svc = service(ServiceConfig {
        max_file_size_bytes: 32,
        ..ServiceConfig::default()
    });

    assert!(matches!(
        svc.parse_local(&path).await,
        Err(DomainError::InvalidRequest { .. })
    ));
    assert!(matches!(
        svc.parse_bytes(Some("big.in"), Bytes::from(body)).await,
        Err(DomainError::InvalidRequest { .. })
    ));
}

#[tokio::test]
async fn bytes_are_parsed_without_defaults() {
    let svc = service(ServiceConfig::default());

    let doc = svc
        .parse_bytes(Some("upload.in"), Bytes::from_static(b"a = 1 % note\nb = [1,2]\n"))
        .await
        .unwrap();
    assert_eq!(doc.values.len(), 2);
    assert_eq!(
        doc.meta.source,
        InlistSource::Uploaded {
            original_name: "upload.in".into()
        }
    );

    let doc = svc
        .parse_bytes(Some("upload.toml"), Bytes::from_static(b"a = {}\n"))
        .await
        .unwrap();
    assert_eq!(doc.values["a"], InlistValue::None);

    assert!(matches!(
        svc.parse_bytes(Some("x.in"), Bytes::from_static(&[0xff, 0xfe])).await,
        Err(DomainError::ParseError { .. })
    ));
}

#[tokio::test]
async fn module_wires_configured_layout() {
    let tmp = TempDir::new().unwrap();
    let runs = tmp.path().join("runs");
    let base = tmp.path().join("base");
    fs::create_dir_all(&runs).unwrap();
    fs::create_dir_all(&base).unwrap();
    fs::write(base.join("disk.ini"), "h = 0.1\n").unwrap();
    fs::write(runs.join("disk.in"), "r = 3\n").unwrap();

    let module = InlistHandlerModule::new();
    module
        .init(&InlistHandlerConfig {
            defaults_dir: "base".into(),
            defaults_extension: "ini".into(),
            ..InlistHandlerConfig::default()
        })
        .unwrap();

    let doc = module
        .service()
        .unwrap()
        .parse_local(&runs.join("disk.in"))
        .await
        .unwrap();
    assert_eq!(doc.values["h"], InlistValue::Float(0.1));
    assert_eq!(doc.values["r"], InlistValue::Int(3));
}

#[test]
fn info_lists_backends() {
    let info = service(ServiceConfig::default()).info();
    assert_eq!(info.supported_extensions.len(), 2);
    assert!(info.supported_extensions["inlist"].contains(&"in".to_string()));
    tokio_test::block_on(async {
        let svc = service(ServiceConfig::default());
        assert!(svc.parse_bytes(None, Bytes::from_static(b"")).await.unwrap().values.is_empty());
    });
}
