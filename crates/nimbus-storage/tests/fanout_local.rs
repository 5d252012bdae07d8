/// End-to-end fan-out tests against filesystem backends.
///
/// Each backend writes into its own temporary directory, so the whole
/// dispatch path (independent payload cursors, concurrent tasks, report
/// aggregation) runs against real I/O.
use std::path::Path;
use std::sync::Arc;

use nimbus_core::Payload;
use nimbus_core::config::{LocalConfig, NimbusConfig};
use nimbus_core::types::ProviderKind;
use nimbus_storage::factory::init_uploaders;
use nimbus_storage::local::LocalUploader;
use nimbus_storage::{Coordinator, CoordinatorError, UploadRequest, Uploader};
use tempfile::TempDir;

/// Deterministic pseudo-random data (xorshift).
fn generate_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u64 = 0xdeadbeefcafe1234;
    while data.len() < size {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        data.extend_from_slice(&state.to_le_bytes());
    }
    data.truncate(size);
    data
}

fn local(root: &Path, name: &str) -> Arc<dyn Uploader> {
    Arc::new(LocalUploader::new(root, name).unwrap())
}

/// A backend whose root has been replaced by a plain file, so every write fails.
fn broken(tmp: &TempDir, name: &str) -> Arc<dyn Uploader> {
    let root = tmp.path().join(name);
    let uploader = LocalUploader::new(&root, name).unwrap();
    std::fs::remove_dir(&root).unwrap();
    std::fs::write(&root, b"not a directory").unwrap();
    Arc::new(uploader)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_backend_receives_identical_content() {
    let tmp = TempDir::new().unwrap();
    let names = ["1", "2", "3"];
    let coordinator = Coordinator::new(
        names
            .iter()
            .map(|n| local(&tmp.path().join(n), n))
            .collect(),
    )
    .unwrap();

    let data = generate_data(4 * 1024 * 1024 + 17);
    let payload = Payload::from_bytes(data.clone());
    let expected_hash = payload.sha256_hex();
    let request = UploadRequest::new("uploads", "nested/data.bin", payload);

    let report = coordinator.dispatch(&request).await.unwrap();
    assert_eq!(report.succeeded.len(), 3);

    for name in names {
        let written = std::fs::read(tmp.path().join(name).join("uploads/nested/data.bin")).unwrap();
        assert_eq!(written.len(), data.len());
        assert_eq!(Payload::from_bytes(written).sha256_hex(), expected_hash);
    }
}

#[tokio::test]
async fn broken_backend_does_not_stop_the_others() {
    let tmp = TempDir::new().unwrap();
    let coordinator = Coordinator::new(vec![
        local(&tmp.path().join("1"), "1"),
        local(&tmp.path().join("2"), "2"),
        broken(&tmp, "3"),
    ])
    .unwrap();

    let request = UploadRequest::new("b", "k", Payload::from_bytes(&b"hello"[..]));
    let err = coordinator.dispatch(&request).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::PartialFailure(_)));

    let report = err.into_report().unwrap();
    let mut succeeded: Vec<&str> = report.succeeded.iter().map(|p| p.as_str()).collect();
    succeeded.sort();
    assert_eq!(succeeded, vec!["1", "2"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].provider.as_str(), "3");
    assert!(report.failed[0].to_string().starts_with("\"3\" upload failed"));

    assert_eq!(std::fs::read(tmp.path().join("1/b/k")).unwrap(), b"hello");
    assert_eq!(std::fs::read(tmp.path().join("2/b/k")).unwrap(), b"hello");
}

#[tokio::test]
async fn all_backends_broken() {
    let tmp = TempDir::new().unwrap();
    let coordinator = Coordinator::new(vec![broken(&tmp, "a"), broken(&tmp, "b")]).unwrap();

    let request = UploadRequest::new("b", "k", Payload::from_bytes(&b"hello"[..]));
    let err = coordinator.dispatch(&request).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::AllFailed(_)));
    assert_eq!(err.report().unwrap().failed.len(), 2);
}

#[tokio::test]
async fn invalid_key_is_a_backend_failure() {
    let tmp = TempDir::new().unwrap();
    let coordinator = Coordinator::new(vec![local(tmp.path(), "local")]).unwrap();

    let request = UploadRequest::new("b", "../outside", Payload::from_bytes(&b"x"[..]));
    let err = coordinator.dispatch(&request).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::AllFailed(_)));
    assert!(!tmp.path().join("outside").exists());
}

#[tokio::test]
async fn coordinator_from_config() {
    let tmp = TempDir::new().unwrap();
    let config = NimbusConfig {
        local: Some(LocalConfig {
            root: tmp.path().display().to_string(),
        }),
        ..Default::default()
    };

    let uploaders = init_uploaders(&config.configured_providers(), &config)
        .await
        .unwrap();
    let coordinator = Coordinator::new(uploaders).unwrap();
    assert_eq!(
        coordinator.providers()[0].as_str(),
        ProviderKind::Local.to_string()
    );

    let request = UploadRequest::new("bucket", "file.txt", Payload::from_bytes(&b"cfg"[..]));
    let report = coordinator.dispatch(&request).await.unwrap();
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(
        std::fs::read(tmp.path().join("bucket/file.txt")).unwrap(),
        b"cfg"
    );
}

#[tokio::test]
async fn empty_config_cannot_build_a_coordinator() {
    let config = NimbusConfig::default();
    let uploaders = init_uploaders(&config.configured_providers(), &config)
        .await
        .unwrap();
    assert!(matches!(
        Coordinator::new(uploaders),
        Err(CoordinatorError::NoBackends)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_dispatches_share_backends() {
    let tmp = TempDir::new().unwrap();
    let coordinator = Coordinator::new(vec![
        local(&tmp.path().join("1"), "1"),
        local(&tmp.path().join("2"), "2"),
    ])
    .unwrap();

    let requests: Vec<UploadRequest> = (0..8)
        .map(|i| {
            UploadRequest::new(
                "shared",
                format!("object-{i}"),
                Payload::from_bytes(generate_data(1024 + i)),
            )
        })
        .collect();

    let results = futures::future::join_all(requests.iter().map(|r| coordinator.dispatch(r))).await;
    for result in results {
        assert_eq!(result.unwrap().succeeded.len(), 2);
    }

    for i in 0..8 {
        for backend in ["1", "2"] {
            let path = tmp.path().join(backend).join(format!("shared/object-{i}"));
            assert_eq!(std::fs::read(path).unwrap(), generate_data(1024 + i));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_dispatches_to_one_key_stay_intact() {
    let tmp = TempDir::new().unwrap();
    let coordinator = Coordinator::new(vec![local(tmp.path(), "local")]).unwrap();
    let first = UploadRequest::new("bkt", "same", Payload::from_bytes(vec![b'a'; 2 * 1024 * 1024]));
    let second = UploadRequest::new("bkt", "same", Payload::from_bytes(vec![b'b'; 1024 * 1024]));

    for _ in 0..20 {
        let (a, b) = tokio::join!(coordinator.dispatch(&first), coordinator.dispatch(&second));
        assert!(a.unwrap().is_success());
        assert!(b.unwrap().is_success());

        let written = std::fs::read(tmp.path().join("bkt/same")).unwrap();
        let digest = Payload::from_bytes(written).sha256_hex();
        assert!(
            digest == first.payload().sha256_hex() || digest == second.payload().sha256_hex(),
            "final object matches neither upload"
        );
    }
}
