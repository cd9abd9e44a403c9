mod common;

use common::*;

#[tokio::test]
async fn test_load_once() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = AncestorModel::new(fallback_config(&labels));
    assert_eq!(model.state(), ModelState::Unloaded);

    assert_eq!(model.load().await, LoadOutcome::Loaded(BackendKind::Fallback));
    assert_eq!(model.state(), ModelState::Ready);

    // Later calls are no-ops
    assert_eq!(model.load().await, LoadOutcome::Skipped(ModelState::Ready));
    assert_eq!(model.state(), ModelState::Ready);
}

#[tokio::test]
async fn test_concurrent_loads_run_once() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = AncestorModel::new(cpu_config(&labels));

    let (first, second) = tokio::join!(model.load(), model.load());

    assert!(first.is_skipped() ^ second.is_skipped());
    assert!(
        [&first, &second].contains(&&LoadOutcome::Skipped(ModelState::Loading)),
        "the losing call should see the loader in progress: {:?} {:?}",
        first,
        second
    );
    assert_eq!(model.state(), ModelState::Ready);
    assert_eq!(model.backend(), Some(BackendKind::Cpu));
}

#[tokio::test]
async fn test_predict_while_loading() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = AncestorModel::new(cpu_config(&labels));
    let image = create_test_image(64, 64);

    let load = model.load();
    tokio::pin!(load);

    // Poll the loader once so it claims the state, then stop
    tokio::select! {
        biased;
        _ = &mut load => panic!("load finished on its first poll"),
        _ = std::future::ready(()) => {}
    }

    assert_eq!(model.state(), ModelState::Loading);
    assert!(model.status().is_loading);
    assert!(matches!(model.predict(&image).await, Err(AnalysisError::NotReady)));
    assert_eq!(model.load().await, LoadOutcome::Skipped(ModelState::Loading));

    assert_eq!(load.await, LoadOutcome::Loaded(BackendKind::Cpu));
    assert!(model.predict(&image).await.is_ok());
}

#[tokio::test]
async fn test_missing_vocabulary_degrades() {
    let config = Config {
        labels_path: "no/such/model_info.json".into(),
        ..Config::default()
    };
    let model = AncestorModel::new(config);

    match model.load().await {
        LoadOutcome::Degraded(LoadError::ResourceFetch { path, .. }) => {
            assert!(path.ends_with("model_info.json"));
        }
        other => panic!("expected a resource error, got {:?}", other),
    }

    assert_eq!(model.state(), ModelState::Ready);
    assert_eq!(model.backend(), Some(BackendKind::Fallback));
    assert_eq!(model.vocabulary().map(|v| v.len()), Some(16));
}

#[tokio::test]
async fn test_invalid_vocabulary_degrades() {
    let labels = write_raw_vocabulary(r#"{"labels": "korean_female"}"#);
    let model = AncestorModel::new(cpu_config(&labels));

    assert!(matches!(
        model.load().await,
        LoadOutcome::Degraded(LoadError::InvalidVocabulary(_))
    ));
    assert_eq!(model.vocabulary().map(|v| v.len()), Some(16));
}

#[tokio::test]
async fn test_unknown_backend_degrades() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let config = Config {
        backend: "webgl".to_string(),
        ..cpu_config(&labels)
    };
    let model = AncestorModel::new(config);

    assert!(matches!(
        model.load().await,
        LoadOutcome::Degraded(LoadError::BackendInit(_))
    ));
    // A backend failure also replaces the vocabulary
    assert_eq!(model.vocabulary().map(|v| v.len()), Some(16));
    assert_eq!(model.backend(), Some(BackendKind::Fallback));
}

#[tokio::test]
async fn test_rten_without_model_path_degrades() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let config = Config {
        backend: "rten".to_string(),
        model_path: None,
        ..cpu_config(&labels)
    };
    let model = AncestorModel::new(config);

    match model.load().await {
        LoadOutcome::Degraded(LoadError::BackendInit(reason)) => {
            assert!(reason.contains("model_path"));
        }
        other => panic!("expected a backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_load_timeout_degrades() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let config = Config {
        load_timeout_ms: 0,
        ..cpu_config(&labels)
    };
    let model = AncestorModel::new(config);

    assert!(matches!(
        model.load().await,
        LoadOutcome::Degraded(LoadError::Timeout(_))
    ));
    assert_eq!(model.state(), ModelState::Ready);
}

#[tokio::test]
async fn test_status() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = AncestorModel::new(fallback_config(&labels));

    let status = model.status();
    assert!(!status.is_loaded);
    assert!(!status.is_loading);
    assert_eq!(status.labels_count, 0);
    assert_eq!(status.backend, "none");

    model.load().await;

    let status = model.status();
    assert!(status.is_loaded);
    assert!(!status.is_loading);
    assert_eq!(status.labels_count, 2);
    assert_eq!(status.backend, "fallback");
}

#[tokio::test]
async fn test_model_info() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let info = AncestorModel::new(fallback_config(&labels)).info();
    assert_eq!(info.accuracy, "40.32%");
    assert_eq!(info.input_size, "224x224");
}
