mod common;

use common::*;

async fn ready_model(labels: &tempfile::NamedTempFile) -> AncestorModel {
    let model = AncestorModel::new(fallback_config(labels))
        .with_sampler(FixedScores::boxed(vec![0.7, 0.3]));
    model.load().await;
    model
}

#[tokio::test]
async fn test_analyze_report() -> anyhow::Result<()> {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = ready_model(&labels).await;

    let image = encode_png(&create_test_image(160, 200));
    let report = model.analyze(AnalysisRequest::new(image, Gender::Female)).await?;

    assert_eq!(report.gender, Gender::Female);
    assert!(report.face_detected);
    assert_eq!(report.backend, "fallback");
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].probability, "70.00");

    Ok(())
}

#[tokio::test]
async fn test_report_json() -> anyhow::Result<()> {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = ready_model(&labels).await;

    let image = encode_png(&create_test_image(64, 64));
    let report = model.analyze(AnalysisRequest::new(image, Gender::Male)).await?;
    let json = serde_json::to_value(&report)?;

    assert_eq!(json["gender"], "male");
    assert_eq!(json["results"][0]["country"], "한국");
    assert_eq!(json["results"][0]["confidence"], "높음");
    assert_eq!(json["results"][1]["confidence"], "낮음");
    assert!(json["results"][0].get("score").is_none());

    Ok(())
}

#[tokio::test]
async fn test_missing_inputs() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = ready_model(&labels).await;

    let no_gender = AnalysisRequest {
        image: Some(encode_png(&create_test_image(8, 8))),
        gender: None,
    };
    assert!(matches!(
        model.analyze(no_gender).await,
        Err(AnalysisError::MissingInput("gender"))
    ));

    let no_image = AnalysisRequest {
        image: None,
        gender: Some(Gender::Female),
    };
    assert!(matches!(
        model.analyze(no_image).await,
        Err(AnalysisError::MissingInput("image"))
    ));

    let empty_image = AnalysisRequest::new(Vec::new(), Gender::Female);
    assert!(matches!(
        model.analyze(empty_image).await,
        Err(AnalysisError::MissingInput("image"))
    ));
}

#[tokio::test]
async fn test_missing_input_checked_before_readiness() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = AncestorModel::new(fallback_config(&labels));

    assert!(matches!(
        model.analyze(AnalysisRequest::default()).await,
        Err(AnalysisError::MissingInput("image"))
    ));

    let request = AnalysisRequest::new(encode_png(&create_test_image(8, 8)), Gender::Male);
    assert!(matches!(
        model.analyze(request).await,
        Err(AnalysisError::NotReady)
    ));
}

#[tokio::test]
async fn test_undecodable_image() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = ready_model(&labels).await;

    let request = AnalysisRequest::new(b"definitely not an image".to_vec(), Gender::Male);
    let err = model.analyze(request).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Decode(_)));
    assert!(!err.user_message().is_empty());
}

#[tokio::test]
async fn test_debug_output() -> anyhow::Result<()> {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let debug_dir = tempfile::TempDir::new()?;

    let model = AncestorModel::new(fallback_config(&labels))
        .with_sampler(FixedScores::boxed(vec![0.5, 0.5]))
        .with_debug(debug_dir.path().to_path_buf())?;
    model.load().await;

    let image = encode_png(&create_test_image(100, 120));
    model.analyze(AnalysisRequest::new(image, Gender::Female)).await?;

    assert!(debug_dir.path().join("00_input").join("01.png").exists());
    assert!(debug_dir.path().join("01_face_check").join("01.png").exists());
    assert!(debug_dir.path().join("02_preprocess").join("01.png").exists());
    assert!(!debug_dir.path().join("03_inference").exists());

    Ok(())
}
