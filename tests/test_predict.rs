mod common;

use common::*;

async fn ready_model(labels: &tempfile::NamedTempFile, scores: Vec<f64>) -> AncestorModel {
    let model = AncestorModel::new(fallback_config(labels)).with_sampler(FixedScores::boxed(scores));
    assert_eq!(model.load().await, LoadOutcome::Loaded(BackendKind::Fallback));
    model
}

#[tokio::test]
async fn test_two_label_prediction() -> anyhow::Result<()> {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = ready_model(&labels, vec![0.7, 0.3]).await;

    let results = model.predict(&create_test_image(300, 400)).await?;
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].country, "한국");
    assert_eq!(results[0].gender, "여성");
    assert_eq!(results[0].probability, "70.00");
    assert_eq!(results[0].confidence, ConfidenceLevel::High);

    assert_eq!(results[1].country, "한국");
    assert_eq!(results[1].gender, "남성");
    assert_eq!(results[1].probability, "30.00");
    assert_eq!(results[1].confidence, ConfidenceLevel::Low);

    Ok(())
}

#[tokio::test]
async fn test_scores_are_normalized() -> anyhow::Result<()> {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = ready_model(&labels, vec![3.0, 1.0]).await;

    let results = model.predict(&create_test_image(50, 50)).await?;
    assert_eq!(results[0].probability, "75.00");
    assert_eq!(results[1].probability, "25.00");
    assert!((results.iter().map(|r| r.score).sum::<f64>() - 1.0).abs() < 1e-6);

    Ok(())
}

#[tokio::test]
async fn test_ties_keep_vocabulary_order() -> anyhow::Result<()> {
    let labels = write_vocabulary(&["japanese_female", "japanese_male", "thai_female", "thai_male"]);
    let model = ready_model(&labels, vec![0.25, 0.25, 0.25, 0.25]).await;

    let results = model.predict(&create_test_image(80, 80)).await?;
    let order: Vec<usize> = results.iter().map(|r| r.label_index).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
    assert!(results.iter().all(|r| r.probability == "25.00"));

    Ok(())
}

#[tokio::test]
async fn test_multi_word_countries() -> anyhow::Result<()> {
    let labels = write_vocabulary(&["hong_kong_female", "indigenous_american_male"]);
    let model = ready_model(&labels, vec![0.4, 0.6]).await;

    let results = model.predict(&create_test_image(80, 80)).await?;
    assert_eq!(results[0].country, "아메리카 원주민");
    assert_eq!(results[0].gender, "남성");
    assert_eq!(results[1].country, "홍콩");
    assert_eq!(results[1].confidence, ConfidenceLevel::Medium);

    Ok(())
}

#[tokio::test]
async fn test_fallback_vocabulary_top_five() -> anyhow::Result<()> {
    let model = AncestorModel::new(Config {
        labels_path: "missing/labels.json".into(),
        seed: Some(11),
        ..Config::default()
    });
    assert!(matches!(model.load().await, LoadOutcome::Degraded(_)));

    let results = model.predict(&create_test_image(224, 224)).await?;
    assert_eq!(results.len(), 5);
    assert!(results.windows(2).all(|pair| pair[0].score >= pair[1].score));

    let total: f64 = results.iter().map(|r| r.score).sum();
    assert!(total <= 1.0 + 1e-9);

    Ok(())
}

#[tokio::test]
async fn test_untrained_network_prediction() -> anyhow::Result<()> {
    let tokens = ["korean_female", "korean_male", "chinese_female", "chinese_male"];
    let labels = write_vocabulary(&tokens);
    let model = AncestorModel::new(cpu_config(&labels));
    assert_eq!(model.load().await, LoadOutcome::Loaded(BackendKind::Cpu));

    let results = model.predict(&create_test_image(120, 90)).await?;
    assert_eq!(results.len(), tokens.len());
    assert!((results.iter().map(|r| r.score).sum::<f64>() - 1.0).abs() < 1e-6);
    assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));

    // Same seed, same weights
    let again = AncestorModel::new(cpu_config(&labels));
    again.load().await;
    let repeated = again.predict(&create_test_image(120, 90)).await?;
    assert_eq!(results, repeated);

    Ok(())
}

#[tokio::test]
async fn test_predict_before_load() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = AncestorModel::new(fallback_config(&labels));

    let err = model.predict(&create_test_image(10, 10)).await.unwrap_err();
    assert!(matches!(err, AnalysisError::NotReady));
}

#[tokio::test]
async fn test_sampler_with_wrong_length_fails() {
    let labels = write_vocabulary(&KOREAN_PAIR);
    let model = ready_model(&labels, vec![1.0, 2.0, 3.0]).await;

    let err = model.predict(&create_test_image(10, 10)).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Inference(_)));
}
