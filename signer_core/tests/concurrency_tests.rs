//! Concurrency guarantees of the signer pipeline

use signer_core::pipeline::{MultiHashStage, PipelineBuilder, SingleHashStage};
use signer_core::{ExclusiveResource, HashProvider, Pipeline, SignerConfig, SignerProvider};
use signer_test_utils::InstrumentedProvider;
use signer_test_utils::fixtures::{GOLDEN_0_TO_5, GOLDEN_FIBONACCI, FIBONACCI_INPUT};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_secure_hash_never_overlaps() {
    let provider = Arc::new(
        InstrumentedProvider::new()
            .with_secure_hash_delay(Duration::from_millis(5))
            .with_chk_delay(Duration::from_millis(5)),
    );
    let pipeline = Pipeline::signer(&SignerConfig::default(), provider.clone()).unwrap();

    let outcome = pipeline.run(0i64..6).await.unwrap();
    assert_eq!(outcome.single_output().unwrap(), GOLDEN_0_TO_5);
    assert_eq!(provider.secure_hash_calls(), 6);
    assert_eq!(provider.peak_secure_hash_concurrency(), 1);
    assert!(provider.peak_chk_concurrency() > 1);
}

#[tokio::test]
async fn test_shared_lock_spans_pipelines() {
    let provider = Arc::new(
        InstrumentedProvider::new().with_secure_hash_delay(Duration::from_millis(3)),
    );
    let lock = ExclusiveResource::new("shared-secure-hash");
    let config = SignerConfig::default();

    let first = Pipeline::signer_with_lock(&config, provider.clone(), lock.clone()).unwrap();
    let second = Pipeline::signer_with_lock(&config, provider.clone(), lock.clone()).unwrap();

    let (a, b) = tokio::join!(first.run(0i64..6), second.run(FIBONACCI_INPUT));
    assert_eq!(a.unwrap().single_output().unwrap(), GOLDEN_0_TO_5);
    assert_eq!(b.unwrap().single_output().unwrap(), GOLDEN_FIBONACCI);

    assert_eq!(provider.peak_secure_hash_concurrency(), 1);
    assert_eq!(lock.acquisitions(), 13);
}

#[tokio::test]
async fn test_locked_provider_never_overheats() {
    let provider = Arc::new(
        SignerProvider::new()
            .with_chk_delay(Duration::from_millis(10))
            .with_secure_hash_delay(Duration::from_millis(2))
            .with_overheat_penalty(Duration::from_millis(50)),
    );
    let dyn_provider: Arc<dyn HashProvider> = provider.clone();
    let pipeline = Pipeline::signer(&SignerConfig::default(), dyn_provider).unwrap();

    let outcome = pipeline.run(0i64..6).await.unwrap();
    assert_eq!(outcome.single_output().unwrap(), GOLDEN_0_TO_5);

    let stats = provider.stats();
    assert_eq!(stats.secure_hash_calls, 6);
    assert_eq!(stats.overheats, 0);
    // 6 plain + 6 secured + 36 salted
    assert_eq!(stats.chk_calls, 48);
}

#[tokio::test]
async fn test_worker_limit_caps_in_flight_calls() {
    let bounded = Arc::new(InstrumentedProvider::new().with_chk_delay(Duration::from_millis(5)));
    let pipeline = PipelineBuilder::new()
        .add_stage(Box::new(
            SingleHashStage::new(bounded.clone()).with_max_workers(Some(1)),
        ))
        .build()
        .unwrap();
    pipeline.run(0i64..8).await.unwrap();
    // one worker at a time, each with a plain and a secured checksum
    assert!(bounded.peak_chk_concurrency() <= 2);

    let unbounded = Arc::new(InstrumentedProvider::new().with_chk_delay(Duration::from_millis(5)));
    let pipeline = PipelineBuilder::new()
        .add_stage(Box::new(SingleHashStage::new(unbounded.clone())))
        .build()
        .unwrap();
    pipeline.run(0i64..8).await.unwrap();
    assert!(unbounded.peak_chk_concurrency() > 2);
}

#[tokio::test]
async fn test_multi_hash_lanes_run_concurrently() {
    let provider = Arc::new(InstrumentedProvider::new().with_chk_delay(Duration::from_millis(5)));
    let pipeline = PipelineBuilder::new()
        .add_stage(Box::new(
            MultiHashStage::new(provider.clone()).with_max_workers(Some(1)),
        ))
        .build()
        .unwrap();

    let outcome = pipeline.run(["a", "b"]).await.unwrap();
    assert_eq!(outcome.outputs.len(), 2);
    assert_eq!(provider.peak_chk_concurrency(), 6);
}
