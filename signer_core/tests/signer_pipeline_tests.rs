//! End-to-end tests for the three-stage signer pipeline

use signer_core::error::InternalError;
use signer_core::pipeline::{FnStage, PipelineBuilder, SINGLE_HASH_SEPARATOR, SingleHashStage};
use signer_core::{
    Error, HashProvider, Inbound, Outbound, Pipeline, SignerConfig, SignerProvider, Value,
};
use signer_test_utils::fixtures::{
    FIBONACCI_INPUT, GOLDEN_0_1, GOLDEN_0_TO_5, GOLDEN_FIBONACCI, SINGLE_HASH_OF_0,
};
use signer_test_utils::{DelayedProvider, FailingProvider};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

fn signer_with(provider: Arc<dyn HashProvider>) -> Pipeline {
    Pipeline::signer(&SignerConfig::default(), provider).unwrap()
}

fn signer() -> Pipeline {
    signer_with(Arc::new(SignerProvider::new()))
}

#[tokio::test]
async fn test_default_inputs_match_golden_digest() {
    let outcome = signer().run(0i64..6).await.unwrap();
    assert_eq!(outcome.single_output().unwrap(), GOLDEN_0_TO_5);
}

#[tokio::test]
async fn test_duplicate_inputs_are_kept() {
    let outcome = signer().run(FIBONACCI_INPUT).await.unwrap();
    let digest = outcome.single_output().unwrap();
    assert_eq!(digest, GOLDEN_FIBONACCI);
    assert_eq!(digest.split('_').count(), FIBONACCI_INPUT.len());
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let pipeline = signer();
    let first = pipeline.run(FIBONACCI_INPUT).await.unwrap();
    let second = pipeline.run(FIBONACCI_INPUT).await.unwrap();
    assert_eq!(first.outputs, second.outputs);

    let fresh = signer().run(FIBONACCI_INPUT).await.unwrap();
    assert_eq!(first.outputs, fresh.outputs);
}

#[test]
fn test_multi_thread_runtime_gives_same_digest() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();
    let outcome = runtime.block_on(signer().run(0i64..6)).unwrap();
    assert_eq!(outcome.single_output().unwrap(), GOLDEN_0_TO_5);
}

#[tokio::test]
async fn test_slow_lanes_do_not_change_digest() {
    // Lane 0 and lane 1 of every multi hash finish after the others
    let provider = DelayedProvider::new()
        .with_prefix_delay("0", Duration::from_millis(30))
        .with_prefix_delay("1", Duration::from_millis(15));
    let outcome = signer_with(Arc::new(provider)).run([0i64, 1]).await.unwrap();
    assert_eq!(outcome.single_output().unwrap(), GOLDEN_0_1);
}

#[tokio::test]
async fn test_slow_first_input_does_not_change_digest() {
    let provider = DelayedProvider::new().with_prefix_delay("5", Duration::from_millis(25));
    let outcome = signer_with(Arc::new(provider))
        .run([5i64, 4, 3, 2, 1, 0])
        .await
        .unwrap();
    assert_eq!(outcome.single_output().unwrap(), GOLDEN_0_TO_5);
}

#[tokio::test]
async fn test_single_hash_outputs_have_one_separator() {
    let pipeline = PipelineBuilder::new()
        .add_stage(Box::new(SingleHashStage::new(Arc::new(SignerProvider::new()))))
        .build()
        .unwrap();

    let outcome = pipeline.run(-5i64..15).await.unwrap();
    assert_eq!(outcome.outputs.len(), 20);
    for value in &outcome.outputs {
        let text = value.as_text().unwrap();
        let parts: Vec<&str> = text.split(SINGLE_HASH_SEPARATOR).collect();
        assert_eq!(parts.len(), 2, "{text}");
        for part in parts {
            assert!(!part.is_empty());
            assert!(part.chars().all(|c| c.is_ascii_digit()), "{text}");
        }
    }
    assert!(outcome.outputs.contains(&Value::from(SINGLE_HASH_OF_0)));
}

#[tokio::test]
async fn test_every_stream_closed_exactly_once() {
    let outcome = signer().run(FIBONACCI_INPUT).await.unwrap();
    let names: Vec<&str> = outcome.streams.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["seed", "0:SingleHash", "1:MultiHash", "2:Combine"]);

    let sent: Vec<u64> = outcome.streams.iter().map(|r| r.sent).collect();
    assert_eq!(sent, [7, 7, 7, 1]);
    for report in &outcome.streams {
        assert_eq!(report.closed_count, 1, "{}", report.name);
        assert!(report.check().is_ok());
    }
}

#[tokio::test]
async fn test_secure_hash_failure_aborts_run() {
    let provider = FailingProvider::new().fail_secure_hash_on("3");
    let err = signer_with(Arc::new(provider))
        .run(0i64..6)
        .await
        .unwrap_err();

    match &err {
        Error::Internal(InternalError::StageFailed { position, stage, .. }) => {
            assert_eq!(*position, 0);
            assert_eq!(stage, "SingleHash");
        }
        other => panic!("Expected StageFailed, got {other:?}"),
    }
    assert!(matches!(
        err.root(),
        Error::Internal(InternalError::HashCalculation { .. })
    ));
}

#[tokio::test]
async fn test_checksum_failure_in_multi_hash_names_stage() {
    let provider = FailingProvider::new().fail_chk_on(&format!("3{SINGLE_HASH_OF_0}"));
    let err = signer_with(Arc::new(provider))
        .run([0i64, 1])
        .await
        .unwrap_err();

    match err {
        Error::Internal(InternalError::StageFailed { position, stage, .. }) => {
            assert_eq!(position, 1);
            assert_eq!(stage, "MultiHash");
        }
        other => panic!("Expected StageFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_producer_waits_while_consumer_is_paused() {
    let delivered = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());

    let sent = Arc::clone(&delivered);
    let producer = FnStage::new("Producer", move |input: Inbound, output: Outbound| {
        let sent = Arc::clone(&sent);
        async move {
            drop(input);
            for n in 0..8i64 {
                output.send(Value::Int(n)).await?;
                sent.fetch_add(1, Ordering::SeqCst);
            }
            output.close()
        }
    });

    let opened = Arc::clone(&gate);
    let consumer = FnStage::new("Consumer", move |mut input: Inbound, output: Outbound| {
        let opened = Arc::clone(&opened);
        async move {
            opened.notified().await;
            let mut total = 0i64;
            while let Some(value) = input.recv().await {
                total += value.into_int("Consumer")?;
            }
            output.send(Value::Int(total)).await?;
            output.close()
        }
    });

    let pipeline = PipelineBuilder::new()
        .stream_capacity(2)
        .add_stage(Box::new(producer))
        .add_stage(Box::new(consumer))
        .build()
        .unwrap();
    let run = tokio::spawn(async move { pipeline.execute(None).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        delivered.load(Ordering::SeqCst),
        2,
        "producer must stop once the stream holds its capacity"
    );
    assert!(!run.is_finished());

    gate.notify_one();
    let outcome = run.await.unwrap().unwrap();
    assert_eq!(outcome.outputs, vec![Value::Int((0..8).sum())]);
    assert_eq!(delivered.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn test_run_without_inputs_yields_empty_digest() {
    let outcome = signer().run(Vec::<i64>::new()).await.unwrap();
    assert_eq!(outcome.single_output().unwrap(), "");
    assert_eq!(outcome.streams.last().unwrap().sent, 1);
}

#[test]
fn test_invalid_config_is_rejected_before_running() {
    let config = SignerConfig {
        max_workers: Some(0),
        ..SignerConfig::default()
    };
    let err = Pipeline::signer(&config, Arc::new(SignerProvider::new())).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
