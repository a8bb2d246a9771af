//! Embedding behaviour seen through a full batch run.

use std::sync::Arc;

use ragprep_core::{DocumentOutput, DocumentStatus};

use crate::helpers::{lesson_text, orchestrator, CountingFactory, RecordingExtractor, Workspace};

fn read_output(path: &std::path::Path) -> DocumentOutput {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn failed_chunk_embedding_keeps_the_document() {
    let ws = Workspace::new();
    ws.write("lesson.txt", &lesson_text(5));
    let config = ws.config(1);

    let orch = orchestrator(
        &config,
        Arc::new(CountingFactory::failing_call(2)),
        Arc::new(RecordingExtractor::default()),
    );
    let report = orch.run_batch().await.unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.documents[0].status, DocumentStatus::Succeeded);
    assert_eq!(report.chunks.embedded, 4);
    assert_eq!(report.chunks.embedding_failures, 1);

    let output = read_output(&ws.output.join("lesson.json"));
    assert_eq!(output.total_chunks, 5);
    assert!(output.chunks[1].embedding.is_none());
    for chunk in output.chunks.iter().filter(|c| c.index != 1) {
        assert_eq!(chunk.embedding.as_ref().map(Vec::len), Some(512));
    }
}

#[tokio::test]
async fn model_loads_once_per_processor() {
    let ws = Workspace::new();
    for i in 0..5 {
        ws.write(&format!("doc{i}.txt"), &lesson_text(2));
    }
    let factory = Arc::new(CountingFactory::default());
    let orch = orchestrator(&ws.config(3), factory.clone(), Arc::new(RecordingExtractor::default()));

    assert_eq!(factory.loads(), 0);
    assert!(!orch.processor().embedding_generator().unwrap().is_loaded());

    let report = orch.run_batch().await.unwrap();
    assert_eq!(report.processed, 5);
    assert_eq!(factory.loads(), 1);
    assert_eq!(report.chunks.embedded, 10);
}

#[tokio::test]
async fn unknown_model_falls_back_to_default() {
    let ws = Workspace::new();
    ws.write("lesson.txt", &lesson_text(2));
    let mut config = ws.config(1);
    config.embedding.model_id = "text-embedding-unknown".into();

    let orch = orchestrator(
        &config,
        Arc::new(CountingFactory::default()),
        Arc::new(RecordingExtractor::default()),
    );
    assert_eq!(orch.processor().profile().model_id, "bge-small-zh-v1.5");

    let report = orch.run_batch().await.unwrap();
    assert_eq!(report.model.model_id, "bge-small-zh-v1.5");
    assert_eq!(report.model.dimensions, 512);
    assert!(report.model.embeddings_enabled);
}

#[tokio::test]
async fn embeddings_disabled_leaves_chunks_bare() {
    let ws = Workspace::new();
    ws.write("lesson.txt", &lesson_text(3));
    let mut config = ws.config(1);
    config.embedding.enabled = false;

    let factory = Arc::new(CountingFactory::default());
    let orch = orchestrator(&config, factory.clone(), Arc::new(RecordingExtractor::default()));
    let report = orch.run_batch().await.unwrap();

    assert_eq!(factory.loads(), 0);
    assert!(!report.model.embeddings_enabled);
    let output = read_output(&ws.output.join("lesson.json"));
    assert!(output.chunks.iter().all(|c| c.embedding.is_none()));
}
