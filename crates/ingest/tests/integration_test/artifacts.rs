//! Shape of the persisted per-document artifact and run report.

use std::sync::Arc;

use ragprep_core::RunReport;
use serde_json::Value;

use crate::helpers::{lesson_text, orchestrator, CountingFactory, RecordingExtractor, Workspace};

#[tokio::test]
async fn artifact_uses_camel_case_contract() {
    let ws = Workspace::new();
    let text = format!("人民教育出版社\n主编：张三\n\n{}\n\n阅读(123)", lesson_text(3));
    ws.write("unit1.txt", &text);

    let orch = orchestrator(
        &ws.config(1),
        Arc::new(CountingFactory::default()),
        Arc::new(RecordingExtractor::default()),
    );
    orch.run_batch().await.unwrap();

    let raw = std::fs::read(ws.output.join("unit1.json")).unwrap();
    let json: Value = serde_json::from_slice(&raw).unwrap();

    assert_eq!(json["filename"], "unit1.txt");
    assert_eq!(json["totalPages"], 1);
    assert_eq!(json["totalChunks"], 3);
    assert_eq!(json["metadata"]["needsReview"], false);
    assert_eq!(json["metadata"]["fileSize"], text.len() as u64);
    assert_eq!(json["processingStats"]["embeddingModel"], "bge-small-zh-v1.5");
    assert!(json["processingStats"]["processingDate"].is_string());

    let cleaned = json["metadata"]["cleanedText"].as_str().unwrap();
    assert!(!cleaned.contains("出版社"));
    assert!(!cleaned.contains("主编"));

    let chunks = json["chunks"].as_array().unwrap();
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk["index"], i);
        assert_eq!(chunk["sourceId"], "unit1.txt");
        assert!(chunk["provenance"]["qualityScore"].as_u64().unwrap() >= 1);
        assert!(!chunk["content"].as_str().unwrap().contains("阅读(123)"));
    }
}

#[tokio::test]
async fn run_report_is_persisted() {
    let ws = Workspace::new();
    ws.write("a.txt", &lesson_text(2));
    ws.write("b.txt", "");

    let mut config = ws.config(2);
    config.embedding.enabled = false;
    let orch = orchestrator(
        &config,
        Arc::new(CountingFactory::default()),
        Arc::new(RecordingExtractor::default()),
    );
    let report = orch.run_batch().await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.needs_review, 1);

    let persisted: RunReport =
        serde_json::from_slice(&std::fs::read(orch.report_path()).unwrap()).unwrap();
    assert_eq!(persisted.run_id, report.run_id);
    assert_eq!(persisted.processed, 2);
    assert_eq!(persisted.needs_review, 1);
    assert!(persisted.end >= persisted.start);
    assert_eq!(persisted.documents.len(), 2);
}
