//! Batch orchestration: grouping, isolation, idempotency and reprocessing.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use ragprep_core::{DocumentStatus, PipelineError};

use crate::helpers::{lesson_text, orchestrator, CountingFactory, RecordingExtractor, Workspace};

#[tokio::test]
async fn seven_documents_run_in_groups_of_three() {
    let ws = Workspace::new();
    for i in 0..7 {
        ws.write(&format!("doc{i}.txt"), &lesson_text(2));
    }
    let mut config = ws.config(3);
    config.embedding.enabled = false;

    let extractor = Arc::new(RecordingExtractor::with_delay(Duration::from_millis(60)));
    let orch = orchestrator(&config, Arc::new(CountingFactory::default()), extractor.clone());

    let report = orch.run_batch().await.unwrap();
    assert_eq!(report.total, 7);
    assert_eq!(report.processed, 7);
    assert_eq!(extractor.peak.load(Ordering::SeqCst), 3);

    let mut visits = extractor.visits();
    visits.sort_by(|a, b| a.filename.cmp(&b.filename));
    let groups: Vec<&[crate::helpers::Visit]> = visits.chunks(3).collect();
    assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![3, 3, 1]);

    for pair in groups.windows(2) {
        let previous_end = pair[0].iter().map(|v| v.end).max().unwrap();
        for next in pair[1] {
            assert!(
                next.start >= previous_end,
                "{} started before the previous group settled",
                next.filename
            );
        }
    }
    // Documents inside one group overlap.
    let first = groups[0];
    let latest_start = first.iter().map(|v| v.start).max().unwrap();
    let earliest_end = first.iter().map(|v| v.end).min().unwrap();
    assert!(latest_start < earliest_end);
}

#[tokio::test]
async fn failed_document_does_not_stop_siblings() {
    let ws = Workspace::new();
    ws.write("a.txt", &lesson_text(2));
    ws.write("broken.txt", &lesson_text(2));
    ws.write("c.txt", &lesson_text(2));
    ws.write("d.txt", &lesson_text(2));
    let mut config = ws.config(2);
    config.embedding.enabled = false;

    let orch = orchestrator(
        &config,
        Arc::new(CountingFactory::default()),
        Arc::new(RecordingExtractor::failing(&["broken.txt"])),
    );
    let report = orch.run_batch().await.unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.processed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].filename, "broken.txt");
    assert!(report.errors[0].message.contains("corrupt xref table"));
    assert!(!ws.output.join("broken.json").exists());
    assert!(ws.output.join("d.json").exists());

    let failed: Vec<_> = report
        .documents
        .iter()
        .filter(|d| d.status == DocumentStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
}

#[tokio::test]
async fn second_run_skips_existing_outputs() {
    let ws = Workspace::new();
    ws.write("one.txt", &lesson_text(2));
    ws.write("nested/two.md", &lesson_text(3));
    ws.write("ignored.png", "not a document");
    let mut config = ws.config(3);
    config.embedding.enabled = false;

    let factory = Arc::new(CountingFactory::default());
    let orch = orchestrator(&config, factory.clone(), Arc::new(RecordingExtractor::default()));

    let first = orch.run_batch().await.unwrap();
    assert_eq!(first.processed, 2);
    assert_eq!(first.skipped, 0);

    let second = orch.run_batch().await.unwrap();
    assert_eq!(second.total, 2);
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 2);
    assert!(second.documents.is_empty());
}

#[tokio::test]
async fn reprocess_targets_only_named_files() {
    let ws = Workspace::new();
    ws.write("one.txt", &lesson_text(2));
    ws.write("two.txt", &lesson_text(2));
    let mut config = ws.config(3);
    config.embedding.enabled = false;

    let extractor = Arc::new(RecordingExtractor::default());
    let orch = orchestrator(&config, Arc::new(CountingFactory::default()), extractor.clone());
    orch.run_batch().await.unwrap();
    assert_eq!(extractor.visits().len(), 2);

    let report = orch
        .reprocess(&["two".to_string(), "missing.pdf".to_string()])
        .await
        .unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].filename, "missing.pdf");

    let visits = extractor.visits();
    assert_eq!(visits.len(), 3);
    assert_eq!(visits[2].filename, "two.txt");
}

#[tokio::test]
async fn missing_root_aborts_the_run() {
    let ws = Workspace::new();
    let mut config = ws.config(3);
    config.batch.input_dirs.push(ws.input.join("does-not-exist"));

    let orch = orchestrator(
        &config,
        Arc::new(CountingFactory::default()),
        Arc::new(RecordingExtractor::default()),
    );
    let err = orch.run_batch().await.unwrap_err();
    assert!(matches!(err, PipelineError::SourceRoot { .. }));
    assert!(err.is_batch_fatal());
}

#[tokio::test]
async fn empty_root_writes_empty_report() {
    let ws = Workspace::new();
    let orch = orchestrator(
        &ws.config(3),
        Arc::new(CountingFactory::default()),
        Arc::new(RecordingExtractor::default()),
    );
    let report = orch.run_batch().await.unwrap();
    assert_eq!(report.total, 0);
    assert!(orch.report_path().exists());
}

#[tokio::test]
async fn inputs_sharing_an_output_name_are_all_reported() {
    let ws = Workspace::new();
    ws.write("a.md", &lesson_text(2));
    ws.write("a.txt", &lesson_text(2));
    ws.write("b.txt", &lesson_text(2));
    let mut config = ws.config(3);
    config.embedding.enabled = false;

    let orch = orchestrator(
        &config,
        Arc::new(CountingFactory::default()),
        Arc::new(RecordingExtractor::default()),
    );
    let report = orch.run_batch().await.unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].filename, "a.txt");
    assert!(report.errors[0].message.contains("output name clash"));
    assert!(report.errors[0].message.contains("a.md"));
    assert!(ws.output.join("a.json").exists());
}

#[tokio::test]
async fn input_cannot_take_the_report_name() {
    let ws = Workspace::new();
    ws.write("processing_report.txt", &lesson_text(2));
    ws.write("lesson.txt", &lesson_text(2));
    let mut config = ws.config(2);
    config.embedding.enabled = false;

    let orch = orchestrator(
        &config,
        Arc::new(CountingFactory::default()),
        Arc::new(RecordingExtractor::default()),
    );
    let report = orch.run_batch().await.unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].filename, "processing_report.txt");

    let persisted: ragprep_core::RunReport =
        serde_json::from_slice(&std::fs::read(orch.report_path()).unwrap()).unwrap();
    assert_eq!(persisted.run_id, report.run_id);
    assert_eq!(persisted.total, 2);
}
