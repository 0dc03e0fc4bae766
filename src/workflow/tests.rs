use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::config::Config;
use crate::model::{Candidate, ImageUpload, InputMode, InputSource, Verdict};
use crate::services::{Collaborators, MockServices, ServiceError, ServiceKind};

const QUERY: &str = "Şehirde deprem oldu";

fn workflow_with(mock: &Arc<MockServices>, config: &Config) -> Workflow {
    Workflow::new(Collaborators::from_shared(mock.clone()), config)
}

fn workflow(mock: &Arc<MockServices>) -> Workflow {
    workflow_with(mock, &Config::default())
}

fn candidate_a() -> Candidate {
    Candidate::new("A", 0.80).with_summary("özet A")
}

fn candidate_b() -> Candidate {
    Candidate::new("B", 0.60).with_summary("özet B")
}

/// Search returns B then A; the analysis service prefers A.
fn scenario_mock() -> Arc<MockServices> {
    Arc::new(
        MockServices::new()
            .with_candidates(vec![candidate_b(), candidate_a()])
            .with_verdict_for("özet A", Verdict::new("A ile uyumlu", 0.91))
            .with_verdict_for(
                "özet B",
                Verdict::new("B ile çelişkili", 0.42).with_discrepancies(["tarih farklı"]),
            ),
    )
}

#[test]
fn test_initial_state() {
    let mock = Arc::new(MockServices::new());
    let workflow = workflow(&mock);
    let snapshot = workflow.snapshot();

    assert_eq!(snapshot.stage, Stage::Input);
    assert_eq!(snapshot.input_mode, InputMode::Text);
    assert!(!snapshot.loading);
    assert!(snapshot.error.is_none());
    assert!(snapshot.candidates.is_none());
    assert!(snapshot.verdict.is_none());
    assert_eq!(snapshot.session_id, workflow.session_id());
}

#[tokio::test]
async fn test_full_scenario() {
    let mock = scenario_mock();
    let workflow = workflow(&mock);

    let searched = workflow
        .submit(InputSource::text(format!("  {QUERY}  ")))
        .await
        .expect("submit should succeed");
    assert_eq!(searched.stage, Stage::Search);
    assert_eq!(searched.draft, QUERY);
    assert_eq!(searched.query.as_ref().map(|q| q.as_str()), Some(QUERY));
    let candidates = searched.candidates.clone().expect("candidates published");
    let titles: Vec<_> = candidates.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B"]);
    assert!(!searched.loading);

    let analyzed = workflow.analyze_all().await.expect("fan-out should succeed");
    assert_eq!(analyzed.stage, Stage::Analysis);
    let verdict = analyzed.verdict.clone().expect("verdict published");
    assert_eq!(verdict.verdict.similarity_score, 0.91);
    assert!(verdict.selected_candidate.is_none());
    assert_eq!(verdict.candidates, candidates);
    assert!(!analyzed.loading);

    let back = workflow.back().expect("back should succeed");
    assert_eq!(back.stage, Stage::Search);
    assert!(back.verdict.is_none());
    assert_eq!(back.candidates.as_ref(), Some(&candidates));

    let compared = workflow
        .compare(candidate_b())
        .await
        .expect("compare should succeed");
    let verdict = compared.verdict.expect("verdict published");
    assert_eq!(verdict.verdict.similarity_score, 0.42);
    assert_eq!(verdict.selected_candidate, Some(candidate_b()));
    assert_eq!(verdict.verdict.discrepancies, vec!["tarih farklı"]);
}

#[tokio::test]
async fn test_repeated_compare_pins_same_candidate() {
    let mock = scenario_mock();
    let workflow = workflow(&mock);
    workflow.submit(InputSource::text(QUERY)).await.unwrap();

    let first = workflow.compare(candidate_b()).await.unwrap();
    // Re-compare straight from the analysis stage.
    let second = workflow.compare(candidate_b()).await.unwrap();

    assert_eq!(second.stage, Stage::Analysis);
    assert_eq!(
        first.verdict.unwrap().selected_candidate,
        second.verdict.unwrap().selected_candidate
    );
    assert_eq!(mock.analysis_calls(), 2);
}

#[tokio::test]
async fn test_blank_text_changes_nothing() {
    let mock = scenario_mock();
    let workflow = workflow(&mock);
    let before = workflow.snapshot();

    let err = workflow.submit(InputSource::text("   ")).await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Extraction(crate::normalizer::ExtractionError::EmptyText)
    ));
    assert_eq!(workflow.snapshot(), before);
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_search_unauthorized_stays_in_input() {
    let mock = Arc::new(MockServices::new().with_search_error(ServiceError::Unauthorized {
        service: ServiceKind::Search,
    }));
    let workflow = workflow(&mock);

    let err = workflow.submit(InputSource::text(QUERY)).await.unwrap_err();
    assert!(err.is_unauthorized());

    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.stage, Stage::Input);
    assert!(snapshot.error.is_some());
    assert!(snapshot.unauthorized);
    assert!(!snapshot.loading);
    assert!(snapshot.candidates.is_none());
}

#[tokio::test]
async fn test_entity_unauthorized_marks_session() {
    let mock = Arc::new(
        MockServices::new()
            .with_entities_error(ServiceError::Unauthorized {
                service: ServiceKind::Ner,
            })
            .with_candidates(vec![candidate_a()]),
    );
    let config = Config {
        entity_refinement: true,
        ..Default::default()
    };
    let workflow = workflow_with(&mock, &config);

    let err = workflow.submit(InputSource::text(QUERY)).await.unwrap_err();
    assert!(err.is_unauthorized());

    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.stage, Stage::Input);
    assert!(snapshot.unauthorized);
    assert!(!snapshot.loading);
    assert_eq!(mock.search_calls(), 0);
}

#[tokio::test]
async fn test_best_verdict_need_not_be_top_ranked() {
    let mock = Arc::new(
        MockServices::new()
            .with_candidates(vec![
                Candidate::new("A", 0.9).with_summary("özet A"),
                Candidate::new("B", 0.6).with_summary("özet B"),
            ])
            .with_verdict_for("özet A", Verdict::new("A zayıf", 0.4))
            .with_verdict_for("özet B", Verdict::new("B güçlü", 0.8)),
    );
    let workflow = workflow(&mock);

    workflow.submit(InputSource::text(QUERY)).await.unwrap();
    let analyzed = workflow.analyze_all().await.unwrap();

    let verdict = analyzed.verdict.expect("verdict published");
    assert_eq!(verdict.verdict.fact_check_summary, "B güçlü");
    assert_eq!(verdict.verdict.similarity_score, 0.8);
    assert!(verdict.selected_candidate.is_none());
    let titles: Vec<_> = verdict.candidates.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B"]);
}

#[tokio::test]
async fn test_failed_fan_out_stays_in_search() {
    let mock = Arc::new(
        MockServices::new()
            .with_candidates(vec![candidate_a(), candidate_b()])
            .with_verdict_for("özet A", Verdict::new("A", 0.9))
            .with_analysis_error_for(
                "özet B",
                ServiceError::Timeout {
                    service: ServiceKind::Analysis,
                    timeout: Duration::from_secs(15),
                },
            ),
    );
    let workflow = workflow(&mock);
    workflow.submit(InputSource::text(QUERY)).await.unwrap();

    let err = workflow.analyze_all().await.unwrap_err();
    assert!(matches!(err, WorkflowError::Analysis(_)));

    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.stage, Stage::Search);
    assert!(snapshot.verdict.is_none());
    assert!(snapshot.candidates.is_some());
    assert!(snapshot.error.is_some());
    assert!(!snapshot.unauthorized);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_failed_compare_from_analysis_keeps_verdict() {
    let mock = scenario_mock();
    let workflow = workflow(&mock);
    workflow.submit(InputSource::text(QUERY)).await.unwrap();
    workflow.analyze_all().await.unwrap();

    let unknown = Candidate::new("C", 0.1).with_summary("özet C");
    workflow.compare(unknown).await.unwrap_err();

    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.stage, Stage::Analysis);
    assert_eq!(
        snapshot.verdict.map(|v| v.verdict.similarity_score),
        Some(0.91)
    );
    assert!(snapshot.error.is_some());
}

#[tokio::test]
async fn test_success_clears_previous_error() {
    let mock = scenario_mock();
    let workflow = workflow(&mock);
    workflow.submit(InputSource::text(QUERY)).await.unwrap();

    workflow
        .compare(Candidate::new("C", 0.1).with_summary("özet C"))
        .await
        .unwrap_err();
    assert!(workflow.snapshot().error.is_some());

    let snapshot = workflow.analyze_all().await.unwrap();
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn test_empty_search_result_blocks_fan_out() {
    let mock = Arc::new(MockServices::new());
    let workflow = workflow(&mock);
    let snapshot = workflow.submit(InputSource::text(QUERY)).await.unwrap();
    assert_eq!(snapshot.candidates.map(|c| c.len()), Some(0));

    let err = workflow.analyze_all().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Analysis(crate::comparator::AnalysisError::NoCandidates)
    ));
    assert_eq!(mock.analysis_calls(), 0);
    assert_eq!(workflow.stage(), Stage::Search);
}

#[tokio::test]
async fn test_invalid_transitions_change_nothing() {
    let mock = scenario_mock();
    let workflow = workflow(&mock);

    let err = workflow.analyze_all().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            from: Stage::Input,
            ..
        }
    ));
    assert!(workflow.compare(candidate_a()).await.is_err());
    assert!(workflow.back().is_err());
    assert!(workflow.back_to_input().is_err());
    assert_eq!(mock.total_calls(), 0);

    workflow.submit(InputSource::text(QUERY)).await.unwrap();
    let before = workflow.snapshot();
    assert!(workflow.submit(InputSource::text("başka")).await.is_err());
    assert!(workflow.back().is_err());
    assert!(workflow.set_input_mode(InputMode::Image).is_err());
    assert_eq!(workflow.snapshot(), before);
}

#[tokio::test]
async fn test_back_to_input_restores_draft() {
    let mock = scenario_mock();
    let workflow = workflow(&mock);
    workflow.submit(InputSource::text(QUERY)).await.unwrap();

    let snapshot = workflow.back_to_input().unwrap();
    assert_eq!(snapshot.stage, Stage::Input);
    assert_eq!(snapshot.draft, QUERY);
    assert!(snapshot.query.is_none());
    assert!(snapshot.candidates.is_none());
    assert!(snapshot.verdict.is_none());
}

#[tokio::test]
async fn test_image_submit_flips_to_text_mode() {
    let mock = Arc::new(
        MockServices::new()
            .with_ocr_text(format!("{QUERY}\n"))
            .with_candidates(vec![candidate_a()]),
    );
    let workflow = workflow(&mock);

    let snapshot = workflow.set_input_mode(InputMode::Image).unwrap();
    assert_eq!(snapshot.input_mode, InputMode::Image);

    let image = ImageUpload::new("manset.png", vec![0x89, 0x50, 0x4E, 0x47]);
    let snapshot = workflow
        .submit(InputSource::Image(image))
        .await
        .expect("image submit should succeed");

    assert_eq!(snapshot.input_mode, InputMode::Text);
    assert_eq!(snapshot.draft, QUERY);
    assert_eq!(mock.search_queries(), vec![QUERY.to_string()]);
}

#[tokio::test]
async fn test_rejected_image_stays_in_image_mode() {
    let mock = Arc::new(MockServices::new());
    let workflow = workflow(&mock);
    workflow.set_input_mode(InputMode::Image).unwrap();

    let err = workflow
        .submit(InputSource::Image(ImageUpload::new("haber.pdf", vec![1])))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Extraction(_)));

    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.stage, Stage::Input);
    assert_eq!(snapshot.input_mode, InputMode::Image);
    assert!(snapshot.error.is_some());
    assert_eq!(mock.ocr_calls(), 0);
}

#[tokio::test]
async fn test_entity_refinement_enabled_by_config() {
    let mock = Arc::new(
        MockServices::new()
            .with_entities(["İzmir", "AFAD"])
            .with_candidates(vec![candidate_a()]),
    );
    let config = Config {
        entity_refinement: true,
        ..Default::default()
    };
    let workflow = workflow_with(&mock, &config);

    let snapshot = workflow
        .submit(InputSource::text("İzmir'de deprem, AFAD açıklama yaptı"))
        .await
        .unwrap();

    assert_eq!(mock.search_queries(), vec!["İzmir AFAD".to_string()]);
    // The query itself stays what the user submitted.
    assert_eq!(snapshot.draft, "İzmir'de deprem, AFAD açıklama yaptı");
}

#[tokio::test]
async fn test_loading_visible_while_in_flight() {
    let mock = Arc::new(
        MockServices::new()
            .with_candidates(vec![candidate_a()])
            .with_search_delay(Duration::from_millis(50)),
    );
    let workflow = workflow(&mock);

    let probe = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        workflow.snapshot().loading
    };
    let (result, loading_mid_flight) =
        tokio::join!(workflow.submit(InputSource::text(QUERY)), probe);

    assert!(result.is_ok());
    assert!(loading_mid_flight);
    assert!(!workflow.snapshot().loading);
}

#[tokio::test]
async fn test_dropped_request_clears_loading() {
    let slow_mock = Arc::new(
        MockServices::new()
            .with_candidates(vec![candidate_a()])
            .with_default_verdict(Verdict::new("geç", 0.5))
            .with_analysis_delay(Duration::from_millis(200)),
    );
    let slow = workflow_with(&slow_mock, &Config::default());
    slow.submit(InputSource::text(QUERY)).await.unwrap();

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), slow.analyze_all()).await;
    assert!(timed_out.is_err());

    let snapshot = slow.snapshot();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.stage, Stage::Search);
    assert!(snapshot.verdict.is_none());
}

#[tokio::test]
async fn test_newer_submit_supersedes_older() {
    let mock = Arc::new(
        MockServices::new()
            .with_scripted_search(
                Duration::from_millis(80),
                Ok(vec![Candidate::new("eski", 0.9)]),
            )
            .with_scripted_search(Duration::ZERO, Ok(vec![Candidate::new("yeni", 0.4)])),
    );
    let workflow = workflow(&mock);

    let newer = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        workflow.submit(InputSource::text("ikinci")).await
    };
    let (older, newer) = tokio::join!(workflow.submit(InputSource::text("ilk")), newer);

    assert!(older.unwrap_err().is_superseded());
    assert!(newer.is_ok());

    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.draft, "ikinci");
    let titles: Vec<_> = snapshot
        .candidates
        .expect("newer candidates published")
        .iter()
        .map(|c| c.title.clone())
        .collect();
    assert_eq!(titles, vec!["yeni"]);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_back_drops_in_flight_compare() {
    let mock = Arc::new(
        MockServices::new()
            .with_candidates(vec![candidate_a(), candidate_b()])
            .with_verdict_for("özet A", Verdict::new("A", 0.91))
            .with_verdict_for("özet B", Verdict::new("B", 0.42))
            .with_analysis_delay_for("özet B", Duration::from_millis(60)),
    );
    let workflow = workflow(&mock);
    workflow.submit(InputSource::text(QUERY)).await.unwrap();
    workflow.compare(candidate_a()).await.unwrap();

    let navigate = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        workflow.back()
    };
    let (late, back) = tokio::join!(workflow.compare(candidate_b()), navigate);

    assert!(back.is_ok());
    assert!(late.unwrap_err().is_superseded());

    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.stage, Stage::Search);
    assert!(snapshot.verdict.is_none());
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_snapshot_serializes_for_render() {
    let mock = scenario_mock();
    let workflow = workflow(&mock);
    workflow.submit(InputSource::text(QUERY)).await.unwrap();
    let snapshot = workflow.analyze_all().await.unwrap();

    let value = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(value["stage"], "analysis");
    assert_eq!(value["input_mode"], "text");
    assert_eq!(value["verdict"]["similarity_score"], 0.91);
    assert_eq!(value["verdict"]["candidates"][0]["title"], "A");
    assert_eq!(value["loading"], false);
}

#[test]
fn test_stage_display() {
    assert_eq!(Stage::Analysis.to_string(), "analysis");
    let err = WorkflowError::InvalidTransition {
        from: Stage::Input,
        action: "compare",
    };
    assert_eq!(err.to_string(), "cannot compare from the input stage");
    assert!(!err.is_unauthorized());
}
