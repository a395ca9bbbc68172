//! Integration tests for the submission -> grading -> status pipeline.
//!
//! These drive the real services over a throwaway class tree, with stub
//! bash scripts standing in for the external grading command. No running
//! server or network access is required.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::sleep;

use exam_prep_server::models::job::{JobSnapshot, JobStatus};
use exam_prep_server::models::submission::SubmitAnswersRequest;
use exam_prep_server::services::grader::GradingRunner;
use exam_prep_server::services::registry::JobRegistry;
use exam_prep_server::services::repository::ClassRepository;
use exam_prep_server::services::submissions::{SubmissionError, SubmissionService};

const TIMESTAMP: &str = "2026-01-02_03-04-05-000Z";

/// A grading script that plays by the contract: writes the expected
/// results artifact into the class archive and exits 0.
const GRADE_OK: &str = r#"#!/bin/bash
set -e
mkdir -p "$1/Archive"
echo "<html><body>Graded job $3</body></html>" > "$1/Archive/${QUIZ_NAME}_${STUDENT_NAME}_${TIMESTAMP}_results.html"
echo "graded ok"
"#;

const GRADE_BAD_FORMAT: &str = r#"#!/bin/bash
echo "bad format" >&2
exit 1
"#;

const GRADE_NO_ARTIFACT: &str = r#"#!/bin/bash
exit 0
"#;

const GRADE_SLOW: &str = r#"#!/bin/bash
sleep 5
exit 0
"#;

/// Records every argument and environment variable the contract promises,
/// then writes the artifact.
const GRADE_CAPTURE: &str = r#"#!/bin/bash
set -e
{
  echo "class=$1"
  echo "answers=$2"
  echo "job=$3"
  echo "root=$PROJECT_ROOT"
  echo "quiz=$QUIZ_NAME"
  echo "student=$STUDENT_NAME"
  echo "ts=$TIMESTAMP"
} > capture.txt
mkdir -p "$1/Archive"
echo "<html></html>" > "$1/Archive/${QUIZ_NAME}_${STUDENT_NAME}_${TIMESTAMP}_results.html"
"#;

struct TestEnv {
    root: TempDir,
    repo: Arc<ClassRepository>,
    registry: Arc<JobRegistry>,
    submissions: Arc<SubmissionService>,
}

impl TestEnv {
    fn with_script(script: &str) -> Self {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("Biology/Quiz")).unwrap();
        let script_path = root.path().join("grade-quiz.sh");
        std::fs::write(&script_path, script).unwrap();

        let repo = Arc::new(ClassRepository::new(root.path()));
        let registry = Arc::new(JobRegistry::new(root.path().join("grading-jobs")).unwrap());
        let grader = Arc::new(GradingRunner::new(
            Arc::clone(&registry),
            root.path(),
            &script_path,
        ));
        let submissions = Arc::new(SubmissionService::new(
            Arc::clone(&repo),
            Arc::clone(&registry),
            grader,
        ));

        Self {
            root,
            repo,
            registry,
            submissions,
        }
    }
}

fn request(
    name: &str,
    answers: &str,
    quiz_name: Option<&str>,
    timestamp: Option<&str>,
) -> SubmitAnswersRequest {
    SubmitAnswersRequest {
        name: Some(name.to_string()),
        date: None,
        timestamp: timestamp.map(String::from),
        answers: Some(answers.to_string()),
        quiz_name: quiz_name.map(String::from),
    }
}

async fn wait_for_terminal(registry: &JobRegistry, job_id: &str) -> JobSnapshot {
    for _ in 0..200 {
        if let Some(snapshot) = registry.lookup(job_id).await {
            if snapshot.status != JobStatus::Processing {
                return snapshot;
            }
        }
        sleep(Duration::from_millis(25)).await;
    }
    panic!("job {job_id} did not reach a terminal state");
}

#[tokio::test]
async fn submission_grades_to_completion() {
    let env = TestEnv::with_script(GRADE_OK);
    let answers = "1. B\n2. C\n3. mitochondria\n";

    let response = env
        .submissions
        .submit(
            "Biology",
            request("Ada Lovelace", answers, Some("Pop Quiz 1"), Some(TIMESTAMP)),
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(
        response.filename,
        format!("Pop_Quiz_1_Ada_Lovelace_{TIMESTAMP}.txt")
    );
    assert_eq!(
        response.path,
        format!("/api/answers/Biology/{}", response.filename)
    );
    assert_eq!(response.job_id.len(), 32);
    assert_eq!(
        response.status_url,
        format!("/api/grading-status/{}", response.job_id)
    );

    let snapshot = wait_for_terminal(&env.registry, &response.job_id).await;
    assert_eq!(snapshot.status, JobStatus::Complete);
    assert_eq!(
        snapshot.results_url.as_deref(),
        Some(format!("/results/Biology/Pop_Quiz_1_Ada_Lovelace_{TIMESTAMP}_results.html").as_str())
    );
    assert_eq!(snapshot.error, None);

    // The artifact the results URL points at is really on disk.
    let artifact = env
        .root
        .path()
        .join("Biology/Archive")
        .join(format!("Pop_Quiz_1_Ada_Lovelace_{TIMESTAMP}_results.html"));
    assert!(artifact.exists());

    // Round-trip: the stored answer file is byte-identical.
    let stored = env
        .repo
        .read_answer("Biology", &response.filename)
        .await
        .unwrap();
    assert_eq!(stored, answers);
}

#[tokio::test]
async fn job_reports_processing_before_grading_finishes() {
    let env = TestEnv::with_script(GRADE_SLOW);

    let response = env
        .submissions
        .submit("Biology", request("Ada", "answers", None, None))
        .await
        .unwrap();

    let snapshot = env.registry.lookup(&response.job_id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Processing);
    assert_eq!(snapshot.results_url, None);
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn failing_script_marks_job_error_with_stderr() {
    let env = TestEnv::with_script(GRADE_BAD_FORMAT);

    let response = env
        .submissions
        .submit("Biology", request("Ada", "answers", None, Some(TIMESTAMP)))
        .await
        .unwrap();

    let snapshot = wait_for_terminal(&env.registry, &response.job_id).await;
    assert_eq!(snapshot.status, JobStatus::Error);
    assert_eq!(snapshot.error.as_deref(), Some("bad format"));
    assert_eq!(snapshot.results_url, None);
}

#[tokio::test]
async fn exit_zero_without_results_file_marks_job_error() {
    let env = TestEnv::with_script(GRADE_NO_ARTIFACT);

    let response = env
        .submissions
        .submit("Biology", request("Ada", "answers", None, Some(TIMESTAMP)))
        .await
        .unwrap();

    let snapshot = wait_for_terminal(&env.registry, &response.job_id).await;
    assert_eq!(snapshot.status, JobStatus::Error);
    assert!(snapshot.error.unwrap().contains("no results file"));
}

#[tokio::test]
async fn grading_script_receives_contract_args_and_env() {
    let env = TestEnv::with_script(GRADE_CAPTURE);

    let response = env
        .submissions
        .submit(
            "Biology",
            request("Ada Lovelace", "answers", Some("Pop Quiz 1"), Some(TIMESTAMP)),
        )
        .await
        .unwrap();

    let snapshot = wait_for_terminal(&env.registry, &response.job_id).await;
    assert_eq!(snapshot.status, JobStatus::Complete);

    let capture = std::fs::read_to_string(env.root.path().join("capture.txt")).unwrap();
    let expected_answers_path = env
        .root
        .path()
        .join("Biology/Answers")
        .join(&response.filename);
    assert!(capture.contains("class=Biology\n"));
    assert!(capture.contains(&format!("answers={}\n", expected_answers_path.display())));
    assert!(capture.contains(&format!("job={}\n", response.job_id)));
    assert!(capture.contains(&format!("root={}\n", env.root.path().display())));
    assert!(capture.contains("quiz=Pop_Quiz_1\n"));
    assert!(capture.contains("student=Ada_Lovelace\n"));
    assert!(capture.contains(&format!("ts={TIMESTAMP}\n")));
}

#[tokio::test]
async fn missing_required_fields_write_nothing() {
    let env = TestEnv::with_script(GRADE_OK);

    let missing_name = SubmitAnswersRequest {
        name: None,
        date: None,
        timestamp: None,
        answers: Some("answers".to_string()),
        quiz_name: None,
    };
    let missing_answers = SubmitAnswersRequest {
        name: Some("Ada".to_string()),
        date: None,
        timestamp: None,
        answers: None,
        quiz_name: None,
    };

    for bad in [missing_name, missing_answers] {
        let result = env.submissions.submit("Biology", bad).await;
        assert!(matches!(result, Err(SubmissionError::Validation(_))));
    }

    // No answer file, no job, no durable record.
    assert!(!env.root.path().join("Biology/Answers").exists());
    let durable = std::fs::read_dir(env.registry.jobs_dir()).unwrap().count();
    assert_eq!(durable, 0);
}

#[tokio::test]
async fn traversal_class_names_are_rejected() {
    let env = TestEnv::with_script(GRADE_OK);

    let result = env
        .submissions
        .submit("../outside", request("Ada", "answers", None, None))
        .await;
    assert!(matches!(result, Err(SubmissionError::InvalidClass(_))));
}

#[tokio::test]
async fn terminal_status_survives_a_registry_restart() {
    let env = TestEnv::with_script(GRADE_OK);

    let response = env
        .submissions
        .submit("Biology", request("Ada", "answers", None, Some(TIMESTAMP)))
        .await
        .unwrap();
    let snapshot = wait_for_terminal(&env.registry, &response.job_id).await;
    assert_eq!(snapshot.status, JobStatus::Complete);

    // Fresh registry over the same jobs dir: only the durable record exists.
    let restarted = JobRegistry::new(env.registry.jobs_dir()).unwrap();
    let recovered = restarted.lookup(&response.job_id).await.unwrap();
    assert_eq!(recovered.status, JobStatus::Complete);
    assert_eq!(recovered.results_url, snapshot.results_url);
}

#[tokio::test]
async fn concurrent_submissions_track_independently() {
    let env = TestEnv::with_script(GRADE_OK);

    let submissions = futures::future::join_all((0..3).map(|i| {
        let timestamp = format!("2026-01-02_03-04-05-00{i}Z");
        env.submissions.submit(
            "Biology",
            request("Ada Lovelace", "answers", Some("Pop Quiz 1"), Some(&timestamp)),
        )
    }))
    .await;

    for (i, result) in submissions.into_iter().enumerate() {
        let response = result.unwrap();
        let snapshot = wait_for_terminal(&env.registry, &response.job_id).await;
        assert_eq!(snapshot.status, JobStatus::Complete);
        assert_eq!(
            snapshot.results_url.as_deref(),
            Some(
                format!(
                    "/results/Biology/Pop_Quiz_1_Ada_Lovelace_2026-01-02_03-04-05-00{i}Z_results.html"
                )
                .as_str()
            )
        );
    }
}

#[tokio::test]
async fn unknown_job_id_is_not_found() {
    let env = TestEnv::with_script(GRADE_OK);
    assert!(env
        .registry
        .lookup("0123456789abcdef0123456789abcdef")
        .await
        .is_none());
}
