use crate::model::{Job, Run};
use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;

/// Lines kept from the tail of a job log.
pub const MAX_LOG_LINES: usize = 20_000;

#[derive(Deserialize)]
struct WorkflowRunsResponse {
    #[serde(default)]
    workflow_runs: Vec<Run>,
}

pub fn parse_runs(json: &str) -> Result<Vec<Run>> {
    let resp: WorkflowRunsResponse =
        serde_json::from_str(json).wrap_err("failed to parse workflow runs")?;
    Ok(resp.workflow_runs)
}

#[derive(Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<Job>,
}

pub fn parse_jobs(json: &str) -> Result<Vec<Job>> {
    let resp: JobsResponse = serde_json::from_str(json).wrap_err("failed to parse jobs")?;
    Ok(resp.jobs)
}

/// Normalizes line endings and keeps the last `max_lines` lines.
/// A notice line is prepended when lines were dropped.
pub fn process_log_output(raw: &str, max_lines: usize) -> String {
    let text = raw.replace("\r\n", "\n");
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        return lines.join("\n");
    }
    let dropped = lines.len() - max_lines;
    let mut out = format!("[... {dropped} earlier lines truncated ...]\n");
    out.push_str(&lines[dropped..].join("\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Conclusion, RunStatus};
    use pretty_assertions::assert_eq;

    const SINGLE_RUN_JSON: &str = r#"{
        "total_count": 1,
        "workflow_runs": [{
            "id": 123,
            "name": "CI",
            "display_title": "Fix flaky test",
            "head_branch": "main",
            "head_sha": "0123456789abcdef0123",
            "status": "completed",
            "conclusion": "success",
            "workflow_id": 77,
            "path": ".github/workflows/ci.yml",
            "run_number": 42,
            "run_attempt": 2,
            "html_url": "https://github.com/acme/api/actions/runs/123",
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-01-15T10:05:00Z",
            "run_started_at": "2024-01-15T10:00:10Z",
            "repository": {"full_name": "acme/api", "html_url": "https://github.com/acme/api"}
        }]
    }"#;

    fn run_json(status: &str, conclusion: &str) -> String {
        format!(
            r#"{{"workflow_runs":[{{"id":1,"name":"n","status":"{status}","conclusion":{conclusion},
            "created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z",
            "run_started_at":null,"repository":{{"full_name":"o/r"}}}}]}}"#
        )
    }

    #[test]
    fn parse_single_completed_run() {
        let runs = parse_runs(SINGLE_RUN_JSON).unwrap();
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.id, 123);
        assert_eq!(run.name, "CI");
        assert_eq!(run.display_title, "Fix flaky test");
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.conclusion, Some(Conclusion::Success));
        assert_eq!(run.workflow_file(), "ci.yml");
        assert_eq!(run.run_number, 42);
        assert_eq!(run.run_attempt, 2);
        assert_eq!(run.repo(), "acme/api");
    }

    #[test]
    fn parse_in_progress_with_null_conclusion() {
        let runs = parse_runs(&run_json("in_progress", "null")).unwrap();
        assert_eq!(runs[0].status, RunStatus::InProgress);
        assert_eq!(runs[0].conclusion, None);
        assert_eq!(runs[0].run_attempt, 1);
    }

    #[test]
    fn parse_unknown_status_and_conclusion() {
        let runs = parse_runs(&run_json("something_new", r#""brand_new""#)).unwrap();
        assert_eq!(runs[0].status, RunStatus::Unknown);
        assert_eq!(runs[0].conclusion, Some(Conclusion::Unknown));
    }

    #[test]
    fn parse_all_status_strings() {
        let statuses = [
            ("completed", RunStatus::Completed),
            ("in_progress", RunStatus::InProgress),
            ("queued", RunStatus::Queued),
            ("requested", RunStatus::Requested),
            ("waiting", RunStatus::Waiting),
            ("pending", RunStatus::Pending),
        ];
        for (s, expected) in statuses {
            let runs = parse_runs(&run_json(s, "null")).unwrap();
            assert_eq!(runs[0].status, expected, "status string: {s}");
        }
    }

    #[test]
    fn parse_empty_response() {
        assert!(parse_runs(r#"{"total_count":0,"workflow_runs":[]}"#).unwrap().is_empty());
        assert!(parse_runs("{}").unwrap().is_empty());
    }

    #[test]
    fn parse_invalid_json_error() {
        assert!(parse_runs("not json").is_err());
        assert!(parse_runs(r#"{"workflow_runs":[{"id":1}]}"#).is_err());
    }

    #[test]
    fn parse_jobs_with_steps() {
        let json = r#"{"total_count":1,"jobs":[{
            "id": 555,
            "run_id": 123,
            "name": "build",
            "status": "in_progress",
            "conclusion": null,
            "started_at": "2024-01-15T10:00:00Z",
            "completed_at": null,
            "html_url": "https://github.com/acme/api/actions/runs/123/job/555",
            "steps": [
                {"name":"Checkout","status":"completed","conclusion":"success","number":1,
                 "started_at":"2024-01-15T10:00:00Z","completed_at":"2024-01-15T10:00:03Z"},
                {"name":"Test","status":"in_progress","conclusion":null,"number":2,
                 "started_at":"2024-01-15T10:00:03Z","completed_at":null}
            ]
        }]}"#;
        let jobs = parse_jobs(json).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, 555);
        assert_eq!(jobs[0].run_id, 123);
        assert_eq!(jobs[0].steps.len(), 2);
        assert_eq!(jobs[0].steps[0].conclusion, Some(Conclusion::Success));
        assert_eq!(jobs[0].step_progress(), (1, 2));
    }

    #[test]
    fn parse_jobs_without_steps() {
        let json = r#"{"jobs":[{"id":1,"name":"lint","status":"queued","conclusion":null,
            "started_at":null,"completed_at":null}]}"#;
        let jobs = parse_jobs(json).unwrap();
        assert!(jobs[0].steps.is_empty());
        assert_eq!(jobs[0].started_at, None);
    }

    // --- process_log_output ---

    #[test]
    fn log_crlf_normalized() {
        assert_eq!(process_log_output("a\r\nb\r\n", 10), "a\nb");
    }

    #[test]
    fn log_under_limit_untouched() {
        assert_eq!(process_log_output("one\ntwo\nthree", 3), "one\ntwo\nthree");
    }

    #[test]
    fn log_over_limit_keeps_tail() {
        let out = process_log_output("1\n2\n3\n4\n5", 2);
        assert_eq!(out, "[... 3 earlier lines truncated ...]\n4\n5");
    }

    #[test]
    fn log_empty() {
        assert_eq!(process_log_output("", 10), "");
    }
}
