#![allow(dead_code)]

use gh_ci::gh::parser;
use gh_ci::model::{Job, Run};
use serde_json::{json, Value};

pub const REPO: &str = "octo/app";

/// One entry of `GET /repos/{repo}/actions/runs`. Higher ids are newer.
pub fn run_json(id: u64, name: &str, branch: &str, file: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "display_title": format!("{name} #{id}"),
        "head_branch": branch,
        "head_sha": format!("{id:040x}"),
        "status": "completed",
        "conclusion": "success",
        "workflow_id": 7,
        "path": format!(".github/workflows/{file}"),
        "run_number": id,
        "run_attempt": 1,
        "html_url": format!("https://github.com/{REPO}/actions/runs/{id}"),
        "created_at": format!("2024-06-01T10:{:02}:00Z", id % 60),
        "updated_at": format!("2024-06-01T10:{:02}:30Z", id % 60),
        "run_started_at": null,
        "repository": {
            "full_name": REPO,
            "html_url": format!("https://github.com/{REPO}")
        }
    })
}

pub fn runs_response(runs: Vec<Value>) -> String {
    json!({ "total_count": runs.len(), "workflow_runs": runs }).to_string()
}

pub fn parse_runs(runs: Vec<Value>) -> Vec<Run> {
    parser::parse_runs(&runs_response(runs)).expect("fixture runs parse")
}

/// Three runs on main (one of them Deploy) and two on feature/x.
pub fn mixed_branch_runs() -> Vec<Run> {
    parse_runs(vec![
        run_json(1, "CI", "main", "ci.yml"),
        run_json(2, "CI", "main", "ci.yml"),
        run_json(3, "Deploy", "main", "deploy.yml"),
        run_json(4, "CI", "feature/x", "ci.yml"),
        run_json(5, "Lint", "feature/x", "lint.yml"),
    ])
}

pub fn job_json(id: u64, run_id: u64, name: &str, status: &str, conclusion: Option<&str>) -> Value {
    let completed_at = if status == "completed" {
        json!("2024-06-01T10:01:05Z")
    } else {
        Value::Null
    };
    json!({
        "id": id,
        "run_id": run_id,
        "name": name,
        "status": status,
        "conclusion": conclusion,
        "started_at": "2024-06-01T10:00:05Z",
        "completed_at": completed_at,
        "html_url": format!("https://github.com/{REPO}/actions/runs/{run_id}/job/{id}"),
        "steps": [
            { "name": "Set up job", "status": "completed", "conclusion": "success", "number": 1,
              "started_at": "2024-06-01T10:00:05Z", "completed_at": "2024-06-01T10:00:10Z" },
            { "name": "Run tests", "status": status, "conclusion": conclusion, "number": 2,
              "started_at": "2024-06-01T10:00:10Z", "completed_at": null }
        ]
    })
}

pub fn parse_jobs(jobs: Vec<Value>) -> Vec<Job> {
    let body = json!({ "total_count": jobs.len(), "jobs": jobs }).to_string();
    parser::parse_jobs(&body).expect("fixture jobs parse")
}

/// A 40-line log with "ERROR" on lines 5 and 30.
pub fn log_with_errors() -> String {
    (1..=40)
        .map(|i| {
            if i == 5 || i == 30 {
                format!("ERROR: step {i} failed")
            } else {
                format!("info: step {i} ok")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
