use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of a remote scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    /// Map the vendor's status vocabulary. Anything unrecognised is treated
    /// as still running so new remote states never break the poll loop.
    pub fn from_remote(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "pending" => JobState::Pending,
            "completed" | "success" => JobState::Completed,
            "aborted" | "failed" | "error" | "timeout" => JobState::Failed,
            _ => JobState::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Handle on one remote run, threaded through create, poll and fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteJob {
    pub squid_id: String,
    pub task_id: Option<String>,
    pub run_id: String,
    pub state: JobState,
    pub last_status: String,
}

/// Run metadata as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunInfo {
    #[serde(alias = "runId")]
    pub id: String,
    #[serde(default)]
    pub status: String,
}

/// One page of run results
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultsPage {
    #[serde(alias = "data", default)]
    pub results: Vec<Value>,
    #[serde(alias = "total_results", default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub next: Option<Value>,
}

impl ResultsPage {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TaskInput {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateTasksRequest {
    pub squid: String,
    pub tasks: Vec<TaskInput>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateRunRequest {
    pub squid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IdOnly {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CreateTasksResponse {
    #[serde(default)]
    pub tasks: Vec<IdOnly>,
    #[serde(alias = "taskId", default)]
    pub id: Option<String>,
}

impl CreateTasksResponse {
    pub fn task_id(self) -> Option<String> {
        self.id.or_else(|| self.tasks.into_iter().next().map(|t| t.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_remote_vocabulary() {
        assert_eq!(JobState::from_remote("pending"), JobState::Pending);
        for s in ["started", "processing", "running", "warming_up"] {
            assert_eq!(JobState::from_remote(s), JobState::Running);
        }
        assert_eq!(JobState::from_remote("SUCCESS"), JobState::Completed);
        assert_eq!(JobState::from_remote("completed"), JobState::Completed);
        for s in ["aborted", "failed", "error", "timeout"] {
            assert_eq!(JobState::from_remote(s), JobState::Failed);
            assert!(JobState::from_remote(s).is_terminal());
        }
        assert!(!JobState::Running.is_terminal());
    }

    #[test]
    fn results_page_accepts_vendor_field_names() {
        let page: ResultsPage = serde_json::from_value(json!({
            "data": [{"id": 1}], "total_results": 40, "next": null
        }))
        .unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.total, Some(40));
        assert!(!page.has_next());

        let page: ResultsPage = serde_json::from_value(json!({"results": [], "next": 3})).unwrap();
        assert!(page.has_next());
    }

    #[test]
    fn task_id_from_either_shape() {
        let nested: CreateTasksResponse = serde_json::from_value(json!({"tasks": [{"id": "t1"}]})).unwrap();
        assert_eq!(nested.task_id().as_deref(), Some("t1"));
        let flat: CreateTasksResponse = serde_json::from_value(json!({"taskId": "t2"})).unwrap();
        assert_eq!(flat.task_id().as_deref(), Some("t2"));
    }

    #[test]
    fn run_info_accepts_run_id_alias() {
        let run: RunInfo = serde_json::from_value(json!({"runId": "r9", "status": "pending"})).unwrap();
        assert_eq!(run.id, "r9");
    }
}
