//! HTTP implementation of the work-distribution client
//!
//! Talks to a TaskRouter-shaped REST API: basic-auth credentials, JSON
//! reads, form-encoded mutations. Task attributes travel as a JSON string
//! inside the task resource and are decoded into [`TaskAttributes`] here; a
//! malformed attribute blob degrades to an empty attribute set rather than
//! failing the read.
//!
//! No retries and no caching: each dialog step performs its own small,
//! sequential set of calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{QueueEngineError, Result};

use super::{
    QueueTask, TaskAttributes, TaskStatus, WaitStatistics, WorkQueueClient, PENDING_STATUSES,
    QUEUE_ORDERING,
};

/// Work-distribution client over HTTP
pub struct HttpWorkQueueClient {
    http: reqwest::Client,
    base_url: String,
    workspace_sid: String,
    account_sid: String,
    auth_token: String,
}

impl HttpWorkQueueClient {
    pub fn new(
        base_url: impl Into<String>,
        workspace_sid: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            workspace_sid: workspace_sid.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
        }
    }

    fn workspace_url(&self, suffix: &str) -> String {
        format!(
            "{}/Workspaces/{}{}",
            self.base_url, self.workspace_sid, suffix
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .http
            .get(url)
            .query(query)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .http
            .post(url)
            .form(form)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueueEngineError::external(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl WorkQueueClient for HttpWorkQueueClient {
    async fn tasks_for_call(&self, call_sid: &str) -> Result<Vec<QueueTask>> {
        let url = self.workspace_url("/Tasks");
        let filter = format!("call_sid == '{}'", call_sid.replace('\'', ""));
        let page: TaskPage = self
            .get_json(
                &url,
                &[
                    ("EvaluateTaskAttributes", filter),
                    ("Limit", "20".to_string()),
                ],
            )
            .await?;
        debug!(call_sid, matches = page.tasks.len(), "task lookup by call sid");
        Ok(page.tasks.into_iter().map(TaskResource::into_task).collect())
    }

    async fn list_queue_tasks(&self, queue_name: &str, limit: usize) -> Result<Vec<QueueTask>> {
        let url = self.workspace_url("/Tasks");
        let page: TaskPage = self
            .get_json(
                &url,
                &[
                    ("AssignmentStatus", PENDING_STATUSES.to_string()),
                    ("TaskQueueName", queue_name.to_string()),
                    ("Ordering", QUEUE_ORDERING.to_string()),
                    ("Limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(page.tasks.into_iter().map(TaskResource::into_task).collect())
    }

    async fn workflow_wait_statistics(
        &self,
        workflow_sid: &str,
        window_minutes: u32,
    ) -> Result<WaitStatistics> {
        let url = self.workspace_url(&format!("/Workflows/{}/CumulativeStatistics", workflow_sid));
        let stats: CumulativeStatisticsResource = self
            .get_json(&url, &[("Minutes", window_minutes.to_string())])
            .await?;
        let wait = stats.wait_duration_until_accepted;
        Ok(WaitStatistics {
            min_secs: wait.min.unwrap_or(0.0),
            max_secs: wait.max.unwrap_or(0.0),
            avg_secs: wait.avg.unwrap_or(0.0),
        })
    }

    async fn update_task_status(
        &self,
        task_sid: &str,
        status: TaskStatus,
        reason: &str,
    ) -> Result<()> {
        let url = self.workspace_url(&format!("/Tasks/{}", task_sid));
        let _: TaskResource = self
            .post_form(
                &url,
                &[
                    ("AssignmentStatus", status.as_str().to_string()),
                    ("Reason", reason.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn create_task(
        &self,
        attributes: &TaskAttributes,
        workflow_sid: &str,
        priority: u32,
        channel: &str,
    ) -> Result<QueueTask> {
        let url = self.workspace_url("/Tasks");
        let encoded = serde_json::to_string(attributes)
            .map_err(|e| QueueEngineError::internal(format!("attribute encoding failed: {e}")))?;
        let resource: TaskResource = self
            .post_form(
                &url,
                &[
                    ("Attributes", encoded),
                    ("WorkflowSid", workflow_sid.to_string()),
                    ("Priority", priority.to_string()),
                    ("TaskChannel", channel.to_string()),
                ],
            )
            .await?;
        Ok(resource.into_task())
    }
}

/// One page of task resources
#[derive(Debug, Deserialize)]
struct TaskPage {
    #[serde(default)]
    tasks: Vec<TaskResource>,
}

/// Task resource as returned by the service; attributes arrive as a JSON
/// string and dates in either RFC 3339 or RFC 2822
#[derive(Debug, Deserialize)]
struct TaskResource {
    sid: String,
    #[serde(default)]
    priority: u32,
    #[serde(default)]
    task_queue_sid: String,
    #[serde(default)]
    task_queue_friendly_name: String,
    #[serde(default)]
    workflow_sid: String,
    #[serde(default)]
    date_created: String,
    #[serde(default)]
    attributes: String,
}

impl TaskResource {
    fn into_task(self) -> QueueTask {
        let attributes = if self.attributes.is_empty() {
            TaskAttributes::default()
        } else {
            match serde_json::from_str(&self.attributes) {
                Ok(attributes) => attributes,
                Err(e) => {
                    warn!(task_sid = %self.sid, error = %e, "unparseable task attributes");
                    TaskAttributes::default()
                }
            }
        };
        QueueTask {
            attributes,
            priority: self.priority,
            queue_sid: self.task_queue_sid,
            queue_name: self.task_queue_friendly_name,
            workflow_sid: self.workflow_sid,
            date_created: parse_task_date(&self.date_created),
            sid: self.sid,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CumulativeStatisticsResource {
    #[serde(default)]
    wait_duration_until_accepted: WaitDuration,
}

#[derive(Debug, Default, Deserialize)]
struct WaitDuration {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    avg: Option<f64>,
}

fn parse_task_date(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            if !raw.is_empty() {
                warn!(raw, "unparseable task date, treating as now");
            }
            Utc::now()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_date_formats() {
        let rfc3339 = parse_task_date("2026-08-01T12:00:00Z");
        assert_eq!(rfc3339.to_rfc3339(), "2026-08-01T12:00:00+00:00");

        let rfc2822 = parse_task_date("Sat, 01 Aug 2026 12:00:00 +0000");
        assert_eq!(rfc2822, rfc3339);
    }

    #[test]
    fn test_task_resource_decodes_attribute_string() {
        let resource: TaskResource = serde_json::from_str(
            r#"{
                "sid": "WT001",
                "priority": 10,
                "task_queue_sid": "WQ001",
                "task_queue_friendly_name": "support",
                "workflow_sid": "WW001",
                "date_created": "2026-08-01T12:00:00Z",
                "attributes": "{\"call_sid\":\"CA123\",\"conversations\":{\"foo\":\"bar\"}}"
            }"#,
        )
        .unwrap();

        let task = resource.into_task();
        assert_eq!(task.call_sid(), Some("CA123"));
        assert_eq!(task.queue_name, "support");
        assert_eq!(
            task.attributes.conversations.get("foo"),
            Some(&serde_json::Value::String("bar".into()))
        );
    }

    #[test]
    fn test_task_resource_tolerates_bad_attributes() {
        let resource: TaskResource = serde_json::from_str(
            r#"{"sid": "WT002", "attributes": "not json"}"#,
        )
        .unwrap();
        let task = resource.into_task();
        assert_eq!(task.attributes, TaskAttributes::default());
    }
}
