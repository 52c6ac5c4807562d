//! Work-distribution service types and client
//!
//! Typed operations against the external work-distribution service that owns
//! the queue of pending caller tasks: find the task belonging to a call, list
//! pending tasks for a queue, fetch trailing-window wait statistics, cancel a
//! task, create a task. All operations are asynchronous, fallible, and
//! non-retrying; callers decide how to degrade.
//!
//! The service owns [`QueueTask`] records; this crate only references them.
//! Invariant assumed throughout: at most one active task per call sid. Zero
//! or multiple matches is [`QueueEngineError::AmbiguousTask`] and is never
//! resolved by guessing.

mod rest;

pub use rest::HttpWorkQueueClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{QueueEngineError, Result};

/// Assignment statuses considered "waiting" when computing queue position
pub const PENDING_STATUSES: &str = "pending,reserved";

/// Ordering applied when listing queue tasks: enqueue time ascending, then
/// priority descending
pub const QUEUE_ORDERING: &str = "DateCreated:asc,Priority:desc";

/// Task channel used for created callback tasks
pub const CALLBACK_CHANNEL: &str = "callback";

/// Target assignment status for a task status update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Canceled,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Canceled => "canceled",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Timestamp attached to a callback task so agents see when the caller asked
/// for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallTime {
    /// When the callback request was received
    #[serde(rename = "time_recvd")]
    pub received_at: DateTime<Utc>,
    /// Long human-readable rendering, e.g. "Aug 29 2026, 3:04:05 PM UTC"
    pub server_time_long: String,
    /// Short human-readable rendering, e.g. "08-29-2026, 3:04:05 PM UTC"
    pub server_time_short: String,
}

impl CallTime {
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(received_at: DateTime<Utc>) -> Self {
        Self {
            received_at,
            server_time_long: received_at.format("%b %d %Y, %-I:%M:%S %p UTC").to_string(),
            server_time_short: received_at.format("%m-%d-%Y, %-I:%M:%S %p UTC").to_string(),
        }
    }
}

/// Flag bag consumed by the agent-desktop UI plugin (host-controlled front
/// end; only carried here, never interpreted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiPluginFlags {
    #[serde(rename = "cbCallButtonAccessibility")]
    pub cb_call_button_accessibility: bool,
}

/// Typed task attribute set.
///
/// The work-distribution service stores attributes as opaque JSON; this
/// struct names the fields the engine reads or writes and keeps everything
/// else intact in `extra`, so attribute round trips never drop upstream data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskAttributes {
    /// Call sid of the originating call; the lookup key for "the caller's
    /// own task"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,

    /// Number originally called by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub called: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "taskType", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,

    /// Number a callback task should dial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(rename = "callTime", skip_serializing_if = "Option::is_none")]
    pub call_time: Option<CallTime>,

    #[serde(rename = "queueTargetName", skip_serializing_if = "Option::is_none")]
    pub queue_target_name: Option<String>,

    #[serde(rename = "queueTargetSid", skip_serializing_if = "Option::is_none")]
    pub queue_target_sid: Option<String>,

    #[serde(rename = "workflowTargetSid", skip_serializing_if = "Option::is_none")]
    pub workflow_target_sid: Option<String>,

    /// Audible alert asset played to the agent when the callback is placed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ringback: Option<String>,

    #[serde(rename = "placeCallRetry", skip_serializing_if = "Option::is_none")]
    pub place_call_retry: Option<u32>,

    #[serde(rename = "ui_plugin", skip_serializing_if = "Option::is_none")]
    pub ui_plugin: Option<UiPluginFlags>,

    /// Reporting linkage map; sub-fields are unioned, never replaced, when a
    /// callback task is derived from an original task
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub conversations: Map<String, Value>,

    /// Everything the engine does not model explicitly
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A caller's unit of work in the work-distribution service (referenced,
/// never owned by this crate)
#[derive(Debug, Clone, PartialEq)]
pub struct QueueTask {
    pub sid: String,
    pub priority: u32,
    pub queue_sid: String,
    pub queue_name: String,
    pub workflow_sid: String,
    pub date_created: DateTime<Utc>,
    pub attributes: TaskAttributes,
}

impl QueueTask {
    /// Call sid carried in the task attributes, if any
    pub fn call_sid(&self) -> Option<&str> {
        self.attributes.call_sid.as_deref()
    }
}

/// Cumulative wait-until-accepted statistics over a trailing window, for one
/// workflow. Recomputed per request, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaitStatistics {
    #[serde(rename = "min")]
    pub min_secs: f64,
    #[serde(rename = "max")]
    pub max_secs: f64,
    #[serde(rename = "avg")]
    pub avg_secs: f64,
}

impl WaitStatistics {
    /// Average wait in whole minutes, truncated (minute-granularity
    /// comparison for wait-bucket selection)
    pub fn avg_whole_minutes(&self) -> u64 {
        (self.avg_secs.max(0.0) / 60.0) as u64
    }
}

/// Asynchronous client for the work-distribution service.
///
/// Implementations must not retry; within a dialog step every call is awaited
/// sequentially because later calls depend on earlier results.
#[async_trait]
pub trait WorkQueueClient: Send + Sync {
    /// All active tasks whose `call_sid` attribute equals the given call sid
    async fn tasks_for_call(&self, call_sid: &str) -> Result<Vec<QueueTask>>;

    /// Pending/reserved tasks for a queue, ordered by enqueue time ascending
    /// then priority descending, capped at `limit`
    async fn list_queue_tasks(&self, queue_name: &str, limit: usize) -> Result<Vec<QueueTask>>;

    /// Trailing-window cumulative wait statistics for a workflow
    async fn workflow_wait_statistics(
        &self,
        workflow_sid: &str,
        window_minutes: u32,
    ) -> Result<WaitStatistics>;

    /// Move a task to the given assignment status with a reason
    async fn update_task_status(
        &self,
        task_sid: &str,
        status: TaskStatus,
        reason: &str,
    ) -> Result<()>;

    /// Create a task against a workflow
    async fn create_task(
        &self,
        attributes: &TaskAttributes,
        workflow_sid: &str,
        priority: u32,
        channel: &str,
    ) -> Result<QueueTask>;

    /// The unique task for a call sid. Exactly one match is required; zero
    /// or multiple matches is an [`QueueEngineError::AmbiguousTask`] error.
    async fn find_task_by_call_sid(&self, call_sid: &str) -> Result<QueueTask> {
        let mut tasks = self.tasks_for_call(call_sid).await?;
        match tasks.len() {
            1 => Ok(tasks.remove(0)),
            n => Err(QueueEngineError::ambiguous_task(call_sid, n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> QueueTask {
        let mut attributes = TaskAttributes::default();
        attributes.call_sid = Some("CA123".to_string());
        attributes.called = Some("+18005550100".to_string());
        attributes
            .conversations
            .insert("foo".to_string(), Value::String("bar".to_string()));
        attributes
            .extra
            .insert("customer_tier".to_string(), Value::String("gold".to_string()));

        QueueTask {
            sid: "WT001".to_string(),
            priority: 10,
            queue_sid: "WQ001".to_string(),
            queue_name: "support".to_string(),
            workflow_sid: "WW001".to_string(),
            date_created: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            attributes,
        }
    }

    #[test]
    fn test_attributes_round_trip_preserves_unknown_fields() {
        let attributes = sample_task().attributes;
        let json = serde_json::to_string(&attributes).unwrap();
        let decoded: TaskAttributes = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.call_sid.as_deref(), Some("CA123"));
        assert_eq!(decoded.conversations.get("foo"), Some(&Value::String("bar".into())));
        assert_eq!(
            decoded.extra.get("customer_tier"),
            Some(&Value::String("gold".into()))
        );
        assert_eq!(decoded, attributes);
    }

    #[test]
    fn test_attributes_wire_names() {
        let mut attributes = TaskAttributes::default();
        attributes.task_type = Some("callback".to_string());
        attributes.place_call_retry = Some(1);
        attributes.queue_target_name = Some("support".to_string());

        let json = serde_json::to_value(&attributes).unwrap();
        assert_eq!(json["taskType"], "callback");
        assert_eq!(json["placeCallRetry"], 1);
        assert_eq!(json["queueTargetName"], "support");
    }

    #[test]
    fn test_avg_whole_minutes_truncates() {
        let stats = WaitStatistics {
            min_secs: 10.0,
            max_secs: 400.0,
            avg_secs: 119.9,
        };
        assert_eq!(stats.avg_whole_minutes(), 1);

        let stats = WaitStatistics {
            min_secs: 0.0,
            max_secs: 0.0,
            avg_secs: -5.0,
        };
        assert_eq!(stats.avg_whole_minutes(), 0);
    }

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Canceled.as_str(), "canceled");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }
}
