//! Estimated wait time and queue position
//!
//! Turns work-distribution results into the two sentences a waiting caller
//! hears: a wait-time bucket and a queue-position message. The estimation is
//! strictly sequential: the caller's own task must be found before the
//! statistics fetch (it names the workflow) and before the position scan (it
//! names the queue).
//!
//! Both halves degrade independently: if a data source fails, its phrase is
//! simply omitted from the greeting. An ambiguous task match (zero or
//! multiple tasks for the call sid) yields no phrases at all; the estimator
//! never guesses which task is the caller's.

use std::sync::Arc;

use tracing::warn;

use crate::prompts::{keys, PromptBundle};
use crate::taskrouter::{QueueTask, WorkQueueClient};

/// Wait-time bucket derived from the average wait in whole minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitBucket {
    UnderOneMinute,
    UnderTwoMinutes,
    UnderThreeMinutes,
    UnderFourMinutes,
    OverFourMinutes,
}

impl WaitBucket {
    /// Bucket for a truncated whole-minute average wait
    pub fn from_average_minutes(minutes: u64) -> Self {
        match minutes {
            0 => WaitBucket::UnderOneMinute,
            1 => WaitBucket::UnderTwoMinutes,
            2 => WaitBucket::UnderThreeMinutes,
            3 => WaitBucket::UnderFourMinutes,
            _ => WaitBucket::OverFourMinutes,
        }
    }

    /// Phrase key for this bucket in the main-menu collection
    pub fn phrase_key(&self) -> &'static str {
        match self {
            WaitBucket::UnderOneMinute => keys::WAIT_UNDER_ONE,
            WaitBucket::UnderTwoMinutes => keys::WAIT_UNDER_TWO,
            WaitBucket::UnderThreeMinutes => keys::WAIT_UNDER_THREE,
            WaitBucket::UnderFourMinutes => keys::WAIT_UNDER_FOUR,
            WaitBucket::OverFourMinutes => keys::WAIT_OVER_FOUR,
        }
    }
}

/// The caller's place in the pending-task window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePosition {
    /// The caller's task is at the head of the queue
    NextInQueue,
    /// Exactly this many callers are ahead
    Ahead(usize),
    /// The caller was not found within the inspected window; all that is
    /// known is "more than the cap"
    BeyondWindow,
}

impl QueuePosition {
    /// Locate a caller within an ordered, capped task list
    pub fn locate(tasks: &[QueueTask], call_sid: &str) -> Self {
        match tasks.iter().position(|t| t.call_sid() == Some(call_sid)) {
            Some(0) => QueuePosition::NextInQueue,
            Some(index) => QueuePosition::Ahead(index),
            None => QueuePosition::BeyondWindow,
        }
    }
}

/// Localized greeting fragments for one caller; either sentence may be
/// absent when its upstream data source failed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueStatus {
    pub wait_phrase: Option<String>,
    pub position_phrase: Option<String>,
}

/// Computes wait-time and queue-position phrases for a held call
pub struct QueueStatusEstimator {
    client: Arc<dyn WorkQueueClient>,
    stats_window_minutes: u32,
    max_queue_position: usize,
}

impl QueueStatusEstimator {
    pub fn new(
        client: Arc<dyn WorkQueueClient>,
        stats_window_minutes: u32,
        max_queue_position: usize,
    ) -> Self {
        Self {
            client,
            stats_window_minutes,
            max_queue_position,
        }
    }

    /// Estimate wait time and queue position for the caller identified by
    /// `call_sid`, phrased with the given bundle.
    ///
    /// Never fails: upstream errors are logged and reported as absent
    /// phrases so the dialog step can still produce a valid script.
    pub async fn estimate(&self, call_sid: &str, bundle: &PromptBundle) -> QueueStatus {
        let task = match self.client.find_task_by_call_sid(call_sid).await {
            Ok(task) => task,
            Err(e) => {
                warn!(call_sid, error = %e, "queue status unavailable: task lookup failed");
                return QueueStatus::default();
            }
        };

        QueueStatus {
            wait_phrase: self.wait_phrase(&task, bundle).await,
            position_phrase: self.position_phrase(call_sid, &task, bundle).await,
        }
    }

    async fn wait_phrase(&self, task: &QueueTask, bundle: &PromptBundle) -> Option<String> {
        let stats = match self
            .client
            .workflow_wait_statistics(&task.workflow_sid, self.stats_window_minutes)
            .await
        {
            Ok(stats) => stats,
            Err(e) => {
                warn!(
                    workflow_sid = %task.workflow_sid,
                    error = %e,
                    "wait statistics unavailable"
                );
                return None;
            }
        };

        let bucket = WaitBucket::from_average_minutes(stats.avg_whole_minutes());
        Some(format!(
            "{} {}",
            bundle.phrase(keys::WAIT_PREFIX),
            bundle.phrase(bucket.phrase_key())
        ))
    }

    async fn position_phrase(
        &self,
        call_sid: &str,
        task: &QueueTask,
        bundle: &PromptBundle,
    ) -> Option<String> {
        let tasks = match self
            .client
            .list_queue_tasks(&task.queue_name, self.max_queue_position)
            .await
        {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(queue_name = %task.queue_name, error = %e, "queue listing unavailable");
                return None;
            }
        };

        let phrase = match QueuePosition::locate(&tasks, call_sid) {
            QueuePosition::NextInQueue => bundle.phrase(keys::POSITION_NEXT).to_string(),
            QueuePosition::Ahead(1) => format!(
                "{} 1 {}",
                bundle.phrase(keys::POSITION_PREFIX_ONE),
                bundle.phrase(keys::POSITION_SUFFIX_ONE)
            ),
            QueuePosition::Ahead(num_ahead) => format!(
                "{} {} {}",
                bundle.phrase(keys::POSITION_PREFIX_MANY),
                num_ahead,
                bundle.phrase(keys::POSITION_SUFFIX_MANY)
            ),
            QueuePosition::BeyondWindow => format!(
                "{} {} {}",
                bundle.phrase(keys::POSITION_PREFIX_MAX),
                self.max_queue_position,
                bundle.phrase(keys::POSITION_SUFFIX_MANY)
            ),
        };
        Some(phrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::taskrouter::TaskAttributes;

    fn task_with_call_sid(sid: &str, call_sid: &str) -> QueueTask {
        let mut attributes = TaskAttributes::default();
        attributes.call_sid = Some(call_sid.to_string());
        QueueTask {
            sid: sid.to_string(),
            priority: 0,
            queue_sid: "WQ001".to_string(),
            queue_name: "support".to_string(),
            workflow_sid: "WW001".to_string(),
            date_created: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            attributes,
        }
    }

    #[test]
    fn test_wait_bucket_table() {
        assert_eq!(WaitBucket::from_average_minutes(0), WaitBucket::UnderOneMinute);
        assert_eq!(WaitBucket::from_average_minutes(1), WaitBucket::UnderTwoMinutes);
        assert_eq!(WaitBucket::from_average_minutes(2), WaitBucket::UnderThreeMinutes);
        assert_eq!(WaitBucket::from_average_minutes(3), WaitBucket::UnderFourMinutes);
        assert_eq!(WaitBucket::from_average_minutes(4), WaitBucket::OverFourMinutes);
        assert_eq!(WaitBucket::from_average_minutes(17), WaitBucket::OverFourMinutes);
    }

    #[test]
    fn test_position_locate() {
        let tasks: Vec<QueueTask> = (0..5)
            .map(|i| task_with_call_sid(&format!("WT{i:03}"), &format!("CA{i:03}")))
            .collect();

        assert_eq!(QueuePosition::locate(&tasks, "CA000"), QueuePosition::NextInQueue);
        assert_eq!(QueuePosition::locate(&tasks, "CA001"), QueuePosition::Ahead(1));
        assert_eq!(QueuePosition::locate(&tasks, "CA004"), QueuePosition::Ahead(4));
        assert_eq!(
            QueuePosition::locate(&tasks, "CA999"),
            QueuePosition::BeyondWindow
        );
        assert_eq!(QueuePosition::locate(&[], "CA000"), QueuePosition::BeyondWindow);
    }
}
