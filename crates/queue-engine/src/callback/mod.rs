//! Callback task creation
//!
//! Converts a caller's held queue task into a callback task: look up the
//! original task by call sid, cancel it with a "Callback Requested" reason,
//! then create the callback task against the same workflow with a merged
//! attribute set.
//!
//! The transition is non-transactional and strictly ordered:
//! cancellation must precede creation so the caller is never counted in both
//! an active task and a callback task at once, and there is no rollback. A
//! failed cancel or create is logged and does not stop the remaining steps.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::QueueEngineConfig;
use crate::error::{QueueEngineError, Result};
use crate::taskrouter::{
    CallTime, QueueTask, TaskAttributes, TaskStatus, UiPluginFlags, WorkQueueClient,
    CALLBACK_CHANNEL,
};

/// Reason recorded on the canceled original task
pub const CANCEL_REASON: &str = "Callback Requested";

/// Derive the caller's 10-digit national number from a `From` value such as
/// `+13035551212`
pub fn derive_customer_phone(from: &str) -> String {
    let digits: String = from.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() > 10 {
        digits[digits.len() - 10..].to_string()
    } else {
        digits
    }
}

/// Validate a captured 10-digit number and format it for dialing (`+1` plus
/// the national number)
pub fn format_callback_number(digits: &str) -> Result<String> {
    if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(QueueEngineError::invalid_phone(format!(
            "expected 10 digits, got {:?}",
            digits
        )));
    }
    Ok(format!("+1{digits}"))
}

/// Build the attribute set for a callback task derived from an original
/// task.
///
/// Overridden fields: task type, to/from, name, call time, queue and
/// workflow targets, ringback, retry counter, direction, and the UI-plugin
/// flag. The `conversations` map is unioned with `conversation_id` pointing
/// at the original task; every pre-existing sub-field survives. All other
/// original attributes pass through untouched.
pub fn merge_callback_attributes(
    original: &QueueTask,
    phone: &str,
    alert_tone_url: &str,
    call_time: CallTime,
) -> TaskAttributes {
    let mut attributes = original.attributes.clone();
    attributes.task_type = Some("callback".to_string());
    attributes.ringback = Some(alert_tone_url.to_string());
    attributes.to = Some(phone.to_string());
    attributes.direction = Some("inbound".to_string());
    attributes.name = Some(format!("Callback: {phone}"));
    attributes.from = original.attributes.called.clone();
    attributes.call_time = Some(call_time);
    attributes.queue_target_name = Some(original.queue_name.clone());
    attributes.queue_target_sid = Some(original.queue_sid.clone());
    attributes.workflow_target_sid = Some(original.workflow_sid.clone());
    attributes.ui_plugin = Some(UiPluginFlags {
        cb_call_button_accessibility: false,
    });
    attributes.place_call_retry = Some(1);
    attributes.conversations.insert(
        "conversation_id".to_string(),
        serde_json::Value::String(original.sid.clone()),
    );
    attributes
}

/// Performs the cancel-original / create-callback transition
pub struct CallbackTaskManager {
    client: Arc<dyn WorkQueueClient>,
    config: QueueEngineConfig,
}

impl CallbackTaskManager {
    pub fn new(client: Arc<dyn WorkQueueClient>, config: QueueEngineConfig) -> Self {
        Self { client, config }
    }

    /// Submit a callback request for the call identified by `call_sid`, to be
    /// placed to `phone` (already validated and formatted for dialing).
    ///
    /// Ordering is a hard requirement: lookup, then cancel, then create. An
    /// ambiguous or absent original task aborts the whole transition with no
    /// task mutated. Cancel and create failures are logged; a cancel failure
    /// never blocks creation.
    pub async fn submit(&self, call_sid: &str, phone: &str) -> Result<QueueTask> {
        let original = match self.client.find_task_by_call_sid(call_sid).await {
            Ok(task) => task,
            Err(e) => {
                error!(call_sid, error = %e, "callback aborted: original task lookup failed");
                return Err(e);
            }
        };

        if let Err(e) = self
            .client
            .update_task_status(&original.sid, TaskStatus::Canceled, CANCEL_REASON)
            .await
        {
            warn!(
                call_sid,
                task_sid = %original.sid,
                error = %e,
                "failed to cancel original task, continuing with callback creation"
            );
        }

        let attributes = merge_callback_attributes(
            &original,
            phone,
            &self.config.alert_tone_url(),
            CallTime::now(),
        );

        match self
            .client
            .create_task(
                &attributes,
                &original.workflow_sid,
                self.config.callback_priority,
                CALLBACK_CHANNEL,
            )
            .await
        {
            Ok(task) => {
                info!(
                    call_sid,
                    original_task = %original.sid,
                    callback_task = %task.sid,
                    "callback task created"
                );
                Ok(task)
            }
            Err(e) => {
                error!(call_sid, error = %e, "callback task creation failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    fn original_task() -> QueueTask {
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
    fn test_merge_overrides_listed_fields() {
        let original = original_task();
        let merged = merge_callback_attributes(
            &original,
            "+13035551212",
            "https://voice.example.com/alertTone.mp3",
            CallTime::at(Utc.with_ymd_and_hms(2026, 8, 29, 15, 4, 5).unwrap()),
        );

        assert_eq!(merged.task_type.as_deref(), Some("callback"));
        assert_eq!(merged.to.as_deref(), Some("+13035551212"));
        assert_eq!(merged.from.as_deref(), Some("+18005550100"));
        assert_eq!(merged.name.as_deref(), Some("Callback: +13035551212"));
        assert_eq!(merged.direction.as_deref(), Some("inbound"));
        assert_eq!(merged.queue_target_name.as_deref(), Some("support"));
        assert_eq!(merged.queue_target_sid.as_deref(), Some("WQ001"));
        assert_eq!(merged.workflow_target_sid.as_deref(), Some("WW001"));
        assert_eq!(
            merged.ringback.as_deref(),
            Some("https://voice.example.com/alertTone.mp3")
        );
        assert_eq!(merged.place_call_retry, Some(1));
        assert_eq!(
            merged.ui_plugin,
            Some(UiPluginFlags {
                cb_call_button_accessibility: false
            })
        );
    }

    #[test]
    fn test_merge_unions_conversations_and_keeps_extras() {
        let original = original_task();
        let merged = merge_callback_attributes(
            &original,
            "+13035551212",
            "https://voice.example.com/alertTone.mp3",
            CallTime::now(),
        );

        // Original conversation sub-fields survive; linkage is added.
        assert_eq!(
            merged.conversations.get("foo"),
            Some(&Value::String("bar".into()))
        );
        assert_eq!(
            merged.conversations.get("conversation_id"),
            Some(&Value::String("WT001".into()))
        );

        // Unmodeled attributes pass through untouched.
        assert_eq!(
            merged.extra.get("customer_tier"),
            Some(&Value::String("gold".into()))
        );
        assert_eq!(merged.call_sid.as_deref(), Some("CA123"));
    }

    #[test]
    fn test_derive_customer_phone() {
        assert_eq!(derive_customer_phone("+13035551212"), "3035551212");
        assert_eq!(derive_customer_phone("3035551212"), "3035551212");
        assert_eq!(derive_customer_phone("555-1212"), "5551212");
    }

    #[test]
    fn test_format_callback_number() {
        assert_eq!(format_callback_number("3035551212").unwrap(), "+13035551212");
        assert!(format_callback_number("303555121").is_err());
        assert!(format_callback_number("30355512120").is_err());
        assert!(format_callback_number("30355512a2").is_err());
    }
}
