//! # Holdline Queue Engine
//!
//! In-queue voice menu and callback orchestration for callers waiting in a
//! contact-center hold queue. Callers hear their estimated wait time and queue
//! position, and can convert their held call into a scheduled callback task.
//!
//! This crate provides:
//! - The dialog state machine driving the main menu and callback menu flows
//! - Estimated-wait-time and queue-position calculation from the
//!   work-distribution service
//! - The cancel-original / create-callback task transition with typed
//!   attribute merging
//! - A localized prompt catalog and a call-control script model
//!
//! ## Architecture
//!
//! Every inbound dialog step is an independent, stateless invocation. The
//! telephony platform holds all "memory" between steps via the continuation
//! URL encoded into the previous response, so the protocol is effectively
//! continuation passing over the transport:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              DialogController                │
//! │   (mode-keyed FSM, one script per step)      │
//! ├──────────────────────────────────────────────┤
//! │ QueueStatusEstimator │ CallbackTaskManager   │
//! ├──────────────────────────────────────────────┤
//! │ PromptCatalog        │ WorkQueueClient       │
//! │ (read-only, built    │ (async trait over the │
//! │  once at startup)    │  work-distribution    │
//! │                      │  REST service)        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Within one step all work-distribution calls are awaited sequentially; later
//! calls depend on earlier results (task lookup precedes the statistics fetch,
//! cancellation precedes callback creation).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use holdline_queue_engine::prelude::*;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = QueueEngineConfig::default();
//! config.validate()?;
//!
//! let client: Arc<dyn WorkQueueClient> = Arc::new(HttpWorkQueueClient::new(
//!     "https://taskrouter.example.com/v1",
//!     "WS00000000000000000000000000000000",
//!     "AC00000000000000000000000000000000",
//!     "auth-token",
//! ));
//!
//! let controller = DialogController::new(config, Arc::new(PromptCatalog::builtin()), client);
//!
//! // One inbound step: decoded parameters in, one call-control script out.
//! let params = StepParams::default();
//! let script = controller.handle_main_menu(&params).await;
//! println!("{}", script.to_xml());
//! # Ok(())
//! # }
//! ```

pub mod callback;
pub mod config;
pub mod dialog;
pub mod error;
pub mod prompts;
pub mod script;
pub mod status;
pub mod taskrouter;

pub use config::QueueEngineConfig;
pub use error::{QueueEngineError, Result};

/// Common imports for working with the queue engine
pub mod prelude {
    pub use crate::callback::CallbackTaskManager;
    pub use crate::config::QueueEngineConfig;
    pub use crate::dialog::state::{CallbackMode, DialogMode, DialogState, MainMenuMode, StepParams};
    pub use crate::dialog::DialogController;
    pub use crate::error::{QueueEngineError, Result};
    pub use crate::prompts::{PromptBundle, PromptCatalog};
    pub use crate::script::{Directive, Gather, VoiceScript};
    pub use crate::status::{QueuePosition, QueueStatus, QueueStatusEstimator, WaitBucket};
    pub use crate::taskrouter::{
        HttpWorkQueueClient, QueueTask, TaskAttributes, TaskStatus, WaitStatistics, WorkQueueClient,
    };
}
