//! Dialog state machine
//!
//! The finite-state dispatcher for the in-queue menus. Each inbound step is
//! one stateless invocation: decode the continuation parameters into a
//! [`DialogState`], run the handler for its mode, and emit exactly one
//! call-control script whose gathers and redirects carry the next
//! continuation URL. There is no session store; the telephony platform
//! replays the encoded state on the next step.
//!
//! ## Main-menu flow
//!
//! ```text
//! main ──gather──▶ mainProcess ──"1"──▶ menuProcess ─┬─"1"─▶ main (greeting skipped)
//!   ▲                   │                            ├─"2"─▶ callback-menu main
//!   └──invalid entry────┘                            ├─"3"─▶ voicemail flow
//!                                                    └─ * /other ─▶ mainProcess (replay)
//! ```
//!
//! ## Callback-menu flow
//!
//! ```text
//! main ──gather──▶ mainProcess ─┬─"1"──────────────────────────▶ submitCallback
//!                               └─"2"─▶ newNumber ─▶ newNumberProcess ─┬─"1"─▶ submitCallback
//!                                          ▲                          ├─"2"─▶ mainProcess
//!                                          └───────invalid entry──────┤
//!                                                                     └─ * ─▶ main-menu main
//! ```
//!
//! A gather timeout delivers an empty digit string and lands in the same
//! "unrecognized selection" branch as a wrong key. An unrecognized top-level
//! mode falls back to hold music; the step always returns a playable script.

pub mod state;

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::callback::{derive_customer_phone, format_callback_number, CallbackTaskManager};
use crate::config::QueueEngineConfig;
use crate::prompts::{
    keys, PromptBundle, PromptCatalog, CALLBACK_MENU_COLLECTION, MAIN_MENU_COLLECTION,
};
use crate::script::{Gather, Interpretation, VoiceScript};
use crate::status::QueueStatusEstimator;
use crate::taskrouter::WorkQueueClient;

use state::{
    voicemail_entry_url, CallbackMode, DialogMode, DialogState, MainMenuMode, MenuFlow, StepParams,
};

/// The in-queue dialog state machine
pub struct DialogController {
    config: QueueEngineConfig,
    catalog: Arc<PromptCatalog>,
    estimator: QueueStatusEstimator,
    callbacks: CallbackTaskManager,
}

impl DialogController {
    pub fn new(
        config: QueueEngineConfig,
        catalog: Arc<PromptCatalog>,
        client: Arc<dyn WorkQueueClient>,
    ) -> Self {
        let estimator = QueueStatusEstimator::new(
            client.clone(),
            config.stats_window_minutes,
            config.max_queue_position,
        );
        let callbacks = CallbackTaskManager::new(client, config.clone());
        Self {
            config,
            catalog,
            estimator,
            callbacks,
        }
    }

    /// Handle one step of the main in-queue menu flow
    pub async fn handle_main_menu(&self, params: &StepParams) -> VoiceScript {
        let state = DialogState::from_params(MenuFlow::MainMenu, params, &self.config);
        debug!(call_sid = %state.call_sid, mode = ?params.mode, "main-menu step");

        let bundle = match self.catalog.lookup(MAIN_MENU_COLLECTION, &state.language) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(error = %e, "prompt lookup failed, returning hold music");
                return self.hold_music();
            }
        };

        match state.mode {
            Some(DialogMode::MainMenu(MainMenuMode::Main)) => {
                self.main_greeting(&state, bundle).await
            }
            Some(DialogMode::MainMenu(MainMenuMode::MainProcess)) => {
                self.main_process(&state, bundle)
            }
            Some(DialogMode::MainMenu(MainMenuMode::MenuProcess)) => {
                self.menu_process(&state, bundle)
            }
            _ => {
                warn!(mode = ?params.mode, "unhandled main-menu mode, returning hold music");
                self.hold_music()
            }
        }
    }

    /// Handle one step of the callback menu flow
    pub async fn handle_callback_menu(&self, params: &StepParams) -> VoiceScript {
        let state = DialogState::from_params(MenuFlow::CallbackMenu, params, &self.config);
        debug!(call_sid = %state.call_sid, mode = ?params.mode, "callback-menu step");

        let bundle = match self.catalog.lookup(CALLBACK_MENU_COLLECTION, &state.language) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(error = %e, "prompt lookup failed, returning hold music");
                return self.hold_music();
            }
        };

        let customer_phone = state
            .caller_number
            .as_deref()
            .map(derive_customer_phone)
            .unwrap_or_default();

        match state.mode {
            Some(DialogMode::CallbackMenu(CallbackMode::Main)) => {
                self.callback_main(&state, bundle, &customer_phone)
            }
            Some(DialogMode::CallbackMenu(CallbackMode::MainProcess)) => {
                self.callback_main_process(&state, bundle, &customer_phone)
            }
            Some(DialogMode::CallbackMenu(CallbackMode::NewNumber)) => {
                self.new_number(&state, bundle)
            }
            Some(DialogMode::CallbackMenu(CallbackMode::NewNumberProcess)) => {
                self.new_number_process(&state, bundle)
            }
            Some(DialogMode::CallbackMenu(CallbackMode::SubmitCallback)) => {
                self.submit_callback(&state, bundle).await
            }
            _ => {
                warn!(mode = ?params.mode, "unhandled callback-menu mode, returning hold music");
                self.hold_music()
            }
        }
    }

    //  main-menu states

    /// `main`: greeting (wait time and position, unless skipped) plus the
    /// press-1 gather over hold music
    async fn main_greeting(&self, state: &DialogState, bundle: &PromptBundle) -> VoiceScript {
        let mut script = VoiceScript::new();

        if !state.skip_greeting {
            let status = self.estimator.estimate(&state.call_sid, bundle).await;
            let mut greeting = String::new();
            if let Some(wait) = &status.wait_phrase {
                greeting.push_str(wait);
                greeting.push_str(". ");
            }
            if let Some(position) = &status.position_phrase {
                greeting.push_str(position);
                greeting.push_str(". ");
            }
            greeting.push_str(bundle.phrase(keys::INITIAL_GREETING));
            greeting.push('.');
            script.say(&state.voice, &state.language, greeting);
        }

        let action = state
            .continuation(
                &self.config.base_url,
                DialogMode::MainMenu(MainMenuMode::MainProcess),
            )
            .build();
        let mut gather = Gather::new(action, 1, self.config.menu_gather_timeout_secs);
        gather.say(
            &state.voice,
            &state.language,
            format!("{}.", bundle.phrase(keys::PRESS_ONE_FOR_MENU)),
        );
        gather.play(self.config.hold_music_url());
        script.gather(gather);
        script
    }

    /// `mainProcess`: `1` opens the options menu, anything else replays the
    /// greeting-less main state
    fn main_process(&self, state: &DialogState, bundle: &PromptBundle) -> VoiceScript {
        let mut script = VoiceScript::new();
        if state.digits.as_deref() == Some("1") {
            let action = state
                .continuation(
                    &self.config.base_url,
                    DialogMode::MainMenu(MainMenuMode::MenuProcess),
                )
                .build();
            let mut gather = Gather::new(action, 1, self.config.menu_gather_timeout_secs);
            gather.say(&state.voice, &state.language, bundle.phrase(keys::OPTIONS_MENU));
            gather.play(self.config.hold_music_url());
            script.gather(gather);
        } else {
            script.say(&state.voice, &state.language, bundle.phrase(keys::INVALID_ENTRY));
            script.redirect(
                state
                    .continuation(
                        &self.config.base_url,
                        DialogMode::MainMenu(MainMenuMode::Main),
                    )
                    .skip_greeting()
                    .build(),
            );
        }
        script
    }

    /// `menuProcess`: route the options-menu selection
    fn menu_process(&self, state: &DialogState, bundle: &PromptBundle) -> VoiceScript {
        let mut script = VoiceScript::new();
        match state.digits.as_deref().unwrap_or("") {
            // stay in queue
            "1" => {
                script.redirect(
                    state
                        .continuation(
                            &self.config.base_url,
                            DialogMode::MainMenu(MainMenuMode::Main),
                        )
                        .skip_greeting()
                        .build(),
                );
            }
            // request a callback
            "2" => {
                script.redirect(
                    state
                        .continuation(
                            &self.config.base_url,
                            DialogMode::CallbackMenu(CallbackMode::Main),
                        )
                        .build(),
                );
            }
            // leave a voicemail
            "3" => {
                script.redirect(voicemail_entry_url(
                    &self.config.base_url,
                    &state.language,
                    &state.voice,
                ));
            }
            // `*` and anything unrecognized replay the options menu
            _ => {
                script.say(&state.voice, &state.language, bundle.phrase(keys::INVALID_ENTRY));
                script.redirect(
                    state
                        .continuation(
                            &self.config.base_url,
                            DialogMode::MainMenu(MainMenuMode::MainProcess),
                        )
                        .digits("1")
                        .build(),
                );
            }
        }
        script
    }

    //  callback-menu states

    /// `main`: confirm the caller's own number or offer entering a new one
    fn callback_main(
        &self,
        state: &DialogState,
        bundle: &PromptBundle,
        customer_phone: &str,
    ) -> VoiceScript {
        let action = state
            .continuation(
                &self.config.base_url,
                DialogMode::CallbackMenu(CallbackMode::MainProcess),
            )
            .candidate_phone(customer_phone)
            .build();
        let mut gather = Gather::new(action, 1, self.config.callback_gather_timeout_secs);
        gather.say(&state.voice, &state.language, bundle.phrase(keys::CALLBACK_AT));
        gather.say_as(
            &state.voice,
            &state.language,
            Interpretation::Telephone,
            customer_phone,
        );
        gather.say(&state.voice, &state.language, bundle.phrase(keys::CONFIRM_PRESS_ONE));
        gather.say(&state.voice, &state.language, bundle.phrase(keys::CONFIRM_PRESS_TWO));

        let mut script = VoiceScript::new();
        script.gather(gather);
        script
    }

    /// `mainProcess`: `1` submits with the caller's own number, `2` captures
    /// a new number, anything else replays the confirmation menu
    fn callback_main_process(
        &self,
        state: &DialogState,
        bundle: &PromptBundle,
        customer_phone: &str,
    ) -> VoiceScript {
        let mut script = VoiceScript::new();
        match state.digits.as_deref().unwrap_or("") {
            "1" => {
                script.redirect(
                    state
                        .continuation(
                            &self.config.base_url,
                            DialogMode::CallbackMenu(CallbackMode::SubmitCallback),
                        )
                        .candidate_phone(customer_phone)
                        .build(),
                );
            }
            "2" => {
                let action = state
                    .continuation(
                        &self.config.base_url,
                        DialogMode::CallbackMenu(CallbackMode::NewNumber),
                    )
                    .build();
                let mut gather =
                    Gather::new(action, 10, self.config.callback_gather_timeout_secs)
                        .finish_on_key('#');
                gather.say(&state.voice, &state.language, bundle.phrase(keys::ENTER_NUMBER));
                script.gather(gather);
            }
            _ => {
                script.say(&state.voice, &state.language, bundle.phrase(keys::INVALID_ENTRY));
                script.redirect(
                    state
                        .continuation(
                            &self.config.base_url,
                            DialogMode::CallbackMenu(CallbackMode::Main),
                        )
                        .build(),
                );
            }
        }
        script
    }

    /// `newNumber`: read the captured digits back and gather a confirmation
    fn new_number(&self, state: &DialogState, bundle: &PromptBundle) -> VoiceScript {
        let captured = state.digits.as_deref().unwrap_or("");

        let action = state
            .continuation(
                &self.config.base_url,
                DialogMode::CallbackMenu(CallbackMode::NewNumberProcess),
            )
            .candidate_phone(captured)
            .build();
        let mut gather = Gather::new(action, 1, self.config.callback_gather_timeout_secs)
            .finish_on_key('#');
        gather.say(&state.voice, &state.language, bundle.phrase(keys::YOU_ENTERED));
        gather.say_as(
            &state.voice,
            &state.language,
            Interpretation::Telephone,
            captured,
        );
        gather.say(
            &state.voice,
            &state.language,
            bundle.phrase(keys::NEW_NUMBER_PRESS_ONE),
        );
        gather.say(
            &state.voice,
            &state.language,
            bundle.phrase(keys::NEW_NUMBER_PRESS_TWO),
        );
        gather.say(
            &state.voice,
            &state.language,
            bundle.phrase(keys::NEW_NUMBER_PRESS_STAR),
        );

        let mut script = VoiceScript::new();
        script.gather(gather);
        script
    }

    /// `newNumberProcess`: `1` submits the captured number, `2` re-enters,
    /// `*` abandons the callback flow, anything else replays the
    /// confirmation with the captured number preserved
    fn new_number_process(&self, state: &DialogState, bundle: &PromptBundle) -> VoiceScript {
        let mut script = VoiceScript::new();
        let candidate = state.candidate_phone.as_deref().unwrap_or("");
        match state.digits.as_deref().unwrap_or("") {
            "1" => {
                script.redirect(
                    state
                        .continuation(
                            &self.config.base_url,
                            DialogMode::CallbackMenu(CallbackMode::SubmitCallback),
                        )
                        .candidate_phone(candidate)
                        .build(),
                );
            }
            // re-enter: back through mainProcess as if "2" had been pressed
            "2" => {
                script.redirect(
                    state
                        .continuation(
                            &self.config.base_url,
                            DialogMode::CallbackMenu(CallbackMode::MainProcess),
                        )
                        .digits("2")
                        .build(),
                );
            }
            // abandon the callback flow
            "*" => {
                script.redirect(
                    state
                        .continuation(
                            &self.config.base_url,
                            DialogMode::MainMenu(MainMenuMode::Main),
                        )
                        .skip_greeting()
                        .build(),
                );
            }
            _ => {
                script.say(&state.voice, &state.language, bundle.phrase(keys::INVALID_ENTRY));
                script.redirect(
                    state
                        .continuation(
                            &self.config.base_url,
                            DialogMode::CallbackMenu(CallbackMode::NewNumber),
                        )
                        .digits(candidate)
                        .build(),
                );
            }
        }
        script
    }

    /// `submitCallback`: run the task transition, then always speak the
    /// confirmation and hang up. Failures are logged, never spoken; the
    /// caller-facing behavior stays optimistic.
    async fn submit_callback(&self, state: &DialogState, bundle: &PromptBundle) -> VoiceScript {
        let candidate = state.candidate_phone.as_deref().unwrap_or("");
        match format_callback_number(candidate) {
            Ok(phone) => {
                if let Err(e) = self.callbacks.submit(&state.call_sid, &phone).await {
                    debug!(
                        call_sid = %state.call_sid,
                        error = %e,
                        "callback submission failed, confirmation still played"
                    );
                }
            }
            Err(e) => {
                error!(
                    call_sid = %state.call_sid,
                    error = %e,
                    "callback number invalid, no task submitted"
                );
            }
        }

        let mut script = VoiceScript::new();
        script.say(&state.voice, &state.language, bundle.phrase(keys::CALLBACK_DELIVERED));
        script.say(
            &state.voice,
            &state.language,
            bundle.phrase(keys::CALLBACK_SPECIALIST),
        );
        script.say(
            &state.voice,
            &state.language,
            bundle.phrase(keys::CALLBACK_THANK_YOU),
        );
        script.hangup();
        script
    }

    /// Fallback script: hold music, no further gathering
    fn hold_music(&self) -> VoiceScript {
        let mut script = VoiceScript::new();
        script.play(self.config.hold_music_url());
        script
    }
}
