//! Typed dialog continuation state
//!
//! The protocol is stateless: the only memory between dialog steps is the
//! continuation URL the previous step emitted. This module is the boundary
//! where that memory is made typed: inbound parameters decode into a
//! [`DialogState`], and the state machine encodes the next step's parameters
//! back into a continuation URL. The FSM itself never touches raw query
//! strings.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::config::QueueEngineConfig;

/// Webhook path of the main in-queue menu flow
pub const MAIN_MENU_PATH: &str = "/voice-queue/main-menu";

/// Webhook path of the callback menu flow
pub const CALLBACK_MENU_PATH: &str = "/voice-queue/callback-menu";

/// Webhook path of the voicemail flow (external collaborator; only redirected
/// into, never handled here)
pub const VOICEMAIL_MENU_PATH: &str = "/voice-queue/voicemail-menu";

/// Raw inbound step parameters, exactly as the telephony platform sends them
/// (query string on redirects, form body on gather results). All optional;
/// absent values default per state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepParams {
    #[serde(rename = "CallSid", default, skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,

    #[serde(rename = "Digits", default, skip_serializing_if = "Option::is_none")]
    pub digits: Option<String>,

    #[serde(rename = "From", default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    #[serde(rename = "cbPhone", default, skip_serializing_if = "Option::is_none")]
    pub candidate_phone: Option<String>,

    #[serde(
        rename = "skipGreeting",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub skip_greeting: Option<String>,
}

impl StepParams {
    /// Overlay `other` on top of `self`; set fields in `other` win. Used by
    /// transports that receive parameters both in the URL and in the body.
    pub fn merged(self, other: StepParams) -> StepParams {
        StepParams {
            call_sid: other.call_sid.or(self.call_sid),
            digits: other.digits.or(self.digits),
            from: other.from.or(self.from),
            mode: other.mode.or(self.mode),
            language: other.language.or(self.language),
            voice: other.voice.or(self.voice),
            candidate_phone: other.candidate_phone.or(self.candidate_phone),
            skip_greeting: other.skip_greeting.or(self.skip_greeting),
        }
    }
}

/// States of the main in-queue menu flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainMenuMode {
    /// Greeting (wait time, position) plus the press-1 gather
    Main,
    /// Handle the press-1 result; open the options menu
    MainProcess,
    /// Handle the options menu selection
    MenuProcess,
}

impl MainMenuMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MainMenuMode::Main => "main",
            MainMenuMode::MainProcess => "mainProcess",
            MainMenuMode::MenuProcess => "menuProcess",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "main" => Some(MainMenuMode::Main),
            "mainProcess" => Some(MainMenuMode::MainProcess),
            "menuProcess" => Some(MainMenuMode::MenuProcess),
            _ => None,
        }
    }
}

/// States of the callback menu flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackMode {
    /// Confirm the caller's own number or choose a new one
    Main,
    /// Handle the confirmation selection
    MainProcess,
    /// Read back a newly captured number and ask for confirmation
    NewNumber,
    /// Handle the new-number confirmation selection
    NewNumberProcess,
    /// Perform the task transition and end the call
    SubmitCallback,
}

impl CallbackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackMode::Main => "main",
            CallbackMode::MainProcess => "mainProcess",
            CallbackMode::NewNumber => "newNumber",
            CallbackMode::NewNumberProcess => "newNumberProcess",
            CallbackMode::SubmitCallback => "submitCallback",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "main" => Some(CallbackMode::Main),
            "mainProcess" => Some(CallbackMode::MainProcess),
            "newNumber" => Some(CallbackMode::NewNumber),
            "newNumberProcess" => Some(CallbackMode::NewNumberProcess),
            "submitCallback" => Some(CallbackMode::SubmitCallback),
            _ => None,
        }
    }
}

/// A dialog state across both flows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    MainMenu(MainMenuMode),
    CallbackMenu(CallbackMode),
}

impl DialogMode {
    pub fn path(&self) -> &'static str {
        match self {
            DialogMode::MainMenu(_) => MAIN_MENU_PATH,
            DialogMode::CallbackMenu(_) => CALLBACK_MENU_PATH,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DialogMode::MainMenu(mode) => mode.as_str(),
            DialogMode::CallbackMenu(mode) => mode.as_str(),
        }
    }
}

/// Which flow a decoded step belongs to (implied by the webhook path)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuFlow {
    MainMenu,
    CallbackMenu,
}

/// Typed per-step dialog state, reconstructed from inbound parameters.
///
/// `mode` is `None` when the inbound mode string is absent or unrecognized
/// for the flow; the controller answers that with hold music.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogState {
    pub mode: Option<DialogMode>,
    pub call_sid: String,
    pub caller_number: Option<String>,
    pub digits: Option<String>,
    pub candidate_phone: Option<String>,
    pub language: String,
    pub voice: String,
    pub skip_greeting: bool,
}

impl DialogState {
    /// Decode inbound parameters for the given flow, filling voice/language
    /// defaults from the configuration
    pub fn from_params(flow: MenuFlow, params: &StepParams, config: &QueueEngineConfig) -> Self {
        let mode = params.mode.as_deref().and_then(|raw| match flow {
            MenuFlow::MainMenu => MainMenuMode::parse(raw).map(DialogMode::MainMenu),
            MenuFlow::CallbackMenu => CallbackMode::parse(raw).map(DialogMode::CallbackMenu),
        });
        Self {
            mode,
            call_sid: params.call_sid.clone().unwrap_or_default(),
            caller_number: params.from.clone(),
            digits: params.digits.clone(),
            candidate_phone: params.candidate_phone.clone(),
            language: params
                .language
                .clone()
                .unwrap_or_else(|| config.default_language.clone()),
            voice: params
                .voice
                .clone()
                .unwrap_or_else(|| config.default_voice.clone()),
            skip_greeting: params.skip_greeting.as_deref() == Some("true"),
        }
    }

    /// Start building the continuation URL for a next state, carrying this
    /// step's language and voice forward
    pub fn continuation(&self, base_url: &str, mode: DialogMode) -> ContinuationUrl {
        ContinuationUrl::new(base_url, mode)
            .param("language", &self.language)
            .param("voice", &self.voice)
    }
}

/// Builder for continuation URLs; every parameter value is form-encoded
#[derive(Debug, Clone)]
pub struct ContinuationUrl {
    base_url: String,
    path: &'static str,
    params: Vec<(&'static str, String)>,
}

impl ContinuationUrl {
    pub fn new(base_url: &str, mode: DialogMode) -> Self {
        Self {
            base_url: base_url.to_string(),
            path: mode.path(),
            params: vec![("mode", mode.as_str().to_string())],
        }
    }

    pub fn param(mut self, key: &'static str, value: &str) -> Self {
        self.params.push((key, value.to_string()));
        self
    }

    /// Carry a digit string to the next state
    pub fn digits(self, digits: &str) -> Self {
        self.param("Digits", digits)
    }

    /// Carry a candidate callback number to the next state
    pub fn candidate_phone(self, phone: &str) -> Self {
        self.param("cbPhone", phone)
    }

    /// Ask the next `main` state not to repeat the greeting
    pub fn skip_greeting(self) -> Self {
        self.param("skipGreeting", "true")
    }

    pub fn build(&self) -> String {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();
        format!("{}{}?{}", self.base_url, self.path, query)
    }
}

/// Continuation URL into the external voicemail flow
pub fn voicemail_entry_url(base_url: &str, language: &str, voice: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("mode", "pre-process")
        .append_pair("language", language)
        .append_pair("voice", voice)
        .finish();
    format!("{base_url}{VOICEMAIL_MENU_PATH}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QueueEngineConfig {
        let mut config = QueueEngineConfig::default();
        config.base_url = "https://voice.example.com".to_string();
        config
    }

    /// Decode a continuation URL's query string back into StepParams, the way
    /// the transport would on the next step.
    fn decode_query(url: &str) -> StepParams {
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
        let mut params = StepParams::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "mode" => params.mode = Some(value),
                "language" => params.language = Some(value),
                "voice" => params.voice = Some(value),
                "Digits" => params.digits = Some(value),
                "cbPhone" => params.candidate_phone = Some(value),
                "skipGreeting" => params.skip_greeting = Some(value),
                _ => {}
            }
        }
        params
    }

    #[test]
    fn test_mode_parse_round_trip() {
        for mode in [
            MainMenuMode::Main,
            MainMenuMode::MainProcess,
            MainMenuMode::MenuProcess,
        ] {
            assert_eq!(MainMenuMode::parse(mode.as_str()), Some(mode));
        }
        for mode in [
            CallbackMode::Main,
            CallbackMode::MainProcess,
            CallbackMode::NewNumber,
            CallbackMode::NewNumberProcess,
            CallbackMode::SubmitCallback,
        ] {
            assert_eq!(CallbackMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(MainMenuMode::parse("submitCallback"), None);
        assert_eq!(CallbackMode::parse("menuProcess"), None);
    }

    #[test]
    fn test_state_decoding_defaults() {
        let params = StepParams {
            call_sid: Some("CA123".to_string()),
            mode: Some("main".to_string()),
            ..StepParams::default()
        };
        let state = DialogState::from_params(MenuFlow::MainMenu, &params, &config());

        assert_eq!(state.mode, Some(DialogMode::MainMenu(MainMenuMode::Main)));
        assert_eq!(state.language, "en-US");
        assert_eq!(state.voice, "Polly.Joanna");
        assert!(!state.skip_greeting);
        assert_eq!(state.digits, None);
    }

    #[test]
    fn test_unrecognized_mode_decodes_to_none() {
        let params = StepParams {
            mode: Some("bogus".to_string()),
            ..StepParams::default()
        };
        let state = DialogState::from_params(MenuFlow::MainMenu, &params, &config());
        assert_eq!(state.mode, None);

        // A valid mode for the wrong flow is just as unrecognized.
        let params = StepParams {
            mode: Some("submitCallback".to_string()),
            ..StepParams::default()
        };
        let state = DialogState::from_params(MenuFlow::MainMenu, &params, &config());
        assert_eq!(state.mode, None);
    }

    #[test]
    fn test_continuation_round_trip() {
        let config = config();
        let params = StepParams {
            call_sid: Some("CA123".to_string()),
            language: Some("es-US".to_string()),
            voice: Some("Polly.Lupe".to_string()),
            ..StepParams::default()
        };
        let state = DialogState::from_params(MenuFlow::CallbackMenu, &params, &config);

        let url = state
            .continuation(
                &config.base_url,
                DialogMode::CallbackMenu(CallbackMode::SubmitCallback),
            )
            .candidate_phone("3035551212")
            .build();

        assert!(url.starts_with("https://voice.example.com/voice-queue/callback-menu?"));
        let decoded = decode_query(&url);
        assert_eq!(decoded.mode.as_deref(), Some("submitCallback"));
        assert_eq!(decoded.language.as_deref(), Some("es-US"));
        assert_eq!(decoded.voice.as_deref(), Some("Polly.Lupe"));
        assert_eq!(decoded.candidate_phone.as_deref(), Some("3035551212"));
    }

    #[test]
    fn test_digit_strings_are_encoded() {
        let config = config();
        let state = DialogState::from_params(MenuFlow::MainMenu, &StepParams::default(), &config);

        let url = state
            .continuation(
                &config.base_url,
                DialogMode::MainMenu(MainMenuMode::MainProcess),
            )
            .digits("*#")
            .build();

        assert!(url.contains("Digits=*%23") || url.contains("Digits=%2A%23"));
        assert_eq!(decode_query(&url).digits.as_deref(), Some("*#"));
    }

    #[test]
    fn test_skip_greeting_param() {
        let config = config();
        let state = DialogState::from_params(MenuFlow::MainMenu, &StepParams::default(), &config);
        let url = state
            .continuation(&config.base_url, DialogMode::MainMenu(MainMenuMode::Main))
            .skip_greeting()
            .build();

        let decoded = decode_query(&url);
        let next = DialogState::from_params(MenuFlow::MainMenu, &decoded, &config);
        assert!(next.skip_greeting);
    }

    #[test]
    fn test_params_merged_prefers_body() {
        let query = StepParams {
            mode: Some("mainProcess".to_string()),
            digits: None,
            language: Some("en-US".to_string()),
            ..StepParams::default()
        };
        let body = StepParams {
            call_sid: Some("CA123".to_string()),
            digits: Some("1".to_string()),
            ..StepParams::default()
        };

        let merged = query.merged(body);
        assert_eq!(merged.mode.as_deref(), Some("mainProcess"));
        assert_eq!(merged.digits.as_deref(), Some("1"));
        assert_eq!(merged.call_sid.as_deref(), Some("CA123"));
        assert_eq!(merged.language.as_deref(), Some("en-US"));
    }

    #[test]
    fn test_voicemail_entry_url() {
        let url = voicemail_entry_url("https://voice.example.com", "en-US", "Polly.Joanna");
        assert!(url.starts_with("https://voice.example.com/voice-queue/voicemail-menu?"));
        assert!(url.contains("mode=pre-process"));
    }
}
