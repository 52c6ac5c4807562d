//! Localized voice prompt catalog
//!
//! Maps a (collection, language) pair to an immutable phrase bundle. The
//! catalog is built once at process start and never mutated afterwards; every
//! dialog step reads from the same shared instance. A missing bundle is an
//! explicit [`QueueEngineError::PromptNotFound`], never a silent default;
//! callers fall back to hold music.
//!
//! Phrase keys are defined as constants in [`keys`] so the dialog code and
//! the bundles cannot drift apart silently.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{QueueEngineError, Result};

/// Phrase collection for the main in-queue menu
pub const MAIN_MENU_COLLECTION: &str = "voice-queue.main-menu";

/// Phrase collection for the callback menu
pub const CALLBACK_MENU_COLLECTION: &str = "voice-queue.callback-menu";

/// Phrase keys used by the dialog flows
pub mod keys {
    // Main menu collection
    pub const WAIT_PREFIX: &str = "wait_prefix";
    pub const WAIT_UNDER_ONE: &str = "wait_under_one";
    pub const WAIT_UNDER_TWO: &str = "wait_under_two";
    pub const WAIT_UNDER_THREE: &str = "wait_under_three";
    pub const WAIT_UNDER_FOUR: &str = "wait_under_four";
    pub const WAIT_OVER_FOUR: &str = "wait_over_four";
    pub const POSITION_NEXT: &str = "position_next";
    pub const POSITION_PREFIX_ONE: &str = "position_prefix_one";
    pub const POSITION_PREFIX_MANY: &str = "position_prefix_many";
    pub const POSITION_PREFIX_MAX: &str = "position_prefix_max";
    pub const POSITION_SUFFIX_ONE: &str = "position_suffix_one";
    pub const POSITION_SUFFIX_MANY: &str = "position_suffix_many";
    pub const INITIAL_GREETING: &str = "initial_greeting";
    pub const PRESS_ONE_FOR_MENU: &str = "press_one_for_menu";
    pub const OPTIONS_MENU: &str = "options_menu";
    pub const INVALID_ENTRY: &str = "invalid_entry";

    // Callback menu collection (INVALID_ENTRY is shared)
    pub const CALLBACK_AT: &str = "callback_at";
    pub const CONFIRM_PRESS_ONE: &str = "confirm_press_one";
    pub const CONFIRM_PRESS_TWO: &str = "confirm_press_two";
    pub const ENTER_NUMBER: &str = "enter_number";
    pub const YOU_ENTERED: &str = "you_entered";
    pub const NEW_NUMBER_PRESS_ONE: &str = "new_number_press_one";
    pub const NEW_NUMBER_PRESS_TWO: &str = "new_number_press_two";
    pub const NEW_NUMBER_PRESS_STAR: &str = "new_number_press_star";
    pub const CALLBACK_DELIVERED: &str = "callback_delivered";
    pub const CALLBACK_SPECIALIST: &str = "callback_specialist";
    pub const CALLBACK_THANK_YOU: &str = "callback_thank_you";
}

/// Immutable phrase bundle for one collection in one language
#[derive(Debug, Clone)]
pub struct PromptBundle {
    collection: &'static str,
    language: &'static str,
    phrases: HashMap<&'static str, &'static str>,
}

impl PromptBundle {
    fn new(
        collection: &'static str,
        language: &'static str,
        entries: &[(&'static str, &'static str)],
    ) -> Self {
        Self {
            collection,
            language,
            phrases: entries.iter().copied().collect(),
        }
    }

    /// Language tag this bundle was built for
    pub fn language(&self) -> &str {
        self.language
    }

    /// Look up a phrase by key.
    ///
    /// A missing key is a programming error (the builtin bundles carry every
    /// key the dialogs reference); it is logged and rendered as an empty
    /// phrase rather than failing the step.
    pub fn phrase(&self, key: &str) -> &'static str {
        match self.phrases.get(key) {
            Some(text) => text,
            None => {
                warn!(
                    collection = self.collection,
                    language = self.language,
                    key, "missing phrase key in bundle"
                );
                ""
            }
        }
    }
}

/// Process-wide, read-only catalog of phrase bundles
#[derive(Debug)]
pub struct PromptCatalog {
    bundles: HashMap<(&'static str, &'static str), PromptBundle>,
}

impl PromptCatalog {
    /// Build the catalog with the built-in en-US and es-US bundles
    pub fn builtin() -> Self {
        let mut bundles = HashMap::new();
        for bundle in builtin_bundles() {
            bundles.insert((bundle.collection, bundle.language), bundle);
        }
        Self { bundles }
    }

    /// Look up the bundle for a collection and language.
    ///
    /// Fails explicitly when the pair is absent; there is no language
    /// fallback here, the caller decides how to degrade.
    pub fn lookup(&self, collection: &str, language: &str) -> Result<&PromptBundle> {
        self.bundles
            .iter()
            .find(|((c, l), _)| *c == collection && *l == language)
            .map(|(_, bundle)| bundle)
            .ok_or_else(|| QueueEngineError::prompt_not_found(collection, language))
    }
}

fn builtin_bundles() -> Vec<PromptBundle> {
    use keys::*;

    vec![
        PromptBundle::new(
            MAIN_MENU_COLLECTION,
            "en-US",
            &[
                (WAIT_PREFIX, "The estimated wait time is"),
                (WAIT_UNDER_ONE, "less than a minute"),
                (WAIT_UNDER_TWO, "less than two minutes"),
                (WAIT_UNDER_THREE, "less than three minutes"),
                (WAIT_UNDER_FOUR, "less than four minutes"),
                (WAIT_OVER_FOUR, "longer than four minutes"),
                (POSITION_NEXT, "Your call is next in queue"),
                (POSITION_PREFIX_ONE, "There is"),
                (POSITION_PREFIX_MANY, "There are"),
                (POSITION_PREFIX_MAX, "There are more than"),
                (POSITION_SUFFIX_ONE, "caller ahead of you"),
                (POSITION_SUFFIX_MANY, "callers ahead of you"),
                (
                    INITIAL_GREETING,
                    "Please wait while we direct your call to the next available specialist",
                ),
                (
                    PRESS_ONE_FOR_MENU,
                    "To listen to a menu of options while on hold, press 1 at anytime",
                ),
                (
                    OPTIONS_MENU,
                    "The following options are available. \
                     Press 1 to remain on hold. \
                     Press 2 to request a callback. \
                     Press 3 to leave a voicemail message for the care team. \
                     Press the star key to listen to these options again.",
                ),
                (INVALID_ENTRY, "I did not understand your selection."),
            ],
        ),
        PromptBundle::new(
            MAIN_MENU_COLLECTION,
            "es-US",
            &[
                (WAIT_PREFIX, "El tiempo de espera estimado es"),
                (WAIT_UNDER_ONE, "inferior a un minuto"),
                (WAIT_UNDER_TWO, "inferior a dos minutos"),
                (WAIT_UNDER_THREE, "inferior a tres minutos"),
                (WAIT_UNDER_FOUR, "inferior a cuatro minutos"),
                (WAIT_OVER_FOUR, "superior a cuatro minutos"),
                (POSITION_NEXT, "Tu llamada es la siguiente en la cola"),
                (POSITION_PREFIX_ONE, "Hay"),
                (POSITION_PREFIX_MANY, "Hay"),
                (POSITION_PREFIX_MAX, "Hay mas que"),
                (POSITION_SUFFIX_ONE, "persona que llama por delante"),
                (POSITION_SUFFIX_MANY, "personas que llaman por delante"),
                (
                    INITIAL_GREETING,
                    "Espere mientras dirigimos su llamada al siguiente especialista disponible",
                ),
                (
                    PRESS_ONE_FOR_MENU,
                    "Para escuchar un menú de opciones mientras está en espera, presione 1 en cualquier momento",
                ),
                (
                    OPTIONS_MENU,
                    "Las siguientes opciones están disponibles. \
                     Presione 1 para permanecer en espera. \
                     Presione 2 para solicitar una devolución de llamada. \
                     Presione 3 para dejar un mensaje de correo de voz para el equipo de atención. \
                     Presione la tecla asterisco para escuchar estas opciones nuevamente.",
                ),
                (INVALID_ENTRY, "No entendi tu seleccion."),
            ],
        ),
        PromptBundle::new(
            CALLBACK_MENU_COLLECTION,
            "en-US",
            &[
                (CALLBACK_AT, "You have requested a callback at, "),
                (CONFIRM_PRESS_ONE, "If this is correct, press 1"),
                (CONFIRM_PRESS_TWO, "Press 2 to be called at a different number"),
                (
                    ENTER_NUMBER,
                    "Using your keypad, enter in your phone number... \
                     Press the pound sign when you are done...",
                ),
                (YOU_ENTERED, "You entered, "),
                (NEW_NUMBER_PRESS_ONE, "Press 1 if this is correct"),
                (NEW_NUMBER_PRESS_TWO, "Press 2 to re-enter your number"),
                (
                    NEW_NUMBER_PRESS_STAR,
                    "Press the star key to return to the main menu",
                ),
                (CALLBACK_DELIVERED, "Your callback has been delivered..."),
                (
                    CALLBACK_SPECIALIST,
                    "An available care specialist will reach out to contact you...",
                ),
                (CALLBACK_THANK_YOU, "Thank you for your call."),
                (INVALID_ENTRY, "I did not understand your selection."),
            ],
        ),
        PromptBundle::new(
            CALLBACK_MENU_COLLECTION,
            "es-US",
            &[
                (CALLBACK_AT, "Ha solicitado una devolución de llamada al, "),
                (CONFIRM_PRESS_ONE, "Si es correcto, presione 1"),
                (
                    CONFIRM_PRESS_TWO,
                    "Presione 2 para recibir la llamada en otro número",
                ),
                (
                    ENTER_NUMBER,
                    "Usando su teclado, ingrese su número de teléfono... \
                     Presione la tecla numeral cuando termine...",
                ),
                (YOU_ENTERED, "Usted ingresó, "),
                (NEW_NUMBER_PRESS_ONE, "Presione 1 si es correcto"),
                (NEW_NUMBER_PRESS_TWO, "Presione 2 para volver a ingresar su número"),
                (
                    NEW_NUMBER_PRESS_STAR,
                    "Presione la tecla asterisco para regresar al menú principal",
                ),
                (
                    CALLBACK_DELIVERED,
                    "Su devolución de llamada ha sido registrada...",
                ),
                (
                    CALLBACK_SPECIALIST,
                    "Un especialista disponible se comunicará con usted...",
                ),
                (CALLBACK_THANK_YOU, "Gracias por su llamada."),
                (INVALID_ENTRY, "No entendi tu seleccion."),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_success() {
        let catalog = PromptCatalog::builtin();
        let bundle = catalog
            .lookup(MAIN_MENU_COLLECTION, "en-US")
            .expect("en-US main menu bundle should exist");
        assert_eq!(bundle.phrase(keys::WAIT_UNDER_ONE), "less than a minute");
        assert_eq!(bundle.language(), "en-US");
    }

    #[test]
    fn test_lookup_not_found() {
        let catalog = PromptCatalog::builtin();
        match catalog.lookup(MAIN_MENU_COLLECTION, "fr-FR") {
            Err(QueueEngineError::PromptNotFound { collection, language }) => {
                assert_eq!(collection, MAIN_MENU_COLLECTION);
                assert_eq!(language, "fr-FR");
            }
            other => panic!("Expected prompt-not-found error, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_all_dialog_keys_present_in_both_languages() {
        let main_menu_keys = [
            keys::WAIT_PREFIX,
            keys::WAIT_UNDER_ONE,
            keys::WAIT_UNDER_TWO,
            keys::WAIT_UNDER_THREE,
            keys::WAIT_UNDER_FOUR,
            keys::WAIT_OVER_FOUR,
            keys::POSITION_NEXT,
            keys::POSITION_PREFIX_ONE,
            keys::POSITION_PREFIX_MANY,
            keys::POSITION_PREFIX_MAX,
            keys::POSITION_SUFFIX_ONE,
            keys::POSITION_SUFFIX_MANY,
            keys::INITIAL_GREETING,
            keys::PRESS_ONE_FOR_MENU,
            keys::OPTIONS_MENU,
            keys::INVALID_ENTRY,
        ];
        let callback_keys = [
            keys::CALLBACK_AT,
            keys::CONFIRM_PRESS_ONE,
            keys::CONFIRM_PRESS_TWO,
            keys::ENTER_NUMBER,
            keys::YOU_ENTERED,
            keys::NEW_NUMBER_PRESS_ONE,
            keys::NEW_NUMBER_PRESS_TWO,
            keys::NEW_NUMBER_PRESS_STAR,
            keys::CALLBACK_DELIVERED,
            keys::CALLBACK_SPECIALIST,
            keys::CALLBACK_THANK_YOU,
            keys::INVALID_ENTRY,
        ];

        let catalog = PromptCatalog::builtin();
        for language in ["en-US", "es-US"] {
            let bundle = catalog.lookup(MAIN_MENU_COLLECTION, language).unwrap();
            for key in main_menu_keys {
                assert!(!bundle.phrase(key).is_empty(), "{language} missing {key}");
            }
            let bundle = catalog.lookup(CALLBACK_MENU_COLLECTION, language).unwrap();
            for key in callback_keys {
                assert!(!bundle.phrase(key).is_empty(), "{language} missing {key}");
            }
        }
    }
}
