//! Call-control script model
//!
//! The declarative response a dialog step hands back to the telephony
//! platform: an ordered sequence of directives (speak, gather, play,
//! redirect, hangup). The engine builds [`VoiceScript`] values; the transport
//! renders them as TwiML-compatible XML with [`VoiceScript::to_xml`]. Every
//! dialog step emits exactly one script, never a bare error.

use std::fmt::Write as _;

/// How spoken text should be interpreted by the TTS engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpretation {
    /// Read the text digit by digit as a phone number
    Telephone,
}

impl Interpretation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpretation::Telephone => "telephone",
        }
    }
}

/// One directive in a call-control script
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Speak text with the given voice and language
    Say {
        text: String,
        voice: String,
        language: String,
    },
    /// Speak text under a specific interpretation (e.g. a phone number)
    SayAs {
        text: String,
        interpret_as: Interpretation,
        voice: String,
        language: String,
    },
    /// Collect DTMF digits, speaking/playing the nested directives while
    /// waiting; the platform re-invokes the action URL with the result
    Gather(Gather),
    /// Play a media asset
    Play { url: String },
    /// Re-invoke the dialog at another continuation URL
    Redirect { url: String },
    /// End the call
    Hangup,
}

/// A DTMF input gather with nested prompt directives
#[derive(Debug, Clone, PartialEq)]
pub struct Gather {
    pub num_digits: u8,
    pub timeout_secs: u32,
    pub finish_on_key: Option<char>,
    pub action_url: String,
    pub children: Vec<Directive>,
}

impl Gather {
    pub fn new(action_url: impl Into<String>, num_digits: u8, timeout_secs: u32) -> Self {
        Self {
            num_digits,
            timeout_secs,
            finish_on_key: None,
            action_url: action_url.into(),
            children: Vec::new(),
        }
    }

    /// Terminate input early when the caller presses the given key
    pub fn finish_on_key(mut self, key: char) -> Self {
        self.finish_on_key = Some(key);
        self
    }

    /// Nest a spoken prompt inside the gather
    pub fn say(&mut self, voice: &str, language: &str, text: impl Into<String>) {
        self.children.push(Directive::Say {
            text: text.into(),
            voice: voice.to_string(),
            language: language.to_string(),
        });
    }

    /// Nest a spoken prompt with an interpretation hint inside the gather
    pub fn say_as(
        &mut self,
        voice: &str,
        language: &str,
        interpret_as: Interpretation,
        text: impl Into<String>,
    ) {
        self.children.push(Directive::SayAs {
            text: text.into(),
            interpret_as,
            voice: voice.to_string(),
            language: language.to_string(),
        });
    }

    /// Nest a media asset inside the gather
    pub fn play(&mut self, url: impl Into<String>) {
        self.children.push(Directive::Play { url: url.into() });
    }
}

/// An ordered call-control script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceScript {
    directives: Vec<Directive>,
}

impl VoiceScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(&mut self, voice: &str, language: &str, text: impl Into<String>) {
        self.directives.push(Directive::Say {
            text: text.into(),
            voice: voice.to_string(),
            language: language.to_string(),
        });
    }

    pub fn say_as(
        &mut self,
        voice: &str,
        language: &str,
        interpret_as: Interpretation,
        text: impl Into<String>,
    ) {
        self.directives.push(Directive::SayAs {
            text: text.into(),
            interpret_as,
            voice: voice.to_string(),
            language: language.to_string(),
        });
    }

    pub fn gather(&mut self, gather: Gather) {
        self.directives.push(Directive::Gather(gather));
    }

    pub fn play(&mut self, url: impl Into<String>) {
        self.directives.push(Directive::Play { url: url.into() });
    }

    pub fn redirect(&mut self, url: impl Into<String>) {
        self.directives.push(Directive::Redirect { url: url.into() });
    }

    pub fn hangup(&mut self) {
        self.directives.push(Directive::Hangup);
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// URL of the first redirect directive, if any. Convenience for tests and
    /// transports that inspect where a step sends the caller next.
    pub fn redirect_url(&self) -> Option<&str> {
        self.directives.iter().find_map(|d| match d {
            Directive::Redirect { url } => Some(url.as_str()),
            _ => None,
        })
    }

    /// All spoken text in document order, including text nested in gathers
    pub fn spoken_text(&self) -> Vec<&str> {
        fn collect<'a>(directives: &'a [Directive], out: &mut Vec<&'a str>) {
            for directive in directives {
                match directive {
                    Directive::Say { text, .. } | Directive::SayAs { text, .. } => {
                        out.push(text.as_str())
                    }
                    Directive::Gather(g) => collect(&g.children, out),
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.directives, &mut out);
        out
    }

    /// Render the script as TwiML-compatible XML
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
        for directive in &self.directives {
            render_directive(&mut xml, directive);
        }
        xml.push_str("</Response>");
        xml
    }
}

fn render_directive(xml: &mut String, directive: &Directive) {
    match directive {
        Directive::Say {
            text,
            voice,
            language,
        } => {
            let _ = write!(
                xml,
                "<Say voice=\"{}\" language=\"{}\">{}</Say>",
                escape(voice),
                escape(language),
                escape(text)
            );
        }
        Directive::SayAs {
            text,
            interpret_as,
            voice,
            language,
        } => {
            let _ = write!(
                xml,
                "<Say voice=\"{}\" language=\"{}\"><say-as interpret-as=\"{}\">{}</say-as></Say>",
                escape(voice),
                escape(language),
                interpret_as.as_str(),
                escape(text)
            );
        }
        Directive::Gather(gather) => {
            let _ = write!(
                xml,
                "<Gather input=\"dtmf\" numDigits=\"{}\" timeout=\"{}\"",
                gather.num_digits, gather.timeout_secs
            );
            if let Some(key) = gather.finish_on_key {
                let _ = write!(xml, " finishOnKey=\"{}\"", key);
            }
            let _ = write!(xml, " action=\"{}\">", escape(&gather.action_url));
            for child in &gather.children {
                render_directive(xml, child);
            }
            xml.push_str("</Gather>");
        }
        Directive::Play { url } => {
            let _ = write!(xml, "<Play>{}</Play>", escape(url));
        }
        Directive::Redirect { url } => {
            let _ = write!(xml, "<Redirect>{}</Redirect>", escape(url));
        }
        Directive::Hangup => xml.push_str("<Hangup/>"),
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
