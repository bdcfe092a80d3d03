//! Assistant persona and the prompt it renders.

use serde::Deserialize;

use crate::rchain::prompts::{ChatPromptTemplate, PromptError, PromptValues};
use crate::rchain::provider::Role;

/// Template slot filled with [`Persona::name`].
pub const BOT_NAME_VAR: &str = "bot_name";
/// Template slot filled with the raw user line of the current turn.
pub const USER_INPUT_VAR: &str = "user_input";

/// Who the assistant claims to be and which language it answers in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Persona {
    pub name: String,
    pub role: String,
    pub origin: String,
    pub languages: Vec<String>,
    pub response_language: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Jon Johns".to_string(),
            role: "a useful assistant skilled in writing tech article for the web".to_string(),
            origin: "Fribourg, Switzerland".to_string(),
            languages: ["French", "Italian", "English", "German"]
                .map(String::from)
                .to_vec(),
            response_language: "Italian".to_string(),
        }
    }
}

impl Persona {
    /// System message text with a `{bot_name}` placeholder. Braces in the
    /// configured fields are escaped so they stay literal.
    pub fn system_template(&self) -> String {
        let mut text = format!(
            "You are {}. Your name is {{{BOT_NAME_VAR}}}.",
            escape_braces(&self.role)
        );
        if !self.origin.is_empty() {
            text.push_str(&format!(" You're from {}", escape_braces(&self.origin)));
            if self.languages.is_empty() {
                text.push('.');
            }
        }
        if !self.languages.is_empty() {
            let joined = escape_braces(&join_languages(&self.languages));
            if self.origin.is_empty() {
                text.push_str(&format!(" You can speak {joined}"));
            } else {
                text.push_str(&format!(" and you can speak {joined}"));
            }
            text.push_str(&format!(
                " but you only speak {}.",
                escape_braces(&self.response_language)
            ));
        }
        text.push_str(&format!(
            " Always answer in {}, whatever language you are addressed in. \
             Even if you admit to know multiple languages, you never betray this policy!",
            escape_braces(&self.response_language)
        ));
        text
    }

    /// Two-message prompt: persona system message, then the user's line.
    pub fn prompt_template(&self) -> Result<ChatPromptTemplate, PromptError> {
        let system = self.system_template();
        let user = format!("{{{USER_INPUT_VAR}}}");
        ChatPromptTemplate::from_messages([(Role::System, system.as_str()), (Role::User, user.as_str())])
    }

    /// Values for one turn.
    pub fn turn_values(&self, user_input: &str) -> PromptValues {
        PromptValues::from([
            (BOT_NAME_VAR.to_string(), self.name.clone()),
            (USER_INPUT_VAR.to_string(), user_input.to_string()),
        ])
    }
}

fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

fn join_languages(languages: &[String]) -> String {
    match languages {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
