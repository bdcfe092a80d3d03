use std::collections::HashMap;

use thiserror::Error;

use crate::rchain::provider::{ChatMessage, Role};

/// Values substituted into template placeholders.
pub type PromptValues = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("malformed template at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },
    #[error("missing value for template variable '{name}'")]
    MissingVariable { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// One message template: `{name}` placeholders, `{{` and `}}` for literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    role: Role,
    segments: Vec<Segment>,
}

impl MessageTemplate {
    pub fn parse(role: Role, template: &str) -> Result<Self, PromptError> {
        Ok(Self {
            role,
            segments: parse_segments(template)?,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    fn format(&self, values: &PromptValues) -> Result<ChatMessage, PromptError> {
        let mut content = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => content.push_str(text),
                Segment::Variable(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| PromptError::MissingVariable { name: name.clone() })?;
                    content.push_str(value);
                }
            }
        }
        Ok(ChatMessage {
            role: self.role,
            content,
        })
    }
}

fn parse_segments(template: &str) -> Result<Vec<Segment>, PromptError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                chars.next();
                literal.push('}');
            }
            '}' => {
                return Err(PromptError::Malformed {
                    offset,
                    reason: "unmatched '}'",
                });
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (inner_offset, inner) in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => {
                            return Err(PromptError::Malformed {
                                offset: inner_offset,
                                reason: "nested '{' inside placeholder",
                            });
                        }
                        other => name.push(other),
                    }
                }
                if !closed {
                    return Err(PromptError::Malformed {
                        offset,
                        reason: "unclosed placeholder",
                    });
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(PromptError::Malformed {
                        offset,
                        reason: "empty placeholder",
                    });
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name.to_string()));
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Ordered list of message templates rendered together into one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPromptTemplate {
    messages: Vec<MessageTemplate>,
}

impl ChatPromptTemplate {
    pub fn from_messages<'a, I>(messages: I) -> Result<Self, PromptError>
    where
        I: IntoIterator<Item = (Role, &'a str)>,
    {
        let messages = messages
            .into_iter()
            .map(|(role, template)| MessageTemplate::parse(role, template))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { messages })
    }

    pub fn messages(&self) -> &[MessageTemplate] {
        &self.messages
    }

    /// Placeholder names in order of first appearance.
    pub fn input_variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.messages.iter().flat_map(MessageTemplate::variables) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Renders every message. Values are inserted verbatim.
    pub fn format_messages(&self, values: &PromptValues) -> Result<Vec<ChatMessage>, PromptError> {
        self.messages
            .iter()
            .map(|message| message.format(values))
            .collect()
    }
}
