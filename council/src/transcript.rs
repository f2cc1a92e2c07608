use serde::{Deserialize, Serialize};

/// Who produced a [`Message`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry of a [`Transcript`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Name of the participant who said it. Empty for the system message.
    #[serde(default)]
    pub speaker: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            speaker: String::new(),
            content: content.into(),
        }
    }

    pub fn user(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            speaker: speaker.into(),
            content: content.into(),
        }
    }

    pub fn assistant(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            speaker: speaker.into(),
            content: content.into(),
        }
    }

    /// Render the message as a prompt line, prefixed with `[speaker]` when it
    /// has one.
    ///
    /// ```
    /// use council::Message;
    /// assert_eq!(Message::user("VICTORIA", "hi").render(), "[VICTORIA] hi");
    /// assert_eq!(Message::system("be nice").render(), "be nice");
    /// ```
    pub fn render(&self) -> String {
        if self.speaker.is_empty() {
            self.content.clone()
        } else {
            format!("[{}] {}", self.speaker, self.content)
        }
    }
}

/// Ordered conversation history seen by one participant.
///
/// The system message sits at index 0 for the lifetime of the transcript and
/// entries are only ever appended after it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a transcript holding only the system message.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append the non-system entries of `saved` after the system message.
    ///
    /// The current system message is kept even if `saved` carries another one.
    pub(crate) fn restore_from(&mut self, saved: Transcript) {
        self.messages.truncate(1);
        self.messages.extend(
            saved
                .messages
                .into_iter()
                .filter(|m| m.role != Role::System),
        );
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    pub fn last(&self) -> &Message {
        // never empty: the system message is always present
        &self.messages[self.messages.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// `true` when nothing beyond the system message has been said.
    pub fn is_empty(&self) -> bool {
        self.messages.len() <= 1
    }

    /// Concatenate every entry, in order, into a single prompt. The owner's
    /// own replies go in bare so the model does not learn to tag itself.
    pub fn prompt(&self) -> String {
        self.messages
            .iter()
            .map(|m| match m.role {
                Role::Assistant => m.content.clone(),
                Role::System | Role::User => m.render(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
