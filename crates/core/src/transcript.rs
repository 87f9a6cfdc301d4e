//! Transcript-related types.

use serde::Serialize;

/// The turn every new transcript starts with.
pub const GREETING: &str =
    "Hi! I am a chatbot and I can search the web. How can I help you? 😊";

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking.
    User,
    /// The assistant, including error reports.
    Assistant,
}

/// One message in the conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// Creates a turn authored by the user.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a turn authored by the assistant.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Returns who produced this turn.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the message text.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The chat history of one session, in chronological order.
///
/// Turns are only ever appended. User and assistant turns usually
/// alternate, but nothing enforces it.
#[derive(Clone, Debug, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Creates a transcript seeded with the [`GREETING`].
    #[inline]
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::assistant(GREETING)],
        }
    }

    /// Appends a turn. This is the only way to change a transcript.
    #[inline]
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Returns every turn appended so far, oldest first.
    #[inline]
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the most recent turn.
    #[inline]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Returns the number of turns, including the greeting.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always `false` for transcripts made by [`Transcript::new`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for Transcript {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_with_greeting() {
        let transcript = Transcript::new();
        assert_eq!(transcript.all(), &[Turn::assistant(GREETING)]);
        assert_eq!(transcript.all()[0].role(), Role::Assistant);
    }

    #[test]
    fn test_append_only() {
        let mut transcript = Transcript::new();
        let before = transcript.all().to_vec();

        transcript.append(Turn::user("What is quantum entanglement?"));
        assert_eq!(&transcript.all()[..before.len()], before.as_slice());
        assert_eq!(transcript.len(), before.len() + 1);

        // Error turns may follow a user turn, and two user turns may follow
        // each other.
        transcript.append(Turn::user("Are you there?"));
        transcript.append(Turn::assistant("⚠️ Parsing Error: oops"));
        let roles: Vec<_> = transcript.all().iter().map(Turn::role).collect();
        assert_eq!(
            roles,
            [Role::Assistant, Role::User, Role::User, Role::Assistant]
        );

        // Reading twice without appending yields the same sequence.
        assert_eq!(transcript.all(), transcript.all());
    }

    #[test]
    fn test_serialize() {
        let turn = Turn::user("hi");
        assert_eq!(
            serde_json::to_value(&turn).unwrap(),
            serde_json::json!({ "role": "user", "content": "hi" })
        );
    }
}
