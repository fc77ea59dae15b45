//! Assistant chat transcript with optional voice dictation.

use serde::{Deserialize, Serialize};

use crate::api::{AssistantReply, ChatPayload};
use crate::capabilities::{SpeechError, SpeechOutput};
use crate::locale::Language;
use crate::MAX_CHAT_MESSAGE_CHARS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub is_error: bool,
}

impl ChatTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            is_error: false,
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            is_error: false,
        }
    }

    #[must_use]
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            is_error: true,
        }
    }
}

/// An outgoing `/chat` call, tagged with the id its answer must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub id: u64,
    pub payload: ChatPayload,
}

/// Dictation state. `notice` holds a non-fatal message such as "voice input
/// unavailable".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceInput {
    pub listening: bool,
    pub notice: Option<String>,
    heard_first: bool,
}

impl VoiceInput {
    /// Flips listening. Returns the new state; the caller starts or stops the
    /// recognizer accordingly.
    pub fn toggle(&mut self) -> bool {
        self.listening = !self.listening;
        if self.listening {
            self.notice = None;
            self.heard_first = false;
        }
        self.listening
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSession {
    pub turns: Vec<ChatTurn>,
    pub input: String,
    pub voice: VoiceInput,
    pending: Option<u64>,
    next_id: u64,
}

impl ChatSession {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Index of the newest turn, for scroll-to-latest.
    #[must_use]
    pub fn latest_index(&self) -> Option<usize> {
        self.turns.len().checked_sub(1)
    }

    #[must_use]
    pub fn input_too_long(&self) -> bool {
        exceeds_limit(&self.input)
    }

    #[must_use]
    pub fn can_send(&self) -> bool {
        let text = self.input.trim();
        !self.is_pending() && !text.is_empty() && !exceeds_limit(text)
    }

    /// Appends the user turn and returns the request to send. `None` when the
    /// text is blank, longer than [`MAX_CHAT_MESSAGE_CHARS`], or an answer is
    /// still outstanding. Rejected text is never trimmed to fit.
    pub fn send_message(&mut self, text: &str, language: Language) -> Option<ChatRequest> {
        let message = text.trim();
        if message.is_empty() || exceeds_limit(message) || self.pending.is_some() {
            return None;
        }
        let message = message.to_string();

        self.turns.push(ChatTurn::user(message.clone()));
        self.input.clear();
        self.next_id += 1;
        self.pending = Some(self.next_id);

        Some(ChatRequest {
            id: self.next_id,
            payload: ChatPayload { message, language },
        })
    }

    /// Sends whatever is in the input box.
    pub fn send_input(&mut self, language: Language) -> Option<ChatRequest> {
        let text = self.input.clone();
        self.send_message(&text, language)
    }

    /// Returns `false` when `id` is not the outstanding request.
    pub fn receive_reply(&mut self, id: u64, reply: AssistantReply) -> bool {
        if !self.settle(id) {
            return false;
        }
        let turn = if reply.success {
            ChatTurn::assistant(reply.response)
        } else {
            ChatTurn::error(reply.response)
        };
        self.turns.push(turn);
        true
    }

    pub fn receive_failure(&mut self, id: u64, message: impl Into<String>) -> bool {
        if !self.settle(id) {
            return false;
        }
        self.turns.push(ChatTurn::error(message));
        true
    }

    fn settle(&mut self, id: u64) -> bool {
        if self.pending != Some(id) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Applies one recognizer output. Returns `true` when listening stopped.
    pub fn apply_speech(&mut self, output: SpeechOutput) -> bool {
        if let Some(error) = SpeechError::from_output(&output) {
            self.voice.listening = false;
            self.voice.notice = Some(error.to_string());
            return true;
        }
        match output {
            SpeechOutput::Transcript { text, is_final } => {
                if !self.voice.listening {
                    return false;
                }
                if !self.voice.heard_first {
                    self.voice.heard_first = true;
                    self.input = text;
                } else if is_final {
                    self.input = text;
                }
                if is_final {
                    self.voice.listening = false;
                }
                is_final
            }
            SpeechOutput::Ended => {
                let was = self.voice.listening;
                self.voice.listening = false;
                was
            }
            SpeechOutput::Unavailable | SpeechOutput::Failed { .. } => false,
        }
    }
}

fn exceeds_limit(text: &str) -> bool {
    text.trim().chars().count() > MAX_CHAT_MESSAGE_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(success: bool, text: &str) -> AssistantReply {
        AssistantReply {
            success,
            response: text.into(),
        }
    }

    mod send_tests {
        use super::*;

        #[test]
        fn send_appends_user_turn_and_clears_input() {
            let mut chat = ChatSession::default();
            chat.set_input("When to sow paddy?");
            let request = chat.send_input(Language::Te).unwrap();

            assert_eq!(request.payload.message, "When to sow paddy?");
            assert_eq!(request.payload.language, Language::Te);
            assert_eq!(chat.turns, vec![ChatTurn::user("When to sow paddy?")]);
            assert!(chat.input.is_empty());
            assert!(chat.is_pending());
        }

        #[test]
        fn blank_message_is_ignored() {
            let mut chat = ChatSession::default();
            assert!(chat.send_message("   ", Language::En).is_none());
            assert!(chat.turns.is_empty());
        }

        #[test]
        fn send_while_pending_is_a_no_op() {
            let mut chat = ChatSession::default();
            let _ = chat.send_message("first", Language::En).unwrap();
            chat.set_input("second");
            assert!(chat.send_input(Language::En).is_none());
            assert_eq!(chat.turns.len(), 1);
            assert_eq!(chat.input, "second");
        }

        #[test]
        fn over_long_message_is_rejected_not_truncated() {
            let mut chat = ChatSession::default();
            chat.set_input("a".repeat(MAX_CHAT_MESSAGE_CHARS + 10));
            assert!(chat.input_too_long());
            assert!(!chat.can_send());
            assert!(chat.send_input(Language::En).is_none());
            assert!(chat.turns.is_empty());
            assert_eq!(chat.input.chars().count(), MAX_CHAT_MESSAGE_CHARS + 10);
            assert!(!chat.is_pending());
        }

        #[test]
        fn message_at_the_limit_is_sent_whole() {
            let mut chat = ChatSession::default();
            let text = "అ".repeat(MAX_CHAT_MESSAGE_CHARS);
            let request = chat.send_message(&text, Language::Te).unwrap();
            assert_eq!(request.payload.message, text);
        }
    }

    mod reply_tests {
        use super::*;

        #[test]
        fn reply_appends_assistant_turn() {
            let mut chat = ChatSession::default();
            let request = chat.send_message("hi", Language::En).unwrap();
            assert!(chat.receive_reply(request.id, reply(true, "Hello!")));
            assert_eq!(chat.turns[1], ChatTurn::assistant("Hello!"));
            assert!(!chat.is_pending());
            assert_eq!(chat.latest_index(), Some(1));
        }

        #[test]
        fn unsuccessful_reply_is_an_error_turn() {
            let mut chat = ChatSession::default();
            let request = chat.send_message("hi", Language::En).unwrap();
            chat.receive_reply(request.id, reply(false, "Assistant not configured"));
            assert!(chat.turns[1].is_error);
            assert_eq!(chat.turns[1].role, Role::Assistant);
        }

        #[test]
        fn failure_appends_error_turn() {
            let mut chat = ChatSession::default();
            let request = chat.send_message("hi", Language::En).unwrap();
            chat.receive_failure(request.id, "Unable to connect");
            assert_eq!(chat.turns[1], ChatTurn::error("Unable to connect"));
        }

        #[test]
        fn unknown_ids_are_ignored() {
            let mut chat = ChatSession::default();
            let request = chat.send_message("hi", Language::En).unwrap();
            assert!(!chat.receive_reply(request.id + 1, reply(true, "late")));
            assert_eq!(chat.turns.len(), 1);
            assert!(chat.is_pending());
        }
    }

    mod voice_tests {
        use super::*;

        fn transcript(text: &str, is_final: bool) -> SpeechOutput {
            SpeechOutput::Transcript {
                text: text.into(),
                is_final,
            }
        }

        #[test]
        fn first_transcript_replaces_input() {
            let mut chat = ChatSession::default();
            chat.set_input("typed");
            assert!(chat.voice.toggle());
            chat.apply_speech(transcript("weather", false));
            assert_eq!(chat.input, "weather");
            assert!(chat.voice.listening);
        }

        #[test]
        fn final_transcript_stops_listening() {
            let mut chat = ChatSession::default();
            chat.voice.toggle();
            chat.apply_speech(transcript("weather", false));
            assert!(chat.apply_speech(transcript("weather today", true)));
            assert_eq!(chat.input, "weather today");
            assert!(!chat.voice.listening);
        }

        #[test]
        fn unavailable_sets_notice() {
            let mut chat = ChatSession::default();
            chat.voice.toggle();
            assert!(chat.apply_speech(SpeechOutput::Unavailable));
            assert!(!chat.voice.listening);
            assert!(chat.voice.notice.is_some());
        }

        #[test]
        fn transcripts_after_stop_are_ignored() {
            let mut chat = ChatSession::default();
            chat.voice.toggle();
            chat.voice.toggle();
            chat.apply_speech(transcript("late", true));
            assert!(chat.input.is_empty());
        }
    }
}
