use crux_core::capability::{CapabilityContext, Operation};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speech-to-text supplied by the host. The core never talks to a platform
/// recognizer directly; a shell without one answers `Start` with
/// [`SpeechOutput::Unavailable`].
#[derive(crux_core::macros::Capability)]
pub struct Speech<Ev> {
    context: CapabilityContext<SpeechOperation, Ev>,
}

impl<Ev> Speech<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<SpeechOperation, Ev>) -> Self {
        Self { context }
    }

    /// Starts listening in `locale` (a BCP 47 tag such as `te-IN`). Every
    /// output the shell streams back is turned into an event; the stream ends
    /// after `Ended`, `Failed` or `Unavailable`.
    pub fn start<F>(&self, locale: impl Into<String>, callback: F)
    where
        F: Fn(SpeechOutput) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        let operation = SpeechOperation::Start {
            locale: locale.into(),
        };
        self.context.spawn(async move {
            let mut outputs = ctx.stream_from_shell(operation);
            while let Some(output) = outputs.next().await {
                let terminal = output.is_terminal();
                ctx.update_app(callback(output));
                if terminal {
                    break;
                }
            }
        });
    }

    pub fn stop<F>(&self, callback: F)
    where
        F: FnOnce(SpeechOutput) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx.request_from_shell(SpeechOperation::Stop).await;
            ctx.update_app(callback(output));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpeechOperation {
    Start { locale: String },
    Stop,
}

impl Operation for SpeechOperation {
    type Output = SpeechOutput;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum SpeechOutput {
    Unavailable,
    Transcript { text: String, is_final: bool },
    Ended,
    Failed { message: String },
}

impl SpeechOutput {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Ended | Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech recognition is not available on this device")]
    Unavailable,

    #[error("speech recognition failed: {message}")]
    Failed { message: String },
}

impl SpeechError {
    #[must_use]
    pub fn from_output(output: &SpeechOutput) -> Option<Self> {
        match output {
            SpeechOutput::Unavailable => Some(Self::Unavailable),
            SpeechOutput::Failed { message } => Some(Self::Failed {
                message: message.clone(),
            }),
            SpeechOutput::Transcript { .. } | SpeechOutput::Ended => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_outputs() {
        assert!(SpeechOutput::Unavailable.is_terminal());
        assert!(SpeechOutput::Ended.is_terminal());
        assert!(SpeechOutput::Failed { message: "mic".into() }.is_terminal());
        assert!(!SpeechOutput::Transcript {
            text: "hello".into(),
            is_final: false
        }
        .is_terminal());
    }

    #[test]
    fn errors_from_outputs() {
        assert_eq!(
            SpeechError::from_output(&SpeechOutput::Unavailable),
            Some(SpeechError::Unavailable)
        );
        assert_eq!(SpeechError::from_output(&SpeechOutput::Ended), None);
    }
}
