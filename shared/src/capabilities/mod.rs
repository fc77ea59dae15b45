//! Side effects the core asks the shell to perform.
//!
//! We use Crux's built-in Render and Http capabilities directly; timers and
//! speech recognition are small custom capabilities the host implements.

mod http;
mod speech;
mod timer;

pub use self::http::{into_outcome, ApiBase, FetchOutcome, HttpError, MAX_RESPONSE_BODY_SIZE};
pub use self::speech::{Speech, SpeechError, SpeechOperation, SpeechOutput};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

pub use crux_core::render::Render;
pub use crux_http::Http;

#[allow(unused_imports)]
use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub timer: Timer<Event>,
    pub speech: Speech<Event>,
}
