use tracing::{debug, info, warn};

use crate::api::AssistantReply;
use crate::capabilities::{into_outcome, Capabilities, FetchOutcome, HttpError, SpeechOutput};
use crate::chat::ChatRequest;
use crate::event::{Event, TimerTag};
use crate::locale::{LocaleRequest, Translations};
use crate::model::Model;
use crate::resource::{Binding, Completion, RequestTicket, ResourceKey, ResourceStatus};
use crate::symptom::SymptomRequest;
use crate::view::{self, ViewModel};
use crate::{AppError, ErrorKind, MAX_CHAT_MESSAGE_CHARS, MAX_SYMPTOM_CHARS};

#[derive(Default)]
pub struct App;

impl App {
    fn apply_bindings(model: &mut Model, caps: &Capabilities, bindings: Vec<Binding>) {
        for binding in bindings {
            Self::apply_binding(model, caps, binding);
        }
    }

    fn apply_binding(model: &mut Model, caps: &Capabilities, binding: Binding) {
        match binding {
            Binding::Issue(ticket) => Self::fetch(model, caps, ticket),
            Binding::Debounce { key, token, millis } => {
                debug!(resource = %key, token, millis, "fetch debounced");
                caps.timer
                    .notify_after(millis, move |_| Event::TimerElapsed(TimerTag::Debounce { key, token }));
            }
            Binding::Unchanged => {}
        }
    }

    fn fetch(model: &mut Model, caps: &Capabilities, ticket: RequestTicket) {
        let RequestTicket { key, seq, query } = ticket;
        let url = match model.api.endpoint(key.path(), &query) {
            Ok(url) => url,
            Err(e) => {
                warn!(resource = %key, seq, error = %e, "cannot build request URL");
                model.panels.complete(key, seq, Err(e));
                return;
            }
        };

        debug!(resource = %key, seq, %url, "fetch");
        caps.http.get(url).send(move |result| Event::ResourceFetched {
            key,
            seq,
            outcome: into_outcome(result),
        });

        if let Some(millis) = model.config.timeout() {
            caps.timer.notify_after(millis, move |_| {
                Event::TimerElapsed(TimerTag::RequestDeadline { key, seq })
            });
        }
    }

    fn fetch_translations(model: &mut Model, caps: &Capabilities, request: LocaleRequest) {
        let LocaleRequest { seq, language } = request;
        let url = match model
            .api
            .endpoint(ResourceKey::Translations.path(), &[("lang", language.code().to_string())])
        {
            Ok(url) => url,
            Err(e) => {
                warn!(seq, error = %e, "cannot build translations URL");
                model.locale.apply_failure(seq);
                return;
            }
        };

        debug!(seq, %language, "fetch translations");
        caps.http.get(url).send(move |result| Event::TranslationsFetched {
            seq,
            outcome: into_outcome(result),
        });

        if let Some(millis) = model.config.timeout() {
            caps.timer.notify_after(millis, move |_| {
                Event::TimerElapsed(TimerTag::TranslationsDeadline { seq })
            });
        }
    }

    fn send_chat(model: &mut Model, caps: &Capabilities, request: ChatRequest) {
        let ChatRequest { id, payload } = request;
        let url = match model.api.endpoint("chat", &[]) {
            Ok(url) => url,
            Err(e) => {
                model.chat.receive_failure(id, AppError::from(e).user_facing_message());
                return;
            }
        };

        match caps.http.post(url).body_json(&payload) {
            Ok(builder) => {
                debug!(id, language = %payload.language, "send chat message");
                builder.send(move |result| Event::ChatReplied {
                    id,
                    outcome: into_outcome(result),
                });
            }
            Err(e) => {
                let error = HttpError::Serialization {
                    message: e.to_string(),
                };
                model.chat.receive_failure(id, AppError::from(error).user_facing_message());
                return;
            }
        }

        if let Some(millis) = model.config.timeout() {
            caps.timer
                .notify_after(millis, move |_| Event::TimerElapsed(TimerTag::ChatDeadline { id }));
        }
    }

    fn send_symptoms(model: &mut Model, caps: &Capabilities, request: SymptomRequest) {
        let SymptomRequest { id, payload } = request;
        let url = match model.api.endpoint("symptom-checker", &[]) {
            Ok(url) => url,
            Err(e) => {
                model.symptom.receive_failure(id, AppError::from(e).user_facing_message());
                return;
            }
        };

        match caps.http.post(url).body_json(&payload) {
            Ok(builder) => {
                debug!(id, language = %payload.language, "send symptom check");
                builder.send(move |result| Event::SymptomChecked {
                    id,
                    outcome: into_outcome(result),
                });
            }
            Err(e) => {
                let error = HttpError::Serialization {
                    message: e.to_string(),
                };
                model.symptom.receive_failure(id, AppError::from(error).user_facing_message());
                return;
            }
        }

        if let Some(millis) = model.config.timeout() {
            caps.timer.notify_after(millis, move |_| {
                Event::TimerElapsed(TimerTag::SymptomDeadline { id })
            });
        }
    }

    /// Decodes an assistant answer; transport, status and parse failures all
    /// become a user-facing message.
    fn parse_reply(outcome: FetchOutcome) -> Result<AssistantReply, String> {
        outcome
            .map_err(AppError::from)
            .and_then(|body| {
                serde_json::from_slice::<AssistantReply>(&body)
                    .map_err(|e| AppError::new(ErrorKind::Deserialization, e.to_string()))
            })
            .map_err(|e| {
                warn!(error = %e, "assistant request failed");
                e.user_facing_message()
            })
    }

    fn handle_resource_fetched(
        model: &mut Model,
        caps: &Capabilities,
        key: ResourceKey,
        seq: u64,
        outcome: FetchOutcome,
    ) {
        match model.panels.complete(key, seq, outcome) {
            Completion::Applied(ResourceStatus::Error) => {
                if let Some(error) = model.panels.error(key) {
                    warn!(resource = %key, seq, code = error.code(), error = %error, "fetch failed");
                }
            }
            Completion::Applied(status) => {
                debug!(resource = %key, seq, ?status, "fetch applied");
                if key == ResourceKey::Locations && model.install_catalog() {
                    info!(location = %model.selection.location, "location moved after catalog load");
                    let bindings = model.rebind_mounted();
                    Self::apply_bindings(model, caps, bindings);
                }
            }
            Completion::Superseded => {
                debug!(resource = %key, seq, "superseded response discarded");
            }
            Completion::Unknown => {
                debug!(resource = %key, seq, "response for unmounted or expired request dropped");
            }
        }
    }

    fn handle_timer(model: &mut Model, caps: &Capabilities, tag: TimerTag) {
        let timeout_ms = model.config.request_timeout_ms;
        match tag {
            TimerTag::RequestDeadline { key, seq } => {
                if let Completion::Applied(_) = model.panels.time_out(key, seq, timeout_ms) {
                    warn!(resource = %key, seq, timeout_ms, "request timed out");
                }
            }
            TimerTag::TranslationsDeadline { seq } => {
                if model.locale.apply_failure(seq) {
                    warn!(seq, timeout_ms, "translations timed out, using built-in labels");
                }
            }
            TimerTag::ChatDeadline { id } => {
                let error = AppError::from(HttpError::Timeout { timeout_ms });
                if model.chat.receive_failure(id, error.user_facing_message()) {
                    warn!(id, timeout_ms, "chat request timed out");
                }
            }
            TimerTag::SymptomDeadline { id } => {
                let error = AppError::from(HttpError::Timeout { timeout_ms });
                if model.symptom.receive_failure(id, error.user_facing_message()) {
                    warn!(id, timeout_ms, "symptom check timed out");
                }
            }
            TimerTag::Debounce { key, token } => {
                if let Some(ticket) = model.panels.debounce_elapsed(key, token) {
                    Self::fetch(model, caps, ticket);
                }
            }
        }
    }

    fn handle_speech(model: &mut Model, caps: &Capabilities, output: SpeechOutput) {
        let final_transcript = matches!(output, SpeechOutput::Transcript { is_final: true, .. });
        if !model.chat.apply_speech(output) {
            return;
        }
        if let Some(notice) = &model.chat.voice.notice {
            warn!(%notice, "voice input stopped");
        } else if final_transcript {
            // The host keeps the recognizer open until told otherwise.
            caps.speech.stop(Event::SpeechReceived);
        }
    }

    fn retry(model: &mut Model, caps: &Capabilities, key: ResourceKey) {
        if key == ResourceKey::Translations {
            let request = model.locale.reload();
            Self::fetch_translations(model, caps, request);
            return;
        }
        if !model.is_mounted(key) {
            debug!(resource = %key, "refresh ignored for unmounted panel");
            return;
        }
        match model.panels.refresh(key) {
            Some(ticket) => Self::fetch(model, caps, ticket),
            None => {
                let binding = model.bind(key);
                Self::apply_binding(model, caps, binding);
            }
        }
    }
}

fn too_long_notice(limit: usize) -> String {
    AppError::new(
        ErrorKind::Validation,
        format!("Please shorten your text to {limit} characters or fewer."),
    )
    .user_facing_message()
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        debug!(event = event_name, "update");
        if event.is_user_initiated() {
            info!(event = event_name, "user action");
        }

        match event {
            Event::Configure(config) => match config.validate() {
                Ok((config, api)) => {
                    info!(api = api.as_str(), timeout_ms = config.request_timeout_ms, "configured");
                    model.apply_config(config, api);
                }
                Err(e) => {
                    warn!(error = %e, "configuration rejected");
                    model.set_notice(
                        AppError::new(ErrorKind::Validation, e.to_string()).user_facing_message(),
                    );
                }
            },

            Event::AppStarted => {
                if model.started {
                    return;
                }
                model.started = true;
                let request = model.locale.reload();
                Self::fetch_translations(model, caps, request);
                let bindings = model.rebind_mounted();
                Self::apply_bindings(model, caps, bindings);
            }

            Event::LanguageSelected(language) => {
                if let Some(request) = model.locale.set_locale(language) {
                    Self::fetch_translations(model, caps, request);
                }
                let bindings = model.rebind_mounted();
                Self::apply_bindings(model, caps, bindings);
            }

            Event::StateSelected(state) => {
                let catalog = model.catalog.clone();
                match model.selection.select_state(&state, &catalog) {
                    Ok(()) => {
                        let bindings = model.rebind_mounted();
                        Self::apply_bindings(model, caps, bindings);
                    }
                    Err(e) => warn!(error = %e, "state selection rejected"),
                }
            }

            Event::CitySelected(city) => {
                let catalog = model.catalog.clone();
                match model.selection.select_city(&city, &catalog) {
                    Ok(()) => {
                        let bindings = model.rebind_mounted();
                        Self::apply_bindings(model, caps, bindings);
                    }
                    Err(e) => warn!(error = %e, "city selection rejected"),
                }
            }

            Event::LocationSelected(location) => {
                let catalog = model.catalog.clone();
                match model.selection.select_location(&location, &catalog) {
                    Ok(()) => {
                        let bindings = model.rebind_mounted();
                        Self::apply_bindings(model, caps, bindings);
                    }
                    Err(e) => warn!(error = %e, "location selection rejected"),
                }
            }

            Event::TabSelected(tab) => {
                let bindings = model.select_tab(tab);
                Self::apply_bindings(model, caps, bindings);
            }

            Event::NewsCategorySelected(category) => {
                model.news_category = category;
                let bindings = model.rebind_mounted();
                Self::apply_bindings(model, caps, bindings);
            }

            Event::SchemeCategorySelected(category) => {
                model.scheme_category = category.filter(|c| !c.is_empty() && c != "all");
                let bindings = model.rebind_mounted();
                Self::apply_bindings(model, caps, bindings);
            }

            Event::SchemeSearchChanged(search) => {
                model.scheme_search = search;
                let bindings = model.rebind_mounted();
                Self::apply_bindings(model, caps, bindings);
            }

            Event::RefreshRequested(key) | Event::RetryRequested(key) => {
                Self::retry(model, caps, key);
            }

            Event::DismissNotice => {
                model.notice = None;
                model.chat.voice.notice = None;
            }

            Event::ChatInputChanged(text) => model.chat.set_input(text),

            Event::ChatSendRequested => {
                let language = model.locale.language();
                match model.chat.send_input(language) {
                    Some(request) => Self::send_chat(model, caps, request),
                    None if model.chat.input_too_long() => {
                        warn!(limit = MAX_CHAT_MESSAGE_CHARS, "chat message too long");
                        model.set_notice(too_long_notice(MAX_CHAT_MESSAGE_CHARS));
                    }
                    None => debug!(pending = model.chat.is_pending(), "chat send suppressed"),
                }
            }

            Event::VoiceToggled => {
                if model.chat.voice.toggle() {
                    let tag = model.locale.language().speech_tag();
                    debug!(locale = tag, "start voice input");
                    caps.speech.start(tag, Event::SpeechReceived);
                } else {
                    debug!("stop voice input");
                    caps.speech.stop(Event::SpeechReceived);
                }
            }

            Event::SymptomInputChanged(text) => model.symptom.set_input(text),

            Event::SymptomCheckRequested => {
                let language = model.locale.language();
                match model.symptom.check(language) {
                    Some(request) => Self::send_symptoms(model, caps, request),
                    None if model.symptom.input_too_long() => {
                        warn!(limit = MAX_SYMPTOM_CHARS, "symptom description too long");
                        model.set_notice(too_long_notice(MAX_SYMPTOM_CHARS));
                    }
                    None => debug!(pending = model.symptom.is_pending(), "symptom check suppressed"),
                }
            }

            Event::ResourceFetched { key, seq, outcome } => {
                Self::handle_resource_fetched(model, caps, key, seq, outcome);
            }

            Event::TranslationsFetched { seq, outcome } => {
                let parsed = outcome.map_err(AppError::from).and_then(|body| {
                    serde_json::from_slice::<Translations>(&body)
                        .map_err(|e| AppError::new(ErrorKind::Deserialization, e.to_string()))
                });
                match parsed {
                    Ok(translations) => {
                        if !model.locale.apply_translations(seq, translations) {
                            debug!(seq, "stale translations discarded");
                        }
                    }
                    Err(e) => {
                        if model.locale.apply_failure(seq) {
                            warn!(seq, error = %e, "translations failed, using built-in labels");
                        }
                    }
                }
            }

            Event::ChatReplied { id, outcome } => {
                let applied = match Self::parse_reply(outcome) {
                    Ok(reply) => model.chat.receive_reply(id, reply),
                    Err(message) => model.chat.receive_failure(id, message),
                };
                if !applied {
                    debug!(id, "late chat reply dropped");
                }
            }

            Event::SymptomChecked { id, outcome } => {
                let applied = match Self::parse_reply(outcome) {
                    Ok(reply) => model.symptom.receive(id, reply),
                    Err(message) => model.symptom.receive_failure(id, message),
                };
                if !applied {
                    debug!(id, "late symptom result dropped");
                }
            }

            Event::TimerElapsed(tag) => Self::handle_timer(model, caps, tag),

            Event::SpeechReceived(output) => Self::handle_speech(model, caps, output),
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::build(model)
    }
}
