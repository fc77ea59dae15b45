use serde::{Deserialize, Serialize};

use crate::api::NewsCategory;
use crate::capabilities::{FetchOutcome, SpeechOutput};
use crate::config::DashboardConfig;
use crate::locale::Language;
use crate::model::Tab;
use crate::resource::ResourceKey;

/// Why a timer was armed. Carried back on expiry so the owner can tell
/// whether it is still relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTag {
    RequestDeadline { key: ResourceKey, seq: u64 },
    TranslationsDeadline { seq: u64 },
    ChatDeadline { id: u64 },
    SymptomDeadline { id: u64 },
    Debounce { key: ResourceKey, token: u64 },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    Configure(DashboardConfig),
    AppStarted,

    LanguageSelected(Language),
    StateSelected(String),
    CitySelected(String),
    LocationSelected(String),
    TabSelected(Tab),
    NewsCategorySelected(NewsCategory),
    SchemeCategorySelected(Option<String>),
    SchemeSearchChanged(String),

    RefreshRequested(ResourceKey),
    RetryRequested(ResourceKey),
    DismissNotice,

    ChatInputChanged(String),
    ChatSendRequested,
    VoiceToggled,

    SymptomInputChanged(String),
    SymptomCheckRequested,

    // Capability completions
    #[serde(skip)]
    ResourceFetched {
        key: ResourceKey,
        seq: u64,
        outcome: FetchOutcome,
    },
    #[serde(skip)]
    TranslationsFetched { seq: u64, outcome: FetchOutcome },
    #[serde(skip)]
    ChatReplied { id: u64, outcome: FetchOutcome },
    #[serde(skip)]
    SymptomChecked { id: u64, outcome: FetchOutcome },
    #[serde(skip)]
    TimerElapsed(TimerTag),
    #[serde(skip)]
    SpeechReceived(SpeechOutput),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configure(_) => "configure",
            Self::AppStarted => "app_started",
            Self::LanguageSelected(_) => "language_selected",
            Self::StateSelected(_) => "state_selected",
            Self::CitySelected(_) => "city_selected",
            Self::LocationSelected(_) => "location_selected",
            Self::TabSelected(_) => "tab_selected",
            Self::NewsCategorySelected(_) => "news_category_selected",
            Self::SchemeCategorySelected(_) => "scheme_category_selected",
            Self::SchemeSearchChanged(_) => "scheme_search_changed",
            Self::RefreshRequested(_) => "refresh_requested",
            Self::RetryRequested(_) => "retry_requested",
            Self::DismissNotice => "dismiss_notice",
            Self::ChatInputChanged(_) => "chat_input_changed",
            Self::ChatSendRequested => "chat_send_requested",
            Self::VoiceToggled => "voice_toggled",
            Self::SymptomInputChanged(_) => "symptom_input_changed",
            Self::SymptomCheckRequested => "symptom_check_requested",
            Self::ResourceFetched { .. } => "resource_fetched",
            Self::TranslationsFetched { .. } => "translations_fetched",
            Self::ChatReplied { .. } => "chat_replied",
            Self::SymptomChecked { .. } => "symptom_checked",
            Self::TimerElapsed(_) => "timer_elapsed",
            Self::SpeechReceived(_) => "speech_received",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::LanguageSelected(_)
                | Self::StateSelected(_)
                | Self::CitySelected(_)
                | Self::LocationSelected(_)
                | Self::TabSelected(_)
                | Self::NewsCategorySelected(_)
                | Self::SchemeCategorySelected(_)
                | Self::SchemeSearchChanged(_)
                | Self::RefreshRequested(_)
                | Self::RetryRequested(_)
                | Self::DismissNotice
                | Self::ChatSendRequested
                | Self::VoiceToggled
                | Self::SymptomCheckRequested
        )
    }
}
