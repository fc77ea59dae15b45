use serde::{Deserialize, Serialize};

use crate::api::{
    ChatStatus, Facilities, FoodPriceParams, FoodPrices, HealthStatus, LocationParams,
    MarketPrices, NewsCategory, NewsFeed, NewsParams, SchemeParams, SchemesCatalog, WeatherReport,
};
use crate::capabilities::{ApiBase, FetchOutcome};
use crate::chat::ChatSession;
use crate::config::DashboardConfig;
use crate::locale::LocaleStore;
use crate::location::{LocationCatalog, LocationSelection, LocationsPayload};
use crate::resource::{
    Binding, BindingPolicy, Completion, RemoteResource, RequestTicket, ResourceKey, ResourceStatus,
};
use crate::symptom::SymptomChecker;
use crate::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Education,
    Agriculture,
    Health,
    Chat,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Education, Tab::Agriculture, Tab::Health, Tab::Chat];

    /// Panels mounted while this tab is active.
    #[must_use]
    pub const fn panels(self) -> &'static [ResourceKey] {
        match self {
            Self::Education => &[ResourceKey::News],
            Self::Agriculture => &[
                ResourceKey::MarketPrices,
                ResourceKey::FoodPrices,
                ResourceKey::Weather,
                ResourceKey::Schemes,
            ],
            Self::Health => &[
                ResourceKey::Hospitals,
                ResourceKey::Pharmacies,
                ResourceKey::BloodBanks,
            ],
            Self::Chat => &[ResourceKey::ChatStatus],
        }
    }

    #[must_use]
    pub const fn label_key(self) -> &'static str {
        match self {
            Self::Education => "tab_education",
            Self::Agriculture => "tab_agriculture",
            Self::Health => "tab_health",
            Self::Chat => "tab_chat",
        }
    }
}

/// Resources fetched whatever tab is showing. Translations are owned by the
/// locale store and not listed here.
pub const ALWAYS_MOUNTED: [ResourceKey; 2] = [ResourceKey::Locations, ResourceKey::Health];

#[derive(Debug, Clone)]
pub struct Panels {
    pub locations: RemoteResource<(), LocationsPayload>,
    pub health: RemoteResource<(), HealthStatus>,
    pub news: RemoteResource<NewsParams, NewsFeed>,
    pub market_prices: RemoteResource<LocationParams, MarketPrices>,
    pub food_prices: RemoteResource<FoodPriceParams, FoodPrices>,
    pub weather: RemoteResource<LocationParams, WeatherReport>,
    pub schemes: RemoteResource<SchemeParams, SchemesCatalog>,
    pub hospitals: RemoteResource<LocationParams, Facilities>,
    pub pharmacies: RemoteResource<LocationParams, Facilities>,
    pub blood_banks: RemoteResource<LocationParams, Facilities>,
    pub chat_status: RemoteResource<(), ChatStatus>,
}

impl Default for Panels {
    fn default() -> Self {
        Self {
            locations: RemoteResource::new(ResourceKey::Locations),
            health: RemoteResource::new(ResourceKey::Health),
            news: RemoteResource::new(ResourceKey::News),
            market_prices: RemoteResource::new(ResourceKey::MarketPrices),
            food_prices: RemoteResource::new(ResourceKey::FoodPrices),
            weather: RemoteResource::new(ResourceKey::Weather),
            schemes: RemoteResource::new(ResourceKey::Schemes),
            hospitals: RemoteResource::new(ResourceKey::Hospitals),
            pharmacies: RemoteResource::new(ResourceKey::Pharmacies),
            blood_banks: RemoteResource::new(ResourceKey::BloodBanks),
            chat_status: RemoteResource::new(ResourceKey::ChatStatus),
        }
    }
}

/// Runs `$body` against the resource stored under `$key`, whatever its
/// concrete parameter and payload types. Translations have no slot here.
macro_rules! with_resource {
    ($panels:expr, $key:expr, |$r:ident| $body:expr, $otherwise:expr) => {
        match $key {
            ResourceKey::Locations => {
                let $r = &mut $panels.locations;
                $body
            }
            ResourceKey::Health => {
                let $r = &mut $panels.health;
                $body
            }
            ResourceKey::News => {
                let $r = &mut $panels.news;
                $body
            }
            ResourceKey::MarketPrices => {
                let $r = &mut $panels.market_prices;
                $body
            }
            ResourceKey::FoodPrices => {
                let $r = &mut $panels.food_prices;
                $body
            }
            ResourceKey::Weather => {
                let $r = &mut $panels.weather;
                $body
            }
            ResourceKey::Schemes => {
                let $r = &mut $panels.schemes;
                $body
            }
            ResourceKey::Hospitals => {
                let $r = &mut $panels.hospitals;
                $body
            }
            ResourceKey::Pharmacies => {
                let $r = &mut $panels.pharmacies;
                $body
            }
            ResourceKey::BloodBanks => {
                let $r = &mut $panels.blood_banks;
                $body
            }
            ResourceKey::ChatStatus => {
                let $r = &mut $panels.chat_status;
                $body
            }
            ResourceKey::Translations => $otherwise,
        }
    };
}

impl Panels {
    pub fn set_policy(&mut self, policy: BindingPolicy) {
        for key in PANEL_KEYS {
            with_resource!(self, key, |r| r.set_policy(policy), ());
        }
    }

    pub fn complete(&mut self, key: ResourceKey, seq: u64, outcome: FetchOutcome) -> Completion {
        with_resource!(self, key, |r| r.complete(seq, outcome), Completion::Unknown)
    }

    pub fn time_out(&mut self, key: ResourceKey, seq: u64, timeout_ms: u64) -> Completion {
        with_resource!(self, key, |r| r.time_out(seq, timeout_ms), Completion::Unknown)
    }

    pub fn refresh(&mut self, key: ResourceKey) -> Option<RequestTicket> {
        with_resource!(self, key, |r| r.refresh(), None)
    }

    pub fn debounce_elapsed(&mut self, key: ResourceKey, token: u64) -> Option<RequestTicket> {
        with_resource!(self, key, |r| r.debounce_elapsed(token), None)
    }

    pub fn unmount(&mut self, key: ResourceKey) {
        with_resource!(self, key, |r| r.unmount(), ());
    }

    #[must_use]
    pub fn error(&self, key: ResourceKey) -> Option<&AppError> {
        match key {
            ResourceKey::Locations => self.locations.error(),
            ResourceKey::Health => self.health.error(),
            ResourceKey::News => self.news.error(),
            ResourceKey::MarketPrices => self.market_prices.error(),
            ResourceKey::FoodPrices => self.food_prices.error(),
            ResourceKey::Weather => self.weather.error(),
            ResourceKey::Schemes => self.schemes.error(),
            ResourceKey::Hospitals => self.hospitals.error(),
            ResourceKey::Pharmacies => self.pharmacies.error(),
            ResourceKey::BloodBanks => self.blood_banks.error(),
            ResourceKey::ChatStatus => self.chat_status.error(),
            ResourceKey::Translations => None,
        }
    }

    #[must_use]
    pub fn status(&self, key: ResourceKey) -> ResourceStatus {
        match key {
            ResourceKey::Locations => self.locations.status(),
            ResourceKey::Health => self.health.status(),
            ResourceKey::News => self.news.status(),
            ResourceKey::MarketPrices => self.market_prices.status(),
            ResourceKey::FoodPrices => self.food_prices.status(),
            ResourceKey::Weather => self.weather.status(),
            ResourceKey::Schemes => self.schemes.status(),
            ResourceKey::Hospitals => self.hospitals.status(),
            ResourceKey::Pharmacies => self.pharmacies.status(),
            ResourceKey::BloodBanks => self.blood_banks.status(),
            ResourceKey::ChatStatus => self.chat_status.status(),
            ResourceKey::Translations => ResourceStatus::Idle,
        }
    }
}

const PANEL_KEYS: [ResourceKey; 11] = [
    ResourceKey::Locations,
    ResourceKey::Health,
    ResourceKey::News,
    ResourceKey::MarketPrices,
    ResourceKey::FoodPrices,
    ResourceKey::Weather,
    ResourceKey::Schemes,
    ResourceKey::Hospitals,
    ResourceKey::Pharmacies,
    ResourceKey::BloodBanks,
    ResourceKey::ChatStatus,
];

#[derive(Debug, Clone)]
pub struct Model {
    pub config: DashboardConfig,
    pub api: ApiBase,
    pub started: bool,
    pub locale: LocaleStore,
    pub catalog: LocationCatalog,
    pub selection: LocationSelection,
    pub tab: Tab,
    pub news_category: NewsCategory,
    pub scheme_category: Option<String>,
    pub scheme_search: String,
    pub panels: Panels,
    pub chat: ChatSession,
    pub symptom: SymptomChecker,
    pub notice: Option<String>,
}

impl Default for Model {
    fn default() -> Self {
        let config = DashboardConfig::default();
        let catalog = LocationCatalog::builtin();
        let selection =
            LocationSelection::new(&config.default_state, &config.default_city, &catalog);
        Self {
            locale: LocaleStore::new(config.default_language),
            api: ApiBase::default(),
            config,
            started: false,
            catalog,
            selection,
            tab: Tab::default(),
            news_category: NewsCategory::default(),
            scheme_category: None,
            scheme_search: String::new(),
            panels: Panels::default(),
            chat: ChatSession::default(),
            symptom: SymptomChecker::default(),
            notice: None,
        }
    }
}

impl Model {
    /// Installs a validated config. Before start-up the defaults it carries
    /// also reset language and location.
    pub fn apply_config(&mut self, config: DashboardConfig, api: ApiBase) {
        self.panels.set_policy(config.binding_policy());
        if !self.started {
            self.locale = LocaleStore::new(config.default_language);
            self.selection =
                LocationSelection::new(&config.default_state, &config.default_city, &self.catalog);
        }
        self.api = api;
        self.config = config;
    }

    #[must_use]
    pub fn is_mounted(&self, key: ResourceKey) -> bool {
        ALWAYS_MOUNTED.contains(&key) || self.tab.panels().contains(&key)
    }

    /// Every mounted panel, always-mounted ones first.
    #[must_use]
    pub fn mounted(&self) -> Vec<ResourceKey> {
        ALWAYS_MOUNTED
            .iter()
            .chain(self.tab.panels())
            .copied()
            .collect()
    }

    fn location_params(&self) -> LocationParams {
        LocationParams {
            location: self.selection.location.clone(),
        }
    }

    /// Binds `key` to the params derived from the current selections.
    pub fn bind(&mut self, key: ResourceKey) -> Binding {
        let language = self.locale.language();
        match key {
            ResourceKey::Locations => self.panels.locations.bind(()),
            ResourceKey::Health => self.panels.health.bind(()),
            ResourceKey::ChatStatus => self.panels.chat_status.bind(()),
            ResourceKey::News => self.panels.news.bind(NewsParams {
                language,
                category: self.news_category,
            }),
            ResourceKey::MarketPrices => {
                let params = self.location_params();
                self.panels.market_prices.bind(params)
            }
            ResourceKey::Weather => {
                let params = self.location_params();
                self.panels.weather.bind(params)
            }
            ResourceKey::Hospitals => {
                let params = self.location_params();
                self.panels.hospitals.bind(params)
            }
            ResourceKey::Pharmacies => {
                let params = self.location_params();
                self.panels.pharmacies.bind(params)
            }
            ResourceKey::BloodBanks => {
                let params = self.location_params();
                self.panels.blood_banks.bind(params)
            }
            ResourceKey::FoodPrices => {
                let params = FoodPriceParams {
                    state: self.selection.state.clone().unwrap_or_default(),
                    city: self
                        .selection
                        .city
                        .clone()
                        .unwrap_or_else(|| self.selection.location.clone()),
                    language,
                };
                self.panels.food_prices.bind(params)
            }
            ResourceKey::Schemes => {
                let params = SchemeParams {
                    category: self.scheme_category.clone(),
                    search: self.scheme_search.clone(),
                    language,
                };
                self.panels.schemes.bind(params)
            }
            ResourceKey::Translations => Binding::Unchanged,
        }
    }

    /// Re-binds every mounted panel; only those whose params changed fetch.
    pub fn rebind_mounted(&mut self) -> Vec<Binding> {
        self.mounted()
            .into_iter()
            .map(|key| self.bind(key))
            .filter(|b| *b != Binding::Unchanged)
            .collect()
    }

    /// Switches tab: panels of the old tab are unmounted, those of the new
    /// one bound.
    pub fn select_tab(&mut self, tab: Tab) -> Vec<Binding> {
        if tab == self.tab && self.started {
            return Vec::new();
        }
        for key in self.tab.panels() {
            self.panels.unmount(*key);
        }
        self.tab = tab;
        self.rebind_mounted()
    }

    /// Replaces the location catalog with the backend's, when it has one.
    /// Returns `true` when the selection moved.
    pub fn install_catalog(&mut self) -> bool {
        let Some(catalog) = self
            .panels
            .locations
            .data()
            .cloned()
            .map(LocationsPayload::into_catalog)
        else {
            return false;
        };
        if catalog.regions().is_empty() {
            return false;
        }
        let before = self.selection.clone();
        self.catalog = catalog;
        self.selection.reconcile(&self.catalog);
        before != self.selection
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }
}
