//! View model handed to the shell. Plain data; every string is already
//! localized and formatted.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::{
    Article, Facility, FoodPrice, NewsCategory, PriceItem, SchemesCatalog, WeatherReport,
};
use crate::chat::{ChatSession, ChatTurn};
use crate::locale::{Language, LocaleStore};
use crate::model::{Model, Tab};
use crate::resource::{RemoteResource, ResourceKey, ResourcePayload, ResourceStatus};
use crate::symptom::{SymptomCheckResult, SymptomChecker, DISCLAIMER};
use crate::{MAPS_DIRECTIONS_URL, NEWS_SUMMARY_PREVIEW_CHARS};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum PanelView<T> {
    Idle,
    /// `stale` is the previous payload, still shown under a spinner.
    Loading { stale: Option<T> },
    Empty,
    Error {
        message: String,
        retry: ResourceKey,
        stale: Option<T>,
    },
    Ready {
        data: T,
        last_updated: Option<String>,
    },
}

impl<T> PanelView<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Payload currently on screen, fresh or stale.
    #[must_use]
    pub fn visible(&self) -> Option<&T> {
        match self {
            Self::Ready { data, .. } => Some(data),
            Self::Loading { stale } | Self::Error { stale, .. } => stale.as_ref(),
            Self::Idle | Self::Empty => None,
        }
    }
}

fn panel<P, T, V>(resource: &RemoteResource<P, T>, render: impl Fn(&T) -> V) -> PanelView<V>
where
    P: crate::resource::ResourceParams,
    T: ResourcePayload,
{
    let stale = || resource.data().map(&render);
    match resource.status() {
        ResourceStatus::Idle => PanelView::Idle,
        ResourceStatus::Loading => PanelView::Loading { stale: stale() },
        ResourceStatus::Error => PanelView::Error {
            message: resource
                .error()
                .map_or_else(String::new, crate::AppError::user_facing_message),
            retry: resource.key(),
            stale: stale(),
        },
        ResourceStatus::Success => match resource.data() {
            Some(data) if !data.is_empty() => PanelView::Ready {
                data: render(data),
                last_updated: resource.last_updated().map(str::to_string),
            },
            _ => PanelView::Empty,
        },
    }
}

// --- Formatting ---

/// `42` for whole amounts, otherwise up to two decimals.
fn format_amount(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        return format!("{value:.0}");
    }
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    #[must_use]
    pub fn from_change(change: Option<f64>, hint: Option<&str>) -> Self {
        match change {
            Some(c) if c > 0.0 => Self::Up,
            Some(c) if c < 0.0 => Self::Down,
            Some(_) => Self::Flat,
            None => match hint.map(str::to_ascii_lowercase).as_deref() {
                Some("up" | "rising" | "increase") => Self::Up,
                Some("down" | "falling" | "decrease") => Self::Down,
                _ => Self::Flat,
            },
        }
    }
}

/// `₹42/kg`. Units that are already a phrase ("per kg", "प्रति किलो") are
/// appended after a space.
#[must_use]
pub fn price_text(price: Option<f64>, unit: Option<&str>) -> String {
    let Some(price) = price else {
        return String::new();
    };
    let amount = format!("₹{}", format_amount(price));
    match unit.map(str::trim).filter(|u| !u.is_empty()) {
        None => amount,
        Some(unit) if unit.contains(char::is_whitespace) || !unit.is_ascii() => {
            format!("{amount} {unit}")
        }
        Some(unit) => format!("{amount}/{}", unit.trim_start_matches('/')),
    }
}

/// Percent change with an explicit sign: `+1.5%`, `-3.2%`.
#[must_use]
pub fn change_text(change: Option<f64>) -> Option<String> {
    let change = change?;
    Some(if change > 0.0 {
        format!("+{}%", format_amount(change))
    } else {
        format!("{}%", format_amount(change))
    })
}

/// Map-service route to `lat,lon`, or `None` for missing or impossible
/// coordinates.
#[must_use]
pub fn directions_url(lat: Option<f64>, lon: Option<f64>) -> Option<String> {
    let (lat, lon) = (lat?, lon?);
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    let raw = format!("{MAPS_DIRECTIONS_URL}?api=1&destination={lat},{lon}");
    Url::parse(&raw).ok().map(String::from)
}

fn preview(text: &str) -> String {
    if text.chars().count() <= NEWS_SUMMARY_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(NEWS_SUMMARY_PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}

// --- Rows ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ArticleView {
    pub title: String,
    pub summary: String,
    pub date: Option<String>,
    pub category: Option<String>,
    pub url: Option<String>,
}

impl From<&Article> for ArticleView {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            summary: preview(&article.summary),
            date: article.date.clone(),
            category: article.category.clone(),
            url: article
                .url
                .clone()
                .filter(|u| Url::parse(u).is_ok_and(|p| matches!(p.scheme(), "http" | "https"))),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PriceRow {
    pub name: String,
    pub icon: Option<String>,
    pub price_text: String,
    pub trend: Trend,
    pub change_text: Option<String>,
    pub market: Option<String>,
}

impl From<&PriceItem> for PriceRow {
    fn from(item: &PriceItem) -> Self {
        Self {
            name: item.name.clone(),
            icon: None,
            price_text: price_text(item.price, item.unit.as_deref()),
            trend: Trend::from_change(item.change, item.trend.as_deref()),
            change_text: change_text(item.change),
            market: None,
        }
    }
}

impl From<&FoodPrice> for PriceRow {
    fn from(item: &FoodPrice) -> Self {
        Self {
            name: item
                .display_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| item.name.clone()),
            icon: item.icon.clone(),
            price_text: price_text(item.price, item.unit.as_deref()),
            trend: Trend::from_change(item.change, None),
            change_text: change_text(item.change),
            market: item.market.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ForecastRow {
    pub day: String,
    pub icon: Option<String>,
    pub high_low: String,
    pub rain_text: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WeatherView {
    pub temperature_text: Option<String>,
    pub condition: Option<String>,
    pub icon: Option<String>,
    pub humidity_text: Option<String>,
    pub wind_text: Option<String>,
    pub advisory: Vec<String>,
    pub forecast: Vec<ForecastRow>,
}

fn degrees(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{}°", format_amount(v.round())))
}

impl WeatherView {
    fn new(report: &WeatherReport) -> Self {
        let current = report.current.as_ref();
        Self {
            temperature_text: current
                .and_then(|c| c.temperature)
                .map(|t| format!("{}°C", format_amount(t.round()))),
            condition: current.and_then(|c| c.condition.clone()),
            icon: current.and_then(|c| c.icon.clone()),
            humidity_text: current
                .and_then(|c| c.humidity)
                .map(|h| format!("{}%", format_amount(h.round()))),
            wind_text: current
                .and_then(|c| c.wind_speed)
                .map(|w| format!("{} km/h", format_amount(w))),
            advisory: report.advisory.clone(),
            forecast: report
                .forecast
                .iter()
                .map(|day| ForecastRow {
                    day: day.day.clone(),
                    icon: day.icon.clone(),
                    high_low: format!("{} / {}", degrees(day.temp_max), degrees(day.temp_min)),
                    rain_text: day
                        .rain_chance
                        .map(|r| format!("{}%", format_amount(r.round()))),
                })
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SchemeRow {
    pub name: String,
    pub description: String,
    pub eligibility: Vec<String>,
    pub benefits: Vec<String>,
    pub documents: Vec<String>,
    pub apply_link: Option<String>,
    pub helpline: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CategoryOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SchemesView {
    pub schemes: Vec<SchemeRow>,
    pub categories: Vec<CategoryOption>,
}

fn schemes_view(catalog: &SchemesCatalog, language: Language, selected: Option<&str>) -> SchemesView {
    let items = |field: &Option<crate::api::TextOrList>| {
        field.as_ref().map(crate::api::TextOrList::items).unwrap_or_default()
    };
    SchemesView {
        schemes: catalog
            .schemes
            .iter()
            .map(|s| SchemeRow {
                name: s.name.clone(),
                description: s.description.clone().unwrap_or_default(),
                eligibility: items(&s.eligibility),
                benefits: items(&s.benefits),
                documents: items(&s.documents),
                apply_link: s.apply_link.clone(),
                helpline: s.helpline.clone(),
            })
            .collect(),
        categories: catalog
            .categories
            .iter()
            .map(|c| CategoryOption {
                id: c.id.clone(),
                label: c.label(language).to_string(),
                selected: selected == Some(c.id.as_str()),
            })
            .collect(),
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FacilityRow {
    pub name: String,
    pub kind: Option<String>,
    pub distance_text: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency: bool,
    pub open_24x7: bool,
    pub directions_url: Option<String>,
}

impl From<&Facility> for FacilityRow {
    fn from(facility: &Facility) -> Self {
        Self {
            name: facility.name.clone(),
            kind: facility.kind.clone(),
            distance_text: facility.distance.as_ref().map(|d| match d {
                crate::api::Scalar::Number(km) => format!("{} km", format_amount(*km)),
                crate::api::Scalar::Text(text) => text.clone(),
            }),
            phone: facility.phone.clone().filter(|p| !p.trim().is_empty()),
            address: facility.address.clone(),
            emergency: facility.emergency.unwrap_or(false),
            open_24x7: facility.is_24x7.unwrap_or(false),
            directions_url: directions_url(facility.lat, facility.lon),
        }
    }
}

// --- Chrome ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LanguageOption {
    pub language: Language,
    pub label: String,
    pub selected: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TabView {
    pub tab: Tab,
    pub label: String,
    pub selected: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LocationView {
    pub states: Vec<String>,
    pub state: Option<String>,
    pub cities: Vec<String>,
    pub city: Option<String>,
    /// `false` when the selected state has no cities.
    pub city_enabled: bool,
    /// Flat list for the single-dropdown selector.
    pub locations: Vec<String>,
    pub location: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Labels {
    pub title: String,
    pub refresh: String,
    pub retry: String,
    pub loading: String,
    pub last_updated: String,
    pub location: String,
    pub state: String,
    pub city: String,
}

impl Labels {
    fn new(locale: &LocaleStore) -> Self {
        let text = |key: &str, fallback: &str| locale.get_text(key, fallback).to_string();
        Self {
            title: text("dashboard_title", "Rural Dashboard"),
            refresh: text("refresh", "Refresh"),
            retry: text("retry", "Retry"),
            loading: text("loading", "Loading..."),
            last_updated: text("last_updated", "Last updated"),
            location: text("location", "Location"),
            state: text("state", "State"),
            city: text("city", "City"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatView {
    pub turns: Vec<ChatTurn>,
    pub input: String,
    pub pending: bool,
    pub can_send: bool,
    /// Input is over [`crate::MAX_CHAT_MESSAGE_CHARS`] and will not be sent.
    pub too_long: bool,
    /// Index of the turn to scroll into view.
    pub scroll_to: Option<usize>,
    pub listening: bool,
    pub voice_notice: Option<String>,
    pub assistant_configured: Option<bool>,
}

impl ChatView {
    fn new(chat: &ChatSession, configured: Option<bool>) -> Self {
        Self {
            turns: chat.turns.clone(),
            input: chat.input.clone(),
            pending: chat.is_pending(),
            can_send: chat.can_send(),
            too_long: chat.input_too_long(),
            scroll_to: chat.latest_index(),
            listening: chat.voice.listening,
            voice_notice: chat.voice.notice.clone(),
            assistant_configured: configured,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SymptomView {
    pub input: String,
    pub pending: bool,
    pub can_check: bool,
    pub too_long: bool,
    pub result: Option<SymptomCheckResult>,
    pub disclaimer: String,
}

impl From<&SymptomChecker> for SymptomView {
    fn from(checker: &SymptomChecker) -> Self {
        Self {
            input: checker.input.clone(),
            pending: checker.is_pending(),
            can_check: checker.can_check(),
            too_long: checker.input_too_long(),
            result: checker.result.clone(),
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    pub labels: Labels,
    pub language: Language,
    pub languages: Vec<LanguageOption>,
    pub tabs: Vec<TabView>,
    pub location: LocationView,
    pub backend_online: Option<bool>,
    pub notice: Option<String>,

    pub news_category: NewsCategory,
    pub news: PanelView<Vec<ArticleView>>,

    pub market_prices: PanelView<Vec<PriceRow>>,
    pub food_prices: PanelView<Vec<PriceRow>>,
    pub weather: PanelView<WeatherView>,
    pub scheme_search: String,
    pub schemes: PanelView<SchemesView>,

    pub hospitals: PanelView<Vec<FacilityRow>>,
    pub pharmacies: PanelView<Vec<FacilityRow>>,
    pub blood_banks: PanelView<Vec<FacilityRow>>,
    pub symptom_checker: SymptomView,

    pub chat: ChatView,
}

impl Default for ViewModel {
    fn default() -> Self {
        build(&Model::default())
    }
}

#[must_use]
pub fn build(model: &Model) -> ViewModel {
    let locale = &model.locale;
    let language = locale.language();
    let selection = &model.selection;
    let catalog = &model.catalog;
    let panels = &model.panels;
    let facilities = |f: &crate::api::Facilities| -> Vec<FacilityRow> {
        f.facilities.iter().map(FacilityRow::from).collect()
    };

    ViewModel {
        labels: Labels::new(locale),
        language,
        languages: Language::ALL
            .iter()
            .map(|l| LanguageOption {
                language: *l,
                label: l.native_name().to_string(),
                selected: *l == language,
            })
            .collect(),
        tabs: Tab::ALL
            .iter()
            .map(|t| TabView {
                tab: *t,
                label: locale.get_text(t.label_key(), default_tab_label(*t)).to_string(),
                selected: *t == model.tab,
            })
            .collect(),
        location: LocationView {
            states: catalog.states().iter().map(|s| (*s).to_string()).collect(),
            state: selection.state.clone(),
            cities: selection
                .state
                .as_deref()
                .map(|s| catalog.cities(s).to_vec())
                .unwrap_or_default(),
            city: selection.city.clone(),
            city_enabled: selection.city_enabled(catalog),
            locations: catalog.all_locations().iter().map(|l| (*l).to_string()).collect(),
            location: selection.location.clone(),
        },
        backend_online: match panels.health.status() {
            ResourceStatus::Success => panels.health.data().map(crate::api::HealthStatus::is_ok),
            ResourceStatus::Error => Some(false),
            ResourceStatus::Idle | ResourceStatus::Loading => None,
        },
        notice: model.notice.clone(),

        news_category: model.news_category,
        news: panel(&panels.news, |feed| {
            feed.articles.iter().map(ArticleView::from).collect()
        }),

        market_prices: panel(&panels.market_prices, |p| {
            p.prices.iter().map(PriceRow::from).collect()
        }),
        food_prices: panel(&panels.food_prices, |p| p.0.iter().map(PriceRow::from).collect()),
        weather: panel(&panels.weather, WeatherView::new),
        scheme_search: model.scheme_search.clone(),
        schemes: panel(&panels.schemes, |c| {
            schemes_view(c, language, model.scheme_category.as_deref())
        }),

        hospitals: panel(&panels.hospitals, facilities),
        pharmacies: panel(&panels.pharmacies, facilities),
        blood_banks: panel(&panels.blood_banks, facilities),
        symptom_checker: SymptomView::from(&model.symptom),

        chat: ChatView::new(
            &model.chat,
            panels.chat_status.data().map(|s| s.configured),
        ),
    }
}

const fn default_tab_label(tab: Tab) -> &'static str {
    match tab {
        Tab::Education => "Education",
        Tab::Agriculture => "Agriculture",
        Tab::Health => "Health",
        Tab::Chat => "Assistant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::HttpError;
    use crate::resource::Binding;

    mod format_tests {
        use super::*;

        #[test]
        fn market_price_row() {
            let item: PriceItem =
                serde_json::from_str(r#"{"name": "Onion", "price": 42, "change": -3.2, "unit": "kg"}"#)
                    .unwrap();
            let row = PriceRow::from(&item);
            assert_eq!(row.trend, Trend::Down);
            assert_eq!(row.price_text, "₹42/kg");
            assert!(row.price_text.ends_with("/kg"));
            assert_eq!(row.change_text.as_deref(), Some("-3.2%"));
        }

        #[test]
        fn localized_unit_phrase_is_spaced() {
            assert_eq!(price_text(Some(55.0), Some("per liter")), "₹55 per liter");
            assert_eq!(price_text(Some(12.5), None), "₹12.5");
            assert_eq!(price_text(None, Some("kg")), "");
        }

        #[test]
        fn trend_falls_back_to_hint() {
            assert_eq!(Trend::from_change(None, Some("UP")), Trend::Up);
            assert_eq!(Trend::from_change(None, Some("stable")), Trend::Flat);
            assert_eq!(Trend::from_change(Some(0.0), Some("up")), Trend::Flat);
            assert_eq!(change_text(Some(1.5)).as_deref(), Some("+1.5%"));
        }

        #[test]
        fn directions_link() {
            assert_eq!(
                directions_url(Some(16.5062), Some(80.648)).as_deref(),
                Some("https://www.google.com/maps/dir/?api=1&destination=16.5062,80.648")
            );
            assert!(directions_url(Some(120.0), Some(80.0)).is_none());
            assert!(directions_url(None, Some(80.0)).is_none());
        }

        #[test]
        fn long_summaries_are_shortened() {
            let long = "x".repeat(NEWS_SUMMARY_PREVIEW_CHARS + 20);
            let shown = preview(&long);
            assert_eq!(shown.chars().count(), NEWS_SUMMARY_PREVIEW_CHARS + 1);
        }
    }

    mod panel_tests {
        use super::*;

        fn bound_news(model: &mut Model) -> u64 {
            match model.bind(ResourceKey::News) {
                Binding::Issue(ticket) => ticket.seq,
                other => panic!("expected request, got {other:?}"),
            }
        }

        #[test]
        fn unreachable_news_shows_retryable_error() {
            let mut model = Model::default();
            let seq = bound_news(&mut model);
            assert!(build(&model).news.is_loading());

            model.panels.complete(
                ResourceKey::News,
                seq,
                Err(HttpError::Transport {
                    message: "connection refused".into(),
                }),
            );
            match build(&model).news {
                PanelView::Error { retry, stale, message } => {
                    assert_eq!(retry, ResourceKey::News);
                    assert!(stale.is_none());
                    assert!(!message.is_empty());
                }
                other => panic!("expected error, got {other:?}"),
            }
        }

        #[test]
        fn empty_feed_is_empty_not_ready() {
            let mut model = Model::default();
            let seq = bound_news(&mut model);
            model
                .panels
                .complete(ResourceKey::News, seq, Ok(br#"{"articles": []}"#.to_vec()));
            assert_eq!(build(&model).news, PanelView::Empty);
        }

        #[test]
        fn refresh_keeps_stale_rows_visible() {
            let mut model = Model::default();
            let seq = bound_news(&mut model);
            model.panels.complete(
                ResourceKey::News,
                seq,
                Ok(br#"{"articles": [{"title": "Kharif sowing"}], "last_updated": "09:00"}"#.to_vec()),
            );
            match build(&model).news {
                PanelView::Ready { data, last_updated } => {
                    assert_eq!(data[0].title, "Kharif sowing");
                    assert_eq!(last_updated.as_deref(), Some("09:00"));
                }
                other => panic!("expected ready, got {other:?}"),
            }

            model.panels.refresh(ResourceKey::News).unwrap();
            let view = build(&model).news;
            assert!(view.is_loading());
            assert_eq!(view.visible().unwrap()[0].title, "Kharif sowing");
        }

        #[test]
        fn disclaimer_is_always_present() {
            let view = build(&Model::default());
            assert_eq!(view.symptom_checker.disclaimer, DISCLAIMER);
            assert!(!view.symptom_checker.can_check);
        }

        #[test]
        fn tabs_use_translated_labels() {
            let model = Model::default();
            let view = build(&model);
            assert_eq!(view.tabs.len(), 4);
            assert!(view.tabs[0].selected);
            assert!(view.location.city_enabled);
            assert_eq!(view.location.states, vec!["Andhra Pradesh", "Telangana"]);
        }
    }
}
