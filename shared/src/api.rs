//! Backend payloads and request parameters.
//!
//! Every field is optional or defaulted: a payload missing fields renders
//! blanks instead of failing the whole panel. Fields of the wrong type are
//! read as missing, so one bad cell never costs the rest of the rows.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::locale::Language;
use crate::resource::{ResourceParams, ResourcePayload};

/// Number-or-string value; ids and distances arrive as either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.0}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A field the backend sends either as one string or as a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl TextOrList {
    #[must_use]
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::Text(text) if text.trim().is_empty() => Vec::new(),
            Self::Text(text) => vec![text.clone()],
            Self::List(items) => items.clone(),
        }
    }
}

/// Field readers that degrade a wrongly typed value to its default.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(T::deserialize(value).ok())
    }

    /// Numeric strings such as `"42"` or `" 3.5 "` count as numbers.
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        })
    }

    /// Numbers are kept as their decimal text (`"phone": 104`).
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(text(deserializer)?.unwrap_or_default())
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
    }

    /// Anything but an array is empty; entries that do not fit are skipped.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| T::deserialize(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}

// --- News ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "lenient::option")]
    pub id: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, alias = "description", deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(default, alias = "publishedAt", deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "NewsFeedRepr")]
pub struct NewsFeed {
    pub articles: Vec<Article>,
    pub last_updated: Option<String>,
}

/// Older backends answer `/news` with a bare article list.
#[derive(Deserialize)]
#[serde(untagged)]
enum NewsFeedRepr {
    Feed {
        #[serde(default, deserialize_with = "lenient::list")]
        articles: Vec<Article>,
        #[serde(default, deserialize_with = "lenient::text")]
        last_updated: Option<String>,
    },
    List(Vec<Article>),
}

impl From<NewsFeedRepr> for NewsFeed {
    fn from(repr: NewsFeedRepr) -> Self {
        match repr {
            NewsFeedRepr::Feed {
                articles,
                last_updated,
            } => Self {
                articles,
                last_updated,
            },
            NewsFeedRepr::List(articles) => Self {
                articles,
                last_updated: None,
            },
        }
    }
}

impl ResourcePayload for NewsFeed {
    fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    #[default]
    All,
    Education,
    Agriculture,
    Health,
    Employment,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 5] = [
        NewsCategory::All,
        NewsCategory::Education,
        NewsCategory::Agriculture,
        NewsCategory::Health,
        NewsCategory::Employment,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Education => "education",
            Self::Agriculture => "agriculture",
            Self::Health => "health",
            Self::Employment => "employment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsParams {
    pub language: Language,
    pub category: NewsCategory,
}

impl ResourceParams for NewsParams {
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("language", self.language.code().to_string()),
            ("category", self.category.as_str().to_string()),
        ]
    }
}

// --- Prices ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceItem {
    #[serde(default, deserialize_with = "lenient::option")]
    pub id: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub trend: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketPrices {
    #[serde(default, deserialize_with = "lenient::list")]
    pub prices: Vec<PriceItem>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_updated: Option<String>,
}

impl ResourcePayload for MarketPrices {
    fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// `/food-prices` row: already localized by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FoodPrice {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub market: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodPrices(#[serde(deserialize_with = "lenient::list")] pub Vec<FoodPrice>);

impl ResourcePayload for FoodPrices {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParams {
    pub location: String,
}

impl ResourceParams for LocationParams {
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("location", self.location.clone())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodPriceParams {
    pub state: String,
    pub city: String,
    pub language: Language,
}

impl ResourceParams for FoodPriceParams {
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("lang", self.language.code().to_string()),
            ("state", self.state.clone()),
            ("city", self.city.clone()),
        ]
    }
}

// --- Weather ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(default, alias = "temp", deserialize_with = "lenient::number")]
    pub temperature: Option<f64>,
    #[serde(default, alias = "description", deserialize_with = "lenient::text")]
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastDay {
    #[serde(default, deserialize_with = "lenient::string")]
    pub day: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub temp_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub temp_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rain_chance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherReport {
    #[serde(default, deserialize_with = "lenient::option")]
    pub current: Option<CurrentWeather>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub advisory: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub forecast: Vec<ForecastDay>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_updated: Option<String>,
}

impl ResourcePayload for WeatherReport {
    fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    fn is_empty(&self) -> bool {
        self.current.is_none() && self.forecast.is_empty() && self.advisory.is_empty()
    }
}

// --- Schemes ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scheme {
    #[serde(default, deserialize_with = "lenient::option")]
    pub id: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub eligibility: Option<TextOrList>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub benefits: Option<TextOrList>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub documents: Option<TextOrList>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub apply_link: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub helpline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemeCategory {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name_te: Option<String>,
}

impl SchemeCategory {
    /// Category label in `language`; only Telugu names are provided.
    #[must_use]
    pub fn label(&self, language: Language) -> &str {
        match (language, self.name_te.as_deref()) {
            (Language::Te, Some(te)) if !te.is_empty() => te,
            _ => &self.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemesCatalog {
    #[serde(default, deserialize_with = "lenient::list")]
    pub schemes: Vec<Scheme>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub categories: Vec<SchemeCategory>,
}

impl ResourcePayload for SchemesCatalog {
    fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeParams {
    pub category: Option<String>,
    pub search: String,
    pub language: Language,
}

impl ResourceParams for SchemeParams {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(3);
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            query.push(("category", category.to_string()));
        }
        let search = self.search.trim();
        if !search.is_empty() {
            query.push(("search", search.to_string()));
        }
        query.push(("language", self.language.code().to_string()));
        query
    }
}

// --- Health services ---

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Facility {
    #[serde(default, deserialize_with = "lenient::option")]
    pub id: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, rename = "type", deserialize_with = "lenient::text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub distance: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub emergency: Option<bool>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub is_24x7: Option<bool>,
}

/// Hospitals, pharmacies and blood banks share one shape; only the list key
/// differs per endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "FacilitiesRepr")]
pub struct Facilities {
    pub facilities: Vec<Facility>,
}

/// Every list key the endpoints use. The first non-empty one wins.
#[derive(Deserialize)]
struct FacilitiesRepr {
    #[serde(default, deserialize_with = "lenient::list")]
    facilities: Vec<Facility>,
    #[serde(default, deserialize_with = "lenient::list")]
    hospitals: Vec<Facility>,
    #[serde(default, deserialize_with = "lenient::list")]
    pharmacies: Vec<Facility>,
    #[serde(default, deserialize_with = "lenient::list")]
    blood_banks: Vec<Facility>,
}

impl From<FacilitiesRepr> for Facilities {
    fn from(repr: FacilitiesRepr) -> Self {
        let facilities = [repr.facilities, repr.hospitals, repr.pharmacies, repr.blood_banks]
            .into_iter()
            .find(|list| !list.is_empty())
            .unwrap_or_default();
        Self { facilities }
    }
}

impl ResourcePayload for Facilities {
    fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}

// --- Assistant ---

/// Reply of `/chat` and `/symptom-checker`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssistantReply {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient::string")]
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatPayload {
    pub message: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomPayload {
    pub symptoms: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatStatus {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub configured: bool,
    #[serde(default, deserialize_with = "lenient::string")]
    pub message: String,
}

impl ResourcePayload for ChatStatus {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

impl ResourcePayload for HealthStatus {
    fn last_updated(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}
