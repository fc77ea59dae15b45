//! Remote resource binding: one remotely fetched payload, the UI selections
//! that produced it, and an explicit request lifecycle.
//!
//! Every request is numbered per resource. Completions, timeouts and
//! debounce expiries all carry that number back, so late or superseded
//! answers can be recognised and dropped instead of clobbering newer state.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::capabilities::FetchOutcome;
use crate::{AppError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKey {
    Translations,
    Locations,
    News,
    MarketPrices,
    FoodPrices,
    Weather,
    Schemes,
    Hospitals,
    Pharmacies,
    BloodBanks,
    ChatStatus,
    Health,
}

impl ResourceKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Translations => "translations",
            Self::Locations => "locations",
            Self::News => "news",
            Self::MarketPrices => "market-prices",
            Self::FoodPrices => "food-prices",
            Self::Weather => "weather",
            Self::Schemes => "schemes",
            Self::Hospitals => "hospitals",
            Self::Pharmacies => "pharmacies",
            Self::BloodBanks => "blood-banks",
            Self::ChatStatus => "chat-status",
            Self::Health => "health",
        }
    }

    /// Path below the API base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::ChatStatus => "chat/status",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Whether parameter changes hit the network immediately or are coalesced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DebouncePolicy {
    #[default]
    Immediate,
    Delay { millis: u64 },
}

impl DebouncePolicy {
    #[must_use]
    pub const fn normalized(self) -> Self {
        match self {
            Self::Delay { millis: 0 } => Self::Immediate,
            other => other,
        }
    }
}

/// Which of several overlapping requests is allowed to determine what is
/// displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOrder {
    /// Only the most recently issued request may apply; older ones are
    /// discarded when they finish.
    #[default]
    LastIssuedWins,
    /// Every completion applies, so whichever resolves last is shown.
    LastCompletedWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BindingPolicy {
    pub debounce: DebouncePolicy,
    pub order: CompletionOrder,
}

/// A payload type a resource can hold.
pub trait ResourcePayload: DeserializeOwned {
    fn last_updated(&self) -> Option<&str> {
        None
    }

    fn is_empty(&self) -> bool {
        false
    }
}

/// The UI selections a resource depends on; a change in value triggers a
/// fetch.
pub trait ResourceParams: Clone + PartialEq + fmt::Debug {
    fn query(&self) -> Vec<(&'static str, String)>;
}

impl ResourceParams for () {
    fn query(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub key: ResourceKey,
    pub seq: u64,
    pub query: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Issue(RequestTicket),
    Debounce { key: ResourceKey, token: u64, millis: u64 },
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied(ResourceStatus),
    /// A newer request owns the display.
    Superseded,
    /// Not outstanding: timed out, unmounted or never issued.
    Unknown,
}

#[derive(Debug, Clone)]
pub struct RemoteResource<P, T> {
    key: ResourceKey,
    policy: BindingPolicy,
    status: ResourceStatus,
    params: Option<P>,
    data: Option<T>,
    last_updated: Option<String>,
    error: Option<AppError>,
    last_issued: u64,
    in_flight: BTreeSet<u64>,
    debounce_token: u64,
    pending_debounce: Option<u64>,
}

impl<P, T> RemoteResource<P, T>
where
    P: ResourceParams,
    T: ResourcePayload,
{
    #[must_use]
    pub fn new(key: ResourceKey) -> Self {
        Self {
            key,
            policy: BindingPolicy::default(),
            status: ResourceStatus::Idle,
            params: None,
            data: None,
            last_updated: None,
            error: None,
            last_issued: 0,
            in_flight: BTreeSet::new(),
            debounce_token: 0,
            pending_debounce: None,
        }
    }

    #[must_use]
    pub const fn key(&self) -> ResourceKey {
        self.key
    }

    #[must_use]
    pub const fn status(&self) -> ResourceStatus {
        self.status
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn params(&self) -> Option<&P> {
        self.params.as_ref()
    }

    #[must_use]
    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn set_policy(&mut self, policy: BindingPolicy) {
        self.policy = BindingPolicy {
            debounce: policy.debounce.normalized(),
            order: policy.order,
        };
    }

    /// Binds the resource to `params`. A change in value schedules exactly
    /// one request; equal params do nothing.
    pub fn bind(&mut self, params: P) -> Binding {
        if self.params.as_ref() == Some(&params) {
            return Binding::Unchanged;
        }
        self.params = Some(params);

        match self.policy.debounce {
            DebouncePolicy::Delay { millis } if millis > 0 => {
                self.debounce_token += 1;
                self.pending_debounce = Some(self.debounce_token);
                Binding::Debounce {
                    key: self.key,
                    token: self.debounce_token,
                    millis,
                }
            }
            _ => self.issue().map_or(Binding::Unchanged, Binding::Issue),
        }
    }

    /// Re-runs the fetch for the current params, whatever the status.
    pub fn refresh(&mut self) -> Option<RequestTicket> {
        self.issue()
    }

    /// Fires a debounced request if `token` is still the newest one.
    pub fn debounce_elapsed(&mut self, token: u64) -> Option<RequestTicket> {
        if self.pending_debounce != Some(token) {
            return None;
        }
        self.issue()
    }

    fn issue(&mut self) -> Option<RequestTicket> {
        let query = self.params.as_ref()?.query();
        self.pending_debounce = None;
        self.last_issued += 1;
        let seq = self.last_issued;
        self.in_flight.insert(seq);
        self.status = ResourceStatus::Loading;
        Some(RequestTicket {
            key: self.key,
            seq,
            query,
        })
    }

    /// Records the outcome of request `seq`. `Applied` carries the outcome's
    /// own status; the resource itself stays `Loading` while another request
    /// is still outstanding.
    pub fn complete(&mut self, seq: u64, outcome: FetchOutcome) -> Completion {
        if let Some(completion) = self.settle(seq) {
            return completion;
        }

        let parsed = outcome.map_err(AppError::from).and_then(|body| {
            serde_json::from_slice::<T>(&body).map_err(|e| {
                AppError::new(ErrorKind::Deserialization, e.to_string())
                    .with_context("resource", self.key.as_str())
            })
        });

        let status = match parsed {
            Ok(payload) => {
                self.last_updated = payload.last_updated().map(str::to_string);
                self.data = Some(payload);
                self.error = None;
                ResourceStatus::Success
            }
            Err(error) => {
                self.error = Some(error.with_context("resource", self.key.as_str()));
                ResourceStatus::Error
            }
        };
        self.settle_status(status);
        Completion::Applied(status)
    }

    /// Gives up on request `seq`. Its response, if it ever arrives, is
    /// ignored.
    pub fn time_out(&mut self, seq: u64, timeout_ms: u64) -> Completion {
        if let Some(completion) = self.settle(seq) {
            return completion;
        }

        self.error = Some(
            AppError::new(ErrorKind::Timeout, format!("no response after {timeout_ms}ms"))
                .with_context("resource", self.key.as_str()),
        );
        self.settle_status(ResourceStatus::Error);
        Completion::Applied(ResourceStatus::Error)
    }

    /// Takes `seq` off the outstanding set. Returns the verdict when its
    /// outcome must not be applied.
    fn settle(&mut self, seq: u64) -> Option<Completion> {
        if !self.in_flight.remove(&seq) {
            return Some(Completion::Unknown);
        }
        match self.policy.order {
            CompletionOrder::LastIssuedWins if seq != self.last_issued => {
                Some(Completion::Superseded)
            }
            CompletionOrder::LastIssuedWins => {
                // Older requests can no longer apply; forget them so the set
                // stays bounded when timeouts are disabled.
                self.in_flight.clear();
                None
            }
            CompletionOrder::LastCompletedWins => None,
        }
    }

    fn settle_status(&mut self, status: ResourceStatus) {
        self.status = if self.in_flight.is_empty() {
            status
        } else {
            ResourceStatus::Loading
        };
    }

    /// Drops everything but the sequence counter, so answers to requests
    /// issued before the unmount are never mistaken for new ones.
    pub fn unmount(&mut self) {
        self.status = ResourceStatus::Idle;
        self.params = None;
        self.data = None;
        self.last_updated = None;
        self.error = None;
        self.in_flight.clear();
        self.pending_debounce = None;
    }
}
