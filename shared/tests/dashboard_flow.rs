use crux_core::testing::AppTester;
use rural_dashboard::capabilities::{HttpError, TimerOperation};
use rural_dashboard::event::TimerTag;
use rural_dashboard::model::Tab;
use rural_dashboard::resource::{DebouncePolicy, ResourceKey, ResourceStatus};
use rural_dashboard::view::{PanelView, Trend};
use rural_dashboard::{App, DashboardConfig, Effect, Event, Model};

fn http_urls(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Http(req) => Some(req.operation.url.clone()),
            _ => None,
        })
        .collect()
}

fn timer_waits(effects: &[Effect]) -> Vec<u64> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Timer(req) => match req.operation {
                TimerOperation::NotifyAfter { millis } => Some(millis),
            },
            _ => None,
        })
        .collect()
}

fn started() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let update = app.update(Event::AppStarted, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Render(_))));
    (app, model)
}

fn fetched(key: ResourceKey, seq: u64, body: &str) -> Event {
    Event::ResourceFetched {
        key,
        seq,
        outcome: Ok(body.as_bytes().to_vec()),
    }
}

#[test]
fn unreachable_news_becomes_retryable_error() {
    let (app, mut model) = started();
    assert_eq!(model.panels.news.status(), ResourceStatus::Loading);

    let _ = app.update(
        Event::ResourceFetched {
            key: ResourceKey::News,
            seq: 1,
            outcome: Err(HttpError::Transport {
                message: "connection refused".into(),
            }),
        },
        &mut model,
    );

    match app.view(&model).news {
        PanelView::Error { retry, .. } => assert_eq!(retry, ResourceKey::News),
        other => panic!("expected error, got {other:?}"),
    }

    let update = app.update(Event::RetryRequested(ResourceKey::News), &mut model);
    assert_eq!(
        http_urls(&update.effects),
        vec!["http://localhost:8000/news?language=en&category=all"]
    );
    assert_eq!(model.panels.news.status(), ResourceStatus::Loading);
}

#[test]
fn stuck_request_times_out() {
    let (app, mut model) = started();
    let _ = app.update(
        Event::TimerElapsed(TimerTag::RequestDeadline {
            key: ResourceKey::News,
            seq: 1,
        }),
        &mut model,
    );
    assert_eq!(model.panels.news.status(), ResourceStatus::Error);

    let _ = app.update(fetched(ResourceKey::News, 1, r#"{"articles": [{"title": "late"}]}"#), &mut model);
    assert_eq!(model.panels.news.status(), ResourceStatus::Error);
    assert!(model.panels.news.data().is_none());
}

#[test]
fn selecting_andhra_pradesh_picks_first_city() {
    let (app, mut model) = started();
    let _ = app.update(Event::StateSelected("Telangana".into()), &mut model);
    assert_eq!(model.selection.city.as_deref(), Some("Hyderabad"));

    let _ = app.update(Event::StateSelected("Andhra Pradesh".into()), &mut model);
    let view = app.view(&model);
    assert_eq!(view.location.city.as_deref(), Some("Visakhapatnam"));
    assert_eq!(view.location.cities.len(), 10);
    assert!(view.location.city_enabled);
}

#[test]
fn market_price_renders_trend_and_unit() {
    let (app, mut model) = started();
    let update = app.update(Event::TabSelected(Tab::Agriculture), &mut model);
    let urls = http_urls(&update.effects);
    assert!(urls.contains(&"http://localhost:8000/market-prices?location=Vijayawada".to_string()));
    assert!(urls.contains(
        &"http://localhost:8000/food-prices?lang=en&state=Andhra+Pradesh&city=Vijayawada".to_string()
    ));
    assert!(urls.contains(&"http://localhost:8000/schemes?language=en".to_string()));

    let _ = app.update(
        fetched(
            ResourceKey::MarketPrices,
            1,
            r#"{"prices": [{"id": 1, "name": "Tomato", "price": 42, "change": -3.2, "unit": "kg"}], "last_updated": "2026-10-16 09:00"}"#,
        ),
        &mut model,
    );

    match app.view(&model).market_prices {
        PanelView::Ready { data, last_updated } => {
            assert_eq!(data[0].trend, Trend::Down);
            assert!(data[0].price_text.ends_with("/kg"));
            assert_eq!(last_updated.as_deref(), Some("2026-10-16 09:00"));
        }
        other => panic!("expected ready, got {other:?}"),
    }
}

#[test]
fn malformed_price_cell_keeps_other_rows() {
    let (app, mut model) = started();
    let _ = app.update(Event::TabSelected(Tab::Agriculture), &mut model);
    let _ = app.update(
        fetched(
            ResourceKey::MarketPrices,
            1,
            r#"{"prices": [{"name": "Onion", "price": "n/a", "unit": "kg"}, {"name": "Rice", "price": 45, "unit": "kg"}]}"#,
        ),
        &mut model,
    );

    match app.view(&model).market_prices {
        PanelView::Ready { data, .. } => {
            assert_eq!(data.len(), 2);
            assert_eq!(data[0].name, "Onion");
            assert_eq!(data[0].price_text, "");
            assert_eq!(data[1].price_text, "₹45/kg");
        }
        other => panic!("expected ready, got {other:?}"),
    }
}

#[test]
fn debounced_selection_fetches_once_after_quiet_period() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let config = DashboardConfig {
        debounce: DebouncePolicy::Delay { millis: 300 },
        request_timeout_ms: 0,
        ..DashboardConfig::default()
    };
    let _ = app.update(Event::Configure(config), &mut model);

    let update = app.update(Event::AppStarted, &mut model);
    assert_eq!(
        http_urls(&update.effects),
        vec!["http://localhost:8000/translations?lang=en"]
    );
    assert_eq!(timer_waits(&update.effects), vec![300, 300, 300]);

    let update = app.update(Event::TabSelected(Tab::Health), &mut model);
    assert!(http_urls(&update.effects).is_empty());
    assert_eq!(timer_waits(&update.effects), vec![300, 300, 300]);

    let update = app.update(Event::CitySelected("Guntur".into()), &mut model);
    assert!(http_urls(&update.effects).is_empty());
    assert_eq!(timer_waits(&update.effects).len(), 3);

    // The timer armed before the city change no longer fires a request.
    let update = app.update(
        Event::TimerElapsed(TimerTag::Debounce {
            key: ResourceKey::Hospitals,
            token: 1,
        }),
        &mut model,
    );
    assert!(http_urls(&update.effects).is_empty());

    let update = app.update(
        Event::TimerElapsed(TimerTag::Debounce {
            key: ResourceKey::Hospitals,
            token: 2,
        }),
        &mut model,
    );
    assert_eq!(
        http_urls(&update.effects),
        vec!["http://localhost:8000/hospitals?location=Guntur"]
    );
    assert!(timer_waits(&update.effects).is_empty());
    assert_eq!(model.panels.hospitals.status(), ResourceStatus::Loading);

    let update = app.update(
        Event::TimerElapsed(TimerTag::Debounce {
            key: ResourceKey::Hospitals,
            token: 2,
        }),
        &mut model,
    );
    assert!(http_urls(&update.effects).is_empty());
}

#[test]
fn city_change_refetches_only_location_panels() {
    let (app, mut model) = started();
    let _ = app.update(Event::TabSelected(Tab::Health), &mut model);
    let update = app.update(Event::CitySelected("Guntur".into()), &mut model);
    let urls = http_urls(&update.effects);
    assert_eq!(
        urls,
        vec![
            "http://localhost:8000/hospitals?location=Guntur",
            "http://localhost:8000/pharmacies?location=Guntur",
            "http://localhost:8000/blood-banks?location=Guntur",
        ]
    );
}

#[test]
fn city_outside_state_is_rejected() {
    let (app, mut model) = started();
    let update = app.update(Event::CitySelected("Hyderabad".into()), &mut model);
    assert!(http_urls(&update.effects).is_empty());
    assert_eq!(model.selection.city.as_deref(), Some("Vijayawada"));
}

#[test]
fn leaving_a_tab_drops_its_late_responses() {
    let (app, mut model) = started();
    let _ = app.update(Event::TabSelected(Tab::Agriculture), &mut model);
    let _ = app.update(Event::TabSelected(Tab::Education), &mut model);
    let _ = app.update(
        fetched(ResourceKey::Weather, 1, r#"{"forecast": [{"day": "Mon"}]}"#),
        &mut model,
    );
    assert_eq!(model.panels.weather.status(), ResourceStatus::Idle);
    assert!(model.panels.weather.data().is_none());
}

#[test]
fn backend_catalog_replaces_builtin() {
    let (app, mut model) = started();
    let update = app.update(
        fetched(
            ResourceKey::Locations,
            1,
            r#"{"Karnataka": {"Mysuru": {"modifier": 1.0}, "Hubballi": {"modifier": 0.9}}}"#,
        ),
        &mut model,
    );
    assert_eq!(model.selection.state.as_deref(), Some("Karnataka"));
    assert_eq!(model.selection.location, "Mysuru");
    assert_eq!(
        http_urls(&update.effects),
        Vec::<String>::new(),
        "news is not location-bound"
    );
}

#[test]
fn translation_failure_keeps_navigation_labels() {
    let (app, mut model) = started();
    let _ = app.update(Event::LanguageSelected(rural_dashboard::locale::Language::Hi), &mut model);
    let seq = 2;
    let _ = app.update(
        Event::TranslationsFetched {
            seq,
            outcome: Err(HttpError::Status {
                status: 500,
                body: None,
            }),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert!(view.tabs.iter().all(|t| !t.label.is_empty()));
    assert_eq!(
        model.locale.translations_language(),
        rural_dashboard::locale::Language::Hi
    );
}
