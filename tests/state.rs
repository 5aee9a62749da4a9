#![cfg(feature = "state")]

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use statevisor::state::{
    CookieConfig, CookieStorage, LocalStorage, SameSite, SessionStorage, StateManager, StoragePersistence,
};
use statevisor::{Mediator, Sender, StateError};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Preferences {
    theme: String,
    font_size: u8,
}

#[derive(Default)]
struct Panel {
    seen: Mutex<Vec<(String, Preferences)>>,
}

fn watch(state: &StateManager<impl StoragePersistence>, panel: &Arc<Panel>) {
    state.on_committed(panel, |p: Arc<Panel>, s: Sender, v: Arc<Preferences>| async move {
        p.seen.lock().push((s.name().to_string(), (*v).clone()));
        Ok(())
    });
}

#[tokio::test]
async fn local_state_survives_a_new_manager() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = Preferences {
        theme: "dark".into(),
        font_size: 14,
    };

    {
        let state = StateManager::new(LocalStorage::new(dir.path()), Mediator::builder().build());
        let panel = Arc::new(Panel::default());
        watch(&state, &panel);

        let report = state.commit_state(prefs.clone()).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(
            *panel.seen.lock(),
            vec![("state_manager".to_string(), prefs.clone())]
        );
    }

    let state = StateManager::new(LocalStorage::new(dir.path()), Mediator::builder().build());
    assert_eq!(state.get_state::<Preferences>().await, prefs);
    assert_eq!(state.get_named_state::<Preferences>("other").await, Preferences::default());
}

#[tokio::test]
async fn named_and_unnamed_state_do_not_collide() {
    let state = StateManager::new(SessionStorage::new(), Mediator::builder().build())
        .with_sender(Sender::new("settings"));
    let panel = Arc::new(Panel::default());
    watch(&state, &panel);

    let mobile = Preferences {
        theme: "light".into(),
        font_size: 18,
    };
    let report = state
        .commit_named_state("mobile", mobile.clone())
        .await
        .unwrap();
    assert_eq!(report.topics, 0);
    assert!(panel.seen.lock().is_empty());

    state.commit_state(Preferences::default()).await;
    assert_eq!(panel.seen.lock().len(), 1);
    assert_eq!(panel.seen.lock()[0].0, "settings");

    assert_eq!(state.get_named_state::<Preferences>("mobile").await, mobile);
    assert_eq!(state.get_state::<Preferences>().await, Preferences::default());
    assert_eq!(state.store().len().await, 2);
}

#[tokio::test]
async fn blank_names_are_a_configuration_error() {
    let state = StateManager::new(SessionStorage::new(), Mediator::builder().build());
    for name in ["", "   "] {
        let err = state
            .commit_named_state(name, Preferences::default())
            .await
            .unwrap_err();
        assert_eq!(err, StateError::EmptyName);
    }
    assert!(state.store().is_empty().await);
}

#[tokio::test]
async fn cookie_state_round_trips_through_headers() {
    let cfg = CookieConfig {
        http_only: true,
        same_site: Some(SameSite::Lax),
        ..CookieConfig::default()
    };
    let state = StateManager::new(CookieStorage::new(cfg.clone()), Mediator::builder().build());
    let prefs = Preferences {
        theme: "solarized light".into(),
        font_size: 12,
    };
    state
        .commit_named_state("prefs", prefs.clone())
        .await
        .unwrap();

    let set_cookie = state.store().set_cookie_header("prefs").unwrap();
    assert!(set_cookie.starts_with("prefs="));
    assert!(set_cookie.ends_with("; Path=/; HttpOnly; SameSite=Lax"));

    // Next request carries the cookie back.
    let request = state.store().cookie_header();
    let state = StateManager::new(
        CookieStorage::from_header(&request, cfg),
        Mediator::builder().build(),
    );
    assert_eq!(state.get_named_state::<Preferences>("prefs").await, prefs);
}

#[tokio::test]
async fn dropped_state_subscribers_stop_receiving() {
    let state = StateManager::new(SessionStorage::new(), Mediator::builder().build());
    let panel = Arc::new(Panel::default());
    watch(&state, &panel);
    drop(panel);

    let report = state.commit_state(Preferences::default()).await;
    assert_eq!(report.invoked(), 0);
    assert_eq!(report.pruned, 1);
    assert_eq!(state.mediator().topic_count(), 0);
}
