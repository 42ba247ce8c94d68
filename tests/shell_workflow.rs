use std::sync::Arc;

use clusterm::cache::LiveResourceCache;
use clusterm::config::{CacheConfig, CompletionConfig};
use clusterm::grammar::ToolNames;
use clusterm::history::{ContextStore, SharedStore};
use clusterm::repl::completion::{ClusterCandidateProvider, CompletionEngine};
use clusterm::repl::{Outcome, Session};
use tempfile::TempDir;

fn engine_for(store: SharedStore) -> CompletionEngine {
    let tools = ToolNames::default();
    let provider = Arc::new(ClusterCandidateProvider::new(
        tools,
        LiveResourceCache::offline(&CacheConfig::default()),
        store,
        CompletionConfig::default(),
    ));
    CompletionEngine::new(provider)
}

fn session_for(store: SharedStore) -> Session {
    Session::new(
        store,
        LiveResourceCache::offline(&CacheConfig::default()),
        ToolNames::default(),
    )
}

#[test]
fn submitted_commands_survive_restart_in_their_context() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    {
        let store = ContextStore::open(&path, ToolNames::default()).into_shared();
        let session = session_for(store);
        session.handle(":context prod web");
        assert!(matches!(
            session.handle("kubectl get pods nginx-7d9 -o wide"),
            Outcome::Emit { .. }
        ));
        session.handle(":context dev default");
        session.handle("helm list");
    }

    let mut store = ContextStore::open(&path, ToolNames::default());
    assert_eq!(store.total_commands(), 2);

    store.set_context("prod", "web");
    let records = store.get_all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "kubectl get pods nginx-7d9 -o wide");
    assert_eq!(records[0].description, "Execute kubectl get pods nginx-7d9 -o wide");
}

#[test]
fn history_fills_in_when_the_cache_has_no_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    let mut store = ContextStore::open(&path, ToolNames::default());
    store.set_context("prod", "web");
    store.add("kubectl get pods nginx-7d9 -o wide", "", &[]);
    let store = store.into_shared();

    let engine = engine_for(store.clone());
    let text = "kubectl get pods nginx-";
    let candidates: Vec<_> = engine.complete(text).collect();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].replacement, "kubectl get pods nginx-7d9 -o wide");
    assert_eq!(candidates[0].start_offset, -(text.chars().count() as isize));

    // Another context sees nothing
    store.write().unwrap().set_context("dev", "web");
    assert_eq!(engine.complete(text).count(), 0);
}

#[test]
fn empty_line_offers_recent_commands_after_the_fixed_ones() {
    let store = ContextStore::ephemeral(ToolNames::default()).into_shared();
    store
        .write()
        .unwrap()
        .add("helm upgrade web ./chart", "", &[]);

    let engine = engine_for(store);
    let offered: Vec<String> = engine.complete("").map(|c| c.replacement).collect();

    assert_eq!(offered[0], "kubectl get pods");
    assert!(offered.contains(&"helm upgrade web ./chart".to_string()));
}
