//! Session state containers and the pipeline dispatch table.

use engrammer_core::{
    ConversationLog, Error, PipelineConstructor, PipelineRegistry, RegisteredPipeline, Role, Turn,
    TurnContent, WorkingMemory,
};
use std::sync::Arc;

fn null_constructor() -> PipelineConstructor {
    Arc::new(|_tenant| {
        Box::pin(async { Err(Error::Connectivity("never constructed".to_string())) })
    })
}

fn entry(id: &str) -> RegisteredPipeline {
    RegisteredPipeline {
        id: id.to_string(),
        name: format!("Pipeline {id}"),
        description: String::new(),
        constructor: null_constructor(),
    }
}

#[test]
fn conversation_sessions_are_isolated() {
    let log = ConversationLog::new();
    log.append("t1", "s1", Role::User, TurnContent::Text("one".into()));
    log.append("t1", "s2", Role::User, TurnContent::Text("two".into()));
    log.append("t2", "s1", Role::User, TurnContent::Text("three".into()));

    assert_eq!(log.get("t1", "s1").len(), 1);
    assert_eq!(log.get("t1", "s1")[0].content.text(), "one");
    assert_eq!(log.get("t1", "s2")[0].content.text(), "two");
    assert_eq!(log.get("t2", "s1")[0].content.text(), "three");

    log.clear("t1", "s1");
    assert!(log.get("t1", "s1").is_empty());
    assert_eq!(log.get("t1", "s2").len(), 1);
}

#[test]
fn conversation_get_returns_a_snapshot() {
    let log = ConversationLog::new();
    log.append("t1", "s1", Role::User, TurnContent::Text("hello".into()));

    let mut snapshot = log.get("t1", "s1");
    snapshot.push(Turn::text(Role::Assistant, "injected"));

    assert_eq!(log.get("t1", "s1").len(), 1);
}

#[test]
fn working_memory_defaults_to_empty() {
    let wm = WorkingMemory::new();
    assert_eq!(wm.get("t1", "s1"), "");

    wm.set("t1", "s1", "focus");
    assert_eq!(wm.get("t1", "s1"), "focus");
    assert_eq!(wm.get("t1", "s2"), "");

    wm.set("t1", "s1", "replaced");
    assert_eq!(wm.get("t1", "s1"), "replaced");

    wm.clear("t1", "s1");
    assert_eq!(wm.get("t1", "s1"), "");
}

#[test]
fn duplicate_pipeline_ids_are_rejected() {
    let mut registry = PipelineRegistry::new();
    registry.register(entry("alpha")).unwrap();

    let err = registry.register(entry("alpha")).unwrap_err();
    assert!(matches!(err, Error::DuplicateId(id) if id == "alpha"));

    // The original entry survives the rejected registration.
    assert!(registry.get("alpha").is_ok());
}

#[test]
fn unknown_pipeline_id_is_an_error() {
    let registry = PipelineRegistry::new();
    let err = registry.get("missing").unwrap_err();
    assert!(matches!(err, Error::UnknownPipeline(id) if id == "missing"));
}

#[test]
fn listing_is_sorted_by_id() {
    let mut registry = PipelineRegistry::new();
    registry.register(entry("zeta")).unwrap();
    registry.register(entry("alpha")).unwrap();
    registry.register(entry("mid")).unwrap();

    let ids: Vec<String> = registry.list().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
}
