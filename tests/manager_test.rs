//! Tests for TransportRegistry and TransportManager behavior

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tideway_mail::transport::{LogTransport, MemoryTransport};
use tideway_mail::{
    Driver, MailError, RawTransportConfig, TransportManager, TransportRegistry,
};

fn primary_backup() -> TransportRegistry {
    TransportRegistry::load([
        ("primary", RawTransportConfig::new("log")),
        ("backup", RawTransportConfig::new("log").param("level", "warn")),
    ])
    .unwrap()
}

#[test]
fn test_default_matches_registry_config() {
    let registry = primary_backup();
    let expected = registry.resolve("primary").unwrap().clone();
    let manager = TransportManager::new(registry, "primary").unwrap();

    let default = manager.get_default().unwrap();
    assert_eq!(default.config(), &expected);
    assert_eq!(default.driver(), Driver::Log);
}

#[test]
fn test_new_with_unknown_default_is_config_error() {
    let err = TransportManager::new(primary_backup(), "tertiary").unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("tertiary"));
}

#[test]
fn test_repeated_get_returns_same_instance() {
    let manager = TransportManager::new(primary_backup(), "primary").unwrap();

    let first = manager.get("backup").unwrap();
    let second = manager.get("backup").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_switching_default_between_log_transports() {
    let manager = TransportManager::new(primary_backup(), "primary").unwrap();

    let a = manager.get_default().unwrap();
    manager.set_default("backup").unwrap();
    let b = manager.get_default().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(b.name(), "backup");
    assert_eq!(
        b.downcast_ref::<LogTransport>().unwrap().level(),
        tracing::Level::WARN
    );

    // The previous default stays cached and identical
    assert!(Arc::ptr_eq(&a, &manager.get("primary").unwrap()));

    manager.set_default("primary").unwrap();
    assert!(Arc::ptr_eq(&a, &manager.get_default().unwrap()));
}

#[test]
fn test_set_default_to_unknown_name_leaves_default_unchanged() {
    let manager = TransportManager::new(primary_backup(), "primary").unwrap();

    let err = manager.set_default("missing").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(manager.default_name(), "primary");
}

#[test]
fn test_set_default_builds_nothing() {
    let manager = TransportManager::new(primary_backup(), "primary").unwrap();
    manager.set_default("backup").unwrap();
    assert!(manager.cached_names().is_empty());
}

#[test]
fn test_unknown_driver_is_config_error() {
    let err = TransportRegistry::load([("birds", RawTransportConfig::new("carrier-pigeon"))])
        .unwrap_err();

    assert!(err.is_config());
    assert!(err.to_string().contains("carrier-pigeon"));
}

#[test]
fn test_get_unknown_name_is_build_error_wrapping_not_found() {
    let manager = TransportManager::new(primary_backup(), "primary").unwrap();

    let err = manager.get("missing").unwrap_err();
    assert!(err.is_build());
    assert!(matches!(err.build_cause(), Some(MailError::NotFound(_))));
    assert!(!manager.is_cached("missing"));
    assert!(manager.cached_names().is_empty());
}

#[test]
fn test_concurrent_get_constructs_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);

    let registry = TransportRegistry::load([("shared", RawTransportConfig::new("memory"))]).unwrap();
    let manager = TransportManager::new(registry, "shared")
        .unwrap()
        .with_builder(Driver::Memory, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Box::new(MemoryTransport::new()))
        });

    let handles: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| manager.get("shared").unwrap()))
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
}

#[test]
fn test_smtp_registry_validation() {
    let err = TransportRegistry::load([(
        "primary",
        RawTransportConfig::new("smtp")
            .param("host", "smtp.example.com")
            .param("username", "user"),
    )])
    .unwrap_err();
    assert!(err.is_config());

    let err = TransportRegistry::load([(
        "primary",
        RawTransportConfig::new("smtp")
            .param("host", "smtp.example.com")
            .param("port", 70000),
    )])
    .unwrap_err();
    assert!(err.to_string().contains("port"));
}

#[tokio::test]
async fn test_memory_transport_through_handle() {
    let registry = TransportRegistry::load([("outbox", RawTransportConfig::new("memory"))]).unwrap();
    let manager = TransportManager::new(registry, "outbox").unwrap();

    let email = tideway_mail::Email::new("from@test.com", "to@test.com", "Hello").text("Hi");
    let receipt = manager.get_default().unwrap().send(&email).await.unwrap();
    assert_eq!(receipt.recipients, 1);

    let handle = manager.get("outbox").unwrap();
    let memory = handle.downcast_ref::<MemoryTransport>().unwrap();
    assert_eq!(memory.last(), Some(email));
}
