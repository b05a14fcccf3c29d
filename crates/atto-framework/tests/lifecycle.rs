//! Framework lifecycle driven through recording activators.

use async_trait::async_trait;
use atto_core::{BundleId, Properties};
use atto_framework::prelude::*;
use atto_test::{CallLog, FailureMode, RecordingActivator, test_catalog, test_framework};

#[test]
fn install_assigns_increasing_ids() {
    let log = CallLog::new();
    let framework = test_framework([
        RecordingActivator::new("a", &log),
        RecordingActivator::new("b", &log),
    ]);

    let ids: Vec<u64> = framework.bundles().iter().map(|b| b.id().get()).collect();
    assert_eq!(ids, [1, 2]);
    assert!(framework.bundles().iter().all(|b| b.state() == BundleState::Resolved));

    let again = framework.install_bundle("a").unwrap();
    assert_eq!(again.id(), BundleId::new(1));
    assert_eq!(framework.bundles().len(), 2);
}

#[tokio::test]
async fn start_is_ordered_and_idempotent() {
    let log = CallLog::new();
    let framework = test_framework([
        RecordingActivator::new("a", &log),
        RecordingActivator::new("b", &log),
    ]);

    assert!(framework.start().await.unwrap());
    assert!(!framework.start().await.unwrap());
    assert_eq!(log.entries(), ["start:a", "start:b"]);
    assert_eq!(framework.state(), BundleState::Active);

    assert!(framework.stop().await.unwrap());
    assert!(!framework.stop().await.unwrap());
    assert_eq!(log.entries(), ["start:a", "start:b", "stop:b", "stop:a"]);
    assert_eq!(framework.state(), BundleState::Resolved);
}

#[tokio::test]
async fn fatal_error_abandons_the_framework_transition() {
    let log = CallLog::new();
    let framework = test_framework([
        RecordingActivator::new("a", &log).failing(FailureMode::FatalOnStart),
        RecordingActivator::new("b", &log),
    ]);

    let err = framework.start().await.unwrap_err();
    assert!(matches!(err, FrameworkError::Framework(ref m) if m == "a is unrecoverable"));
    assert_eq!(log.entries(), ["start:a"]);
    assert_eq!(framework.state(), BundleState::Resolved);
    assert_eq!(framework.bundle().tracked_state(), BundleState::Resolved);
}

#[tokio::test]
async fn hook_errors_are_wrapped_with_the_bundle_name() {
    let log = CallLog::new();
    let framework =
        test_framework([RecordingActivator::new("cache", &log).failing(FailureMode::OnStart)]);
    let mut events = framework.subscribe();

    let err = framework.start_bundle(BundleId::new(1)).await.unwrap_err();
    assert!(matches!(
        err,
        FrameworkError::Bundle { ref bundle, ref message }
            if bundle == "cache" && message == "cache refused to start"
    ));
    let failed = events.try_recv().unwrap();
    assert_eq!(failed.event_type(), "bundle_failed");
}

#[tokio::test]
async fn single_bundle_lifecycle() {
    let log = CallLog::new();
    let framework = test_framework([RecordingActivator::new("a", &log).registering("test.X", 3)]);
    let id = BundleId::new(1);

    assert!(framework.start_bundle(id).await.unwrap());
    assert!(!framework.start_bundle(id).await.unwrap());
    assert_eq!(framework.state(), BundleState::Resolved);
    assert_eq!(framework.registry().len(), 1);

    assert!(framework.stop_bundle(id).await.unwrap());
    assert!(!framework.stop_bundle(id).await.unwrap());
    assert!(framework.registry().is_empty());

    assert!(matches!(
        framework.start_bundle(BundleId::new(9)).await,
        Err(FrameworkError::UnknownBundle(_))
    ));
    assert!(framework.start_bundle(BundleId::FRAMEWORK).await.unwrap());
    assert_eq!(framework.state(), BundleState::Active);
}

struct Consumer;

impl BundleActivator for Consumer {
    fn start_hook(&self) -> Option<&dyn StartHook> {
        Some(self)
    }
}

#[async_trait]
impl StartHook for Consumer {
    async fn start(&self, context: &BundleContext) -> anyhow::Result<()> {
        let reference = context
            .get_service_reference(Some("test.X"), None::<&str>)?
            .ok_or_else(|| anyhow::anyhow!("no provider"))?;

        let name = context.get_service_as::<String>(&reference)?;
        assert_eq!(name.as_str(), "provider");

        let err = context.get_service_as::<u32>(&reference).unwrap_err();
        assert!(matches!(err, FrameworkError::ServiceTypeMismatch { .. }));

        let owner = context
            .get_bundle(reference.bundle_id())
            .map(|b| b.name().to_string());
        assert_eq!(owner.as_deref(), Some("provider"));
        Ok(())
    }
}

#[tokio::test]
async fn context_routes_typed_lookups() {
    let log = CallLog::new();
    let provider = RecordingActivator::new("provider", &log).registering("test.X", 0);
    let catalog = test_catalog([provider]).with_module("consumer", Consumer);
    let framework =
        create_framework(catalog, ["provider", "consumer"], Properties::new()).unwrap();
    framework.start().await.unwrap();

    let consumer = framework.find_bundle("consumer").unwrap();
    assert_eq!(consumer.state(), BundleState::Active);
    let reference = framework
        .get_service_reference(Some("test.X"), None::<&str>)
        .unwrap()
        .unwrap();
    assert_eq!(framework.registry().usage_count(&reference, consumer.id()), 1);

    framework.stop().await.unwrap();
    assert!(framework.registry().is_empty());
}
