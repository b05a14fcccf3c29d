//! Framework and bundle lifecycle, end to end.

use atto_core::BundleId;
use atto_events::FrameworkEvent;
use atto_framework::{BundleState, FrameworkError};
use atto_test::{CallLog, FailureMode, RecordingActivator, init_test_logging, test_framework};

fn states(framework: &atto_framework::Framework) -> Vec<BundleState> {
    framework.bundles().iter().map(|b| b.state()).collect()
}

#[tokio::test]
async fn failing_bundle_does_not_stop_its_siblings() {
    init_test_logging();
    let log = CallLog::new();
    let framework = test_framework([
        RecordingActivator::new("a", &log),
        RecordingActivator::new("b", &log).failing(FailureMode::OnStart),
        RecordingActivator::new("c", &log),
    ]);

    assert!(framework.start().await.unwrap());
    assert_eq!(framework.state(), BundleState::Active);
    assert_eq!(
        states(&framework),
        [BundleState::Active, BundleState::Resolved, BundleState::Active]
    );

    assert!(framework.stop().await.unwrap());
    assert_eq!(framework.state(), BundleState::Resolved);
    assert!(states(&framework).iter().all(|s| *s == BundleState::Resolved));
    assert_eq!(
        log.entries(),
        ["start:a", "start:b", "start:c", "stop:c", "stop:a"]
    );
}

#[tokio::test]
async fn start_twice_activates_once() {
    let log = CallLog::new();
    let framework = test_framework([RecordingActivator::new("a", &log)]);

    assert!(framework.start().await.unwrap());
    assert!(!framework.start().await.unwrap());
    assert_eq!(log.count("start:a"), 1);

    assert!(framework.stop().await.unwrap());
    assert!(!framework.stop().await.unwrap());
    assert_eq!(log.count("stop:a"), 1);
}

#[tokio::test]
async fn failed_stop_leaves_bundle_active_and_registered() {
    let log = CallLog::new();
    let framework = test_framework([RecordingActivator::new("a", &log)
        .failing(FailureMode::OnStop)
        .registering("test.X", 0)]);

    framework.start().await.unwrap();
    assert!(framework.stop().await.unwrap());

    assert_eq!(states(&framework), [BundleState::Active]);
    assert_eq!(framework.state(), BundleState::Resolved);
    assert_eq!(framework.registry().len(), 1);
}

#[tokio::test]
async fn fatal_error_abandons_the_framework_start() {
    let log = CallLog::new();
    let framework = test_framework([
        RecordingActivator::new("a", &log),
        RecordingActivator::new("b", &log).failing(FailureMode::FatalOnStart),
        RecordingActivator::new("c", &log),
    ]);

    let err = framework.start().await.unwrap_err();
    assert!(matches!(err, FrameworkError::Framework(_)));
    assert_eq!(framework.state(), BundleState::Resolved);
    assert_eq!(log.entries(), ["start:a", "start:b"]);
}

#[tokio::test]
async fn stop_sweeps_services_only_with_a_stop_hook() {
    let log = CallLog::new();
    let framework = test_framework([
        RecordingActivator::new("swept", &log).registering("test.X", 1),
        RecordingActivator::new("kept", &log)
            .without_stop_hook()
            .registering("test.X", 2),
    ]);

    framework.start().await.unwrap();
    assert_eq!(framework.registry().len(), 2);

    framework.stop().await.unwrap();
    let left = framework
        .get_service_references(Some("test.X"), None::<&str>)
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].bundle_id(), BundleId::new(2));
}

#[tokio::test]
async fn single_bundles_start_and_stop_by_id() {
    let log = CallLog::new();
    let framework = test_framework([
        RecordingActivator::new("a", &log),
        RecordingActivator::new("b", &log),
    ]);

    assert!(framework.start_bundle(BundleId::new(2)).await.unwrap());
    assert!(!framework.start_bundle(BundleId::new(2)).await.unwrap());
    assert_eq!(states(&framework), [BundleState::Resolved, BundleState::Active]);

    // Framework start skips the bundle that is already active.
    framework.start().await.unwrap();
    assert_eq!(log.entries(), ["start:b", "start:a"]);

    assert!(framework.stop_bundle(BundleId::new(1)).await.unwrap());
    assert!(!framework.stop_bundle(BundleId::new(1)).await.unwrap());

    let err = framework.start_bundle(BundleId::new(9)).await.unwrap_err();
    assert!(matches!(err, FrameworkError::UnknownBundle(id) if id == BundleId::new(9)));
}

#[tokio::test]
async fn bundle_ids_keep_increasing() {
    let log = CallLog::new();
    let framework = test_framework([
        RecordingActivator::new("a", &log),
        RecordingActivator::new("b", &log),
    ]);
    let ids: Vec<BundleId> = framework.bundles().iter().map(|b| b.id()).collect();
    assert_eq!(ids, [BundleId::new(1), BundleId::new(2)]);

    // Reinstalling returns the existing bundle rather than a new id.
    let again = framework.install_bundle("b").unwrap();
    assert_eq!(again.id(), BundleId::new(2));
    assert_eq!(framework.bundle().id(), BundleId::FRAMEWORK);
}

#[tokio::test]
async fn events_follow_the_lifecycle() {
    let log = CallLog::new();
    let framework = test_framework([
        RecordingActivator::new("a", &log).registering("test.X", 0),
        RecordingActivator::new("b", &log).failing(FailureMode::OnStart),
    ]);
    let mut events = framework.subscribe();

    framework.start().await.unwrap();
    framework.stop().await.unwrap();

    let types: Vec<&str> = events.drain().iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        [
            "service_registered",
            "bundle_started",
            "bundle_failed",
            "framework_started",
            "service_unregistering",
            "bundle_stopped",
            "framework_stopped",
        ]
    );
}

#[tokio::test]
async fn failure_events_carry_the_bundle_and_message() {
    let log = CallLog::new();
    let framework = test_framework([RecordingActivator::new("b", &log).failing(FailureMode::OnStart)]);
    let mut events = framework.subscribe();

    framework.start().await.unwrap();

    let failure = events
        .drain()
        .into_iter()
        .find_map(|event| match &*event {
            FrameworkEvent::BundleFailed { bundle_id, message, .. } => {
                Some((*bundle_id, message.clone()))
            },
            _ => None,
        })
        .unwrap();
    assert_eq!(failure.0, BundleId::new(1));
    assert!(failure.1.contains("refused to start"));
}
