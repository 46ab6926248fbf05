//! Integration tests for the DemoBackend

use tsv_backends::{DemoBackend, DemoConfig};
use tsv_core::{Hertz, RefreshOutcome, SimulationBackend, SyncError, SyncSession, TrackGeometry};

#[test]
fn test_demo_backend_name() {
    let backend = DemoBackend::new();
    assert_eq!(backend.name(), "Demo");
}

#[tokio::test]
async fn test_demo_backend_creates_simulation_with_tracked_car() {
    let backend = DemoBackend::new();
    let provisioned = backend
        .create_simulation()
        .await
        .expect("create_simulation() should succeed");

    assert!(
        provisioned.location.starts_with("/simulations/"),
        "Location {} should be a simulation path",
        provisioned.location
    );
    assert_eq!(provisioned.cars.len(), backend.config().car_count);
    assert!(
        provisioned.cars.iter().any(|c| c.id == TrackGeometry::DEFAULT_TRACKED_ID),
        "Tracked car should be present in the initial snapshot"
    );
}

#[tokio::test]
async fn test_demo_backend_positions_stay_on_the_ring() {
    let backend = DemoBackend::new();
    let provisioned = backend.create_simulation().await.unwrap();
    let extent = backend.config().extent_x;

    for _ in 0..200 {
        let snapshot = backend
            .fetch_snapshot(&provisioned.location)
            .await
            .expect("fetch_snapshot() should succeed");
        for car in &snapshot.cars {
            let x = car.position().expect("every demo car has a position");
            assert!(
                (0.0..extent).contains(&x),
                "Position {} should be in [0, {})",
                x,
                extent
            );
        }
    }
}

#[tokio::test]
async fn test_demo_backend_each_fetch_advances_the_simulation() {
    let backend = DemoBackend::new();
    let provisioned = backend.create_simulation().await.unwrap();

    // Let the cars get up to speed first
    for _ in 0..10 {
        backend.fetch_snapshot(&provisioned.location).await.unwrap();
    }
    let before = backend.fetch_snapshot(&provisioned.location).await.unwrap();
    let after = backend.fetch_snapshot(&provisioned.location).await.unwrap();

    assert_ne!(before, after, "Consecutive snapshots should differ");
}

#[tokio::test]
async fn test_demo_backend_unknown_location_is_not_found() {
    let backend = DemoBackend::new();
    let err = backend
        .fetch_snapshot("/simulations/does-not-exist")
        .await
        .expect_err("unknown location should fail");

    assert!(matches!(err, SyncError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_demo_backend_simulations_are_independent() {
    let backend = DemoBackend::new();
    let first = backend.create_simulation().await.unwrap();
    let second = backend.create_simulation().await.unwrap();

    assert_ne!(first.location, second.location);
    assert_eq!(backend.simulation_count().await, 2);

    for _ in 0..5 {
        backend.fetch_snapshot(&first.location).await.unwrap();
    }
    // The second simulation has not been stepped yet
    let second_now = backend.fetch_snapshot(&second.location).await.unwrap();
    let first_now = backend.fetch_snapshot(&first.location).await.unwrap();
    assert_ne!(first_now, second_now);
}

#[tokio::test]
async fn test_demo_backend_drives_a_session() {
    let backend = DemoBackend::with_config(DemoConfig {
        car_count: 3,
        ..DemoConfig::default()
    });
    let mut session = SyncSession::default();

    session
        .provision(&backend)
        .await
        .expect("provision() should succeed");
    assert!(session.is_provisioned());
    assert_eq!(session.cars().len(), 3);

    for _ in 0..50 {
        let outcome = session.refresh(&backend, Hertz(10)).await.unwrap();
        assert_ne!(outcome, RefreshOutcome::TrackedAbsent);
    }

    let samples = session.samples();
    assert!(!samples.is_empty(), "Refreshing a moving car should produce samples");
    let indices: Vec<u64> = samples.iter().map(|s| s.index).collect();
    let expected: Vec<u64> = (1..=indices.len() as u64).collect();
    assert_eq!(indices, expected);

    // Demo cars never exceed one unit per tick: 1 * 32 px * 10 Hz
    for sample in samples.iter() {
        assert!(
            sample.value.0.abs() <= 320.0 + 1e-9,
            "Speed {} should be bounded by the demo speed limit",
            sample.value.0
        );
    }
}
