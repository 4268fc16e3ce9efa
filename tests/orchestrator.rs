//! Orchestrator behavior against mock engines and managers, plus the real
//! node engine end to end.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{simnet_config, Behavior, MockEngine, MockManager};
use nmcd::lifecycle::{ServiceError, ServiceOrchestrator, ServiceState, StopCause};
use nmcd::node::storage::LOCK_FILENAME;
use nmcd::Node;

#[tokio::test]
async fn test_start_failure_skips_privilege_drop_and_started() {
    let (_dir, config) = simnet_config(&[]);
    let (manager, _stop) = MockManager::new();
    let calls = manager.calls.clone();
    let mut orchestrator = ServiceOrchestrator::new(manager);

    let outcome = orchestrator
        .run(MockEngine::new(Behavior::FailStart("database locked")), config)
        .await;

    assert_eq!(outcome.cause, StopCause::PrematureExit);
    match outcome.result {
        Err(ServiceError::Start(e)) => assert_eq!(e.to_string(), "database locked"),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(orchestrator.state(), ServiceState::Stopped);
}

#[tokio::test]
async fn test_clean_exit_before_ready_is_premature() {
    let (_dir, config) = simnet_config(&[]);
    let mut orchestrator = ServiceOrchestrator::new(MockManager::never_stops());

    let outcome = orchestrator
        .run(MockEngine::new(Behavior::ExitWithoutReady), config)
        .await;

    assert_eq!(outcome.cause, StopCause::PrematureExit);
    assert!(outcome.result.is_ok());
    assert_eq!(outcome.exit_code(), 0);
    assert!(orchestrator.manager().calls().is_empty());
}

#[tokio::test]
async fn test_manager_stop_returns_engine_completion() {
    let (_dir, config) = simnet_config(&[]);
    let (manager, stop) = MockManager::new();
    let mut orchestrator = ServiceOrchestrator::new(manager);
    let engine = MockEngine::new(Behavior::RunUntilStopped(Some("flush failed")));
    let stops = engine.stop_counter();

    stop.send(()).unwrap();
    let outcome = orchestrator.run(engine, config).await;

    assert_eq!(outcome.cause, StopCause::ManagerStop);
    match &outcome.result {
        Err(ServiceError::Runtime(e)) => assert_eq!(e.to_string(), "flush failed"),
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(stops.load(Ordering::SeqCst), 1);
    assert_eq!(
        orchestrator.manager().calls(),
        vec!["drop_privileges", "set_started"]
    );
}

#[tokio::test]
async fn test_manager_stop_with_clean_completion() {
    let (_dir, config) = simnet_config(&[]);
    let mut orchestrator =
        ServiceOrchestrator::new(MockManager::stops_after(Duration::from_millis(20)));
    let engine = MockEngine::new(Behavior::RunUntilStopped(None));
    let stops = engine.stop_counter();

    let outcome = orchestrator.run(engine, config).await;

    assert_eq!(outcome.cause, StopCause::ManagerStop);
    assert!(outcome.result.is_ok());
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_spontaneous_exit_propagates_error_without_stop() {
    let (_dir, config) = simnet_config(&[]);
    let mut orchestrator = ServiceOrchestrator::new(MockManager::never_stops());
    let engine = MockEngine::new(Behavior::ExitAfterReady(Some("disk full")));
    let stops = engine.stop_counter();

    let outcome = orchestrator.run(engine, config).await;

    assert_eq!(outcome.cause, StopCause::Spontaneous);
    assert!(matches!(outcome.result, Err(ServiceError::Runtime(_))));
    assert_eq!(stops.load(Ordering::SeqCst), 0);
    assert_eq!(
        orchestrator.manager().calls(),
        vec!["drop_privileges", "set_started"]
    );
}

#[tokio::test]
async fn test_completion_wins_over_pending_stop() {
    let (_dir, config) = simnet_config(&[]);
    let (manager, stop) = MockManager::new();
    let mut orchestrator = ServiceOrchestrator::new(manager);
    let engine = MockEngine::new(Behavior::ExitAfterReady(None));
    let stops = engine.stop_counter();

    // Both signals are ready by the time the orchestrator is running.
    drop(stop);
    let outcome = orchestrator.run(engine, config).await;

    assert_eq!(outcome.cause, StopCause::Spontaneous);
    assert!(outcome.result.is_ok());
    assert_eq!(stops.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_privilege_drop_failure_stops_engine() {
    let (_dir, config) = simnet_config(&[]);
    let mut manager = MockManager::never_stops();
    manager.fail_privilege_drop = true;
    let mut orchestrator = ServiceOrchestrator::new(manager);
    let engine = MockEngine::new(Behavior::RunUntilStopped(None));
    let stops = engine.stop_counter();

    let outcome = orchestrator.run(engine, config).await;

    assert_eq!(outcome.cause, StopCause::PrivilegeDrop);
    assert!(matches!(outcome.result, Err(ServiceError::Privileges(_))));
    assert_eq!(stops.load(Ordering::SeqCst), 1);
    assert_eq!(orchestrator.manager().calls(), vec!["drop_privileges"]);
}

#[tokio::test]
async fn test_node_runs_until_stopped() {
    let (_dir, config) = simnet_config(&[]);
    let mut orchestrator =
        ServiceOrchestrator::new(MockManager::stops_after(Duration::from_millis(50)));

    let outcome = orchestrator.run(Node::new(), config).await;

    assert_eq!(outcome.cause, StopCause::ManagerStop);
    assert!(outcome.result.is_ok(), "{:?}", outcome.result);
}

#[tokio::test]
async fn test_node_with_listener_and_leveldb() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = nmcd::ConfigResolver::new(nmcd::Defaults::from_home(dir.path().join("home")));
    let resolved = common::resolve_ok(&resolver, &["--simnet", "--listen", "127.0.0.1:0"]);
    let config = std::sync::Arc::new(resolved.config);
    let db_dir = config.data_dir.join("blocks_leveldb");

    let mut orchestrator =
        ServiceOrchestrator::new(MockManager::stops_after(Duration::from_millis(50)));
    let outcome = orchestrator.run(Node::new(), config).await;

    assert!(outcome.result.is_ok(), "{:?}", outcome.result);
    assert!(db_dir.is_dir());
    assert!(!db_dir.join(LOCK_FILENAME).exists());
}

#[tokio::test]
async fn test_node_locked_database_is_premature_exit() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = nmcd::ConfigResolver::new(nmcd::Defaults::from_home(dir.path().join("home")));
    let resolved = common::resolve_ok(&resolver, &["--simnet", "--nolisten"]);
    let config = std::sync::Arc::new(resolved.config);

    let db_dir = config.data_dir.join("blocks_leveldb");
    std::fs::create_dir_all(&db_dir).unwrap();
    std::fs::write(db_dir.join(LOCK_FILENAME), "1").unwrap();

    let (manager, _stop) = MockManager::new();
    let mut orchestrator = ServiceOrchestrator::new(manager);
    let outcome = orchestrator.run(Node::new(), config).await;

    assert_eq!(outcome.cause, StopCause::PrematureExit);
    assert!(matches!(outcome.result, Err(ServiceError::Start(_))));
    assert!(orchestrator.manager().calls().is_empty());
}
