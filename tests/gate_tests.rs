//! Bootstrap-gate tests: the splash → ready transition fires exactly once
//! after the configured delay, never reverses, and tearing the gate down
//! before the delay elapses leaves the handle in splash for good.

use std::time::Duration;

use advocase::gate::{BootstrapGate, GateState};

#[tokio::test]
async fn transitions_once_after_the_delay() {
    let gate = BootstrapGate::start(Duration::from_millis(50));
    let handle = gate.handle();
    assert_eq!(handle.state(), GateState::Splash);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(handle.state(), GateState::Ready);

    // No re-entry to splash within a session.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(handle.is_ready());
}

#[tokio::test]
async fn dropping_before_the_delay_is_a_no_op() {
    let gate = BootstrapGate::start(Duration::from_millis(50));
    let handle = gate.handle();
    drop(gate);

    // The aborted timer must not flip the handle after teardown.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(handle.state(), GateState::Splash);
}

#[tokio::test]
async fn ready_now_skips_the_splash() {
    let gate = BootstrapGate::ready_now();
    assert!(gate.is_ready());
}

#[tokio::test]
async fn dropping_after_ready_keeps_ready() {
    let gate = BootstrapGate::start(Duration::from_millis(10));
    let handle = gate.handle();
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(handle.is_ready());
    drop(gate);
    assert!(handle.is_ready());
}
