use super::*;

#[test]
fn gate_exit_status_should_succeed_for_ready_and_cancelled() {
    assert_eq!(gate_exit_status(GateOutcome::Ready, None), Ok(()));
    assert_eq!(
        gate_exit_status(GateOutcome::Cancelled, Some(Duration::from_secs(1))),
        Ok(())
    );
}

#[test]
fn gate_exit_status_should_return_bridge_failure() {
    let failure = AppError::new("bridge_probe_failed", "backend is not reachable");
    assert_eq!(
        gate_exit_status(GateOutcome::Failed(failure.clone()), None),
        Err(failure)
    );
}

#[test]
fn gate_exit_status_should_report_timeout_with_duration() {
    let error = gate_exit_status(GateOutcome::TimedOut, Some(Duration::from_millis(2500)))
        .expect_err("timeout");
    assert_eq!(error.code, "bridge_timeout");
    assert_eq!(error.context_value("timeoutMs"), Some("2500"));
}
