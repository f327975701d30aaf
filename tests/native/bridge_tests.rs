use super::*;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use vetpms_kernel::{BridgeState, readiness_channel};

fn policy(attempts: u32) -> ProbePolicy {
    ProbePolicy {
        attempts,
        interval: Duration::from_millis(10),
        connect_timeout: Duration::from_millis(500),
    }
}

async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");
    drop(listener);
    address
}

#[tokio::test]
async fn probe_should_succeed_when_backend_accepts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");

    let core = NativeCore::new(address.to_string(), policy(1));
    core.probe().await.expect("probe");
    assert_eq!(core.address(), address.to_string());
}

#[tokio::test]
async fn probe_should_report_attempts_after_exhausting_retries() {
    let address = closed_address().await;
    let core = NativeCore::new(address.to_string(), policy(3));

    let error = core.probe().await.expect_err("closed port");
    assert_eq!(error.code, "bridge_probe_failed");
    assert_eq!(error.context_value("attempts"), Some("3"));
    assert_eq!(error.context_value("address"), Some(address.to_string().as_str()));
}

#[tokio::test]
async fn spawn_native_bridge_should_resolve_signal_ready() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");
    let (notifier, mut signal) = readiness_channel();

    spawn_native_bridge(NativeCore::new(address.to_string(), policy(2)), notifier)
        .await
        .expect("bridge task");

    signal.resolved().await.expect("ready");
    assert!(matches!(signal.state(), BridgeState::Ready));
}

#[tokio::test]
async fn spawn_native_bridge_should_resolve_signal_failed() {
    let address = closed_address().await;
    let (notifier, mut signal) = readiness_channel();

    spawn_native_bridge(NativeCore::new(address.to_string(), policy(1)), notifier)
        .await
        .expect("bridge task");

    let error = signal.resolved().await.expect_err("failed");
    assert_eq!(error.code, "bridge_probe_failed");
}

#[test]
fn probe_policy_should_follow_config() {
    let cli = <crate::core::config::Cli as clap::Parser>::try_parse_from([
        "vetpms-desktop",
        "--read-timeout",
        "750ms",
        "--probe-attempts",
        "2",
        "--api",
        "localhost:4000",
    ])
    .expect("cli");
    let config = AppConfig::from_cli(cli).expect("config");

    let core = NativeCore::from_config(&config).expect("core");
    assert_eq!(core.address(), "localhost:4000");
    assert_eq!(
        ProbePolicy::from_config(&config),
        ProbePolicy {
            attempts: 2,
            interval: DEFAULT_PROBE_INTERVAL,
            connect_timeout: Duration::from_millis(750),
        }
    );
}

#[tokio::test]
async fn connect_once_should_keep_io_error_as_cause() {
    let address = closed_address().await;
    let core = NativeCore::new(address.to_string(), policy(1));

    let error = core.connect_once().await.expect_err("closed port");
    assert_eq!(error.code, "bridge_connect_failed");
    assert_eq!(error.message, "connection failed");
    assert!(!error.causes.is_empty());
    assert!(error.context_value("sourceType").is_some());
}
