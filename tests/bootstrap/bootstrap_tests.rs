use super::*;
use crate::app::alerts::AlertSink;
use crate::core::models::{AlertDto, AlertKind};
use crate::core::router::{RouteTable, default_routes};
use crate::core::{AppError, AppResult};
use std::sync::Mutex;
use vetpms_i18n::{LocaleState, LocaleTable};
use vetpms_kernel::{GateOutcome, readiness_channel};

#[derive(Default)]
struct RecordingView {
    mounts: Mutex<Vec<String>>,
    fail_with: Option<AppError>,
}

impl RecordingView {
    fn mounts(&self) -> Vec<String> {
        self.mounts.lock().expect("mounts").clone()
    }
}

impl ViewRoot for RecordingView {
    fn mount(&self, context: &MountContext, target: &str) -> AppResult<()> {
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        let route = context.router.current()?;
        self.mounts
            .lock()
            .expect("mounts")
            .push(format!("{target}:{}", route.name));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    alerts: Mutex<Vec<AlertDto>>,
}

impl RecordingSink {
    fn recorded(&self) -> Vec<AlertDto> {
        self.alerts.lock().expect("alerts").clone()
    }
}

impl AlertSink for RecordingSink {
    fn emit(&self, alert: &AlertDto) -> AppResult<()> {
        self.alerts.lock().expect("alerts").push(alert.clone());
        Ok(())
    }
}

fn config(
    view: Arc<RecordingView>,
    sink: Arc<RecordingSink>,
    bridge_timeout: Option<Duration>,
) -> BootstrapConfig {
    let table = Arc::new(LocaleTable::builtin().expect("builtin table"));
    let localizer = Localizer::new(Arc::clone(&table), &LocaleState::from_preference("en", &table));
    BootstrapConfig {
        router: Arc::new(Router::new(
            RouteTable::new(default_routes()).expect("routes"),
        )),
        localizer: localizer.clone(),
        view_root: view,
        alerts: Alerts::new(sink, localizer),
        mount_target: "#app".to_string(),
        bridge_timeout,
    }
}

#[tokio::test]
async fn bootstrap_should_mount_only_after_bridge_is_ready() {
    let view = Arc::new(RecordingView::default());
    let sink = Arc::new(RecordingSink::default());
    let (notifier, signal) = readiness_channel();

    let gate = bootstrap(&config(view.clone(), sink.clone(), None), signal);
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(view.mounts().is_empty());

    notifier.notify_ready();
    assert_eq!(gate.outcome().await.expect("outcome"), GateOutcome::Ready);
    assert_eq!(view.mounts(), vec!["#app:home".to_string()]);
    assert!(sink.recorded().is_empty());
}

#[tokio::test(start_paused = true)]
async fn bootstrap_should_alert_when_bridge_times_out() {
    let view = Arc::new(RecordingView::default());
    let sink = Arc::new(RecordingSink::default());
    let (_notifier, signal) = readiness_channel();

    let gate = bootstrap(
        &config(view.clone(), sink.clone(), Some(Duration::from_secs(10))),
        signal,
    );

    assert_eq!(gate.outcome().await.expect("outcome"), GateOutcome::TimedOut);
    assert!(view.mounts().is_empty());
    let alerts = sink.recorded();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Error);
    assert_eq!(
        alerts[0].text,
        "The application backend did not respond within 10 seconds."
    );
}

#[tokio::test]
async fn bootstrap_should_alert_when_bridge_fails() {
    let view = Arc::new(RecordingView::default());
    let sink = Arc::new(RecordingSink::default());
    let (notifier, signal) = readiness_channel();

    let gate = bootstrap(&config(view.clone(), sink.clone(), None), signal);
    notifier.notify_failed(
        AppError::new("bridge_probe_failed", "backend is not reachable").with_cause("refused"),
    );

    assert!(matches!(
        gate.outcome().await.expect("outcome"),
        GateOutcome::Failed(error) if error.code == "bridge_probe_failed"
    ));
    assert!(view.mounts().is_empty());
    assert_eq!(
        sink.recorded()
            .into_iter()
            .map(|alert| alert.text)
            .collect::<Vec<_>>(),
        vec!["The application backend could not be reached: refused".to_string()]
    );
}

#[tokio::test]
async fn bootstrap_should_alert_when_mount_fails() {
    let view = Arc::new(RecordingView {
        mounts: Mutex::new(Vec::new()),
        fail_with: Some(AppError::new("view_render_failed", "failed to render root view")),
    });
    let sink = Arc::new(RecordingSink::default());
    let (notifier, signal) = readiness_channel();

    let gate = bootstrap(&config(view, sink.clone(), None), signal);
    notifier.notify_ready();

    assert_eq!(gate.outcome().await.expect("outcome"), GateOutcome::Ready);
    let alerts = sink.recorded();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].text, "failed to render root view");
}

#[tokio::test]
async fn bootstrap_should_not_mount_after_cancel() {
    let view = Arc::new(RecordingView::default());
    let sink = Arc::new(RecordingSink::default());
    let (notifier, signal) = readiness_channel();

    let gate = bootstrap(&config(view.clone(), sink, None), signal);
    gate.cancel();
    notifier.notify_ready();

    assert_eq!(gate.outcome().await.expect("outcome"), GateOutcome::Cancelled);
    assert!(view.mounts().is_empty());
}
