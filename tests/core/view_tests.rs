use super::*;
use crate::core::router::{RouteTable, default_routes};
use vetpms_i18n::{LocaleState, LocaleTable};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().expect("buffer").clone()).expect("utf8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct BrokenWriter;

impl Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("closed"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn context(locale: &str) -> MountContext {
    let table = Arc::new(LocaleTable::builtin().expect("builtin table"));
    let state = LocaleState::from_preference(locale, &table);
    MountContext {
        router: Arc::new(Router::new(
            RouteTable::new(default_routes()).expect("routes"),
        )),
        localizer: Localizer::new(table, &state),
    }
}

#[test]
fn mount_should_render_title_route_and_localized_menu() {
    let buffer = SharedBuffer::default();
    let view = ConsoleViewRoot::new(Box::new(buffer.clone()));

    view.mount(&context("en"), "#app").expect("mount");

    let text = buffer.text();
    assert!(text.contains("[#app] Veterinary Practice Management Suite"));
    assert!(text.contains("route: / (home -> Home)"));
    assert!(text.contains("menu: Dashboard | Users | Management | New user | Settings"));
    assert_eq!(view.mounted_target().as_deref(), Some("#app"));
}

#[test]
fn mount_should_reject_second_mount() {
    let view = ConsoleViewRoot::new(Box::new(SharedBuffer::default()));
    view.mount(&context("nl"), "#app").expect("first mount");

    let error = view.mount(&context("nl"), "#other").expect_err("second mount");
    assert_eq!(error.code, "view_already_mounted");
    assert_eq!(error.context_value("target"), Some("#app"));
}

#[test]
fn mount_should_report_render_failure_and_stay_unmounted() {
    let view = ConsoleViewRoot::new(Box::new(BrokenWriter));

    let error = view.mount(&context("en"), "#app").expect_err("broken writer");
    assert_eq!(error.code, "view_render_failed");
    assert_eq!(error.context_value("target"), Some("#app"));
    assert_eq!(view.mounted_target(), None);
}
