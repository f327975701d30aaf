use crate::core::router::{RouteRecord, Router};
use crate::core::{AppError, AppResult, ResultExt};
use std::io::Write;
use std::sync::{Arc, Mutex};
use vetpms_i18n::Localizer;

const MENU_KEYS: [&str; 5] = [
    "menu.dashboard",
    "menu.users",
    "menu.usersManagement",
    "menu.usersNew",
    "menu.settings",
];

/// Capabilities handed to the view root when it mounts.
#[derive(Debug, Clone)]
pub struct MountContext {
    pub router: Arc<Router>,
    pub localizer: Localizer,
}

/// The UI root that the startup gate mounts once the bridge is ready.
pub trait ViewRoot: Send + Sync {
    fn mount(&self, context: &MountContext, target: &str) -> AppResult<()>;
}

/// Text rendering of the root view, used by the desktop host binary.
pub struct ConsoleViewRoot {
    writer: Mutex<Box<dyn Write + Send>>,
    mounted_at: Mutex<Option<String>>,
}

impl ConsoleViewRoot {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            mounted_at: Mutex::new(None),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn mounted_target(&self) -> Option<String> {
        self.mounted_at.lock().ok().and_then(|target| target.clone())
    }
}

impl ViewRoot for ConsoleViewRoot {
    fn mount(&self, context: &MountContext, target: &str) -> AppResult<()> {
        let mut mounted_at = self
            .mounted_at
            .lock()
            .map_err(|_| AppError::new("view_state_poisoned", "failed to read view state"))?;
        if let Some(existing) = mounted_at.as_deref() {
            return Err(AppError::new("view_already_mounted", "root view is already mounted")
                .with_context("target", existing));
        }

        let route = context.router.current()?;
        let localizer = &context.localizer;
        let menu = MENU_KEYS
            .iter()
            .map(|key| localizer.t(key))
            .collect::<Vec<_>>()
            .join(" | ");

        let title = localizer.t("native.window.title");
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AppError::new("view_state_poisoned", "failed to lock view output"))?;
        render_root(&mut **writer, target, &title, &route, &menu)
            .with_code("view_render_failed", "failed to render root view")
            .with_ctx("target", target)?;

        *mounted_at = Some(target.to_string());
        tracing::info!(
            event = "view_mounted",
            mount_target = target,
            route = %route.path,
            locale = %localizer.active_locale()
        );
        Ok(())
    }
}

fn render_root(
    writer: &mut dyn Write,
    target: &str,
    title: &str,
    route: &RouteRecord,
    menu: &str,
) -> std::io::Result<()> {
    writeln!(writer, "[{target}] {title}")?;
    writeln!(
        writer,
        "route: {} ({} -> {})",
        route.path, route.name, route.component
    )?;
    writeln!(writer, "menu: {menu}")?;
    writer.flush()
}

#[cfg(test)]
#[path = "../../tests/core/view_tests.rs"]
mod tests;
