use crate::core::{AppError, AppResult};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: String,
    pub name: String,
    pub component: String,
}

impl RouteRecord {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            component: component.into(),
        }
    }
}

pub fn default_routes() -> Vec<RouteRecord> {
    vec![
        RouteRecord::new("/", "home", "Home"),
        RouteRecord::new("/users/new", "newUser", "UserCreatePage"),
    ]
}

/// Immutable `{path, name, component}` table. The first record is the
/// initial route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    records: Vec<RouteRecord>,
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> AppResult<Self> {
        if records.is_empty() {
            return Err(AppError::new("route_table_empty", "route table has no routes"));
        }

        let mut paths = HashSet::new();
        let mut names = HashSet::new();
        for record in &records {
            if !record.path.starts_with('/') {
                return Err(AppError::new("route_invalid", "route path must start with '/'")
                    .with_context("path", record.path.clone()));
            }
            if record.name.trim().is_empty() || record.component.trim().is_empty() {
                return Err(AppError::new("route_invalid", "route name and component are required")
                    .with_context("path", record.path.clone()));
            }
            if !paths.insert(normalize_path(&record.path)) {
                return Err(AppError::new("route_duplicate", "route path is registered twice")
                    .with_context("path", record.path.clone()));
            }
            if !names.insert(record.name.as_str()) {
                return Err(AppError::new("route_duplicate", "route name is registered twice")
                    .with_context("name", record.name.clone()));
            }
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[RouteRecord] {
        &self.records
    }

    pub fn resolve_path(&self, path: &str) -> Option<&RouteRecord> {
        let path = normalize_path(path);
        self.records
            .iter()
            .find(|record| normalize_path(&record.path) == path)
    }

    pub fn resolve_name(&self, name: &str) -> Option<&RouteRecord> {
        self.records.iter().find(|record| record.name == name)
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug)]
pub struct Router {
    table: RouteTable,
    current: Mutex<RouteRecord>,
}

impl Router {
    pub fn new(table: RouteTable) -> Self {
        let initial = table.records[0].clone();
        Self {
            table,
            current: Mutex::new(initial),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn current(&self) -> AppResult<RouteRecord> {
        self.current
            .lock()
            .map(|route| route.clone())
            .map_err(|_| AppError::new("router_state_poisoned", "failed to read current route"))
    }

    pub fn push_path(&self, path: &str) -> AppResult<RouteRecord> {
        let route = self.table.resolve_path(path).cloned().ok_or_else(|| {
            AppError::new("route_not_found", "no route matches the path").with_context("path", path)
        })?;
        self.navigate(route)
    }

    pub fn push_name(&self, name: &str) -> AppResult<RouteRecord> {
        let route = self.table.resolve_name(name).cloned().ok_or_else(|| {
            AppError::new("route_not_found", "no route has this name").with_context("name", name)
        })?;
        self.navigate(route)
    }

    fn navigate(&self, route: RouteRecord) -> AppResult<RouteRecord> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| AppError::new("router_state_poisoned", "failed to update current route"))?;
        tracing::debug!(
            event = "route_changed",
            from = %current.path,
            to = %route.path,
            name = %route.name
        );
        *current = route.clone();
        Ok(route)
    }
}

#[cfg(test)]
#[path = "../../tests/core/router_tests.rs"]
mod tests;
