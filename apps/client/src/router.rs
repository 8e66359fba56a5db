//! Route table and Navigation Guard.
//!
//! The guard is a two-state machine (`Unauthenticated` / `Authenticated`) decided purely
//! by credential presence at the instant of each transition. It never caches that state
//! and never remembers the destination it redirected away from.

use std::sync::Arc;

use tracing::{debug, info};

use crate::credentials::CredentialStore;

pub const LOGIN_PATH: &str = "/login";

/// One node of the static route tree.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub path: &'static str,
    pub name: Option<&'static str>,
    /// Static redirect applied before the guard runs.
    pub redirect: Option<&'static str>,
    /// The unauthenticated entry point. Exactly one entry carries this flag.
    pub public: bool,
    pub children: Vec<RouteEntry>,
}

impl RouteEntry {
    fn leaf(path: &'static str, name: &'static str) -> Self {
        RouteEntry {
            path,
            name: Some(name),
            redirect: None,
            public: false,
            children: Vec::new(),
        }
    }
}

/// A route resolved to its absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub full_path: String,
    pub name: Option<&'static str>,
    pub redirect: Option<String>,
    pub public: bool,
}

/// Static, nested route table. Children paths are relative to their parent.
#[derive(Debug, Clone)]
pub struct RouteTable {
    roots: Vec<RouteEntry>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::interview_app()
    }
}

impl RouteTable {
    pub fn new(roots: Vec<RouteEntry>) -> Self {
        Self { roots }
    }

    /// The candidate-facing application: login, then the main layout and its screens.
    pub fn interview_app() -> Self {
        let main_children = [
            ("Home", "Home"),
            ("Settings", "Settings"),
            ("Going", "Going"),
            ("CreateJob_1", "CreateJob_1"),
            ("CreateJob_2", "CreateJob_2"),
            ("CreateJob_3", "CreateJob_3"),
            ("Review", "Review"),
        ]
        .into_iter()
        .map(|(path, name)| RouteEntry::leaf(path, name))
        .collect();

        Self::new(vec![
            RouteEntry {
                path: "/",
                name: None,
                redirect: Some(LOGIN_PATH),
                public: false,
                children: Vec::new(),
            },
            RouteEntry {
                path: LOGIN_PATH,
                name: Some("Login"),
                redirect: None,
                public: true,
                children: Vec::new(),
            },
            RouteEntry {
                path: "/MainLayout",
                name: Some("MainLayout"),
                redirect: Some("/MainLayout/Home"),
                public: false,
                children: main_children,
            },
        ])
    }

    /// All routes flattened to absolute paths, parents before children.
    pub fn flatten(&self) -> Vec<ResolvedRoute> {
        let mut out = Vec::new();
        for root in &self.roots {
            flatten_into(root, "", &mut out);
        }
        out
    }

    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        let wanted = normalize_path(path);
        self.flatten().into_iter().find(|r| r.full_path == wanted)
    }

    /// Path of the unauthenticated entry point.
    pub fn entry_path(&self) -> String {
        self.flatten()
            .into_iter()
            .find(|r| r.public)
            .map(|r| r.full_path)
            .unwrap_or_else(|| LOGIN_PATH.to_string())
    }
}

fn flatten_into(entry: &RouteEntry, parent: &str, out: &mut Vec<ResolvedRoute>) {
    let full_path = if entry.path.starts_with('/') {
        entry.path.to_string()
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), entry.path)
    };
    out.push(ResolvedRoute {
        full_path: full_path.clone(),
        name: entry.name,
        redirect: entry.redirect.map(String::from),
        public: entry.public,
    });
    for child in &entry.children {
        flatten_into(child, &full_path, out);
    }
}

/// Drops query/fragment and a trailing slash (except for the root).
fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => path,
    }
}

/// Logical guard state, derived per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

/// Outcome of a guarded transition. The guard never fails; it only redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

#[derive(Clone)]
pub struct NavigationGuard {
    credentials: Arc<dyn CredentialStore>,
    entry_path: String,
}

impl NavigationGuard {
    pub fn new(credentials: Arc<dyn CredentialStore>, entry_path: impl Into<String>) -> Self {
        Self {
            credentials,
            entry_path: entry_path.into(),
        }
    }

    pub fn state(&self) -> AuthState {
        if self.credentials.is_present() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Runs before every transition. Presence only; the token's contents are not inspected.
    pub fn before_each(&self, to: &str) -> GuardDecision {
        if normalize_path(to) == self.entry_path {
            return GuardDecision::Allow;
        }
        match self.state() {
            AuthState::Authenticated => GuardDecision::Allow,
            AuthState::Unauthenticated => {
                debug!("Guard: no credential, redirecting {to} -> {}", self.entry_path);
                GuardDecision::Redirect(self.entry_path.clone())
            }
        }
    }
}

/// Where a navigation request ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Arrived(ResolvedRoute),
    NotFound(String),
}

/// Host-side navigation: applies static redirects, the guard, and tracks the current path.
pub struct Navigator {
    table: RouteTable,
    guard: NavigationGuard,
    current: Option<String>,
}

/// Upper bound on chained redirects, guarding against a cyclic table.
const MAX_REDIRECTS: usize = 8;

impl Navigator {
    pub fn new(table: RouteTable, credentials: Arc<dyn CredentialStore>) -> Self {
        let guard = NavigationGuard::new(credentials, table.entry_path());
        Self {
            table,
            guard,
            current: None,
        }
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn navigate(&mut self, to: &str) -> Navigation {
        let mut target = normalize_path(to);

        for _ in 0..MAX_REDIRECTS {
            if let GuardDecision::Redirect(entry) = self.guard.before_each(&target) {
                target = entry;
                continue;
            }
            match self.table.resolve(&target) {
                Some(route) => match &route.redirect {
                    Some(next) => target = next.clone(),
                    None => {
                        info!("Navigated to {}", route.full_path);
                        self.current = Some(route.full_path.clone());
                        return Navigation::Arrived(route);
                    }
                },
                None => return Navigation::NotFound(target),
            }
        }
        Navigation::NotFound(target)
    }
}
