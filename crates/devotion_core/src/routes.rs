//! Navigation surface and admin gating.
//!
//! # Responsibility
//! - Map request paths to typed routes.
//! - Decide render/wait/redirect for a route given the session.
//!
//! # Invariants
//! - Admin routes never render without a signed-in admin.
//! - Unknown paths redirect home.
//! - A devotion link with a malformed id renders the not-found view.

use crate::model::devotion::DevotionId;
use crate::session::SessionState;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static DEVOTION_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/devotion/([^/]+)$").expect("valid devotion path regex"));
static EDIT_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/admin/devotion/edit/([^/]+)$").expect("valid edit path regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Archive,
    Devotion(DevotionId),
    /// `/devotion/<segment>` whose segment is not a devotion id.
    DevotionNotFound(String),
    AdminLogin,
    AdminDashboard,
    AdminCreate,
    AdminEdit(DevotionId),
    /// Bare `/admin`; forwards to the dashboard.
    AdminRoot,
    Unknown(String),
}

impl Route {
    /// Parses a request path; a trailing slash and query string are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        match trimmed {
            "/" | "" => return Self::Home,
            "/archive" => return Self::Archive,
            "/admin" => return Self::AdminRoot,
            "/admin/login" => return Self::AdminLogin,
            "/admin/dashboard" => return Self::AdminDashboard,
            "/admin/devotion/new" => return Self::AdminCreate,
            _ => {}
        }

        if let Some(raw) = capture_segment(&DEVOTION_PATH_RE, trimmed) {
            return match Uuid::parse_str(raw) {
                Ok(id) => Self::Devotion(id),
                Err(_) => Self::DevotionNotFound(raw.to_string()),
            };
        }
        if let Some(id) = capture_segment(&EDIT_PATH_RE, trimmed)
            .and_then(|raw| Uuid::parse_str(raw).ok())
        {
            return Self::AdminEdit(id);
        }
        Self::Unknown(trimmed.to_string())
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Archive => "/archive".to_string(),
            Self::Devotion(id) => format!("/devotion/{id}"),
            Self::DevotionNotFound(raw) => format!("/devotion/{raw}"),
            Self::AdminLogin => "/admin/login".to_string(),
            Self::AdminDashboard => "/admin/dashboard".to_string(),
            Self::AdminCreate => "/admin/devotion/new".to_string(),
            Self::AdminEdit(id) => format!("/admin/devotion/edit/{id}"),
            Self::AdminRoot => "/admin".to_string(),
            Self::Unknown(path) => path.clone(),
        }
    }

    /// Routes that require a signed-in admin.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::AdminDashboard | Self::AdminCreate | Self::AdminEdit(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    /// Session not resolved yet; show a spinner.
    Wait,
    Redirect(Route),
}

/// Decides what to do with `route` for the current session.
pub fn guard(route: &Route, session: &SessionState) -> RouteDecision {
    if session.loading {
        return RouteDecision::Wait;
    }

    match route {
        Route::AdminRoot => RouteDecision::Redirect(Route::AdminDashboard),
        Route::Unknown(_) => RouteDecision::Redirect(Route::Home),
        gated if gated.requires_admin() => {
            if !session.is_signed_in() {
                RouteDecision::Redirect(Route::AdminLogin)
            } else if !session.is_admin {
                RouteDecision::Redirect(Route::Home)
            } else {
                RouteDecision::Render
            }
        }
        _ => RouteDecision::Render,
    }
}

fn capture_segment<'a>(pattern: &Regex, path: &'a str) -> Option<&'a str> {
    Some(pattern.captures(path)?.get(1)?.as_str())
}
