//! Collaborators the session layer drives but does not implement.

/// Route the user lands on when signed out.
pub const LOGIN: &str = "/login";

/// Route for choosing among several organizations after password login.
pub const SCHOOL_SELECTION: &str = "/school-selection";

/// Landing route of an authenticated session.
pub const DASHBOARD: &str = "/dashboard";

const PUBLIC_ROUTES: &[&str] = &[
    "/",
    LOGIN,
    SCHOOL_SELECTION,
    "/register",
    "/forgot-password",
    "/reset-password",
    "/verify-email",
    "/verify-phone",
];

/// Whether `path` is a public or login-adjacent route.
///
/// Query strings and trailing slashes are ignored; sub-paths of a public
/// route (e.g. `/reset-password/abc`) are public too, except under `/`.
pub fn is_public_route(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    PUBLIC_ROUTES.iter().any(|route| {
        path == *route
            || (*route != "/"
                && path.strip_prefix(route).is_some_and(|rest| rest.starts_with('/')))
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl NavigateOptions {
    pub fn replace() -> Self {
        Self { replace: true }
    }
}

pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    fn navigate(&self, path: &str, options: NavigateOptions);
}

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    fn show_success(&self, title: &str, message: &str);

    fn show_error(&self, title: &str, message: &str);
}
