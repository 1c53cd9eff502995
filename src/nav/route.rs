//! Static route table.
//!
//! DESIGN
//! ======
//! Each route carries a typed `RouteAccess` instead of a free-form metadata
//! bag. Patterns are `/`-separated segments where `:name` binds one segment
//! and a trailing `*` swallows the rest. Routes match in declaration order,
//! so the catch-all goes last.

use crate::session::Role;

// =============================================================================
// ACCESS
// =============================================================================

/// What a route requires of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteAccess {
    pub requires_auth: bool,
    /// Restrict to one role.
    pub role: Option<Role>,
}

impl RouteAccess {
    pub const PUBLIC: Self = Self { requires_auth: false, role: None };
    pub const AUTHENTICATED: Self = Self { requires_auth: true, role: None };

    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        Self { requires_auth: true, role: Some(role) }
    }
}

// =============================================================================
// ROUTES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Page(RouteAccess),
    /// Unconditional redirect, resolved before any guard runs.
    Redirect(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: &'static str,
    pub pattern: &'static str,
    pub target: RouteTarget,
}

impl Route {
    #[must_use]
    pub const fn page(name: &'static str, pattern: &'static str, access: RouteAccess) -> Self {
        Self { name, pattern, target: RouteTarget::Page(access) }
    }

    #[must_use]
    pub const fn redirect(name: &'static str, pattern: &'static str, to: &'static str) -> Self {
        Self { name, pattern, target: RouteTarget::Redirect(to) }
    }

    /// Bind `path` against this route's pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Vec<(&'static str, String)>> {
        match_pattern(self.pattern, path)
    }
}

/// A resolved route with its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: Vec<(&'static str, String)>,
}

impl RouteMatch<'_> {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(key, _)| *key == name).map(|(_, value)| value.as_str())
    }
}

// =============================================================================
// TABLE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The course platform's page set.
    #[must_use]
    pub fn standard() -> Self {
        use RouteAccess as A;

        Self::new(vec![
            Route::redirect("Root", "/", "/welcome"),
            Route::page("Welcome", "/welcome", A::PUBLIC),
            // auth
            Route::page("Login", "/login", A::PUBLIC),
            Route::page("Register", "/register", A::PUBLIC),
            Route::page("ResetPassword", "/reset-password", A::PUBLIC),
            // student
            Route::page("StudentHome", "/student/home", A::for_role(Role::Student)),
            Route::page("StudentCourse", "/student/course/:id", A::for_role(Role::Student)),
            Route::page(
                "StudentAssignment",
                "/student/course/:id/assignment/:assignmentId",
                A::for_role(Role::Student),
            ),
            // teacher
            Route::page("TeacherHome", "/teacher/home", A::for_role(Role::Teacher)),
            Route::page("TeacherCourse", "/teacher/course/:id", A::for_role(Role::Teacher)),
            Route::page(
                "TeacherAssignment",
                "/teacher/course/:id/assignment/:assignmentId",
                A::for_role(Role::Teacher),
            ),
            // llm, either role
            Route::page("LLMIndex", "/llm", A::AUTHENTICATED),
            Route::page("ChatPage", "/llm/chat/:id", A::AUTHENTICATED),
            Route::page("AgentPage", "/llm/agent/:id", A::AUTHENTICATED),
            Route::page("NotFound", "/*", A::PUBLIC),
        ])
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// First route whose pattern matches `path`. Query and fragment are
    /// ignored.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = strip_query(path);
        self.routes
            .iter()
            .find_map(|route| route.matches(path).map(|params| RouteMatch { route, params }))
    }
}

// =============================================================================
// MATCHING
// =============================================================================

/// Path portion of `raw`, without `?query` or `#fragment`.
#[must_use]
pub fn strip_query(raw: &str) -> &str {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    &raw[..end]
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_pattern(pattern: &'static str, path: &str) -> Option<Vec<(&'static str, String)>> {
    let mut params = Vec::new();
    let mut path_segments = segments(path);

    for expected in segments(pattern) {
        if expected == "*" {
            return Some(params);
        }
        let actual = path_segments.next()?;
        if let Some(name) = expected.strip_prefix(':') {
            params.push((name, actual.to_owned()));
        } else if expected != actual {
            return None;
        }
    }

    if path_segments.next().is_some() {
        return None;
    }
    Some(params)
}

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;
