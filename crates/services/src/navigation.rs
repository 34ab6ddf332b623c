use std::fmt;

use prep_core::model::Role;

use crate::moderation::can_administer;

/// Shown in place of the admin panel for everyone but admins.
pub const ADMIN_DENIED_MESSAGE: &str = "ACESSO NEGADO: APENAS ADMINISTRADORES.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    QuestionBank,
    VideoLessons,
    Materials,
    Store,
    StudentArea,
    Admin,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::QuestionBank,
        Route::VideoLessons,
        Route::Materials,
        Route::Store,
        Route::StudentArea,
        Route::Admin,
    ];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Route::QuestionBank => "/",
            Route::VideoLessons => "/videoaulas",
            Route::Materials => "/pdfs",
            Route::Store => "/loja",
            Route::StudentArea => "/aluno",
            Route::Admin => "/admin",
        }
    }

    /// Sidebar label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Route::QuestionBank => "Banco Questões",
            Route::VideoLessons => "Videoaulas",
            Route::Materials => "Materiais PDF",
            Route::Store => "Loja Premium",
            Route::StudentArea => "Minha Conta",
            Route::Admin => "Painel Admin",
        }
    }

    /// Match a path, ignoring a trailing slash.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        let normalized = match trimmed.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        Self::ALL.into_iter().find(|r| r.path() == normalized)
    }

    #[must_use]
    pub fn is_admin_only(self) -> bool {
        matches!(self, Route::Admin)
    }

    #[must_use]
    pub fn allows(self, role: Role) -> bool {
        !self.is_admin_only() || can_administer(role)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    View(Route),
    Denied(Route),
    NotFound,
}

/// Resolve `path` for a user with `role`.
#[must_use]
pub fn resolve(path: &str, role: Role) -> RouteOutcome {
    match Route::from_path(path) {
        Some(route) if route.allows(role) => RouteOutcome::View(route),
        Some(route) => RouteOutcome::Denied(route),
        None => RouteOutcome::NotFound,
    }
}

/// Sidebar entries visible to `role`, in display order.
#[must_use]
pub fn sidebar(role: Role) -> Vec<Route> {
    Route::ALL.into_iter().filter(|r| r.allows(role)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip_through_from_path() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/loja/"), Some(Route::Store));
        assert_eq!(Route::from_path(""), Some(Route::QuestionBank));
        assert_eq!(Route::from_path("/ranking"), None);
    }

    #[test]
    fn admin_route_is_denied_to_moderators() {
        assert_eq!(resolve("/admin", Role::Admin), RouteOutcome::View(Route::Admin));
        assert_eq!(
            resolve("/admin", Role::Moderator),
            RouteOutcome::Denied(Route::Admin)
        );
        assert_eq!(resolve("/pdfs", Role::User), RouteOutcome::View(Route::Materials));
        assert_eq!(resolve("/nope", Role::Admin), RouteOutcome::NotFound);
    }

    #[test]
    fn sidebar_hides_admin_entry_for_non_admins() {
        assert_eq!(sidebar(Role::Admin).len(), 6);
        let labels: Vec<_> = sidebar(Role::User).into_iter().map(Route::label).collect();
        assert_eq!(
            labels,
            ["Banco Questões", "Videoaulas", "Materiais PDF", "Loja Premium", "Minha Conta"]
        );
    }
}
