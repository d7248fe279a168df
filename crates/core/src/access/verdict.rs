//! Guard outcomes.

use std::fmt;

/// Where a halted request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectTarget {
    /// The sign-in entry point.
    Login,
    /// The home page.
    Root,
    /// The signed-in user's profile.
    Profile,
}

impl RedirectTarget {
    /// Path of the target page.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Root => "/",
            Self::Profile => "/profile",
        }
    }
}

/// Page rendered in place of the requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// Generic not-found page (`404`).
    NotFound,
    /// Repository not-found page (`repositories/404`).
    RepositoryNotFound,
}

impl Template {
    /// Template name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotFound => "404.html",
            Self::RepositoryNotFound => "repositories/404.html",
        }
    }
}

/// Terminal outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The request may continue.
    Proceed,
    /// The request stops with a redirect.
    Redirect(RedirectTarget),
    /// The request stops with a rendered page.
    Render(Template),
}

impl Verdict {
    /// Whether the request may continue.
    #[must_use]
    pub const fn is_proceed(self) -> bool {
        matches!(self, Self::Proceed)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => write!(f, "proceed"),
            Self::Redirect(target) => write!(f, "redirect to {}", target.path()),
            Self::Render(template) => write!(f, "render {}", template.name()),
        }
    }
}
