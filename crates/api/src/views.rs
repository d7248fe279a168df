//! HTML views.
//!
//! Templates are compiled into the binary and rendered with minijinja.
//! Names end in `.html`, so every value is HTML-escaped.

use std::sync::LazyLock;

use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;
use tracing::error;

use gitreport_core::{Repository, RepositorySettings};

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("profile.html", include_str!("../templates/profile.html")),
    ("404.html", include_str!("../templates/404.html")),
    ("error.html", include_str!("../templates/error.html")),
    (
        "repositories/show.html",
        include_str!("../templates/repositories/show.html"),
    ),
    (
        "repositories/edit.html",
        include_str!("../templates/repositories/edit.html"),
    ),
    (
        "repositories/404.html",
        include_str!("../templates/repositories/404.html"),
    ),
    ("issues/new.html", include_str!("../templates/issues/new.html")),
    (
        "issues/thanks.html",
        include_str!("../templates/issues/thanks.html"),
    ),
];

static ENVIRONMENT: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    for &(name, source) in TEMPLATES {
        if let Err(err) = env.add_template(name, source) {
            error!(template = name, error = %err, "template failed to compile");
        }
    }
    env
});

/// Renders a template.
///
/// # Errors
///
/// Returns an error if the template is unknown or fails to render.
pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<Html<String>, minijinja::Error> {
    ENVIRONMENT.get_template(name)?.render(ctx).map(Html)
}

/// A repository as the templates see it.
#[derive(Debug, Serialize)]
pub struct RepositoryView<'a> {
    /// Internal ID, used in management URLs.
    pub id: String,
    /// GitHub repository name.
    pub name: &'a str,
    /// Holder login.
    pub holder: &'a str,
    /// Display name or repository name.
    pub title: &'a str,
    /// Whether the public form is open.
    pub is_active: bool,
    /// Text shown above the public form.
    pub prompt: Option<&'a str>,
    /// Text shown after a submission.
    pub followup: Option<&'a str>,
    /// Raw settings for the owner pages.
    pub settings: &'a RepositorySettings,
}

impl<'a> From<&'a Repository> for RepositoryView<'a> {
    fn from(repo: &'a Repository) -> Self {
        Self {
            id: repo.id.to_string(),
            name: &repo.name,
            holder: repo.holder_name(),
            title: repo.title(),
            is_active: repo.is_active,
            prompt: repo.settings.prompt.as_deref(),
            followup: repo.settings.followup.as_deref(),
            settings: &repo.settings,
        }
    }
}
