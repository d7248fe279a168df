//! Access control for owner pages and public issue forms.
//!
//! Handlers build an [`AccessGuard`] over the request's [`Session`] and the
//! directory, ask it for a [`Verdict`], and stop unless it is
//! [`Verdict::Proceed`].
//!
//! [`Session`]: crate::session::Session

mod error;
mod guard;
mod verdict;

#[cfg(test)]
mod guard_props;

pub use error::AccessDenial;
pub use guard::AccessGuard;
pub use verdict::{RedirectTarget, Template, Verdict};
