//! Message template rendering.
//!
//! Templates are plain HTML strings with `{NAME}` placeholders resolved from
//! the course, the recipient, their custom profile fields and (when present)
//! the enrolment record.
//!
//! # Example
//!
//! ```ignore
//! let renderer = TemplateRenderer::new(DateFormatter::default());
//! let body = renderer.render(
//!     "Welcome {FIRSTNAME} to {COURSEFULLNAME} ({URL})",
//!     &user,
//!     &course,
//!     Some(&enrolment),
//! );
//! ```

mod renderer;
mod tokens;

pub use renderer::TemplateRenderer;
pub use tokens::{
    known_tokens, resolve_token, RenderScope, TokenGroup, TokenInfo, TokenSpec,
    PROFILE_FIELD_PREFIX, TOKENS,
};
