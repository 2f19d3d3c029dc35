//! Notification policy evaluation.
//!
//! A pure function over a snapshot of the site configuration, the course,
//! the recipient and the optional course instance. No lookups happen here;
//! the event handler gathers the snapshot once per event.

mod evaluator;

pub use evaluator::{
    select_template, should_notify, Decision, GlobalFlagWiring, PolicyInput, PolicySettings,
    SkipReason, TemplateSource,
};
