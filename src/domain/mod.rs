//! Domain layer modules
//!
//! This module contains the notifier's business logic:
//! - `enrolment`: Event and record snapshots
//! - `template`: Placeholder rendering
//! - `policy`: Eligibility rules and template selection
//! - `instance`: Course-level configuration records and form

pub mod enrolment;
pub mod instance;
pub mod policy;
pub mod template;
