//! Placeholder token table.
//!
//! Every recognized `{NAME}` placeholder maps to a resolver function. The
//! table is ordered by substitution group; a resolver returning `None`
//! leaves the placeholder in the output verbatim.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

use crate::enrolment::{CourseContext, EnrolmentContext, ProfileDatatype, UserContext};
use crate::i18n::DateFormatter;

/// Prefix of custom profile field placeholders, e.g. `{PROFILEFIELD_OFFICE}`
pub const PROFILE_FIELD_PREFIX: &str = "PROFILEFIELD_";

/// Substitution groups, in the order they take precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenGroup {
    Url,
    Course,
    User,
    ProfileField,
    Enrolment,
    Legacy,
}

/// Values visible to resolvers during one render
pub struct RenderScope<'a> {
    pub user: &'a UserContext,
    pub course: &'a CourseContext,
    pub enrolment: Option<&'a EnrolmentContext>,
    pub dates: &'a DateFormatter,
}

type Resolver = fn(&RenderScope<'_>) -> Option<String>;

/// A statically known placeholder
pub struct TokenSpec {
    pub name: &'static str,
    pub group: TokenGroup,
    resolve: Resolver,
}

impl TokenSpec {
    const fn new(name: &'static str, group: TokenGroup, resolve: Resolver) -> Self {
        Self { name, group, resolve }
    }

    pub fn resolve(&self, scope: &RenderScope<'_>) -> Option<String> {
        (self.resolve)(scope)
    }
}

fn enrolment_date(scope: &RenderScope<'_>, pick: fn(&EnrolmentContext) -> i64) -> Option<String> {
    scope.enrolment.map(|e| scope.dates.date_or_never(pick(e)))
}

/// All fixed placeholders, grouped in substitution order
pub static TOKENS: &[TokenSpec] = &[
    TokenSpec::new("URL", TokenGroup::Url, |s| Some(s.course.url.clone())),
    TokenSpec::new("COURSEFULLNAME", TokenGroup::Course, |s| Some(s.course.full_name.clone())),
    TokenSpec::new("COURSESHORTNAME", TokenGroup::Course, |s| Some(s.course.short_name.clone())),
    TokenSpec::new("COURSEIDNUMBER", TokenGroup::Course, |s| Some(s.course.id_number.clone())),
    TokenSpec::new("COURSESTARTDATE", TokenGroup::Course, |s| {
        Some(s.dates.date_or_never(s.course.start_date))
    }),
    TokenSpec::new("COURSEENDDATE", TokenGroup::Course, |s| {
        Some(s.dates.date_or_never(s.course.end_date))
    }),
    TokenSpec::new("USERNAME", TokenGroup::User, |s| Some(s.user.username.clone())),
    TokenSpec::new("IDNUMBER", TokenGroup::User, |s| Some(s.user.id_number.clone())),
    TokenSpec::new("FIRSTNAME", TokenGroup::User, |s| Some(s.user.first_name.clone())),
    TokenSpec::new("LASTNAME", TokenGroup::User, |s| Some(s.user.last_name.clone())),
    TokenSpec::new("EMAIL", TokenGroup::User, |s| Some(s.user.email.clone())),
    TokenSpec::new("CITY", TokenGroup::User, |s| Some(s.user.city.clone())),
    TokenSpec::new("COUNTRY", TokenGroup::User, |s| Some(s.user.country.clone())),
    TokenSpec::new("ENROLTIMECREATED", TokenGroup::Enrolment, |s| {
        enrolment_date(s, |e| e.time_created)
    }),
    TokenSpec::new("ENROLTIMEMODIFIED", TokenGroup::Enrolment, |s| {
        enrolment_date(s, |e| e.time_modified)
    }),
    TokenSpec::new("ENROLTIMESTART", TokenGroup::Enrolment, |s| {
        enrolment_date(s, |e| e.time_start)
    }),
    TokenSpec::new("ENROLTIMEEND", TokenGroup::Enrolment, |s| {
        enrolment_date(s, |e| e.time_end)
    }),
    TokenSpec::new("COURSENAME", TokenGroup::Legacy, |s| Some(s.course.full_name.clone())),
    TokenSpec::new("NOMBRE", TokenGroup::Legacy, |s| Some(s.user.first_name.clone())),
    TokenSpec::new("APELLIDO", TokenGroup::Legacy, |s| Some(s.user.last_name.clone())),
];

lazy_static! {
    static ref TOKEN_INDEX: HashMap<&'static str, &'static TokenSpec> = {
        let mut index = HashMap::with_capacity(TOKENS.len());
        for spec in TOKENS {
            // First entry wins, which keeps group precedence if a name repeats
            index.entry(spec.name).or_insert(spec);
        }
        index
    };
}

/// Resolve a custom profile field placeholder suffix.
///
/// The suffix must be the uppercase form of a field shortname. Fields the
/// user has no value for, and shortnames that are not defined at all,
/// resolve to an empty string.
fn resolve_profile_field(suffix: &str, scope: &RenderScope<'_>) -> Option<String> {
    if suffix.is_empty() || suffix != suffix.to_uppercase() {
        return None;
    }

    let Some(field) = scope
        .user
        .profile_fields
        .iter()
        .find(|(shortname, _)| shortname.to_uppercase() == suffix)
        .map(|(_, field)| field)
    else {
        return Some(String::new());
    };

    if field.datatype == ProfileDatatype::Datetime {
        if let Ok(timestamp) = field.value.trim().parse::<i64>() {
            if timestamp > 0 {
                return Some(
                    scope
                        .dates
                        .format(timestamp)
                        .unwrap_or_else(|| field.value.clone()),
                );
            }
        }
    }

    Some(field.value.clone())
}

/// Resolve the text between braces. `None` means "not a recognized token
/// in this scope" and the placeholder stays as written.
pub fn resolve_token(name: &str, scope: &RenderScope<'_>) -> Option<String> {
    if let Some(suffix) = name.strip_prefix(PROFILE_FIELD_PREFIX) {
        return resolve_profile_field(suffix, scope);
    }

    TOKEN_INDEX.get(name).and_then(|spec| spec.resolve(scope))
}

/// Public description of a placeholder, for tooling and help screens
#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    pub token: String,
    pub group: TokenGroup,
}

/// Every fixed placeholder plus one entry per profile field shortname given
pub fn known_tokens<'a>(profile_shortnames: impl IntoIterator<Item = &'a str>) -> Vec<TokenInfo> {
    let mut tokens: Vec<TokenInfo> = TOKENS
        .iter()
        .map(|spec| TokenInfo {
            token: format!("{{{}}}", spec.name),
            group: spec.group,
        })
        .collect();

    tokens.extend(profile_shortnames.into_iter().map(|shortname| TokenInfo {
        token: format!("{{{}{}}}", PROFILE_FIELD_PREFIX, shortname.to_uppercase()),
        group: TokenGroup::ProfileField,
    }));

    tokens.sort_by_key(|t| t.group);
    tokens
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::enrolment::ProfileField;

    fn scope_parts() -> (UserContext, CourseContext, EnrolmentContext, DateFormatter) {
        let mut user = UserContext {
            id: 7,
            username: "adiaz".into(),
            first_name: "Ana".into(),
            last_name: "Diaz".into(),
            email: "ana@example.org".into(),
            city: "Rosario".into(),
            country: "AR".into(),
            id_number: "U-77".into(),
            ..Default::default()
        };
        user.profile_fields
            .insert("office".into(), ProfileField::text("B-204"));
        let course = CourseContext {
            id: 3,
            full_name: "Biology 101".into(),
            short_name: "BIO101".into(),
            id_number: "C-3".into(),
            start_date: 0,
            end_date: 0,
            visible: true,
            url: "https://lms/course/view.php?id=3".into(),
        };
        let enrolment = EnrolmentContext::default();
        (user, course, enrolment, DateFormatter::default())
    }

    #[test]
    fn test_token_names_unique_and_uppercase() {
        let mut seen = HashSet::new();
        for spec in TOKENS {
            assert!(seen.insert(spec.name), "duplicate token {}", spec.name);
            assert_eq!(spec.name, spec.name.to_uppercase());
            assert!(!spec.name.starts_with(PROFILE_FIELD_PREFIX));
        }
        assert_eq!(TOKENS.len(), 20);
    }

    #[test]
    fn test_table_is_in_group_order() {
        assert!(TOKENS.windows(2).all(|w| w[0].group <= w[1].group));
    }

    #[test]
    fn test_every_token_resolves_with_full_scope() {
        let (user, course, enrolment, dates) = scope_parts();
        let scope = RenderScope {
            user: &user,
            course: &course,
            enrolment: Some(&enrolment),
            dates: &dates,
        };

        let expected: &[(&str, &str)] = &[
            ("URL", "https://lms/course/view.php?id=3"),
            ("COURSEFULLNAME", "Biology 101"),
            ("COURSESHORTNAME", "BIO101"),
            ("COURSEIDNUMBER", "C-3"),
            ("COURSESTARTDATE", "Never"),
            ("COURSEENDDATE", "Never"),
            ("USERNAME", "adiaz"),
            ("IDNUMBER", "U-77"),
            ("FIRSTNAME", "Ana"),
            ("LASTNAME", "Diaz"),
            ("EMAIL", "ana@example.org"),
            ("CITY", "Rosario"),
            ("COUNTRY", "AR"),
            ("ENROLTIMECREATED", "Never"),
            ("ENROLTIMEMODIFIED", "Never"),
            ("ENROLTIMESTART", "Never"),
            ("ENROLTIMEEND", "Never"),
            ("COURSENAME", "Biology 101"),
            ("NOMBRE", "Ana"),
            ("APELLIDO", "Diaz"),
        ];
        assert_eq!(expected.len(), TOKENS.len());

        for (name, value) in expected {
            assert_eq!(resolve_token(name, &scope).as_deref(), Some(*value), "token {}", name);
        }
    }

    #[test]
    fn test_enrolment_tokens_need_enrolment() {
        let (user, course, _, dates) = scope_parts();
        let scope = RenderScope {
            user: &user,
            course: &course,
            enrolment: None,
            dates: &dates,
        };
        for spec in TOKENS.iter().filter(|s| s.group == TokenGroup::Enrolment) {
            assert_eq!(spec.resolve(&scope), None);
        }
    }

    #[test]
    fn test_profile_field_resolution() {
        let (mut user, course, _, dates) = scope_parts();
        user.profile_fields
            .insert("hired".into(), ProfileField::datetime(1_709_649_000));
        user.profile_fields
            .insert("left".into(), ProfileField::datetime(0));
        let scope = RenderScope {
            user: &user,
            course: &course,
            enrolment: None,
            dates: &dates,
        };

        assert_eq!(resolve_token("PROFILEFIELD_OFFICE", &scope).as_deref(), Some("B-204"));
        assert_eq!(
            resolve_token("PROFILEFIELD_HIRED", &scope).as_deref(),
            Some("Tuesday, 5 March 2024, 2:30 PM")
        );
        assert_eq!(resolve_token("PROFILEFIELD_LEFT", &scope).as_deref(), Some("0"));
        assert_eq!(resolve_token("PROFILEFIELD_MISSING", &scope).as_deref(), Some(""));
        assert_eq!(resolve_token("PROFILEFIELD_office", &scope), None);
        assert_eq!(resolve_token("PROFILEFIELD_", &scope), None);
    }

    #[test]
    fn test_lowercase_names_not_recognized() {
        let (user, course, _, dates) = scope_parts();
        let scope = RenderScope {
            user: &user,
            course: &course,
            enrolment: None,
            dates: &dates,
        };
        assert_eq!(resolve_token("firstname", &scope), None);
        assert_eq!(resolve_token("FirstName", &scope), None);
    }

    #[test]
    fn test_known_tokens_lists_profile_fields() {
        let tokens = known_tokens(["office", "badge"]);
        assert_eq!(tokens.len(), TOKENS.len() + 2);
        assert!(tokens
            .iter()
            .any(|t| t.token == "{PROFILEFIELD_OFFICE}" && t.group == TokenGroup::ProfileField));
        assert_eq!(tokens.first().map(|t| t.token.as_str()), Some("{URL}"));
        assert_eq!(tokens.last().map(|t| t.group), Some(TokenGroup::Legacy));
    }
}
