//! Domain enums shared between the backend and API clients

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Roles
// ============================================================================

/// Account role.
///
/// Variants are declared from least to most privileged, so the derived
/// `Ord` is the role hierarchy: `User < Moderator < Admin < SuperAdmin`.
/// Every privilege comparison in the system goes through this ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::User, Role::Moderator, Role::Admin, Role::SuperAdmin];

    /// Roles allowed to manage other accounts.
    pub const STAFF: [Role; 2] = [Role::Admin, Role::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Moderator => "MODERATOR",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPERADMIN",
        }
    }

    /// True when `self` sits strictly above `target` in the hierarchy.
    ///
    /// An actor may only act on accounts strictly below their own level;
    /// peers (including oneself) are never manageable.
    pub fn outranks(&self, target: Role) -> bool {
        *self > target
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "MODERATOR" => Ok(Role::Moderator),
            "ADMIN" => Ok(Role::Admin),
            "SUPERADMIN" => Ok(Role::SuperAdmin),
            _ => Err(format!(
                "Invalid role: {}. Valid roles are: USER, MODERATOR, ADMIN, SUPERADMIN",
                s
            )),
        }
    }
}

// ============================================================================
// Post lifecycle
// ============================================================================

/// Publication state of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostStatus {
    #[default]
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "DRAFT",
            PostStatus::Scheduled => "SCHEDULED",
            PostStatus::Published => "PUBLISHED",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Ok(PostStatus::Draft),
            "SCHEDULED" => Ok(PostStatus::Scheduled),
            "PUBLISHED" => Ok(PostStatus::Published),
            _ => Err(format!("Unknown post status: {}", s)),
        }
    }
}

/// Format of a post's raw content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    #[default]
    Markdown,
    Html,
    /// Block-editor JSON document
    Editor,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Markdown => "MARKDOWN",
            ContentType::Html => "HTML",
            ContentType::Editor => "EDITOR",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MARKDOWN" => Ok(ContentType::Markdown),
            "HTML" => Ok(ContentType::Html),
            "EDITOR" => Ok(ContentType::Editor),
            _ => Err(format!("Unknown content type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_role_hierarchy_order() {
        assert!(Role::User < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
        assert!(Role::Admin < Role::SuperAdmin);
    }

    #[test]
    fn test_role_never_outranks_itself() {
        for role in Role::ALL {
            assert!(!role.outranks(role));
        }
    }

    #[rstest]
    #[case("USER", Role::User)]
    #[case("moderator", Role::Moderator)]
    #[case(" Admin ", Role::Admin)]
    #[case("superadmin", Role::SuperAdmin)]
    fn test_role_parse(#[case] input: &str, #[case] expected: Role) {
        assert_eq!(input.parse::<Role>().unwrap(), expected);
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        assert!("OWNER".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"SUPERADMIN\"");
        assert_eq!(serde_json::to_string(&Role::Moderator).unwrap(), "\"MODERATOR\"");
        let parsed: Role = serde_json::from_str("\"SUPERADMIN\"").unwrap();
        assert_eq!(parsed, Role::SuperAdmin);
    }

    #[test]
    fn test_post_status_round_trips_through_str() {
        for status in [PostStatus::Draft, PostStatus::Scheduled, PostStatus::Published] {
            assert_eq!(status.as_str().parse::<PostStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_content_type_default_is_markdown() {
        assert_eq!(ContentType::default(), ContentType::Markdown);
        assert_eq!("editor".parse::<ContentType>().unwrap(), ContentType::Editor);
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Ordering follows the hierarchy listed in `ALL`
        #[test]
        fn prop_ordering_matches_hierarchy(a in role_strategy(), b in role_strategy()) {
            let rank = |r: Role| Role::ALL.iter().position(|x| *x == r);
            prop_assert_eq!(a.cmp(&b), rank(a).cmp(&rank(b)));
            prop_assert_eq!(a.outranks(b), rank(a) > rank(b));
        }

        /// Outranking is asymmetric
        #[test]
        fn prop_outranks_is_asymmetric(a in role_strategy(), b in role_strategy()) {
            prop_assert!(!(a.outranks(b) && b.outranks(a)));
        }
    }
}
