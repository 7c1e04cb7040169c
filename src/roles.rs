//! The membership role model.
//!
//! Roles form a total order `USER < MEMBER_FREE < MEMBER_GOLD`, with `ADMIN`
//! as an out-of-band override that satisfies every check unconditionally.
//! This module is the single source of truth for role ordering; nothing else
//! in the crate recomputes it inline.

use serde::{Deserialize, Serialize};

/// A user's role.
///
/// The wire representation is the uppercase form (`"MEMBER_GOLD"` etc.).
/// Parsing is fail-closed: an unknown string becomes [`Role::User`], the
/// least privileged role, rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Signed-in but not a member.
    User,
    /// Registered, non-paying member.
    MemberFree,
    /// Paying "gold" member.
    MemberGold,
    /// Operator; bypasses every role check.
    Admin,
}

impl Role {
    /// Rank within the member ordering. `Admin` never relies on its rank;
    /// [`Role::satisfies`] short-circuits it first.
    fn rank(self) -> u8 {
        match self {
            Role::User => 0,
            Role::MemberFree => 1,
            Role::MemberGold => 2,
            Role::Admin => 3,
        }
    }

    /// Whether this role is at least as privileged as `required`.
    ///
    /// `Admin` satisfies everything unconditionally.
    #[must_use]
    pub fn satisfies(self, required: Role) -> bool {
        self == Role::Admin || self.rank() >= required.rank()
    }

    /// Whether this role unlocks members-only content.
    ///
    /// Free and gold members see the same articles; gold only buys
    /// out-of-band perks. This predicate is used by every gating site.
    #[must_use]
    pub fn can_view_member_content(self) -> bool {
        self.satisfies(Role::MemberFree)
    }

    /// True for the paying and non-paying member tiers (not plain users,
    /// not admins). Used by the admin member listing.
    #[must_use]
    pub fn is_member(self) -> bool {
        matches!(self, Role::MemberFree | Role::MemberGold)
    }

    /// Parse a role string, defaulting unknown values to [`Role::User`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "USER" => Role::User,
            "MEMBER_FREE" => Role::MemberFree,
            "MEMBER_GOLD" => Role::MemberGold,
            "ADMIN" => Role::Admin,
            _ => Role::User,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::MemberFree => "MEMBER_FREE",
            Role::MemberGold => "MEMBER_GOLD",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_total_over_member_tiers() {
        assert!(Role::MemberGold.satisfies(Role::MemberFree));
        assert!(Role::MemberGold.satisfies(Role::User));
        assert!(Role::MemberFree.satisfies(Role::User));
        assert!(!Role::User.satisfies(Role::MemberFree));
        assert!(!Role::MemberFree.satisfies(Role::MemberGold));
    }

    #[test]
    fn admin_satisfies_everything() {
        assert!(Role::Admin.satisfies(Role::User));
        assert!(Role::Admin.satisfies(Role::MemberFree));
        assert!(Role::Admin.satisfies(Role::MemberGold));
        assert!(Role::Admin.satisfies(Role::Admin));
    }

    #[test]
    fn member_content_predicate_matches_rank_rule() {
        for role in [Role::User, Role::MemberFree, Role::MemberGold, Role::Admin] {
            assert_eq!(
                role.can_view_member_content(),
                role.satisfies(Role::MemberFree),
                "mismatch for {role}"
            );
        }
        assert!(!Role::User.can_view_member_content());
        assert!(Role::MemberFree.can_view_member_content());
        assert!(Role::MemberGold.can_view_member_content());
        assert!(Role::Admin.can_view_member_content());
    }

    #[test]
    fn unknown_strings_parse_fail_closed() {
        assert_eq!(Role::parse("SUPERUSER"), Role::User);
        assert_eq!(Role::parse(""), Role::User);
        assert_eq!(Role::parse("member_gold"), Role::User);
    }

    #[test]
    fn round_trips_through_serde() {
        let json = serde_json::to_string(&Role::MemberGold).unwrap();
        assert_eq!(json, "\"MEMBER_GOLD\"");
        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Role::MemberGold);

        // Fail-closed on unknown wire values.
        let odd: Role = serde_json::from_str("\"WIZARD\"").unwrap();
        assert_eq!(odd, Role::User);
    }

    #[test]
    fn member_filter_excludes_plain_users_and_admins() {
        assert!(!Role::User.is_member());
        assert!(Role::MemberFree.is_member());
        assert!(Role::MemberGold.is_member());
        assert!(!Role::Admin.is_member());
    }
}
