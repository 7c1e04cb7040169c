//! The access-control gate for public content.
//!
//! Public content endpoints never hard-deny members-only material; they
//! degrade to a teaser (metadata with the body withheld). The decision is a
//! pure function of the viewer's role and the resource's gating flag, so it
//! lives here and nowhere else.

use crate::roles::Role;

/// What a viewer may see of a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentAccess {
    /// Full body served, `is_locked: false`.
    Full,
    /// Metadata only; body withheld, `is_locked: true`.
    Locked,
}

impl ContentAccess {
    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, ContentAccess::Locked)
    }
}

/// Whether an (optionally anonymous) viewer may read members-only bodies.
///
/// Anonymous callers rank below `USER` and never qualify.
#[must_use]
pub fn can_view_member_content(viewer: Option<Role>) -> bool {
    viewer.is_some_and(Role::can_view_member_content)
}

/// Gate a single piece of content for a viewer.
///
/// Content that is not members-only is always fully visible; gated content
/// requires the viewer to satisfy `MEMBER_FREE`.
#[must_use]
pub fn gate_content(viewer: Option<Role>, members_only: bool) -> ContentAccess {
    if !members_only || can_view_member_content(viewer) {
        ContentAccess::Full
    } else {
        ContentAccess::Locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_content_is_full_for_everyone() {
        for viewer in [
            None,
            Some(Role::User),
            Some(Role::MemberFree),
            Some(Role::MemberGold),
            Some(Role::Admin),
        ] {
            assert_eq!(gate_content(viewer, false), ContentAccess::Full);
        }
    }

    #[test]
    fn gated_content_truth_table() {
        assert_eq!(gate_content(None, true), ContentAccess::Locked);
        assert_eq!(gate_content(Some(Role::User), true), ContentAccess::Locked);
        assert_eq!(
            gate_content(Some(Role::MemberFree), true),
            ContentAccess::Full
        );
        assert_eq!(
            gate_content(Some(Role::MemberGold), true),
            ContentAccess::Full
        );
        assert_eq!(gate_content(Some(Role::Admin), true), ContentAccess::Full);
    }

    #[test]
    fn gate_agrees_with_role_predicate_for_every_viewer() {
        // The lock flag must always be the negation of the shared
        // predicate, for every viewer.
        for viewer in [
            None,
            Some(Role::User),
            Some(Role::MemberFree),
            Some(Role::MemberGold),
            Some(Role::Admin),
        ] {
            let access = gate_content(viewer, true);
            assert_eq!(access.is_locked(), !can_view_member_content(viewer));
        }
    }
}
