use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An organization role. Stored as lowercase text on the membership row;
/// parsed back into the enum before any permission check so that unknown
/// strings are rejected instead of silently granted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(ParseRoleError {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid role '{}' (expected owner, admin or member)",
            self.value
        )
    }
}

impl std::error::Error for ParseRoleError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Organization,
    Member,
    Invitation,
    Customer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Cancel,
}

/// The statement set for a role: each entry maps a resource to the actions
/// that role may perform on it. Resources absent from the set are denied.
fn statements(role: Role) -> &'static [(Resource, &'static [Action])] {
    use Action::*;
    use Resource::*;
    match role {
        Role::Owner => &[
            (Organization, &[Update, Delete]),
            (Member, &[Create, Update, Delete]),
            (Invitation, &[Create, Cancel]),
            (Customer, &[Read]),
        ],
        Role::Admin => &[
            (Organization, &[Update]),
            (Member, &[Create, Update, Delete]),
            (Invitation, &[Create, Cancel]),
            (Customer, &[Create, Read, Update, Delete]),
        ],
        Role::Member => &[(Customer, &[Read])],
    }
}

/// Returns true only when the role's statement set allows every requested
/// action on the resource. An empty request is vacuously permitted.
pub fn has_permission(role: Role, resource: Resource, actions: &[Action]) -> bool {
    let allowed: &[Action] = statements(role)
        .iter()
        .find(|(r, _)| *r == resource)
        .map(|(_, a)| *a)
        .unwrap_or(&[]);
    actions.iter().all(|a| allowed.contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_manages_organization_and_members() {
        assert!(has_permission(
            Role::Owner,
            Resource::Organization,
            &[Action::Update, Action::Delete]
        ));
        assert!(has_permission(
            Role::Owner,
            Resource::Member,
            &[Action::Create, Action::Update, Action::Delete]
        ));
        assert!(has_permission(
            Role::Owner,
            Resource::Invitation,
            &[Action::Create, Action::Cancel]
        ));
    }

    #[test]
    fn owner_reads_but_does_not_write_customers() {
        assert!(has_permission(Role::Owner, Resource::Customer, &[Action::Read]));
        assert!(!has_permission(Role::Owner, Resource::Customer, &[Action::Create]));
        assert!(!has_permission(Role::Owner, Resource::Customer, &[Action::Delete]));
    }

    #[test]
    fn admin_cannot_delete_organization() {
        assert!(has_permission(Role::Admin, Resource::Organization, &[Action::Update]));
        assert!(!has_permission(
            Role::Admin,
            Resource::Organization,
            &[Action::Delete]
        ));
        assert!(!has_permission(
            Role::Admin,
            Resource::Organization,
            &[Action::Update, Action::Delete]
        ));
    }

    #[test]
    fn admin_has_full_customer_access() {
        assert!(has_permission(
            Role::Admin,
            Resource::Customer,
            &[Action::Create, Action::Read, Action::Update, Action::Delete]
        ));
    }

    #[test]
    fn member_only_reads_customers() {
        assert!(has_permission(Role::Member, Resource::Customer, &[Action::Read]));
        assert!(!has_permission(Role::Member, Resource::Customer, &[Action::Delete]));
        assert!(!has_permission(Role::Member, Resource::Member, &[Action::Create]));
        assert!(!has_permission(
            Role::Member,
            Resource::Organization,
            &[Action::Update]
        ));
    }

    #[test]
    fn all_requested_actions_must_be_allowed() {
        // read alone passes, read+delete fails for a plain member
        assert!(has_permission(Role::Member, Resource::Customer, &[Action::Read]));
        assert!(!has_permission(
            Role::Member,
            Resource::Customer,
            &[Action::Read, Action::Delete]
        ));
    }

    #[test]
    fn empty_action_list_is_vacuously_true() {
        assert!(has_permission(Role::Member, Resource::Organization, &[]));
    }

    #[test]
    fn unknown_role_strings_fail_to_parse() {
        assert_eq!("owner".parse::<Role>(), Ok(Role::Owner));
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("member".parse::<Role>(), Ok(Role::Member));
        assert!("superuser".parse::<Role>().is_err());
        assert!("Owner".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn role_round_trips_through_storage_form() {
        for role in [Role::Owner, Role::Admin, Role::Member] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }
}
