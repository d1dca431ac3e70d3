use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{FlyweightCache, UnknownKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleId {
    Owner,
    Editor,
    Viewer,
}

impl RoleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleId::Owner => "owner",
            RoleId::Editor => "editor",
            RoleId::Viewer => "viewer",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RoleId::Owner => "Owner",
            RoleId::Editor => "Editor",
            RoleId::Viewer => "Viewer",
        }
    }

    /// Roles that can be stored on a collaborator row. Ownership lives on the playlist.
    pub fn is_collaborator_role(&self) -> bool {
        matches!(self, RoleId::Editor | RoleId::Viewer)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleId {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(RoleId::Owner),
            "editor" => Ok(RoleId::Editor),
            "viewer" => Ok(RoleId::Viewer),
            other => Err(UnknownKey {
                kind: "role",
                key: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for RoleId {
    type Error = UnknownKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Role {
    id: RoleId,
    label: &'static str,
}

impl Role {
    pub fn id(&self) -> RoleId {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

#[derive(Debug, Default)]
pub struct RoleRegistry {
    cache: FlyweightCache<Role>,
}

impl RoleRegistry {
    pub fn get(&self, id: RoleId) -> Arc<Role> {
        self.cache.get_or_insert_with(id.as_str(), || Role {
            id,
            label: id.label(),
        })
    }

    #[cfg(test)]
    pub fn reset(&self) {
        self.cache.reset();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_role_returns_same_instance() {
        let roles = RoleRegistry::default();
        assert!(Arc::ptr_eq(&roles.get(RoleId::Editor), &roles.get(RoleId::Editor)));
    }

    #[test]
    fn different_roles_return_different_instances() {
        let roles = RoleRegistry::default();
        let editor = roles.get(RoleId::Editor);
        let viewer = roles.get(RoleId::Viewer);

        assert!(!Arc::ptr_eq(&editor, &viewer));
        assert_eq!(viewer.label(), "Viewer");
    }

    #[test]
    fn unknown_role_is_rejected_when_parsed() {
        let err = "admin".parse::<RoleId>().unwrap_err();
        assert_eq!(err.key, "admin");
        assert_eq!("viewer".parse::<RoleId>().unwrap(), RoleId::Viewer);
    }

    #[test]
    fn owner_is_not_a_collaborator_role() {
        assert!(!RoleId::Owner.is_collaborator_role());
        assert!(RoleId::Editor.is_collaborator_role());
    }

    #[test]
    fn reset_empties_the_cache() {
        let roles = RoleRegistry::default();
        roles.get(RoleId::Owner);
        roles.reset();
        assert_eq!(roles.len(), 0);
    }
}
