/// Review obligation attached to an owner entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerModifier {
    /// Normal owner, eligible for review requests.
    Default,
    /// Owns the files but must not be requested as a reviewer.
    Silent,
    /// Owns the files and must be mentioned in the notification comment.
    Notify,
}

/// An individual or team associated with a file-path scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Individual {
        username: String,
        modifier: OwnerModifier,
    },
    Team {
        name: String,
        members: Vec<String>,
        modifier: OwnerModifier,
    },
}

impl Owner {
    /// Display name: the username itself, or the team name.
    pub fn name(&self) -> &str {
        match self {
            Owner::Individual { username, .. } => username,
            Owner::Team { name, .. } => name,
        }
    }

    pub fn modifier(&self) -> OwnerModifier {
        match self {
            Owner::Individual { modifier, .. } => *modifier,
            Owner::Team { modifier, .. } => *modifier,
        }
    }

    /// Usernames behind this entry. An individual expands to itself, a team
    /// to its constituent members.
    pub fn all_usernames(&self) -> Vec<String> {
        match self {
            Owner::Individual { username, .. } => vec![username.clone()],
            Owner::Team { members, .. } => members.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn individual_expands_to_itself() {
        let owner = Owner::Individual {
            username: "alice".to_string(),
            modifier: OwnerModifier::Default,
        };
        assert_eq!(owner.name(), "alice");
        assert_eq!(owner.all_usernames(), vec!["alice".to_string()]);
    }

    #[test]
    fn team_expands_to_members() {
        let owner = Owner::Team {
            name: "infra-team".to_string(),
            members: vec!["bob".to_string(), "carol".to_string()],
            modifier: OwnerModifier::Silent,
        };
        assert_eq!(owner.name(), "infra-team");
        assert_eq!(
            owner.all_usernames(),
            vec!["bob".to_string(), "carol".to_string()]
        );
        assert_eq!(owner.modifier(), OwnerModifier::Silent);
    }
}
