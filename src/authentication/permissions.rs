use crate::database::schema::UserRole;

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
        ],
    ),
    (
        UserRole::Moderator,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageAllRecipes,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageAllRecipes,
            ActionType::ManageTags,
            ActionType::ImportIngredients,
            ActionType::ManageUsers,
        ],
    ),
];

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    ManageOwnSubscriptions,

    ManageAllRecipes,
    ManageTags,
    ImportIngredients,
    ManageUsers,
}

impl ActionType {
    pub fn permitted(self, role: &UserRole) -> bool {
        ACTION_TABLE
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, actions)| actions.contains(&self))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_manage_their_own_content_only() {
        assert!(ActionType::ManageOwnRecipes.permitted(&UserRole::User));
        assert!(!ActionType::ManageAllRecipes.permitted(&UserRole::User));
        assert!(!ActionType::ManageTags.permitted(&UserRole::User));
    }

    #[test]
    fn moderators_manage_all_recipes_but_not_tags() {
        assert!(ActionType::ManageAllRecipes.permitted(&UserRole::Moderator));
        assert!(!ActionType::ManageTags.permitted(&UserRole::Moderator));
    }

    #[test]
    fn admins_hold_every_action() {
        for action in [
            ActionType::CreateRecipes,
            ActionType::ManageAllRecipes,
            ActionType::ManageTags,
            ActionType::ImportIngredients,
            ActionType::ManageUsers,
        ] {
            assert!(action.permitted(&UserRole::Admin));
        }
    }
}
