use crate::error::ApiError;
use crate::schema::{UserRole, Uuid};

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
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageAllRecipes,
            ActionType::ManageUsers,
        ],
    ),
];

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    ManageOwnSubscriptions,

    ManageUsers,
    ManageAllRecipes,
}

/// The acting user, as resolved by the serving layer. The SDK never reads
/// ambient request state; every check goes through an explicit actor.
#[derive(Clone, Debug)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn can(&self, action: ActionType) -> bool {
        ACTION_TABLE
            .iter()
            .find(|(role, _)| *role == self.role)
            .map(|(_, actions)| actions.contains(&action))
            .unwrap_or(false)
    }

    pub fn authorize(&self, action: ActionType) -> Result<(), ApiError> {
        if self.can(action) {
            Ok(())
        } else {
            Err(ApiError::permission_denied(
                "Action is not permitted for this role",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_manage_their_own_resources() {
        let actor = Actor::new(1, UserRole::User);
        assert!(actor.authorize(ActionType::CreateRecipes).is_ok());
        assert!(actor.authorize(ActionType::ManageOwnCart).is_ok());
    }

    #[test]
    fn users_cannot_manage_foreign_recipes() {
        let actor = Actor::new(1, UserRole::User);
        let denied = actor.authorize(ActionType::ManageAllRecipes);
        assert!(matches!(denied, Err(ApiError::PermissionDenied(_))));
    }

    #[test]
    fn admins_manage_everything() {
        let actor = Actor::new(2, UserRole::Admin);
        assert!(actor.can(ActionType::ManageAllRecipes));
        assert!(actor.can(ActionType::ManageUsers));
    }
}
