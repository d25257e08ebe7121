use serde::{Deserialize, Serialize};

use crate::database::entities::users;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Creator,
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => "admin".to_string(),
            Role::Creator => "creator".to_string(),
        }
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match role.as_str() {
            "admin" => Role::Admin,
            _ => Role::Creator,
        }
    }
}

/// Authenticated identity performing an operation.
///
/// Supplied by the calling layer after authentication; the core trusts
/// it and performs only role/ownership checks against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub role: Role,
    pub is_active: bool,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&users::Model> for Principal {
    fn from(user: &users::Model) -> Self {
        Principal {
            id: user.id,
            role: Role::from(user.role.clone()),
            is_active: user.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_stored_form() {
        assert_eq!(String::from(Role::Admin), "admin");
        assert_eq!(String::from(Role::Creator), "creator");
        assert_eq!(Role::from(String::from(Role::Admin)), Role::Admin);
        assert_eq!(Role::from(String::from(Role::Creator)), Role::Creator);
    }

    #[test]
    fn unknown_role_string_falls_back_to_creator() {
        assert_eq!(Role::from("viewer".to_string()), Role::Creator);
    }
}
