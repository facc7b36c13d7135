//! User profiles.

use serde::{Deserialize, Serialize};

/// Coarse access role of a digital library user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Authenticated,
    Public,
}

/// Profile of the user the adapter session is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: String,
    pub role: Role,
}

impl UserProfile {
    pub fn new(login: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            login: login.into(),
            name: name.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_round_trip() {
        let profile = UserProfile::new("jdoe", "Jane Doe", Role::Authenticated);
        let json = serde_json::to_string(&profile).unwrap();
        let back: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
