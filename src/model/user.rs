use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// What a user is allowed to do on the platform. Fixed for the life of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Farmer,
    Customer,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Farmer => "farmer",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "farmer" => Ok(Role::Farmer),
            "customer" => Ok(Role::Customer),
            other => Err(Error::InvalidInput(format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating a user; id and timestamp are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl NewUser {
    pub(crate) fn into_user(self, id: String, created_at: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            role: self.role,
            location: self.location,
            avatar: self.avatar,
            created_at,
        }
    }
}

/// Partial update for a [`User`]. Role is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(location) = self.location {
            user.location = location;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = Some(avatar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("farmer".parse::<Role>().unwrap(), Role::Farmer);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_json_shape() {
        let raw = r#"{
            "id": "admin1",
            "name": "Admin User",
            "email": "admin@ulimi.com",
            "phone": "+260 977 123456",
            "role": "admin",
            "location": "Lusaka",
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(user.avatar.is_none());

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00Z");
        assert!(value.get("avatar").is_none());
    }

    #[test]
    fn test_patch_keeps_untouched_fields() {
        let mut user: User = serde_json::from_value(serde_json::json!({
            "id": "u1", "name": "A", "email": "a@x.com", "phone": "1",
            "role": "customer", "location": "Ndola", "createdAt": "2024-02-05T11:30:00Z"
        }))
        .unwrap();
        UserPatch { location: Some("Kitwe".into()), ..Default::default() }.apply(&mut user);
        assert_eq!(user.location, "Kitwe");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, Role::Customer);
    }
}
