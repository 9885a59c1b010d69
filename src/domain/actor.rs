//! The authenticated actor performing an operation.
//!
//! Every service operation takes an explicit `Actor` value instead of
//! reading ambient authentication state, so business logic stays testable
//! without HTTP plumbing.

use serde::{Deserialize, Serialize};

/// Role carried in the identity token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Authenticated identity performing an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Customer id for customer tokens, staff user id for admin tokens
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn customer(id: i64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            role: Role::Customer,
        }
    }

    pub fn admin(id: i64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this actor may read or mutate data belonging to `customer_id`
    pub fn can_access_customer(&self, customer_id: i64) -> bool {
        self.is_admin() || (self.role == Role::Customer && self.id == customer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_admin_can_access_any_customer() {
        let actor = Actor::admin(1, "ops@domainly.example");
        assert!(actor.can_access_customer(42));
        assert!(actor.can_access_customer(7));
    }

    #[test]
    fn test_customer_can_access_only_self() {
        let actor = Actor::customer(42, "alice@example.com");
        assert!(actor.can_access_customer(42));
        assert!(!actor.can_access_customer(7));
    }

    #[test]
    fn test_role_display_roundtrip() {
        assert_eq!(Role::Customer.to_string().parse::<Role>().unwrap(), Role::Customer);
        assert_eq!(Role::Admin.to_string().parse::<Role>().unwrap(), Role::Admin);
    }
}
