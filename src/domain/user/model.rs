//! User domain entity and role-based permissions

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::errors::DomainError;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Guest,
    Administrator,
    BrandManager,
    StoreManager,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        Self::Guest,
        Self::Administrator,
        Self::BrandManager,
        Self::StoreManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Administrator => "administrator",
            Self::BrandManager => "brand_manager",
            Self::StoreManager => "store_manager",
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        use Permission::*;
        match self {
            Self::Administrator => true,
            Self::BrandManager => matches!(
                permission,
                ViewStore | ViewBrandInventory | ManageBrandInventory
            ),
            Self::StoreManager => matches!(permission, ViewStore | ManageStoreInventory),
            Self::Guest => matches!(permission, ViewStore),
        }
    }

    /// Inventory writes need either inventory-management permission.
    pub fn can_manage_inventory(&self) -> bool {
        self.has_permission(Permission::ManageBrandInventory)
            || self.has_permission(Permission::ManageStoreInventory)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::Validation(format!("Unknown role: {}", s)))
    }
}

/// Named capabilities granted by roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ViewStore,
    ViewBrandInventory,
    ManageBrandInventory,
    ManageStoreInventory,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewStore => "view_store",
            Self::ViewBrandInventory => "view_brand_inventory",
            Self::ManageBrandInventory => "manage_brand_inventory",
            Self::ManageStoreInventory => "manage_store_inventory",
        }
    }
}

/// Which users an actor may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserVisibility {
    All,
    Roles(Vec<UserRole>),
    OnlySelf(String),
}

/// User model
#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_administrator(&self) -> bool {
        self.role == UserRole::Administrator
    }

    pub fn is_brand_manager(&self) -> bool {
        self.role == UserRole::BrandManager
    }

    pub fn is_store_manager(&self) -> bool {
        self.role == UserRole::StoreManager
    }

    pub fn is_guest(&self) -> bool {
        self.role == UserRole::Guest
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Whether `self` may update or delete `target`.
    pub fn can_manage(&self, target: &User) -> bool {
        if self.is_administrator() {
            return true;
        }
        if self.id == target.id {
            return false;
        }
        match self.role {
            UserRole::BrandManager => {
                matches!(target.role, UserRole::StoreManager | UserRole::Guest)
            }
            UserRole::StoreManager => target.role == UserRole::Guest,
            _ => false,
        }
    }

    pub fn visibility(&self) -> UserVisibility {
        match self.role {
            UserRole::Administrator => UserVisibility::All,
            UserRole::BrandManager => {
                UserVisibility::Roles(vec![UserRole::StoreManager, UserRole::Guest])
            }
            UserRole::StoreManager => UserVisibility::Roles(vec![UserRole::Guest]),
            UserRole::Guest => UserVisibility::OnlySelf(self.id.clone()),
        }
    }

    pub fn can_view(&self, target: &User) -> bool {
        match self.visibility() {
            UserVisibility::All => true,
            UserVisibility::Roles(roles) => roles.contains(&target.role),
            UserVisibility::OnlySelf(id) => id == target.id,
        }
    }
}

/// `^\+?1?\d{9,15}$`
pub fn is_valid_phone_number(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match digits.len() {
        9..=15 => true,
        16 => digits.starts_with('1'),
        _ => false,
    }
}

pub const MIN_PASSWORD_LEN: usize = 8;

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            username: format!("user_{id}"),
            email: format!("{id}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            role,
            phone_number: None,
            address: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    #[test]
    fn permissions_follow_role() {
        use Permission::*;
        assert!(UserRole::Administrator.has_permission(ManageStoreInventory));
        assert!(UserRole::BrandManager.has_permission(ManageBrandInventory));
        assert!(!UserRole::BrandManager.has_permission(ManageStoreInventory));
        assert!(UserRole::StoreManager.has_permission(ManageStoreInventory));
        assert!(!UserRole::StoreManager.has_permission(ViewBrandInventory));
        assert!(UserRole::Guest.has_permission(ViewStore));
        assert!(!UserRole::Guest.can_manage_inventory());
    }

    #[test]
    fn management_hierarchy() {
        let admin = user("a", UserRole::Administrator);
        let brand = user("b", UserRole::BrandManager);
        let store = user("s", UserRole::StoreManager);
        let guest = user("g", UserRole::Guest);

        assert!(admin.can_manage(&admin));
        assert!(admin.can_manage(&brand));
        assert!(brand.can_manage(&store));
        assert!(brand.can_manage(&guest));
        assert!(!brand.can_manage(&admin));
        assert!(!brand.can_manage(&brand));
        assert!(store.can_manage(&guest));
        assert!(!store.can_manage(&store));
        assert!(!guest.can_manage(&user("g2", UserRole::Guest)));
    }

    #[test]
    fn visibility_by_role() {
        let store = user("s", UserRole::StoreManager);
        let guest = user("g", UserRole::Guest);
        assert!(store.can_view(&guest));
        assert!(!store.can_view(&user("b", UserRole::BrandManager)));
        assert!(guest.can_view(&guest));
        assert!(!guest.can_view(&user("g2", UserRole::Guest)));
        assert_eq!(guest.visibility(), UserVisibility::OnlySelf("g".into()));
    }

    #[test]
    fn phone_number_format() {
        assert!(is_valid_phone_number("+84901234567"));
        assert!(is_valid_phone_number("0901234567"));
        assert!(!is_valid_phone_number("12345"));
        assert!(!is_valid_phone_number("+84 90 123 4567"));
        assert!(!is_valid_phone_number("12345678901234567"));
    }
}
