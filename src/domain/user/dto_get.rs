use super::{UserRole, UserVisibility};

#[derive(Debug, Clone)]
pub struct GetUserDto {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `username`, `email`, `created_at` or `role`, `-` prefix for descending
    pub ordering: Option<String>,
    pub default_ordering: &'static str,
    pub visibility: UserVisibility,
}

impl Default for GetUserDto {
    fn default() -> Self {
        Self {
            search: None,
            role: None,
            is_active: None,
            page: None,
            limit: None,
            ordering: None,
            default_ordering: "-created_at",
            visibility: UserVisibility::All,
        }
    }
}
