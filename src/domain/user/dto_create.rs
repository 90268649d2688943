use super::UserRole;

#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<UserRole>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub password: String,
}
