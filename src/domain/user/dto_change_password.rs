#[derive(Debug, Clone)]
pub struct UserChangePasswordDto {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}
