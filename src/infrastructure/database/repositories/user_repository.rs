use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use super::{db_err, fetch_page, folded_contains, order, unique_err};
use crate::domain::user::{UserVisibility, USER_ORDERING};
use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, UpdateUserDto, User, UserRepositoryInterface,
    UserRole,
};
use crate::infrastructure::crypto::password::hash_password;
use crate::infrastructure::database::entities::user;
use crate::shared::{PageRequest, PaginatedResult, SortSpec};

const DUPLICATE: &str = "Username or email already exists";

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn entity_role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Guest => UserRole::Guest,
        user::UserRole::Administrator => UserRole::Administrator,
        user::UserRole::BrandManager => UserRole::BrandManager,
        user::UserRole::StoreManager => UserRole::StoreManager,
    }
}

fn domain_role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Guest => user::UserRole::Guest,
        UserRole::Administrator => user::UserRole::Administrator,
        UserRole::BrandManager => user::UserRole::BrandManager,
        UserRole::StoreManager => user::UserRole::StoreManager,
    }
}

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        password_hash: model.password_hash,
        role: entity_role_to_domain(model.role),
        phone_number: model.phone_number,
        address: model.address,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
        last_login_at: model.last_login_at,
    }
}

async fn find_model(db: &DatabaseConnection, id: &str) -> DomainResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("User", id))
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepositoryInterface for UserRepository {
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        let password_hash = hash_password(&dto.password)
            .map_err(|e| DomainError::Validation(format!("Failed to hash password: {}", e)))?;

        let new_user = user::ActiveModel {
            id: Set(id),
            username: Set(dto.username),
            email: Set(dto.email),
            first_name: Set(dto.first_name),
            last_name: Set(dto.last_name),
            password_hash: Set(password_hash),
            role: Set(domain_role_to_entity(dto.role.unwrap_or_default())),
            phone_number: Set(dto.phone_number),
            address: Set(dto.address),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            last_login_at: Set(None),
            ..Default::default()
        };

        let model = new_user
            .insert(&self.db)
            .await
            .map_err(|e| unique_err(e, DUPLICATE))?;

        Ok(user_model_to_domain(model))
    }

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let page = PageRequest::new(dto.page, dto.limit);
        let mut query = user::Entity::find();

        // Visibility scope of the requesting user
        match &dto.visibility {
            UserVisibility::All => {}
            UserVisibility::Roles(roles) => {
                query = query.filter(
                    user::Column::Role.is_in(roles.iter().copied().map(domain_role_to_entity)),
                );
            }
            UserVisibility::OnlySelf(id) => {
                query = query.filter(user::Column::Id.eq(id.as_str()));
            }
        }

        if let Some(ref search) = dto.search {
            query = query.filter(
                Condition::any()
                    .add(folded_contains(user::Column::UsernameFolded, search))
                    .add(folded_contains(user::Column::EmailFolded, search))
                    .add(folded_contains(user::Column::FirstNameFolded, search))
                    .add(folded_contains(user::Column::LastNameFolded, search)),
            );
        }
        if let Some(role) = dto.role {
            query = query.filter(user::Column::Role.eq(domain_role_to_entity(role)));
        }
        if let Some(is_active) = dto.is_active {
            query = query.filter(user::Column::IsActive.eq(is_active));
        }

        let sort = SortSpec::parse(dto.ordering.as_deref(), USER_ORDERING, dto.default_ordering);
        let column = match sort.field {
            "username" => user::Column::Username,
            "email" => user::Column::Email,
            "role" => user::Column::Role,
            _ => user::Column::CreatedAt,
        };
        query = query
            .order_by(column, order(&sort))
            .order_by_asc(user::Column::Id);

        let (models, total) = fetch_page(&self.db, query, page).await.map_err(db_err)?;
        let items: Vec<User> = models.into_iter().map(user_model_to_domain).collect();

        Ok(PaginatedResult::new(items, total, page.page, page.limit))
    }

    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn count_users(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<Option<User>> {
        let existing = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut active: user::ActiveModel = existing.into();

        if let Some(first_name) = dto.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = dto.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(phone) = dto.phone_number {
            active.phone_number = Set(Some(phone));
        }
        if let Some(address) = dto.address {
            active.address = Set(Some(address));
        }
        if let Some(is_active) = dto.is_active {
            active.is_active = Set(is_active);
        }

        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| unique_err(e, DUPLICATE))?;

        Ok(Some(user_model_to_domain(updated)))
    }

    async fn update_user_password(&self, id: &str, new_password_hash: &str) -> DomainResult<()> {
        let mut active: user::ActiveModel = find_model(&self.db, id).await?.into();
        active.password_hash = Set(new_password_hash.to_string());
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;

        Ok(())
    }

    async fn update_user_role(&self, id: &str, role: UserRole) -> DomainResult<User> {
        let mut active: user::ActiveModel = find_model(&self.db, id).await?.into();
        active.role = Set(domain_role_to_entity(role));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await.map_err(db_err)?;

        Ok(user_model_to_domain(updated))
    }

    async fn touch_last_login(&self, id: &str) -> DomainResult<()> {
        let mut active: user::ActiveModel = find_model(&self.db, id).await?.into();
        active.last_login_at = Set(Some(Utc::now()));
        active.update(&self.db).await.map_err(db_err)?;

        Ok(())
    }

    async fn delete_user(&self, id: &str) -> DomainResult<()> {
        let result = user::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::crypto::password::verify_password;
    use crate::infrastructure::database::testing::memory_db;

    fn dto(username: &str, role: UserRole) -> CreateUserDto {
        CreateUserDto {
            username: username.into(),
            email: format!("{username}@example.com"),
            first_name: "Lan".into(),
            last_name: "Nguyen".into(),
            role: Some(role),
            phone_number: None,
            address: None,
            password: "secret-pass".into(),
        }
    }

    #[tokio::test]
    async fn create_hashes_password() {
        let repo = UserRepository::new(memory_db().await);
        let user = repo.create_user(dto("lan", UserRole::Guest)).await.unwrap();
        assert_ne!(user.password_hash, "secret-pass");
        assert!(verify_password("secret-pass", &user.password_hash).unwrap());
        assert!(uuid::Uuid::parse_str(&user.id).is_ok());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let repo = UserRepository::new(memory_db().await);
        repo.create_user(dto("lan", UserRole::Guest)).await.unwrap();
        let err = repo.create_user(dto("lan", UserRole::Guest)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_respects_visibility() {
        let repo = UserRepository::new(memory_db().await);
        repo.create_user(dto("admin", UserRole::Administrator)).await.unwrap();
        repo.create_user(dto("brand", UserRole::BrandManager)).await.unwrap();
        repo.create_user(dto("shop", UserRole::StoreManager)).await.unwrap();
        let guest = repo.create_user(dto("guest", UserRole::Guest)).await.unwrap();

        let visible = repo
            .list_users(GetUserDto {
                visibility: UserVisibility::Roles(vec![UserRole::StoreManager, UserRole::Guest]),
                ordering: Some("username".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = visible.items.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["guest", "shop"]);

        let own = repo
            .list_users(GetUserDto {
                visibility: UserVisibility::OnlySelf(guest.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(own.total, 1);
    }

    #[tokio::test]
    async fn role_change_persists() {
        let repo = UserRepository::new(memory_db().await);
        let user = repo.create_user(dto("lan", UserRole::Guest)).await.unwrap();
        let updated = repo
            .update_user_role(&user.id, UserRole::StoreManager)
            .await
            .unwrap();
        assert_eq!(updated.role, UserRole::StoreManager);
        assert!(repo.update_user_role("missing", UserRole::Guest).await.is_err());
    }
}
