//! SeaORM implementation of RevokedTokenRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::db_err;
use crate::domain::user::RevokedTokenRepository;
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::revoked_token;

pub struct SeaOrmRevokedTokenRepository {
    db: DatabaseConnection,
}

impl SeaOrmRevokedTokenRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RevokedTokenRepository for SeaOrmRevokedTokenRepository {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> DomainResult<()> {
        let row = revoked_token::ActiveModel {
            jti: Set(jti.to_string()),
            expires_at: Set(expires_at),
            revoked_at: Set(Utc::now()),
        };

        // Logging out twice with the same token is a no-op
        revoked_token::Entity::insert(row)
            .on_conflict(
                OnConflict::column(revoked_token::Column::Jti)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> DomainResult<bool> {
        let found = revoked_token::Entity::find_by_id(jti)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    async fn purge_expired(&self) -> DomainResult<u64> {
        let result = revoked_token::Entity::delete_many()
            .filter(revoked_token::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::testing::memory_db;
    use chrono::Duration;

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let repo = SeaOrmRevokedTokenRepository::new(memory_db().await);
        let exp = Utc::now() + Duration::days(7);
        repo.revoke("abc", exp).await.unwrap();
        repo.revoke("abc", exp).await.unwrap();
        assert!(repo.is_revoked("abc").await.unwrap());
        assert!(!repo.is_revoked("other").await.unwrap());
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let repo = SeaOrmRevokedTokenRepository::new(memory_db().await);
        repo.revoke("old", Utc::now() - Duration::hours(1)).await.unwrap();
        repo.revoke("fresh", Utc::now() + Duration::hours(1)).await.unwrap();

        assert_eq!(repo.purge_expired().await.unwrap(), 1);
        assert!(!repo.is_revoked("old").await.unwrap());
        assert!(repo.is_revoked("fresh").await.unwrap());
    }
}
