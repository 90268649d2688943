//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod district_repository;
pub mod inventory_repository;
pub mod item_repository;
pub mod repository_provider;
pub mod revoked_token_repository;
pub mod store_repository;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, QuerySelect,
    Select,
};

use crate::domain::DomainError;
use crate::infrastructure::database::entities::fold;
use crate::shared::{PageRequest, SortSpec};

fn db_err(e: DbErr) -> DomainError {
    DomainError::from(e)
}

/// Map a unique-constraint violation to `Conflict` with a readable message.
fn unique_err(e: DbErr, message: &str) -> DomainError {
    match DomainError::from(e) {
        DomainError::Conflict(_) => DomainError::Conflict(message.to_string()),
        other => other,
    }
}

/// Case-insensitive substring match against a `*_folded` column.
fn folded_contains<C: ColumnTrait>(column: C, text: &str) -> SimpleExpr {
    column.contains(fold(text))
}

fn order(sort: &SortSpec<'_>) -> Order {
    if sort.is_desc() {
        Order::Desc
    } else {
        Order::Asc
    }
}

/// Count the full result, then fetch one page of it.
async fn fetch_page<E>(
    db: &DatabaseConnection,
    query: Select<E>,
    page: PageRequest,
) -> Result<(Vec<E::Model>, u64), DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let total = query.clone().count(db).await?;
    let models = query
        .offset(page.offset())
        .limit(u64::from(page.limit))
        .all(db)
        .await?;
    Ok((models, total))
}

fn counts_to_map<K: Ord>(rows: Vec<(K, i64)>) -> std::collections::BTreeMap<K, u64> {
    rows.into_iter()
        .map(|(key, count)| (key, count.max(0) as u64))
        .collect()
}
