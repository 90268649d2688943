//! Database entities module

pub mod district;
pub mod inventory;
pub mod item;
pub mod revoked_token;
pub mod store;
pub mod user;

pub use district::Entity as District;
pub use inventory::Entity as Inventory;
pub use item::Entity as Item;
pub use revoked_token::Entity as RevokedToken;
pub use store::Entity as Store;
pub use user::Entity as User;

use sea_orm::ActiveValue;

/// Lowercase form stored in the `*_folded` columns. SQLite `LIKE` folds
/// ASCII only, so text search matches a folded query against these.
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Refresh `target` from `source` when `source` is being written.
fn refold(source: &ActiveValue<String>, target: &mut ActiveValue<String>) {
    if let ActiveValue::Set(value) = source {
        *target = ActiveValue::Set(fold(value));
    }
}

fn refold_opt(source: &ActiveValue<Option<String>>, target: &mut ActiveValue<String>) {
    if let ActiveValue::Set(value) = source {
        *target = ActiveValue::Set(value.as_deref().map(fold).unwrap_or_default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_lowercases_vietnamese_letters() {
        assert_eq!(fold("QUẬN BÌNH THẠNH"), "quận bình thạnh");
        assert_eq!(fold("Đà Nẵng"), "đà nẵng");
    }

    #[test]
    fn refold_only_follows_written_values() {
        let mut target = ActiveValue::Unchanged("old".to_string());
        refold(&ActiveValue::Unchanged("Ignored".to_string()), &mut target);
        assert!(matches!(&target, ActiveValue::Unchanged(v) if v == "old"));

        refold_opt(&ActiveValue::Set(None), &mut target);
        assert!(matches!(&target, ActiveValue::Set(v) if v.is_empty()));
        refold_opt(&ActiveValue::Set(Some("Phở".into())), &mut target);
        assert!(matches!(&target, ActiveValue::Set(v) if v == "phở"));
    }
}
