//! Migration to create stores table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stores::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Stores::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Stores::Address).text().not_null())
                    .col(ColumnDef::new(Stores::Phone).string_len(20).null())
                    .col(ColumnDef::new(Stores::Email).string_len(254).null())
                    .col(ColumnDef::new(Stores::Latitude).double().null())
                    .col(ColumnDef::new(Stores::Longitude).double().null())
                    .col(
                        ColumnDef::new(Stores::StoreType)
                            .string_len(20)
                            .not_null()
                            .default("other"),
                    )
                    .col(ColumnDef::new(Stores::District).string_len(100).null())
                    .col(ColumnDef::new(Stores::DistrictId).integer().null())
                    .col(
                        ColumnDef::new(Stores::City)
                            .string_len(100)
                            .not_null()
                            .default("Ho Chi Minh City"),
                    )
                    .col(ColumnDef::new(Stores::OpeningHours).string_len(100).null())
                    .col(
                        ColumnDef::new(Stores::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Stores::Rating).double().null())
                    .col(ColumnDef::new(Stores::NameFolded).string().not_null().default(""))
                    .col(ColumnDef::new(Stores::AddressFolded).string().not_null().default(""))
                    .col(ColumnDef::new(Stores::CityFolded).string().not_null().default(""))
                    .col(ColumnDef::new(Stores::DistrictFolded).string().not_null().default(""))
                    .col(
                        ColumnDef::new(Stores::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Stores::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stores_district")
                            .from(Stores::Table, Stores::DistrictId)
                            .to(Districts::Table, Districts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stores_location")
                    .table(Stores::Table)
                    .col(Stores::Latitude)
                    .col(Stores::Longitude)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stores_district_id")
                    .table(Stores::Table)
                    .col(Stores::DistrictId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stores_store_type")
                    .table(Stores::Table)
                    .col(Stores::StoreType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stores::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Stores {
    Table,
    Id,
    Name,
    Address,
    Phone,
    Email,
    Latitude,
    Longitude,
    StoreType,
    District,
    DistrictId,
    City,
    OpeningHours,
    IsActive,
    Rating,
    NameFolded,
    AddressFolded,
    CityFolded,
    DistrictFolded,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Districts {
    Table,
    Id,
}
