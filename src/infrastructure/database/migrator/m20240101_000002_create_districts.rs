//! Migration to create districts table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Districts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Districts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Districts::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Districts::Code)
                            .string_len(10)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Districts::Boundary).text().null())
                    .col(ColumnDef::new(Districts::MinLng).double().null())
                    .col(ColumnDef::new(Districts::MinLat).double().null())
                    .col(ColumnDef::new(Districts::MaxLng).double().null())
                    .col(ColumnDef::new(Districts::MaxLat).double().null())
                    .col(
                        ColumnDef::new(Districts::City)
                            .string_len(100)
                            .not_null()
                            .default("Ho Chi Minh City"),
                    )
                    .col(ColumnDef::new(Districts::Population).big_integer().null())
                    .col(ColumnDef::new(Districts::AreaKm2).double().null())
                    .col(
                        ColumnDef::new(Districts::DistrictType)
                            .string_len(20)
                            .not_null()
                            .default("urban"),
                    )
                    .col(ColumnDef::new(Districts::AvgIncome).double().null())
                    .col(
                        ColumnDef::new(Districts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Districts::NameFolded).string().not_null().default(""))
                    .col(ColumnDef::new(Districts::CodeFolded).string().not_null().default(""))
                    .col(ColumnDef::new(Districts::CityFolded).string().not_null().default(""))
                    .col(
                        ColumnDef::new(Districts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Districts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_districts_bbox")
                    .table(Districts::Table)
                    .col(Districts::MinLng)
                    .col(Districts::MaxLng)
                    .col(Districts::MinLat)
                    .col(Districts::MaxLat)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Districts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Districts {
    Table,
    Id,
    Name,
    Code,
    Boundary,
    MinLng,
    MinLat,
    MaxLng,
    MaxLat,
    City,
    Population,
    AreaKm2,
    DistrictType,
    AvgIncome,
    IsActive,
    NameFolded,
    CodeFolded,
    CityFolded,
    CreatedAt,
    UpdatedAt,
}
