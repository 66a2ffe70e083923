use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(integer(Movies::Rank).primary_key())
                    .col(string(Movies::Title))
                    .col(string(Movies::Genre))
                    .col(string(Movies::Description))
                    .col(string(Movies::Director))
                    .col(string(Movies::Actors))
                    .col(integer(Movies::Year))
                    .col(integer_null(Movies::Runtime))
                    .col(double_null(Movies::Rating))
                    .col(big_integer_null(Movies::Votes))
                    .col(double_null(Movies::Revenue))
                    .col(integer_null(Movies::Metascore))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username))
                    .col(string(Users::Password))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_username_unique")
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Movies {
    Table,
    Rank,
    Title,
    Genre,
    Description,
    Director,
    Actors,
    Year,
    Runtime,
    Rating,
    Votes,
    Revenue,
    Metascore,
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
    Password,
}
