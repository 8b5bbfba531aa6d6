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
                    .col(pk_auto(Movies::Id))
                    .col(text_null(Movies::Name))
                    .col(text_null(Movies::Description))
                    .col(double_null(Movies::Duration))
                    .col(double_null(Movies::Price))
                    .to_owned(),
            )
            .await?;

        // Backstop for the request-time duplicate check. NULL names never collide.
        manager
            .create_index(
                Index::create()
                    .name("idx_movies_name_unique")
                    .table(Movies::Table)
                    .col(Movies::Name)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_movies_name_unique").table(Movies::Table).to_owned())
            .await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Name,
    Description,
    Duration,
    Price,
}
