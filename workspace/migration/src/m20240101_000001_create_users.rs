use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{user, user_category, user_city};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table. Usernames are intentionally not unique.
        manager
            .create_table(
                Table::create()
                    .table(User::table())
                    .if_not_exists()
                    .col(pk_auto(User::column(user::Column::Id)))
                    .col(string(User::column(user::Column::Username)))
                    .col(timestamp_with_time_zone(User::column(user::Column::CreatedAt)))
                    .col(timestamp_with_time_zone(User::column(user::Column::UpdatedAt)))
                    .to_owned(),
            )
            .await?;

        // Create user_cities table
        manager
            .create_table(
                Table::create()
                    .table(UserCity::table())
                    .if_not_exists()
                    .col(pk_auto(UserCity::column(user_city::Column::Id)))
                    .col(integer(UserCity::column(user_city::Column::UserId)))
                    .col(string(UserCity::column(user_city::Column::CityName)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_cities_user")
                            .from(UserCity::table(), UserCity::column(user_city::Column::UserId))
                            .to(User::table(), User::column(user::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create user_categories table
        manager
            .create_table(
                Table::create()
                    .table(UserCategory::table())
                    .if_not_exists()
                    .col(pk_auto(UserCategory::column(user_category::Column::Id)))
                    .col(integer(UserCategory::column(user_category::Column::UserId)))
                    .col(string(UserCategory::column(user_category::Column::CategoryName)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_categories_user")
                            .from(
                                UserCategory::table(),
                                UserCategory::column(user_category::Column::UserId),
                            )
                            .to(User::table(), User::column(user::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_categories_user_name")
                    .table(UserCategory::table())
                    .col(UserCategory::column(user_category::Column::UserId))
                    .col(UserCategory::column(user_category::Column::CategoryName))
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserCategory::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserCity::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::table()).to_owned())
            .await?;
        Ok(())
    }
}
