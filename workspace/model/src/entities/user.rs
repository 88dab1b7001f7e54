use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};

/// Represents a user of the system.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Always stored lowercase. Deliberately not unique.
    pub username: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_city::Entity")]
    UserCity,
    #[sea_orm(has_many = "super::user_category::Entity")]
    UserCategory,
}

impl Related<super::user_city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCity.def()
    }
}

impl Related<super::user_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCategory.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Normalizes the username and stamps the audit columns on every write,
    /// including writes that do not go through `UserRecord`.
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(username) = &self.username {
            let normalized = username.to_lowercase();
            self.username = Set(normalized);
        }

        let now = chrono::Utc::now();
        if insert {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, QueryFilter};

    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_before_save_lowercases_username_on_insert() {
        let db = setup_test_db().await;

        let user = ActiveModel {
            username: Set("MiXeD".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        assert_eq!(user.username, "mixed");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[tokio::test]
    async fn test_before_save_lowercases_username_on_update() {
        let db = setup_test_db().await;

        let user = ActiveModel {
            username: Set("first".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let created_at = user.created_at;

        let mut active: ActiveModel = user.into();
        active.username = Set("SECOND".to_string());
        let updated = active.update(&db).await.unwrap();

        assert_eq!(updated.username, "second");
        assert_eq!(updated.created_at, created_at);
        assert!(updated.updated_at >= created_at);
    }

    #[tokio::test]
    async fn test_duplicate_usernames_are_allowed() {
        let db = setup_test_db().await;

        for name in ["Same", "same"] {
            ActiveModel {
                username: Set(name.to_string()),
                ..Default::default()
            }
            .insert(&db)
            .await
            .unwrap();
        }

        let users = Entity::find()
            .filter(Column::Username.eq("same"))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
    }
}
