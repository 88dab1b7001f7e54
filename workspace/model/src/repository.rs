//! Persistence for [`UserRecord`].
//!
//! Lifecycle rules of the two owned collections:
//!
//! * favorite cities are cascaded on create, save and delete, but a city
//!   dropped from the collection keeps its row (no orphan removal);
//! * categories are cascaded the same way and additionally lose their row as
//!   soon as they are dropped from the set (orphan removal).
//!
//! Every mutating function runs inside a single transaction.

use crate::entities::{user, user_category, user_city};
use crate::error::{RepositoryError, Result};
use crate::user_record::{UserCategory, UserCity, UserRecord};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, trace, warn};

impl From<user_city::Model> for UserCity {
    fn from(model: user_city::Model) -> Self {
        Self {
            id: Some(model.id),
            user_id: Some(model.user_id),
            name: model.city_name,
        }
    }
}

impl From<user_category::Model> for UserCategory {
    fn from(model: user_category::Model) -> Self {
        Self {
            id: Some(model.id),
            user_id: Some(model.user_id),
            name: model.category_name,
        }
    }
}

/// Persists a new user together with all of its associations.
///
/// Association ids present in `record` are ignored; every city and category
/// gets a fresh row.
#[instrument(skip(db))]
pub async fn create(db: &DatabaseConnection, record: UserRecord) -> Result<UserRecord> {
    if let Some(id) = record.id() {
        warn!("Refusing to create user {} which is already persisted", id);
        return Err(RepositoryError::AlreadyPersisted(id));
    }

    let txn = db.begin().await?;

    let user_model = user::ActiveModel {
        username: Set(record.username().to_string()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    debug!("Inserted user row with ID: {}", user_model.id);

    for city in record.favorite_cities() {
        insert_city(&txn, user_model.id, &city.name).await?;
    }
    for category in record.categories() {
        insert_category(&txn, user_model.id, &category.name).await?;
    }

    let stored = load_one(&txn, user_model).await?;
    txn.commit().await?;

    info!(
        "Created user {} with {} favorite cities and {} categories",
        stored.username(),
        stored.favorite_cities().len(),
        stored.categories().len()
    );
    Ok(stored)
}

/// Loads one user with its associations.
#[instrument(skip(db))]
pub async fn find_by_id(db: &DatabaseConnection, user_id: i32) -> Result<Option<UserRecord>> {
    match user::Entity::find_by_id(user_id).one(db).await? {
        Some(model) => Ok(Some(load_one(db, model).await?)),
        None => {
            trace!("No user row with ID: {}", user_id);
            Ok(None)
        }
    }
}

/// Loads every user, ordered by id.
#[instrument(skip(db))]
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<UserRecord>> {
    let models = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;
    load_many(db, models).await
}

/// Loads all users whose username matches `username` after lowercasing.
///
/// Usernames are not unique, so this can return several records.
#[instrument(skip(db))]
pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Vec<UserRecord>> {
    let models = user::Entity::find()
        .filter(user::Column::Username.eq(username.to_lowercase()))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;
    load_many(db, models).await
}

/// Writes `record` back and cascades to its associations.
///
/// Returns the record as stored afterwards. Favorite cities that were
/// dropped from the collection still reference the user and therefore show
/// up again in the result.
#[instrument(skip(db))]
pub async fn save(db: &DatabaseConnection, record: UserRecord) -> Result<UserRecord> {
    let user_id = record.id().ok_or(RepositoryError::NotPersisted)?;

    let txn = db.begin().await?;

    let existing = user::Entity::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or(RepositoryError::NotFound(user_id))?;

    let mut active: user::ActiveModel = existing.into();
    active.username = Set(record.username().to_string());
    let updated = active.update(&txn).await?;

    save_cities(&txn, user_id, record.favorite_cities()).await?;
    save_categories(&txn, user_id, &record).await?;

    let stored = load_one(&txn, updated).await?;
    txn.commit().await?;

    info!("Saved user {} ({})", user_id, stored.username());
    Ok(stored)
}

/// Deletes a user and every favorite city and category row it owns.
///
/// Returns `false` when there is no such user.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, user_id: i32) -> Result<bool> {
    let txn = db.begin().await?;

    if user::Entity::find_by_id(user_id).one(&txn).await?.is_none() {
        txn.rollback().await?;
        warn!("User with ID {} not found for deletion", user_id);
        return Ok(false);
    }

    let cities = user_city::Entity::delete_many()
        .filter(user_city::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    let categories = user_category::Entity::delete_many()
        .filter(user_category::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    let result = user::Entity::delete_by_id(user_id).exec(&txn).await?;

    txn.commit().await?;

    debug!(
        "Deleted user {} with {} favorite cities and {} categories",
        user_id, cities.rows_affected, categories.rows_affected
    );
    Ok(result.rows_affected > 0)
}

async fn save_cities<C>(conn: &C, user_id: i32, cities: &[UserCity]) -> Result<()>
where
    C: ConnectionTrait,
{
    for city in cities {
        let Some(city_id) = city.id else {
            insert_city(conn, user_id, &city.name).await?;
            continue;
        };

        let existing = user_city::Entity::find_by_id(city_id)
            .one(conn)
            .await?
            .filter(|row| row.user_id == user_id)
            .ok_or(RepositoryError::AssociationNotFound {
                kind: "favorite city",
                id: city_id,
                user_id,
            })?;

        if existing.city_name != city.name {
            let mut active: user_city::ActiveModel = existing.into();
            active.city_name = Set(city.name.clone());
            active.update(conn).await?;
        }
    }
    Ok(())
}

async fn save_categories<C>(conn: &C, user_id: i32, record: &UserRecord) -> Result<()>
where
    C: ConnectionTrait,
{
    let kept: HashSet<i32> = record.categories().iter().filter_map(|c| c.id).collect();

    let (owned, orphans): (Vec<_>, Vec<_>) = user_category::Entity::find()
        .filter(user_category::Column::UserId.eq(user_id))
        .all(conn)
        .await?
        .into_iter()
        .partition(|row| kept.contains(&row.id));

    if !orphans.is_empty() {
        let orphan_ids: Vec<i32> = orphans.iter().map(|row| row.id).collect();
        let result = user_category::Entity::delete_many()
            .filter(user_category::Column::Id.is_in(orphan_ids))
            .exec(conn)
            .await?;
        debug!(
            "Removed {} orphaned categories of user {}",
            result.rows_affected, user_id
        );
    }

    let mut owned: HashMap<i32, user_category::Model> =
        owned.into_iter().map(|row| (row.id, row)).collect();

    let mut renames = Vec::new();
    for category in record.categories() {
        let Some(category_id) = category.id else {
            continue;
        };
        let existing = owned
            .remove(&category_id)
            .ok_or(RepositoryError::AssociationNotFound {
                kind: "category",
                id: category_id,
                user_id,
            })?;

        if existing.category_name != category.name {
            renames.push((existing, category.name.clone()));
        }
    }

    // Renames go through a placeholder first so rows may swap or rotate
    // names without tripping the (user_id, category_name) index. They also
    // run before inserts so a new category may take over a freed name.
    let mut staged = Vec::with_capacity(renames.len());
    for (existing, name) in renames {
        let placeholder = format!("\u{1}renaming:{}", existing.id);
        let mut active: user_category::ActiveModel = existing.into();
        active.category_name = Set(placeholder);
        staged.push((active.update(conn).await?, name));
    }
    for (existing, name) in staged {
        let mut active: user_category::ActiveModel = existing.into();
        active.category_name = Set(name);
        active.update(conn).await?;
    }

    for category in record.categories().iter().filter(|c| c.id.is_none()) {
        insert_category(conn, user_id, &category.name).await?;
    }
    Ok(())
}

async fn insert_city<C>(conn: &C, user_id: i32, name: &str) -> Result<user_city::Model>
where
    C: ConnectionTrait,
{
    let model = user_city::ActiveModel {
        user_id: Set(user_id),
        city_name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    trace!("Inserted favorite city {} for user {}", model.id, user_id);
    Ok(model)
}

async fn insert_category<C>(conn: &C, user_id: i32, name: &str) -> Result<user_category::Model>
where
    C: ConnectionTrait,
{
    let model = user_category::ActiveModel {
        user_id: Set(user_id),
        category_name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    trace!("Inserted category {} for user {}", model.id, user_id);
    Ok(model)
}

async fn load_one<C>(conn: &C, model: user::Model) -> Result<UserRecord>
where
    C: ConnectionTrait,
{
    let mut records = load_many(conn, vec![model]).await?;
    // load_many yields exactly one record per model
    Ok(records.remove(0))
}

async fn load_many<C>(conn: &C, models: Vec<user::Model>) -> Result<Vec<UserRecord>>
where
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();

    let mut cities: HashMap<i32, Vec<UserCity>> = HashMap::new();
    for row in user_city::Entity::find()
        .filter(user_city::Column::UserId.is_in(ids.clone()))
        .order_by_asc(user_city::Column::Id)
        .all(conn)
        .await?
    {
        cities.entry(row.user_id).or_default().push(row.into());
    }

    let mut categories: HashMap<i32, Vec<UserCategory>> = HashMap::new();
    for row in user_category::Entity::find()
        .filter(user_category::Column::UserId.is_in(ids))
        .order_by_asc(user_category::Column::Id)
        .all(conn)
        .await?
    {
        categories.entry(row.user_id).or_default().push(row.into());
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let mut record = UserRecord::new(&model.username).with_id(model.id);
            record.set_favorite_cities(cities.remove(&model.id).unwrap_or_default());
            record.set_categories(
                categories
                    .remove(&model.id)
                    .unwrap_or_default()
                    .into_iter()
                    .collect(),
            );
            record
        })
        .collect())
}
