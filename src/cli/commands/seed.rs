use anyhow::{Context, Result};
use model::{repository, UserCategory, UserCity, UserRecord};
use sea_orm::{Database, DatabaseConnection};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, trace};

/// Built-in demo users: (username, favorite cities, categories).
const DEMO_USERS: &[(&str, &[&str], &[&str])] = &[
    ("Admin", &["Seattle", "Portland"], &["coffee", "hiking"]),
    ("Cinnamon", &["Denver", "Denver", "Boulder"], &["skiing"]),
    ("BarnBarn", &["Austin"], &["music", "food", "music"]),
    ("puttat", &[], &["travel"]),
    ("MissKitty", &["Chicago"], &[]),
];

fn demo_users() -> Vec<UserRecord> {
    DEMO_USERS
        .iter()
        .map(|(username, cities, categories)| {
            let mut user = UserRecord::new(username);
            for city in cities.iter() {
                user.add_favorite_city(UserCity::new(*city));
            }
            for category in categories.iter() {
                user.add_category(UserCategory::new(*category));
            }
            user
        })
        .collect()
}

fn read_users(path: &Path) -> Result<Vec<UserRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("Failed to parse {}", path.display()))
}

pub async fn seed(database_url: &str, file: Option<&Path>) -> Result<()> {
    trace!("Entering seed function");

    let users = match file {
        Some(path) => {
            info!("Reading users from {}", path.display());
            read_users(path)?
        }
        None => {
            info!("Using built-in demo users");
            demo_users()
        }
    };

    let db: DatabaseConnection = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    let count = insert_users(&db, users).await?;
    info!("Seeded {} users", count);
    Ok(())
}

async fn insert_users(db: &DatabaseConnection, users: Vec<UserRecord>) -> Result<usize> {
    let mut count = 0;
    for user in users {
        let username = user.username().to_string();
        let stored = repository::create(db, user)
            .await
            .with_context(|| format!("Failed to insert user '{}'", username))?;
        debug!("Inserted user {:?}", stored);
        count += 1;
    }
    Ok(count)
}
