//! The `UserRecord` aggregate: a user together with its favorite cities and
//! categories, as handed to and returned from `crate::repository`.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use utoipa::ToSchema;

/// A favorite city owned by a [`UserRecord`].
///
/// `user_id` is the back-reference to the owner. It is accepted when
/// deserializing but never written out, so a serialized user does not embed
/// itself through its cities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserCity {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default, skip_serializing)]
    pub user_id: Option<i32>,
    pub name: String,
}

impl UserCity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id: None,
            name: name.into(),
        }
    }
}

/// A category owned by a [`UserRecord`].
///
/// Identity inside the owner's set is the category `name`; `id` and
/// `user_id` do not take part in equality or ordering.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserCategory {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default, skip_serializing)]
    pub user_id: Option<i32>,
    pub name: String,
}

impl UserCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id: None,
            name: name.into(),
        }
    }
}

impl PartialEq for UserCategory {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for UserCategory {}

impl Hash for UserCategory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for UserCategory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UserCategory {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// A user with its owned associations.
///
/// The username is lowercased on every assignment, including
/// deserialization. `id` stays `None` until the record has been persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    #[serde(default)]
    id: Option<i32>,
    #[serde(deserialize_with = "deserialize_lowercase")]
    username: String,
    #[serde(default)]
    favorite_cities: Vec<UserCity>,
    #[serde(default)]
    #[schema(value_type = Vec<UserCategory>)]
    categories: BTreeSet<UserCategory>,
}

impl UserRecord {
    /// Creates an unpersisted record with empty collections.
    pub fn new(username: impl AsRef<str>) -> Self {
        Self {
            id: None,
            username: username.as_ref().to_lowercase(),
            favorite_cities: Vec::new(),
            categories: BTreeSet::new(),
        }
    }

    pub(crate) fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: impl AsRef<str>) {
        self.username = username.as_ref().to_lowercase();
    }

    pub fn favorite_cities(&self) -> &[UserCity] {
        &self.favorite_cities
    }

    pub fn favorite_cities_mut(&mut self) -> &mut Vec<UserCity> {
        &mut self.favorite_cities
    }

    pub fn set_favorite_cities(&mut self, favorite_cities: Vec<UserCity>) {
        self.favorite_cities = favorite_cities;
    }

    /// Appends a city. Duplicates are kept.
    pub fn add_favorite_city(&mut self, city: UserCity) {
        self.favorite_cities.push(city);
    }

    pub fn categories(&self) -> &BTreeSet<UserCategory> {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut BTreeSet<UserCategory> {
        &mut self.categories
    }

    pub fn set_categories(&mut self, categories: BTreeSet<UserCategory>) {
        self.categories = categories;
    }

    /// Returns `false` if a category with the same name is already present.
    pub fn add_category(&mut self, category: UserCategory) -> bool {
        self.categories.insert(category)
    }

    pub fn remove_category(&mut self, name: &str) -> Option<UserCategory> {
        self.categories.take(&UserCategory::new(name))
    }
}

// Categories are left out of the textual form.
impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("favorite_cities", &self.favorite_cities)
            .finish_non_exhaustive()
    }
}

fn deserialize_lowercase<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_lowercases_username() {
        let user = UserRecord::new("Alice");

        assert_eq!(user.username(), "alice");
        assert_eq!(user.id(), None);
        assert!(user.favorite_cities().is_empty());
        assert!(user.categories().is_empty());
    }

    #[test]
    fn test_set_username_lowercases_every_assignment() {
        let mut user = UserRecord::new("alice");

        for (input, expected) in [
            ("BOB", "bob"),
            ("already lower", "already lower"),
            ("MiXeD 123_!", "mixed 123_!"),
            ("", ""),
            ("ÉLODIE", "élodie"),
        ] {
            user.set_username(input);
            assert_eq!(user.username(), expected);
        }
    }

    #[test]
    fn test_favorite_cities_keep_duplicates_and_order() {
        let mut user = UserRecord::new("alice");
        user.add_favorite_city(UserCity::new("Paris"));
        user.add_favorite_city(UserCity::new("Berlin"));
        user.add_favorite_city(UserCity::new("Paris"));

        let names: Vec<&str> = user.favorite_cities().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Paris", "Berlin", "Paris"]);
    }

    #[test]
    fn test_categories_drop_equal_entries() {
        let mut user = UserRecord::new("alice");

        assert!(user.add_category(UserCategory::new("food")));
        assert!(user.add_category(UserCategory::new("music")));

        let mut persisted_copy = UserCategory::new("food");
        persisted_copy.id = Some(42);
        assert!(!user.add_category(persisted_copy));

        assert_eq!(user.categories().len(), 2);
        // The first insertion wins.
        assert_eq!(user.categories().iter().next().unwrap().id, None);
    }

    #[test]
    fn test_remove_category_by_name() {
        let mut user = UserRecord::new("alice");
        user.add_category(UserCategory::new("food"));

        let removed = user.remove_category("food").unwrap();
        assert_eq!(removed.name, "food");
        assert!(user.remove_category("food").is_none());
        assert!(user.categories().is_empty());
    }

    #[test]
    fn test_setters_replace_collections() {
        let mut user = UserRecord::new("alice");
        user.add_favorite_city(UserCity::new("Oslo"));

        user.set_favorite_cities(vec![UserCity::new("Rome")]);
        user.set_categories(BTreeSet::from([UserCategory::new("travel")]));

        assert_eq!(user.favorite_cities().len(), 1);
        assert_eq!(user.favorite_cities()[0].name, "Rome");
        assert!(user.categories().contains(&UserCategory::new("travel")));
    }

    #[test]
    fn test_debug_omits_categories() {
        let mut user = UserRecord::new("alice").with_id(7);
        user.add_favorite_city(UserCity::new("Lisbon"));
        user.add_category(UserCategory::new("secret-category"));

        let text = format!("{:?}", user);
        assert!(text.contains("id: Some(7)"));
        assert!(text.contains("\"alice\""));
        assert!(text.contains("Lisbon"));
        assert!(!text.contains("secret-category"));
        assert!(!text.contains("categories"));
    }

    #[test]
    fn test_serialize_skips_back_references() {
        let mut user = UserRecord::new("alice").with_id(1);
        user.add_favorite_city(UserCity {
            id: Some(10),
            user_id: Some(1),
            name: "Paris".to_string(),
        });
        user.add_category(UserCategory {
            id: Some(20),
            user_id: Some(1),
            name: "food".to_string(),
        });

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "username": "alice",
                "favorite_cities": [{ "id": 10, "name": "Paris" }],
                "categories": [{ "id": 20, "name": "food" }],
            })
        );
    }

    #[test]
    fn test_deserialize_accepts_back_references_and_normalizes() {
        let user: UserRecord = serde_json::from_value(json!({
            "username": "ALICE",
            "favorite_cities": [{ "user_id": 3, "name": "Paris" }],
            "categories": [
                { "user_id": 3, "name": "food" },
                { "name": "food" }
            ],
        }))
        .unwrap();

        assert_eq!(user.id(), None);
        assert_eq!(user.username(), "alice");
        assert_eq!(user.favorite_cities()[0].user_id, Some(3));
        assert_eq!(user.categories().len(), 1);
        assert_eq!(user.categories().iter().next().unwrap().user_id, Some(3));
    }

    #[test]
    fn test_deserialize_requires_username() {
        let result: Result<UserRecord, _> = serde_json::from_value(json!({ "id": 1 }));
        assert!(result.is_err());
    }
}
