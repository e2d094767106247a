//! User records and the repository interface the host layer writes to.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::soul_color::{self, Classification, ClassifierError, SoulColorClassifier};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid soul color id: {0}")]
    InvalidSoulColor(String),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub soul_color_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            soul_color_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields to change on an existing user; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub soul_color_id: Option<String>,
}

impl UserUpdate {
    pub fn soul_color(id: impl Into<String>) -> Self {
        Self {
            soul_color_id: Some(id.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    async fn create(&self, user: User) -> Result<User, RepositoryError>;

    /// Apply `update` and bump `updated_at`.
    async fn update(&self, id: &str, update: UserUpdate) -> Result<User, RepositoryError>;

    async fn all(&self) -> Result<Vec<User>, RepositoryError>;
}

/// Map-backed repository for tests and the demo
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        if users.contains_key(&user.id) {
            return Err(RepositoryError::AlreadyExists(user.id));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, id: &str, update: UserUpdate) -> Result<User, RepositoryError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let user = users
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(color) = update.soul_color_id {
            user.soul_color_id = Some(color);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn all(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = self
            .users
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }
}

async fn get_or_create(
    repo: &dyn UserRepository,
    user_id: &str,
) -> Result<User, RepositoryError> {
    match repo.get(user_id).await? {
        Some(user) => Ok(user),
        None => repo.create(User::new(user_id, "User", "")).await,
    }
}

/// Classify `responses` and store the resulting color on the user,
/// creating the user if it does not exist yet.
pub async fn assign_soul_color(
    repo: &dyn UserRepository,
    classifier: &dyn SoulColorClassifier,
    user_id: &str,
    responses: &[String],
) -> Result<(User, Classification), RepositoryError> {
    let classification = classifier.classify(responses).await?;
    get_or_create(repo, user_id).await?;
    let user = repo
        .update(user_id, UserUpdate::soul_color(&classification.soul_color_id))
        .await?;
    info!(user_id, soul_color = %classification.soul_color_id, "Soul color assigned");
    Ok((user, classification))
}

/// Store a color chosen directly, validating it against the catalog.
pub async fn set_soul_color(
    repo: &dyn UserRepository,
    user_id: &str,
    soul_color_id: &str,
) -> Result<User, RepositoryError> {
    if !soul_color::is_valid(soul_color_id) {
        return Err(RepositoryError::InvalidSoulColor(soul_color_id.to_string()));
    }
    get_or_create(repo, user_id).await?;
    repo.update(user_id, UserUpdate::soul_color(soul_color_id))
        .await
}
