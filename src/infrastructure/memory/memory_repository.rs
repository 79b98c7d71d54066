use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{AlreadyExists, NewUser, RegistrationCode, Repository, User};

/// User store backed by a vector under an async lock.
pub struct MemoryRepository {
    users: RwLock<Vec<User>>,
    registration_code: RwLock<Option<RegistrationCode>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Vec::new()),
            registration_code: RwLock::new(None),
        }
    }
}

#[async_trait::async_trait]
impl Repository for MemoryRepository {
    // ---
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        // ---
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.username == new_user.username) {
            return Err(AlreadyExists { field: "username" }.into());
        }
        if let Some(email) = new_user.email.as_deref() {
            if users.iter().any(|u| u.email.as_deref() == Some(email)) {
                return Err(AlreadyExists { field: "email" }.into());
            }
        }

        let user = User::new(new_user);
        users.push(user.clone());
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users = self.users.read().await.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != user_id);
        Ok(users.len() != before)
    }

    async fn store_registration_code(&self, code: &RegistrationCode) -> Result<()> {
        *self.registration_code.write().await = Some(code.clone());
        Ok(())
    }

    async fn registration_code_is_live(&self, code: &str, now: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .registration_code
            .read()
            .await
            .as_ref()
            .is_some_and(|stored| stored.code == code && stored.is_live_at(now)))
    }

    async fn consume_registration_code(&self, code: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut slot = self.registration_code.write().await;
        let live = slot
            .as_ref()
            .is_some_and(|stored| stored.code == code && stored.is_live_at(now));
        if live {
            *slot = None;
        }
        Ok(live)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
