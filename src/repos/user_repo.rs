/*
 * Responsibility
 * - Users store interface consumed by handlers and the account service
 * - In-memory implementation so the service runs without a database
 * - Emails are unique; ids are assigned sequentially from 1
 */
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::repos::error::RepoError;
use crate::services::auth::role::Role;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Users persistence as seen by this crate.
///
/// Implementations must be safe to share across requests (`Arc<dyn UserStore>`).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, email: &str, password_hash: &str, role: Role)
    -> Result<UserRow, RepoError>;

    async fn get(&self, user_id: i64) -> Option<UserRow>;

    async fn find_by_email(&self, email: &str) -> Option<UserRow>;

    async fn list(&self) -> Vec<UserRow>;

    // Returns the updated row, or `None` when the user does not exist.
    async fn update_role(&self, user_id: i64, role: Role) -> Option<UserRow>;

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Option<UserRow>;
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: HashMap<i64, UserRow>,
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<UserRow, RepoError> {
        let mut inner = self.inner.write().await;

        if inner.rows.values().any(|row| row.email == email) {
            return Err(RepoError::Conflict("email already registered"));
        }

        inner.next_id += 1;
        let row = UserRow {
            id: inner.next_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
        };
        inner.rows.insert(row.id, row.clone());

        Ok(row)
    }

    async fn get(&self, user_id: i64) -> Option<UserRow> {
        self.inner.read().await.rows.get(&user_id).cloned()
    }

    async fn find_by_email(&self, email: &str) -> Option<UserRow> {
        self.inner
            .read()
            .await
            .rows
            .values()
            .find(|row| row.email == email)
            .cloned()
    }

    async fn list(&self) -> Vec<UserRow> {
        let inner = self.inner.read().await;
        let mut rows: Vec<UserRow> = inner.rows.values().cloned().collect();
        rows.sort_by_key(|row| row.id);
        rows
    }

    async fn update_role(&self, user_id: i64, role: Role) -> Option<UserRow> {
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&user_id)?;
        row.role = role;
        Some(row.clone())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Option<UserRow> {
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&user_id)?;
        row.password_hash = password_hash.to_string();
        Some(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn assigns_sequential_ids_and_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();

        let first = store.create("a@a.com", "h", Role::User).await.unwrap();
        let second = store.create("b@b.com", "h", Role::Admin).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let dup = store.create("a@a.com", "h", Role::User).await;
        assert!(matches!(dup, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn updates_role_of_existing_user_only() {
        let store = InMemoryUserStore::new();
        let row = store.create("a@a.com", "h", Role::User).await.unwrap();

        let updated = store.update_role(row.id, Role::Admin).await.unwrap();
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(store.get(row.id).await.unwrap().role, Role::Admin);

        assert!(store.update_role(99, Role::Admin).await.is_none());
    }

    #[tokio::test]
    async fn replaces_password_hash_of_existing_user_only() {
        let store = InMemoryUserStore::new();
        let row = store.create("a@a.com", "old", Role::User).await.unwrap();

        let updated = store.update_password(row.id, "new").await.unwrap();
        assert_eq!(updated.password_hash, "new");
        assert_eq!(store.find_by_email("a@a.com").await.unwrap().password_hash, "new");

        assert!(store.update_password(99, "new").await.is_none());
    }

    #[tokio::test]
    async fn lists_in_id_order() {
        let store = InMemoryUserStore::new();
        for email in ["c@c.com", "a@a.com", "b@b.com"] {
            store.create(email, "h", Role::User).await.unwrap();
        }
        let ids: Vec<i64> = store.list().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.find_by_email("b@b.com").await.unwrap().id, 3);
    }
}
