//! User directory used to label conversations.
//!
//! Loaded once per session from the user collection and not refreshed
//! afterwards; names changed later show up on the next load.

use std::collections::BTreeMap;

use tracing::info;

use helpchain_shared::constants::DEFAULT_USER_NAME;
use helpchain_shared::UserId;
use helpchain_store::UserProfile;

use crate::blocking;
use crate::error::Result;
use crate::SharedBackend;

/// Snapshot of the user collection keyed by id.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: BTreeMap<UserId, UserProfile>,
}

impl UserDirectory {
    /// Load every user from the store.
    pub async fn load(backend: &SharedBackend) -> Result<Self> {
        let users = blocking::run(backend, |store| store.list_users()).await?;
        info!(count = users.len(), "user directory loaded");
        Ok(Self::from_profiles(users))
    }

    pub fn from_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            users: profiles.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn get(&self, id: &UserId) -> Option<&UserProfile> {
        self.users.get(id)
    }

    /// Label for `id`; unknown users get the generic name.
    pub fn display_name(&self, id: &UserId) -> String {
        self.users
            .get(id)
            .map(display_name_of)
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string())
    }

    /// Everyone except `current`, in id order.
    pub fn contacts(&self, current: &UserId) -> Vec<&UserProfile> {
        self.users
            .values()
            .filter(|p| &p.id != current)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// `"first last"`, falling back to the email, then to the generic name.
pub fn display_name_of(profile: &UserProfile) -> String {
    let full = format!(
        "{} {}",
        profile.first_name.as_deref().unwrap_or(""),
        profile.last_name.as_deref().unwrap_or("")
    );
    let full = full.trim();
    if !full.is_empty() {
        return full.to_string();
    }
    match profile.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => DEFAULT_USER_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use helpchain_store::SqliteBackend;

    use super::*;

    fn profile(id: &str, first: Option<&str>, last: Option<&str>, email: Option<&str>) -> UserProfile {
        UserProfile {
            id: UserId::from(id),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            email: email.map(str::to_string),
            role: Some("student".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(
            display_name_of(&profile("a", Some("Dana"), Some("Levi"), None)),
            "Dana Levi"
        );
        assert_eq!(display_name_of(&profile("b", Some("Dana"), None, None)), "Dana");
        assert_eq!(
            display_name_of(&profile("c", None, None, Some("c@school.example"))),
            "c@school.example"
        );
        assert_eq!(display_name_of(&profile("d", None, None, None)), DEFAULT_USER_NAME);
    }

    #[test]
    fn test_contacts_exclude_current_user() {
        let directory = UserDirectory::from_profiles(vec![
            profile("u1", Some("Alice"), None, None),
            profile("u2", Some("Bob"), None, None),
            profile("u3", Some("Carol"), None, None),
        ]);
        let ids: Vec<_> = directory
            .contacts(&UserId::from("u2"))
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["u1", "u3"]);
        assert_eq!(directory.display_name(&UserId::from("ghost")), DEFAULT_USER_NAME);
    }

    #[tokio::test]
    async fn test_load_is_a_point_in_time_copy() {
        let backend: SharedBackend = Arc::new(SqliteBackend::in_memory().unwrap());
        backend
            .upsert_user(&profile("u1", Some("Alice"), None, None))
            .unwrap();

        let directory = UserDirectory::load(&backend).await.unwrap();
        assert_eq!(directory.display_name(&UserId::from("u1")), "Alice");

        backend
            .upsert_user(&profile("u1", Some("Alicia"), None, None))
            .unwrap();
        assert_eq!(directory.display_name(&UserId::from("u1")), "Alice");

        let reloaded = UserDirectory::load(&backend).await.unwrap();
        assert_eq!(reloaded.display_name(&UserId::from("u1")), "Alicia");
    }
}
