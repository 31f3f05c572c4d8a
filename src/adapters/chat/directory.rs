//! Stub user directory for transports without a real user service.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::ports::chat_adapter::{apply_filter, Profile, User, UserFilter};

/// An in-memory user directory shared by the console and memory adapters.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: Mutex<HashMap<String, User>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> MutexGuard<'_, HashMap<String, User>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a user, replacing any existing entry with the same id.
    pub fn add_user(&self, user: User) {
        self.users().insert(user.id.clone(), user);
    }

    /// Convenience for test setups: id, username, first/last name, email.
    pub fn add_member(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        first: impl Into<String>,
        last: impl Into<String>,
        email: impl Into<String>,
    ) -> User {
        let user = User::new(id)
            .with_name(name)
            .with_profile(Profile::new(first, last, Some(email.into())));
        self.add_user(user.clone());
        user
    }

    pub fn find(&self, id: &str) -> Option<User> {
        self.users().get(id).cloned()
    }

    pub fn list(&self, filter: UserFilter) -> Vec<User> {
        apply_filter(&self.users(), filter)
    }

    pub fn lookup_by_email(&self, email: &str) -> Option<User> {
        self.users()
            .values()
            .find(|user| {
                user.profile
                    .as_ref()
                    .and_then(|profile| profile.email.as_deref())
                    == Some(email)
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_find_users() {
        let directory = UserDirectory::new();
        directory.add_member("U1", "joe", "Joe", "Apple", "joe@example.com");

        let user = directory.find("U1").unwrap();
        assert_eq!(user.name.as_deref(), Some("joe"));
        assert_eq!(user.real_name(), "Joe Apple");
        assert!(directory.find("U2").is_none());
    }

    #[test]
    fn lookup_by_email_matches_profiles() {
        let directory = UserDirectory::new();
        directory.add_member("U1", "joe", "Joe", "Apple", "joe@example.com");
        directory.add_member("U2", "jill", "Jill", "Peach", "jill@example.com");

        let user = directory.lookup_by_email("jill@example.com").unwrap();
        assert_eq!(user.id, "U2");
        assert!(directory.lookup_by_email("nope@example.com").is_none());
    }

    #[test]
    fn list_applies_the_filter() {
        let directory = UserDirectory::new();
        directory.add_member("U1", "joe", "Joe", "Apple", "joe@example.com");
        let mut bot = User::new("U2").with_name("bot");
        bot.is_bot = true;
        directory.add_user(bot);

        assert_eq!(directory.list(UserFilter::default()).len(), 1);
        assert_eq!(
            directory
                .list(UserFilter { include_bots: true, ..Default::default() })
                .len(),
            2
        );
    }
}
