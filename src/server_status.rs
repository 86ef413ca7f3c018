use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// A set reachable only through its own lock.
#[derive(Debug, Default)]
struct GuardedSet {
    items: Mutex<HashSet<String>>,
}

impl GuardedSet {
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, item: String) -> bool {
        self.lock().insert(item)
    }

    fn remove(&self, item: &str) -> bool {
        self.lock().remove(item)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn snapshot(&self) -> HashSet<String> {
        self.lock().clone()
    }
}

/// Connected users and in-flight queries, each behind a separate lock.
///
/// User operations never wait on query operations and vice versa. No method
/// takes both locks.
#[derive(Debug, Default)]
pub struct ServerStatus {
    users: GuardedSet,
    queries: GuardedSet,
}

impl ServerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: impl Into<String>) {
        let user = user.into();
        debug!(%user, "add user");
        self.users.insert(user);
    }

    pub fn add_query(&self, query: impl Into<String>) {
        let query = query.into();
        debug!(%query, "add query");
        self.queries.insert(query);
    }

    /// Returns `true` if the user was present.
    pub fn remove_user(&self, user: &str) -> bool {
        self.users.remove(user)
    }

    /// Returns `true` if the query was present.
    pub fn remove_query(&self, query: &str) -> bool {
        self.queries.remove(query)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    /// A copy of the current users, detached from the registry.
    pub fn users_snapshot(&self) -> HashSet<String> {
        self.users.snapshot()
    }

    /// A copy of the current queries, detached from the registry.
    pub fn queries_snapshot(&self) -> HashSet<String> {
        self.queries.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sets_are_independent() {
        let status = ServerStatus::new();
        status.add_user("userA");
        status.add_user("userB");
        status.add_query("select * from t1");
        status.add_query("update t2 set name='abc'");

        assert_eq!(status.users_snapshot(), set(&["userA", "userB"]));
        assert_eq!(
            status.queries_snapshot(),
            set(&["select * from t1", "update t2 set name='abc'"])
        );
    }

    #[test]
    fn duplicates_collapse() {
        let status = ServerStatus::new();
        status.add_user("userA");
        status.add_user("userA");

        assert_eq!(status.user_count(), 1);
        assert_eq!(status.query_count(), 0);
    }

    #[test]
    fn remove_reports_presence() {
        let status = ServerStatus::new();
        status.add_user("userA");
        status.add_query("userA");

        assert!(status.remove_user("userA"));
        assert!(!status.remove_user("userA"));
        assert_eq!(status.queries_snapshot(), set(&["userA"]));
        assert!(status.remove_query("userA"));
        assert!(!status.remove_query("missing"));
    }

    #[test]
    fn snapshot_is_detached() {
        let status = ServerStatus::new();
        status.add_user("userA");

        let mut snapshot = status.users_snapshot();
        snapshot.insert("intruder".to_string());
        snapshot.remove("userA");

        status.add_user("userB");
        assert_eq!(status.users_snapshot(), set(&["userA", "userB"]));
        assert_eq!(snapshot, set(&["intruder"]));
    }

    #[test]
    fn user_lock_does_not_block_queries() {
        let status = ServerStatus::new();
        let _users = status.users.lock();

        // Runs on this thread while the user lock is held.
        status.add_query("select 1");
        assert_eq!(status.query_count(), 1);
        assert!(status.users.items.try_lock().is_err());
    }
}
