use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::domain::UserId;

/// Bounded history of pages a user navigated to, newest last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitedPages {
    capacity: usize,
    paths: VecDeque<String>,
}

impl VisitedPages {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            paths: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a forward navigation. Pages reached through the back link are not recorded again,
    /// and a reload of the current page is ignored.
    pub fn visit(&mut self, path: &str, is_back_link: bool) {
        if is_back_link || self.current() == Some(path) {
            return;
        }
        if self.paths.len() == self.capacity {
            self.paths.pop_front();
        }
        self.paths.push_back(path.to_string());
    }

    /// Leave the current page. Returns the page to go back to, which becomes current.
    pub fn back(&mut self) -> Option<String> {
        self.paths.pop_back();
        self.paths.back().cloned()
    }

    pub fn current(&self) -> Option<&str> {
        self.paths.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Users tracked before the least recently active history is dropped.
pub const DEFAULT_TRACKED_USERS: usize = 10_000;

#[derive(Debug, Default)]
struct TrackedUsers {
    tick: u64,
    users: HashMap<UserId, (u64, VisitedPages)>,
}

/// Per-user navigation histories shared by the HTTP layer.
#[derive(Debug)]
pub struct NavigationHistory {
    capacity: usize,
    max_users: usize,
    tracked: Mutex<TrackedUsers>,
}

impl NavigationHistory {
    pub fn new(capacity: usize) -> Self {
        Self::with_user_limit(capacity, DEFAULT_TRACKED_USERS)
    }

    pub fn with_user_limit(capacity: usize, max_users: usize) -> Self {
        Self {
            capacity,
            max_users: max_users.max(1),
            tracked: Mutex::new(TrackedUsers::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackedUsers> {
        match self.tracked.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn visit(&self, user: &UserId, path: &str, is_back_link: bool) {
        let mut tracked = self.lock();
        tracked.tick += 1;
        let tick = tracked.tick;

        if !tracked.users.contains_key(user) && tracked.users.len() >= self.max_users {
            let idle = tracked
                .users
                .iter()
                .min_by_key(|(_, (last_seen, _))| *last_seen)
                .map(|(id, _)| id.clone());
            if let Some(idle) = idle {
                tracked.users.remove(&idle);
            }
        }

        let entry = tracked
            .users
            .entry(user.clone())
            .or_insert_with(|| (tick, VisitedPages::new(self.capacity)));
        entry.0 = tick;
        entry.1.visit(path, is_back_link);
    }

    pub fn back(&self, user: &UserId) -> Option<String> {
        let mut tracked = self.lock();
        tracked.tick += 1;
        let tick = tracked.tick;
        let (last_seen, pages) = tracked.users.get_mut(user)?;
        *last_seen = tick;
        pages.back()
    }

    pub fn tracked_users(&self) -> usize {
        self.lock().users.len()
    }
}
