//! changelog::users
//!
//! User resolution with a run-scoped cache.
//!
//! # Strategy
//!
//! Commit identities (name + email) are resolved by:
//! 1. directory lookup by email
//! 2. otherwise, a normalized name match against the repository contributors
//!
//! Tracker users (handles) are resolved by directory lookup by login, falling
//! back to what the tracker itself reported.
//!
//! Every outcome, including "no match" and lookup errors, is cached, so a
//! repeated identity never queries the directory again. Lookup errors are
//! logged once and treated as unresolved.

use std::collections::HashMap;

use crate::core::types::{CanonicalUser, UserIdentity};
use crate::scm::{TrackerUser, UserDirectory};

/// Resolves raw identities to canonical users for one run.
pub struct UserResolver<'a> {
    directory: &'a dyn UserDirectory,
    /// Where lookups go; used in log messages only.
    home_url: String,
    cache: HashMap<String, Option<CanonicalUser>>,
    /// Loaded on first name-match attempt.
    contributors: Option<Vec<CanonicalUser>>,
}

impl<'a> UserResolver<'a> {
    /// Create a resolver backed by a user directory.
    pub fn new(directory: &'a dyn UserDirectory, home_url: impl Into<String>) -> Self {
        Self {
            directory,
            home_url: home_url.into(),
            cache: HashMap::new(),
            contributors: None,
        }
    }

    /// Number of cached identities (resolved or not).
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Resolve a commit identity.
    ///
    /// Returns `None` when the identity is incomplete, when nothing matches,
    /// or when the directory failed. Callers fall back to the raw identity.
    pub async fn resolve(&mut self, identity: &UserIdentity) -> Option<CanonicalUser> {
        if !identity.is_complete() {
            return None;
        }

        let key = format!("id:{}", identity.key());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let resolved = self.lookup_identity(identity).await;
        self.cache.insert(key, resolved.clone());
        resolved
    }

    /// Resolve a user reported by the issue tracker.
    ///
    /// A handle with no directory record resolves to what the tracker
    /// reported. Returns `None` only when the directory lookup failed.
    pub async fn resolve_tracker_user(&mut self, user: &TrackerUser) -> Option<CanonicalUser> {
        if user.login.is_empty() {
            return Some(user.to_canonical());
        }

        let key = format!("login:{}", user.login.to_lowercase());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let resolved = match self.directory.find_user_by_login(&user.login).await {
            Ok(Some(mut found)) => {
                // The tracker payload may carry links the profile lookup did not.
                if found.url.is_none() {
                    found.url = user.url.clone();
                }
                if found.avatar_url.is_none() {
                    found.avatar_url = user.avatar_url.clone();
                }
                Some(found)
            }
            Ok(None) => Some(user.to_canonical()),
            Err(e) => {
                tracing::warn!(
                    login = %user.login,
                    home = %self.home_url,
                    "failed to resolve user: {}",
                    e
                );
                None
            }
        };

        self.cache.insert(key, resolved.clone());
        resolved
    }

    async fn lookup_identity(&mut self, identity: &UserIdentity) -> Option<CanonicalUser> {
        match self.directory.find_user_by_email(identity.email.trim()).await {
            Ok(Some(mut found)) => {
                if found.name.is_empty() {
                    found.name = identity.name.clone();
                }
                if found.email.is_empty() {
                    found.email = identity.email.clone();
                }
                return Some(found);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    identity = %identity,
                    home = %self.home_url,
                    "failed to resolve user: {}",
                    e
                );
                return None;
            }
        }

        let wanted = normalize_name(&identity.name);
        if wanted.is_empty() {
            return None;
        }

        let matched = self.contributors().await.iter().find(|c| {
            normalize_name(&c.name) == wanted
                || c.login.as_deref().map(normalize_name).as_deref() == Some(wanted.as_str())
        })?;

        let mut user = matched.clone();
        if user.email.is_empty() {
            user.email = identity.email.clone();
        }
        tracing::debug!(identity = %identity, login = ?user.login, "matched contributor by name");
        Some(user)
    }

    async fn contributors(&mut self) -> &[CanonicalUser] {
        if self.contributors.is_none() {
            let loaded = match self.directory.contributors().await {
                Ok(list) => list,
                Err(e) => {
                    tracing::warn!(home = %self.home_url, "failed to list contributors: {}", e);
                    Vec::new()
                }
            };
            self.contributors = Some(loaded);
        }
        self.contributors.as_deref().unwrap_or(&[])
    }
}

/// Lower-case alphanumerics only, so "Jane Doe", "jane.doe" and "JaneDoe"
/// compare equal.
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
