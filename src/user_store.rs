//! Per-user gamification attributes: house affiliation and commends.
//!
//! Each user is a hash at `user:<username>`; the `uid` field marks the record
//! as existing. Every created username is also added to the `users` set so
//! the known users can be enumerated.
//!
//! Every operation validates the username before touching the store and
//! reports either a value or an [`AppError`], never both.

use std::collections::BTreeMap;

use crate::constants::{
    BOOKKEEPING_FIELDS, FIELD_COMMENDS, FIELD_HOUSE, FIELD_UID, FIELD_USERNAME, INITIAL_UID,
};
use crate::db::{keys, Store};
use crate::error::{AppError, Result};
use crate::models::user::{parse_field, validate_username};
use crate::models::{generate_house, House, UserRecord};

/// Raw record fields as stored, keyed by field name
pub type UserFields = BTreeMap<String, String>;

/// User attribute store over a shared [`HashStore`](crate::db::HashStore)
#[derive(Clone)]
pub struct UserStore {
    store: Store,
}

impl UserStore {
    /// Wrap an already-connected store handle
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The underlying store handle
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Whether a record with a `uid` exists for `username`
    pub async fn exists(&self, username: &str) -> Result<bool> {
        let username = validate_username(username)?;
        self.uid_present(username).await
    }

    /// Create a user with the placeholder house and add it to the index.
    ///
    /// The `uid` marker, the remaining fields and the index entry are written
    /// by one conditional store operation, so of several concurrent creators
    /// exactly one succeeds and the others get [`AppError::UserAlreadyExists`].
    /// A failed create leaves neither the record nor the index entry behind.
    pub async fn create(&self, username: &str) -> Result<String> {
        let username = validate_username(username)?;

        let created = self
            .store
            .create_hash_if_absent(
                &keys::user(username),
                (FIELD_UID, INITIAL_UID),
                &[
                    (FIELD_HOUSE, House::Muggle.as_str()),
                    (FIELD_USERNAME, username),
                ],
                keys::USERS,
                username,
            )
            .await?;
        if !created {
            tracing::debug!("User {} already exists", username);
            return Err(AppError::UserAlreadyExists);
        }

        tracing::info!("Created user {}", username);
        Ok(username.to_string())
    }

    /// Stored house, or `None` if the user has not been given one
    pub async fn get_house(&self, username: &str) -> Result<Option<House>> {
        let username = validate_username(username)?;
        self.store
            .hash_get(&keys::user(username), FIELD_HOUSE)
            .await?
            .map(|value| parse_field(FIELD_HOUSE, &value))
            .transpose()
    }

    /// Sort the user into a random house and store it.
    ///
    /// Does not check that the user exists; on a missing record the store
    /// creates the hash with only the `house` field.
    pub async fn set_house(&self, username: &str) -> Result<House> {
        let username = validate_username(username)?;
        let house = generate_house();

        self.store
            .hash_set(&keys::user(username), FIELD_HOUSE, house.as_str())
            .await?;

        tracing::info!("Sorted {} into {}", username, house);
        Ok(house)
    }

    /// Commend count of an existing user.
    ///
    /// Distinguishes an unknown user ([`AppError::UserNotFound`]) from a
    /// known user without commends ([`AppError::UserHasNoCommends`]).
    pub async fn get_commends(&self, username: &str) -> Result<u64> {
        let username = validate_username(username)?;
        self.require_existing(username).await?;

        match self
            .store
            .hash_get(&keys::user(username), FIELD_COMMENDS)
            .await?
        {
            Some(value) => parse_field(FIELD_COMMENDS, &value),
            None => Err(AppError::UserHasNoCommends),
        }
    }

    /// Overwrite the commend count of an existing user
    pub async fn set_commends(&self, username: &str, commends: u64) -> Result<u64> {
        let username = validate_username(username)?;
        self.require_existing(username).await?;

        self.store
            .hash_set(&keys::user(username), FIELD_COMMENDS, &commends.to_string())
            .await?;

        tracing::debug!("Set commends for {} to {}", username, commends);
        Ok(commends)
    }

    /// Add one commend to an existing user, returning the new count
    pub async fn commend(&self, username: &str) -> Result<u64> {
        let username = validate_username(username)?;
        self.require_existing(username).await?;

        let count = self
            .store
            .hash_increment(&keys::user(username), FIELD_COMMENDS, 1)
            .await?;

        tracing::info!("{} now has {} commends", username, count);
        u64::try_from(count).map_err(|_| AppError::CorruptRecord {
            field: FIELD_COMMENDS.to_string(),
            value: count.to_string(),
        })
    }

    /// Every attribute field of an existing user, as stored.
    ///
    /// Bookkeeping fields (`uid`, `username`) are left out; values are the
    /// store's string representation.
    pub async fn get_all(&self, username: &str) -> Result<UserFields> {
        let username = validate_username(username)?;

        let mut fields = self.store.hash_get_all(&keys::user(username)).await?;
        if !fields.contains_key(FIELD_UID) {
            return Err(AppError::UserNotFound);
        }

        fields.retain(|field, _| !BOOKKEEPING_FIELDS.contains(&field.as_str()));
        Ok(fields.into_iter().collect())
    }

    /// Typed view of [`UserStore::get_all`]
    pub async fn get_record(&self, username: &str) -> Result<UserRecord> {
        let fields = self.get_all(username).await?;
        UserRecord::from_fields(username.trim(), &fields)
    }

    /// Every username in the index, sorted
    pub async fn list_usernames(&self) -> Result<Vec<String>> {
        let mut usernames = self.store.set_members(keys::USERS).await?;
        usernames.sort();
        Ok(usernames)
    }

    async fn uid_present(&self, username: &str) -> Result<bool> {
        Ok(self
            .store
            .hash_get(&keys::user(username), FIELD_UID)
            .await?
            .is_some())
    }

    async fn require_existing(&self, username: &str) -> Result<()> {
        if self.uid_present(username).await? {
            Ok(())
        } else {
            Err(AppError::UserNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{HashStore, MemoryStore, StoreError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const USERNAME: &str = "bdickason";

    fn test_store() -> (UserStore, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        (UserStore::new(memory.clone()), memory)
    }

    // -------------------------------------------------------------------------
    // exists
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_exists_true_when_uid_set() {
        let (users, memory) = test_store();
        memory.hash_set("user:bdickason", "uid", "0").await.unwrap();

        assert!(users.exists(USERNAME).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_false_without_uid() {
        let (users, memory) = test_store();
        assert!(!users.exists(USERNAME).await.unwrap());

        // Other fields alone do not make a user exist
        memory
            .hash_set("user:bdickason", "house", "Gryffindor")
            .await
            .unwrap();
        assert!(!users.exists(USERNAME).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_before_and_after_create() {
        let (users, _) = test_store();

        assert!(!users.exists(USERNAME).await.unwrap());
        users.create(USERNAME).await.unwrap();
        assert!(users.exists(USERNAME).await.unwrap());
    }

    // -------------------------------------------------------------------------
    // create
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_writes_record_and_index() {
        let (users, memory) = test_store();

        assert_eq!(users.create(USERNAME).await.unwrap(), USERNAME);

        let data = memory.hash_get_all("user:bdickason").await.unwrap();
        assert_eq!(data.get("uid").map(String::as_str), Some("0"));
        assert_eq!(data.get("house").map(String::as_str), Some("muggle"));
        assert_eq!(data.get("username").map(String::as_str), Some(USERNAME));

        assert_eq!(memory.set_members("users").await.unwrap(), vec![USERNAME]);
    }

    #[tokio::test]
    async fn test_create_existing_user_is_conflict() {
        let (users, memory) = test_store();
        memory.hash_set("user:bdickason", "uid", "0").await.unwrap();
        memory
            .hash_set("user:bdickason", "house", "Slytherin")
            .await
            .unwrap();

        assert!(matches!(
            users.create(USERNAME).await,
            Err(AppError::UserAlreadyExists)
        ));

        // No overwrite and no index entry
        assert_eq!(
            memory.hash_get("user:bdickason", "house").await.unwrap(),
            Some("Slytherin".to_string())
        );
        assert!(memory.set_members("users").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_twice_keeps_single_index_entry() {
        let (users, _) = test_store();

        users.create(USERNAME).await.unwrap();
        assert!(matches!(
            users.create(USERNAME).await,
            Err(AppError::UserAlreadyExists)
        ));
        assert_eq!(users.list_usernames().await.unwrap(), vec![USERNAME]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_has_single_winner() {
        let (users, memory) = test_store();
        let attempts = 32;

        let handles: Vec<_> = (0..attempts)
            .map(|_| {
                let users = users.clone();
                tokio::spawn(async move { users.create(USERNAME).await })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(name) => {
                    assert_eq!(name, USERNAME);
                    created += 1;
                }
                Err(AppError::UserAlreadyExists) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(conflicts, attempts - 1);
        assert_eq!(memory.set_members("users").await.unwrap(), vec![USERNAME]);
    }

    // -------------------------------------------------------------------------
    // house
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_house_returns_stored_house() {
        let (users, memory) = test_store();
        memory
            .hash_set("user:bdickason", "house", "Gryffindor")
            .await
            .unwrap();

        assert_eq!(
            users.get_house(USERNAME).await.unwrap(),
            Some(House::Gryffindor)
        );
    }

    #[tokio::test]
    async fn test_get_house_none_when_unset() {
        let (users, memory) = test_store();
        memory.hash_set("user:bdickason", "uid", "0").await.unwrap();

        assert_eq!(users.get_house(USERNAME).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_house_after_create_is_muggle() {
        let (users, _) = test_store();
        users.create(USERNAME).await.unwrap();

        assert_eq!(users.get_house(USERNAME).await.unwrap(), Some(House::Muggle));
    }

    #[tokio::test]
    async fn test_set_house_stores_a_real_house() {
        let (users, memory) = test_store();
        memory.hash_set("user:bdickason", "uid", "0").await.unwrap();

        let house = users.set_house(USERNAME).await.unwrap();
        assert!(House::SORTED.contains(&house));
        assert_eq!(users.get_house(USERNAME).await.unwrap(), Some(house));
    }

    #[tokio::test]
    async fn test_set_house_on_missing_record_creates_field_only() {
        let (users, memory) = test_store();

        let house = users.set_house("newcomer").await.unwrap();

        let data = memory.hash_get_all("user:newcomer").await.unwrap();
        assert_eq!(data.get("house").map(String::as_str), Some(house.as_str()));
        assert!(!users.exists("newcomer").await.unwrap());
    }

    // -------------------------------------------------------------------------
    // commends
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_commends_user_not_found() {
        let (users, _) = test_store();

        assert!(matches!(
            users.get_commends("blah").await,
            Err(AppError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_get_commends_user_without_commends() {
        let (users, _) = test_store();
        users.create(USERNAME).await.unwrap();

        assert!(matches!(
            users.get_commends(USERNAME).await,
            Err(AppError::UserHasNoCommends)
        ));
    }

    #[tokio::test]
    async fn test_get_commends_returns_stored_count() {
        let (users, memory) = test_store();
        users.create(USERNAME).await.unwrap();
        memory
            .hash_set("user:bdickason", "commends", "53")
            .await
            .unwrap();

        assert_eq!(users.get_commends(USERNAME).await.unwrap(), 53);
    }

    #[tokio::test]
    async fn test_set_commends_round_trip() {
        let (users, _) = test_store();
        users.create(USERNAME).await.unwrap();

        assert_eq!(users.set_commends(USERNAME, 53).await.unwrap(), 53);
        assert_eq!(users.get_commends(USERNAME).await.unwrap(), 53);
    }

    #[tokio::test]
    async fn test_set_commends_requires_existing_user() {
        let (users, memory) = test_store();

        assert!(matches!(
            users.set_commends("blah", 3).await,
            Err(AppError::UserNotFound)
        ));
        assert!(memory.hash_get_all("user:blah").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commend_increments_from_zero() {
        let (users, _) = test_store();
        users.create(USERNAME).await.unwrap();

        assert_eq!(users.commend(USERNAME).await.unwrap(), 1);
        assert_eq!(users.commend(USERNAME).await.unwrap(), 2);
        assert_eq!(users.get_commends(USERNAME).await.unwrap(), 2);

        assert!(matches!(
            users.commend("blah").await,
            Err(AppError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_get_commends_corrupt_value() {
        let (users, memory) = test_store();
        users.create(USERNAME).await.unwrap();
        memory
            .hash_set("user:bdickason", "commends", "-4")
            .await
            .unwrap();

        assert!(matches!(
            users.get_commends(USERNAME).await,
            Err(AppError::CorruptRecord { .. })
        ));
    }

    // -------------------------------------------------------------------------
    // get_all
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_all_user_not_found() {
        let (users, _) = test_store();

        assert!(matches!(
            users.get_all("blah").await,
            Err(AppError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_get_all_after_create() {
        let (users, _) = test_store();
        users.create(USERNAME).await.unwrap();

        let data = users.get_all(USERNAME).await.unwrap();
        let expected: UserFields = [("house".to_string(), "muggle".to_string())]
            .into_iter()
            .collect();
        assert_eq!(data, expected);
    }

    #[tokio::test]
    async fn test_get_all_with_house_and_commends() {
        let (users, memory) = test_store();
        users.create(USERNAME).await.unwrap();
        memory
            .hash_set_multiple("user:bdickason", &[("house", "muggle"), ("commends", "53")])
            .await
            .unwrap();

        let data = users.get_all(USERNAME).await.unwrap();
        let expected: UserFields = [
            ("commends".to_string(), "53".to_string()),
            ("house".to_string(), "muggle".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(data, expected);

        let record = users.get_record(USERNAME).await.unwrap();
        assert_eq!(record.username, USERNAME);
        assert_eq!(record.house, Some(House::Muggle));
        assert_eq!(record.commends, Some(53));
    }

    // -------------------------------------------------------------------------
    // validation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_every_operation_rejects_missing_username() {
        let (users, memory) = test_store();

        for username in ["", "   "] {
            assert!(matches!(users.exists(username).await, Err(AppError::NoUserProvided)));
            assert!(matches!(users.create(username).await, Err(AppError::NoUserProvided)));
            assert!(matches!(users.get_house(username).await, Err(AppError::NoUserProvided)));
            assert!(matches!(users.set_house(username).await, Err(AppError::NoUserProvided)));
            assert!(matches!(
                users.get_commends(username).await,
                Err(AppError::NoUserProvided)
            ));
            assert!(matches!(
                users.set_commends(username, 1).await,
                Err(AppError::NoUserProvided)
            ));
            assert!(matches!(users.commend(username).await, Err(AppError::NoUserProvided)));
            assert!(matches!(users.get_all(username).await, Err(AppError::NoUserProvided)));
        }

        assert!(memory.set_members("users").await.unwrap().is_empty());
        assert!(memory.hash_get_all("user:").await.unwrap().is_empty());
    }

    // -------------------------------------------------------------------------
    // store failures
    // -------------------------------------------------------------------------

    type StoreResult<T> = std::result::Result<T, StoreError>;

    /// Store whose every request fails, as if the server went away
    struct UnreachableStore;

    fn unreachable() -> StoreError {
        StoreError::Backend {
            message: "connection refused".to_string(),
        }
    }

    #[async_trait]
    impl HashStore for UnreachableStore {
        async fn hash_get(&self, _: &str, _: &str) -> StoreResult<Option<String>> {
            Err(unreachable())
        }
        async fn hash_set(&self, _: &str, _: &str, _: &str) -> StoreResult<()> {
            Err(unreachable())
        }
        async fn hash_set_multiple(
            &self,
            _: &str,
            _: &[(&str, &str)],
        ) -> StoreResult<()> {
            Err(unreachable())
        }
        async fn create_hash_if_absent(
            &self,
            _: &str,
            _: (&str, &str),
            _: &[(&str, &str)],
            _: &str,
            _: &str,
        ) -> StoreResult<bool> {
            Err(unreachable())
        }
        async fn hash_get_all(
            &self,
            _: &str,
        ) -> StoreResult<HashMap<String, String>> {
            Err(unreachable())
        }
        async fn hash_increment(
            &self,
            _: &str,
            _: &str,
            _: i64,
        ) -> StoreResult<i64> {
            Err(unreachable())
        }
        async fn delete_hash_and_member(&self, _: &str, _: &str, _: &str) -> StoreResult<bool> {
            Err(unreachable())
        }
        async fn set_add(&self, _: &str, _: &str) -> StoreResult<bool> {
            Err(unreachable())
        }
        async fn set_members(&self, _: &str) -> StoreResult<Vec<String>> {
            Err(unreachable())
        }
        async fn ping(&self) -> StoreResult<()> {
            Err(unreachable())
        }
    }

    #[tokio::test]
    async fn test_store_errors_propagate_unchanged() {
        let users = UserStore::new(Arc::new(UnreachableStore));

        for result in [
            users.exists(USERNAME).await.map(|_| ()),
            users.create(USERNAME).await.map(|_| ()),
            users.get_house(USERNAME).await.map(|_| ()),
            users.set_house(USERNAME).await.map(|_| ()),
            users.get_commends(USERNAME).await.map(|_| ()),
            users.set_commends(USERNAME, 3).await.map(|_| ()),
            users.commend(USERNAME).await.map(|_| ()),
            users.get_all(USERNAME).await.map(|_| ()),
        ] {
            match result {
                Err(AppError::Store(err)) => assert_eq!(err, unreachable()),
                other => panic!("expected store error, got {other:?}"),
            }
        }
    }

    /// Memory store whose create request can be made to fail, and whose
    /// piecemeal write requests always fail
    struct FlakyStore {
        inner: MemoryStore,
        fail_create: AtomicBool,
    }

    fn blip() -> StoreError {
        StoreError::Backend {
            message: "blip".to_string(),
        }
    }

    #[async_trait]
    impl HashStore for FlakyStore {
        async fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
            self.inner.hash_get(key, field).await
        }
        async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
            self.inner.hash_set(key, field, value).await
        }
        async fn hash_set_multiple(
            &self,
            _: &str,
            _: &[(&str, &str)],
        ) -> StoreResult<()> {
            Err(blip())
        }
        async fn create_hash_if_absent(
            &self,
            key: &str,
            marker: (&str, &str),
            fields: &[(&str, &str)],
            index_key: &str,
            member: &str,
        ) -> StoreResult<bool> {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(blip());
            }
            self.inner
                .create_hash_if_absent(key, marker, fields, index_key, member)
                .await
        }
        async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
            self.inner.hash_get_all(key).await
        }
        async fn hash_increment(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64> {
            self.inner.hash_increment(key, field, delta).await
        }
        async fn delete_hash_and_member(
            &self,
            key: &str,
            index_key: &str,
            member: &str,
        ) -> StoreResult<bool> {
            self.inner.delete_hash_and_member(key, index_key, member).await
        }
        async fn set_add(&self, _: &str, _: &str) -> StoreResult<bool> {
            Err(blip())
        }
        async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
            self.inner.set_members(key).await
        }
        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_create_leaves_no_partial_record() {
        let flaky = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            fail_create: AtomicBool::new(true),
        });
        let users = UserStore::new(flaky.clone());

        match users.create(USERNAME).await {
            Err(AppError::Store(err)) => assert_eq!(err, blip()),
            other => panic!("expected store error, got {other:?}"),
        }
        assert!(!users.exists(USERNAME).await.unwrap());
        assert!(flaky.set_members("users").await.unwrap().is_empty());
        assert!(flaky.hash_get_all("user:bdickason").await.unwrap().is_empty());

        // Retry once the backend recovers; the set_add and hash_set_multiple
        // requests still fail, so this only succeeds as a single operation
        flaky.fail_create.store(false, Ordering::SeqCst);
        assert_eq!(users.create(USERNAME).await.unwrap(), USERNAME);
        assert!(users.exists(USERNAME).await.unwrap());
        assert_eq!(users.list_usernames().await.unwrap(), vec![USERNAME]);
        assert_eq!(users.get_house(USERNAME).await.unwrap(), Some(House::Muggle));
    }

    #[tokio::test]
    async fn test_validation_precedes_store_access() {
        let users = UserStore::new(Arc::new(UnreachableStore));

        assert!(matches!(users.exists("").await, Err(AppError::NoUserProvided)));
        assert!(matches!(users.get_all("").await, Err(AppError::NoUserProvided)));
    }
}
