//! Shared test utilities for the events workspace
//!
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongo")
//! - `TestDataBuilder`: tenant ids, actor ids and names derived from the test name
//! - `assertions`: assertion helpers with readable failure messages
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestMongo, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let tenant_id = builder.tenant_id();
//!     let title = builder.name("event", "main");
//! }
//! ```

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

/// Deterministic identifiers for one test
///
/// Two builders made from the same test name produce the same tenant, so a
/// rerun queries exactly the data it wrote. Different names never share a
/// tenant, which keeps tests on a shared database isolated.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from a hash of the test name
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_cursor_walk");
    /// assert!(builder.tenant_id().starts_with("tenant-"));
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    pub fn tenant_id(&self) -> String {
        format!("tenant-{}", self.seed)
    }

    /// Actor recorded in `created_by` / `updated_by`
    pub fn actor_id(&self) -> String {
        format!("actor-{}", self.seed)
    }

    /// `test-{prefix}-{seed}-{suffix}`, e.g. `builder.name("event", "3")`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }
}

/// Test assertion helpers
pub mod assertions {
    use std::collections::HashSet;
    use uuid::Uuid;

    /// Unwrap an `Option`, naming what was expected when it is `None`
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that no id appears twice, e.g. across the pages of a cursor walk
    pub fn assert_unique_ids(ids: &[Uuid], context: &str) {
        let mut seen = HashSet::new();
        for id in ids {
            assert!(seen.insert(*id), "{}: id {} returned more than once", context, id);
        }
    }
}
