//! Purpose: Destructive reset of a store into a random users/things/KNOWS graph.
//! Exports: `Seeder`, `SeedPlan`, `SeedReport`, `NAME_LEN`.
//! Role: Issues the seeding statements one at a time through a `QueryExecutor`.
//! Invariants: Steps run strictly in order; the first error aborts with no cleanup.
//! Invariants: All randomness comes from the `RandomSource` passed in.
//! Invariants: Usernames are not checked for uniqueness; KNOWS self-loops are allowed.
#![allow(clippy::result_large_err)]

use super::executor::QueryExecutor;
use crate::core::cypher;
use crate::core::error::Error;
use crate::core::random::RandomSource;
use crate::core::record::User;

pub const NAME_LEN: usize = 12;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SeedPlan {
    pub users: usize,
    /// Exclusive upper bound on things per user.
    pub max_things_per_user: usize,
    pub rels_per_user: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            users: 100,
            max_things_per_user: 500,
            rels_per_user: 50,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SeedReport {
    pub users: Vec<User>,
    pub things: usize,
    /// KNOWS merge statements issued; duplicates and misses are not counted apart.
    pub relationships: usize,
}

pub struct Seeder<E, R> {
    executor: E,
    random: R,
    next_seq: u64,
}

impl<E: QueryExecutor, R: RandomSource> Seeder<E, R> {
    pub fn new(executor: E, random: R) -> Self {
        Self {
            executor,
            random,
            next_seq: 0,
        }
    }

    pub fn into_inner(self) -> (E, R) {
        (self.executor, self.random)
    }

    pub fn reset(&mut self, plan: &SeedPlan) -> Result<SeedReport, Error> {
        tracing::info!(
            users = plan.users,
            max_things_per_user = plan.max_things_per_user,
            rels_per_user = plan.rels_per_user,
            "wiping and reloading data"
        );
        self.wipe()?;
        self.ensure_index("User", "username")?;

        let users = self.create_users(plan.users)?;
        let mut things = 0;
        for user in &users {
            things += self.create_things(user, plan.max_things_per_user)?;
        }
        let relationships = self.create_relationships(plan.users, plan.rels_per_user)?;

        tracing::info!(users = users.len(), things, relationships, "seed complete");
        Ok(SeedReport {
            users,
            things,
            relationships,
        })
    }

    pub fn wipe(&mut self) -> Result<(), Error> {
        self.executor.execute(&cypher::wipe())?;
        self.next_seq = 0;
        tracing::debug!("store wiped");
        Ok(())
    }

    pub fn ensure_index(&mut self, label: &str, property: &str) -> Result<(), Error> {
        let statement = cypher::create_index(label, property)?;
        self.executor.execute(&statement)?;
        tracing::debug!(label, property, "index ensured");
        Ok(())
    }

    pub fn create_users(&mut self, count: usize) -> Result<Vec<User>, Error> {
        let mut users = Vec::with_capacity(count);
        for _ in 0..count {
            let username = self.random.alphabetic(NAME_LEN);
            self.executor
                .execute(&cypher::create_user(&username, self.next_seq))?;
            self.next_seq += 1;
            users.push(User { username });
        }
        tracing::debug!(count, "users created");
        Ok(users)
    }

    /// Attaches a random number of things in `[0, max_per_user)` to `user`.
    pub fn create_things(&mut self, user: &User, max_per_user: usize) -> Result<usize, Error> {
        let count = self.random.below(max_per_user);
        for _ in 0..count {
            let title = self.random.alphabetic(NAME_LEN);
            self.executor
                .execute(&cypher::create_thing(&user.username, &title))?;
        }
        tracing::trace!(user = %user.username, count, "things created");
        Ok(count)
    }

    pub fn create_relationships(
        &mut self,
        user_count: usize,
        rels_per_user: usize,
    ) -> Result<usize, Error> {
        let mut issued = 0;
        for _ in 0..user_count {
            let skip1 = self.random.below(user_count);
            for _ in 0..rels_per_user {
                let skip2 = self.random.below(user_count);
                self.executor.execute(&cypher::merge_knows(skip1, skip2))?;
                issued += 1;
            }
        }
        tracing::debug!(issued, "relationships merged");
        Ok(issued)
    }
}
