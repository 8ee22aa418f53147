//! Purpose: Public surface for seeding a graph store and reading feeds back.
//! Exports: Executors, the seeder, the feed reader and the shared core types.
//! Role: What the CLI and integration tests build on.
//! Invariants: The seeder and feed reader only ever see the `QueryExecutor` contract.

mod executor;
mod feed;
mod memory;
mod neo4j;
mod seed;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::random::{RandomSource, SeededRandom};
pub use crate::core::record::{FeedItem, Record, Thing, User, decode};
pub use crate::core::statement::{Params, Statement};
pub use executor::{QueryExecutor, QueryResult, Row};
pub use feed::{FeedReader, read_feed};
pub use memory::MemoryGraph;
pub use neo4j::{DEFAULT_BASE_URL, DEFAULT_DATABASE, Neo4jClient};
pub use seed::{NAME_LEN, SeedPlan, SeedReport, Seeder};
