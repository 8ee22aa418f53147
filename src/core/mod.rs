// Core modules: statements, records, randomness and error modeling.
pub mod cypher;
pub mod error;
pub mod random;
pub mod record;
pub mod statement;
