//! Policy store — read-only policy/product facts for the pipeline.

pub mod libsql_backend;
pub mod migrations;
pub mod model;
pub mod seed;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use model::{
    DamageProtocol, OrderRecord, PolicyRecord, ProductRecord, RefundRecord, ReturnabilityRecord,
};
pub use traits::PolicyStore;
