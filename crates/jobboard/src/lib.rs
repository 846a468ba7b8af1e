//! # jobboard
//!
//! A Postgres model layer for two related entities, companies and jobs.
//!
//! ## Features
//!
//! - **Partial updates**: a shared SET-fragment builder turns a sparse JSON
//!   payload plus a per-entity field map into `"column"=$n` assignments and
//!   an index-aligned parameter list
//! - **Filtered search**: dynamic WHERE clauses assembled from optional
//!   search parameters, with sequential placeholder numbering
//! - **Type-safe mapping**: Row → struct via the `FromRow` trait
//! - **Transaction-friendly**: pass a transaction anywhere a
//!   `GenericClient` is expected
//! - **Strict field allow-lists**: request keys never become SQL
//!   identifiers unless the entity's field map names them
//!
//! ## Example
//!
//! ```ignore
//! use jobboard::{Company, CompanySearch, UpdateFields};
//!
//! // Filtered search
//! let companies = Company::find_all(
//!     &client,
//!     &CompanySearch { min_employees: Some(10), ..Default::default() },
//! )
//! .await?;
//!
//! // Partial update from a JSON body
//! let fields = UpdateFields::from_json(body)?;
//! let company = Company::update(&client, "acme", &fields).await?;
//! ```

pub mod client;
pub mod error;
pub mod filter;
pub mod fragment;
pub mod model;
pub mod row;
pub mod value;

pub use client::GenericClient;
pub use error::{ModelError, ModelResult};
pub use filter::FilterBuilder;
pub use fragment::{sql_for_partial_update, FieldMap, UpdateFields, UpdateFragment};
pub use model::{
    Company, CompanyDetail, CompanySearch, Job, JobDetail, JobListing, JobSearch, NewCompany,
    NewJob,
};
pub use row::{FromRow, RowExt};
pub use value::{as_params, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_from_env, create_pool_with_config};
