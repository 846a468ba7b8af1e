//! Model-layer operations for the two entities.
//!
//! Each model owns its statement text (keywords, table, RETURNING list,
//! selector predicate) and translates a zero-row result into `NotFound`;
//! the shared fragment and filter builders only contribute the dynamic
//! pieces. Statement construction is pure and unit-tested; execution goes
//! through [`crate::client::GenericClient`].

pub mod company;
pub mod job;

pub use company::{Company, CompanyDetail, CompanySearch, NewCompany};
pub use job::{Job, JobDetail, JobListing, JobSearch, NewJob};
