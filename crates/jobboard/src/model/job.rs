//! Job model operations.

use crate::client::GenericClient;
use crate::error::{ModelError, ModelResult};
use crate::filter::FilterBuilder;
use crate::fragment::{sql_for_partial_update, FieldMap, UpdateFields};
use crate::model::company::Company;
use crate::row::{FromRow, RowExt};
use crate::value::{as_params, Value};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Updatable job fields. Logical and column names coincide, so there are
/// no renames; `id` and `company_handle` are immutable.
const UPDATE_FIELDS: FieldMap<'static> = FieldMap::new(&[], &["title", "salary", "equity"]);

const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle";

/// A job record.
///
/// `equity` is a fractional share in [0,1] with exact decimal semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> ModelResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

/// Payload for creating a job. The id is storage-generated.
#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Optional search filters for [`Job::find_all`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSearch {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    pub has_equity: Option<bool>,
}

/// A search result row: a job plus its owning company's name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobListing {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
    pub company_name: Option<String>,
}

impl FromRow for JobListing {
    fn from_row(row: &Row) -> ModelResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
            company_name: row.try_get_column("company_name")?,
        })
    }
}

/// A job together with its owning company.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company: Company,
}

impl Job {
    /// Insert a new job and return it with its generated id.
    ///
    /// A missing company surfaces as [`ModelError::ForeignKeyViolation`].
    pub async fn create(client: &impl GenericClient, data: &NewJob) -> ModelResult<Job> {
        let row = client
            .query_one(
                "INSERT INTO jobs (title, salary, equity, company_handle) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id, title, salary, equity, company_handle",
                &[&data.title, &data.salary, &data.equity, &data.company_handle],
            )
            .await?;
        Job::from_row(&row)
    }

    /// Find all jobs matching the search filters, ordered by title.
    ///
    /// No filters returns every job; zero matches is `NotFound`.
    pub async fn find_all(
        client: &impl GenericClient,
        search: &JobSearch,
    ) -> ModelResult<Vec<JobListing>> {
        let (sql, filter) = Self::search_query(search);
        let rows = client.query(&sql, &filter.params_ref()).await?;
        if rows.is_empty() {
            return Err(ModelError::not_found("no jobs found"));
        }
        rows.iter().map(JobListing::from_row).collect()
    }

    /// Build the filtered search statement.
    ///
    /// `has_equity: Some(true)` adds `equity > 0` as a parameterless
    /// condition; `Some(false)` and `None` add nothing.
    pub fn search_query(search: &JobSearch) -> (String, FilterBuilder) {
        let mut filter = FilterBuilder::new();
        filter.gte_opt("j.salary", search.min_salary);
        if search.has_equity == Some(true) {
            filter.raw("j.equity > 0");
        }
        filter.ilike_opt("j.title", search.title.as_deref().map(|t| format!("%{t}%")));

        let sql = format!(
            "SELECT j.id, j.title, j.salary, j.equity, j.company_handle, \
             c.name AS company_name \
             FROM jobs j LEFT JOIN companies c ON c.handle = j.company_handle{} \
             ORDER BY j.title",
            filter.where_clause()
        );
        (sql, filter)
    }

    /// Fetch one job together with its owning company.
    pub async fn get(client: &impl GenericClient, id: i32) -> ModelResult<JobDetail> {
        let row = client
            .query_opt(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"),
                &[&id],
            )
            .await?
            .ok_or_else(|| ModelError::not_found(format!("no job: {id}")))?;
        let job = Job::from_row(&row)?;

        // The FK guarantees the company exists.
        let company_row = client
            .query_one(
                "SELECT handle, name, description, num_employees, logo_url \
                 FROM companies WHERE handle = $1",
                &[&job.company_handle],
            )
            .await?;
        let company = Company::from_row(&company_row)?;

        Ok(JobDetail {
            id: job.id,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company,
        })
    }

    /// Apply a partial update and return the updated job.
    ///
    /// `fields` may cover any subset of title, salary, equity; the owning
    /// company and the id are immutable and rejected.
    pub async fn update(
        client: &impl GenericClient,
        id: i32,
        fields: &UpdateFields,
    ) -> ModelResult<Job> {
        let (sql, params) = Self::update_statement(id, fields)?;
        let row = client
            .query_opt(&sql, &as_params(&params))
            .await?
            .ok_or_else(|| ModelError::not_found(format!("no job: {id}")))?;
        Job::from_row(&row)
    }

    /// Build the partial-update statement: SET fragment from the shared
    /// builder, id selector at the next placeholder.
    pub fn update_statement(id: i32, fields: &UpdateFields) -> ModelResult<(String, Vec<Value>)> {
        let fragment = sql_for_partial_update(fields, &UPDATE_FIELDS)?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {JOB_COLUMNS}",
            fragment.set_clause(),
            fragment.next_placeholder(),
        );
        Ok((sql, fragment.into_params(id)))
    }

    /// Delete a job; `NotFound` if the id does not exist.
    pub async fn remove(client: &impl GenericClient, id: i32) -> ModelResult<()> {
        let deleted = client
            .execute("DELETE FROM jobs WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(ModelError::not_found(format!("no job: {id}")));
        }
        Ok(())
    }
}
