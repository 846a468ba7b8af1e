//! Company model operations.

use crate::client::GenericClient;
use crate::error::{ModelError, ModelResult};
use crate::filter::FilterBuilder;
use crate::fragment::{sql_for_partial_update, FieldMap, UpdateFields};
use crate::model::job::Job;
use crate::row::{FromRow, RowExt};
use crate::value::{as_params, Value};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Updatable company fields: API-facing names on the left where they
/// differ from the column. `handle` is immutable and deliberately absent.
const UPDATE_FIELDS: FieldMap<'static> = FieldMap::new(
    &[("numEmployees", "num_employees"), ("logoUrl", "logo_url")],
    &["name", "description"],
);

const COMPANY_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

/// A company record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> ModelResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

/// Payload for creating a company.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Optional search filters for [`Company::find_all`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanySearch {
    pub name_like: Option<String>,
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
}

/// A company together with the jobs it owns.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

impl Company {
    /// Insert a new company and return it.
    ///
    /// Fails with [`ModelError::BadRequest`] when the handle is taken.
    pub async fn create(client: &impl GenericClient, data: &NewCompany) -> ModelResult<Company> {
        let duplicate = client
            .query_opt(
                "SELECT handle FROM companies WHERE handle = $1",
                &[&data.handle],
            )
            .await?;
        if duplicate.is_some() {
            return Err(ModelError::bad_request(format!(
                "duplicate company: {}",
                data.handle
            )));
        }

        let row = client
            .query_one(
                "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING handle, name, description, num_employees, logo_url",
                &[
                    &data.handle,
                    &data.name,
                    &data.description,
                    &data.num_employees,
                    &data.logo_url,
                ],
            )
            .await?;
        Company::from_row(&row)
    }

    /// Find all companies matching the search filters, ordered by name.
    ///
    /// No filters returns every company; zero matches is `NotFound`.
    pub async fn find_all(
        client: &impl GenericClient,
        search: &CompanySearch,
    ) -> ModelResult<Vec<Company>> {
        let (sql, filter) = Self::search_query(search)?;
        let rows = client.query(&sql, &filter.params_ref()).await?;
        if rows.is_empty() {
            return Err(ModelError::not_found("no companies found"));
        }
        rows.iter().map(Company::from_row).collect()
    }

    /// Build the filtered search statement.
    pub fn search_query(search: &CompanySearch) -> ModelResult<(String, FilterBuilder)> {
        if let (Some(min), Some(max)) = (search.min_employees, search.max_employees) {
            if min > max {
                return Err(ModelError::bad_request(
                    "min_employees cannot exceed max_employees",
                ));
            }
        }

        let mut filter = FilterBuilder::new();
        filter.gte_opt("num_employees", search.min_employees);
        filter.lte_opt("num_employees", search.max_employees);
        filter.ilike_opt(
            "name",
            search.name_like.as_deref().map(|n| format!("%{n}%")),
        );

        let sql = format!(
            "SELECT {COMPANY_COLUMNS} FROM companies{} ORDER BY name",
            filter.where_clause()
        );
        Ok((sql, filter))
    }

    /// Fetch one company together with its jobs (ordered by id).
    pub async fn get(client: &impl GenericClient, handle: &str) -> ModelResult<CompanyDetail> {
        let row = client
            .query_opt(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE handle = $1"),
                &[&handle],
            )
            .await?
            .ok_or_else(|| ModelError::not_found(format!("no company: {handle}")))?;
        let company = Company::from_row(&row)?;

        let rows = client
            .query(
                "SELECT id, title, salary, equity, company_handle \
                 FROM jobs WHERE company_handle = $1 ORDER BY id",
                &[&handle],
            )
            .await?;
        let jobs = rows.iter().map(Job::from_row).collect::<ModelResult<_>>()?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Apply a partial update and return the updated company.
    ///
    /// `fields` may cover any subset of name, description, numEmployees,
    /// logoUrl; anything else (including `handle`) is rejected.
    pub async fn update(
        client: &impl GenericClient,
        handle: &str,
        fields: &UpdateFields,
    ) -> ModelResult<Company> {
        let (sql, params) = Self::update_statement(handle, fields)?;
        let row = client
            .query_opt(&sql, &as_params(&params))
            .await?
            .ok_or_else(|| ModelError::not_found(format!("no company: {handle}")))?;
        Company::from_row(&row)
    }

    /// Build the partial-update statement: SET fragment from the shared
    /// builder, handle selector at the next placeholder.
    pub fn update_statement(
        handle: &str,
        fields: &UpdateFields,
    ) -> ModelResult<(String, Vec<Value>)> {
        let fragment = sql_for_partial_update(fields, &UPDATE_FIELDS)?;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {COMPANY_COLUMNS}",
            fragment.set_clause(),
            fragment.next_placeholder(),
        );
        Ok((sql, fragment.into_params(handle)))
    }

    /// Delete a company; `NotFound` if the handle does not exist.
    pub async fn remove(client: &impl GenericClient, handle: &str) -> ModelResult<()> {
        let deleted = client
            .execute("DELETE FROM companies WHERE handle = $1", &[&handle])
            .await?;
        if deleted == 0 {
            return Err(ModelError::not_found(format!("no company: {handle}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_postgres::types::ToSql;

    /// A client whose every query matches zero rows.
    struct EmptyDb;

    impl GenericClient for EmptyDb {
        async fn query(
            &self,
            _sql: &str,
            _params: &[&(dyn ToSql + Sync)],
        ) -> ModelResult<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn execute(&self, _sql: &str, _params: &[&(dyn ToSql + Sync)]) -> ModelResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn zero_row_results_surface_not_found() {
        let db = EmptyDb;

        let err = Company::find_all(&db, &CompanySearch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = Company::get(&db, "nope").await.unwrap_err();
        assert!(err.is_not_found());

        let fields = UpdateFields::new().set("name", "X");
        let err = Company::update(&db, "nope", &fields).await.unwrap_err();
        assert!(err.is_not_found());

        let err = Company::remove(&db, "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_statement_maps_api_names_to_columns() {
        let fields = UpdateFields::new()
            .set("name", "New Name")
            .set("numEmployees", 42)
            .set("logoUrl", "https://example.com/logo.png");
        let (sql, params) = Company::update_statement("c1", &fields).unwrap();
        assert_eq!(
            sql,
            "UPDATE companies SET \"name\"=$1, \"num_employees\"=$2, \"logo_url\"=$3 \
             WHERE handle = $4 \
             RETURNING handle, name, description, num_employees, logo_url"
        );
        assert_eq!(params.len(), 4);
        assert_eq!(params[3], Value::Text("c1".into()));
    }

    #[test]
    fn update_rejects_handle_changes() {
        let fields = UpdateFields::new().set("handle", "new-handle");
        let err = Company::update_statement("c1", &fields).unwrap_err();
        assert!(err.is_bad_request());
    }

    #[test]
    fn update_rejects_empty_payload() {
        let err = Company::update_statement("c1", &UpdateFields::new()).unwrap_err();
        assert!(err.is_bad_request());
    }

    #[test]
    fn update_keeps_explicit_nulls() {
        let fields =
            UpdateFields::from_json(serde_json::json!({"numEmployees": null, "name": "X"}))
                .unwrap();
        let (sql, params) = Company::update_statement("c1", &fields).unwrap();
        assert!(sql.contains("\"num_employees\"=$1, \"name\"=$2"));
        assert_eq!(params[0], Value::Null);
    }

    #[test]
    fn unfiltered_search_selects_everything() {
        let (sql, filter) = Company::search_query(&CompanySearch::default()).unwrap();
        assert_eq!(
            sql,
            "SELECT handle, name, description, num_employees, logo_url \
             FROM companies ORDER BY name"
        );
        assert!(filter.is_empty());
    }

    #[test]
    fn search_filters_combine_in_order() {
        let search = CompanySearch {
            name_like: Some("net".into()),
            min_employees: Some(10),
            max_employees: Some(500),
        };
        let (sql, filter) = Company::search_query(&search).unwrap();
        assert_eq!(
            sql,
            "SELECT handle, name, description, num_employees, logo_url FROM companies \
             WHERE num_employees >= $1 AND num_employees <= $2 AND name ILIKE $3 \
             ORDER BY name"
        );
        assert_eq!(filter.params_ref().len(), 3);
    }

    #[test]
    fn search_rejects_inverted_employee_range() {
        let search = CompanySearch {
            min_employees: Some(100),
            max_employees: Some(10),
            ..Default::default()
        };
        let err = Company::search_query(&search).unwrap_err();
        assert!(err.is_bad_request());
    }
}
