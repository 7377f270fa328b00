//! # sfdesk-rest
//!
//! Salesforce REST facade and query builders for sfdesk.
//!
//! ## Features
//!
//! - **SOQL Query** - Execute queries with automatic pagination
//! - **SOSL Search** - Full-text search across objects
//! - **Describe** - Object and field metadata, reduced to an [`ObjectSchema`]
//! - **CRUD** - Create, update and delete individual records
//! - **Limits** - Org API usage and limits
//! - **Builders** - [`QuerySpec`] for dynamic SOQL and [`SearchSpec`] for SOSL
//!
//! Code that only needs to talk to an org should depend on the
//! [`SalesforceApi`] trait rather than on [`SalesforceRestClient`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfdesk_rest::{Filter, Operator, QuerySpec, SalesforceApi, SalesforceRestClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfdesk_rest::Error> {
//!     let client = SalesforceRestClient::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token_here",
//!     )?;
//!
//!     let schema = client.schema("Account").await?;
//!     let soql = QuerySpec::new("Account")
//!         .select(["Name", "AnnualRevenue"])
//!         .filter(Filter::new("AnnualRevenue", Operator::Gt, "1000000"))
//!         .build_for(&schema)?;
//!     let rows = SalesforceApi::query(&client, &soql).await?;
//!
//!     Ok(())
//! }
//! ```

mod api;
mod client;
mod describe;
mod error;
mod query_builder;
mod schema;
mod search;

// Main client
pub use api::SalesforceApi;
pub use client::{SalesforceRestClient, SearchResult};

// Describe types
pub use describe::{
    ChildRelationship, DescribeGlobalResult, DescribeSObjectResult, FieldDescribe, PicklistValue,
    SObjectBasicInfo,
};

// Error types
pub use error::{Error, ErrorKind, Result};

// Builders
pub use query_builder::{
    ChildQuery, Filter, Operator, OrderBy, ParentSelection, QuerySpec, SortDirection, ValueKind,
    DEFAULT_LIMIT,
};
pub use schema::{operators_for, ChildRelation, ObjectSchema, ParentRelationship, SchemaField};
pub use search::{ReturningObject, SearchSpec};

// Re-export from sfdesk-client
pub use sfdesk_client::QueryResult;
