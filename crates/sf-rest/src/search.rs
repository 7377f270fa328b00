//! SOSL builder.
//!
//! ```rust
//! use sfdesk_rest::SearchSpec;
//!
//! let sosl = SearchSpec::new("Acme")
//!     .returning("Account", ["Id", "Name"])
//!     .returning("Contact", ["Id", "Email"])
//!     .limit(20)
//!     .build()
//!     .unwrap();
//! assert_eq!(
//!     sosl,
//!     "FIND {Acme} IN ALL FIELDS RETURNING Account(Id, Name), Contact(Id, Email) LIMIT 20"
//! );
//! ```

use serde::{Deserialize, Serialize};
use sfdesk_client::security::{soql, sosl};

use crate::error::{Error, Result};

/// One object in the RETURNING clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturningObject {
    pub sobject: String,
    /// Fields to return; empty returns only the Id.
    pub fields: Vec<String>,
}

/// A full-text search over all fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    pub term: String,
    pub returning: Vec<ReturningObject>,
    pub limit: Option<u32>,
}

impl SearchSpec {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            returning: Vec::new(),
            limit: None,
        }
    }

    pub fn returning<I, S>(mut self, sobject: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning.push(ReturningObject {
            sobject: sobject.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(&self) -> Result<String> {
        let term = self.term.trim();
        if term.is_empty() {
            return Err(Error::invalid_query("search term is empty"));
        }

        let mut sosl = format!("FIND {{{}}} IN ALL FIELDS", sosl::escape_term(term));

        if !self.returning.is_empty() {
            let objects = self
                .returning
                .iter()
                .map(render_returning)
                .collect::<Result<Vec<_>>>()?;
            sosl.push_str(" RETURNING ");
            sosl.push_str(&objects.join(", "));
        }

        if let Some(limit) = self.limit {
            sosl.push_str(&format!(" LIMIT {}", limit));
        }
        Ok(sosl)
    }
}

fn render_returning(object: &ReturningObject) -> Result<String> {
    if !soql::is_safe_sobject_name(&object.sobject) {
        return Err(Error::invalid_query(format!(
            "invalid name '{}'",
            object.sobject
        )));
    }
    if object.fields.is_empty() {
        return Ok(object.sobject.clone());
    }
    if let Some(bad) = object.fields.iter().find(|f| !soql::is_safe_field_path(f)) {
        return Err(Error::invalid_query(format!("invalid field '{}'", bad)));
    }
    Ok(format!("{}({})", object.sobject, object.fields.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_characters_escaped() {
        let sosl = SearchSpec::new("acme} RETURNING User(Password")
            .returning("Account", ["Name"])
            .build()
            .unwrap();
        assert_eq!(
            sosl,
            "FIND {acme\\} RETURNING User\\(Password} IN ALL FIELDS RETURNING Account(Name)"
        );
    }

    #[test]
    fn test_without_fields_or_returning() {
        assert_eq!(
            SearchSpec::new("Acme").build().unwrap(),
            "FIND {Acme} IN ALL FIELDS"
        );
        assert_eq!(
            SearchSpec::new("Acme")
                .returning("Lead", Vec::<String>::new())
                .build()
                .unwrap(),
            "FIND {Acme} IN ALL FIELDS RETURNING Lead"
        );
    }

    #[test]
    fn test_empty_term_rejected() {
        let err = SearchSpec::new("   ").build().unwrap_err();
        assert!(err.to_string().contains("search term is empty"));
    }

    #[test]
    fn test_unsafe_returning_rejected() {
        assert!(SearchSpec::new("x")
            .returning("Account WHERE", ["Id"])
            .build()
            .is_err());
        assert!(SearchSpec::new("x")
            .returning("Account", ["Id)"])
            .build()
            .is_err());
    }
}
