//! Escaping and identifier checks for strings that end up in queries, URLs
//! and SOAP envelopes.
//!
//! ```rust
//! use sfdesk_client::security::soql;
//!
//! let name = soql::escape_string("O'Brien");
//! let query = format!("SELECT Id FROM Account WHERE Name = '{}'", name);
//! assert_eq!(query, "SELECT Id FROM Account WHERE Name = 'O\\'Brien'");
//! ```

/// SOQL escaping and identifier validation.
pub mod soql {
    /// Escape a string value for use inside a single-quoted SOQL literal.
    ///
    /// ```rust
    /// use sfdesk_client::security::soql;
    ///
    /// assert_eq!(soql::escape_string("O'Brien & Co."), "O\\'Brien & Co.");
    /// ```
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '\'' => escaped.push_str("\\'"),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Returns true if `name` is a plain API name: a letter followed by
    /// letters, digits or underscores (`Name`, `Custom_Field__c`).
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return false,
        }
        chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }

    /// Returns true if `path` is a dotted relationship path whose every
    /// segment is a safe name (`Owner.Name`, `Account.Owner.Email`).
    #[must_use]
    pub fn is_safe_field_path(path: &str) -> bool {
        !path.is_empty() && path.split('.').all(is_safe_field_name)
    }

    /// Validate that a SObject name is safe.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        is_safe_field_name(name)
    }
}

/// SOSL escaping.
pub mod sosl {
    /// Escape a search term for use between the braces of `FIND {...}`.
    ///
    /// Reserved characters are backslash-escaped so the term cannot close
    /// the brace or inject operators.
    ///
    /// ```rust
    /// use sfdesk_client::security::sosl;
    ///
    /// assert_eq!(sosl::escape_term("a}b"), "a\\}b");
    /// ```
    #[must_use]
    pub fn escape_term(term: &str) -> String {
        const RESERVED: &[char] = &[
            '?', '&', '|', '!', '{', '}', '[', ']', '(', ')', '^', '~', '*', ':', '\\', '"', '\'',
            '+', '-',
        ];
        let mut escaped = String::with_capacity(term.len() + 8);
        for ch in term.chars() {
            if RESERVED.contains(&ch) {
                escaped.push('\\');
            }
            escaped.push(ch);
        }
        escaped
    }
}

/// URL parameter safety.
pub mod url {
    /// URL-encode a parameter value.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    /// Salesforce IDs are 15 or 18 alphanumeric characters.
    ///
    /// ```rust
    /// use sfdesk_client::security::url;
    ///
    /// assert!(url::is_valid_salesforce_id("001000000000001AAA"));
    /// assert!(!url::is_valid_salesforce_id("001/../../etc"));
    /// ```
    #[must_use]
    pub fn is_valid_salesforce_id(id: &str) -> bool {
        let len = id.len();
        (len == 15 || len == 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

/// XML escaping for SOAP envelopes.
pub mod xml {
    /// Escape the five predefined XML entities.
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod soql_tests {
        use super::soql::*;

        #[test]
        fn test_escape_string_basic() {
            assert_eq!(escape_string("hello"), "hello");
            assert_eq!(escape_string("O'Brien"), "O\\'Brien");
            assert_eq!(escape_string("test\\path"), "test\\\\path");
            assert_eq!(escape_string("line1\nline2"), "line1\\nline2");
        }

        #[test]
        fn test_escape_string_injection_attempts() {
            assert_eq!(escape_string("' OR '1'='1"), "\\' OR \\'1\\'=\\'1");
        }

        #[test]
        fn test_is_safe_field_name() {
            assert!(is_safe_field_name("Id"));
            assert!(is_safe_field_name("Custom_Field__c"));
            assert!(!is_safe_field_name(""));
            assert!(!is_safe_field_name("123abc"));
            assert!(!is_safe_field_name("field.name"));
            assert!(!is_safe_field_name("field'name"));
        }

        #[test]
        fn test_is_safe_field_path() {
            assert!(is_safe_field_path("Name"));
            assert!(is_safe_field_path("CronJobDetail.Name"));
            assert!(is_safe_field_path("Account.Owner.Email"));
            assert!(!is_safe_field_path(""));
            assert!(!is_safe_field_path("Owner."));
            assert!(!is_safe_field_path("Owner.Name; DROP"));
        }
    }

    mod sosl_tests {
        use super::sosl::*;

        #[test]
        fn test_escape_term() {
            assert_eq!(escape_term("Acme"), "Acme");
            assert_eq!(escape_term("Acme Corp"), "Acme Corp");
            assert_eq!(escape_term("a}b{c"), "a\\}b\\{c");
            assert_eq!(escape_term("O'Brien"), "O\\'Brien");
        }
    }

    mod url_tests {
        use super::url::*;

        #[test]
        fn test_encode_param() {
            assert_eq!(encode_param("has space"), "has%20space");
            assert_eq!(encode_param("../../etc/passwd"), "..%2F..%2Fetc%2Fpasswd");
        }

        #[test]
        fn test_is_valid_salesforce_id() {
            assert!(is_valid_salesforce_id("001000000000001"));
            assert!(is_valid_salesforce_id("001Abc000000XYZ"));
            assert!(!is_valid_salesforce_id("short"));
            assert!(!is_valid_salesforce_id("001000000000001!"));
        }
    }

    mod xml_tests {
        use super::xml::*;

        #[test]
        fn test_escape() {
            assert_eq!(escape("p&ss<word>"), "p&amp;ss&lt;word&gt;");
            assert_eq!(escape("it's \"x\""), "it&apos;s &quot;x&quot;");
        }
    }
}
