//! Users, profiles and the role hierarchy.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;
use sfdesk_report::Table;
use sfdesk_rest::SalesforceApi;
use tracing::{instrument, warn};

use super::text_at;
use crate::error::Result;

pub const USERS_SOQL: &str =
    "SELECT Id, Name, Username, Profile.Name, UserRole.Name, IsActive, UserType FROM User";
pub const PROFILES_SOQL: &str = "SELECT Id, Name, UserLicense.Name FROM Profile";
pub const ROLES_SOQL: &str = "SELECT Id, Name, ParentRoleId FROM UserRole";

/// Users with their profile, role and status.
#[instrument(skip(api))]
pub async fn users<A: SalesforceApi>(api: &A) -> Result<Table> {
    let records = api.query(USERS_SOQL).await?;
    let rows = records
        .iter()
        .map(|user| {
            let active = user.get("IsActive").and_then(Value::as_bool).unwrap_or(false);
            vec![
                text_at(user, "/Name").unwrap_or_default().to_string(),
                text_at(user, "/Username").unwrap_or_default().to_string(),
                text_at(user, "/Profile/Name").unwrap_or("No Profile").to_string(),
                text_at(user, "/UserRole/Name").unwrap_or("No Role").to_string(),
                if active { "Active" } else { "Inactive" }.to_string(),
                text_at(user, "/UserType").unwrap_or_default().to_string(),
            ]
        })
        .collect();

    Ok(Table::new(
        vec![
            "Name".into(),
            "Username".into(),
            "Profile".into(),
            "Role".into(),
            "Status".into(),
            "User Type".into(),
        ],
        rows,
    ))
}

/// Profiles and their user license.
#[instrument(skip(api))]
pub async fn profiles<A: SalesforceApi>(api: &A) -> Result<Table> {
    let records = api.query(PROFILES_SOQL).await?;
    let rows = records
        .iter()
        .map(|profile| {
            vec![
                text_at(profile, "/Name").unwrap_or_default().to_string(),
                text_at(profile, "/UserLicense/Name").unwrap_or("N/A").to_string(),
            ]
        })
        .collect();
    Ok(Table::new(vec!["Profile Name".into(), "License".into()], rows))
}

/// A role and the roles reporting to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleNode {
    pub id: String,
    pub name: String,
    pub children: Vec<RoleNode>,
}

/// Build the role forest from `UserRole` rows.
///
/// Roots are roles without a parent or whose parent is not in the rows.
/// Siblings keep query order.
pub fn role_tree(records: &[Value]) -> Vec<RoleNode> {
    let ids: HashSet<&str> = records.iter().filter_map(|r| text_at(r, "/Id")).collect();

    let mut children: HashMap<&str, Vec<&Value>> = HashMap::new();
    let mut roots = Vec::new();
    for record in records {
        match text_at(record, "/ParentRoleId").filter(|parent| ids.contains(parent)) {
            Some(parent) => children.entry(parent).or_default().push(record),
            None => roots.push(record),
        }
    }

    let mut seen = HashSet::new();
    roots
        .into_iter()
        .filter_map(|root| build_node(root, &children, &mut seen))
        .collect()
}

fn build_node<'a>(
    record: &'a Value,
    children: &HashMap<&str, Vec<&'a Value>>,
    seen: &mut HashSet<&'a str>,
) -> Option<RoleNode> {
    let id = text_at(record, "/Id")?;
    if !seen.insert(id) {
        warn!(role_id = id, "Role hierarchy cycle, skipping");
        return None;
    }

    let kids = children
        .get(id)
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| build_node(kid, children, seen))
                .collect()
        })
        .unwrap_or_default();

    Some(RoleNode {
        id: id.to_string(),
        name: text_at(record, "/Name").unwrap_or_default().to_string(),
        children: kids,
    })
}

/// Indented tree, two spaces per level.
pub fn render_role_tree(roots: &[RoleNode]) -> String {
    fn walk(node: &RoleNode, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&node.name);
        out.push('\n');
        for child in &node.children {
            walk(child, depth + 1, out);
        }
    }

    let mut out = String::new();
    for root in roots {
        walk(root, 0, &mut out);
    }
    out
}

/// Role hierarchy flattened depth first: indented name, level and Id.
#[instrument(skip(api))]
pub async fn roles<A: SalesforceApi>(api: &A) -> Result<(Vec<RoleNode>, Table)> {
    fn walk(node: &RoleNode, depth: usize, rows: &mut Vec<Vec<String>>) {
        rows.push(vec![
            format!("{}{}", "  ".repeat(depth), node.name),
            depth.to_string(),
            node.id.clone(),
        ]);
        for child in &node.children {
            walk(child, depth + 1, rows);
        }
    }

    let records = api.query(ROLES_SOQL).await?;
    let tree = role_tree(&records);
    let mut rows = Vec::new();
    for root in &tree {
        walk(root, 0, &mut rows);
    }
    let table = Table::new(vec!["Role Name".into(), "Level".into(), "Role ID".into()], rows);
    Ok((tree, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn role(id: &str, name: &str, parent: Option<&str>) -> Value {
        json!({"Id": id, "Name": name, "ParentRoleId": parent})
    }

    #[test]
    fn test_role_tree_and_rendering() {
        let records = vec![
            role("00E1", "CEO", None),
            role("00E2", "VP Sales", Some("00E1")),
            role("00E3", "Sales Rep", Some("00E2")),
            role("00E4", "VP Support", Some("00E1")),
            role("00E5", "Orphan", Some("00E9")),
        ];

        let tree = role_tree(&records);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(
            render_role_tree(&tree),
            "CEO\n  VP Sales\n    Sales Rep\n  VP Support\nOrphan\n"
        );
    }

    #[test]
    fn test_cycle_is_not_a_root() {
        let records = vec![
            role("00E1", "A", Some("00E2")),
            role("00E2", "B", Some("00E1")),
            role("00E3", "Top", None),
        ];
        let tree = role_tree(&records);
        assert_eq!(render_role_tree(&tree), "Top\n");
    }
}
