//! Groups: named permission sets plus per-path page rules.

use crate::convert::{compact_list, null_as_default, to_wire_list};
use crate::operation::{NoVariables, Operation, OperationKind};
use crate::schema::common::{DefaultResponse, ResponseStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How a page rule's `path` is matched against page paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageRuleMatch {
    /// Path starts with the rule path.
    #[default]
    Start,
    /// Path equals the rule path.
    Exact,
    /// Path ends with the rule path.
    End,
    /// Rule path is a regular expression.
    Regex,
    /// Rule path names a tag.
    Tag,
}

impl PageRuleMatch {
    /// Wire name of this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Exact => "EXACT",
            Self::End => "END",
            Self::Regex => "REGEX",
            Self::Tag => "TAG",
        }
    }
}

impl fmt::Display for PageRuleMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access-control entry scoping roles to a path pattern and locale set.
///
/// The same shape is used for `PageRuleInput`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRule {
    /// Caller-supplied rule id.
    pub id: String,
    /// Deny instead of allow.
    #[serde(default)]
    pub deny: bool,
    /// Match mode.
    #[serde(rename = "match", default)]
    pub match_mode: PageRuleMatch,
    /// Roles granted or denied; each must be a global permission of the group.
    #[serde(default, deserialize_with = "compact_list")]
    pub roles: Vec<String>,
    /// Path pattern, without a leading slash.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    /// Locales the rule applies to; empty means all.
    #[serde(default, deserialize_with = "compact_list")]
    pub locales: Vec<String>,
}

/// A group as returned by `groups.single`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    /// Remote id.
    pub id: i32,
    /// Group name.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Built-in group (Administrators, Guests).
    pub is_system: bool,
    /// Path users land on after login.
    #[serde(deserialize_with = "null_as_default")]
    pub redirect_on_login: String,
    /// Global permissions.
    #[serde(deserialize_with = "compact_list")]
    pub permissions: Vec<String>,
    /// Page rules, in order.
    #[serde(deserialize_with = "compact_list")]
    pub page_rules: Vec<PageRule>,
    /// Creation timestamp.
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: String,
    /// Last update timestamp.
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: String,
}

impl Group {
    /// Whether this is the empty record Wiki.js answers for a missing id.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id == 0 && self.name.is_empty()
    }
}

/// A group as returned by `groups.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupSummary {
    /// Remote id.
    pub id: i32,
    /// Group name.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Built-in group.
    pub is_system: bool,
    /// Number of members.
    pub user_count: i32,
    /// Creation timestamp.
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: String,
    /// Last update timestamp.
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: String,
}

/// Full desired configuration of an existing group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupUpdate {
    /// Remote id.
    pub id: i32,
    /// Group name.
    pub name: String,
    /// Path users land on after login; must start with `/`.
    pub redirect_on_login: String,
    /// Global permissions.
    pub permissions: BTreeSet<String>,
    /// Page rules, in order.
    pub page_rules: Vec<PageRule>,
}

// =============================================================================
// Operations
// =============================================================================

/// Variables carrying only an id.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IdVariables {
    /// Remote id.
    pub id: i32,
}

/// Response of [`GetGroup`].
#[derive(Debug, Clone, Deserialize)]
pub struct QueryGroupData {
    /// `groups` namespace.
    pub groups: SingleGroup,
}

/// `groups { single }` wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct SingleGroup {
    /// Null when the id does not exist.
    pub single: Option<Group>,
}

/// `query ($id: Int!) { groups { single(id: $id) { ... } } }`
pub struct GetGroup;

impl Operation for GetGroup {
    type Variables = IdVariables;
    type Response = QueryGroupData;
    const NAME: &'static str = "GetGroup";
    const KIND: OperationKind = OperationKind::Query;
    const DOCUMENT: &'static str = "query GetGroup($id: Int!) { groups { single(id: $id) { \
        id name isSystem redirectOnLogin permissions \
        pageRules { id deny match roles path locales } \
        createdAt updatedAt } } }";
}

/// Response of [`ListGroups`].
#[derive(Debug, Clone, Deserialize)]
pub struct QueryGroupListData {
    /// `groups` namespace.
    pub groups: GroupList,
}

/// `groups { list }` wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupList {
    /// All groups.
    #[serde(default, deserialize_with = "compact_list")]
    pub list: Vec<GroupSummary>,
}

/// `query { groups { list { ... } } }`
pub struct ListGroups;

impl Operation for ListGroups {
    type Variables = NoVariables;
    type Response = QueryGroupListData;
    const NAME: &'static str = "ListGroups";
    const KIND: OperationKind = OperationKind::Query;
    const DOCUMENT: &'static str =
        "query ListGroups { groups { list { id name isSystem userCount createdAt updatedAt } } }";
}

/// Variables of [`CreateGroup`].
#[derive(Debug, Clone, Serialize)]
pub struct CreateGroupVariables {
    /// Group name.
    pub name: String,
}

/// Response of [`CreateGroup`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupData {
    /// `groups` namespace.
    pub groups: CreateGroupNamespace,
}

/// `groups { create }` wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupNamespace {
    /// Create payload.
    pub create: CreateGroupPayload,
}

/// Payload of `groups.create`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupPayload {
    /// Mutation outcome.
    pub response_result: ResponseStatus,
    /// Created group; absent on failure.
    #[serde(default)]
    pub group: Option<Group>,
}

/// `mutation ($name: String!) { groups { create(name: $name) { ... } } }`
pub struct CreateGroup;

impl Operation for CreateGroup {
    type Variables = CreateGroupVariables;
    type Response = CreateGroupData;
    const NAME: &'static str = "CreateGroup";
    const KIND: OperationKind = OperationKind::Mutation;
    const DOCUMENT: &'static str = "mutation CreateGroup($name: String!) { groups { create(name: $name) { \
        responseResult { succeeded errorCode slug message } \
        group { id name isSystem createdAt updatedAt } } } }";
}

/// Variables of [`UpdateGroup`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupVariables {
    /// Remote id.
    pub id: i32,
    /// Group name.
    pub name: String,
    /// Login redirect path.
    pub redirect_on_login: String,
    /// Global permissions.
    pub permissions: Vec<String>,
    /// Page rules.
    pub page_rules: Vec<PageRule>,
}

impl From<&GroupUpdate> for UpdateGroupVariables {
    fn from(update: &GroupUpdate) -> Self {
        Self {
            id: update.id,
            name: update.name.clone(),
            redirect_on_login: update.redirect_on_login.clone(),
            permissions: to_wire_list(&update.permissions),
            page_rules: update.page_rules.clone(),
        }
    }
}

/// Response of [`UpdateGroup`].
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGroupData {
    /// `groups` namespace.
    pub groups: UpdateGroupNamespace,
}

/// `groups { update }` wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGroupNamespace {
    /// Update payload.
    pub update: DefaultResponse,
}

/// `mutation (...) { groups { update(...) { responseResult } } }`
pub struct UpdateGroup;

impl Operation for UpdateGroup {
    type Variables = UpdateGroupVariables;
    type Response = UpdateGroupData;
    const NAME: &'static str = "UpdateGroup";
    const KIND: OperationKind = OperationKind::Mutation;
    const DOCUMENT: &'static str = "mutation UpdateGroup($id: Int!, $name: String!, \
        $redirectOnLogin: String!, $permissions: [String]!, $pageRules: [PageRuleInput]!) { \
        groups { update(id: $id, name: $name, redirectOnLogin: $redirectOnLogin, \
        permissions: $permissions, pageRules: $pageRules) { \
        responseResult { succeeded errorCode slug message } } } }";
}

/// Response of [`DeleteGroup`].
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteGroupData {
    /// `groups` namespace.
    pub groups: DeleteGroupNamespace,
}

/// `groups { delete }` wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteGroupNamespace {
    /// Delete payload.
    pub delete: DefaultResponse,
}

/// `mutation ($id: Int!) { groups { delete(id: $id) { responseResult } } }`
pub struct DeleteGroup;

impl Operation for DeleteGroup {
    type Variables = IdVariables;
    type Response = DeleteGroupData;
    const NAME: &'static str = "DeleteGroup";
    const KIND: OperationKind = OperationKind::Mutation;
    const DOCUMENT: &'static str = "mutation DeleteGroup($id: Int!) { groups { delete(id: $id) { \
        responseResult { succeeded errorCode slug message } } } }";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::to_set;
    use serde_json::json;

    fn rule() -> PageRule {
        PageRule {
            id: "r1".to_string(),
            deny: false,
            match_mode: PageRuleMatch::Start,
            roles: vec!["read:pages".to_string()],
            path: "test".to_string(),
            locales: vec![],
        }
    }

    #[test]
    fn test_page_rule_wire_shape() {
        let wire = serde_json::to_value(rule()).unwrap();
        assert_eq!(
            wire,
            json!({
                "id": "r1", "deny": false, "match": "START",
                "roles": ["read:pages"], "path": "test", "locales": []
            })
        );
    }

    #[test]
    fn test_page_rule_match_rejects_unknown() {
        let parsed = serde_json::from_value::<PageRuleMatch>(json!("SOMEWHERE"));
        assert!(parsed.is_err());
        assert_eq!(
            serde_json::from_value::<PageRuleMatch>(json!("REGEX")).unwrap(),
            PageRuleMatch::Regex
        );
    }

    #[test]
    fn test_group_decodes_with_nulls() {
        let data: QueryGroupData = serde_json::from_value(json!({
            "groups": { "single": {
                "id": 3, "name": "editors", "isSystem": false, "redirectOnLogin": null,
                "permissions": ["read:pages", null],
                "pageRules": [{ "id": "r1", "deny": false, "match": "EXACT",
                                "roles": ["read:pages"], "path": "home", "locales": null }],
                "createdAt": "2024-01-01T00:00:00Z", "updatedAt": null
            } }
        }))
        .unwrap();
        let group = data.groups.single.unwrap();
        assert_eq!(group.id, 3);
        assert_eq!(group.redirect_on_login, "");
        assert_eq!(group.permissions, vec!["read:pages"]);
        assert_eq!(group.page_rules[0].match_mode, PageRuleMatch::Exact);
        assert!(group.page_rules[0].locales.is_empty());
        assert!(!group.is_empty());
    }

    #[test]
    fn test_missing_group_shapes() {
        let data: QueryGroupData =
            serde_json::from_value(json!({ "groups": { "single": null } })).unwrap();
        assert!(data.groups.single.is_none());

        let data: QueryGroupData = serde_json::from_value(json!({
            "groups": { "single": { "id": 0, "name": "" } }
        }))
        .unwrap();
        assert!(data.groups.single.unwrap().is_empty());
    }

    #[test]
    fn test_update_variables_use_api_argument_names() {
        let update = GroupUpdate {
            id: 7,
            name: "test-group".to_string(),
            redirect_on_login: "/".to_string(),
            permissions: to_set(["write:pages", "read:pages"]),
            page_rules: vec![rule()],
        };
        let vars = serde_json::to_value(UpdateGroupVariables::from(&update)).unwrap();
        assert_eq!(vars["id"], 7);
        assert_eq!(vars["name"], "test-group");
        assert_eq!(vars["redirectOnLogin"], "/");
        assert_eq!(vars["permissions"], json!(["read:pages", "write:pages"]));
        assert_eq!(vars["pageRules"][0]["id"], "r1");
    }

    #[test]
    fn test_documents_name_their_operation() {
        assert!(GetGroup::DOCUMENT.starts_with("query GetGroup("));
        assert!(ListGroups::DOCUMENT.starts_with("query ListGroups "));
        assert!(CreateGroup::DOCUMENT.starts_with("mutation CreateGroup("));
        assert!(UpdateGroup::DOCUMENT.starts_with("mutation UpdateGroup("));
        assert!(DeleteGroup::DOCUMENT.starts_with("mutation DeleteGroup("));
        assert!(UpdateGroup::DOCUMENT.contains("redirectOnLogin: $redirectOnLogin"));
        assert!(UpdateGroup::DOCUMENT.contains("pageRules: $pageRules"));
    }
}
