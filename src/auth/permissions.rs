/*!
 * # Category Permissions
 *
 * Each role maps to a list of category tags. A request is allowed when the
 * caller's role lists `*` or at least one of the tags the route requires.
 * Item categories double as tags; `purchasing`, `approve` and `report` gate
 * the purchasing chain and exports.
 */

use crate::{entities::item::ItemCategory, errors::ServiceError};
use lazy_static::lazy_static;
use sea_orm::Iterable;
use std::collections::HashMap;
use tracing::debug;

pub const WILDCARD: &str = "*";

pub const PURCHASING: &str = "purchasing";
pub const APPROVE: &str = "approve";
pub const REPORT: &str = "report";

/// Any item category grants access to the catalog routes; per-item checks follow.
pub const ANY_ITEM_CATEGORY: &[&str] = &["medicine", "medsup", "equipment", "meddevice", "general"];

pub const UNAUTHENTICATED_MESSAGE: &str = "ไม่พบสิทธิ์ผู้ใช้งาน กรุณาเข้าสู่ระบบ";
pub const FORBIDDEN_MESSAGE: &str = "คุณไม่มีสิทธิ์เข้าถึงข้อมูลนี้";

lazy_static! {
    pub static ref DEFAULT_ROLE_CATEGORIES: HashMap<&'static str, Vec<&'static str>> = {
        let mut roles = HashMap::new();
        roles.insert("admin", vec![WILDCARD]);
        roles.insert("pharmacist", vec!["medicine", "medsup", REPORT]);
        roles.insert("nurse", vec!["medsup", "meddevice"]);
        roles.insert("biomed", vec!["equipment", "meddevice"]);
        roles.insert(
            "warehouse",
            vec!["medicine", "medsup", "equipment", "meddevice", "general", REPORT],
        );
        roles.insert("purchasing", vec![PURCHASING, "general", REPORT]);
        roles.insert("director", vec![APPROVE, PURCHASING, REPORT]);
        roles
    };
}

/// Role to category-tag table, injected through application state.
#[derive(Clone, Debug)]
pub struct PermissionTable {
    roles: HashMap<String, Vec<String>>,
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_ROLE_CATEGORIES
                .iter()
                .map(|(role, tags)| {
                    (
                        role.to_string(),
                        tags.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl PermissionTable {
    pub fn new(roles: HashMap<String, Vec<String>>) -> Self {
        Self { roles }
    }

    /// Tags granted to `role`; unknown roles get none.
    pub fn tags_for(&self, role: &str) -> &[String] {
        self.roles.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    fn is_wildcard(&self, role: &str) -> bool {
        self.tags_for(role).iter().any(|t| t == WILDCARD)
    }

    /// `Unauthorized` without a role, `Forbidden` when no required tag is granted.
    pub fn check_categories(
        &self,
        role: Option<&str>,
        required: &[&str],
    ) -> Result<(), ServiceError> {
        let role = role.ok_or_else(|| ServiceError::Unauthorized(UNAUTHENTICATED_MESSAGE.to_string()))?;
        let tags = self.tags_for(role);
        let granted = tags
            .iter()
            .any(|t| t == WILDCARD || required.contains(&t.as_str()));
        if granted {
            Ok(())
        } else {
            debug!(role, ?required, "Category check denied");
            Err(ServiceError::Forbidden(FORBIDDEN_MESSAGE.to_string()))
        }
    }

    pub fn check_category(&self, role: &str, category: ItemCategory) -> Result<(), ServiceError> {
        self.check_categories(Some(role), &[category.as_ref()])
    }

    /// Item categories visible to `role`; `None` means all of them.
    pub fn visible_categories(&self, role: &str) -> Option<Vec<ItemCategory>> {
        if self.is_wildcard(role) {
            return None;
        }
        let tags = self.tags_for(role);
        Some(
            ItemCategory::iter()
                .filter(|c| tags.iter().any(|t| t == c.as_ref()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn check_categories(role: Option<&str>, required: &[&str]) -> Result<(), ServiceError> {
        PermissionTable::default().check_categories(role, required)
    }

    fn table(role: &str, tags: &[&str]) -> PermissionTable {
        let mut roles = HashMap::new();
        roles.insert(role.to_string(), tags.iter().map(|t| t.to_string()).collect());
        PermissionTable::new(roles)
    }

    #[rstest]
    #[case(&["medicine"], &["equipment"], false)]
    #[case(&["medicine"], &["medicine"], true)]
    #[case(&["medicine", "medsup"], &["equipment", "medsup"], true)]
    #[case(&["*"], &["equipment"], true)]
    #[case(&["*"], &["approve"], true)]
    #[case(&[], &["general"], false)]
    fn tag_matching(#[case] granted: &[&str], #[case] required: &[&str], #[case] allowed: bool) {
        let result = table("r", granted).check_categories(Some("r"), required);
        assert_eq!(result.is_ok(), allowed);
        if !allowed {
            assert_matches!(result, Err(ServiceError::Forbidden(msg)) if msg == FORBIDDEN_MESSAGE);
        }
    }

    #[test]
    fn missing_role_is_unauthorized() {
        assert_matches!(
            check_categories(None, &["medicine"]),
            Err(ServiceError::Unauthorized(msg)) if msg == UNAUTHENTICATED_MESSAGE
        );
    }

    #[test]
    fn unknown_role_is_forbidden() {
        assert_matches!(
            check_categories(Some("janitor"), &["general"]),
            Err(ServiceError::Forbidden(_))
        );
    }

    #[test]
    fn default_table_roles() {
        assert!(check_categories(Some("admin"), &[APPROVE]).is_ok());
        assert!(check_categories(Some("director"), &[APPROVE]).is_ok());
        assert!(check_categories(Some("purchasing"), &[APPROVE]).is_err());
        assert!(check_categories(Some("nurse"), &["equipment"]).is_err());
        assert!(check_categories(Some("biomed"), &["equipment"]).is_ok());
    }

    #[test]
    fn visible_categories_follow_tags() {
        let table = PermissionTable::default();
        assert_eq!(table.visible_categories("admin"), None);
        assert_eq!(
            table.visible_categories("nurse"),
            Some(vec![ItemCategory::Medsup, ItemCategory::Meddevice])
        );
        assert_eq!(table.visible_categories("director"), Some(vec![]));
    }
}
