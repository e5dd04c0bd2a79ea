//! Discovery rules.
//!
//! Each rule is a predicate/confidence pair tested against one source
//! column and one target entity. Rules are evaluated in the order returned
//! by [`default_rules`]; the first match wins and fixes the confidence, so
//! a new heuristic can be slotted in without touching the existing ones.

use super::inflection::singularize;
use super::{thresholds, RelationshipType};
use crate::metadata::{Column, Entity};

/// A single discovery heuristic.
#[derive(Debug, Clone)]
pub struct DiscoveryRule {
    /// Rule identifier, recorded on every candidate it produces.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Confidence assigned to matches from this rule.
    pub confidence: f64,
    matcher: RuleKind,
}

/// Matching logic behind a rule.
#[derive(Debug, Clone)]
enum RuleKind {
    /// Column name equals the target's key column name, compatible types.
    ExactKeyMatch,
    /// Column name resolves to a target column (literally, or as
    /// `<singular target>` + column), compatible types.
    NameAndCompatibleType,
    /// Column name resolves to a target column but type categories differ.
    NameOnly,
    /// Column name embeds the target's singular name plus a key-like
    /// suffix, without resolving to a concrete column.
    PartialName,
}

/// A successful rule application.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    /// Referenced column on the target entity.
    pub target_column: String,
    /// Whether that column is one of the target's discoverable keys.
    pub target_is_key: bool,
    /// Confidence fixed by the rule.
    pub confidence: f64,
    /// The rule that matched.
    pub rule_name: &'static str,
}

impl RuleMatch {
    /// Structural relationship kind implied by the matched target column.
    pub fn relationship_type(&self) -> RelationshipType {
        if self.target_is_key {
            RelationshipType::ManyToOne
        } else {
            RelationshipType::Reference
        }
    }
}

impl DiscoveryRule {
    /// Test this rule for `column` referencing something in `target`.
    pub fn try_match(&self, column: &Column, target: &Entity) -> Option<RuleMatch> {
        match self.matcher {
            RuleKind::ExactKeyMatch => self.match_exact_key(column, target),
            RuleKind::NameAndCompatibleType => self.match_name(column, target, true),
            RuleKind::NameOnly => self.match_name(column, target, false),
            RuleKind::PartialName => self.match_partial(column, target),
        }
    }

    /// `c.name == key(B)` with compatible types.
    fn match_exact_key(&self, column: &Column, target: &Entity) -> Option<RuleMatch> {
        let key = target
            .key_columns()
            .into_iter()
            .find(|k| k.name.eq_ignore_ascii_case(&column.name))?;
        if !column.type_compatible(key) {
            return None;
        }
        Some(RuleMatch {
            target_column: key.name.clone(),
            target_is_key: true,
            confidence: self.confidence,
            rule_name: self.name,
        })
    }

    /// Resolve the column against the target's inventory, either by literal
    /// name equality or by stripping the target's singular name off the
    /// front (`supplier_id` → `suppliers.id`). `want_compatible` selects
    /// whether this rule fires on matching or on mismatching types.
    fn match_name(
        &self,
        column: &Column,
        target: &Entity,
        want_compatible: bool,
    ) -> Option<RuleMatch> {
        let resolved = resolve_referenced_column(column, target)?;
        if column.type_compatible(resolved) != want_compatible {
            return None;
        }
        Some(RuleMatch {
            target_column: resolved.name.clone(),
            target_is_key: target.is_key_column(&resolved.name),
            confidence: self.confidence,
            rule_name: self.name,
        })
    }

    /// Column embeds the singular target name plus an `id`/`code`/`key`
    /// suffix but resolves to no concrete column. Points at the target's
    /// key, so a target without a discoverable key produces nothing here.
    fn match_partial(&self, column: &Column, target: &Entity) -> Option<RuleMatch> {
        let col_lower = column.name.to_lowercase();
        let singular = singularize(&target.table_name);
        if singular.is_empty() || !col_lower.contains(&singular) {
            return None;
        }

        let remainder = match col_lower.rfind(&singular) {
            Some(pos) => &col_lower[pos + singular.len()..],
            None => return None,
        };
        let suffix = remainder.trim_start_matches('_');
        if suffix.is_empty() || !matches!(suffix, "id" | "code" | "key") {
            return None;
        }

        let key = target.key_columns().into_iter().next()?;
        Some(RuleMatch {
            target_column: key.name.clone(),
            target_is_key: true,
            confidence: self.confidence,
            rule_name: self.name,
        })
    }
}

/// Resolve which column of `target` a source column plausibly names.
///
/// Literal equality wins (`id` → `id`); otherwise the source name is
/// matched as `<singular target>` + `_`? + column (`supplier_id` or
/// `SupplierId` → `id`).
fn resolve_referenced_column<'a>(column: &Column, target: &'a Entity) -> Option<&'a Column> {
    if let Some(found) = target.column(&column.name) {
        return Some(found);
    }

    let col_lower = column.name.to_lowercase();
    let singular = singularize(&target.table_name);
    if singular.is_empty() {
        return None;
    }

    for prefix in [format!("{}_", singular), singular] {
        if let Some(rest) = col_lower.strip_prefix(&prefix) {
            if !rest.is_empty() {
                if let Some(found) = target.column(rest) {
                    return Some(found);
                }
            }
        }
    }

    None
}

/// The descending rule table. First match wins.
pub fn default_rules() -> Vec<DiscoveryRule> {
    vec![
        DiscoveryRule {
            name: "exact_key_match",
            description: "Column name equals the target's key column name with a compatible type",
            confidence: thresholds::EXACT_KEY,
            matcher: RuleKind::ExactKeyMatch,
        },
        DiscoveryRule {
            name: "name_and_type",
            description: "Column name resolves to a target column with a compatible type",
            confidence: thresholds::NAME_AND_TYPE,
            matcher: RuleKind::NameAndCompatibleType,
        },
        DiscoveryRule {
            name: "name_only",
            description: "Column name resolves to a target column but type categories differ",
            confidence: thresholds::NAME_ONLY,
            matcher: RuleKind::NameOnly,
        },
        DiscoveryRule {
            name: "partial_name",
            description: "Column name embeds the singular target name plus an id/code/key suffix",
            confidence: thresholds::PARTIAL_NAME,
            matcher: RuleKind::PartialName,
        },
    ]
}
