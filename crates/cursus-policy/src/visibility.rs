//! Role-based visibility filters for list/read paths.
//!
//! Pure predicate construction: the returned [`FilterExpr`] is plain
//! data for the storage collaborator to interpret. Hidden rows are
//! simply absent from results, so the outer layer leaks no existence
//! information through its error choice.

use cursus_core::filter::{FieldPredicate, FilterExpr, VisibilityClause};
use cursus_core::models::principal::{Principal, Role};
use cursus_core::models::resource::{LifecycleStatus, ResourceKind};

/// Build the visibility filter for `principal` listing resources of
/// `kind`, with an optional case-insensitive title search.
///
/// Course-scoped kinds:
/// - Admin: one clause, just the search predicate.
/// - Teacher: published OR owned-by-caller — the public catalogue
///   plus their own drafts.
/// - Student, and any unknown role: published only.
///
/// User-private kinds (pretests, exam attempts) carry no lifecycle
/// status; everyone but an admin sees only their own.
///
/// When no search term is given the title predicate is omitted
/// entirely, not replaced with a match-everything placeholder.
pub fn build_filter(
    principal: &Principal,
    kind: ResourceKind,
    search: Option<&str>,
) -> FilterExpr {
    if kind.is_user_private() {
        return match principal.role {
            Role::Admin => FilterExpr::of(vec![base_clause(search)]),
            _ => FilterExpr::of(vec![
                base_clause(search).and(FieldPredicate::OwnerIs(principal.user_id)),
            ]),
        };
    }

    match principal.role {
        Role::Admin => FilterExpr::of(vec![base_clause(search)]),
        Role::Teacher => FilterExpr::of(vec![
            published_clause(search),
            base_clause(search).and(FieldPredicate::OwningTeacherIs(principal.user_id)),
        ]),
        Role::Student | Role::Other => FilterExpr::of(vec![published_clause(search)]),
    }
}

fn base_clause(search: Option<&str>) -> VisibilityClause {
    match search {
        Some(term) => {
            VisibilityClause::new().and(FieldPredicate::TitleContains(term.to_string()))
        }
        None => VisibilityClause::new(),
    }
}

fn published_clause(search: Option<&str>) -> VisibilityClause {
    base_clause(search).and(FieldPredicate::StatusIs(LifecycleStatus::Published))
}
