//! Integration tests for sibling order-index management.

use std::sync::{Arc, RwLock};

use cursus_core::error::{CursusError, CursusResult};
use cursus_core::models::resource::{LifecycleStatus, ParentRef, Resource, ResourceKind};
use cursus_core::store::{ResourceStore, SiblingScope};
use cursus_policy::config::SequenceConfig;
use cursus_policy::sequence::SequenceManager;
use cursus_store::MemoryStore;
use uuid::Uuid;

/// Helper: a course with one module; chapters are sequenced under it.
async fn setup() -> (MemoryStore, SiblingScope, Resource) {
    let store = MemoryStore::new();
    let course = store
        .insert(
            Resource::new(ResourceKind::Course, "Algorithms")
                .with_owner(Uuid::new_v4())
                .with_status(LifecycleStatus::Draft),
        )
        .await
        .unwrap();
    let module = store
        .insert(
            Resource::new(ResourceKind::Module, "Sorting")
                .with_parent(ResourceKind::Course, course.id)
                .with_order_index(1),
        )
        .await
        .unwrap();
    let scope = SiblingScope::new(
        ParentRef::new(ResourceKind::Module, module.id),
        ResourceKind::Chapter,
    );
    (store, scope, module)
}

fn manager(store: &MemoryStore) -> SequenceManager<MemoryStore> {
    SequenceManager::new(store.clone(), SequenceConfig::default())
}

fn chapter(module: &Resource, title: &str) -> Resource {
    Resource::new(ResourceKind::Chapter, title).with_parent(ResourceKind::Module, module.id)
}

/// Read back the scope's `(title, index)` pairs sorted by index.
async fn indices(store: &MemoryStore, scope: SiblingScope) -> Vec<(String, u32)> {
    let mut rows: Vec<_> = store
        .list_siblings(scope)
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.title, r.order_index.unwrap()))
        .collect();
    rows.sort_by_key(|(_, i)| *i);
    rows
}

fn assert_contiguous(rows: &[(String, u32)]) {
    let got: Vec<u32> = rows.iter().map(|(_, i)| *i).collect();
    let want: Vec<u32> = (1..=rows.len() as u32).collect();
    assert_eq!(got, want, "indices must be exactly 1..=N: {rows:?}");
}

#[tokio::test]
async fn first_chapter_in_empty_module_gets_index_one() {
    let (store, scope, module) = setup().await;
    let seq = manager(&store);

    assert_eq!(seq.next_index(scope).await.unwrap(), 1);
    let created = seq.insert(chapter(&module, "Bubble Sort")).await.unwrap();
    assert_eq!(created.order_index, Some(1));
}

#[tokio::test]
async fn appended_chapters_take_max_plus_one() {
    let (store, scope, module) = setup().await;
    let seq = manager(&store);

    for title in ["A", "B", "C"] {
        seq.insert(chapter(&module, title)).await.unwrap();
    }
    assert_eq!(seq.next_index(scope).await.unwrap(), 4);
    assert_contiguous(&indices(&store, scope).await);
}

#[tokio::test]
async fn delete_then_renumber_closes_the_gap() {
    let (store, scope, module) = setup().await;
    let seq = manager(&store);

    let mut ids = Vec::new();
    for title in ["A", "B", "C"] {
        ids.push(seq.insert(chapter(&module, title)).await.unwrap().id);
    }

    seq.remove(ResourceKind::Chapter, ids[1]).await.unwrap();

    let rows = indices(&store, scope).await;
    assert_eq!(
        rows,
        vec![("A".to_string(), 1), ("C".to_string(), 2)],
        "survivors keep their relative order"
    );
}

#[tokio::test]
async fn renumber_is_idempotent() {
    let (store, scope, module) = setup().await;
    let seq = manager(&store);

    for title in ["A", "B", "C", "D"] {
        seq.insert(chapter(&module, title)).await.unwrap();
    }
    seq.remove(
        ResourceKind::Chapter,
        store.list_siblings(scope).await.unwrap()[0].id,
    )
    .await
    .unwrap();

    let once = indices(&store, scope).await;
    seq.renumber(scope).await.unwrap();
    let twice = indices(&store, scope).await;
    assert_eq!(once, twice);
    assert_contiguous(&twice);
}

#[tokio::test]
async fn reorder_swaps_with_the_displaced_sibling() {
    let (store, _scope, module) = setup().await;
    let exam = store
        .insert(
            Resource::new(ResourceKind::Exam, "Midterm")
                .with_parent(ResourceKind::Module, module.id)
                .with_status(LifecycleStatus::Draft),
        )
        .await
        .unwrap();
    let question_scope = SiblingScope::new(
        ParentRef::new(ResourceKind::Exam, exam.id),
        ResourceKind::Question,
    );
    let seq = manager(&store);

    let mut ids = Vec::new();
    for title in ["Q1", "Q2", "Q3"] {
        ids.push(
            seq.insert(
                Resource::new(ResourceKind::Question, title)
                    .with_parent(ResourceKind::Exam, exam.id),
            )
            .await
            .unwrap()
            .id,
        );
    }

    // Move the third question to the front; the old front takes 3.
    let moved = seq
        .reorder(ResourceKind::Question, ids[2], 1)
        .await
        .unwrap();
    assert_eq!(moved.order_index, Some(1));

    let rows = indices(&store, question_scope).await;
    assert_eq!(
        rows,
        vec![
            ("Q3".to_string(), 1),
            ("Q2".to_string(), 2),
            ("Q1".to_string(), 3),
        ]
    );
}

#[tokio::test]
async fn reorder_to_current_index_is_a_no_op() {
    let (store, scope, module) = setup().await;
    let seq = manager(&store);

    let a = seq.insert(chapter(&module, "A")).await.unwrap();
    seq.insert(chapter(&module, "B")).await.unwrap();

    let moved = seq.reorder(ResourceKind::Chapter, a.id, 1).await.unwrap();
    assert_eq!(moved.order_index, Some(1));
    assert_contiguous(&indices(&store, scope).await);
}

#[tokio::test]
async fn reorder_out_of_range_is_invalid() {
    let (store, _scope, module) = setup().await;
    let seq = manager(&store);

    let a = seq.insert(chapter(&module, "A")).await.unwrap();
    seq.insert(chapter(&module, "B")).await.unwrap();

    let err = seq
        .reorder(ResourceKind::Chapter, a.id, 3)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CursusError::InvalidIndex {
            candidate: 3,
            max: 2
        }
    ));

    let err = seq
        .reorder(ResourceKind::Chapter, a.id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, CursusError::InvalidIndex { candidate: 0, .. }));
}

#[tokio::test]
async fn explicit_index_in_empty_scope_must_be_one() {
    let (store, scope, module) = setup().await;
    let seq = manager(&store);

    let err = seq
        .insert(chapter(&module, "Eager").with_order_index(2))
        .await
        .unwrap_err();
    assert!(matches!(err, CursusError::EmptyScopeIndex { candidate: 2 }));

    seq.insert(chapter(&module, "First").with_order_index(1))
        .await
        .unwrap();
    assert_contiguous(&indices(&store, scope).await);
}

#[tokio::test]
async fn explicit_insert_displaces_occupant_to_the_end() {
    let (store, scope, module) = setup().await;
    let seq = manager(&store);

    for title in ["A", "B", "C"] {
        seq.insert(chapter(&module, title)).await.unwrap();
    }

    // Inserting at 1 sends the old head to the vacated append slot.
    seq.insert(chapter(&module, "New Head").with_order_index(1))
        .await
        .unwrap();

    let rows = indices(&store, scope).await;
    assert_eq!(
        rows,
        vec![
            ("New Head".to_string(), 1),
            ("B".to_string(), 2),
            ("C".to_string(), 3),
            ("A".to_string(), 4),
        ]
    );
}

#[tokio::test]
async fn explicit_insert_beyond_append_slot_is_invalid() {
    let (store, _scope, module) = setup().await;
    let seq = manager(&store);

    seq.insert(chapter(&module, "A")).await.unwrap();
    let err = seq
        .insert(chapter(&module, "Too Far").with_order_index(3))
        .await
        .unwrap_err();
    assert!(matches!(err, CursusError::InvalidIndex { candidate: 3, .. }));
}

#[tokio::test]
async fn failed_explicit_insert_leaves_indices_contiguous() {
    let (store, scope, module) = setup().await;
    let seq = manager(&store);

    let mut ids = Vec::new();
    for title in ["A", "B", "C"] {
        ids.push(seq.insert(chapter(&module, title)).await.unwrap().id);
    }

    // Reuse an existing id so the insert itself fails after the
    // collision with index 1 has been detected.
    let mut dup = chapter(&module, "Dup").with_order_index(1);
    dup.id = ids[0];
    let err = seq.insert(dup).await.unwrap_err();
    assert!(matches!(err, CursusError::AlreadyExists { .. }));

    let rows = indices(&store, scope).await;
    assert_eq!(
        rows,
        vec![
            ("A".to_string(), 1),
            ("B".to_string(), 2),
            ("C".to_string(), 3),
        ],
        "a failed insert must not displace the occupant"
    );
}

#[tokio::test]
async fn validate_explicit_index_bounds() {
    let (store, scope, module) = setup().await;
    let seq = manager(&store);

    assert!(matches!(
        seq.validate_explicit_index(scope, 2).await.unwrap_err(),
        CursusError::EmptyScopeIndex { candidate: 2 }
    ));
    seq.validate_explicit_index(scope, 1).await.unwrap();

    for title in ["A", "B"] {
        seq.insert(chapter(&module, title)).await.unwrap();
    }
    seq.validate_explicit_index(scope, 2).await.unwrap();
    assert!(matches!(
        seq.validate_explicit_index(scope, 3).await.unwrap_err(),
        CursusError::InvalidIndex {
            candidate: 3,
            max: 2
        }
    ));
}

#[tokio::test]
async fn non_sequenced_kinds_are_rejected() {
    let (store, _scope, module) = setup().await;
    let seq = manager(&store);

    let exam =
        Resource::new(ResourceKind::Exam, "Midterm").with_parent(ResourceKind::Module, module.id);
    let err = seq.insert(exam).await.unwrap_err();
    assert!(matches!(
        err,
        CursusError::NotSequenced {
            kind: ResourceKind::Exam
        }
    ));

    let err = seq
        .remove(ResourceKind::Course, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, CursusError::NotSequenced { .. }));
}

#[tokio::test]
async fn read_side_operations_reject_non_sequenced_scopes() {
    let (store, _scope, module) = setup().await;
    let exam = store
        .insert(
            Resource::new(ResourceKind::Exam, "Quiz")
                .with_parent(ResourceKind::Module, module.id)
                .with_status(LifecycleStatus::Draft),
        )
        .await
        .unwrap();
    let question = store
        .insert(
            Resource::new(ResourceKind::Question, "Pick one")
                .with_parent(ResourceKind::Exam, exam.id)
                .with_order_index(1),
        )
        .await
        .unwrap();
    let mut option_ids = Vec::new();
    for title in ["Yes", "No"] {
        option_ids.push(
            store
                .insert(
                    Resource::new(ResourceKind::QuestionOption, title)
                        .with_parent(ResourceKind::Question, question.id),
                )
                .await
                .unwrap()
                .id,
        );
    }

    let option_scope = SiblingScope::new(
        ParentRef::new(ResourceKind::Question, question.id),
        ResourceKind::QuestionOption,
    );
    let seq = manager(&store);

    for err in [
        seq.next_index(option_scope).await.unwrap_err(),
        seq.validate_explicit_index(option_scope, 1).await.unwrap_err(),
        seq.renumber(option_scope).await.unwrap_err(),
    ] {
        assert!(matches!(
            err,
            CursusError::NotSequenced {
                kind: ResourceKind::QuestionOption
            }
        ));
    }

    // Options must not have been given order indices.
    for id in option_ids {
        let option = store
            .get(ResourceKind::QuestionOption, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(option.order_index, None);
    }
}

#[tokio::test]
async fn mixed_operations_preserve_the_invariant() {
    let (store, scope, module) = setup().await;
    let seq = manager(&store);

    let mut ids = Vec::new();
    for title in ["A", "B", "C", "D", "E"] {
        ids.push(seq.insert(chapter(&module, title)).await.unwrap().id);
    }
    seq.remove(ResourceKind::Chapter, ids[1]).await.unwrap();
    seq.reorder(ResourceKind::Chapter, ids[4], 1).await.unwrap();
    seq.insert(chapter(&module, "F").with_order_index(2))
        .await
        .unwrap();
    seq.remove(ResourceKind::Chapter, ids[0]).await.unwrap();

    assert_contiguous(&indices(&store, scope).await);
}

#[tokio::test]
async fn concurrent_inserts_keep_the_invariant() {
    let (store, scope, module) = setup().await;

    let mut handles = Vec::new();
    for n in 0..8 {
        let store = store.clone();
        let module = module.clone();
        handles.push(tokio::spawn(async move {
            // Enough retries to survive losing every race.
            let seq = SequenceManager::new(
                store,
                SequenceConfig {
                    max_insert_retries: 32,
                },
            );
            seq.insert(chapter(&module, format!("ch-{n}").as_str()))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let rows = indices(&store, scope).await;
    assert_eq!(rows.len(), 8);
    assert_contiguous(&rows);
}

// ---------------------------------------------------------------------------
// Duplicate detection on corrupt data
// ---------------------------------------------------------------------------

/// A store with no unique-index constraint, standing in for legacy
/// storage that let duplicates through.
#[derive(Clone, Default)]
struct LaxStore {
    rows: Arc<RwLock<Vec<Resource>>>,
}

impl ResourceStore for LaxStore {
    async fn get(&self, kind: ResourceKind, id: Uuid) -> CursusResult<Option<Resource>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .iter()
            .find(|r| r.kind == kind && r.id == id)
            .cloned())
    }

    async fn list_siblings(&self, scope: SiblingScope) -> CursusResult<Vec<Resource>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.kind == scope.kind && r.parent == Some(scope.parent))
            .cloned()
            .collect())
    }

    async fn insert(&self, resource: Resource) -> CursusResult<Resource> {
        self.rows.write().unwrap().push(resource.clone());
        Ok(resource)
    }

    async fn save(&self, resource: Resource) -> CursusResult<Resource> {
        let mut rows = self.rows.write().unwrap();
        let slot = rows
            .iter_mut()
            .find(|r| r.id == resource.id)
            .ok_or(CursusError::NotFound {
                kind: resource.kind,
                id: resource.id,
            })?;
        *slot = resource.clone();
        Ok(resource)
    }

    async fn save_all(&self, resources: Vec<Resource>) -> CursusResult<()> {
        for resource in resources {
            self.save(resource).await?;
        }
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, id: Uuid) -> CursusResult<()> {
        self.rows
            .write()
            .unwrap()
            .retain(|r| !(r.kind == kind && r.id == id));
        Ok(())
    }
}

#[tokio::test]
async fn duplicate_indices_surface_instead_of_silent_repair() {
    let store = LaxStore::default();
    let module = Resource::new(ResourceKind::Module, "Corrupted").with_order_index(1);
    store.insert(module.clone()).await.unwrap();

    let scope = SiblingScope::new(
        ParentRef::new(ResourceKind::Module, module.id),
        ResourceKind::Chapter,
    );
    for title in ["dup-a", "dup-b"] {
        store
            .insert(
                Resource::new(ResourceKind::Chapter, title)
                    .with_parent(ResourceKind::Module, module.id)
                    .with_order_index(1),
            )
            .await
            .unwrap();
    }

    let seq = SequenceManager::new(store.clone(), SequenceConfig::default());
    let err = seq.next_index(scope).await.unwrap_err();
    assert!(matches!(
        err,
        CursusError::DuplicateIndex { index: 1, .. }
    ));

    // Renumber is the sanctioned repair path; afterwards the scope
    // behaves normally again.
    seq.renumber(scope).await.unwrap();
    let mut got: Vec<u32> = store
        .list_siblings(scope)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.order_index.unwrap())
        .collect();
    got.sort_unstable();
    assert_eq!(got, vec![1, 2]);
    assert_eq!(seq.next_index(scope).await.unwrap(), 3);
}
