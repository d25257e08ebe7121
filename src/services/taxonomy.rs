//! Hierarchical taxonomy integrity engine.
//!
//! One algorithm, two instances: the content category tree and the
//! project category tree are both served by [`TaxonomyService`] over a
//! backend-specific [`TaxonomyStore`]. The service owns the naming,
//! re-parenting, and deletion invariants; stores only move rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use crate::errors::{CoreError, CoreResult};

/// A node in a self-referencing tree. `parent_id = None` marks a root;
/// roots share one sibling namespace just like the children of any
/// single parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub is_active: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Display subset embedded in entity views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: i32,
    pub name: String,
}

impl From<TaxonomyNode> for NodeRef {
    fn from(node: TaxonomyNode) -> Self {
        NodeRef {
            id: node.id,
            name: node.name,
        }
    }
}

/// Validated node ready for insertion; the store assigns id and
/// timestamps.
#[derive(Debug, Clone)]
pub struct NewNode {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub is_active: bool,
    pub priority: i32,
}

#[derive(Debug, Clone)]
pub struct CreateNodeInput {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub priority: Option<i32>,
}

/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateNodeInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Priority,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub order_by: OrderBy,
    pub direction: OrderDirection,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            order_by: OrderBy::Priority,
            direction: OrderDirection::Desc,
        }
    }
}

/// Node persistence required by the tree service. All ancestor walks go
/// through `find_by_id` rather than in-memory back-pointers.
#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// Capitalized noun for error messages, e.g. "Category".
    fn kind(&self) -> &'static str;

    /// What references nodes of this tree, e.g. "content".
    fn dependent_kind(&self) -> &'static str;

    async fn find_by_id(&self, id: i32) -> CoreResult<Option<TaxonomyNode>>;

    /// Node with `name` under `parent_id`, if any. `None` parent means
    /// the root namespace.
    async fn find_sibling(
        &self,
        name: &str,
        parent_id: Option<i32>,
    ) -> CoreResult<Option<TaxonomyNode>>;

    async fn find_all(&self, options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>>;
    async fn find_active(&self, options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>>;
    async fn find_roots(&self, options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>>;
    async fn find_children(
        &self,
        parent_id: i32,
        options: &QueryOptions,
    ) -> CoreResult<Vec<TaxonomyNode>>;

    async fn count_children(&self, id: i32) -> CoreResult<u64>;

    /// How many tracked entities reference this node as category or
    /// subcategory.
    async fn count_entity_refs(&self, id: i32) -> CoreResult<u64>;

    async fn insert(&self, node: NewNode) -> CoreResult<TaxonomyNode>;
    async fn update(&self, node: &TaxonomyNode) -> CoreResult<TaxonomyNode>;
    async fn delete(&self, id: i32) -> CoreResult<()>;
}

pub struct TaxonomyService<S> {
    store: S,
}

impl<S: TaxonomyStore> TaxonomyService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: CreateNodeInput) -> CoreResult<TaxonomyNode> {
        if self
            .store
            .find_sibling(&input.name, input.parent_id)
            .await?
            .is_some()
        {
            return Err(CoreError::conflict(format!(
                "{} with this name already exists at this level",
                self.store.kind()
            )));
        }

        // A brand-new node cannot be its own ancestor, so only parent
        // existence is checked here.
        if let Some(parent_id) = input.parent_id {
            if self.store.find_by_id(parent_id).await?.is_none() {
                return Err(CoreError::not_found(format!(
                    "Parent {} not found",
                    self.store.kind().to_lowercase()
                )));
            }
        }

        let node = self
            .store
            .insert(NewNode {
                name: input.name,
                description: input.description,
                parent_id: input.parent_id,
                is_active: true,
                priority: input.priority.unwrap_or(0),
            })
            .await?;

        info!("created {} {} ({})", self.store.kind(), node.id, node.name);
        Ok(node)
    }

    pub async fn find_one(&self, id: i32) -> CoreResult<TaxonomyNode> {
        self.store.find_by_id(id).await?.ok_or_else(|| {
            CoreError::not_found(format!("{} with id {} not found", self.store.kind(), id))
        })
    }

    pub async fn find_all(&self, options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>> {
        self.store.find_all(options).await
    }

    pub async fn find_active(&self, options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>> {
        self.store.find_active(options).await
    }

    pub async fn find_roots(&self, options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>> {
        self.store.find_roots(options).await
    }

    pub async fn find_children(
        &self,
        parent_id: i32,
        options: &QueryOptions,
    ) -> CoreResult<Vec<TaxonomyNode>> {
        self.store.find_children(parent_id, options).await
    }

    pub async fn update(&self, id: i32, input: UpdateNodeInput) -> CoreResult<TaxonomyNode> {
        let mut node = self.find_one(id).await?;

        // Re-check sibling uniqueness under the effective parent,
        // excluding the node itself.
        if let Some(name) = &input.name {
            let effective_parent = input.parent_id.or(node.parent_id);
            if let Some(existing) = self.store.find_sibling(name, effective_parent).await? {
                if existing.id != id {
                    return Err(CoreError::conflict(format!(
                        "{} with this name already exists at this level",
                        self.store.kind()
                    )));
                }
            }
        }

        if let Some(new_parent_id) = input.parent_id {
            if new_parent_id == id {
                return Err(CoreError::conflict(format!(
                    "{} cannot be its own parent",
                    self.store.kind()
                )));
            }
            if self.store.find_by_id(new_parent_id).await?.is_none() {
                return Err(CoreError::not_found(format!(
                    "Parent {} not found",
                    self.store.kind().to_lowercase()
                )));
            }
            self.assert_no_cycle(id, new_parent_id).await?;
            node.parent_id = Some(new_parent_id);
        }

        if let Some(name) = input.name {
            node.name = name;
        }
        if let Some(description) = input.description {
            node.description = Some(description);
        }
        if let Some(priority) = input.priority {
            node.priority = priority;
        }
        if let Some(is_active) = input.is_active {
            node.is_active = is_active;
        }
        node.updated_at = Utc::now();

        self.store.update(&node).await
    }

    /// Refuses to delete a node that still has children or referencing
    /// entities; nothing cascades.
    pub async fn remove(&self, id: i32) -> CoreResult<()> {
        self.find_one(id).await?;

        if self.store.count_children(id).await? > 0 {
            return Err(CoreError::conflict(format!(
                "Cannot delete {} with subcategories",
                self.store.kind().to_lowercase()
            )));
        }

        if self.store.count_entity_refs(id).await? > 0 {
            return Err(CoreError::conflict(format!(
                "Cannot delete {} with associated {}",
                self.store.kind().to_lowercase(),
                self.store.dependent_kind()
            )));
        }

        self.store.delete(id).await?;
        info!("deleted {} {}", self.store.kind(), id);
        Ok(())
    }

    /// Flips `is_active`. Descendants keep their own flags.
    pub async fn toggle_active(&self, id: i32) -> CoreResult<TaxonomyNode> {
        let mut node = self.find_one(id).await?;
        node.is_active = !node.is_active;
        node.updated_at = Utc::now();
        self.store.update(&node).await
    }

    /// Walks the ancestor chain from `new_parent_id`. The move is
    /// circular if the walk reaches `id` or revisits a node; it is fine
    /// once a root is reached.
    async fn assert_no_cycle(&self, id: i32, new_parent_id: i32) -> CoreResult<()> {
        let mut visited = HashSet::new();
        let mut current = Some(new_parent_id);

        while let Some(node_id) = current {
            if node_id == id || !visited.insert(node_id) {
                return Err(CoreError::conflict("Circular reference detected"));
            }
            current = match self.store.find_by_id(node_id).await? {
                Some(node) => node.parent_id,
                None => None,
            };
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemState {
        nodes: HashMap<i32, TaxonomyNode>,
        entity_refs: HashMap<i32, u64>,
        next_id: i32,
    }

    struct MemStore {
        state: Mutex<MemState>,
    }

    impl MemStore {
        fn new() -> Self {
            Self {
                state: Mutex::new(MemState {
                    next_id: 1,
                    ..Default::default()
                }),
            }
        }

        fn set_entity_refs(&self, id: i32, count: u64) {
            self.state.lock().unwrap().entity_refs.insert(id, count);
        }
    }

    #[async_trait]
    impl TaxonomyStore for MemStore {
        fn kind(&self) -> &'static str {
            "Category"
        }

        fn dependent_kind(&self) -> &'static str {
            "content"
        }

        async fn find_by_id(&self, id: i32) -> CoreResult<Option<TaxonomyNode>> {
            Ok(self.state.lock().unwrap().nodes.get(&id).cloned())
        }

        async fn find_sibling(
            &self,
            name: &str,
            parent_id: Option<i32>,
        ) -> CoreResult<Option<TaxonomyNode>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .nodes
                .values()
                .find(|n| n.name == name && n.parent_id == parent_id)
                .cloned())
        }

        async fn find_all(&self, _options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>> {
            Ok(self.state.lock().unwrap().nodes.values().cloned().collect())
        }

        async fn find_active(&self, _options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .nodes
                .values()
                .filter(|n| n.is_active)
                .cloned()
                .collect())
        }

        async fn find_roots(&self, _options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .nodes
                .values()
                .filter(|n| n.parent_id.is_none())
                .cloned()
                .collect())
        }

        async fn find_children(
            &self,
            parent_id: i32,
            _options: &QueryOptions,
        ) -> CoreResult<Vec<TaxonomyNode>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .nodes
                .values()
                .filter(|n| n.parent_id == Some(parent_id))
                .cloned()
                .collect())
        }

        async fn count_children(&self, id: i32) -> CoreResult<u64> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .nodes
                .values()
                .filter(|n| n.parent_id == Some(id))
                .count() as u64)
        }

        async fn count_entity_refs(&self, id: i32) -> CoreResult<u64> {
            Ok(*self
                .state
                .lock()
                .unwrap()
                .entity_refs
                .get(&id)
                .unwrap_or(&0))
        }

        async fn insert(&self, node: NewNode) -> CoreResult<TaxonomyNode> {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id;
            state.next_id += 1;
            let now = Utc::now();
            let node = TaxonomyNode {
                id,
                name: node.name,
                description: node.description,
                parent_id: node.parent_id,
                is_active: node.is_active,
                priority: node.priority,
                created_at: now,
                updated_at: now,
            };
            state.nodes.insert(id, node.clone());
            Ok(node)
        }

        async fn update(&self, node: &TaxonomyNode) -> CoreResult<TaxonomyNode> {
            self.state
                .lock()
                .unwrap()
                .nodes
                .insert(node.id, node.clone());
            Ok(node.clone())
        }

        async fn delete(&self, id: i32) -> CoreResult<()> {
            self.state.lock().unwrap().nodes.remove(&id);
            Ok(())
        }
    }

    fn service() -> TaxonomyService<MemStore> {
        TaxonomyService::new(MemStore::new())
    }

    fn create_input(name: &str, parent_id: Option<i32>) -> CreateNodeInput {
        CreateNodeInput {
            name: name.to_string(),
            description: None,
            parent_id,
            priority: None,
        }
    }

    fn reparent(parent_id: i32) -> UpdateNodeInput {
        UpdateNodeInput {
            parent_id: Some(parent_id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn sibling_uniqueness_is_scoped_by_parent() {
        let svc = service();
        let a = svc.create(create_input("A", None)).await.unwrap();
        let b = svc.create(create_input("B", None)).await.unwrap();

        svc.create(create_input("Docs", Some(a.id))).await.unwrap();
        svc.create(create_input("Docs", Some(b.id))).await.unwrap();

        let err = svc
            .create(create_input("Docs", Some(a.id)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn root_names_share_one_namespace() {
        let svc = service();
        svc.create(create_input("A", None)).await.unwrap();
        let err = svc.create(create_input("A", None)).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn create_under_missing_parent_is_not_found() {
        let svc = service();
        let err = svc.create(create_input("A", Some(99))).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn reparenting_under_own_descendant_is_rejected() {
        let svc = service();
        let a = svc.create(create_input("A", None)).await.unwrap();
        let b = svc.create(create_input("B", Some(a.id))).await.unwrap();
        let c = svc.create(create_input("C", Some(b.id))).await.unwrap();

        let err = svc.update(a.id, reparent(c.id)).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        assert!(err.to_string().contains("Circular reference"));
    }

    #[tokio::test]
    async fn self_parenting_is_rejected() {
        let svc = service();
        let c = svc.create(create_input("C", None)).await.unwrap();
        let err = svc.update(c.id, reparent(c.id)).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn valid_reparent_moves_the_node() {
        let svc = service();
        let a = svc.create(create_input("A", None)).await.unwrap();
        let b = svc.create(create_input("B", Some(a.id))).await.unwrap();
        let c = svc.create(create_input("C", None)).await.unwrap();

        let moved = svc.update(c.id, reparent(b.id)).await.unwrap();
        assert_eq!(moved.parent_id, Some(b.id));
    }

    #[tokio::test]
    async fn rename_collision_under_same_parent_is_rejected() {
        let svc = service();
        let a = svc.create(create_input("A", None)).await.unwrap();
        svc.create(create_input("Docs", Some(a.id))).await.unwrap();
        let notes = svc.create(create_input("Notes", Some(a.id))).await.unwrap();

        let err = svc
            .update(
                notes.id,
                UpdateNodeInput {
                    name: Some("Docs".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn rename_to_own_name_is_allowed() {
        let svc = service();
        let a = svc.create(create_input("A", None)).await.unwrap();
        let renamed = svc
            .update(
                a.id,
                UpdateNodeInput {
                    name: Some("A".to_string()),
                    description: Some("kept".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.description.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn delete_with_children_is_rejected() {
        let svc = service();
        let a = svc.create(create_input("A", None)).await.unwrap();
        svc.create(create_input("B", Some(a.id))).await.unwrap();

        let err = svc.remove(a.id).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn delete_with_entity_refs_is_rejected() {
        let svc = service();
        let a = svc.create(create_input("A", None)).await.unwrap();
        svc.store.set_entity_refs(a.id, 3);

        let err = svc.remove(a.id).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn delete_of_unreferenced_leaf_succeeds() {
        let svc = service();
        let a = svc.create(create_input("A", None)).await.unwrap();
        svc.remove(a.id).await.unwrap();
        assert_eq!(svc.find_one(a.id).await.unwrap_err().code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn toggle_active_flips_only_the_target() {
        let svc = service();
        let a = svc.create(create_input("A", None)).await.unwrap();
        let b = svc.create(create_input("B", Some(a.id))).await.unwrap();
        assert!(a.is_active);

        let toggled = svc.toggle_active(a.id).await.unwrap();
        assert!(!toggled.is_active);
        assert!(svc.find_one(b.id).await.unwrap().is_active);

        let toggled = svc.toggle_active(a.id).await.unwrap();
        assert!(toggled.is_active);
    }
}
