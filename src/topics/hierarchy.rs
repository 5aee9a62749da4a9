//! # Explicit subtype relation for assignability matching.
//!
//! Rust has no runtime "is assignable from" check, so the relation is declared up front:
//! `declare::<D, B>(upcast)` states that a `D` may be delivered where a `B` is expected and
//! supplies the conversion `Arc<D> -> Arc<B>` (`B` may be a trait object).
//!
//! ## Rules
//! - The relation is transitive: `A <: B` and `B <: C` gives `A <: C`, upcasts compose.
//! - Declarations that would form a cycle (including `D == B`) are rejected.
//! - Redeclaring an existing edge replaces its upcast.
//!
//! ## Lineage
//! ```text
//! lineage(Admin) = [Admin (identity), User (Admin->User), dyn Named (Admin->User->dyn Named)]
//! ```
//! Breadth-first; when two paths reach the same ancestor, the first one found wins.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::error::MediatorError;
use crate::topics::TopicType;

/// Published value with its concrete `Arc<T>` hidden behind `Any`.
pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;

type Upcast = Arc<dyn Fn(&ErasedValue) -> Option<ErasedValue> + Send + Sync>;

/// Wraps an `Arc<T>` so that `T` may be unsized.
pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> ErasedValue {
    Arc::new(value)
}

/// Inverse of [`erase`].
pub(crate) fn unerase<T: ?Sized + Send + Sync + 'static>(value: &ErasedValue) -> Option<Arc<T>> {
    value.downcast_ref::<Arc<T>>().cloned()
}

struct Edge {
    base: TopicType,
    upcast: Upcast,
}

/// Declared subtype edges, keyed by subtype.
#[derive(Default)]
pub struct TypeHierarchy {
    edges: HashMap<TypeId, Vec<Edge>>,
}

impl TypeHierarchy {
    /// Creates an empty relation (every type is only assignable to itself).
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `D` as a subtype of `B`.
    ///
    /// Returns [`MediatorError::CyclicSubtype`] when `B` is `D` or already a subtype of `D`.
    pub fn declare<D, B, F>(&mut self, upcast: F) -> Result<(), MediatorError>
    where
        D: ?Sized + Send + Sync + 'static,
        B: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<D>) -> Arc<B> + Send + Sync + 'static,
    {
        let sub = TopicType::of::<D>();
        let base = TopicType::of::<B>();
        if self.lineage(base).contains(sub) {
            return Err(MediatorError::CyclicSubtype {
                sub: sub.name(),
                base: base.name(),
            });
        }

        let upcast: Upcast = Arc::new(move |value: &ErasedValue| {
            unerase::<D>(value).map(|d| erase(upcast(d)))
        });

        let edges = self.edges.entry(sub.id()).or_default();
        match edges.iter_mut().find(|e| e.base == base) {
            Some(edge) => edge.upcast = upcast,
            None => edges.push(Edge { base, upcast }),
        }
        Ok(())
    }

    /// True if a value of `ty` may be delivered to a topic of type `base`.
    pub fn is_assignable(&self, base: TopicType, ty: TopicType) -> bool {
        self.lineage(ty).contains(base)
    }

    /// Returns `ty` followed by every declared ancestor, with composed upcasts.
    pub(crate) fn lineage(&self, ty: TopicType) -> Lineage {
        let mut steps = vec![Step {
            ty,
            chain: Vec::new(),
        }];
        let mut seen = HashSet::from([ty.id()]);
        let mut queue = VecDeque::from([0usize]);

        while let Some(idx) = queue.pop_front() {
            let current = steps[idx].ty;
            let Some(edges) = self.edges.get(&current.id()) else {
                continue;
            };
            for edge in edges {
                if !seen.insert(edge.base.id()) {
                    continue;
                }
                let mut chain = steps[idx].chain.clone();
                chain.push(Arc::clone(&edge.upcast));
                steps.push(Step {
                    ty: edge.base,
                    chain,
                });
                queue.push_back(steps.len() - 1);
            }
        }

        Lineage { steps }
    }
}

struct Step {
    ty: TopicType,
    chain: Vec<Upcast>,
}

/// A published type and all of its ancestors.
pub(crate) struct Lineage {
    steps: Vec<Step>,
}

impl Lineage {
    /// True if `ty` is the published type or one of its ancestors.
    pub(crate) fn contains(&self, ty: TopicType) -> bool {
        self.steps.iter().any(|s| s.ty == ty)
    }

    /// Converts a value of the published type into a value of ancestor `ty`.
    pub(crate) fn upcast(&self, ty: TopicType, value: &ErasedValue) -> Option<ErasedValue> {
        let step = self.steps.iter().find(|s| s.ty == ty)?;
        step.chain
            .iter()
            .try_fold(Arc::clone(value), |current, up| up(&current))
    }

    /// Number of types in the lineage (the published type included).
    pub(crate) fn len(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn label(&self) -> String;
    }

    struct User {
        name: String,
    }

    struct Admin {
        user: User,
    }

    impl Named for User {
        fn label(&self) -> String {
            self.name.clone()
        }
    }

    fn hierarchy() -> TypeHierarchy {
        let mut h = TypeHierarchy::new();
        h.declare::<Admin, User, _>(|a: Arc<Admin>| {
            Arc::new(User {
                name: format!("admin:{}", a.user.name),
            })
        })
        .unwrap();
        h.declare::<User, dyn Named, _>(|u: Arc<User>| u as Arc<dyn Named>)
            .unwrap();
        h
    }

    #[test]
    fn test_lineage_without_declarations_is_self() {
        let h = TypeHierarchy::new();
        let lineage = h.lineage(TopicType::of::<User>());
        assert_eq!(lineage.len(), 1);
        assert!(lineage.contains(TopicType::of::<User>()));
        assert!(!lineage.contains(TopicType::of::<Admin>()));
    }

    #[test]
    fn test_transitive_assignability() {
        let h = hierarchy();
        assert!(h.is_assignable(TopicType::of::<User>(), TopicType::of::<Admin>()));
        assert!(h.is_assignable(TopicType::of::<dyn Named>(), TopicType::of::<Admin>()));
        assert!(!h.is_assignable(TopicType::of::<Admin>(), TopicType::of::<User>()));
    }

    #[test]
    fn test_upcast_composes_along_chain() {
        let h = hierarchy();
        let lineage = h.lineage(TopicType::of::<Admin>());
        let value = erase(Arc::new(Admin {
            user: User { name: "root".into() },
        }));

        let named = lineage
            .upcast(TopicType::of::<dyn Named>(), &value)
            .and_then(|v| unerase::<dyn Named>(&v))
            .expect("upcast to trait object");
        assert_eq!(named.label(), "admin:root");

        let same = lineage
            .upcast(TopicType::of::<Admin>(), &value)
            .and_then(|v| unerase::<Admin>(&v))
            .expect("identity upcast");
        assert_eq!(same.user.name, "root");
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut h = hierarchy();
        let err = h
            .declare::<User, Admin, _>(|_u: Arc<User>| {
                Arc::new(Admin {
                    user: User { name: String::new() },
                })
            })
            .unwrap_err();
        assert!(matches!(err, MediatorError::CyclicSubtype { .. }));

        let err = h.declare::<User, User, _>(|u: Arc<User>| u).unwrap_err();
        assert_eq!(err.as_label(), "mediator_cyclic_subtype");
    }

    #[test]
    fn test_redeclare_replaces_upcast() {
        let mut h = hierarchy();
        h.declare::<Admin, User, _>(|_a: Arc<Admin>| Arc::new(User { name: "replaced".into() }))
            .unwrap();
        let lineage = h.lineage(TopicType::of::<Admin>());
        assert_eq!(lineage.len(), 3);

        let value = erase(Arc::new(Admin {
            user: User { name: "x".into() },
        }));
        let user = lineage
            .upcast(TopicType::of::<User>(), &value)
            .and_then(|v| unerase::<User>(&v))
            .unwrap();
        assert_eq!(user.name, "replaced");
    }
}
