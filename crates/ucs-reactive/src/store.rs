#![forbid(unsafe_code)]

//! Explicitly constructed world state.
//!
//! A [`StateDeclaration`] collects a schema of named fields with their
//! defaults and produces a [`StateStore`]. Each declared name yields a typed
//! key ([`FieldKey`] for scalars, [`ListKey`] for lists) that resolves to the
//! shared field handle. The store is an ordinary value: build it once and
//! pass it (or the resolved handles) to whatever needs world state.
//!
//! # Usage
//!
//! ```
//! use ucs_reactive::StateDeclaration;
//!
//! let mut decl = StateDeclaration::new("world");
//! let hp = decl.scalar("hp", 50_i32).unwrap();
//! let pickups = decl.list::<String>("pickups").unwrap();
//! let store = decl.build();
//!
//! store.field(hp).unwrap().set(0);
//! store.list(pickups).unwrap().push("sword".into());
//! assert_eq!(store.lookup::<i32>("hp").unwrap().get(), 0);
//! ```
//!
//! # Failure Modes
//!
//! - Declaring a name twice is a setup error ([`ReactiveError::DuplicateField`]).
//! - Looking a name up with the wrong type yields [`ReactiveError::FieldType`].
//! - Using a key minted by another store yields [`ReactiveError::ForeignKey`].

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ReactiveError, Result};
use crate::field::ReactiveField;
use crate::list::ReactiveList;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable position of a field inside its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u32);

impl FieldId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Whether a stored field is a scalar or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    List,
}

/// Typed handle to a scalar field of one store.
pub struct FieldKey<T> {
    store: u64,
    id: FieldId,
    _marker: PhantomData<fn() -> T>,
}

/// Typed handle to a list field of one store.
pub struct ListKey<T> {
    store: u64,
    id: FieldId,
    _marker: PhantomData<fn() -> T>,
}

macro_rules! key_impls {
    ($key:ident) => {
        impl<T> $key<T> {
            #[must_use]
            pub fn id(&self) -> FieldId {
                self.id
            }
        }

        impl<T> Clone for $key<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $key<T> {}

        impl<T> PartialEq for $key<T> {
            fn eq(&self, other: &Self) -> bool {
                self.store == other.store && self.id == other.id
            }
        }

        impl<T> Eq for $key<T> {}

        impl<T> fmt::Debug for $key<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($key))
                    .field("store", &self.store)
                    .field("id", &self.id)
                    .field("type", &type_name::<T>())
                    .finish()
            }
        }
    };
}

key_impls!(FieldKey);
key_impls!(ListKey);

/// Object-safe view of a declared field.
trait StoredField {
    fn name(&self) -> &str;
    fn kind(&self) -> FieldKind;
    fn subscriber_count(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Clone + PartialEq + 'static> StoredField for ReactiveField<T> {
    fn name(&self) -> &str {
        ReactiveField::name(self)
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Scalar
    }

    fn subscriber_count(&self) -> usize {
        ReactiveField::subscriber_count(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Clone + 'static> StoredField for ReactiveList<T> {
    fn name(&self) -> &str {
        ReactiveList::name(self)
    }

    fn kind(&self) -> FieldKind {
        FieldKind::List
    }

    fn subscriber_count(&self) -> usize {
        ReactiveList::subscriber_count(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Schema builder for a [`StateStore`].
pub struct StateDeclaration {
    store: u64,
    scope: String,
    fields: Vec<Box<dyn StoredField>>,
    by_name: HashMap<String, FieldId>,
}

impl fmt::Debug for StateDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDeclaration")
            .field("scope", &self.scope)
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl StateDeclaration {
    /// Start declaring the state named `scope`.
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            store: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            scope: scope.into(),
            fields: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Declare a scalar field with its default value.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::DuplicateField`] if `name` is already declared.
    pub fn scalar<T: Clone + PartialEq + 'static>(
        &mut self,
        name: &str,
        default: T,
    ) -> Result<FieldKey<T>> {
        let id = self.push(name, Box::new(ReactiveField::new(name, default)))?;
        Ok(FieldKey {
            store: self.store,
            id,
            _marker: PhantomData,
        })
    }

    /// Declare an empty list field.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::DuplicateField`] if `name` is already declared.
    pub fn list<T: Clone + 'static>(&mut self, name: &str) -> Result<ListKey<T>> {
        self.list_with(name, Vec::new())
    }

    /// Declare a list field with initial items.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::DuplicateField`] if `name` is already declared.
    pub fn list_with<T: Clone + 'static>(&mut self, name: &str, items: Vec<T>) -> Result<ListKey<T>> {
        let id = self.push(name, Box::new(ReactiveList::with_items(name, items)))?;
        Ok(ListKey {
            store: self.store,
            id,
            _marker: PhantomData,
        })
    }

    fn push(&mut self, name: &str, field: Box<dyn StoredField>) -> Result<FieldId> {
        if self.by_name.contains_key(name) {
            return Err(ReactiveError::DuplicateField {
                scope: self.scope.clone(),
                name: name.to_string(),
            });
        }
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(field);
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Finish the declaration.
    #[must_use]
    pub fn build(self) -> StateStore {
        tracing::debug!(scope = %self.scope, fields = self.fields.len(), "state declared");
        StateStore {
            store: self.store,
            scope: self.scope,
            fields: self.fields,
            by_name: self.by_name,
        }
    }
}

/// A declared set of reactive fields.
pub struct StateStore {
    store: u64,
    scope: String,
    fields: Vec<Box<dyn StoredField>>,
    by_name: HashMap<String, FieldId>,
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("scope", &self.scope)
            .field("fields", &self.names().collect::<Vec<_>>())
            .field("subscribers", &self.total_subscribers())
            .finish()
    }
}

impl StateStore {
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name())
    }

    /// Resolve a scalar key to its shared handle.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::ForeignKey`] if the key came from another store.
    pub fn field<T: Clone + PartialEq + 'static>(&self, key: FieldKey<T>) -> Result<ReactiveField<T>> {
        let slot = self.slot(key.store, key.id)?;
        downcast::<ReactiveField<T>>(slot, "scalar")
    }

    /// Resolve a list key to its shared handle.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::ForeignKey`] if the key came from another store.
    pub fn list<T: Clone + 'static>(&self, key: ListKey<T>) -> Result<ReactiveList<T>> {
        let slot = self.slot(key.store, key.id)?;
        downcast::<ReactiveList<T>>(slot, "list")
    }

    /// Look a scalar field up by name.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::UnknownField`] or [`ReactiveError::FieldType`].
    pub fn lookup<T: Clone + PartialEq + 'static>(&self, name: &str) -> Result<ReactiveField<T>> {
        downcast::<ReactiveField<T>>(self.named(name)?, "scalar")
    }

    /// Look a list field up by name.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::UnknownField`] or [`ReactiveError::FieldType`].
    pub fn lookup_list<T: Clone + 'static>(&self, name: &str) -> Result<ReactiveList<T>> {
        downcast::<ReactiveList<T>>(self.named(name)?, "list")
    }

    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<FieldId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn kind_of(&self, id: FieldId) -> Option<FieldKind> {
        self.fields.get(id.index()).map(|f| f.kind())
    }

    /// Subscribers currently registered on the field `id`.
    #[must_use]
    pub fn subscriber_count(&self, id: FieldId) -> Option<usize> {
        self.fields.get(id.index()).map(|f| f.subscriber_count())
    }

    /// Sum of subscribers over every field of the store.
    #[must_use]
    pub fn total_subscribers(&self) -> usize {
        self.fields.iter().map(|f| f.subscriber_count()).sum()
    }

    fn slot(&self, store: u64, id: FieldId) -> Result<&dyn StoredField> {
        match self.fields.get(id.index()) {
            Some(field) if store == self.store => Ok(field.as_ref()),
            Some(field) => Err(ReactiveError::ForeignKey {
                name: field.name().to_string(),
            }),
            None => Err(ReactiveError::ForeignKey {
                name: format!("#{}", id.index()),
            }),
        }
    }

    fn named(&self, name: &str) -> Result<&dyn StoredField> {
        self.by_name
            .get(name)
            .and_then(|id| self.fields.get(id.index()))
            .map(|f| f.as_ref())
            .ok_or_else(|| ReactiveError::UnknownField {
                scope: self.scope.clone(),
                name: name.to_string(),
            })
    }
}

fn downcast<F: Clone + 'static>(field: &dyn StoredField, expected: &'static str) -> Result<F> {
    field
        .as_any()
        .downcast_ref::<F>()
        .cloned()
        .ok_or_else(|| ReactiveError::FieldType {
            name: field.name().to_string(),
            expected,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_fields_start_at_defaults() {
        let mut decl = StateDeclaration::new("world");
        let hp = decl.scalar("hp", 50).unwrap();
        let pickups = decl.list::<String>("pickups").unwrap();
        let store = decl.build();

        assert_eq!(store.field(hp).unwrap().get(), 50);
        assert!(store.list(pickups).unwrap().is_empty());
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["hp", "pickups"]);
        assert_eq!(store.kind_of(pickups.id()), Some(FieldKind::List));
    }

    #[test]
    fn duplicate_declaration_is_rejected() {
        let mut decl = StateDeclaration::new("world");
        decl.scalar("hp", 1).unwrap();
        let err = decl.list::<i32>("hp").unwrap_err();
        assert_eq!(
            err,
            ReactiveError::DuplicateField {
                scope: "world".into(),
                name: "hp".into()
            }
        );
    }

    #[test]
    fn resolved_handles_are_shared() {
        let mut decl = StateDeclaration::new("world");
        let hp = decl.scalar("hp", 50).unwrap();
        let store = decl.build();

        store.field(hp).unwrap().set(10);
        assert_eq!(store.lookup::<i32>("hp").unwrap().get(), 10);
        assert!(store.field(hp).unwrap().same_field(&store.lookup("hp").unwrap()));
    }

    #[test]
    fn lookup_with_wrong_type_fails() {
        let mut decl = StateDeclaration::new("world");
        decl.scalar("hp", 50_i32).unwrap();
        let store = decl.build();

        assert!(matches!(
            store.lookup::<String>("hp"),
            Err(ReactiveError::FieldType { expected: "scalar", .. })
        ));
        assert!(matches!(
            store.lookup_list::<i32>("hp"),
            Err(ReactiveError::FieldType { expected: "list", .. })
        ));
        assert!(matches!(
            store.lookup::<i32>("mana"),
            Err(ReactiveError::UnknownField { .. })
        ));
    }

    #[test]
    fn foreign_key_is_rejected() {
        let mut a = StateDeclaration::new("a");
        let key = a.scalar("hp", 1).unwrap();
        let mut b = StateDeclaration::new("b");
        b.scalar("hp", 1).unwrap();
        let store_b = b.build();

        assert!(matches!(
            store_b.field(key),
            Err(ReactiveError::ForeignKey { .. })
        ));
    }

    #[test]
    fn subscriber_counts_are_visible() {
        let mut decl = StateDeclaration::new("world");
        let hp = decl.scalar("hp", 0).unwrap();
        let xs = decl.list::<u8>("xs").unwrap();
        let store = decl.build();

        let _a = store.field(hp).unwrap().subscribe(|| {});
        let _b = store.list(xs).unwrap().subscribe(|| {});
        let _c = store.list(xs).unwrap().subscribe(|| {});

        assert_eq!(store.subscriber_count(hp.id()), Some(1));
        assert_eq!(store.subscriber_count(xs.id()), Some(2));
        assert_eq!(store.total_subscribers(), 3);
    }
}
