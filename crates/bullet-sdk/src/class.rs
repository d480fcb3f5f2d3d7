//! Class bindings: the foreign-visible identity of one native class
//!
//! A [`ClassBinding`] records the class's foreign name, its native identity,
//! its single base (an explicit parent pointer, so `is-a` is a chain walk and
//! never depends on the host runtime's inheritance model), whether it may be
//! constructed directly and whether its instances may be duplicated.
//!
//! Binding records live for the process lifetime once registered. Members
//! and factories hold strong back-edges to their owner.

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{BindError, BindResult};
use crate::factory::FactoryBinding;
use crate::member::MemberBinding;
use crate::object::ObjectRef;
use crate::value::ForeignValue;

/// Type-erased native value as stored inside an owned instance
pub type NativeBox = Box<dyn Any + Send + Sync>;

type Copier = Arc<dyn Fn(&dyn Any) -> Option<NativeBox> + Send + Sync>;
type Comparer = Arc<dyn Fn(&dyn Any, &dyn Any) -> Option<bool> + Send + Sync>;

/// Declaration of a class to register, parameterized by its storage type `T`.
///
/// `T` is the Rust type held inside instances. Several classes of one
/// polymorphic family may share a storage type (e.g. `Box<dyn Shape>`); the
/// native identity then names the concrete native class.
pub struct ClassSpec<T> {
    pub(crate) foreign_name: String,
    pub(crate) native_identity: &'static str,
    pub(crate) base: Option<ClassBinding>,
    pub(crate) instantiable: bool,
    pub(crate) copier: Option<Copier>,
    pub(crate) comparer: Option<Comparer>,
    _storage: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassSpec<T> {
    /// Declare a non-instantiable, non-copyable class with no base
    pub fn new(foreign_name: impl Into<String>) -> Self {
        Self {
            foreign_name: foreign_name.into(),
            native_identity: std::any::type_name::<T>(),
            base: None,
            instantiable: false,
            copier: None,
            comparer: None,
            _storage: PhantomData,
        }
    }

    /// Name the native class this binding projects
    pub fn native_identity(mut self, identity: &'static str) -> Self {
        self.native_identity = identity;
        self
    }

    /// Declare the single base class
    pub fn base(mut self, base: &ClassBinding) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Allow direct construction through the class's factories
    pub fn instantiable(mut self) -> Self {
        self.instantiable = true;
        self
    }

    pub(crate) fn storage(&self) -> (TypeId, &'static str) {
        (TypeId::of::<T>(), std::any::type_name::<T>())
    }
}

impl<T: Any + Send + Sync + Clone> ClassSpec<T> {
    /// Allow instances to be duplicated by value
    pub fn copyable(mut self) -> Self {
        let copier: Copier = Arc::new(|any: &dyn Any| {
            any.downcast_ref::<T>()
                .map(|value| Box::new(value.clone()) as NativeBox)
        });
        self.copier = Some(copier);
        self
    }
}

impl<T: Any + Send + Sync + PartialEq> ClassSpec<T> {
    /// Compare instances by content instead of identity
    pub fn comparable(mut self) -> Self {
        let comparer: Comparer = Arc::new(|a: &dyn Any, b: &dyn Any| {
            Some(a.downcast_ref::<T>()? == b.downcast_ref::<T>()?)
        });
        self.comparer = Some(comparer);
        self
    }
}

#[derive(Default)]
struct MemberTable {
    by_name: FxHashMap<String, MemberBinding>,
    order: Vec<String>,
}

pub(crate) struct ClassInfo {
    id: usize,
    foreign_name: String,
    native_identity: &'static str,
    storage: TypeId,
    storage_name: &'static str,
    base: Option<ClassBinding>,
    instantiable: bool,
    copier: Option<Copier>,
    comparer: Option<Comparer>,
    members: RwLock<MemberTable>,
    factories: RwLock<Vec<FactoryBinding>>,
    live: AtomicUsize,
}

/// Registered record of one exposed native class
#[derive(Clone)]
pub struct ClassBinding(Arc<ClassInfo>);

impl ClassBinding {
    pub(crate) fn from_spec<T: Any + Send + Sync>(id: usize, spec: ClassSpec<T>) -> Self {
        let (storage, storage_name) = spec.storage();
        ClassBinding(Arc::new(ClassInfo {
            id,
            foreign_name: spec.foreign_name,
            native_identity: spec.native_identity,
            storage,
            storage_name,
            base: spec.base,
            instantiable: spec.instantiable,
            copier: spec.copier,
            comparer: spec.comparer,
            members: RwLock::new(MemberTable::default()),
            factories: RwLock::new(Vec::new()),
            live: AtomicUsize::new(0),
        }))
    }

    /// Registration index within its registry
    pub fn id(&self) -> usize {
        self.0.id
    }

    /// Foreign-visible class name
    pub fn name(&self) -> &str {
        &self.0.foreign_name
    }

    /// Name of the projected native class
    pub fn native_identity(&self) -> &'static str {
        self.0.native_identity
    }

    /// Rust type held by owned instances
    pub fn storage_name(&self) -> &'static str {
        self.0.storage_name
    }

    /// Direct base class
    pub fn base(&self) -> Option<&ClassBinding> {
        self.0.base.as_ref()
    }

    /// Check if the class may be constructed directly
    pub fn is_instantiable(&self) -> bool {
        self.0.instantiable
    }

    /// Check if instances may be duplicated
    pub fn is_copyable(&self) -> bool {
        self.0.copier.is_some()
    }

    /// Check if instances compare by content
    pub fn is_comparable(&self) -> bool {
        self.0.comparer.is_some()
    }

    /// Check if two bindings are the same registered record
    pub fn same_as(&self, other: &ClassBinding) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// `is-a`: true when `other` is this class or one of its bases
    pub fn is_a(&self, other: &ClassBinding) -> bool {
        self.ancestors().any(|class| class.same_as(other))
    }

    /// This class followed by its bases, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &ClassBinding> {
        std::iter::successors(Some(self), |&class| class.base())
    }

    /// Number of owned native instances of this class currently alive
    pub fn live_instances(&self) -> usize {
        self.0.live.load(Ordering::Acquire)
    }

    pub(crate) fn instance_created(&self) {
        self.0.live.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn instance_released(&self) {
        self.0.live.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn stores(&self, native: &dyn Any) -> bool {
        native.type_id() == self.0.storage
    }

    pub(crate) fn copy_native(&self, native: &dyn Any) -> BindResult<NativeBox> {
        let copier = self.0.copier.as_ref().ok_or_else(|| BindError::NonCopyableType {
            class: self.name().to_string(),
        })?;
        copier(native).ok_or_else(|| BindError::mismatch(self.storage_name(), self.name()))
    }

    pub(crate) fn compare_native(&self, a: &dyn Any, b: &dyn Any) -> BindResult<bool> {
        match &self.0.comparer {
            Some(comparer) => comparer(a, b)
                .ok_or_else(|| BindError::mismatch(self.storage_name(), self.name())),
            None => Ok(std::ptr::eq(
                a as *const dyn Any as *const (),
                b as *const dyn Any as *const (),
            )),
        }
    }

    // ========================================================================
    // Members
    // ========================================================================

    pub(crate) fn insert_member(&self, member: MemberBinding) -> BindResult<()> {
        let mut table = self.0.members.write();
        if table.by_name.contains_key(member.name()) {
            return Err(BindError::DuplicateRegistration {
                name: format!("{}.{}", self.name(), member.name()),
            });
        }
        table.order.push(member.name().to_string());
        table.by_name.insert(member.name().to_string(), member);
        Ok(())
    }

    /// Member declared directly on this class
    pub fn own_member(&self, name: &str) -> Option<MemberBinding> {
        self.0.members.read().by_name.get(name).cloned()
    }

    /// Look up a member on this class or the nearest base declaring it
    pub fn find_member(&self, name: &str) -> Option<MemberBinding> {
        self.ancestors().find_map(|class| class.own_member(name))
    }

    /// Like [`find_member`](Self::find_member) but fails with `UnknownMember`
    pub fn member(&self, name: &str) -> BindResult<MemberBinding> {
        self.find_member(name).ok_or_else(|| BindError::UnknownMember {
            class: self.name().to_string(),
            member: name.to_string(),
        })
    }

    /// Names of members declared directly on this class, in binding order
    pub fn member_names(&self) -> Vec<String> {
        self.0.members.read().order.clone()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    pub(crate) fn insert_factory(&self, factory: FactoryBinding) {
        self.0.factories.write().push(factory);
    }

    /// Factories bound to this class
    pub fn factories(&self) -> Vec<FactoryBinding> {
        self.0.factories.read().clone()
    }

    /// Construct a new instance from foreign arguments.
    ///
    /// Fails with `AbstractInstantiation` for non-instantiable classes. The
    /// first factory whose arity matches is used.
    pub fn construct(&self, args: &[ForeignValue]) -> BindResult<ObjectRef> {
        if !self.is_instantiable() {
            return Err(BindError::AbstractInstantiation {
                class: self.name().to_string(),
            });
        }
        let factory = self
            .0
            .factories
            .read()
            .iter()
            .find(|factory| factory.arity() == args.len())
            .cloned();
        match factory {
            Some(factory) => factory.invoke(args),
            None => Err(BindError::ArgumentError(format!(
                "no constructor of '{}' takes {} argument(s)",
                self.name(),
                args.len()
            ))),
        }
    }
}

impl std::fmt::Debug for ClassBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassBinding")
            .field("name", &self.name())
            .field("native", &self.native_identity())
            .field("base", &self.base().map(|b| b.name()))
            .field("instantiable", &self.is_instantiable())
            .field("copyable", &self.is_copyable())
            .finish()
    }
}
