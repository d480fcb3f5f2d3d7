//! Object handles: how native instances are held by the embedding runtime
//!
//! An [`ObjectRef`] is either *owned* (the runtime is the sole owner of the
//! native value) or *borrowed* (an internal reference: a strong handle to the
//! owner plus a [`Lens`] that projects into the owner's native state). A
//! borrowed handle keeps its owner alive and every access goes through the
//! owner, so mutations are visible on both sides and a projection that no
//! longer resolves is reported instead of dereferenced.

use std::any::{Any, TypeId};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::class::{ClassBinding, NativeBox};
use crate::error::{BindError, BindResult};
use crate::value::ForeignValue;

type ReadFn = dyn Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync;
type WriteFn = dyn Fn(&mut dyn Any) -> Option<&mut dyn Any> + Send + Sync;

/// Projection from an owner's native value to one of its sub-objects.
#[derive(Clone)]
pub struct Lens {
    read: Arc<ReadFn>,
    write: Arc<WriteFn>,
}

impl Lens {
    /// Build a lens from type-erased read and write projections.
    ///
    /// Either projection returns `None` when the owner no longer contains
    /// the target (wrong type, index out of range after a resize).
    pub fn new<R, W>(read: R, write: W) -> Self
    where
        R: Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync + 'static,
        W: Fn(&mut dyn Any) -> Option<&mut dyn Any> + Send + Sync + 'static,
    {
        Self {
            read: Arc::new(read),
            write: Arc::new(write),
        }
    }

    /// Lens onto a field of a concretely typed owner
    pub fn field<O: Any, T: Any>(read: fn(&O) -> &T, write: fn(&mut O) -> &mut T) -> Self {
        Self::new(
            move |any| any.downcast_ref::<O>().map(|owner| read(owner) as &dyn Any),
            move |any| any.downcast_mut::<O>().map(|owner| write(owner) as &mut dyn Any),
        )
    }

    /// Lens onto an element of a `Vec<T>` owner
    pub fn element<T: Any>(index: usize) -> Self {
        Self::new(
            move |any| {
                any.downcast_ref::<Vec<T>>()
                    .and_then(|items| items.get(index))
                    .map(|item| item as &dyn Any)
            },
            move |any| {
                any.downcast_mut::<Vec<T>>()
                    .and_then(|items| items.get_mut(index))
                    .map(|item| item as &mut dyn Any)
            },
        )
    }
}

/// A reference into the native state of a receiver, typed by its class.
///
/// Accessors produce projections; the member's return policy decides
/// whether the referenced value is copied or handed out as an internal
/// reference.
#[derive(Clone)]
pub struct Projection {
    class: ClassBinding,
    lens: Lens,
}

impl Projection {
    /// Create a projection onto a sub-object of class `class`
    pub fn new(class: &ClassBinding, lens: Lens) -> Self {
        Self {
            class: class.clone(),
            lens,
        }
    }

    /// Class of the projected sub-object
    pub fn class(&self) -> &ClassBinding {
        &self.class
    }
}

enum Storage {
    Owned(RwLock<NativeBox>),
    Borrowed { owner: ObjectRef, projection: Projection },
}

struct ObjectCell {
    class: ClassBinding,
    storage: Storage,
}

impl Drop for ObjectCell {
    fn drop(&mut self) {
        if matches!(self.storage, Storage::Owned(_)) {
            self.class.instance_released();
        }
    }
}

/// Handle to a native instance held by the embedding runtime
#[derive(Clone)]
pub struct ObjectRef {
    inner: Arc<ObjectCell>,
}

/// Non-owning observer of an [`ObjectRef`]
#[derive(Clone)]
pub struct WeakObjectRef {
    inner: Weak<ObjectCell>,
}

impl WeakObjectRef {
    /// Upgrade to a strong handle if the instance is still alive
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.inner.upgrade().map(|inner| ObjectRef { inner })
    }

    /// Check if the instance is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl ObjectRef {
    /// Take ownership of a native value as an instance of `class`.
    ///
    /// Fails with a type mismatch when the value is not the class's storage
    /// type.
    pub fn wrap<T: Any + Send + Sync>(class: &ClassBinding, value: T) -> BindResult<Self> {
        Self::from_box(class, Box::new(value))
    }

    /// Take ownership of an already boxed native value
    pub fn from_box(class: &ClassBinding, native: NativeBox) -> BindResult<Self> {
        let erased: &dyn Any = &*native;
        if !class.stores(erased) {
            return Err(BindError::mismatch(class.storage_name(), class.name()));
        }
        class.instance_created();
        Ok(Self {
            inner: Arc::new(ObjectCell {
                class: class.clone(),
                storage: Storage::Owned(RwLock::new(native)),
            }),
        })
    }

    /// Internal reference into `owner`; keeps the owner alive
    pub(crate) fn borrowed(owner: &ObjectRef, projection: Projection) -> Self {
        Self {
            inner: Arc::new(ObjectCell {
                class: projection.class.clone(),
                storage: Storage::Borrowed {
                    owner: owner.clone(),
                    projection,
                },
            }),
        }
    }

    /// Class of this instance
    pub fn class(&self) -> &ClassBinding {
        &self.inner.class
    }

    /// Check the `is-a` relation against `class` by walking the base chain
    pub fn is_instance(&self, class: &ClassBinding) -> bool {
        self.inner.class.is_a(class)
    }

    /// Check if this handle is an internal reference
    pub fn is_borrowed(&self) -> bool {
        matches!(self.inner.storage, Storage::Borrowed { .. })
    }

    /// Owner of an internal reference
    pub fn owner(&self) -> Option<&ObjectRef> {
        match &self.inner.storage {
            Storage::Borrowed { owner, .. } => Some(owner),
            Storage::Owned(_) => None,
        }
    }

    /// Create a non-owning observer
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Check if both handles refer to the same handle cell
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn stale(&self) -> BindError {
        BindError::StaleReference {
            class: self.inner.class.name().to_string(),
        }
    }

    fn visit(&self, f: &mut dyn FnMut(&dyn Any) -> BindResult<()>) -> BindResult<()> {
        match &self.inner.storage {
            Storage::Owned(cell) => {
                // Re-entered when two views of one owner are read together
                let guard = cell.read_recursive();
                f(&**guard)
            }
            Storage::Borrowed { owner, projection } => owner.visit(&mut |any| {
                let target = (projection.lens.read)(any).ok_or_else(|| self.stale())?;
                f(target)
            }),
        }
    }

    fn visit_mut(&self, f: &mut dyn FnMut(&mut dyn Any) -> BindResult<()>) -> BindResult<()> {
        match &self.inner.storage {
            Storage::Owned(cell) => {
                let mut guard = cell.write();
                f(&mut **guard)
            }
            Storage::Borrowed { owner, projection } => owner.visit_mut(&mut |any| {
                let target = (projection.lens.write)(any).ok_or_else(|| self.stale())?;
                f(target)
            }),
        }
    }

    /// Run `f` against the native value viewed as `T`
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> BindResult<R> {
        let mut f = Some(f);
        let mut out = None;
        self.visit(&mut |any| {
            let native = any
                .downcast_ref::<T>()
                .ok_or_else(|| BindError::mismatch(std::any::type_name::<T>(), self.class().name()))?;
            if let Some(f) = f.take() {
                out = Some(f(native));
            }
            Ok(())
        })?;
        out.ok_or_else(|| self.stale())
    }

    /// Run `f` against the native value viewed as mutable `T`
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> BindResult<R> {
        let mut f = Some(f);
        let mut out = None;
        self.visit_mut(&mut |any| {
            let native = any
                .downcast_mut::<T>()
                .ok_or_else(|| BindError::mismatch(std::any::type_name::<T>(), self.class().name()))?;
            if let Some(f) = f.take() {
                out = Some(f(native));
            }
            Ok(())
        })?;
        out.ok_or_else(|| self.stale())
    }

    /// Address of the native value; internal references report the address
    /// of the sub-object inside their owner.
    pub fn native_address(&self) -> BindResult<usize> {
        let mut address = 0;
        self.visit(&mut |any| {
            address = any as *const dyn Any as *const () as usize;
            Ok(())
        })?;
        Ok(address)
    }

    /// Address and concrete type of the native value
    fn native_identity(&self) -> BindResult<(usize, TypeId)> {
        let mut identity = None;
        self.visit(&mut |any| {
            identity = Some((any as *const dyn Any as *const () as usize, (*any).type_id()));
            Ok(())
        })?;
        identity.ok_or_else(|| self.stale())
    }

    /// Identity comparison by native address and native type.
    ///
    /// A sub-object laid out at its owner's address is not its owner.
    pub fn same_object(&self, other: &ObjectRef) -> BindResult<bool> {
        if self.ptr_eq(other) {
            return Ok(true);
        }
        Ok(self.native_identity()? == other.native_identity()?)
    }

    /// Duplicate the native value into a new, independently owned instance.
    ///
    /// Fails with [`BindError::NonCopyableType`] for non-copyable classes.
    pub fn copy(&self) -> BindResult<ObjectRef> {
        let class = self.inner.class.clone();
        let mut copied = None;
        self.visit(&mut |any| {
            copied = Some(class.copy_native(any)?);
            Ok(())
        })?;
        let native = copied.ok_or_else(|| self.stale())?;
        Self::from_box(&class, native)
    }

    /// Read the projected sub-object and copy it into a new owned instance
    pub(crate) fn copy_projection(&self, projection: &Projection) -> BindResult<ObjectRef> {
        let class = projection.class.clone();
        let mut copied = None;
        self.visit(&mut |any| {
            let target = (projection.lens.read)(any).ok_or_else(|| BindError::StaleReference {
                class: class.name().to_string(),
            })?;
            copied = Some(class.copy_native(target)?);
            Ok(())
        })?;
        let native = copied.ok_or_else(|| self.stale())?;
        Self::from_box(&class, native)
    }

    /// Content equality for comparable classes, identity otherwise
    pub fn equals(&self, other: &ObjectRef) -> BindResult<bool> {
        if self.class().is_comparable() && self.class().name() == other.class().name() {
            let class = self.class().clone();
            let mut result = false;
            self.visit(&mut |a| {
                other.visit(&mut |b| {
                    result = class.compare_native(a, b)?;
                    Ok(())
                })
            })?;
            return Ok(result);
        }
        self.same_object(other)
    }

    /// Read a property (walks the base chain)
    pub fn get(&self, name: &str) -> BindResult<ForeignValue> {
        self.class().member(name)?.get(self)
    }

    /// Write a property (walks the base chain)
    pub fn set(&self, name: &str, value: ForeignValue) -> BindResult<()> {
        self.class().member(name)?.set(self, value)
    }

    /// Invoke a method (walks the base chain)
    pub fn call(&self, name: &str, args: &[ForeignValue]) -> BindResult<ForeignValue> {
        self.class().member(name)?.call(self, args)
    }
}

impl std::fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRef")
            .field("class", &self.inner.class.name())
            .field("borrowed", &self.is_borrowed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassSpec;
    use crate::registry::TypeRegistry;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        left: Vec<i32>,
        right: i32,
    }

    fn pair_class(registry: &mut TypeRegistry) -> ClassBinding {
        registry
            .register_class(ClassSpec::<Pair>::new("Pair").instantiable().copyable().comparable())
            .unwrap()
    }

    fn vec_class(registry: &mut TypeRegistry) -> ClassBinding {
        registry
            .register_class(ClassSpec::<Vec<i32>>::new("IntArray").copyable().comparable())
            .unwrap()
    }

    #[test]
    fn test_wrap_rejects_wrong_storage() {
        let mut registry = TypeRegistry::new();
        let class = pair_class(&mut registry);
        let err = ObjectRef::wrap(&class, 5u8).unwrap_err();
        assert!(matches!(err, BindError::TypeMismatch { .. }));
        assert_eq!(class.live_instances(), 0);
    }

    #[test]
    fn test_with_and_with_mut() {
        let mut registry = TypeRegistry::new();
        let class = pair_class(&mut registry);
        let obj = ObjectRef::wrap(&class, Pair { left: vec![1], right: 2 }).unwrap();

        obj.with_mut(|p: &mut Pair| p.right = 7).unwrap();
        assert_eq!(obj.with(|p: &Pair| p.right).unwrap(), 7);
        assert!(obj.with(|_: &u32| ()).is_err());
    }

    #[test]
    fn test_borrowed_aliases_owner_and_keeps_it_alive() {
        let mut registry = TypeRegistry::new();
        let pair = pair_class(&mut registry);
        let ints = vec_class(&mut registry);

        let owner = ObjectRef::wrap(&pair, Pair { left: vec![1, 2], right: 0 }).unwrap();
        let projection = Projection::new(&ints, Lens::field::<Pair, Vec<i32>>(|p| &p.left, |p| &mut p.left));
        let left = ObjectRef::borrowed(&owner, projection);
        let watcher = owner.downgrade();
        drop(owner);

        assert!(watcher.is_alive());
        left.with_mut(|v: &mut Vec<i32>| v.push(3)).unwrap();
        let owner = watcher.upgrade().unwrap();
        assert_eq!(owner.with(|p: &Pair| p.left.clone()).unwrap(), vec![1, 2, 3]);

        drop(owner);
        drop(left);
        assert!(!watcher.is_alive());
        assert_eq!(pair.live_instances(), 0);
    }

    #[test]
    fn test_stale_element_reference() {
        let mut registry = TypeRegistry::new();
        let ints = vec_class(&mut registry);
        let int = registry
            .register_class(ClassSpec::<i32>::new("Int").copyable())
            .unwrap();

        let array = ObjectRef::wrap(&ints, vec![10, 20]).unwrap();
        let second = ObjectRef::borrowed(&array, Projection::new(&int, Lens::element::<i32>(1)));
        assert_eq!(second.with(|v: &i32| *v).unwrap(), 20);

        array.with_mut(|v: &mut Vec<i32>| v.truncate(1)).unwrap();
        assert!(matches!(second.with(|v: &i32| *v), Err(BindError::StaleReference { .. })));
    }

    #[test]
    fn test_identity_by_native_address() {
        let mut registry = TypeRegistry::new();
        let pair = pair_class(&mut registry);
        let ints = vec_class(&mut registry);
        let owner = ObjectRef::wrap(&pair, Pair { left: vec![], right: 0 }).unwrap();

        let lens = Lens::field::<Pair, Vec<i32>>(|p| &p.left, |p| &mut p.left);
        let a = ObjectRef::borrowed(&owner, Projection::new(&ints, lens.clone()));
        let b = ObjectRef::borrowed(&owner, Projection::new(&ints, lens));
        assert!(!a.ptr_eq(&b));
        assert!(a.same_object(&b).unwrap());
        assert!(!a.same_object(&owner).unwrap());
    }

    #[repr(C)]
    struct Header {
        items: Vec<i32>,
        tag: u8,
    }

    #[test]
    fn test_first_field_view_is_not_its_owner() {
        let mut registry = TypeRegistry::new();
        let header = registry
            .register_class(ClassSpec::<Header>::new("Header"))
            .unwrap();
        let ints = vec_class(&mut registry);
        let owner = ObjectRef::wrap(&header, Header { items: vec![1], tag: 0 }).unwrap();
        let items = ObjectRef::borrowed(
            &owner,
            Projection::new(&ints, Lens::field::<Header, Vec<i32>>(|h| &h.items, |h| &mut h.items)),
        );

        assert_eq!(items.native_address().unwrap(), owner.native_address().unwrap());
        assert!(!items.same_object(&owner).unwrap());
        assert!(!owner.equals(&items).unwrap());
        assert_eq!(owner.with(|h: &Header| h.tag).unwrap(), 0);
    }

    #[test]
    fn test_views_of_one_owner_compare_while_writer_waits() {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let mut registry = TypeRegistry::new();
        let pair = pair_class(&mut registry);
        let ints = vec_class(&mut registry);
        let owner = ObjectRef::wrap(&pair, Pair { left: vec![4], right: 0 }).unwrap();
        let lens = Lens::field::<Pair, Vec<i32>>(|p| &p.left, |p| &mut p.left);
        let a = ObjectRef::borrowed(&owner, Projection::new(&ints, lens.clone()));
        let b = ObjectRef::borrowed(&owner, Projection::new(&ints, lens));

        let (started, wait_started) = mpsc::channel();
        let equal = a
            .with(|_: &Vec<i32>| {
                let writer_owner = owner.clone();
                let writer = thread::spawn(move || {
                    started.send(()).unwrap();
                    writer_owner.with_mut(|p: &mut Pair| p.right = 1).unwrap();
                });
                wait_started.recv().unwrap();
                thread::sleep(Duration::from_millis(50));
                (a.equals(&b).unwrap(), writer)
            })
            .unwrap();
        let (equal, writer) = equal;
        writer.join().unwrap();

        assert!(equal);
        assert_eq!(owner.with(|p: &Pair| p.right).unwrap(), 1);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut registry = TypeRegistry::new();
        let pair = pair_class(&mut registry);
        let original = ObjectRef::wrap(&pair, Pair { left: vec![1], right: 1 }).unwrap();
        let copy = original.copy().unwrap();

        assert!(copy.equals(&original).unwrap());
        original.with_mut(|p: &mut Pair| p.right = 99).unwrap();
        assert_eq!(copy.with(|p: &Pair| p.right).unwrap(), 1);
        assert_eq!(pair.live_instances(), 2);
    }

    #[test]
    fn test_copy_non_copyable_fails() {
        let mut registry = TypeRegistry::new();
        let class = registry
            .register_class(ClassSpec::<String>::new("Handle").instantiable())
            .unwrap();
        let obj = ObjectRef::wrap(&class, "resource".to_string()).unwrap();
        assert_eq!(
            obj.copy().unwrap_err(),
            BindError::NonCopyableType { class: "Handle".to_string() }
        );
    }
}
