//! Type projection registry
//!
//! Maps foreign names to class and enum bindings. Registration happens in
//! dependency order (a base before anything deriving from it) and is closed
//! by [`TypeRegistry::seal`]; after that the registry is read-only.

use std::any::Any;

use rustc_hash::FxHashMap;

use crate::class::{ClassBinding, ClassSpec};
use crate::enums::{EnumBinding, EnumSpec};
use crate::error::{BindError, BindResult};
use crate::factory::{FactoryBinding, FactorySpec};
use crate::member::{MemberBinding, MemberSpec};

/// A registered foreign type
#[derive(Debug, Clone)]
pub enum TypeEntry {
    /// Exposed native class
    Class(ClassBinding),
    /// Exported enum
    Enum(EnumBinding),
}

impl TypeEntry {
    /// Foreign-visible name
    pub fn name(&self) -> &str {
        match self {
            TypeEntry::Class(class) => class.name(),
            TypeEntry::Enum(binding) => binding.name(),
        }
    }
}

/// Registry of every type exposed by one module
#[derive(Debug)]
pub struct TypeRegistry {
    /// Entries by foreign name
    entries: FxHashMap<String, TypeEntry>,
    /// Foreign names in registration order
    order: Vec<String>,
    class_count: usize,
    sealed: bool,
}

impl TypeRegistry {
    /// Create an empty, open registry
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            order: Vec::new(),
            class_count: 0,
            sealed: false,
        }
    }

    fn admit(&self, name: &str) -> BindResult<()> {
        if self.sealed {
            return Err(BindError::RegistrySealed {
                name: name.to_string(),
            });
        }
        if self.entries.contains_key(name) {
            return Err(BindError::DuplicateRegistration {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_open(&self, name: &str) -> BindResult<()> {
        if self.sealed {
            Err(BindError::RegistrySealed {
                name: name.to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn ensure_owned(&self, class: &ClassBinding) -> BindResult<()> {
        match self.entries.get(class.name()) {
            Some(TypeEntry::Class(known)) if known.same_as(class) => Ok(()),
            _ => Err(BindError::ArgumentError(format!(
                "'{}' is not registered in this registry",
                class.name()
            ))),
        }
    }

    fn insert(&mut self, entry: TypeEntry) {
        let name = entry.name().to_string();
        self.order.push(name.clone());
        self.entries.insert(name, entry);
    }

    /// Register a class.
    ///
    /// The declared base must already be registered here.
    pub fn register_class<T: Any + Send + Sync>(&mut self, spec: ClassSpec<T>) -> BindResult<ClassBinding> {
        self.admit(&spec.foreign_name)?;
        if let Some(base) = &spec.base {
            match self.entries.get(base.name()) {
                Some(TypeEntry::Class(known)) if known.same_as(base) => {}
                _ => {
                    return Err(BindError::UnregisteredBase {
                        class: spec.foreign_name.clone(),
                        base: base.name().to_string(),
                    })
                }
            }
        }

        let class = ClassBinding::from_spec(self.class_count, spec);
        self.class_count += 1;
        log::debug!(
            "registered class {} (native {}, base {:?})",
            class.name(),
            class.native_identity(),
            class.base().map(|b| b.name())
        );
        self.insert(TypeEntry::Class(class.clone()));
        Ok(class)
    }

    /// Register an enum
    pub fn export_enum(&mut self, spec: EnumSpec) -> BindResult<EnumBinding> {
        self.admit(&spec.name)?;
        let binding = EnumBinding::from_spec(spec)?;
        log::debug!(
            "exported enum {} ({} labels{})",
            binding.name(),
            binding.labels().count(),
            if binding.is_bitflag() { ", bitflag" } else { "" }
        );
        self.insert(TypeEntry::Enum(binding.clone()));
        Ok(binding)
    }

    /// Bind a member on a class registered here
    pub fn bind_member(&mut self, class: &ClassBinding, spec: MemberSpec) -> BindResult<MemberBinding> {
        self.ensure_open(&format!("{}.{}", class.name(), spec.name))?;
        self.ensure_owned(class)?;
        let member = MemberBinding::resolve(class, spec)?;
        class.insert_member(member.clone())?;
        log::trace!("bound {}.{} ({:?})", class.name(), member.name(), member.policy());
        Ok(member)
    }

    /// Bind a factory on a class registered here
    pub fn bind_factory(&mut self, class: &ClassBinding, spec: FactorySpec) -> BindResult<FactoryBinding> {
        self.ensure_open(class.name())?;
        self.ensure_owned(class)?;
        let arity = spec.params.len();
        if class.factories().iter().any(|f| f.arity() == arity) {
            return Err(BindError::DuplicateRegistration {
                name: format!("{}/{}", class.name(), arity),
            });
        }
        let factory = FactoryBinding::new(class, spec);
        class.insert_factory(factory.clone());
        log::trace!("bound factory {}/{}", class.name(), arity);
        Ok(factory)
    }

    /// Close the registry to further registration
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Check if the registry is sealed
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Look up any entry by foreign name
    pub fn get(&self, name: &str) -> Option<&TypeEntry> {
        self.entries.get(name)
    }

    /// Look up a class by foreign name
    pub fn class(&self, name: &str) -> Option<&ClassBinding> {
        match self.entries.get(name) {
            Some(TypeEntry::Class(class)) => Some(class),
            _ => None,
        }
    }

    /// Look up an enum by foreign name
    pub fn enumeration(&self, name: &str) -> Option<&EnumBinding> {
        match self.entries.get(name) {
            Some(TypeEntry::Enum(binding)) => Some(binding),
            _ => None,
        }
    }

    /// Look up a class by native identity
    pub fn class_for_native(&self, identity: &str) -> Option<&ClassBinding> {
        self.classes().find(|class| class.native_identity() == identity)
    }

    /// Check if a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &TypeEntry> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }

    /// Classes in registration order
    pub fn classes(&self) -> impl Iterator<Item = &ClassBinding> {
        self.iter().filter_map(|entry| match entry {
            TypeEntry::Class(class) => Some(class),
            TypeEntry::Enum(_) => None,
        })
    }

    /// Enums in registration order
    pub fn enums(&self) -> impl Iterator<Item = &EnumBinding> {
        self.iter().filter_map(|entry| match entry {
            TypeEntry::Enum(binding) => Some(binding),
            TypeEntry::Class(_) => None,
        })
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
