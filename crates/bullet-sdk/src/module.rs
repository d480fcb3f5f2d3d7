//! Module assembly into a foreign-loadable module object
//!
//! A [`ModuleBuilder`] collects type registrations, free functions and
//! module-scope constants. [`ModuleBuilder::build`] seals the registry and
//! publishes the values of every enum that asked for module-scope export,
//! producing an immutable [`ForeignModule`].

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::class::ClassBinding;
use crate::enums::EnumBinding;
use crate::error::{BindError, BindResult};
use crate::registry::{TypeEntry, TypeRegistry};
use crate::value::ForeignValue;

/// A free function exposed at module scope
pub type ModuleFn = Arc<dyn Fn(&[ForeignValue]) -> BindResult<ForeignValue> + Send + Sync>;

/// Registry of free functions indexed by name
#[derive(Default, Clone)]
pub struct FunctionTable {
    handlers: FxHashMap<String, ModuleFn>,
}

impl FunctionTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function by name, replacing any previous one
    pub fn register(
        &mut self,
        name: &str,
        handler: impl Fn(&[ForeignValue]) -> BindResult<ForeignValue> + Send + Sync + 'static,
    ) {
        self.handlers.insert(name.to_string(), Arc::new(handler));
    }

    /// Get a handler by name
    pub fn get(&self, name: &str) -> Option<ModuleFn> {
        self.handlers.get(name).cloned()
    }

    /// Check if a handler is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTable")
            .field("functions", &self.names())
            .finish()
    }
}

/// Module under construction
#[derive(Debug)]
pub struct ModuleBuilder {
    name: String,
    version: String,
    registry: TypeRegistry,
    functions: FunctionTable,
    constants: Vec<(String, ForeignValue)>,
    export_enum_values: bool,
}

impl ModuleBuilder {
    /// Start a module.
    ///
    /// # Arguments
    /// * `name` - Module name as the runtime imports it (e.g. "bullet")
    /// * `version` - Semantic version (e.g. "0.1.0")
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            registry: TypeRegistry::new(),
            functions: FunctionTable::new(),
            constants: Vec::new(),
            export_enum_values: true,
        }
    }

    /// Whether enums that request it publish their labels at module scope
    pub fn export_enum_values(mut self, enabled: bool) -> Self {
        self.export_enum_values = enabled;
        self
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry being populated
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Registry being populated, for registration
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// A class some earlier exporter registered
    pub fn class(&self, name: &str) -> BindResult<ClassBinding> {
        self.registry.class(name).cloned().ok_or_else(|| {
            BindError::ArgumentError(format!("'{}' must be registered before it is used", name))
        })
    }

    /// An enum some earlier exporter registered
    pub fn enumeration(&self, name: &str) -> BindResult<EnumBinding> {
        self.registry.enumeration(name).cloned().ok_or_else(|| {
            BindError::ArgumentError(format!("'{}' must be registered before it is used", name))
        })
    }

    /// Register a free function
    pub fn function(
        &mut self,
        name: &str,
        handler: impl Fn(&[ForeignValue]) -> BindResult<ForeignValue> + Send + Sync + 'static,
    ) -> BindResult<()> {
        if self.functions.contains(name) {
            return Err(BindError::DuplicateRegistration {
                name: name.to_string(),
            });
        }
        self.functions.register(name, handler);
        Ok(())
    }

    /// Publish a module-scope constant
    pub fn constant(&mut self, name: impl Into<String>, value: ForeignValue) -> BindResult<()> {
        let name = name.into();
        if self.constants.iter().any(|(existing, _)| *existing == name) {
            return Err(BindError::DuplicateRegistration { name });
        }
        self.constants.push((name, value));
        Ok(())
    }

    /// Seal the registry and freeze the module
    pub fn build(mut self) -> BindResult<ForeignModule> {
        if self.export_enum_values {
            let exported: Vec<EnumBinding> = self
                .registry
                .enums()
                .filter(|binding| binding.exports_values())
                .cloned()
                .collect();
            for binding in exported {
                for (label, bits) in binding.labels() {
                    self.constant(label, binding.from_bits(bits).into())?;
                }
            }
        }

        let mut constants = FxHashMap::default();
        let mut constant_order = Vec::with_capacity(self.constants.len());
        for (name, value) in self.constants {
            if self.registry.contains(&name) || self.functions.contains(&name) {
                return Err(BindError::DuplicateRegistration { name });
            }
            constant_order.push(name.clone());
            constants.insert(name, value);
        }
        for name in self.functions.names() {
            if self.registry.contains(name) {
                return Err(BindError::DuplicateRegistration {
                    name: name.to_string(),
                });
            }
        }

        self.registry.seal();
        log::debug!(
            "built module {} {} ({} types, {} functions, {} constants)",
            self.name,
            self.version,
            self.registry.len(),
            self.functions.len(),
            constant_order.len()
        );
        Ok(ForeignModule {
            name: self.name,
            version: self.version,
            registry: self.registry,
            functions: self.functions,
            constants,
            constant_order,
        })
    }
}

/// Anything a module exposes under a name
#[derive(Clone)]
pub enum ModuleAttr<'a> {
    /// Class or enum
    Type(&'a TypeEntry),
    /// Free function
    Function(ModuleFn),
    /// Module-scope constant
    Constant(&'a ForeignValue),
}

/// An assembled, immutable module
pub struct ForeignModule {
    name: String,
    version: String,
    registry: TypeRegistry,
    functions: FunctionTable,
    constants: FxHashMap<String, ForeignValue>,
    constant_order: Vec<String>,
}

impl ForeignModule {
    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The sealed type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Look up a class by foreign name
    pub fn class(&self, name: &str) -> Option<&ClassBinding> {
        self.registry.class(name)
    }

    /// Look up an enum by foreign name
    pub fn enumeration(&self, name: &str) -> Option<&EnumBinding> {
        self.registry.enumeration(name)
    }

    /// Look up a module-scope constant
    pub fn constant(&self, name: &str) -> Option<&ForeignValue> {
        self.constants.get(name)
    }

    /// Constant names in publication order
    pub fn constant_names(&self) -> impl Iterator<Item = &str> {
        self.constant_order.iter().map(|s| s.as_str())
    }

    /// Free function names
    pub fn function_names(&self) -> Vec<&str> {
        self.functions.names()
    }

    /// Resolve any module-scope name
    pub fn attr(&self, name: &str) -> Option<ModuleAttr<'_>> {
        if let Some(entry) = self.registry.get(name) {
            return Some(ModuleAttr::Type(entry));
        }
        if let Some(handler) = self.functions.get(name) {
            return Some(ModuleAttr::Function(handler));
        }
        self.constants.get(name).map(ModuleAttr::Constant)
    }

    /// Call a free function
    pub fn call(&self, name: &str, args: &[ForeignValue]) -> BindResult<ForeignValue> {
        let handler = self.functions.get(name).ok_or_else(|| BindError::UnknownMember {
            class: self.name.clone(),
            member: name.to_string(),
        })?;
        handler(args)
    }

    /// Construct an instance of the named class
    pub fn construct(&self, class: &str, args: &[ForeignValue]) -> BindResult<crate::ObjectRef> {
        let binding = self.class(class).ok_or_else(|| BindError::UnknownMember {
            class: self.name.clone(),
            member: class.to_string(),
        })?;
        binding.construct(args)
    }
}

impl std::fmt::Debug for ForeignModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignModule")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("types", &self.registry.len())
            .field("functions", &self.functions)
            .field("constants", &self.constant_order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassSpec;
    use crate::enums::EnumSpec;

    fn sample() -> ModuleBuilder {
        let mut builder = ModuleBuilder::new("sample", "1.0.0");
        builder
            .registry_mut()
            .export_enum(
                EnumSpec::new("Flags")
                    .value("A", 1)
                    .value("B", 2)
                    .bitflag()
                    .export_values(),
            )
            .unwrap();
        builder
            .registry_mut()
            .register_class(ClassSpec::<u8>::new("Thing"))
            .unwrap();
        builder
            .function("hello", |_| Ok(ForeignValue::Str("hi".to_string())))
            .unwrap();
        builder
    }

    #[test]
    fn test_build_publishes_enum_values() {
        let module = sample().build().unwrap();
        assert_eq!(module.name(), "sample");
        assert!(module.registry().is_sealed());
        let a = module.constant("A").unwrap().as_enum().unwrap().clone();
        assert_eq!(a, module.enumeration("Flags").unwrap().value("A").unwrap());
        assert_eq!(module.constant_names().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_enum_value_export_can_be_disabled() {
        let module = sample().export_enum_values(false).build().unwrap();
        assert!(module.constant("A").is_none());
        assert!(module.enumeration("Flags").is_some());
    }

    #[test]
    fn test_attr_resolution() {
        let module = sample().build().unwrap();
        assert!(matches!(module.attr("Thing"), Some(ModuleAttr::Type(_))));
        assert!(matches!(module.attr("hello"), Some(ModuleAttr::Function(_))));
        assert!(matches!(module.attr("B"), Some(ModuleAttr::Constant(_))));
        assert!(module.attr("missing").is_none());
        assert_eq!(
            module.call("hello", &[]).unwrap(),
            ForeignValue::Str("hi".to_string())
        );
    }

    #[test]
    fn test_constant_colliding_with_type() {
        let mut builder = sample();
        builder.constant("Thing", ForeignValue::Int(1)).unwrap();
        assert_eq!(
            builder.build().unwrap_err(),
            BindError::DuplicateRegistration { name: "Thing".to_string() }
        );
    }

    #[test]
    fn test_missing_dependency_reported() {
        let builder = sample();
        assert!(builder.class("Thing").is_ok());
        assert!(matches!(builder.class("Other"), Err(BindError::ArgumentError(_))));
        assert!(builder.enumeration("Flags").is_ok());
    }

    #[test]
    fn test_duplicate_function() {
        let mut builder = sample();
        assert!(matches!(
            builder.function("hello", |_| Ok(ForeignValue::Null)),
            Err(BindError::DuplicateRegistration { .. })
        ));
    }
}
