//! Constructor adapter for factories that build native instances
//!
//! A factory is a native construction routine plus the parameters it takes.
//! Reference parameters must be instances of a declared class (or a class
//! derived from it); they are lent to the routine for the duration of the
//! call and never retained by the binding layer.

use std::sync::Arc;

use crate::class::{ClassBinding, NativeBox};
use crate::error::{BindError, BindResult};
use crate::object::ObjectRef;
use crate::value::ForeignValue;

/// Native construction routine
pub type BuildFn = Arc<dyn Fn(&[ForeignValue]) -> BindResult<NativeBox> + Send + Sync>;

/// One factory parameter
#[derive(Clone, Debug)]
pub enum ParamSpec {
    /// Plain value; the routine validates it
    Value {
        /// Parameter name
        name: String,
    },
    /// Reference to an instance of `class` or a class derived from it
    Reference {
        /// Parameter name
        name: String,
        /// Required class
        class: ClassBinding,
    },
}

impl ParamSpec {
    /// Plain value parameter
    pub fn value(name: impl Into<String>) -> Self {
        ParamSpec::Value { name: name.into() }
    }

    /// Reference parameter requiring an instance of `class`
    pub fn reference(name: impl Into<String>, class: &ClassBinding) -> Self {
        ParamSpec::Reference {
            name: name.into(),
            class: class.clone(),
        }
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        match self {
            ParamSpec::Value { name } | ParamSpec::Reference { name, .. } => name,
        }
    }

    fn check(&self, arg: &ForeignValue) -> BindResult<()> {
        match self {
            ParamSpec::Value { .. } => Ok(()),
            ParamSpec::Reference { class, .. } => {
                let obj = arg.expect_object(class.name())?;
                if obj.is_instance(class) {
                    Ok(())
                } else {
                    Err(BindError::mismatch(class.name(), obj.class().name()))
                }
            }
        }
    }
}

/// Declaration of a factory to bind
pub struct FactorySpec {
    pub(crate) build: BuildFn,
    pub(crate) params: Vec<ParamSpec>,
}

impl FactorySpec {
    /// Factory backed by `build`
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&[ForeignValue]) -> BindResult<NativeBox> + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(build),
            params: Vec::new(),
        }
    }

    /// Append a parameter
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }
}

struct FactoryInfo {
    target: ClassBinding,
    params: Vec<ParamSpec>,
    build: BuildFn,
}

/// A factory bound to its target class
#[derive(Clone)]
pub struct FactoryBinding(Arc<FactoryInfo>);

impl FactoryBinding {
    pub(crate) fn new(target: &ClassBinding, spec: FactorySpec) -> Self {
        FactoryBinding(Arc::new(FactoryInfo {
            target: target.clone(),
            params: spec.params,
            build: spec.build,
        }))
    }

    /// Class produced by this factory
    pub fn target(&self) -> &ClassBinding {
        &self.0.target
    }

    /// Declared parameters
    pub fn params(&self) -> &[ParamSpec] {
        &self.0.params
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.0.params.len()
    }

    /// Validate arguments, run the routine and wrap the result as an owned
    /// instance of the target class.
    ///
    /// Validation happens before the routine runs, so a rejected call has no
    /// native side effects.
    pub fn invoke(&self, args: &[ForeignValue]) -> BindResult<ObjectRef> {
        let target = &self.0.target;
        if args.len() != self.arity() {
            return Err(BindError::ArgumentError(format!(
                "'{}' expects {} argument(s), got {}",
                target.name(),
                self.arity(),
                args.len()
            )));
        }
        for (param, arg) in self.0.params.iter().zip(args) {
            param.check(arg)?;
        }

        let native = (self.0.build)(args)?;
        let instance = ObjectRef::from_box(target, native)?;
        log::trace!("constructed {} ({} live)", target.name(), target.live_instances());
        Ok(instance)
    }
}

impl std::fmt::Debug for FactoryBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryBinding")
            .field("target", &self.0.target.name())
            .field(
                "params",
                &self.0.params.iter().map(ParamSpec::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Map a native allocation failure into the binding layer's error
pub fn allocation_failure(err: impl std::fmt::Display) -> BindError {
    BindError::AllocationFailure(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassSpec;
    use crate::registry::TypeRegistry;

    #[derive(Debug)]
    struct Config {
        pool: usize,
    }

    #[derive(Debug)]
    struct Engine {
        pool: usize,
    }

    struct Fixture {
        registry: TypeRegistry,
        config: ClassBinding,
        derived: ClassBinding,
        engine: ClassBinding,
    }

    fn fixture() -> Fixture {
        let mut registry = TypeRegistry::new();
        let config = registry
            .register_class(ClassSpec::<Config>::new("Config").instantiable())
            .unwrap();
        let derived = registry
            .register_class(ClassSpec::<Config>::new("DerivedConfig").base(&config).instantiable())
            .unwrap();
        let engine = registry
            .register_class(ClassSpec::<Engine>::new("Engine").instantiable())
            .unwrap();
        registry
            .bind_factory(
                &engine,
                FactorySpec::new(|args| {
                    let pool = args[0].expect_object("Config")?.with(|c: &Config| c.pool)?;
                    let mut slots: Vec<u8> = Vec::new();
                    slots.try_reserve(pool).map_err(allocation_failure)?;
                    Ok(Box::new(Engine { pool }) as NativeBox)
                })
                .param(ParamSpec::reference("config", &config)),
            )
            .unwrap();
        Fixture {
            registry,
            config,
            derived,
            engine,
        }
    }

    #[test]
    fn test_reference_param_accepts_derived() {
        let f = fixture();
        let config = ObjectRef::wrap(&f.derived, Config { pool: 8 }).unwrap();
        let engine = f.engine.construct(&[ForeignValue::Object(config)]).unwrap();
        assert_eq!(engine.with(|e: &Engine| e.pool).unwrap(), 8);
        assert_eq!(f.engine.live_instances(), 1);
        assert!(f.registry.class("Engine").is_some());
    }

    #[test]
    fn test_reference_param_rejects_unrelated() {
        let f = fixture();
        let wrong = ObjectRef::wrap(&f.engine, Engine { pool: 1 }).unwrap();
        assert_eq!(
            f.engine.construct(&[ForeignValue::Object(wrong.clone())]).unwrap_err(),
            BindError::mismatch("Config", "Engine")
        );
        assert_eq!(
            f.engine.construct(&[ForeignValue::Int(3)]).unwrap_err(),
            BindError::mismatch("Config", "int")
        );
        assert_eq!(f.engine.live_instances(), 1);
        drop(wrong);
        assert_eq!(f.engine.live_instances(), 0);
    }

    #[test]
    fn test_allocation_failure_surfaces() {
        let f = fixture();
        let config = ObjectRef::wrap(&f.config, Config { pool: usize::MAX }).unwrap();
        let err = f.engine.construct(&[ForeignValue::Object(config)]).unwrap_err();
        assert!(matches!(err, BindError::AllocationFailure(_)));
        assert_eq!(f.engine.live_instances(), 0);
    }

    #[test]
    fn test_arity_mismatch() {
        let f = fixture();
        let factory = &f.engine.factories()[0];
        assert_eq!(factory.arity(), 1);
        assert_eq!(factory.params()[0].name(), "config");
        assert!(matches!(factory.invoke(&[]), Err(BindError::ArgumentError(_))));
    }
}
