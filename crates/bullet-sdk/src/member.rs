//! Member binder for properties and methods exposed on a class
//!
//! Every member carries a [`ReturnPolicy`] that is resolved once, when the
//! member is bound, and applied to whatever the accessor returns:
//!
//! ```text
//! accessor result      ByValueCopy        ConstRefCopy       InternalRef
//! Returned::Value      passed through     passed through     passed through
//! Returned::Ref        copied             copied             borrowed handle
//! ```
//!
//! A `Returned::Ref` must come from a member that declared its class with
//! [`MemberSpec::returns`], and the projection must be of that class.
//!
//! A reference result that is copied is read through the owner at access
//! time, so the foreign value never aliases native memory. A borrowed
//! handle keeps the receiver alive and writes through to it.

use std::sync::Arc;

use crate::class::ClassBinding;
use crate::error::{BindError, BindResult};
use crate::object::{Lens, ObjectRef, Projection};
use crate::value::ForeignValue;

/// How a member's result reaches the foreign side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnPolicy {
    /// Result copied into a new foreign-owned value
    ByValueCopy,
    /// Accessor yields a reference to stable native state; copied at access
    ConstRefCopy,
    /// Accessor yields a reference handed out as a borrow of the receiver
    InternalRef,
}

/// What an accessor produced, before the return policy is applied
pub enum Returned {
    /// A fresh value
    Value(ForeignValue),
    /// A reference into the receiver's native state
    Ref(Projection),
}

impl Returned {
    /// Fresh value result
    pub fn value(value: impl Into<ForeignValue>) -> Self {
        Returned::Value(value.into())
    }

    /// Reference result onto a sub-object of class `class`
    pub fn reference(class: &ClassBinding, lens: Lens) -> Self {
        Returned::Ref(Projection::new(class, lens))
    }
}

impl From<ForeignValue> for Returned {
    fn from(value: ForeignValue) -> Self {
        Returned::Value(value)
    }
}

/// Property getter
pub type GetterFn = Arc<dyn Fn(&ObjectRef) -> BindResult<Returned> + Send + Sync>;
/// Property setter
pub type SetterFn = Arc<dyn Fn(&ObjectRef, ForeignValue) -> BindResult<()> + Send + Sync>;
/// Method body
pub type MethodFn = Arc<dyn Fn(&ObjectRef, &[ForeignValue]) -> BindResult<Returned> + Send + Sync>;

pub(crate) enum MemberKind {
    Property {
        getter: GetterFn,
        setter: Option<SetterFn>,
    },
    Method(MethodFn),
}

/// Declaration of a member to bind
pub struct MemberSpec {
    pub(crate) name: String,
    pub(crate) kind: MemberKind,
    pub(crate) policy: ReturnPolicy,
    pub(crate) readonly: bool,
    pub(crate) returns: Option<ClassBinding>,
    pub(crate) stray_setter: bool,
}

impl MemberSpec {
    /// Declare a property with the given getter (ByValueCopy by default)
    pub fn property<G>(name: impl Into<String>, getter: G) -> Self
    where
        G: Fn(&ObjectRef) -> BindResult<Returned> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: MemberKind::Property {
                getter: Arc::new(getter),
                setter: None,
            },
            policy: ReturnPolicy::ByValueCopy,
            readonly: false,
            returns: None,
            stray_setter: false,
        }
    }

    /// Declare a method (ByValueCopy by default)
    pub fn method<M>(name: impl Into<String>, body: M) -> Self
    where
        M: Fn(&ObjectRef, &[ForeignValue]) -> BindResult<Returned> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: MemberKind::Method(Arc::new(body)),
            policy: ReturnPolicy::ByValueCopy,
            readonly: false,
            returns: None,
            stray_setter: false,
        }
    }

    /// Attach a setter; only meaningful on properties
    pub fn setter<S>(mut self, setter: S) -> Self
    where
        S: Fn(&ObjectRef, ForeignValue) -> BindResult<()> + Send + Sync + 'static,
    {
        match &mut self.kind {
            MemberKind::Property { setter: slot, .. } => *slot = Some(Arc::new(setter)),
            MemberKind::Method(_) => self.stray_setter = true,
        }
        self
    }

    /// Request a return policy
    pub fn policy(mut self, policy: ReturnPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Declare the class of the value this member returns (and accepts).
    ///
    /// Required for members whose accessor yields [`Returned::Ref`].
    pub fn returns(mut self, class: &ClassBinding) -> Self {
        self.returns = Some(class.clone());
        self
    }

    /// Request read-only access even if a setter is present
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

struct MemberInfo {
    owner: ClassBinding,
    name: String,
    kind: MemberKind,
    requested: ReturnPolicy,
    policy: ReturnPolicy,
    readonly: bool,
    returns: Option<ClassBinding>,
}

/// A member bound on a class, with its policy resolved
#[derive(Clone)]
pub struct MemberBinding(Arc<MemberInfo>);

impl MemberBinding {
    /// Resolve a spec against its owner. Every rule that can be checked
    /// without calling the accessor is checked here.
    pub(crate) fn resolve(owner: &ClassBinding, spec: MemberSpec) -> BindResult<Self> {
        let invalid_policy = |reason: &str| BindError::InvalidReturnPolicy {
            class: owner.name().to_string(),
            member: spec.name.clone(),
            reason: reason.to_string(),
        };

        if spec.stray_setter {
            return Err(BindError::InvalidSetter {
                class: owner.name().to_string(),
                member: spec.name.clone(),
            });
        }

        let returns_copyable = spec.returns.as_ref().map(|class| class.is_copyable());

        if let MemberKind::Property { setter: Some(_), .. } = &spec.kind {
            if returns_copyable == Some(false) {
                return Err(BindError::InvalidSetter {
                    class: owner.name().to_string(),
                    member: spec.name.clone(),
                });
            }
        }

        let policy = match (spec.policy, returns_copyable) {
            (ReturnPolicy::ByValueCopy, Some(false)) => {
                log::warn!(
                    "{}.{} returns non-copyable '{}'; binding as internal reference",
                    owner.name(),
                    spec.name,
                    spec.returns.as_ref().map(|c| c.name()).unwrap_or_default()
                );
                ReturnPolicy::InternalRef
            }
            (ReturnPolicy::ConstRefCopy, Some(false)) => {
                return Err(BindError::NonCopyableType {
                    class: spec
                        .returns
                        .as_ref()
                        .map(|c| c.name().to_string())
                        .unwrap_or_default(),
                });
            }
            (ReturnPolicy::InternalRef, None) => {
                return Err(invalid_policy("an internal reference needs a declared class"));
            }
            (policy, _) => policy,
        };

        let readonly = match &spec.kind {
            MemberKind::Property { setter, .. } => spec.readonly || setter.is_none(),
            MemberKind::Method(_) => true,
        };

        Ok(MemberBinding(Arc::new(MemberInfo {
            owner: owner.clone(),
            name: spec.name,
            kind: spec.kind,
            requested: spec.policy,
            policy,
            readonly,
            returns: spec.returns,
        })))
    }

    /// Foreign-visible member name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Class that declares the member
    pub fn owner(&self) -> &ClassBinding {
        &self.0.owner
    }

    /// Effective return policy
    pub fn policy(&self) -> ReturnPolicy {
        self.0.policy
    }

    /// Policy requested at bind time (may differ after a fallback)
    pub fn requested_policy(&self) -> ReturnPolicy {
        self.0.requested
    }

    /// Check if writes are rejected
    pub fn is_readonly(&self) -> bool {
        self.0.readonly
    }

    /// Check if the member is a method
    pub fn is_method(&self) -> bool {
        matches!(self.0.kind, MemberKind::Method(_))
    }

    /// Declared result class
    pub fn returns(&self) -> Option<&ClassBinding> {
        self.0.returns.as_ref()
    }

    fn check_receiver(&self, receiver: &ObjectRef) -> BindResult<()> {
        if receiver.is_instance(&self.0.owner) {
            Ok(())
        } else {
            Err(BindError::mismatch(self.0.owner.name(), receiver.class().name()))
        }
    }

    /// Reference results must match the class the policy was resolved
    /// against; an undeclared reference could not be resolved at bind time.
    fn apply_policy(&self, receiver: &ObjectRef, returned: Returned) -> BindResult<ForeignValue> {
        match returned {
            Returned::Value(value) => Ok(value),
            Returned::Ref(projection) => {
                let declared = self.0.returns.as_ref().ok_or_else(|| BindError::InvalidReturnPolicy {
                    class: self.0.owner.name().to_string(),
                    member: self.0.name.clone(),
                    reason: format!(
                        "reference to '{}' from a member without a declared class",
                        projection.class().name()
                    ),
                })?;
                if !projection.class().is_a(declared) {
                    return Err(BindError::mismatch(declared.name(), projection.class().name()));
                }
                self.apply_reference(receiver, projection)
            }
        }
    }

    fn apply_reference(&self, receiver: &ObjectRef, projection: Projection) -> BindResult<ForeignValue> {
        match self.0.policy {
            ReturnPolicy::InternalRef => Ok(ForeignValue::Object(ObjectRef::borrowed(receiver, projection))),
            ReturnPolicy::ByValueCopy | ReturnPolicy::ConstRefCopy => {
                Ok(ForeignValue::Object(receiver.copy_projection(&projection)?))
            }
        }
    }

    /// Read the property on `receiver`
    pub fn get(&self, receiver: &ObjectRef) -> BindResult<ForeignValue> {
        self.check_receiver(receiver)?;
        match &self.0.kind {
            MemberKind::Property { getter, .. } => {
                let returned = getter(receiver)?;
                self.apply_policy(receiver, returned)
            }
            MemberKind::Method(_) => Err(BindError::ArgumentError(format!(
                "'{}.{}' is a method; call it instead",
                self.0.owner.name(),
                self.0.name
            ))),
        }
    }

    /// Write the property on `receiver`
    pub fn set(&self, receiver: &ObjectRef, value: ForeignValue) -> BindResult<()> {
        self.check_receiver(receiver)?;
        let setter = match &self.0.kind {
            MemberKind::Property { setter: Some(setter), .. } if !self.0.readonly => setter,
            _ => {
                return Err(BindError::AttributeImmutable {
                    class: self.0.owner.name().to_string(),
                    member: self.0.name.clone(),
                })
            }
        };
        if let (Some(class), ForeignValue::Object(obj)) = (&self.0.returns, &value) {
            if !obj.is_instance(class) {
                return Err(BindError::mismatch(class.name(), obj.class().name()));
            }
        }
        setter(receiver, value)
    }

    /// Invoke the method on `receiver`
    pub fn call(&self, receiver: &ObjectRef, args: &[ForeignValue]) -> BindResult<ForeignValue> {
        self.check_receiver(receiver)?;
        match &self.0.kind {
            MemberKind::Method(body) => {
                let returned = body(receiver, args)?;
                self.apply_policy(receiver, returned)
            }
            MemberKind::Property { .. } => Err(BindError::ArgumentError(format!(
                "'{}.{}' is a property, not a method",
                self.0.owner.name(),
                self.0.name
            ))),
        }
    }
}

impl std::fmt::Debug for MemberBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberBinding")
            .field("owner", &self.0.owner.name())
            .field("name", &self.0.name)
            .field("method", &self.is_method())
            .field("policy", &self.0.policy)
            .field("readonly", &self.0.readonly)
            .finish()
    }
}
