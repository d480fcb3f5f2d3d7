//! Error types for the binding layer
//!
//! Every error is raised synchronously at the boundary call that caused it
//! and surfaces to the embedding runtime as a foreign exception.

/// Result type for binding calls
pub type BindResult<T> = Result<T, BindError>;

/// Binding layer error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// A class or enum with this foreign name is already registered
    #[error("Duplicate registration: '{name}' is already registered")]
    DuplicateRegistration {
        /// Foreign name that collided
        name: String,
    },

    /// The declared base class is not part of this registry
    #[error("Unregistered base: '{class}' derives from unregistered '{base}'")]
    UnregisteredBase {
        /// Class being registered
        class: String,
        /// Base that was never registered
        base: String,
    },

    /// Attempt to duplicate an instance of a non-copyable class
    #[error("Type '{class}' is non-copyable")]
    NonCopyableType {
        /// Foreign class name
        class: String,
    },

    /// A setter was bound for a member whose value type is non-copyable
    #[error("Invalid setter: '{class}.{member}' holds a non-copyable value")]
    InvalidSetter {
        /// Owner class name
        class: String,
        /// Member name
        member: String,
    },

    /// Write attempt on a read-only member
    #[error("Attribute '{class}.{member}' is read-only")]
    AttributeImmutable {
        /// Owner class name
        class: String,
        /// Member name
        member: String,
    },

    /// Argument or receiver of the wrong runtime type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Native construction failed to allocate
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    /// Direct construction of a class registered as non-instantiable
    #[error("Type '{class}' cannot be instantiated directly")]
    AbstractInstantiation {
        /// Foreign class name
        class: String,
    },

    /// Two labels of one enum share a name
    #[error("Duplicate label '{label}' in enum '{enum_name}'")]
    DuplicateLabel {
        /// Enum name
        enum_name: String,
        /// Colliding label
        label: String,
    },

    /// No member with this name on the class or any of its bases
    #[error("'{class}' has no member '{member}'")]
    UnknownMember {
        /// Class name
        class: String,
        /// Requested member
        member: String,
    },

    /// The requested return policy cannot apply to the accessor
    #[error("Invalid return policy for '{class}.{member}': {reason}")]
    InvalidReturnPolicy {
        /// Owner class name
        class: String,
        /// Member name
        member: String,
        /// Why the policy was rejected
        reason: String,
    },

    /// An internal reference no longer resolves inside its owner
    #[error("Stale reference: '{class}' no longer exists inside its owner")]
    StaleReference {
        /// Class of the referenced sub-object
        class: String,
    },

    /// Registration attempted after the registry was sealed
    #[error("Registry is sealed; cannot register '{name}'")]
    RegistrySealed {
        /// Foreign name of the rejected registration
        name: String,
    },

    /// Invalid argument count or value
    #[error("Argument error: {0}")]
    ArgumentError(String),
}

impl BindError {
    /// Shorthand for a [`BindError::TypeMismatch`]
    pub fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        BindError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}

impl From<String> for BindError {
    fn from(s: String) -> Self {
        BindError::ArgumentError(s)
    }
}

impl From<&str> for BindError {
    fn from(s: &str) -> Self {
        BindError::ArgumentError(s.to_string())
    }
}
