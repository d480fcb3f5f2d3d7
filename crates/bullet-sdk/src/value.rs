//! The dynamic value that crosses the binding boundary
//!
//! Primitives are carried inline. Native instances travel as [`ObjectRef`]
//! handles and enumerators as [`EnumValue`]s, so every value the embedding
//! runtime sees is either a plain datum or a handle the binding layer
//! controls.

use crate::enums::EnumValue;
use crate::error::{BindError, BindResult};
use crate::object::ObjectRef;

/// A value owned by the embedding runtime
#[derive(Clone, Default)]
pub enum ForeignValue {
    /// Absence of a value (`None` on the foreign side)
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
    /// Enumerator or flag combination
    Enum(EnumValue),
    /// Handle to a native instance
    Object(ObjectRef),
    /// Sequence (foreign list or tuple)
    List(Vec<ForeignValue>),
}

impl ForeignValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, ForeignValue::Null)
    }

    /// Type name for diagnostics; objects report their foreign class name
    pub fn type_name(&self) -> String {
        match self {
            ForeignValue::Null => "null".to_string(),
            ForeignValue::Bool(_) => "bool".to_string(),
            ForeignValue::Int(_) => "int".to_string(),
            ForeignValue::Float(_) => "float".to_string(),
            ForeignValue::Str(_) => "str".to_string(),
            ForeignValue::Enum(e) => e.binding().name().to_string(),
            ForeignValue::Object(o) => o.class().name().to_string(),
            ForeignValue::List(_) => "list".to_string(),
        }
    }

    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ForeignValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ForeignValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a number; integers widen to float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ForeignValue::Float(f) => Some(*f),
            ForeignValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Extract string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ForeignValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract enum value
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            ForeignValue::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Extract object handle
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            ForeignValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Extract list items
    pub fn as_list(&self) -> Option<&[ForeignValue]> {
        match self {
            ForeignValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Extract an object handle or fail with a type mismatch naming `expected`
    pub fn expect_object(&self, expected: &str) -> BindResult<&ObjectRef> {
        self.as_object()
            .ok_or_else(|| BindError::mismatch(expected, self.type_name()))
    }

    /// Content equality for copyable values, identity for everything else
    pub fn equals(&self, other: &ForeignValue) -> BindResult<bool> {
        Ok(match (self, other) {
            (ForeignValue::Null, ForeignValue::Null) => true,
            (ForeignValue::Bool(a), ForeignValue::Bool(b)) => a == b,
            (ForeignValue::Int(a), ForeignValue::Int(b)) => a == b,
            (ForeignValue::Float(_) | ForeignValue::Int(_), ForeignValue::Float(_) | ForeignValue::Int(_)) => {
                self.as_float() == other.as_float()
            }
            (ForeignValue::Str(a), ForeignValue::Str(b)) => a == b,
            (ForeignValue::Enum(a), ForeignValue::Enum(b)) => a == b,
            (ForeignValue::Object(a), ForeignValue::Object(b)) => a.equals(b)?,
            (ForeignValue::List(a), ForeignValue::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.equals(y)? {
                        return Ok(false);
                    }
                }
                true
            }
            _ => false,
        })
    }
}

impl PartialEq for ForeignValue {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or(false)
    }
}

impl std::fmt::Debug for ForeignValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForeignValue::Null => write!(f, "ForeignValue::Null"),
            ForeignValue::Bool(b) => write!(f, "ForeignValue::Bool({})", b),
            ForeignValue::Int(i) => write!(f, "ForeignValue::Int({})", i),
            ForeignValue::Float(x) => write!(f, "ForeignValue::Float({})", x),
            ForeignValue::Str(s) => write!(f, "ForeignValue::Str({:?})", s),
            ForeignValue::Enum(e) => write!(f, "ForeignValue::Enum({:?})", e),
            ForeignValue::Object(o) => write!(f, "ForeignValue::Object({:?})", o),
            ForeignValue::List(items) => f.debug_list().entries(items).finish(),
        }
    }
}

impl From<EnumValue> for ForeignValue {
    fn from(value: EnumValue) -> Self {
        ForeignValue::Enum(value)
    }
}

impl From<ObjectRef> for ForeignValue {
    fn from(value: ObjectRef) -> Self {
        ForeignValue::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_extractors() {
        assert!(ForeignValue::Null.is_null());
        assert_eq!(ForeignValue::Bool(true).as_bool(), Some(true));
        assert_eq!(ForeignValue::Int(42).as_int(), Some(42));
        assert_eq!(ForeignValue::Int(2).as_float(), Some(2.0));
        assert_eq!(ForeignValue::Float(2.5).as_float(), Some(2.5));
        assert_eq!(ForeignValue::Str("a".into()).as_str(), Some("a"));
        assert!(ForeignValue::Float(1.0).as_int().is_none());
    }

    #[test]
    fn test_numeric_equality_widens() {
        assert_eq!(ForeignValue::Int(3), ForeignValue::Float(3.0));
        assert_ne!(ForeignValue::Int(3), ForeignValue::Str("3".into()));
    }

    #[test]
    fn test_list_equality() {
        let a = ForeignValue::List(vec![ForeignValue::Int(1), ForeignValue::Bool(false)]);
        let b = ForeignValue::List(vec![ForeignValue::Int(1), ForeignValue::Bool(false)]);
        let c = ForeignValue::List(vec![ForeignValue::Int(1)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_expect_object_reports_type() {
        let err = ForeignValue::Int(1).expect_object("btVector3").unwrap_err();
        assert_eq!(err, BindError::mismatch("btVector3", "int"));
    }
}
