//! Conversions between Rust values and [`ForeignValue`]s.
//!
//! Implement `FromForeign` to extract a Rust value from a foreign argument
//! and `IntoForeign` to hand a Rust value back to the runtime. Native class
//! instances are not converted here; they travel as [`ObjectRef`] handles.

use crate::enums::EnumValue;
use crate::error::{BindError, BindResult};
use crate::object::ObjectRef;
use crate::value::ForeignValue;

/// Extract a Rust value from a foreign value
pub trait FromForeign: Sized {
    /// Convert, failing with a type mismatch
    fn from_foreign(value: &ForeignValue) -> BindResult<Self>;
}

/// Convert a Rust value into a foreign value
pub trait IntoForeign {
    /// Convert into a value owned by the runtime
    fn into_foreign(self) -> ForeignValue;
}

impl FromForeign for bool {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        value
            .as_bool()
            .ok_or_else(|| BindError::mismatch("bool", value.type_name()))
    }
}

impl FromForeign for i64 {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        value
            .as_int()
            .ok_or_else(|| BindError::mismatch("int", value.type_name()))
    }
}

impl FromForeign for i32 {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        let wide = i64::from_foreign(value)?;
        i32::try_from(wide).map_err(|_| BindError::ArgumentError(format!("{} is out of range for i32", wide)))
    }
}

impl FromForeign for usize {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        let wide = i64::from_foreign(value)?;
        usize::try_from(wide).map_err(|_| BindError::ArgumentError(format!("{} is not a valid index", wide)))
    }
}

impl FromForeign for f64 {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        value
            .as_float()
            .ok_or_else(|| BindError::mismatch("float", value.type_name()))
    }
}

impl FromForeign for f32 {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        f64::from_foreign(value).map(|v| v as f32)
    }
}

impl FromForeign for String {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BindError::mismatch("str", value.type_name()))
    }
}

impl FromForeign for ObjectRef {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        value.expect_object("object").cloned()
    }
}

impl FromForeign for EnumValue {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        value
            .as_enum()
            .cloned()
            .ok_or_else(|| BindError::mismatch("enum", value.type_name()))
    }
}

impl FromForeign for ForeignValue {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromForeign> FromForeign for Vec<T> {
    fn from_foreign(value: &ForeignValue) -> BindResult<Self> {
        value
            .as_list()
            .ok_or_else(|| BindError::mismatch("list", value.type_name()))?
            .iter()
            .map(T::from_foreign)
            .collect()
    }
}

impl IntoForeign for ForeignValue {
    fn into_foreign(self) -> ForeignValue {
        self
    }
}

impl IntoForeign for () {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::Null
    }
}

impl IntoForeign for bool {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::Bool(self)
    }
}

impl IntoForeign for i64 {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::Int(self)
    }
}

impl IntoForeign for i32 {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::Int(self as i64)
    }
}

/// Counts and indices; values past `i64::MAX` have no foreign int
impl TryFrom<usize> for ForeignValue {
    type Error = BindError;

    fn try_from(count: usize) -> BindResult<Self> {
        i64::try_from(count)
            .map(ForeignValue::Int)
            .map_err(|_| BindError::ArgumentError(format!("{} does not fit a foreign int", count)))
    }
}

impl IntoForeign for f64 {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::Float(self)
    }
}

impl IntoForeign for f32 {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::Float(self as f64)
    }
}

impl IntoForeign for String {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::Str(self)
    }
}

impl IntoForeign for &str {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::Str(self.to_string())
    }
}

impl IntoForeign for ObjectRef {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::Object(self)
    }
}

impl IntoForeign for EnumValue {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::Enum(self)
    }
}

impl<T: IntoForeign> IntoForeign for Vec<T> {
    fn into_foreign(self) -> ForeignValue {
        ForeignValue::List(self.into_iter().map(IntoForeign::into_foreign).collect())
    }
}

impl<T: IntoForeign> IntoForeign for Option<T> {
    fn into_foreign(self) -> ForeignValue {
        self.map_or(ForeignValue::Null, IntoForeign::into_foreign)
    }
}

/// Convert the argument at `index`, failing when it is missing
pub fn arg<T: FromForeign>(args: &[ForeignValue], index: usize) -> BindResult<T> {
    let value = args
        .get(index)
        .ok_or_else(|| BindError::ArgumentError(format!("missing argument {}", index)))?;
    T::from_foreign(value)
}

/// Convert the argument at `index`, or `default` when it is absent or null
pub fn arg_or<T: FromForeign>(args: &[ForeignValue], index: usize, default: T) -> BindResult<T> {
    match args.get(index) {
        None | Some(ForeignValue::Null) => Ok(default),
        Some(value) => T::from_foreign(value),
    }
}

/// Fail unless exactly `count` arguments were passed
pub fn expect_args(args: &[ForeignValue], count: usize) -> BindResult<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(BindError::ArgumentError(format!(
            "expected {} argument(s), got {}",
            count,
            args.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(i32::from_foreign(&ForeignValue::Int(7)).unwrap(), 7);
        assert_eq!(f32::from_foreign(&ForeignValue::Int(2)).unwrap(), 2.0);
        assert!(matches!(
            i32::from_foreign(&ForeignValue::Int(i64::MAX)),
            Err(BindError::ArgumentError(_))
        ));
        assert!(matches!(
            usize::from_foreign(&ForeignValue::Int(-1)),
            Err(BindError::ArgumentError(_))
        ));
        assert_eq!(
            bool::from_foreign(&ForeignValue::Int(1)).unwrap_err(),
            BindError::mismatch("bool", "int")
        );
    }

    #[test]
    fn test_usize_into_foreign_is_checked() {
        assert_eq!(ForeignValue::try_from(4096usize).unwrap(), ForeignValue::Int(4096));
        assert!(matches!(
            ForeignValue::try_from(usize::MAX),
            Err(BindError::ArgumentError(_))
        ));
    }

    #[test]
    fn test_list_conversion() {
        let list = ForeignValue::List(vec![ForeignValue::Float(1.5), ForeignValue::Int(2)]);
        assert_eq!(Vec::<f64>::from_foreign(&list).unwrap(), vec![1.5, 2.0]);
        assert_eq!(vec![1i64, 2].into_foreign(), ForeignValue::List(vec![ForeignValue::Int(1), ForeignValue::Int(2)]));
    }

    #[test]
    fn test_arg_helpers() {
        let args = [ForeignValue::Int(3), ForeignValue::Null];
        assert_eq!(arg::<i64>(&args, 0).unwrap(), 3);
        assert!(matches!(arg::<i64>(&args, 5), Err(BindError::ArgumentError(_))));
        assert!(arg_or(&args, 1, true).unwrap());
        assert!(!arg_or(&args, 2, false).unwrap());
        assert!(expect_args(&args, 2).is_ok());
        assert!(expect_args(&args, 1).is_err());
    }

    #[test]
    fn test_option_into_foreign() {
        assert!(None::<i64>.into_foreign().is_null());
        assert_eq!(Some("x").into_foreign(), ForeignValue::Str("x".to_string()));
    }
}
