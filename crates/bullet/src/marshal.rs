//! Argument and result marshalling shared by the exporters

use bullet_collision::{NativeError, Transform, Vec3};
use bullet_sdk::{BindError, BindResult, ClassBinding, ForeignValue, ObjectRef};

/// Foreign name of the vector class
pub const VECTOR3: &str = "btVector3";
/// Foreign name of the transform class
pub const TRANSFORM: &str = "btTransform";
/// Foreign name of the vector array class
pub const VECTOR3_ARRAY: &str = "btVector3Array";

/// Map a native collision error into the binding taxonomy
pub fn native_error(err: NativeError) -> BindError {
    match err {
        NativeError::Allocation(inner) => bullet_sdk::allocation_failure(inner),
        exhausted @ NativeError::PoolExhausted { .. } => bullet_sdk::allocation_failure(exhausted),
        other => BindError::ArgumentError(other.to_string()),
    }
}

fn read<T: Copy + 'static>(value: &ForeignValue, expected: &str) -> BindResult<T> {
    let obj = value.expect_object(expected)?;
    match obj.with(|native: &T| *native) {
        Err(BindError::TypeMismatch { .. }) => Err(BindError::mismatch(expected, obj.class().name())),
        other => other,
    }
}

/// Read a `btVector3` argument
pub fn vector(value: &ForeignValue) -> BindResult<Vec3> {
    read(value, VECTOR3)
}

/// Read a `btTransform` argument
pub fn transform(value: &ForeignValue) -> BindResult<Transform> {
    read(value, TRANSFORM)
}

/// Read a sequence of vectors: a list of `btVector3` or a `btVector3Array`
pub fn vectors(value: &ForeignValue) -> BindResult<Vec<Vec3>> {
    match value {
        ForeignValue::List(items) => items.iter().map(vector).collect(),
        ForeignValue::Object(obj) => match obj.with(|points: &Vec<Vec3>| points.clone()) {
            Err(BindError::TypeMismatch { .. }) => {
                Err(BindError::mismatch(VECTOR3_ARRAY, obj.class().name()))
            }
            other => other,
        },
        other => Err(BindError::mismatch(VECTOR3_ARRAY, other.type_name())),
    }
}

/// Overwrite a `btVector3` passed as an out-parameter
pub fn store_vector(target: &ForeignValue, value: Vec3) -> BindResult<()> {
    let obj = target.expect_object(VECTOR3)?;
    match obj.with_mut(|native: &mut Vec3| *native = value) {
        Err(BindError::TypeMismatch { .. }) => Err(BindError::mismatch(VECTOR3, obj.class().name())),
        other => other,
    }
}

/// Wrap a native value as a new, foreign-owned instance of `class`
pub fn owned<T: std::any::Any + Send + Sync>(class: &ClassBinding, value: T) -> BindResult<ForeignValue> {
    ObjectRef::wrap(class, value).map(ForeignValue::Object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bullet_sdk::{ClassSpec, TypeRegistry};

    fn classes() -> (ClassBinding, ClassBinding) {
        let mut registry = TypeRegistry::new();
        let vector = registry
            .register_class(ClassSpec::<Vec3>::new(VECTOR3).copyable())
            .unwrap();
        let array = registry
            .register_class(ClassSpec::<Vec<Vec3>>::new(VECTOR3_ARRAY).copyable())
            .unwrap();
        (vector, array)
    }

    #[test]
    fn test_vector_round_trip_through_out_parameter() {
        let (vector_class, _) = classes();
        let out = owned(&vector_class, Vec3::ZERO).unwrap();
        store_vector(&out, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(vector(&out).unwrap(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_vector_rejects_other_classes() {
        let (_, array_class) = classes();
        let array = owned(&array_class, vec![Vec3::ONE]).unwrap();
        assert_eq!(vector(&array).unwrap_err(), BindError::mismatch(VECTOR3, VECTOR3_ARRAY));
        assert_eq!(
            vector(&ForeignValue::Float(1.0)).unwrap_err(),
            BindError::mismatch(VECTOR3, "float")
        );
    }

    #[test]
    fn test_vectors_from_list_or_array() {
        let (vector_class, array_class) = classes();
        let list = ForeignValue::List(vec![
            owned(&vector_class, Vec3::X).unwrap(),
            owned(&vector_class, Vec3::Y).unwrap(),
        ]);
        assert_eq!(vectors(&list).unwrap(), vec![Vec3::X, Vec3::Y]);

        let array = owned(&array_class, vec![Vec3::Z]).unwrap();
        assert_eq!(vectors(&array).unwrap(), vec![Vec3::Z]);
        assert!(vectors(&ForeignValue::Int(0)).is_err());
    }

    #[test]
    fn test_native_error_mapping() {
        let alloc = Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err();
        assert!(matches!(
            native_error(NativeError::Allocation(alloc)),
            BindError::AllocationFailure(_)
        ));
        assert!(matches!(
            native_error(NativeError::IndexOutOfRange { index: 3, len: 1 }),
            BindError::ArgumentError(_)
        ));
    }
}
