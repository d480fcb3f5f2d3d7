//! Enum exporter
//!
//! Native enumerations become foreign enum types. Each labeled value is an
//! [`EnumValue`] carrying its bits and a handle to its enum. Bit-flag enums
//! additionally support combination by bitwise OR and decomposition into
//! their labeled flags.

use std::sync::Arc;

use crate::error::{BindError, BindResult};

/// Declaration of an enum to export
#[derive(Debug, Clone)]
pub struct EnumSpec {
    pub(crate) name: String,
    pub(crate) labels: Vec<(String, i64)>,
    pub(crate) bitflag: bool,
    pub(crate) export_values: bool,
}

impl EnumSpec {
    /// Declare an enum with no labels
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            bitflag: false,
            export_values: false,
        }
    }

    /// Add a labeled value
    pub fn value(mut self, label: impl Into<String>, value: i64) -> Self {
        self.labels.push((label.into(), value));
        self
    }

    /// Mark the enum as a bit-flag set
    pub fn bitflag(mut self) -> Self {
        self.bitflag = true;
        self
    }

    /// Also publish every label as a module-scope constant
    pub fn export_values(mut self) -> Self {
        self.export_values = true;
        self
    }
}

struct EnumInfo {
    name: String,
    labels: Vec<(String, i64)>,
    bitflag: bool,
    export_values: bool,
}

/// A registered enum
#[derive(Clone)]
pub struct EnumBinding(Arc<EnumInfo>);

impl EnumBinding {
    pub(crate) fn from_spec(spec: EnumSpec) -> BindResult<Self> {
        for (i, (label, _)) in spec.labels.iter().enumerate() {
            if spec.labels[..i].iter().any(|(seen, _)| seen == label) {
                return Err(BindError::DuplicateLabel {
                    enum_name: spec.name.clone(),
                    label: label.clone(),
                });
            }
        }
        Ok(EnumBinding(Arc::new(EnumInfo {
            name: spec.name,
            labels: spec.labels,
            bitflag: spec.bitflag,
            export_values: spec.export_values,
        })))
    }

    /// Foreign-visible enum name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Labels and their values, in declaration order
    pub fn labels(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.labels.iter().map(|(label, bits)| (label.as_str(), *bits))
    }

    /// Check if values combine as bit flags
    pub fn is_bitflag(&self) -> bool {
        self.0.bitflag
    }

    /// Check if labels are published at module scope
    pub fn exports_values(&self) -> bool {
        self.0.export_values
    }

    /// Check if two bindings are the same registered record
    pub fn same_as(&self, other: &EnumBinding) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The enumerator named `label`
    pub fn value(&self, label: &str) -> Option<EnumValue> {
        self.0
            .labels
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, bits)| self.from_bits(*bits))
    }

    /// A value of this enum carrying `bits`
    pub fn from_bits(&self, bits: i64) -> EnumValue {
        EnumValue {
            binding: self.clone(),
            bits,
        }
    }
}

impl std::fmt::Debug for EnumBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnumBinding")
            .field("name", &self.0.name)
            .field("labels", &self.0.labels)
            .field("bitflag", &self.0.bitflag)
            .finish()
    }
}

/// One value of an exported enum
#[derive(Clone)]
pub struct EnumValue {
    binding: EnumBinding,
    bits: i64,
}

impl EnumValue {
    /// Raw integer value
    pub fn bits(&self) -> i64 {
        self.bits
    }

    /// The enum this value belongs to
    pub fn binding(&self) -> &EnumBinding {
        &self.binding
    }

    /// Label exactly matching these bits
    pub fn label(&self) -> Option<&str> {
        self.binding
            .labels()
            .find(|(_, bits)| *bits == self.bits)
            .map(|(label, _)| label)
    }

    /// Bitwise OR of two values of the same bit-flag enum
    pub fn combine(&self, other: &EnumValue) -> BindResult<EnumValue> {
        if !self.binding.same_as(&other.binding) {
            return Err(BindError::mismatch(self.binding.name(), other.binding.name()));
        }
        if !self.binding.is_bitflag() {
            return Err(BindError::ArgumentError(format!(
                "'{}' is not a bit-flag enum",
                self.binding.name()
            )));
        }
        Ok(self.binding.from_bits(self.bits | other.bits))
    }

    /// Check if every bit of `flag` is set
    pub fn contains(&self, flag: &EnumValue) -> bool {
        self.binding.same_as(&flag.binding) && self.bits & flag.bits == flag.bits
    }

    /// Labeled non-zero flags set in this value
    pub fn flags(&self) -> Vec<EnumValue> {
        self.binding
            .labels()
            .filter(|(_, bits)| *bits != 0 && self.bits & bits == *bits)
            .map(|(_, bits)| self.binding.from_bits(bits))
            .collect()
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.binding.same_as(&other.binding) && self.bits == other.bits
    }
}

impl std::fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{}.{}", self.binding.name(), label),
            None => write!(f, "{}({:#x})", self.binding.name(), self.bits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> EnumBinding {
        EnumBinding::from_spec(
            EnumSpec::new("Access")
                .value("NONE", 0)
                .value("READ", 1)
                .value("WRITE", 2)
                .value("EXEC", 4)
                .bitflag(),
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_label() {
        let err = EnumBinding::from_spec(EnumSpec::new("E").value("A", 1).value("A", 2)).unwrap_err();
        assert_eq!(
            err,
            BindError::DuplicateLabel {
                enum_name: "E".to_string(),
                label: "A".to_string()
            }
        );
    }

    #[test]
    fn test_combine_and_decompose() {
        let access = flags();
        let read = access.value("READ").unwrap();
        let exec = access.value("EXEC").unwrap();
        let both = read.combine(&exec).unwrap();

        assert_eq!(both.bits(), 5);
        assert!(both.label().is_none());
        assert!(both.contains(&read));
        assert!(!both.contains(&access.value("WRITE").unwrap()));
        assert_eq!(both.flags(), vec![read, exec]);
        assert!(access.from_bits(0).flags().is_empty());
    }

    #[test]
    fn test_combine_requires_bitflag() {
        let plain = EnumBinding::from_spec(EnumSpec::new("Mode").value("A", 1).value("B", 2)).unwrap();
        let a = plain.value("A").unwrap();
        let b = plain.value("B").unwrap();
        assert!(matches!(a.combine(&b), Err(BindError::ArgumentError(_))));
    }

    #[test]
    fn test_values_of_distinct_enums_differ() {
        let one = flags();
        let other = flags();
        let read = one.value("READ").unwrap();
        assert_ne!(read, other.value("READ").unwrap());
        assert!(matches!(
            read.combine(&other.value("READ").unwrap()),
            Err(BindError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_debug_uses_label() {
        let access = flags();
        assert_eq!(format!("{:?}", access.value("WRITE").unwrap()), "Access.WRITE");
        assert_eq!(format!("{:?}", access.from_bits(3)), "Access(0x3)");
    }
}
