// This module is the vocabulary layer of the backend: opcodes and their
// grammar descriptors, enum/bitmask operand kinds with symbolic names, the
// string codec for embedded literals, and the extended-instruction-set
// tables. Extended instruction sets are module-level imports established by
// OpExtInstImport; the import's string operand names the set, and later
// OpExtInst calls resolve their instruction-number operand against the set's
// name table. The layer also carries the storage-class/address-space mapping
// used when deriving pointer types from the generic IR. Everything here is
// pure data and pure functions with no pass state.

//! SPIR-V-style instruction vocabulary: opcodes, operand kinds, strings and
//! extended instruction sets.

pub mod enums;
pub mod ops;
pub mod strings;

pub use enums::*;
pub use ops::{EnumKind, FixedOp, OpDesc, Opcode, Tail};

/// An extended instruction set importable with `OpExtInstImport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtInstSet {
    OpenclStd,
    GlslStd450,
}

impl ExtInstSet {
    /// Resolve the import name carried by `OpExtInstImport`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "OpenCL.std" => Some(Self::OpenclStd),
            "GLSL.std.450" => Some(Self::GlslStd450),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OpenclStd => "OpenCL.std",
            Self::GlslStd450 => "GLSL.std.450",
        }
    }
}

/// OpenCL.std instruction numbers the backend knows by name.
pub mod opencl_std {
    pub const FABS: i64 = 23;
    pub const FMAX: i64 = 27;
    pub const FMIN: i64 = 28;
    pub const SQRT: i64 = 61;
    pub const VSTORE_HALF_R: i64 = 176;
    pub const VSTORE_HALFN_R: i64 = 178;
    pub const VSTOREA_HALFN_R: i64 = 181;
    pub const PRINTF: i64 = 184;
}

/// GLSL.std.450 instruction numbers the backend knows by name.
pub mod glsl_std450 {
    pub const ROUND: i64 = 1;
    pub const SQRT: i64 = 31;
    pub const FMIN: i64 = 37;
    pub const FMAX: i64 = 40;
    pub const FCLAMP: i64 = 43;
    pub const NORMALIZE: i64 = 69;
}

/// Symbolic name of an extended instruction, if the set's table knows it.
pub fn ext_inst_name(set: ExtInstSet, number: i64) -> Option<&'static str> {
    match set {
        ExtInstSet::OpenclStd => match number {
            opencl_std::FABS => Some("fabs"),
            opencl_std::FMAX => Some("fmax"),
            opencl_std::FMIN => Some("fmin"),
            opencl_std::SQRT => Some("sqrt"),
            opencl_std::VSTORE_HALF_R => Some("vstore_half_r"),
            opencl_std::VSTORE_HALFN_R => Some("vstore_halfn_r"),
            opencl_std::VSTOREA_HALFN_R => Some("vstorea_halfn_r"),
            opencl_std::PRINTF => Some("printf"),
            _ => None,
        },
        ExtInstSet::GlslStd450 => match number {
            glsl_std450::ROUND => Some("Round"),
            glsl_std450::SQRT => Some("Sqrt"),
            glsl_std450::FMIN => Some("FMin"),
            glsl_std450::FMAX => Some("FMax"),
            glsl_std450::FCLAMP => Some("FClamp"),
            glsl_std450::NORMALIZE => Some("Normalize"),
            _ => None,
        },
    }
}

/// OpenCL.std calls whose last operand is a literal rounding mode rather
/// than an id.
pub fn opencl_has_rounding_mode_tail(number: i64) -> bool {
    matches!(
        number,
        opencl_std::VSTORE_HALF_R | opencl_std::VSTORE_HALFN_R | opencl_std::VSTOREA_HALFN_R
    )
}

/// Map a storage class to the generic IR's address-space number.
pub fn storage_class_to_address_space(sc: StorageClass) -> Option<u32> {
    match sc {
        StorageClass::Function => Some(0),
        StorageClass::CrossWorkgroup => Some(1),
        StorageClass::UniformConstant => Some(2),
        StorageClass::Workgroup => Some(3),
        StorageClass::Generic => Some(4),
        StorageClass::Input => Some(7),
        _ => None,
    }
}

/// Map a generic address-space number to its storage class.
pub fn address_space_to_storage_class(addr_space: u32) -> Option<StorageClass> {
    match addr_space {
        0 => Some(StorageClass::Function),
        1 => Some(StorageClass::CrossWorkgroup),
        2 => Some(StorageClass::UniformConstant),
        3 => Some(StorageClass::Workgroup),
        4 => Some(StorageClass::Generic),
        7 => Some(StorageClass::Input),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_inst_set_resolution() {
        assert_eq!(ExtInstSet::from_name("OpenCL.std"), Some(ExtInstSet::OpenclStd));
        assert_eq!(ExtInstSet::from_name("nope"), None);
        assert_eq!(
            ext_inst_name(ExtInstSet::OpenclStd, opencl_std::VSTORE_HALF_R),
            Some("vstore_half_r")
        );
        assert_eq!(ext_inst_name(ExtInstSet::GlslStd450, glsl_std450::FMAX), Some("FMax"));
    }

    #[test]
    fn address_space_mapping_is_inverse() {
        for sc in [
            StorageClass::Function,
            StorageClass::CrossWorkgroup,
            StorageClass::UniformConstant,
            StorageClass::Workgroup,
            StorageClass::Generic,
            StorageClass::Input,
        ] {
            let space = storage_class_to_address_space(sc).unwrap();
            assert_eq!(address_space_to_storage_class(space), Some(sc));
        }
    }
}
