// This module defines the enumerated and bitmask operand vocabularies of the
// SPIR-V-style instruction format together with their symbolic name tables.
// Plain enums (storage classes, decorations, built-ins, scopes, rounding
// modes, linkage types and so on) are generated through the spv_enum! macro,
// which produces the repr(u32) enum, a from_u32 lookup for decoding immediate
// operands, and a name table for the textual printer. Bitmask operands
// (memory operands, image operands, fast-math flags, function control) are
// generated through spv_bitmask!, which exposes the individual bit constants
// and renders a set of bits as names joined with '|'. The printer resolves
// every enum/bitmask immediate through these tables so output never shows a
// raw number for a known operand kind.

//! Enum and bitmask operand kinds with symbolic name tables.

macro_rules! spv_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $val:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum $name {
            $($variant = $val),+
        }

        impl $name {
            pub fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($val => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

macro_rules! spv_bitmask {
    ($(#[$meta:meta])* $name:ident { $($flag:ident = $val:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        #[allow(non_upper_case_globals)]
        impl $name {
            $(pub const $flag: u32 = $val;)+

            /// Render a mask value with its set bits joined by `|`, or
            /// `None` when no bit is set.
            pub fn symbolic(mask: u32) -> String {
                if mask == 0 {
                    return "None".to_string();
                }
                let mut parts = Vec::new();
                $(if mask & $val != 0 {
                    parts.push(stringify!($flag));
                })+
                parts.join("|")
            }
        }
    };
}

spv_enum! {
    /// Where a pointer value lives.
    StorageClass {
        UniformConstant = 0,
        Input = 1,
        Uniform = 2,
        Output = 3,
        Workgroup = 4,
        CrossWorkgroup = 5,
        Private = 6,
        Function = 7,
        Generic = 8,
        PushConstant = 9,
        AtomicCounter = 10,
        Image = 11,
        StorageBuffer = 12,
    }
}

spv_enum! {
    ExecutionModel {
        Vertex = 0,
        TessellationControl = 1,
        TessellationEvaluation = 2,
        Geometry = 3,
        Fragment = 4,
        GLCompute = 5,
        Kernel = 6,
    }
}

spv_enum! {
    AddressingModel {
        Logical = 0,
        Physical32 = 1,
        Physical64 = 2,
    }
}

spv_enum! {
    MemoryModel {
        Simple = 0,
        GLSL450 = 1,
        OpenCL = 2,
    }
}

spv_enum! {
    ExecutionMode {
        Invocations = 0,
        LocalSize = 17,
        LocalSizeHint = 18,
        VecTypeHint = 30,
        ContractionOff = 31,
    }
}

spv_enum! {
    Capability {
        Matrix = 0,
        Shader = 1,
        Geometry = 2,
        Tessellation = 3,
        Addresses = 4,
        Linkage = 5,
        Kernel = 6,
        Vector16 = 7,
        Float16 = 9,
        Float64 = 10,
        Int64 = 11,
        Int16 = 22,
        Int8 = 39,
    }
}

spv_enum! {
    /// Decoration kind; the operand value that selects the sub-grammar of an
    /// `OpDecorate` tail.
    Decoration {
        RelaxedPrecision = 0,
        SpecId = 1,
        Block = 2,
        ArrayStride = 6,
        BuiltIn = 11,
        Restrict = 19,
        Aliased = 20,
        Volatile = 21,
        Constant = 22,
        NonWritable = 24,
        NonReadable = 25,
        Uniform = 26,
        UniformId = 27,
        Location = 30,
        Binding = 33,
        DescriptorSet = 34,
        FuncParamAttr = 38,
        FPRoundingMode = 39,
        FPFastMathMode = 40,
        LinkageAttributes = 41,
        NoContraction = 42,
        Alignment = 44,
    }
}

spv_enum! {
    BuiltIn {
        Position = 0,
        PointSize = 1,
        ClipDistance = 3,
        CullDistance = 4,
        VertexId = 5,
        InstanceId = 6,
        FragCoord = 15,
        FrontFacing = 17,
        NumWorkgroups = 24,
        WorkgroupSize = 25,
        WorkgroupId = 26,
        LocalInvocationId = 27,
        GlobalInvocationId = 28,
        LocalInvocationIndex = 29,
        SubgroupSize = 36,
    }
}

spv_enum! {
    Scope {
        CrossDevice = 0,
        Device = 1,
        Workgroup = 2,
        Subgroup = 3,
        Invocation = 4,
    }
}

spv_enum! {
    FunctionParameterAttribute {
        Zext = 0,
        Sext = 1,
        ByVal = 2,
        Sret = 3,
        NoAlias = 4,
        NoCapture = 5,
        NoWrite = 6,
        NoReadWrite = 7,
    }
}

spv_enum! {
    FPRoundingMode {
        RTE = 0,
        RTZ = 1,
        RTP = 2,
        RTN = 3,
    }
}

spv_enum! {
    LinkageType {
        Export = 0,
        Import = 1,
    }
}

spv_enum! {
    AccessQualifier {
        ReadOnly = 0,
        WriteOnly = 1,
        ReadWrite = 2,
    }
}

spv_enum! {
    ImageFormat {
        Unknown = 0,
        Rgba32f = 1,
        Rgba16f = 2,
        R32f = 3,
        Rgba8 = 4,
    }
}

/// Image dimensionality. Spelled by hand because the canonical names start
/// with digits and cannot be variant identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Dim {
    Dim1D = 0,
    Dim2D = 1,
    Dim3D = 2,
    Cube = 3,
    Rect = 4,
    Buffer = 5,
    SubpassData = 6,
}

impl Dim {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Dim1D),
            1 => Some(Self::Dim2D),
            2 => Some(Self::Dim3D),
            3 => Some(Self::Cube),
            4 => Some(Self::Rect),
            5 => Some(Self::Buffer),
            6 => Some(Self::SubpassData),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dim1D => "1D",
            Self::Dim2D => "2D",
            Self::Dim3D => "3D",
            Self::Cube => "Cube",
            Self::Rect => "Rect",
            Self::Buffer => "Buffer",
            Self::SubpassData => "SubpassData",
        }
    }
}

spv_bitmask! {
    /// Memory access qualifier bits. When `Aligned` is set the mask is
    /// followed by one alignment literal operand.
    MemoryOperand {
        Volatile = 0x1,
        Aligned = 0x2,
        Nontemporal = 0x4,
    }
}

spv_bitmask! {
    ImageOperand {
        Bias = 0x1,
        Lod = 0x2,
        Grad = 0x4,
        ConstOffset = 0x8,
        Offset = 0x10,
        ConstOffsets = 0x20,
        Sample = 0x40,
        MinLod = 0x80,
    }
}

spv_bitmask! {
    FPFastMathMode {
        NotNaN = 0x1,
        NotInf = 0x2,
        NSZ = 0x4,
        AllowRecip = 0x8,
        Fast = 0x10,
    }
}

spv_bitmask! {
    FunctionControl {
        Inline = 0x1,
        DontInline = 0x2,
        Pure = 0x4,
        Const = 0x8,
    }
}
