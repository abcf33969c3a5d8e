// This module defines error types for the legalization and emission pipeline
// using the thiserror crate for idiomatic Rust error handling. LegalizeError
// is the main error enum covering the pipeline's failure taxonomy: a value
// bound to two structurally different types, a referenced function or global
// with no assigned identifier at lowering time, an instruction whose operand
// layout matches no known grammar branch at emission time, and a constant
// whose bit width has no encoding in the format. Every variant carries the
// context needed to point at the offending value or instruction. All of these
// indicate a bug in an earlier stage rather than a user error; none are
// retried or downgraded, and a caller that hits one must discard the whole
// function's output. The module also provides LegalizeResult<T> as a
// convenience alias.

//! Error types for the legalization and emission pipeline.
//!
//! Using thiserror for more idiomatic error handling.

use thiserror::Error;

/// Main error type for legalization, lowering and encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LegalizeError {
    #[error("value %{value} bound to two different types (%{first} vs %{second})")]
    InconsistentTypeBinding { value: u32, first: u32, second: u32 },

    #[error("unresolved symbol: {name}")]
    UnresolvedSymbol { name: String },

    #[error("unsupported operand shape in {mnemonic}: {reason}")]
    UnsupportedOperandShape {
        mnemonic: &'static str,
        reason: String,
    },

    #[error("unsupported {width}-bit constant width")]
    UnsupportedConstantWidth { width: u32 },
}

/// Result type alias for legalization and emission operations.
pub type LegalizeResult<T> = Result<T, LegalizeError>;
