use alloy_primitives::U256;

/// The result type of this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors surfaced by type parsing, descriptor parsing, and the codec.
///
/// Nothing in this crate panics on malformed input; every failure path
/// reports one of these variants, with enough context (byte offsets, the
/// path into the type tree) to locate the defect in the payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The type-signature string does not match the Solidity type grammar.
    #[error("invalid type string `{input}` at byte {position}: {reason}")]
    TypeGrammar {
        /// The offending input string.
        input: String,
        /// Byte position at which parsing failed.
        position: usize,
        /// What the parser expected.
        reason: &'static str,
    },

    /// The JSON descriptor contains an entry with an unknown `type` key.
    #[error("unknown descriptor field type `{0}`")]
    UnknownField(String),

    /// The JSON descriptor declares more than one constructor.
    #[error("multiple constructor declarations")]
    Duplicate,

    /// The JSON descriptor is not valid JSON of the expected shape.
    #[error("invalid JSON descriptor: {0}")]
    Json(String),

    /// The input ended before the required number of bytes could be read.
    #[error("input truncated at byte {offset}: need {expected} bytes, {available} available")]
    Truncated {
        /// Absolute byte offset at which the read started.
        offset: usize,
        /// Total bytes the read required.
        expected: usize,
        /// Bytes actually available in the region.
        available: usize,
    },

    /// A dynamic offset or length prefix is out of range for its region, or
    /// does not fit in the signed 64-bit range.
    #[error("dynamic offset {offset} out of range at byte {at} (region of {region} bytes)")]
    Offset {
        /// Absolute byte offset of the offending word.
        at: usize,
        /// The offset value as read from the payload.
        offset: U256,
        /// Length of the region the offset must fall within.
        region: usize,
    },

    /// An integer value exceeds the declared bit width of its type.
    #[error("value `{value}` does not fit in `{ty}`")]
    Range {
        /// Canonical rendering of the target type.
        ty: String,
        /// The offending value.
        value: String,
    },

    /// A boolean word whose last byte is neither `0x00` nor `0x01`.
    #[error("invalid boolean byte {byte:#04x} at byte {at}")]
    Bool {
        /// Absolute byte offset of the offending byte.
        at: usize,
        /// The byte that was read.
        byte: u8,
    },

    /// A function-typed word whose trailing 8 bytes are not all zero.
    #[error("nonzero trailing bytes in function value at byte {at}")]
    Function {
        /// Absolute byte offset of the word.
        at: usize,
    },

    /// Two elements of one tuple resolved to the same result key.
    #[error("duplicate tuple field `{0}`")]
    TupleDup(String),

    /// A value variant does not match the type it is being encoded as.
    #[error("type mismatch: expected `{expected}`, got {actual}")]
    TypeMismatch {
        /// Canonical rendering of the expected type.
        expected: String,
        /// Variant name of the value that was provided.
        actual: &'static str,
    },

    /// A sequence value has the wrong number of elements for its type.
    #[error("length mismatch for `{ty}`: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Canonical rendering of the type.
        ty: String,
        /// Element count the type requires.
        expected: usize,
        /// Element count the value provided.
        actual: usize,
    },

    /// A log's first topic does not carry the event's id.
    #[error("log does not match event `{0}`")]
    LogMismatch(String),

    /// A failure nested inside a composite type, annotated with the path of
    /// the element that failed.
    #[error("`{path}`: {source}")]
    Path {
        /// Tuple field name or array index segment.
        path: String,
        /// The underlying failure.
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps the error with a type-tree path segment (a tuple field name or
    /// an `[index]` segment).
    pub(crate) fn with_path(self, path: impl Into<String>) -> Self {
        Self::Path { path: path.into(), source: Box::new(self) }
    }
}
