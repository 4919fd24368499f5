//! Material error types.
//!
//! Every failure raised while parsing annotations, validating names or
//! editing a [`MaterialDefinition`](crate::definition::MaterialDefinition)
//! is reported as a [`MaterialError`]. None of them are fatal: annotated
//! shader text is user input, so callers surface the message and carry on.

use std::fmt;

use crate::data_type::ShaderDataType;
use crate::variable::SemanticBinding;

/// Errors that can occur while processing material annotations or edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialError {
    /// The first token of a variable declaration is not a known type name.
    UnknownType {
        type_name: String,
        declaration: String,
    },
    /// A variable declaration has a type but no name.
    MissingName { declaration: String },
    /// `[` present without a valid all-digit, `]`-terminated dimension.
    MalformedArraySyntax { declaration: String },
    /// Extra tokens follow `<type> <name>`.
    UnexpectedToken { token: String, declaration: String },
    /// A texture declaration contains `[` or `]`.
    TextureArrayNotSupported { declaration: String },
    /// A texture declaration does not consist of exactly one token.
    TextureSyntax { declaration: String },
    /// The name is not a valid shading-language identifier.
    InvalidName(String),
    /// The name is taken by a generated block or texture array.
    ReservedName(String),
    /// The name collides with another name in the combined namespace.
    DuplicateName(String),
    /// Adding the variable pushes its uniform block past `limit` bytes.
    BlockTooLarge { variable: String, limit: u32 },
    /// A restored variable declares an array length of zero.
    InvalidArrayCount { variable: String },
    /// A list index was outside the list bounds.
    IndexOutOfRange { index: usize, len: usize },
    /// Two variables in the same list claim the same semantic binding.
    DuplicateSemanticBinding {
        binding: SemanticBinding,
        existing: String,
        requested: String,
    },
    /// A semantic binding was attached to a variable of the wrong shape.
    SemanticTypeMismatch {
        binding: SemanticBinding,
        variable: String,
        found: ShaderDataType,
        count: u32,
    },
}

/// Discriminant of a [`MaterialError`], convenient for matching in tests and UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialErrorKind {
    UnknownType,
    MissingName,
    MalformedArraySyntax,
    UnexpectedToken,
    TextureArrayNotSupported,
    TextureSyntax,
    InvalidName,
    ReservedName,
    DuplicateName,
    BlockTooLarge,
    InvalidArrayCount,
    IndexOutOfRange,
    DuplicateSemanticBinding,
    SemanticTypeMismatch,
}

impl MaterialError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> MaterialErrorKind {
        match self {
            Self::UnknownType { .. } => MaterialErrorKind::UnknownType,
            Self::MissingName { .. } => MaterialErrorKind::MissingName,
            Self::MalformedArraySyntax { .. } => MaterialErrorKind::MalformedArraySyntax,
            Self::UnexpectedToken { .. } => MaterialErrorKind::UnexpectedToken,
            Self::TextureArrayNotSupported { .. } => MaterialErrorKind::TextureArrayNotSupported,
            Self::TextureSyntax { .. } => MaterialErrorKind::TextureSyntax,
            Self::InvalidName(_) => MaterialErrorKind::InvalidName,
            Self::ReservedName(_) => MaterialErrorKind::ReservedName,
            Self::DuplicateName(_) => MaterialErrorKind::DuplicateName,
            Self::BlockTooLarge { .. } => MaterialErrorKind::BlockTooLarge,
            Self::InvalidArrayCount { .. } => MaterialErrorKind::InvalidArrayCount,
            Self::IndexOutOfRange { .. } => MaterialErrorKind::IndexOutOfRange,
            Self::DuplicateSemanticBinding { .. } => MaterialErrorKind::DuplicateSemanticBinding,
            Self::SemanticTypeMismatch { .. } => MaterialErrorKind::SemanticTypeMismatch,
        }
    }
}

impl fmt::Display for MaterialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType {
                type_name,
                declaration,
            } => write!(f, "unknown type '{type_name}' in declaration '{declaration}'"),
            Self::MissingName { declaration } => {
                write!(f, "missing variable name in declaration '{declaration}'")
            }
            Self::MalformedArraySyntax { declaration } => {
                write!(f, "malformed array syntax in declaration '{declaration}'")
            }
            Self::UnexpectedToken { token, declaration } => {
                write!(f, "unexpected token '{token}' in declaration '{declaration}'")
            }
            Self::TextureArrayNotSupported { declaration } => write!(
                f,
                "texture arrays are not supported, declare one texture per line: '{declaration}'"
            ),
            Self::TextureSyntax { declaration } => write!(
                f,
                "texture declaration must be a single name: '{declaration}'"
            ),
            Self::InvalidName(name) => write!(f, "invalid variable name '{name}'"),
            Self::ReservedName(name) => {
                write!(f, "name '{name}' is reserved for a generated declaration")
            }
            Self::DuplicateName(name) => write!(f, "duplicate name '{name}'"),
            Self::BlockTooLarge { variable, limit } => write!(
                f,
                "uniform block exceeds {limit} bytes at variable '{variable}'"
            ),
            Self::InvalidArrayCount { variable } => {
                write!(f, "variable '{variable}' has an array length of zero")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for list of length {len}")
            }
            Self::DuplicateSemanticBinding {
                binding,
                existing,
                requested,
            } => write!(
                f,
                "semantic binding {binding} is already claimed by '{existing}', cannot bind '{requested}'"
            ),
            Self::SemanticTypeMismatch {
                binding,
                variable,
                found,
                count,
            } => {
                let expected = binding.data_type();
                if *count > 1 {
                    write!(
                        f,
                        "semantic binding {binding} expects a single {expected}, but '{variable}' is {found}[{count}]"
                    )
                } else {
                    write!(
                        f,
                        "semantic binding {binding} expects {expected}, but '{variable}' is {found}"
                    )
                }
            }
        }
    }
}

impl std::error::Error for MaterialError {}

/// Result type for material operations.
pub type MaterialResult<T = ()> = Result<T, MaterialError>;
