//! Material and node variables.
//!
//! - [`ShaderVariable`] - a named, typed uniform-block field, optionally an array
//! - [`TextureSlot`] - a named 2D texture in a material or node texture array
//! - [`SemanticBinding`] - a well-known host-supplied value a variable can receive

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data_type::{ShaderDataType, VEC4_SIZE};
use crate::layout::align_up;

/// Well-known values the host writes into node uniform blocks.
///
/// A variable opts into one of these through the binding table of its
/// [`MaterialDefinition`](crate::definition::MaterialDefinition); the host then
/// finds the byte offset by semantic instead of by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SemanticBinding {
    /// Identifier of the scene node being drawn.
    NodeId,
    /// Model (object-to-world) matrix of the scene node being drawn.
    NodeModelMatrix,
}

impl SemanticBinding {
    /// Every semantic binding.
    pub const ALL: [Self; 2] = [Self::NodeId, Self::NodeModelMatrix];

    /// The data type a variable must have to receive this binding.
    pub fn data_type(self) -> ShaderDataType {
        match self {
            Self::NodeId => ShaderDataType::Uint,
            Self::NodeModelMatrix => ShaderDataType::MAT4,
        }
    }

    /// Stable upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::NodeId => "NODE_ID",
            Self::NodeModelMatrix => "NODE_MODEL_MATRIX",
        }
    }

    /// Whether `variable` has the shape this binding writes.
    pub fn accepts(self, variable: &ShaderVariable) -> bool {
        variable.data_type == self.data_type() && variable.count == 1
    }
}

impl fmt::Display for SemanticBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single uniform-block field.
///
/// `count > 1` declares a fixed-size array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderVariable {
    /// Field name, unique across the owning definition.
    pub name: String,
    /// Field type.
    pub data_type: ShaderDataType,
    /// Array length, 1 for non-array fields.
    pub count: u32,
    /// Host-supplied value this field receives, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_binding: Option<SemanticBinding>,
}

impl ShaderVariable {
    /// Create a non-array variable with no semantic binding.
    pub fn new(name: impl Into<String>, data_type: ShaderDataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            count: 1,
            semantic_binding: None,
        }
    }

    /// Set the array length. Lengths below 1 are clamped to 1.
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.max(1);
        self
    }

    /// Attach a semantic binding.
    #[must_use]
    pub fn with_semantic_binding(mut self, binding: SemanticBinding) -> Self {
        self.semantic_binding = Some(binding);
        self
    }

    /// Whether this variable is an array.
    pub fn is_array(&self) -> bool {
        self.count > 1
    }

    /// Alignment in bytes of this variable inside a uniform block.
    ///
    /// Arrays always align to 16 bytes.
    pub fn alignment(&self) -> u32 {
        if self.is_array() {
            self.data_type.alignment().max(VEC4_SIZE)
        } else {
            self.data_type.alignment()
        }
    }

    /// Distance in bytes between consecutive array elements.
    ///
    /// Equal to the type size for non-array variables.
    pub fn array_stride(&self) -> u32 {
        if self.is_array() {
            align_up(self.data_type.size(), VEC4_SIZE)
        } else {
            self.data_type.size()
        }
    }

    /// Bytes this variable occupies, including per-element array padding.
    ///
    /// Saturates at `u32::MAX`; see [`checked_padded_size`](Self::checked_padded_size).
    pub fn padded_size(&self) -> u32 {
        self.array_stride().saturating_mul(self.count)
    }

    /// Like [`padded_size`](Self::padded_size), but `None` on overflow.
    pub fn checked_padded_size(&self) -> Option<u32> {
        self.array_stride().checked_mul(self.count)
    }
}

/// A named texture slot.
///
/// Always a single 2D sampled image; the length of the owning list decides
/// the size of the compiled texture array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureSlot {
    /// Texture name, unique across the owning definition.
    pub name: String,
}

impl TextureSlot {
    /// Create a texture slot.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// GLSL keywords and words reserved for future use.
const GLSL_RESERVED_WORDS: &[&str] = &[
    "active", "asm", "atomic_uint", "attribute", "break", "buffer", "case", "cast", "centroid",
    "class", "coherent", "common", "const", "continue", "default", "discard", "do", "else",
    "enum", "extern", "external", "false", "filter", "fixed", "flat", "for", "goto", "half",
    "highp", "if", "in", "inline", "inout", "input", "interface", "invariant", "layout", "long",
    "lowp", "mediump", "namespace", "noinline", "noperspective", "out", "output", "partition",
    "patch", "precise", "precision", "public", "readonly", "resource", "restrict", "return",
    "sample", "shared", "short", "sizeof", "smooth", "static", "struct", "subroutine", "superp",
    "switch", "template", "this", "true", "typedef", "uniform", "union", "unsigned", "using",
    "varying", "void", "volatile", "while", "writeonly",
];

/// Prefixes of opaque and double-matrix type families (`sampler2D`,
/// `uimageCube`, `dmat3x4`, ...). A name only matches when the prefix is
/// followed by a digit or an uppercase letter.
const GLSL_TYPE_PREFIXES: &[&str] = &[
    "sampler", "isampler", "usampler", "image", "iimage", "uimage", "texture", "itexture",
    "utexture", "subpassInput", "isubpassInput", "usubpassInput", "dmat", "hvec", "fvec",
];

/// Whether `name` is a GLSL keyword, reserved word or built-in type name.
pub fn is_reserved_word(name: &str) -> bool {
    if GLSL_RESERVED_WORDS.contains(&name) || ShaderDataType::from_glsl_name(name).is_some() {
        return true;
    }
    GLSL_TYPE_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    })
}

/// Whether `name` is usable as a shading-language identifier.
///
/// Names must start with an ASCII letter or `_`, continue with ASCII
/// alphanumerics or `_`, and may not use the reserved `gl_` prefix, contain
/// `__` or be a [reserved word](is_reserved_word).
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if name.starts_with("gl_") || name.contains("__") || is_reserved_word(name) {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
