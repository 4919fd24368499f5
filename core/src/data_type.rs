//! Shader data types usable in material and node uniform blocks.
//!
//! [`ShaderDataType`] is the type table: a closed set of scalar, vector and
//! matrix types, each with a fixed component count, component size and
//! uniform-block alignment.
//!
//! # Alignment
//!
//! | Kind | Alignment |
//! |------|-----------|
//! | Scalar | its own size (4, or 8 for `double`) |
//! | 2-component vector | 8 |
//! | 3/4-component vector | 16 |
//! | Matrix | 16 (per column) |
//!
//! Matrix columns are padded to 16 bytes, so a `mat3` occupies 48 bytes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Size in bytes of one padded matrix column and of one array element slot.
pub const VEC4_SIZE: u32 = 16;

/// Scalar component of a [`ShaderDataType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
    Double,
}

impl ScalarKind {
    /// Size in bytes of one component inside a uniform block.
    ///
    /// Booleans occupy a full 32-bit word.
    pub fn size(self) -> u32 {
        match self {
            Self::Double => 8,
            _ => 4,
        }
    }
}

/// Data type of a material or node variable.
///
/// Serialized as its [GLSL spelling](ShaderDataType::glsl_name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderDataType {
    // -- Scalars --
    Bool,
    Int,
    Uint,
    Float,
    Double,

    // -- Vectors --
    BVec2,
    BVec3,
    BVec4,
    IVec2,
    IVec3,
    IVec4,
    UVec2,
    UVec3,
    UVec4,
    Vec2,
    Vec3,
    Vec4,
    DVec2,
    DVec3,
    DVec4,

    // -- Matrices (columns x rows) --
    Mat2x2,
    Mat2x3,
    Mat2x4,
    Mat3x2,
    Mat3x3,
    Mat3x4,
    Mat4x2,
    Mat4x3,
    Mat4x4,
}

impl ShaderDataType {
    /// `mat2`, the square 2x2 matrix.
    pub const MAT2: Self = Self::Mat2x2;
    /// `mat3`, the square 3x3 matrix.
    pub const MAT3: Self = Self::Mat3x3;
    /// `mat4`, the square 4x4 matrix.
    pub const MAT4: Self = Self::Mat4x4;

    /// Every variant, in declaration order.
    pub const ALL: [Self; 29] = [
        Self::Bool,
        Self::Int,
        Self::Uint,
        Self::Float,
        Self::Double,
        Self::BVec2,
        Self::BVec3,
        Self::BVec4,
        Self::IVec2,
        Self::IVec3,
        Self::IVec4,
        Self::UVec2,
        Self::UVec3,
        Self::UVec4,
        Self::Vec2,
        Self::Vec3,
        Self::Vec4,
        Self::DVec2,
        Self::DVec3,
        Self::DVec4,
        Self::Mat2x2,
        Self::Mat2x3,
        Self::Mat2x4,
        Self::Mat3x2,
        Self::Mat3x3,
        Self::Mat3x4,
        Self::Mat4x2,
        Self::Mat4x3,
        Self::Mat4x4,
    ];

    /// Looks up a type by its GLSL spelling.
    ///
    /// `mat2`, `mat3` and `mat4` resolve to the square matrix variants.
    /// Sampler types are never valid here.
    pub fn from_glsl_name(name: &str) -> Option<Self> {
        let ty = match name {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "uint" => Self::Uint,
            "float" => Self::Float,
            "double" => Self::Double,
            "bvec2" => Self::BVec2,
            "bvec3" => Self::BVec3,
            "bvec4" => Self::BVec4,
            "ivec2" => Self::IVec2,
            "ivec3" => Self::IVec3,
            "ivec4" => Self::IVec4,
            "uvec2" => Self::UVec2,
            "uvec3" => Self::UVec3,
            "uvec4" => Self::UVec4,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "dvec2" => Self::DVec2,
            "dvec3" => Self::DVec3,
            "dvec4" => Self::DVec4,
            "mat2" | "mat2x2" => Self::Mat2x2,
            "mat2x3" => Self::Mat2x3,
            "mat2x4" => Self::Mat2x4,
            "mat3x2" => Self::Mat3x2,
            "mat3" | "mat3x3" => Self::Mat3x3,
            "mat3x4" => Self::Mat3x4,
            "mat4x2" => Self::Mat4x2,
            "mat4x3" => Self::Mat4x3,
            "mat4" | "mat4x4" => Self::Mat4x4,
            _ => return None,
        };
        Some(ty)
    }

    /// Canonical GLSL spelling. Square matrices use the short form.
    pub fn glsl_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Double => "double",
            Self::BVec2 => "bvec2",
            Self::BVec3 => "bvec3",
            Self::BVec4 => "bvec4",
            Self::IVec2 => "ivec2",
            Self::IVec3 => "ivec3",
            Self::IVec4 => "ivec4",
            Self::UVec2 => "uvec2",
            Self::UVec3 => "uvec3",
            Self::UVec4 => "uvec4",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::DVec2 => "dvec2",
            Self::DVec3 => "dvec3",
            Self::DVec4 => "dvec4",
            Self::Mat2x2 => "mat2",
            Self::Mat2x3 => "mat2x3",
            Self::Mat2x4 => "mat2x4",
            Self::Mat3x2 => "mat3x2",
            Self::Mat3x3 => "mat3",
            Self::Mat3x4 => "mat3x4",
            Self::Mat4x2 => "mat4x2",
            Self::Mat4x3 => "mat4x3",
            Self::Mat4x4 => "mat4",
        }
    }

    /// Scalar kind of each component.
    pub fn scalar(self) -> ScalarKind {
        match self {
            Self::Bool | Self::BVec2 | Self::BVec3 | Self::BVec4 => ScalarKind::Bool,
            Self::Int | Self::IVec2 | Self::IVec3 | Self::IVec4 => ScalarKind::Int,
            Self::Uint | Self::UVec2 | Self::UVec3 | Self::UVec4 => ScalarKind::Uint,
            Self::Double | Self::DVec2 | Self::DVec3 | Self::DVec4 => ScalarKind::Double,
            _ => ScalarKind::Float,
        }
    }

    /// Number of matrix columns (1 for scalars and vectors).
    pub fn columns(self) -> u32 {
        match self {
            Self::Mat2x2 | Self::Mat2x3 | Self::Mat2x4 => 2,
            Self::Mat3x2 | Self::Mat3x3 | Self::Mat3x4 => 3,
            Self::Mat4x2 | Self::Mat4x3 | Self::Mat4x4 => 4,
            _ => 1,
        }
    }

    /// Number of components in one column (or in the whole vector).
    pub fn rows(self) -> u32 {
        match self {
            Self::Bool | Self::Int | Self::Uint | Self::Float | Self::Double => 1,
            Self::BVec2 | Self::IVec2 | Self::UVec2 | Self::Vec2 | Self::DVec2 => 2,
            Self::BVec3 | Self::IVec3 | Self::UVec3 | Self::Vec3 | Self::DVec3 => 3,
            Self::BVec4 | Self::IVec4 | Self::UVec4 | Self::Vec4 | Self::DVec4 => 4,
            Self::Mat2x2 | Self::Mat3x2 | Self::Mat4x2 => 2,
            Self::Mat2x3 | Self::Mat3x3 | Self::Mat4x3 => 3,
            Self::Mat2x4 | Self::Mat3x4 | Self::Mat4x4 => 4,
        }
    }

    /// Total number of components.
    pub fn component_count(self) -> u32 {
        self.columns() * self.rows()
    }

    /// Size in bytes of one component.
    pub fn component_size(self) -> u32 {
        self.scalar().size()
    }

    /// Whether this is a matrix type.
    pub fn is_matrix(self) -> bool {
        self.columns() > 1
    }

    /// Whether this is a scalar type.
    pub fn is_scalar(self) -> bool {
        self.component_count() == 1
    }

    /// Alignment in bytes inside a uniform block.
    pub fn alignment(self) -> u32 {
        if self.is_matrix() {
            return VEC4_SIZE;
        }
        match self.rows() {
            1 => self.component_size(),
            2 => 8,
            _ => VEC4_SIZE,
        }
    }

    /// Size in bytes of a single (non-array) value inside a uniform block.
    ///
    /// Matrix columns are padded to 16 bytes.
    pub fn size(self) -> u32 {
        if self.is_matrix() {
            self.columns() * VEC4_SIZE
        } else {
            self.component_count() * self.component_size()
        }
    }
}

impl fmt::Display for ShaderDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl_name())
    }
}

impl Serialize for ShaderDataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.glsl_name())
    }
}

impl<'de> Deserialize<'de> for ShaderDataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_glsl_name(&name)
            .ok_or_else(|| de::Error::custom(format!("unknown GLSL type '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::float(ShaderDataType::Float, 4, 4)]
    #[case::double(ShaderDataType::Double, 8, 8)]
    #[case::bool(ShaderDataType::Bool, 4, 4)]
    #[case::vec2(ShaderDataType::Vec2, 8, 8)]
    #[case::dvec2(ShaderDataType::DVec2, 16, 8)]
    #[case::vec3(ShaderDataType::Vec3, 12, 16)]
    #[case::ivec4(ShaderDataType::IVec4, 16, 16)]
    #[case::dvec4(ShaderDataType::DVec4, 32, 16)]
    #[case::mat2(ShaderDataType::Mat2x2, 32, 16)]
    #[case::mat3(ShaderDataType::Mat3x3, 48, 16)]
    #[case::mat4(ShaderDataType::Mat4x4, 64, 16)]
    #[case::mat4x2(ShaderDataType::Mat4x2, 64, 16)]
    #[case::mat2x4(ShaderDataType::Mat2x4, 32, 16)]
    fn test_size_and_alignment(
        #[case] ty: ShaderDataType,
        #[case] size: u32,
        #[case] alignment: u32,
    ) {
        assert_eq!(ty.size(), size);
        assert_eq!(ty.alignment(), alignment);
    }

    #[rstest]
    #[case("mat2", ShaderDataType::Mat2x2)]
    #[case("mat3", ShaderDataType::Mat3x3)]
    #[case("mat4", ShaderDataType::Mat4x4)]
    #[case("mat4x4", ShaderDataType::Mat4x4)]
    #[case("mat3x2", ShaderDataType::Mat3x2)]
    fn test_matrix_aliases(#[case] name: &str, #[case] expected: ShaderDataType) {
        assert_eq!(ShaderDataType::from_glsl_name(name), Some(expected));
    }

    #[test]
    fn test_square_matrix_constants() {
        assert_eq!(ShaderDataType::MAT2, ShaderDataType::Mat2x2);
        assert_eq!(ShaderDataType::MAT3, ShaderDataType::Mat3x3);
        assert_eq!(ShaderDataType::MAT4, ShaderDataType::Mat4x4);
    }

    #[test]
    fn test_name_round_trip_for_every_variant() {
        for ty in ShaderDataType::ALL {
            assert_eq!(ShaderDataType::from_glsl_name(ty.glsl_name()), Some(ty));
        }
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(ShaderDataType::from_glsl_name("sampler2D"), None);
        assert_eq!(ShaderDataType::from_glsl_name("Float"), None);
        assert_eq!(ShaderDataType::from_glsl_name(""), None);
    }

    #[test]
    fn test_component_counts() {
        assert_eq!(ShaderDataType::Uint.component_count(), 1);
        assert_eq!(ShaderDataType::BVec3.component_count(), 3);
        assert_eq!(ShaderDataType::Mat3x4.component_count(), 12);
        assert_eq!(ShaderDataType::DVec3.component_size(), 8);
        assert!(ShaderDataType::Mat2x3.is_matrix());
        assert!(!ShaderDataType::Vec4.is_matrix());
        assert!(ShaderDataType::Int.is_scalar());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Field {
        data_type: ShaderDataType,
    }

    #[rstest]
    #[case::bvec2(ShaderDataType::BVec2, "bvec2")]
    #[case::uvec4(ShaderDataType::UVec4, "uvec4")]
    #[case::dvec3(ShaderDataType::DVec3, "dvec3")]
    #[case::mat4(ShaderDataType::Mat4x4, "mat4")]
    #[case::mat2x3(ShaderDataType::Mat2x3, "mat2x3")]
    fn test_serialized_as_glsl_name(#[case] data_type: ShaderDataType, #[case] name: &str) {
        let text = toml::to_string(&Field { data_type }).unwrap();
        assert_eq!(text.trim(), format!("data_type = \"{name}\""));
        assert_eq!(toml::from_str::<Field>(&text).unwrap().data_type, data_type);
    }

    #[test]
    fn test_deserialize_accepts_aliases_only() {
        let field: Field = toml::from_str("data_type = \"mat3x3\"").unwrap();
        assert_eq!(field.data_type, ShaderDataType::MAT3);
        assert!(toml::from_str::<Field>("data_type = \"b_vec2\"").is_err());
        assert!(toml::from_str::<Field>("data_type = \"sampler2D\"").is_err());
    }
}
