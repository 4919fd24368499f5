//! GLSL generation for material and node declarations.
//!
//! Uniform blocks are emitted in `std140` layout followed by `#define`
//! aliases, so shader code refers to fields by their bare names:
//!
//! ```glsl
//! layout(std140, set = 1, binding = 0) uniform material_block {
//!     vec3 albedo;
//!     float opacity[4];
//! } material;
//! #define albedo material.albedo
//! #define opacity material.opacity
//! ```
//!
//! Textures become one `sampler2D` array with one alias per element:
//!
//! ```glsl
//! layout(set = 1, binding = 1) uniform sampler2D material_textures[2];
//! #define diffuse material_textures[0]
//! #define normal_map material_textures[1]
//! ```

use serde::{Deserialize, Serialize};
use shadertag_core::data_type::{ScalarKind, ShaderDataType, VEC4_SIZE};
use shadertag_core::layout::BlockLayout;
use shadertag_core::variable::{ShaderVariable, TextureSlot};

/// Emits a uniform block and its field aliases.
///
/// An empty `vars` list still produces one (empty) block, so every set
/// always has exactly one uniform binding.
pub fn emit_uniform_block(
    vars: &[ShaderVariable],
    block_label: &str,
    set_index: u32,
    binding_index: u32,
) -> String {
    let mut out = format!(
        "layout(std140, set = {set_index}, binding = {binding_index}) uniform {block_label}_block {{\n"
    );
    for var in vars {
        out.push_str(&format!("    {};\n", glsl_field(var)));
    }
    out.push_str(&format!("}} {block_label};\n"));
    for var in vars {
        out.push_str(&format!("#define {0} {block_label}.{0}\n", var.name));
    }
    out
}

/// Emits a `sampler2D` array and one alias per texture.
///
/// Returns an empty string for an empty list: a zero-length sampler array
/// is not valid GLSL, so the binding is left out.
pub fn emit_texture_block(
    textures: &[TextureSlot],
    block_label: &str,
    set_index: u32,
    binding_index: u32,
) -> String {
    if textures.is_empty() {
        return String::new();
    }
    let mut out = format!(
        "layout(set = {set_index}, binding = {binding_index}) uniform sampler2D {block_label}[{}];\n",
        textures.len()
    );
    for (index, texture) in textures.iter().enumerate() {
        out.push_str(&format!(
            "#define {} {block_label}[{index}]\n",
            texture.name
        ));
    }
    out
}

fn glsl_field(var: &ShaderVariable) -> String {
    if var.is_array() {
        format!("{} {}[{}]", var.data_type, var.name, var.count)
    } else {
        format!("{} {}", var.data_type, var.name)
    }
}

// ----------------------------------------------------------------------------
// Struct preview
// ----------------------------------------------------------------------------

/// Language of a struct preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewLanguage {
    /// `#[repr(C)]` Rust struct.
    #[default]
    Rust,
    /// C `typedef struct`.
    C,
    /// GLSL `struct`.
    Glsl,
}

/// Renders `vars` as a host-language struct for display in editing tools.
///
/// The Rust and C renderings insert explicit padding so every field sits at
/// its computed block offset and the struct spans the full block size. The
/// output is documentation only and is never compiled.
pub fn emit_struct_preview(
    vars: &[ShaderVariable],
    struct_name: &str,
    language: PreviewLanguage,
) -> String {
    let layout = BlockLayout::compute(vars);
    let mut fields = Vec::new();
    let mut cursor = 0;
    let mut pad_count = 0;

    for (var, &offset) in vars.iter().zip(&layout.offsets) {
        if offset > cursor && language != PreviewLanguage::Glsl {
            fields.push(padding_field(language, pad_count, offset - cursor, cursor));
            pad_count += 1;
        }
        let field = match language {
            PreviewLanguage::Rust => format!("pub {}: {},", var.name, rust_type(var)),
            PreviewLanguage::C => c_field(var),
            PreviewLanguage::Glsl => format!("{};", glsl_field(var)),
        };
        fields.push(format!("{field} // offset {offset}"));
        cursor = offset.saturating_add(var.padded_size());
    }
    if layout.size > cursor && language != PreviewLanguage::Glsl {
        fields.push(padding_field(language, pad_count, layout.size - cursor, cursor));
    }

    let mut out = match language {
        PreviewLanguage::Rust => format!("#[repr(C)]\npub struct {struct_name} {{\n"),
        PreviewLanguage::C => format!("typedef struct {struct_name} {{\n"),
        PreviewLanguage::Glsl => format!("struct {struct_name} {{\n"),
    };
    for field in &fields {
        out.push_str(&format!("    {field}\n"));
    }
    match language {
        PreviewLanguage::Rust => out.push_str("}\n"),
        PreviewLanguage::C => out.push_str(&format!("}} {struct_name};\n")),
        PreviewLanguage::Glsl => out.push_str("};\n"),
    }
    out.push_str(&format!("// size: {} bytes\n", layout.size));
    out
}

fn padding_field(language: PreviewLanguage, index: usize, bytes: u32, offset: u32) -> String {
    match language {
        PreviewLanguage::C => format!("uint8_t _pad{index}[{bytes}]; // offset {offset}"),
        _ => format!("_pad{index}: [u8; {bytes}], // offset {offset}"),
    }
}

fn rust_scalar(scalar: ScalarKind) -> &'static str {
    match scalar {
        ScalarKind::Bool | ScalarKind::Uint => "u32",
        ScalarKind::Int => "i32",
        ScalarKind::Float => "f32",
        ScalarKind::Double => "f64",
    }
}

fn c_scalar(scalar: ScalarKind) -> &'static str {
    match scalar {
        ScalarKind::Bool | ScalarKind::Uint => "uint32_t",
        ScalarKind::Int => "int32_t",
        ScalarKind::Float => "float",
        ScalarKind::Double => "double",
    }
}

/// Array dimensions of the host representation, outermost first.
///
/// Matrix columns are padded to four components; array elements are widened
/// to the array stride.
fn host_dimensions(var: &ShaderVariable) -> Vec<u32> {
    let ty: ShaderDataType = var.data_type;
    let mut dims = Vec::new();
    if var.is_array() {
        dims.push(var.count);
    }
    if ty.is_matrix() {
        dims.push(ty.columns());
        dims.push(VEC4_SIZE / ty.component_size());
    } else if var.is_array() {
        let components = var.array_stride() / ty.component_size();
        if components > 1 {
            dims.push(components);
        }
    } else if ty.rows() > 1 {
        dims.push(ty.rows());
    }
    dims
}

fn rust_type(var: &ShaderVariable) -> String {
    host_dimensions(var)
        .iter()
        .rev()
        .fold(rust_scalar(var.data_type.scalar()).to_string(), |inner, len| {
            format!("[{inner}; {len}]")
        })
}

fn c_field(var: &ShaderVariable) -> String {
    let dims: String = host_dimensions(var)
        .iter()
        .map(|len| format!("[{len}]"))
        .collect();
    format!("{} {}{dims};", c_scalar(var.data_type.scalar()), var.name)
}
