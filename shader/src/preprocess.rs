//! Annotated shader preprocessing.
//!
//! [`Preprocessor::preprocess`] turns annotated GLSL into compilable GLSL:
//!
//! 1. `#version` directive
//! 2. vertex inputs at locations 0-3 (vertex stage only)
//! 3. scene uniform header (set 0)
//! 4. material uniform block and texture array (set 1)
//! 5. node uniform block and texture array (set 2)
//! 6. the user source with every tag line removed
//!
//! # Example
//!
//! ```
//! use shadertag_shader::preprocess::{ShaderStage, preprocess};
//!
//! let source = "\
//! $MATERIAL_VARIABLE vec3 albedo;
//! $MATERIAL_VARIABLE float opacity[4];
//! $MATERIAL_TEXTURE diffuse
//! void main() {}
//! ";
//!
//! let result = preprocess(source, ShaderStage::Fragment)?;
//! assert_eq!(result.material_layout().offsets, vec![0, 16]);
//! assert_eq!(result.material_layout().size, 80);
//! assert!(result.compiled_source.contains("#define diffuse material_textures[0]"));
//! # Ok::<(), shadertag_core::error::MaterialError>(())
//! ```

use serde::{Deserialize, Serialize};
use shadertag_core::definition::{MaterialDefinition, MaterialDomain};
use shadertag_core::descriptor::{
    BlockScope, DescriptorSetEntry, TEXTURE_BINDING, UNIFORM_BINDING, assemble_sets,
};
use shadertag_core::error::MaterialResult;
use shadertag_core::layout::BlockLayout;
use shadertag_core::namespace::{generated_names, validate_not_reserved, validate_unique};
use shadertag_core::profiling::profile_function;
use shadertag_core::variable::{ShaderVariable, TextureSlot};

use crate::annotation::{Tag, extract};
use crate::codegen::{emit_texture_block, emit_uniform_block};

/// Scene uniform block bound at set 0 by the renderer.
pub const DEFAULT_SCENE_HEADER: &str = "\
layout(std140, set = 0, binding = 0) uniform scene_block {
    mat4 view;
    mat4 projection;
    mat4 view_projection;
    vec4 camera_position;
    vec4 time;
} scene;
";

/// Vertex attributes declared for vertex-stage shaders.
pub const VERTEX_INPUTS: &str = "\
layout(location = 0) in vec3 in_position;
layout(location = 1) in vec2 in_uv;
layout(location = 2) in vec3 in_normal;
layout(location = 3) in vec4 in_color;
";

/// Pipeline stage a shader is preprocessed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// Whether the stage gets the fixed vertex input declarations.
    pub fn has_vertex_inputs(self) -> bool {
        self == Self::Vertex
    }
}

/// Preprocessing settings.
///
/// Every field has a default, so a TOML file only lists what it changes:
///
/// ```toml
/// glsl_version = 460
/// emit_vertex_inputs = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Number written in the `#version` directive.
    pub glsl_version: u32,
    /// Set-0 scene block text.
    pub scene_header: String,
    /// Whether vertex-stage calls emit [`VERTEX_INPUTS`].
    pub emit_vertex_inputs: bool,
    /// Instance name of the material uniform block.
    pub material_block_label: String,
    /// Instance name of the node uniform block.
    pub node_block_label: String,
    /// Name of the material sampler array.
    pub material_texture_label: String,
    /// Name of the node sampler array.
    pub node_texture_label: String,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            glsl_version: 450,
            scene_header: DEFAULT_SCENE_HEADER.to_string(),
            emit_vertex_inputs: true,
            material_block_label: BlockScope::Material.block_label().to_string(),
            node_block_label: BlockScope::Node.block_label().to_string(),
            material_texture_label: BlockScope::Material.texture_label().to_string(),
            node_texture_label: BlockScope::Node.texture_label().to_string(),
        }
    }
}

impl PreprocessConfig {
    /// Loads a config from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Serializes the config to TOML text.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    #[must_use]
    pub fn with_glsl_version(mut self, version: u32) -> Self {
        self.glsl_version = version;
        self
    }

    #[must_use]
    pub fn with_scene_header(mut self, header: impl Into<String>) -> Self {
        self.scene_header = header.into();
        self
    }

    #[must_use]
    pub fn with_vertex_inputs(mut self, enabled: bool) -> Self {
        self.emit_vertex_inputs = enabled;
        self
    }

    /// Sets the uniform block instance name of `scope`.
    #[must_use]
    pub fn with_block_label(mut self, scope: BlockScope, label: impl Into<String>) -> Self {
        match scope {
            BlockScope::Material => self.material_block_label = label.into(),
            BlockScope::Node => self.node_block_label = label.into(),
        }
        self
    }

    /// Sets the sampler array name of `scope`.
    #[must_use]
    pub fn with_texture_label(mut self, scope: BlockScope, label: impl Into<String>) -> Self {
        match scope {
            BlockScope::Material => self.material_texture_label = label.into(),
            BlockScope::Node => self.node_texture_label = label.into(),
        }
        self
    }

    /// Uniform block instance name of `scope`.
    pub fn block_label(&self, scope: BlockScope) -> &str {
        match scope {
            BlockScope::Material => &self.material_block_label,
            BlockScope::Node => &self.node_block_label,
        }
    }

    /// Sampler array name of `scope`.
    pub fn texture_label(&self, scope: BlockScope) -> &str {
        match scope {
            BlockScope::Material => &self.material_texture_label,
            BlockScope::Node => &self.node_texture_label,
        }
    }
}

/// Output of one preprocessing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessResult {
    /// Compilable GLSL.
    pub compiled_source: String,
    pub material_variables: Vec<ShaderVariable>,
    pub node_variables: Vec<ShaderVariable>,
    pub material_textures: Vec<TextureSlot>,
    pub node_textures: Vec<TextureSlot>,
    material_layout: BlockLayout,
    node_layout: BlockLayout,
}

static_assertions::assert_impl_all!(PreprocessResult: Send, Sync);

impl PreprocessResult {
    /// Offsets and size of the material uniform block.
    pub fn material_layout(&self) -> &BlockLayout {
        &self.material_layout
    }

    /// Offsets and size of the node uniform block.
    pub fn node_layout(&self) -> &BlockLayout {
        &self.node_layout
    }

    /// Layout of the uniform block of `scope`.
    pub fn layout(&self, scope: BlockScope) -> &BlockLayout {
        match scope {
            BlockScope::Material => &self.material_layout,
            BlockScope::Node => &self.node_layout,
        }
    }

    /// Material (set 1) and node (set 2) descriptor entries.
    pub fn descriptor_entries(&self) -> (Vec<DescriptorSetEntry>, Vec<DescriptorSetEntry>) {
        assemble_sets(
            self.material_textures.len() as u32,
            self.node_textures.len() as u32,
        )
    }

    /// Builds an editable definition from the extracted declarations.
    ///
    /// Texture slot counts are the extracted texture list lengths.
    pub fn to_material_definition(&self, domain: MaterialDomain) -> MaterialResult<MaterialDefinition> {
        let mut def = MaterialDefinition::new().with_domain(domain);
        def.set_texture_slot_count(BlockScope::Material, self.material_textures.len() as u32);
        def.set_texture_slot_count(BlockScope::Node, self.node_textures.len() as u32);
        for var in &self.material_variables {
            def.add_variable(BlockScope::Material, var.clone())?;
        }
        for var in &self.node_variables {
            def.add_variable(BlockScope::Node, var.clone())?;
        }
        Ok(def)
    }
}

/// Annotated shader preprocessor.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    /// Creates a preprocessor with the given settings.
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// The active settings.
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Extracts every annotation from `source` and generates compilable GLSL.
    ///
    /// Fails without partial output on the first malformed declaration,
    /// duplicate name, name that collides with a configured label or block
    /// that outgrows the uniform block limit.
    pub fn preprocess(&self, source: &str, stage: ShaderStage) -> MaterialResult<PreprocessResult> {
        profile_function!();

        let [material_vars, node_vars, material_tex, node_tex] = Tag::PROCESSING_ORDER;
        let material = extract(source, material_vars)?;
        let node = extract(&material.remaining_source, node_vars)?;
        let material_textures = extract(&node.remaining_source, material_tex)?;
        let mut node_textures = extract(&material_textures.remaining_source, node_tex)?;

        let remaining_source = std::mem::take(&mut node_textures.remaining_source);
        let material_variables = material.into_variables();
        let node_variables = node.into_variables();
        let material_textures = material_textures.into_textures();
        let node_textures = node_textures.into_textures();

        validate_unique(
            &material_variables,
            &node_variables,
            &material_textures,
            &node_textures,
        )?;
        let reserved: Vec<String> = BlockScope::ALL
            .into_iter()
            .flat_map(|scope| {
                generated_names(self.config.block_label(scope), self.config.texture_label(scope))
            })
            .collect();
        validate_not_reserved(
            material_variables
                .iter()
                .chain(&node_variables)
                .map(|v| v.name.as_str())
                .chain(
                    material_textures
                        .iter()
                        .chain(&node_textures)
                        .map(|t| t.name.as_str()),
                ),
            &reserved,
        )?;

        let material_layout = BlockLayout::try_compute(&material_variables)?;
        let node_layout = BlockLayout::try_compute(&node_variables)?;

        let mut compiled_source = format!("#version {}\n\n", self.config.glsl_version);
        if stage.has_vertex_inputs() && self.config.emit_vertex_inputs {
            compiled_source.push_str(VERTEX_INPUTS);
            compiled_source.push('\n');
        }
        push_section(&mut compiled_source, &self.config.scene_header);
        for (scope, vars, textures) in [
            (BlockScope::Material, &material_variables, &material_textures),
            (BlockScope::Node, &node_variables, &node_textures),
        ] {
            push_section(
                &mut compiled_source,
                &emit_uniform_block(
                    vars,
                    self.config.block_label(scope),
                    scope.set_index(),
                    UNIFORM_BINDING,
                ),
            );
            push_section(
                &mut compiled_source,
                &emit_texture_block(
                    textures,
                    self.config.texture_label(scope),
                    scope.set_index(),
                    TEXTURE_BINDING,
                ),
            );
        }
        compiled_source.push_str(&remaining_source);

        log::debug!(
            "Preprocessed {:?} shader: {} material / {} node variables ({} / {} bytes), {} / {} textures",
            stage,
            material_variables.len(),
            node_variables.len(),
            material_layout.size,
            node_layout.size,
            material_textures.len(),
            node_textures.len()
        );

        Ok(PreprocessResult {
            compiled_source,
            material_variables,
            node_variables,
            material_textures,
            node_textures,
            material_layout,
            node_layout,
        })
    }
}

/// Appends a non-empty section followed by a blank line.
fn push_section(out: &mut String, section: &str) {
    if section.is_empty() {
        return;
    }
    out.push_str(section);
    if !section.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
}

/// Preprocesses `source` with the default settings.
pub fn preprocess(source: &str, stage: ShaderStage) -> MaterialResult<PreprocessResult> {
    Preprocessor::default().preprocess(source, stage)
}
