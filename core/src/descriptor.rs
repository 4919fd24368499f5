//! Descriptor-set geometry for material and node data.
//!
//! The set/binding addresses are fixed:
//!
//! | Set | Binding | Contents |
//! |-----|---------|----------|
//! | 0 | 0 | Scene uniform block (owned by the renderer, never produced here) |
//! | 1 | 0 | Material uniform block |
//! | 1 | 1 | Material texture array (only when non-empty) |
//! | 2 | 0 | Node uniform block |
//! | 2 | 1 | Node texture array (only when non-empty) |
//!
//! Entries are plain data for the pipeline builder that allocates the real
//! graphics-API objects.

use serde::{Deserialize, Serialize};

/// Descriptor set of the scene-global uniform block.
pub const SCENE_SET_INDEX: u32 = 0;
/// Descriptor set holding material data.
pub const MATERIAL_SET_INDEX: u32 = 1;
/// Descriptor set holding node data.
pub const NODE_SET_INDEX: u32 = 2;
/// Binding of the uniform block inside a material or node set.
pub const UNIFORM_BINDING: u32 = 0;
/// Binding of the texture array inside a material or node set.
pub const TEXTURE_BINDING: u32 = 1;

bitflags::bitflags! {
    /// Shader stages that can access a binding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        /// Vertex shader stage.
        const VERTEX = 1 << 0;
        /// Fragment shader stage.
        const FRAGMENT = 1 << 1;
        /// Compute shader stage.
        const COMPUTE = 1 << 2;
    }
}

/// Owner of a uniform block and texture array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockScope {
    /// Per-material data, shared by every node using the material.
    Material,
    /// Per-node data, written by the scene graph for each drawn node.
    Node,
}

impl BlockScope {
    /// Both scopes, in processing order.
    pub const ALL: [Self; 2] = [Self::Material, Self::Node];

    /// Descriptor set index of this scope.
    pub fn set_index(self) -> u32 {
        match self {
            Self::Material => MATERIAL_SET_INDEX,
            Self::Node => NODE_SET_INDEX,
        }
    }

    /// Default instance name of the uniform block.
    pub fn block_label(self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Node => "node",
        }
    }

    /// Default name of the texture array.
    pub fn texture_label(self) -> &'static str {
        match self {
            Self::Material => "material_textures",
            Self::Node => "node_textures",
        }
    }
}

/// Kind of resource behind a descriptor binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Uniform buffer.
    Uniform,
    /// Array of combined 2D image samplers.
    Sampler,
}

/// One binding inside a descriptor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetEntry {
    /// Descriptor set index.
    pub set_index: u32,
    /// Binding index within the set.
    pub binding_index: u32,
    /// Resource kind.
    pub kind: DescriptorKind,
    /// Number of descriptors (array length for samplers, 1 for uniforms).
    pub count: u32,
    /// Shader stages that can access the binding.
    pub visibility: ShaderStageFlags,
}

impl DescriptorSetEntry {
    /// Create a new entry visible to vertex and fragment stages.
    pub fn new(set_index: u32, binding_index: u32, kind: DescriptorKind, count: u32) -> Self {
        Self {
            set_index,
            binding_index,
            kind,
            count,
            visibility: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
        }
    }

    /// Set the shader stage visibility.
    #[must_use]
    pub fn with_visibility(mut self, visibility: ShaderStageFlags) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Build the entries of one set.
///
/// There is always exactly one uniform entry; the sampler entry is present
/// only when `texture_count > 0`.
pub fn assemble_set(scope: BlockScope, texture_count: u32) -> Vec<DescriptorSetEntry> {
    let set = scope.set_index();
    let mut entries = vec![DescriptorSetEntry::new(
        set,
        UNIFORM_BINDING,
        DescriptorKind::Uniform,
        1,
    )];
    if texture_count > 0 {
        entries.push(DescriptorSetEntry::new(
            set,
            TEXTURE_BINDING,
            DescriptorKind::Sampler,
            texture_count,
        ));
    }
    entries
}

/// Build the material (set 1) and node (set 2) entries for the given texture
/// slot counts.
pub fn assemble_sets(
    material_texture_count: u32,
    node_texture_count: u32,
) -> (Vec<DescriptorSetEntry>, Vec<DescriptorSetEntry>) {
    (
        assemble_set(BlockScope::Material, material_texture_count),
        assemble_set(BlockScope::Node, node_texture_count),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untextured_set_has_single_uniform() {
        let entries = assemble_set(BlockScope::Material, 0);
        assert_eq!(
            entries,
            vec![DescriptorSetEntry::new(1, 0, DescriptorKind::Uniform, 1)]
        );
    }

    #[test]
    fn test_textured_set_adds_sampler_array() {
        let entries = assemble_set(BlockScope::Node, 3);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].set_index, 2);
        assert_eq!(entries[1].binding_index, 1);
        assert_eq!(entries[1].kind, DescriptorKind::Sampler);
        assert_eq!(entries[1].count, 3);
    }

    #[test]
    fn test_scene_set_never_produced() {
        let (material, node) = assemble_sets(2, 2);
        assert!(material
            .iter()
            .chain(node.iter())
            .all(|e| e.set_index != SCENE_SET_INDEX));
    }

    #[test]
    fn test_entry_visibility() {
        let entry = DescriptorSetEntry::new(1, 0, DescriptorKind::Uniform, 1)
            .with_visibility(ShaderStageFlags::FRAGMENT);
        assert_eq!(entry.visibility, ShaderStageFlags::FRAGMENT);
        assert!(!entry.visibility.contains(ShaderStageFlags::VERTEX));
    }

    #[test]
    fn test_scope_labels() {
        assert_eq!(BlockScope::Material.set_index(), 1);
        assert_eq!(BlockScope::Node.set_index(), 2);
        assert_eq!(BlockScope::Node.texture_label(), "node_textures");
    }
}
