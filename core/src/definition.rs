//! Editable material definitions.
//!
//! A [`MaterialDefinition`] is the long-lived schema of a material: its render
//! domain, texture slot counts and the ordered material/node variable lists.
//! Editing tools mutate it through ordered insert/remove/move/rename
//! operations; the derived block layouts and descriptor entries are
//! recomputed lazily on the next read, so a batch of edits costs one layout
//! pass.
//!
//! Every mutator either succeeds completely or fails without touching the
//! definition.
//!
//! The definition has no internal synchronization. Concurrent editors must
//! serialize access themselves.
//!
//! # Example
//!
//! ```
//! use shadertag_core::data_type::ShaderDataType;
//! use shadertag_core::definition::MaterialDefinition;
//! use shadertag_core::descriptor::BlockScope;
//! use shadertag_core::variable::{SemanticBinding, ShaderVariable};
//!
//! let mut def = MaterialDefinition::new();
//! def.add_variable(BlockScope::Material, ShaderVariable::new("albedo", ShaderDataType::Vec3))?;
//! def.add_variable(
//!     BlockScope::Node,
//!     ShaderVariable::new("model", ShaderDataType::MAT4)
//!         .with_semantic_binding(SemanticBinding::NodeModelMatrix),
//! )?;
//!
//! assert_eq!(def.material_uniform_block_size(), 16);
//! assert_eq!(def.lookup_binding(BlockScope::Node, SemanticBinding::NodeModelMatrix), Some(0));
//! # Ok::<(), shadertag_core::error::MaterialError>(())
//! ```

use std::cell::OnceCell;

use serde::{Deserialize, Serialize};

use crate::descriptor::{BlockScope, DescriptorSetEntry, assemble_set};
use crate::error::{MaterialError, MaterialResult};
use crate::layout::{BlockLayout, MAX_UNIFORM_BLOCK_SIZE};
use crate::namespace::{is_default_generated_name, validate_unique_names};
use crate::variable::{SemanticBinding, ShaderVariable, is_valid_identifier};

/// Render-pass category of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialDomain {
    /// Rendered in the opaque pass.
    #[default]
    Opaque,
    /// Rendered in the transparent pass, after opaque geometry.
    Transparent,
    /// Rendered on top of the scene.
    Overlay,
}

/// Layouts and descriptor entries derived from the variable lists.
#[derive(Debug, Clone)]
struct Derived {
    material_layout: BlockLayout,
    node_layout: BlockLayout,
    material_entries: Vec<DescriptorSetEntry>,
    node_entries: Vec<DescriptorSetEntry>,
}

/// Editable material schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialDefinition {
    domain: MaterialDomain,
    material_texture_slot_count: u32,
    node_texture_slot_count: u32,
    material_variables: Vec<ShaderVariable>,
    node_variables: Vec<ShaderVariable>,
    #[serde(skip)]
    derived: OnceCell<Derived>,
}

impl MaterialDefinition {
    /// Creates an empty opaque definition with no variables or texture slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the render domain.
    #[must_use]
    pub fn with_domain(mut self, domain: MaterialDomain) -> Self {
        self.domain = domain;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Render domain.
    pub fn domain(&self) -> MaterialDomain {
        self.domain
    }

    /// Texture slot count of `scope`.
    pub fn texture_slot_count(&self, scope: BlockScope) -> u32 {
        match scope {
            BlockScope::Material => self.material_texture_slot_count,
            BlockScope::Node => self.node_texture_slot_count,
        }
    }

    /// Number of material texture slots.
    pub fn material_texture_slot_count(&self) -> u32 {
        self.material_texture_slot_count
    }

    /// Number of node texture slots.
    pub fn node_texture_slot_count(&self) -> u32 {
        self.node_texture_slot_count
    }

    /// Ordered variable list of `scope`.
    pub fn variables(&self, scope: BlockScope) -> &[ShaderVariable] {
        match scope {
            BlockScope::Material => &self.material_variables,
            BlockScope::Node => &self.node_variables,
        }
    }

    /// Ordered material variables.
    pub fn material_variables(&self) -> &[ShaderVariable] {
        &self.material_variables
    }

    /// Ordered node variables.
    pub fn node_variables(&self) -> &[ShaderVariable] {
        &self.node_variables
    }

    /// Variable at `index` in `scope`.
    pub fn variable(&self, scope: BlockScope, index: usize) -> Option<&ShaderVariable> {
        self.variables(scope).get(index)
    }

    /// Find a variable by name in either list.
    pub fn find_variable(&self, name: &str) -> Option<(BlockScope, usize)> {
        BlockScope::ALL.into_iter().find_map(|scope| {
            self.variables(scope)
                .iter()
                .position(|v| v.name == name)
                .map(|index| (scope, index))
        })
    }

    /// Whether any variable in either list is called `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.find_variable(name).is_some()
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    /// Set the render domain.
    pub fn set_domain(&mut self, domain: MaterialDomain) {
        self.domain = domain;
    }

    /// Set the texture slot count of `scope`.
    pub fn set_texture_slot_count(&mut self, scope: BlockScope, count: u32) {
        match scope {
            BlockScope::Material => self.material_texture_slot_count = count,
            BlockScope::Node => self.node_texture_slot_count = count,
        }
        self.invalidate();
    }

    /// Append a variable to `scope`.
    pub fn add_variable(&mut self, scope: BlockScope, variable: ShaderVariable) -> MaterialResult {
        let index = self.variables(scope).len();
        self.insert_variable(scope, index, variable)
    }

    /// Insert a variable into `scope` at `index`, shifting later variables.
    ///
    /// Fails with [`MaterialError::DuplicateName`] if the name is already used
    /// by any variable of this definition, and with
    /// [`MaterialError::BlockTooLarge`] if the block would outgrow
    /// [`MAX_UNIFORM_BLOCK_SIZE`].
    pub fn insert_variable(
        &mut self,
        scope: BlockScope,
        index: usize,
        variable: ShaderVariable,
    ) -> MaterialResult {
        let len = self.variables(scope).len();
        if index > len {
            return Err(MaterialError::IndexOutOfRange { index, len });
        }
        check_variable(&variable)?;
        if self.contains_name(&variable.name) {
            return Err(MaterialError::DuplicateName(variable.name));
        }
        if let Some(binding) = variable.semantic_binding {
            self.check_semantic_binding(scope, None, &variable, binding)?;
        }

        log::trace!(
            "Inserting {} variable '{}' at {}",
            scope.block_label(),
            variable.name,
            index
        );
        let mut vars = self.variables(scope).to_vec();
        vars.insert(index, variable);
        BlockLayout::try_compute(&vars)?;
        *self.variables_mut(scope) = vars;
        self.invalidate();
        Ok(())
    }

    /// Remove and return the variable at `index` in `scope`.
    pub fn remove_variable(
        &mut self,
        scope: BlockScope,
        index: usize,
    ) -> MaterialResult<ShaderVariable> {
        self.check_index(scope, index)?;
        let removed = self.variables_mut(scope).remove(index);
        log::trace!("Removed {} variable '{}'", scope.block_label(), removed.name);
        self.invalidate();
        Ok(removed)
    }

    /// Move the variable at `from` so that it ends up at index `to`.
    ///
    /// Reordering changes padding, so this can also fail with
    /// [`MaterialError::BlockTooLarge`].
    pub fn move_variable(&mut self, scope: BlockScope, from: usize, to: usize) -> MaterialResult {
        self.check_index(scope, from)?;
        self.check_index(scope, to)?;
        if from == to {
            return Ok(());
        }
        let mut vars = self.variables(scope).to_vec();
        let variable = vars.remove(from);
        vars.insert(to, variable);
        BlockLayout::try_compute(&vars)?;
        *self.variables_mut(scope) = vars;
        self.invalidate();
        Ok(())
    }

    /// Rename the variable at `index` in `scope`.
    ///
    /// Renaming a variable to its current name is a no-op.
    pub fn rename_variable(
        &mut self,
        scope: BlockScope,
        index: usize,
        new_name: impl Into<String>,
    ) -> MaterialResult {
        self.check_index(scope, index)?;
        let new_name = new_name.into();
        if self.variables(scope)[index].name == new_name {
            return Ok(());
        }
        check_name(&new_name)?;
        if self.contains_name(&new_name) {
            return Err(MaterialError::DuplicateName(new_name));
        }
        self.variables_mut(scope)[index].name = new_name;
        self.invalidate();
        Ok(())
    }

    /// Set or clear the semantic binding of the variable at `index` in `scope`.
    ///
    /// Returns the previous binding. Fails with
    /// [`MaterialError::DuplicateSemanticBinding`] if another variable in the
    /// same list already claims `binding`, and with
    /// [`MaterialError::SemanticTypeMismatch`] if the variable's type does not
    /// match the binding.
    pub fn set_semantic_binding(
        &mut self,
        scope: BlockScope,
        index: usize,
        binding: Option<SemanticBinding>,
    ) -> MaterialResult<Option<SemanticBinding>> {
        self.check_index(scope, index)?;
        if let Some(binding) = binding {
            let variable = &self.variables(scope)[index];
            self.check_semantic_binding(scope, Some(index), variable, binding)?;
        }
        let variable = &mut self.variables_mut(scope)[index];
        let previous = std::mem::replace(&mut variable.semantic_binding, binding);
        Ok(previous)
    }

    // ------------------------------------------------------------------
    // Derived data
    // ------------------------------------------------------------------

    /// Block layout of `scope`.
    pub fn layout(&self, scope: BlockScope) -> &BlockLayout {
        let derived = self.derived();
        match scope {
            BlockScope::Material => &derived.material_layout,
            BlockScope::Node => &derived.node_layout,
        }
    }

    /// Uniform block size of `scope` in bytes.
    pub fn uniform_block_size(&self, scope: BlockScope) -> u32 {
        self.layout(scope).size
    }

    /// Material uniform block size in bytes.
    pub fn material_uniform_block_size(&self) -> u32 {
        self.uniform_block_size(BlockScope::Material)
    }

    /// Node uniform block size in bytes.
    pub fn node_uniform_block_size(&self) -> u32 {
        self.uniform_block_size(BlockScope::Node)
    }

    /// Descriptor entries of `scope`.
    pub fn descriptor_entries(&self, scope: BlockScope) -> &[DescriptorSetEntry] {
        let derived = self.derived();
        match scope {
            BlockScope::Material => &derived.material_entries,
            BlockScope::Node => &derived.node_entries,
        }
    }

    /// Material set (set 1) descriptor entries.
    pub fn material_descriptor_entries(&self) -> &[DescriptorSetEntry] {
        self.descriptor_entries(BlockScope::Material)
    }

    /// Node set (set 2) descriptor entries.
    pub fn node_descriptor_entries(&self) -> &[DescriptorSetEntry] {
        self.descriptor_entries(BlockScope::Node)
    }

    /// Byte offset of the variable named `name` in `scope`.
    pub fn offset_of(&self, scope: BlockScope, name: &str) -> Option<u32> {
        self.layout(scope)
            .offset_of_name(self.variables(scope), name)
    }

    /// Byte offset of the variable in `scope` that receives `binding`.
    pub fn lookup_binding(&self, scope: BlockScope, binding: SemanticBinding) -> Option<u32> {
        let index = self
            .variables(scope)
            .iter()
            .position(|v| v.semantic_binding == Some(binding))?;
        self.layout(scope).offset_of(index)
    }

    /// Re-check every invariant.
    ///
    /// Mutators keep the definition valid; this is for definitions restored
    /// by a persistence layer.
    pub fn validate(&self) -> MaterialResult {
        let names = self
            .material_variables
            .iter()
            .chain(&self.node_variables)
            .map(|v| v.name.as_str());
        validate_unique_names(names)?;

        for scope in BlockScope::ALL {
            for (index, variable) in self.variables(scope).iter().enumerate() {
                check_variable(variable)?;
                if let Some(binding) = variable.semantic_binding {
                    self.check_semantic_binding(scope, Some(index), variable, binding)?;
                }
            }
            BlockLayout::try_compute(self.variables(scope))?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn variables_mut(&mut self, scope: BlockScope) -> &mut Vec<ShaderVariable> {
        match scope {
            BlockScope::Material => &mut self.material_variables,
            BlockScope::Node => &mut self.node_variables,
        }
    }

    fn check_index(&self, scope: BlockScope, index: usize) -> MaterialResult {
        let len = self.variables(scope).len();
        if index >= len {
            return Err(MaterialError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    /// `own_index` is the variable's current position, skipped when looking
    /// for other claimants.
    fn check_semantic_binding(
        &self,
        scope: BlockScope,
        own_index: Option<usize>,
        variable: &ShaderVariable,
        binding: SemanticBinding,
    ) -> MaterialResult {
        if !binding.accepts(variable) {
            return Err(MaterialError::SemanticTypeMismatch {
                binding,
                variable: variable.name.clone(),
                found: variable.data_type,
                count: variable.count,
            });
        }
        let claimant = self
            .variables(scope)
            .iter()
            .enumerate()
            .find(|(i, v)| Some(*i) != own_index && v.semantic_binding == Some(binding));
        if let Some((_, existing)) = claimant {
            return Err(MaterialError::DuplicateSemanticBinding {
                binding,
                existing: existing.name.clone(),
                requested: variable.name.clone(),
            });
        }
        Ok(())
    }

    fn derived(&self) -> &Derived {
        self.derived.get_or_init(|| {
            log::trace!("Recomputing material layout");
            Derived {
                material_layout: BlockLayout::compute(&self.material_variables),
                node_layout: BlockLayout::compute(&self.node_variables),
                material_entries: assemble_set(
                    BlockScope::Material,
                    self.material_texture_slot_count,
                ),
                node_entries: assemble_set(BlockScope::Node, self.node_texture_slot_count),
            }
        })
    }

    fn invalidate(&mut self) {
        self.derived.take();
    }
}

impl PartialEq for MaterialDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain
            && self.material_texture_slot_count == other.material_texture_slot_count
            && self.node_texture_slot_count == other.node_texture_slot_count
            && self.material_variables == other.material_variables
            && self.node_variables == other.node_variables
    }
}

fn check_name(name: &str) -> MaterialResult {
    if !is_valid_identifier(name) {
        return Err(MaterialError::InvalidName(name.to_string()));
    }
    if is_default_generated_name(name) {
        return Err(MaterialError::ReservedName(name.to_string()));
    }
    Ok(())
}

fn check_variable(variable: &ShaderVariable) -> MaterialResult {
    check_name(&variable.name)?;
    if variable.count == 0 {
        return Err(MaterialError::InvalidArrayCount {
            variable: variable.name.clone(),
        });
    }
    Ok(())
}

/// Material (set 1) and node (set 2) descriptor entries of `def`.
pub fn assemble(def: &MaterialDefinition) -> (Vec<DescriptorSetEntry>, Vec<DescriptorSetEntry>) {
    (
        def.material_descriptor_entries().to_vec(),
        def.node_descriptor_entries().to_vec(),
    )
}

// Single-writer value: movable between threads, never shared.
static_assertions::assert_impl_all!(MaterialDefinition: Send);
static_assertions::assert_not_impl_any!(MaterialDefinition: Sync);
