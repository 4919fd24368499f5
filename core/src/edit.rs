//! Reversible edits of a [`MaterialDefinition`].
//!
//! Each state transition of a definition has a matching edit command that
//! captures enough state to undo itself. [`EditHistory`] keeps a bounded
//! undo/redo stack of them for editing tools.
//!
//! - [`MaterialEdit`] - a reversible edit (Command pattern)
//! - [`EditHistory`] - undo/redo stack
//! - [`AddVariable`], [`RemoveVariable`], [`MoveVariable`], [`RenameVariable`],
//!   [`SetSemanticBinding`], [`SetDomain`], [`SetTextureSlotCount`] - the edits
//!
//! An edit that fails is not recorded and leaves the definition untouched.
//!
//! # Merging
//!
//! Consecutive renames of the same variable (one per keystroke in a text
//! field) collapse into a single undo step. Call
//! [`EditHistory::break_merge`] when the user leaves the field.
//!
//! # Example
//!
//! ```
//! use shadertag_core::data_type::ShaderDataType;
//! use shadertag_core::definition::MaterialDefinition;
//! use shadertag_core::descriptor::BlockScope;
//! use shadertag_core::edit::{AddVariable, EditHistory, RenameVariable};
//! use shadertag_core::variable::ShaderVariable;
//!
//! let mut def = MaterialDefinition::new();
//! let mut history = EditHistory::default();
//!
//! let albedo = ShaderVariable::new("albedo", ShaderDataType::Vec3);
//! history.execute(Box::new(AddVariable::new(BlockScope::Material, albedo)), &mut def)?;
//! history.execute(Box::new(RenameVariable::new(BlockScope::Material, 0, "base_color")), &mut def)?;
//! assert_eq!(def.material_variables()[0].name, "base_color");
//!
//! history.undo(&mut def)?;
//! assert_eq!(def.material_variables()[0].name, "albedo");
//! # Ok::<(), shadertag_core::edit::EditError>(())
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;

use crate::definition::{MaterialDefinition, MaterialDomain};
use crate::descriptor::BlockScope;
use crate::error::MaterialError;
use crate::variable::{SemanticBinding, ShaderVariable};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Error type for edit execution failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The definition rejected the edit.
    Material(MaterialError),
    /// The undo stack is empty.
    NothingToUndo,
    /// The redo stack is empty.
    NothingToRedo,
    /// `undo` was called on an edit that was never applied.
    NotApplied(&'static str),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Material(err) => write!(f, "{err}"),
            Self::NothingToUndo => write!(f, "nothing to undo"),
            Self::NothingToRedo => write!(f, "nothing to redo"),
            Self::NotApplied(what) => write!(f, "cannot undo '{what}': it was never applied"),
        }
    }
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Material(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MaterialError> for EditError {
    fn from(err: MaterialError) -> Self {
        Self::Material(err)
    }
}

/// Result type for edit operations.
pub type EditResult<T = ()> = Result<T, EditError>;

/// A reversible edit of a [`MaterialDefinition`].
pub trait MaterialEdit: fmt::Debug + Send + 'static {
    /// Applies the edit (forward / redo direction).
    fn apply(&mut self, def: &mut MaterialDefinition) -> EditResult;

    /// Reverses the edit. Must restore the definition to its state before
    /// [`apply`](Self::apply).
    fn undo(&mut self, def: &mut MaterialDefinition) -> EditResult;

    /// Short description for an edit menu, e.g. `"Rename variable"`.
    fn description(&self) -> &str;

    /// Returns `self` as `&dyn Any` so [`merge`](Self::merge) can downcast.
    fn as_any(&self) -> &dyn Any;

    /// Tries to absorb an already-applied `other` into `self`.
    ///
    /// Returns `None` if `other` was consumed, or gives it back.
    fn merge(&mut self, other: Box<dyn MaterialEdit>) -> Option<Box<dyn MaterialEdit>> {
        Some(other)
    }
}

// ----------------------------------------------------------------------------
// Variable edits
// ----------------------------------------------------------------------------

/// Insert a variable, at the end of the list unless an index is given.
#[derive(Debug)]
pub struct AddVariable {
    scope: BlockScope,
    index: Option<usize>,
    variable: ShaderVariable,
    inserted_at: Option<usize>,
}

impl AddVariable {
    /// Append `variable` to `scope`.
    pub fn new(scope: BlockScope, variable: ShaderVariable) -> Self {
        Self {
            scope,
            index: None,
            variable,
            inserted_at: None,
        }
    }

    /// Insert `variable` into `scope` at `index`.
    pub fn at(scope: BlockScope, index: usize, variable: ShaderVariable) -> Self {
        Self {
            index: Some(index),
            ..Self::new(scope, variable)
        }
    }
}

impl MaterialEdit for AddVariable {
    fn apply(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let index = self
            .index
            .unwrap_or_else(|| def.variables(self.scope).len());
        def.insert_variable(self.scope, index, self.variable.clone())?;
        self.inserted_at = Some(index);
        Ok(())
    }

    fn undo(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let index = self
            .inserted_at
            .take()
            .ok_or(EditError::NotApplied("Add variable"))?;
        def.remove_variable(self.scope, index)?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Add variable"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Remove the variable at an index.
#[derive(Debug)]
pub struct RemoveVariable {
    scope: BlockScope,
    index: usize,
    removed: Option<ShaderVariable>,
}

impl RemoveVariable {
    /// Remove the variable at `index` in `scope`.
    pub fn new(scope: BlockScope, index: usize) -> Self {
        Self {
            scope,
            index,
            removed: None,
        }
    }
}

impl MaterialEdit for RemoveVariable {
    fn apply(&mut self, def: &mut MaterialDefinition) -> EditResult {
        self.removed = Some(def.remove_variable(self.scope, self.index)?);
        Ok(())
    }

    fn undo(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let variable = self
            .removed
            .take()
            .ok_or(EditError::NotApplied("Remove variable"))?;
        if let Err(err) = def.insert_variable(self.scope, self.index, variable.clone()) {
            self.removed = Some(variable);
            return Err(err.into());
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Remove variable"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Move a variable to another position in its list.
#[derive(Debug)]
pub struct MoveVariable {
    scope: BlockScope,
    from: usize,
    to: usize,
}

impl MoveVariable {
    /// Move the variable at `from` to `to` within `scope`.
    pub fn new(scope: BlockScope, from: usize, to: usize) -> Self {
        Self { scope, from, to }
    }
}

impl MaterialEdit for MoveVariable {
    fn apply(&mut self, def: &mut MaterialDefinition) -> EditResult {
        def.move_variable(self.scope, self.from, self.to)?;
        Ok(())
    }

    fn undo(&mut self, def: &mut MaterialDefinition) -> EditResult {
        def.move_variable(self.scope, self.to, self.from)?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Move variable"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Rename the variable at an index.
#[derive(Debug)]
pub struct RenameVariable {
    scope: BlockScope,
    index: usize,
    new_name: String,
    old_name: Option<String>,
}

impl RenameVariable {
    /// Rename the variable at `index` in `scope` to `new_name`.
    pub fn new(scope: BlockScope, index: usize, new_name: impl Into<String>) -> Self {
        Self {
            scope,
            index,
            new_name: new_name.into(),
            old_name: None,
        }
    }
}

impl MaterialEdit for RenameVariable {
    fn apply(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let current = def
            .variable(self.scope, self.index)
            .map(|v| v.name.clone())
            .ok_or(MaterialError::IndexOutOfRange {
                index: self.index,
                len: def.variables(self.scope).len(),
            })?;
        def.rename_variable(self.scope, self.index, self.new_name.clone())?;
        self.old_name = Some(current);
        Ok(())
    }

    fn undo(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let old_name = self
            .old_name
            .clone()
            .ok_or(EditError::NotApplied("Rename variable"))?;
        def.rename_variable(self.scope, self.index, old_name)?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Rename variable"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn merge(&mut self, other: Box<dyn MaterialEdit>) -> Option<Box<dyn MaterialEdit>> {
        if let Some(next) = other.as_any().downcast_ref::<Self>() {
            if next.scope == self.scope && next.index == self.index {
                self.new_name = next.new_name.clone();
                return None;
            }
        }
        Some(other)
    }
}

/// Set or clear the semantic binding of a variable.
#[derive(Debug)]
pub struct SetSemanticBinding {
    scope: BlockScope,
    index: usize,
    binding: Option<SemanticBinding>,
    previous: Option<Option<SemanticBinding>>,
}

impl SetSemanticBinding {
    /// Bind (or with `None`, unbind) the variable at `index` in `scope`.
    pub fn new(scope: BlockScope, index: usize, binding: Option<SemanticBinding>) -> Self {
        Self {
            scope,
            index,
            binding,
            previous: None,
        }
    }
}

impl MaterialEdit for SetSemanticBinding {
    fn apply(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let previous = def.set_semantic_binding(self.scope, self.index, self.binding)?;
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let previous = self
            .previous
            .take()
            .ok_or(EditError::NotApplied("Set semantic binding"))?;
        def.set_semantic_binding(self.scope, self.index, previous)?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Set semantic binding"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ----------------------------------------------------------------------------
// Definition-level edits
// ----------------------------------------------------------------------------

/// Change the render domain.
#[derive(Debug)]
pub struct SetDomain {
    domain: MaterialDomain,
    previous: Option<MaterialDomain>,
}

impl SetDomain {
    /// Switch the definition to `domain`.
    pub fn new(domain: MaterialDomain) -> Self {
        Self {
            domain,
            previous: None,
        }
    }
}

impl MaterialEdit for SetDomain {
    fn apply(&mut self, def: &mut MaterialDefinition) -> EditResult {
        self.previous = Some(def.domain());
        def.set_domain(self.domain);
        Ok(())
    }

    fn undo(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let previous = self
            .previous
            .take()
            .ok_or(EditError::NotApplied("Set domain"))?;
        def.set_domain(previous);
        Ok(())
    }

    fn description(&self) -> &str {
        "Set domain"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Change the texture slot count of one scope.
#[derive(Debug)]
pub struct SetTextureSlotCount {
    scope: BlockScope,
    count: u32,
    previous: Option<u32>,
}

impl SetTextureSlotCount {
    /// Give `scope` `count` texture slots.
    pub fn new(scope: BlockScope, count: u32) -> Self {
        Self {
            scope,
            count,
            previous: None,
        }
    }
}

impl MaterialEdit for SetTextureSlotCount {
    fn apply(&mut self, def: &mut MaterialDefinition) -> EditResult {
        self.previous = Some(def.texture_slot_count(self.scope));
        def.set_texture_slot_count(self.scope, self.count);
        Ok(())
    }

    fn undo(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let previous = self
            .previous
            .take()
            .ok_or(EditError::NotApplied("Set texture slot count"))?;
        def.set_texture_slot_count(self.scope, previous);
        Ok(())
    }

    fn description(&self) -> &str {
        "Set texture slot count"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ----------------------------------------------------------------------------
// EditHistory
// ----------------------------------------------------------------------------

/// Linear undo/redo stack of [`MaterialEdit`]s.
///
/// The undo stack is bounded: when it exceeds `max_undo`, the oldest edit is
/// dropped. Executing a new edit clears the redo stack.
pub struct EditHistory {
    undo_stack: VecDeque<Box<dyn MaterialEdit>>,
    redo_stack: Vec<Box<dyn MaterialEdit>>,
    max_undo: usize,
    merge_broken: bool,
}

impl EditHistory {
    /// Creates an empty history keeping at most `max_undo` steps.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo,
            merge_broken: false,
        }
    }

    /// Applies `edit` and records it.
    ///
    /// If the edit fails it is not recorded and the definition is unchanged.
    pub fn execute(
        &mut self,
        mut edit: Box<dyn MaterialEdit>,
        def: &mut MaterialDefinition,
    ) -> EditResult {
        edit.apply(def)?;
        log::trace!("Executed edit: {}", edit.description());

        self.redo_stack.clear();

        if !self.merge_broken {
            if let Some(last) = self.undo_stack.back_mut() {
                match last.merge(edit) {
                    None => return Ok(()),
                    Some(returned) => edit = returned,
                }
            }
        }
        self.merge_broken = false;

        self.undo_stack.push_back(edit);
        if self.undo_stack.len() > self.max_undo {
            self.undo_stack.pop_front();
        }
        Ok(())
    }

    /// Undoes the most recent edit.
    pub fn undo(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let mut edit = self.undo_stack.pop_back().ok_or(EditError::NothingToUndo)?;
        if let Err(err) = edit.undo(def) {
            self.undo_stack.push_back(edit);
            return Err(err);
        }
        self.redo_stack.push(edit);
        self.merge_broken = true;
        Ok(())
    }

    /// Redoes the most recently undone edit.
    pub fn redo(&mut self, def: &mut MaterialDefinition) -> EditResult {
        let mut edit = self.redo_stack.pop().ok_or(EditError::NothingToRedo)?;
        if let Err(err) = edit.apply(def) {
            self.redo_stack.push(edit);
            return Err(err);
        }
        self.undo_stack.push_back(edit);
        self.merge_broken = true;
        Ok(())
    }

    /// Prevents the next edit from merging with the current top entry.
    pub fn break_merge(&mut self) {
        self.merge_broken = true;
    }

    /// Whether there is an edit to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether there is an edit to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undoable edits.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redoable edits.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo descriptions, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(|e| e.description())
    }

    /// Redo descriptions, most recent first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|e| e.description())
    }

    /// Drops all recorded edits.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.merge_broken = false;
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

impl fmt::Debug for EditHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditHistory")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_undo", &self.max_undo)
            .finish()
    }
}
