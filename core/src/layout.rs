//! Uniform block layout.
//!
//! [`BlockLayout::compute`] walks an ordered variable list and assigns each
//! variable a byte offset:
//!
//! 1. Place the variable at `align_up(offset, variable.alignment())`.
//! 2. Advance `offset` by the variable's padded size (array elements are
//!    padded to a 16-byte stride).
//! 3. Round the final offset up to 16 to get the block size.
//!
//! The result is order-sensitive: after any insert, move or removal the whole
//! list must be laid out again.
//!
//! Blocks are capped at [`MAX_UNIFORM_BLOCK_SIZE`]. [`BlockLayout::try_compute`]
//! reports the first variable past the cap; [`BlockLayout::compute`] saturates
//! and is only meaningful for lists that passed that check.
//!
//! # Example
//!
//! ```
//! use shadertag_core::data_type::ShaderDataType;
//! use shadertag_core::layout::BlockLayout;
//! use shadertag_core::variable::ShaderVariable;
//!
//! let vars = vec![
//!     ShaderVariable::new("albedo", ShaderDataType::Vec3),
//!     ShaderVariable::new("opacity", ShaderDataType::Float).with_count(4),
//! ];
//! let layout = BlockLayout::compute(&vars);
//! assert_eq!(layout.offsets, vec![0, 16]);
//! assert_eq!(layout.size, 80);
//! ```

use serde::{Deserialize, Serialize};

use crate::data_type::VEC4_SIZE;
use crate::error::{MaterialError, MaterialResult};
use crate::profiling::profile_scope;
use crate::variable::ShaderVariable;

/// Largest uniform block, in bytes, that any variable list may lay out to.
///
/// Matches the common `maxUniformBufferRange` of desktop drivers.
pub const MAX_UNIFORM_BLOCK_SIZE: u32 = 65536;

/// Rounds `value` up to the next multiple of `alignment` (a power of two).
///
/// Values within `alignment` of `u32::MAX` round down instead of wrapping.
pub fn align_up(value: u32, alignment: u32) -> u32 {
    debug_assert!(alignment.is_power_of_two());
    value.saturating_add(alignment - 1) & !(alignment - 1)
}

/// Byte layout of one uniform block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLayout {
    /// Offset of each variable, index-aligned with the input list.
    pub offsets: Vec<u32>,
    /// Total block size, a multiple of 16.
    pub size: u32,
}

impl BlockLayout {
    /// Lay out `vars` in declaration order.
    pub fn compute(vars: &[ShaderVariable]) -> Self {
        profile_scope!("block_layout");

        let mut offsets = Vec::with_capacity(vars.len());
        let mut offset = 0u32;
        for var in vars {
            let placed = align_up(offset, var.alignment());
            offsets.push(placed);
            offset = placed.saturating_add(var.padded_size());
        }

        Self {
            offsets,
            size: align_up(offset, VEC4_SIZE),
        }
    }

    /// Lay out `vars`, failing with [`MaterialError::BlockTooLarge`] on the
    /// first variable that ends past [`MAX_UNIFORM_BLOCK_SIZE`].
    pub fn try_compute(vars: &[ShaderVariable]) -> MaterialResult<Self> {
        profile_scope!("block_layout");

        let mut offsets = Vec::with_capacity(vars.len());
        let mut offset = 0u32;
        for var in vars {
            // offset <= MAX_UNIFORM_BLOCK_SIZE, a multiple of 16, so this cannot overflow.
            let placed = align_up(offset, var.alignment());
            offset = var
                .checked_padded_size()
                .and_then(|size| placed.checked_add(size))
                .filter(|&end| end <= MAX_UNIFORM_BLOCK_SIZE)
                .ok_or_else(|| MaterialError::BlockTooLarge {
                    variable: var.name.clone(),
                    limit: MAX_UNIFORM_BLOCK_SIZE,
                })?;
            offsets.push(placed);
        }

        Ok(Self {
            offsets,
            size: align_up(offset, VEC4_SIZE),
        })
    }

    /// Offset of the variable at `index`.
    pub fn offset_of(&self, index: usize) -> Option<u32> {
        self.offsets.get(index).copied()
    }

    /// Offset of the variable called `name` in `vars`, the list this layout
    /// was computed from.
    pub fn offset_of_name(&self, vars: &[ShaderVariable], name: &str) -> Option<u32> {
        let index = vars.iter().position(|v| v.name == name)?;
        self.offset_of(index)
    }

    /// Number of laid out variables.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the block has no fields.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Lay out `vars`, returning per-variable offsets and the total block size.
pub fn layout(vars: &[ShaderVariable]) -> (Vec<u32>, u32) {
    let BlockLayout { offsets, size } = BlockLayout::compute(vars);
    (offsets, size)
}
