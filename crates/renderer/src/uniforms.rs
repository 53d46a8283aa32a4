//! Uniform reflection: name → (bind group, binding, byte offset).
//!
//! Top-level `var<uniform>` globals are addressable by variable name; members
//! of a uniform struct are additionally addressable by member name, the same
//! way a default-block uniform is looked up by name in classic GL.

use naga::{AddressSpace, Module, ScalarKind, TypeInner, VectorSize};

/// Layout of the values a uniform slot can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    /// `mat4x4<f32>`, 64 bytes, column-major.
    Mat4,
    Other,
}

/// A `var<uniform>` buffer binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    pub size: u64,
}

/// A named location inside a uniform block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub offset: u64,
    pub kind: UniformKind,
}

/// Where a 4x4 matrix named by the caller would be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mat4Target {
    Found { group: u32, binding: u32, offset: u64 },
    /// No uniform or uniform struct member has this name.
    Missing,
    /// The name exists but is not a `mat4x4<f32>`.
    NotMat4,
}

/// A non-uniform resource a shader declares (texture, sampler, storage).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedBinding {
    pub name: String,
    pub group: u32,
    pub binding: u32,
}

/// Uniform blocks and named slots of one shader module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UniformTable {
    blocks: Vec<UniformBlock>,
    slots: Vec<UniformSlot>,
}

fn kind_of(inner: &TypeInner) -> UniformKind {
    match *inner {
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar.kind == ScalarKind::Float && scalar.width == 4 => UniformKind::Mat4,
        _ => UniformKind::Other,
    }
}

impl UniformTable {
    /// Reflect the uniform globals of `module`, and report any other bound
    /// resource it declares.
    pub fn reflect(module: &Module) -> (Self, Vec<UnsupportedBinding>) {
        let mut table = Self::default();
        let mut unsupported = Vec::new();
        let gctx = module.to_ctx();

        for (_, var) in module.global_variables.iter() {
            let Some(rb) = var.binding.as_ref() else {
                continue;
            };
            let name = var.name.clone().unwrap_or_default();

            if var.space != AddressSpace::Uniform {
                unsupported.push(UnsupportedBinding {
                    name,
                    group: rb.group,
                    binding: rb.binding,
                });
                continue;
            }

            let inner = &module.types[var.ty].inner;
            table.blocks.push(UniformBlock {
                group: rb.group,
                binding: rb.binding,
                size: u64::from(inner.size(gctx)),
            });

            if !name.is_empty() {
                table.push_slot(UniformSlot {
                    name,
                    group: rb.group,
                    binding: rb.binding,
                    offset: 0,
                    kind: kind_of(inner),
                });
            }

            if let TypeInner::Struct { ref members, .. } = *inner {
                for member in members {
                    let Some(member_name) = member.name.clone() else {
                        continue;
                    };
                    table.push_slot(UniformSlot {
                        name: member_name,
                        group: rb.group,
                        binding: rb.binding,
                        offset: u64::from(member.offset),
                        kind: kind_of(&module.types[member.ty].inner),
                    });
                }
            }
        }

        (table, unsupported)
    }

    // First declaration of a name wins.
    fn push_slot(&mut self, slot: UniformSlot) {
        if self.lookup(&slot.name).is_none() {
            self.slots.push(slot);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&UniformSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Resolve a name to the buffer location a mat4 upload targets.
    pub fn resolve_mat4(&self, name: &str) -> Mat4Target {
        match self.lookup(name) {
            None => Mat4Target::Missing,
            Some(slot) if slot.kind != UniformKind::Mat4 => Mat4Target::NotMat4,
            Some(slot) => Mat4Target::Found {
                group: slot.group,
                binding: slot.binding,
                offset: slot.offset,
            },
        }
    }

    pub fn block(&self, group: u32, binding: u32) -> Option<&UniformBlock> {
        self.blocks
            .iter()
            .find(|b| b.group == group && b.binding == binding)
    }

    pub fn blocks(&self) -> &[UniformBlock] {
        &self.blocks
    }

    pub fn slots(&self) -> &[UniformSlot] {
        &self.slots
    }

    /// Highest bind group index in use, if any block exists.
    pub fn max_group(&self) -> Option<u32> {
        self.blocks.iter().map(|b| b.group).max()
    }

    /// Merge another stage's table. Blocks bound at the same
    /// `(group, binding)` must agree on size.
    pub fn merge(&mut self, other: &UniformTable) -> Result<(), String> {
        for block in &other.blocks {
            match self.block(block.group, block.binding) {
                Some(existing) if existing.size != block.size => {
                    return Err(format!(
                        "uniform @group({}) @binding({}) is {} bytes in one stage and {} in the other",
                        block.group, block.binding, existing.size, block.size
                    ));
                }
                Some(_) => {}
                None => self.blocks.push(*block),
            }
        }
        for slot in &other.slots {
            match self.lookup(&slot.name) {
                Some(existing)
                    if (existing.group, existing.binding, existing.offset)
                        != (slot.group, slot.binding, slot.offset) =>
                {
                    return Err(format!(
                        "uniform '{}' is bound at @group({}) @binding({}) in one stage and @group({}) @binding({}) in the other",
                        slot.name, existing.group, existing.binding, slot.group, slot.binding
                    ));
                }
                Some(_) => {}
                None => self.slots.push(slot.clone()),
            }
        }
        self.blocks.sort_by_key(|b| (b.group, b.binding));
        Ok(())
    }
}
