//! Bone hierarchy
//!
//! The skeleton is immutable once built and is shared by every animation
//! instance that animates it. Construction validates index ranges and rejects
//! cyclic graphs, so evaluation can rely on a well-formed hierarchy.

use crate::error::{AnimError, Result};
use crate::transform::BlendableTransform;
use glam::Mat4;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One bone of a decoded skeleton
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bone {
    /// Bone name
    pub name: String,
    /// Parent bone index (-1 if root)
    pub parent_index: i16,
    /// Ordered child bone indices
    pub children: Vec<usize>,
    /// Reference (bind) pose relative to the parent
    pub reference: BlendableTransform,
}

impl Bone {
    /// Create a bone without children; see [`Skeleton::from_parents`]
    pub fn new(name: impl Into<String>, parent_index: i16, reference: BlendableTransform) -> Self {
        Self {
            name: name.into(),
            parent_index,
            children: Vec::new(),
            reference,
        }
    }

    /// Check if this bone is a top-level bone
    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }
}

/// Validated bone hierarchy
#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Vec<Bone>,
    roots: Vec<usize>,
    max_depth: usize,
}

impl Skeleton {
    /// Build a skeleton from bones whose child lists are already populated
    pub fn new(bones: Vec<Bone>) -> Result<Self> {
        let count = bones.len();

        for (index, bone) in bones.iter().enumerate() {
            if bone.parent_index < -1 || bone.parent_index as isize >= count as isize {
                return Err(AnimError::InvalidParent {
                    bone: index,
                    parent: bone.parent_index,
                });
            }
            if let Some(&child) = bone.children.iter().find(|&&c| c >= count) {
                return Err(AnimError::InvalidChild { bone: index, child });
            }
        }

        check_parent_chains(&bones)?;
        let max_depth = check_child_graph(&bones)?;

        let roots: Vec<usize> = bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.is_root())
            .map(|(index, _)| index)
            .collect();

        if count > 0 && roots.is_empty() {
            return Err(AnimError::CyclicHierarchy { bone: 0 });
        }

        log::debug!(
            "Skeleton with {} bones, {} roots, depth {}",
            count,
            roots.len(),
            max_depth
        );

        Ok(Self {
            bones,
            roots,
            max_depth,
        })
    }

    /// Build a skeleton deriving child lists from parent indices
    ///
    /// Any child lists already present on `bones` are replaced. Children are
    /// ordered by bone index.
    pub fn from_parents(mut bones: Vec<Bone>) -> Result<Self> {
        let count = bones.len();
        for bone in &mut bones {
            bone.children.clear();
        }
        for index in 0..count {
            let parent = bones[index].parent_index;
            if parent < 0 {
                continue;
            }
            let parent = parent as usize;
            if parent >= count {
                return Err(AnimError::InvalidParent {
                    bone: index,
                    parent: bones[index].parent_index,
                });
            }
            bones[parent].children.push(index);
        }
        Self::new(bones)
    }

    /// Create an empty skeleton
    pub fn empty() -> Self {
        Self {
            bones: Vec::new(),
            roots: Vec::new(),
            max_depth: 0,
        }
    }

    /// Get number of bones
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Get all bones
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Get a bone by index
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Top-level bones in hierarchy order
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Ordered children of a bone (empty for unknown bones)
    pub fn children(&self, index: usize) -> &[usize] {
        self.bones
            .get(index)
            .map_or(&[][..], |bone| bone.children.as_slice())
    }

    /// Length of the longest root-to-leaf path, counting edges
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Find a bone index by name
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name == name)
    }

    /// Reference pose in model space, indexed by bone
    ///
    /// Each bone's reference transform is chained through its parent index,
    /// with scale applied at the end of the chain.
    pub fn reference_world_matrices(&self) -> Vec<Mat4> {
        let count = self.bones.len();
        let mut unscaled: Vec<Option<(Mat4, glam::Vec3)>> = vec![None; count];

        for index in 0..count {
            // Parents are resolved first by walking up the chain into a stack
            let mut chain = vec![index];
            let mut current = index;
            while unscaled[current].is_none() {
                let parent = self.bones[current].parent_index;
                if parent < 0 {
                    break;
                }
                current = parent as usize;
                if unscaled[current].is_none() {
                    chain.push(current);
                }
            }

            while let Some(bone) = chain.pop() {
                if unscaled[bone].is_some() {
                    continue;
                }
                let reference = &self.bones[bone].reference;
                let (parent_matrix, parent_scale) = match self.bones[bone].parent_index {
                    p if p < 0 => (Mat4::IDENTITY, glam::Vec3::ONE),
                    p => unscaled[p as usize].unwrap_or((Mat4::IDENTITY, glam::Vec3::ONE)),
                };
                unscaled[bone] = Some((
                    parent_matrix * reference.matrix(),
                    parent_scale * reference.scale,
                ));
            }
        }

        unscaled
            .into_iter()
            .map(|entry| {
                entry.map_or(Mat4::IDENTITY, |(matrix, scale)| {
                    matrix * Mat4::from_scale(scale)
                })
            })
            .collect()
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::empty()
    }
}

/// Reject bones that are their own ancestor via parent indices
fn check_parent_chains(bones: &[Bone]) -> Result<()> {
    let count = bones.len();
    // 0 = unknown, 1 = on the current chain, 2 = known to reach a root
    let mut state = vec![0u8; count];

    for start in 0..count {
        let mut chain = Vec::new();
        let mut current = start;
        loop {
            match state[current] {
                2 => break,
                1 => return Err(AnimError::CyclicHierarchy { bone: current }),
                _ => {}
            }
            state[current] = 1;
            chain.push(current);
            let parent = bones[current].parent_index;
            if parent < 0 {
                break;
            }
            current = parent as usize;
        }
        for bone in chain {
            state[bone] = 2;
        }
    }
    Ok(())
}

/// Reject cycles through child lists and return the deepest path length
///
/// A bone may be listed under more than one parent; only a path that returns
/// to a bone already on it is a cycle.
fn check_child_graph(bones: &[Bone]) -> Result<usize> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let count = bones.len();
    let mut marks = vec![Mark::Unvisited; count];
    // Longest downward path from each bone, in edges
    let mut height = vec![0usize; count];

    for start in 0..count {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // (bone, index of the next child to visit)
        let mut stack = vec![(start, 0usize)];
        marks[start] = Mark::InProgress;

        while let Some(top) = stack.last_mut() {
            let (bone, next) = *top;
            top.1 += 1;
            if let Some(&child) = bones[bone].children.get(next) {
                match marks[child] {
                    Mark::InProgress => return Err(AnimError::CyclicHierarchy { bone: child }),
                    Mark::Done => height[bone] = height[bone].max(height[child] + 1),
                    Mark::Unvisited => {
                        marks[child] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                }
            } else {
                marks[bone] = Mark::Done;
                stack.pop();
                if let Some(&(parent, _)) = stack.last() {
                    height[parent] = height[parent].max(height[bone] + 1);
                }
            }
        }
    }

    Ok(bones
        .iter()
        .enumerate()
        .filter(|(_, bone)| bone.is_root())
        .map(|(index, _)| height[index])
        .max()
        .unwrap_or(0))
}
