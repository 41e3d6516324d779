use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest edge a preview may have, whatever the requested size.
pub const MIN_PREVIEW_EDGE: u32 = 320;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The camera reported no supported preview sizes.
    #[error("no candidate preview sizes to choose from")]
    NoCandidates,
}

/// Picks a camera preview size for a requested surface size.
#[derive(Debug, Clone, Copy)]
pub struct PreviewSizeSelector {
    pub min_edge: u32,
}

impl Default for PreviewSizeSelector {
    fn default() -> Self {
        Self {
            min_edge: MIN_PREVIEW_EDGE,
        }
    }
}

impl PreviewSizeSelector {
    /// Returns an exact match if there is one, otherwise the smallest candidate
    /// (by area, earliest wins on ties) whose edges are both at least
    /// `max(min(desired_width, desired_height), min_edge)`. With no such
    /// candidate the first one is returned.
    pub fn select(
        &self,
        candidates: &[Resolution],
        desired_width: u32,
        desired_height: u32,
    ) -> Result<Resolution, SelectionError> {
        let first = *candidates.first().ok_or(SelectionError::NoCandidates)?;
        let min_size = desired_width.min(desired_height).max(self.min_edge);

        if let Some(exact) = candidates
            .iter()
            .find(|c| c.width == desired_width && c.height == desired_height)
        {
            return Ok(*exact);
        }

        let chosen = candidates
            .iter()
            .filter(|c| c.width >= min_size && c.height >= min_size)
            .min_by_key(|c| c.area())
            .copied()
            .unwrap_or(first);
        Ok(chosen)
    }
}

pub fn select_preview_size(
    candidates: &[Resolution],
    desired_width: u32,
    desired_height: u32,
) -> Result<Resolution, SelectionError> {
    PreviewSizeSelector::default().select(candidates, desired_width, desired_height)
}
