//! Weighted ability deck
//!
//! The deck is a bag of reusable ability templates. Drawing picks one template
//! by weight and asks it to build a fresh capability; the deck itself is never
//! consumed, so a draw only needs shared access.

use bevy::prelude::*;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::capability::AbilityCapability;
use crate::slots::constants::{DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS};

/// Size of the grid the slot owners move on.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub columns: i32,
    pub rows: i32,
}

impl Default for GridBounds {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            rows: DEFAULT_GRID_ROWS,
        }
    }
}

impl GridBounds {
    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.columns && cell.y < self.rows
    }

    /// Fallback requester position for owners without a grid position
    pub fn center(&self) -> IVec2 {
        IVec2::new(self.columns / 2, self.rows / 2)
    }

    pub fn clamp(&self, cell: IVec2) -> IVec2 {
        cell.clamp(IVec2::ZERO, IVec2::new(self.columns - 1, self.rows - 1).max(IVec2::ZERO))
    }
}

/// Information about the requester available to templates during a draw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawContext {
    /// Grid cell of the slot owner
    pub position: IVec2,
    pub bounds: GridBounds,
    /// Names of the abilities currently held by the owner's other slots
    pub held: Vec<String>,
}

impl DrawContext {
    /// True if another slot already holds an ability with this name
    pub fn holds(&self, name: &str) -> bool {
        self.held.iter().any(|held| held == name)
    }
}

/// A reusable ability template registered with the deck.
pub trait AbilityFactory: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Whether this template may be drawn for the given requester.
    /// Ineligible templates are treated as weight 0 for that draw.
    fn is_eligible(&self, _ctx: &DrawContext) -> bool {
        true
    }

    /// Build a fresh capability
    fn create(&self, ctx: &DrawContext) -> Box<dyn AbilityCapability>;
}

/// Deck failures. Drawing from an empty deck is a setup bug, not a gameplay state.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DeckError {
    /// Nothing has been registered
    #[error("ability deck is empty")]
    Empty,

    /// Entries exist but none is both eligible and positively weighted
    #[error("no eligible ability with positive weight among {entries} deck entries")]
    NoEligibleWeight { entries: usize },

    /// Weight is negative or not finite
    #[error("invalid weight {weight} for '{name}' (must be finite and >= 0)")]
    InvalidWeight { name: String, weight: f32 },

    /// Eligible weights are each finite but their sum is not
    #[error("eligible deck weights overflow f32 (sum {total})")]
    WeightOverflow { total: f32 },

    /// Any other rejection from the weighted sampler
    #[error("deck weights cannot be sampled: {0}")]
    Sampling(WeightedError),
}

struct DeckEntry {
    factory: Box<dyn AbilityFactory>,
    weight: f32,
}

/// Resource holding every template the slots refill from.
#[derive(Resource, Default)]
pub struct AbilityDeck {
    entries: Vec<DeckEntry>,
}

impl AbilityDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template. A weight of 0 keeps the entry but disables it.
    pub fn add(&mut self, factory: impl AbilityFactory, weight: f32) -> Result<(), DeckError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(DeckError::InvalidWeight {
                name: factory.name().to_string(),
                weight,
            });
        }
        self.entries.push(DeckEntry {
            factory: Box::new(factory),
            weight,
        });
        Ok(())
    }

    /// Register a template with weight 1
    pub fn add_default(&mut self, factory: impl AbilityFactory) -> Result<(), DeckError> {
        self.add(factory, 1.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f32 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }

    /// Template names with their weights, in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries
            .iter()
            .map(|entry| (entry.factory.name(), entry.weight))
    }

    /// Pick a template by weight among the eligible ones and build it.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        ctx: &DrawContext,
        rng: &mut R,
    ) -> Result<Box<dyn AbilityCapability>, DeckError> {
        if self.entries.is_empty() {
            return Err(DeckError::Empty);
        }

        let weights: Vec<f32> = self
            .entries
            .iter()
            .map(|entry| {
                if entry.weight > 0.0 && entry.factory.is_eligible(ctx) {
                    entry.weight
                } else {
                    0.0
                }
            })
            .collect();

        // The sampler panics on a non-finite total instead of reporting it
        let total: f32 = weights.iter().sum();
        if !total.is_finite() {
            return Err(DeckError::WeightOverflow { total });
        }

        let distribution = WeightedIndex::new(weights).map_err(|err| match err {
            WeightedError::AllWeightsZero => DeckError::NoEligibleWeight {
                entries: self.entries.len(),
            },
            other => DeckError::Sampling(other),
        })?;

        let entry = &self.entries[distribution.sample(rng)];
        Ok(entry.factory.create(ctx))
    }
}
