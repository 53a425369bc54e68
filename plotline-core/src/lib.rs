//! # Plotline Core Library
//!
//! Turn-based simulation core for a text-driven narrative game.
//!
//! Free-text player input flows through a fixed pipeline:
//!
//! - **Classify** — an ordered rule ladder maps input to a response tier
//!   (0 = templated, 1 = short generative, 2 = compressed context,
//!   3 = full pipeline) with mandatory promotion under combat or tension
//! - **Generate** — a location's tile grid is synthesized on first visit
//!   from one of six category generators, doors and population included
//! - **Move** — greedy single-step pathing repositions the player and
//!   targeted NPCs without ever stacking two occupants on one tile
//! - **Reconcile** — externally generated scene state is clamped to closed
//!   enums, persisted field-by-field, and turned into NPC reactive movement
//! - **Tick** — a debounced per-session evaluator decides whether the
//!   world reacts to a burst of cheap actions
//!
//! Foreground work degrades gracefully; background work never crashes the
//! process. Narrative prose, persistence, and transport are external
//! collaborators behind the [`generate::TextGenerator`],
//! [`store::DocumentStore`], and [`events::EventSink`] seams.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod fastpath;
pub mod generate;
pub mod grid;
pub mod mapgen;
pub mod movement;
pub mod path;
pub mod resolve;
pub mod scene;
pub mod store;
pub mod tasks;
pub mod tick;
pub mod types;

pub use config::PlotlineConfig;
pub use error::CoreError;
pub use types::*;
