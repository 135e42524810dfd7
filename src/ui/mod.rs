// UI module - the frontend-facing surface of the core
//
// This module contains:
// - SearchController: accepts query text, suggestion selections and favorite
//   toggles, and owns the debounce/cancellation pipeline and the background
//   observation tasks

pub mod controller;

pub use controller::{DEFAULT_DEBOUNCE, EvaluationError, SearchController};
