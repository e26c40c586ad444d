/// State management module
///
/// This module handles all application state, including:
/// - The grid of divider lines (grid.rs)
/// - Dragging lines with the pointer (drag.rs)
/// - Shared data structures (data.rs)
/// - User settings (config.rs)
/// - The editing session tying them together (session.rs)

pub mod config;
pub mod data;
pub mod drag;
pub mod grid;
pub mod session;
