/// Canvas programs drawn on top of iced widgets

pub mod overlay;

pub use overlay::GridOverlay;
