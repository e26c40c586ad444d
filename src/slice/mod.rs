/// Image slicing module
///
/// This module handles:
/// - Checking and decoding uploads
/// - Turning grid lines into pixel rectangles
/// - Encoding each rectangle as a PNG tile

pub mod engine;
pub mod loader;
