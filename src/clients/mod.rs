//! Outbound integrations: battle image generation and Algorand transfers.

pub mod algorand;
pub mod image;

pub use algorand::{PayoutClient, SimulatedAlgorandClient};
pub use image::{ImageGenerator, OpenAiImageGenerator, PlaceholderImageGenerator};
