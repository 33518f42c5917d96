pub mod content_service;
pub mod game_service;
pub mod image_renderer;
pub mod payout;
pub mod round_ender;
pub mod user_app_service;

pub use content_service::ContentService;
pub use game_service::GameService;
pub use image_renderer::ImageRenderer;
pub use payout::{PayoutRunSummary, PayoutService};
pub use round_ender::RoundEnder;
pub use user_app_service::UserAppService;
