pub mod animation_service;
pub mod chart_service;
pub mod input_service;
pub mod price_service;
pub mod video_service;
