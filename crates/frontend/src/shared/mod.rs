pub mod api_utils;
pub mod audio;
pub mod clock;
pub mod config;
pub mod events;
pub mod http;
pub mod icons;
pub mod scheduler;
pub mod storage;
pub mod theme;
pub mod toast;
