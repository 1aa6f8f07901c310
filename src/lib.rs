pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod game_log;
pub mod html;
pub mod http_client;
pub mod merge;
pub mod names;
pub mod normalize;
pub mod pipeline;
pub mod ratings;
pub mod schedule;
pub mod table;
pub mod transform;
