pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod coords;
pub mod crop;
pub mod error;
pub mod fonts;
pub mod geocode;
pub mod layout;
pub mod model;
pub mod osm;
pub mod poster;
pub mod projection;
pub mod render;
pub mod roads;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use error::{PosterError, Result};
pub use poster::Session;
