pub mod confirm;
pub mod dashboard;
pub mod help;
pub mod log_view;
pub mod render;
pub mod spinner;

pub use render::render;
