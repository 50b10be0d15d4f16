// Presentation layer - Local HTTP surface for the rendering widget
pub mod app_state;
pub mod handlers;
pub mod view;
