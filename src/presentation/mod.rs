// Presentation layer - HTTP handlers and the console client surface
pub mod app_state;
pub mod console;
pub mod frame_printer;
pub mod handlers;
