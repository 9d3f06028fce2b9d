pub mod cloud;
pub mod collaborators;
pub mod coordinator;
pub mod dictionary;
pub mod error;
pub mod gesture;
pub mod hotkey;
pub mod input;
pub mod logging;
pub mod model;
pub mod motion;
pub mod ocr;
pub mod overlay;
pub mod resolver;
pub mod runtime;
pub mod script;
pub mod selection;
pub mod session;
pub mod settings;
pub mod stems;

#[cfg(feature = "desktop")]
pub mod platform;
