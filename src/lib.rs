pub mod config;
pub mod console;
pub mod constants;
pub mod cpiface;
pub mod error;
pub mod filehandle;
pub mod filesel;
pub mod interface;
pub mod mdb;
pub mod module_info;
pub mod playback;
pub mod players;
pub mod preprocess;
pub mod shell;
pub mod signal;
