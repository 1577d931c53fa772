pub mod ansi_strip;
pub mod logging;
pub mod regex;
pub mod shell;
