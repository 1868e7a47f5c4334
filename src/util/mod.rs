pub mod fname;
pub mod shell;
pub mod time;
