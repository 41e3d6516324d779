pub mod console;
pub mod replay;
pub mod simulate;
