pub mod io;
pub mod loop_closing;
pub mod matching;
pub mod system;
pub mod tracks;
