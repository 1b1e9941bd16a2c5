pub mod framedump;
pub mod logging;
pub mod testvec;
