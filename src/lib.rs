pub mod graphics;
pub mod logging;
pub mod math;
