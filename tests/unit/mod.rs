// Windowed join core: buffers, side processors, coordinator
pub mod join;
