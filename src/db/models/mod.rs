pub mod reading;

pub use reading::{Reading, CAPACITY, SLOT_COUNT};
