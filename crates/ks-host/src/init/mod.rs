mod error;
mod gate;
mod initializer;
mod lock;

pub use error::{InitError, Result as InitResult};
pub use gate::{InitGate, InitOutcome};
pub use initializer::{CURRENT_LAYOUT_VERSION, HomeInitializer, Initializer, LayoutMarker};
pub use lock::InitLock;
