pub mod event;
pub mod geo;
pub mod registry;

pub use event::ListenerEvent;
pub use geo::{GeoConfig, GeoLookup, UNKNOWN_COUNTRY};
pub use registry::{load_log, ListenerRegistry, LOG_CAPACITY};
