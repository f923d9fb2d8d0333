// ── Device registry ──

mod registry;
mod stream;

pub use registry::DeviceRegistry;
pub use stream::{DeviceStream, DeviceWatchStream};
