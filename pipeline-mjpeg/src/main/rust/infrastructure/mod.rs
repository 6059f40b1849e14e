pub mod encoding;
pub mod gstreamer;
pub mod http;
pub mod metrics;
pub mod store;
