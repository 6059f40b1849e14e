mod overlay;
mod stream_session;

pub use overlay::Overlay;
pub use stream_session::{EndReason, SessionState, StreamSession};
