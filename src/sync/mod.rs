//! Synchronization between the form store and durable storage

mod filler;
mod responses;
mod session;
mod snapshot;

pub use filler::{FillerContext, LoadState};
pub use responses::{
    append_response, load_responses, response_key, ResponseView, DEFAULT_RESPONSES_KEY,
};
pub use session::{BuilderSession, SESSION_KEY};
pub use snapshot::{PublishedForm, SessionSnapshot};
pub(crate) use snapshot::{read_json, write_json};
