//! Wire protocol spoken with the PyMOL control plugin.
//!
//! Every exchange is one [`Request`] followed by exactly one [`Response`],
//! each encoded as a single UTF-8 JSON record. The stream carries no length
//! prefix or delimiter, so readers accumulate bytes in a [`FrameDecoder`] and
//! accept the first value that parses completely.

mod frame;
mod request;
mod response;

pub use frame::{Decoded, FrameDecoder, FrameError};
pub use request::Request;
pub use response::{DEFAULT_ERROR_MESSAGE, Outcome, Response, SUCCESS_STATUS};
