//! Requests sent to the control plugin.

use serde::{Deserialize, Serialize};

/// Message sent from the client to the control plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Runs `code` inside the PyMOL interpreter.
    Execute {
        /// Source text handed verbatim to the interpreter.
        code: String,
    },
}

impl Request {
    /// Builds an `execute` request for the given code.
    #[must_use]
    pub fn execute(code: impl Into<String>) -> Self {
        Self::Execute { code: code.into() }
    }

    /// Returns the code carried by the request.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Execute { code } => code,
        }
    }

    /// Serialises the request as one JSON record.
    ///
    /// # Errors
    ///
    /// Returns an error when serialisation fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decoded, FrameDecoder};
    use rstest::rstest;

    #[test]
    fn execute_request_matches_wire_shape() {
        let bytes = Request::execute("1+1").to_bytes().expect("serialise request");
        let text = String::from_utf8(bytes).expect("request utf8");
        assert_eq!(text, r#"{"type":"execute","code":"1+1"}"#);
    }

    #[rstest]
    #[case::plain("cmd.fetch('1ubq')")]
    #[case::double_quotes(r#"print("hello \"world\"")"#)]
    #[case::whitespace("for i in range(3):\n\tprint(i)  \r\n")]
    #[case::unicode("cmd.set_name('α-helix', 'β')")]
    #[case::empty("")]
    fn code_survives_encode_and_decode(#[case] code: &str) {
        let bytes = Request::execute(code).to_bytes().expect("serialise request");
        let mut decoder = FrameDecoder::new();
        decoder.extend(&bytes);
        match decoder.decode::<Request>().expect("decode request") {
            Decoded::Complete { message, .. } => assert_eq!(message.code(), code),
            Decoded::Incomplete => panic!("complete request reported as incomplete"),
        }
    }
}
