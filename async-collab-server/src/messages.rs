//! Wire constants and outbound frame builders.
//!
//! Element and attribute names of the messages this proxy owns are
//! centralized here; a protocol-versioning pass touches one module.

use collab_types::{Error, SeqToken, UserStatus};
use collab_xml::XmlFrame;

/// Root element of a join request and of the broadcast announcing a fresh
/// join.
pub const USER_JOIN: &str = "user-join";
/// Root element of the broadcast announcing a rejoin.
pub const USER_REJOIN: &str = "user-rejoin";
/// Root element of the broadcast announcing a user status transition.
pub const USER_STATUS_CHANGE: &str = "user-status-change";
/// Root element of a peer's request to leave the session.
pub const SESSION_UNSUBSCRIBE: &str = "session-unsubscribe";
/// Root element of the notice sent to a peer on graceful unsubscription.
pub const SESSION_CLOSE: &str = "session-close";
/// Root element of a failure reply.
pub const REQUEST_FAILED: &str = "request-failed";

/// Reply correlation attribute.
pub const ATTR_SEQ: &str = "seq";
/// User id attribute.
pub const ATTR_ID: &str = "id";
/// User status attribute.
pub const ATTR_STATUS: &str = "status";
/// Error domain attribute on `request-failed`.
pub const ATTR_DOMAIN: &str = "domain";
/// Error code attribute on `request-failed`.
pub const ATTR_CODE: &str = "code";
/// Error message attribute on `request-failed`.
pub const ATTR_MESSAGE: &str = "message";

/// Append the reply correlation token, if the request carried one.
pub fn apply_seq(frame: &mut XmlFrame, seq: Option<SeqToken>) {
    if let Some(seq) = seq {
        frame.set_attribute(ATTR_SEQ, seq.to_string());
    }
}

/// Build the broadcast announcing that a user's status changed.
pub fn user_status_change(id: u32, status: UserStatus) -> XmlFrame {
    let mut frame = XmlFrame::new(USER_STATUS_CHANGE);
    frame.set_attribute(ATTR_ID, id.to_string());
    frame.set_attribute(ATTR_STATUS, status.as_str());
    frame
}

/// Build the notice sent to a single peer on graceful unsubscription.
pub fn session_close() -> XmlFrame {
    XmlFrame::new(SESSION_CLOSE)
}

/// Build the failure reply for a locally-handled request.
pub fn request_failed(error: &Error, seq: Option<SeqToken>) -> XmlFrame {
    let mut frame = XmlFrame::new(REQUEST_FAILED);
    frame.set_attribute(ATTR_DOMAIN, error.code().domain());
    frame.set_attribute(ATTR_CODE, error.code().code().to_string());
    frame.set_attribute(ATTR_MESSAGE, error.message());
    apply_seq(&mut frame, seq);
    frame
}

#[cfg(test)]
mod tests {
    use collab_types::{Error, ErrorCode, SeqToken, UserStatus};

    use super::{request_failed, session_close, user_status_change};

    #[test]
    fn status_change_frame() {
        let frame = user_status_change(1, UserStatus::Unavailable);
        assert_eq!(
            frame.to_xml_string().unwrap(),
            r#"<user-status-change id="1" status="unavailable"/>"#
        );
    }

    #[test]
    fn session_close_frame() {
        assert_eq!(session_close().to_xml_string().unwrap(), "<session-close/>");
    }

    #[test]
    fn request_failed_carries_domain_code_seq() {
        let err = Error::new(ErrorCode::NameInUse, "name \"alice\" already in use");
        let frame = request_failed(&err, Some(SeqToken::new(11, 4)));
        assert_eq!(frame.attribute("domain"), Some("user-error"));
        assert_eq!(frame.attribute("code"), Some("4"));
        assert_eq!(frame.attribute("seq"), Some("11/4"));
        assert_eq!(
            frame.attribute("message"),
            Some("name \"alice\" already in use")
        );
    }

    #[test]
    fn request_failed_without_seq() {
        let err = Error::new(ErrorCode::NotAuthorized, "vetoed");
        let frame = request_failed(&err, None);
        assert_eq!(frame.attribute("seq"), None);
    }
}
