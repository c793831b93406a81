use crate::db::session::InternalSession;
use crate::error::VoteError;
use actix::prelude::*;

pub mod party;
pub mod session;
pub mod vote;

/// Treats `value` as absent when it is empty or only whitespace.
pub(crate) fn required(value: &str, message: &'static str) -> Result<(), VoteError> {
    if value.trim().is_empty() {
        Err(VoteError::Validation(message))
    } else {
        Ok(())
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Identity, VoteError>")]
pub struct Identify {
    pub identity_id: String,
    pub card_id: String,
}

/// Outcome of an identity check. Only admins get a session.
#[derive(Clone, Debug)]
pub struct Identity {
    pub is_admin: bool,
    pub session: Option<InternalSession>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_absent() {
        for value in &["", " ", "\t\n"] {
            assert!(matches!(
                required(value, "Missing party"),
                Err(VoteError::Validation("Missing party"))
            ));
        }
        assert!(required(" NOTA ", "Missing party").is_ok());
    }
}
