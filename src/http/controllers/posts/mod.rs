use crate::{
    http::Error,
    types::id::{marker::UserMarker, Id},
};

pub mod comments;
pub mod crud;
pub mod react;

/// Posts and comments can only be mutated by the user who wrote them.
pub(super) fn ensure_author(
    author_id: Id<UserMarker>,
    actor_id: Id<UserMarker>,
) -> Result<(), Error> {
    if author_id == actor_id {
        Ok(())
    } else {
        Err(Error::forbidden())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Error as ErrorType;

    #[test]
    fn non_authors_are_turned_away() {
        let error = ensure_author(Id::new(1), Id::new(2)).unwrap_err();
        assert!(matches!(error.as_type(), ErrorType::Forbidden));
    }

    #[test]
    fn the_author_passes_the_gate() {
        assert!(ensure_author(Id::new(7), Id::new(7)).is_ok());
    }
}
