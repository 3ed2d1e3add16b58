use thiserror::Error;

/// Errors returned by checked [`UnrolledList`](crate::UnrolledList) accessors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The requested position is not less than the list's length.
    #[error("index out of range: the index is {index} but the length is {len}")]
    IndexOutOfRange {
        /// Index that was requested.
        index: usize,
        /// Length of the list at the time of the request.
        len: usize,
    },
}

#[cfg(test)]
mod test {
    use alloc::string::ToString;

    use super::Error;

    #[test]
    fn message_names_index_and_len() {
        let message = Error::IndexOutOfRange { index: 101, len: 101 }.to_string();
        assert_eq!(message, "index out of range: the index is 101 but the length is 101");
    }
}
