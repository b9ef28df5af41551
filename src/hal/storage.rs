/// Flight-log storage boundary. Implementations open the destination,
/// append the bytes and close again on every call, so an abrupt power loss
/// costs at most the line being written.
pub trait Storage {
    type Error: core::fmt::Debug;

    fn append(&mut self, path: &str, bytes: &[u8]) -> Result<(), Self::Error>;
}
