//! Random identifiers for acquisition surfaces.

use uuid::Uuid;

/// Length of generated surface ids.
pub const SURFACE_ID_LEN: usize = 10;

/// Returns a random alphanumeric id of `len` characters (at most 32).
///
/// Collisions are tolerated; ids only tag DOM nodes.
pub fn new_id(len: usize) -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(len);
    id
}

/// Returns a fresh surface id prefixed so it is a valid DOM id.
pub fn new_surface_id() -> String {
    format!("fc-{}", new_id(SURFACE_ID_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_requested_length() {
        assert_eq!(new_id(10).len(), 10);
        assert_eq!(new_id(64).len(), 32);
        assert!(new_surface_id().starts_with("fc-"));
    }

    #[test]
    fn ids_differ_between_calls() {
        assert_ne!(new_id(16), new_id(16));
    }
}
