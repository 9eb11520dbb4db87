use crate::error::Rejection;

/// Ordered, bounded set of sanitized media references.
///
/// Order only matters for display, nothing is ever dequeued from it.
#[derive(Debug)]
pub struct Playlist {
    entries: Vec<String>,
    capacity: usize,
}

impl Playlist {
    pub fn new(capacity: usize) -> Self {
        Playlist {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.entries.iter().any(|entry| entry == reference)
    }

    /// Fails with [Rejection::PlaylistFull] once no entry can be added
    pub fn ensure_room(&self) -> Result<(), Rejection> {
        if self.is_full() {
            return Err(Rejection::PlaylistFull {
                capacity: self.capacity,
            });
        }

        Ok(())
    }

    /// Append a reference, returns true if the playlist changed
    pub fn add(&mut self, reference: String) -> Result<bool, Rejection> {
        self.ensure_room()?;

        if self.contains(&reference) {
            return Ok(false);
        }

        self.entries.push(reference);

        Ok(true)
    }

    /// Remove a reference, returns true if it was present
    pub fn remove(&mut self, reference: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != reference);

        self.entries.len() != before
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_add_then_remove_restores_playlist() {
        let mut playlist = Playlist::new(50);
        playlist.add("https://x/first".to_string()).unwrap();
        let before = playlist.entries().to_vec();

        assert_eq!(playlist.add("https://x/a".to_string()), Ok(true));
        assert!(playlist.remove("https://x/a"));

        assert_eq!(playlist.entries(), before.as_slice());
        assert_eq!(playlist.len(), 1);
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let mut playlist = Playlist::new(50);

        assert_eq!(playlist.add("https://x/a".to_string()), Ok(true));
        assert_eq!(playlist.add("https://x/a".to_string()), Ok(false));
        assert_eq!(playlist.len(), 1);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut playlist = Playlist::new(50);
        for url in ["https://x/c", "https://x/a", "https://x/b"] {
            playlist.add(url.to_string()).unwrap();
        }
        playlist.remove("https://x/a");

        assert_eq!(playlist.entries(), ["https://x/c", "https://x/b"]);
    }

    #[test]
    fn test_capacity_boundary() {
        let mut playlist = Playlist::new(50);
        for i in 0..50 {
            playlist.add(format!("https://x/{}", i)).unwrap();
        }

        assert!(playlist.is_full());
        assert_eq!(
            playlist.add("https://x/new".to_string()),
            Err(Rejection::PlaylistFull { capacity: 50 })
        );
        assert_eq!(playlist.len(), 50);
    }

    #[test]
    fn test_removing_absent_entry_is_a_noop() {
        let mut playlist = Playlist::new(50);
        playlist.add("https://x/a".to_string()).unwrap();

        assert!(!playlist.remove("https://x/zzz"));
        assert_eq!(playlist.len(), 1);
        assert!(!playlist.is_empty());
    }
}
