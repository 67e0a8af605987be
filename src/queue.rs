use std::collections::VecDeque;

use crate::resolver::Track;

/// Per-guild FIFO of resolved tracks. The head is the track currently (or
/// about to be) streaming and stays in place until its playback is over.
#[derive(Debug, Default)]
pub struct TrackQueue {
    tracks: VecDeque<Track>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self {
            tracks: VecDeque::new(),
        }
    }

    /// Appends to the tail. No deduplication, no reordering, no size cap.
    pub fn enqueue(&mut self, track: Track) {
        self.tracks.push_back(track);
    }

    pub fn head(&self) -> Option<&Track> {
        self.tracks.front()
    }

    /// Removes and returns the head. Only called once the head's playback is
    /// confirmed over (finished, skipped, or failed to start).
    pub fn pop_head(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Empties the queue, returning how many tracks were dropped. With
    /// `keep_head` the head survives, so a clear issued mid-playback does not
    /// cut off the current track.
    pub fn clear(&mut self, keep_head: bool) -> usize {
        let retained = if keep_head && !self.tracks.is_empty() {
            1
        } else {
            0
        };
        let dropped = self.tracks.len() - retained;
        self.tracks.truncate(retained);
        dropped
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Everything queued behind the head.
    pub fn upcoming(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().skip(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str) -> Track {
        Track {
            title: title.to_string(),
            stream_url: format!("https://cdn.example/{title}.m4a"),
            page_url: None,
            thumbnail: None,
            duration: None,
            requested_by: "tester".to_string(),
        }
    }

    #[test]
    fn enqueue_keeps_call_order() {
        let mut queue = TrackQueue::new();
        for title in ["one", "two", "three", "four"] {
            queue.enqueue(track(title));
        }

        let drained: Vec<String> = std::iter::from_fn(|| queue.pop_head())
            .map(|t| t.title)
            .collect();
        assert_eq!(drained, ["one", "two", "three", "four"]);
    }

    #[test]
    fn pop_head_on_empty_is_none() {
        let mut queue = TrackQueue::new();
        assert!(queue.pop_head().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_keeping_head_leaves_the_playing_track() {
        let mut queue = TrackQueue::new();
        for title in ["one", "two", "three"] {
            queue.enqueue(track(title));
        }

        let dropped = queue.clear(true);
        assert_eq!(dropped, 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.head().unwrap().title, "one");
    }

    #[test]
    fn clear_keeping_head_on_empty_is_a_no_op() {
        let mut queue = TrackQueue::new();
        assert_eq!(queue.clear(true), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_everything() {
        let mut queue = TrackQueue::new();
        queue.enqueue(track("one"));
        queue.enqueue(track("two"));

        let dropped = queue.clear(false);
        assert_eq!(dropped, 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn upcoming_skips_the_head() {
        let mut queue = TrackQueue::new();
        for title in ["head", "next", "later"] {
            queue.enqueue(track(title));
        }

        let upcoming: Vec<&str> = queue.upcoming().map(|t| t.title.as_str()).collect();
        assert_eq!(upcoming, ["next", "later"]);
    }
}
