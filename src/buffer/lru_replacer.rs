use crate::common::FrameId;

/// Position of one frame in the eviction order.
#[derive(Debug, Clone, Copy, Default)]
struct Node {
    prev: Option<FrameId>,
    next: Option<FrameId>,
    linked: bool,
}

/// LRU replacement policy over unpinned frames.
///
/// Frames enter the replacer when their pin count drops to zero and leave it
/// when they are pinned again or chosen as a victim. The victim is the frame
/// that was unpinned longest ago. Accesses to a page while it is pinned do
/// not move it; only the pin -> unpin transition does, so this approximates
/// LRU rather than implementing it exactly.
///
/// The order is a doubly linked list threaded through a frame-indexed arena,
/// so every operation is O(1).
#[derive(Debug)]
pub struct LruReplacer {
    nodes: Vec<Node>,
    /// Oldest evictable frame, next victim
    head: Option<FrameId>,
    /// Most recently unpinned frame
    tail: Option<FrameId>,
    size: usize,
}

impl LruReplacer {
    /// Creates a replacer for frames `0..num_frames`.
    pub fn new(num_frames: usize) -> Self {
        Self {
            nodes: vec![Node::default(); num_frames],
            head: None,
            tail: None,
            size: 0,
        }
    }

    /// Removes and returns the frame that has been evictable the longest.
    pub fn victim(&mut self) -> Option<FrameId> {
        let frame_id = self.head?;
        self.unlink(frame_id);
        Some(frame_id)
    }

    /// Marks a frame as evictable. No-op if it already is.
    pub fn unpin(&mut self, frame_id: FrameId) {
        let tracked = frame_id.as_usize() < self.nodes.len();
        if tracked && !self.contains(frame_id) {
            self.push_back(frame_id);
        }
    }

    /// Marks a frame as in use. No-op if it is not evictable.
    pub fn pin(&mut self, frame_id: FrameId) {
        self.remove(frame_id);
    }

    /// Drops a frame from the replacer, e.g. when its page is deleted.
    pub fn remove(&mut self, frame_id: FrameId) {
        if self.contains(frame_id) {
            self.unlink(frame_id);
        }
    }

    /// Returns whether the frame is currently evictable.
    pub fn contains(&self, frame_id: FrameId) -> bool {
        self.nodes
            .get(frame_id.as_usize())
            .is_some_and(|node| node.linked)
    }

    /// Returns the number of evictable frames.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of frames this replacer can track.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    fn push_back(&mut self, frame_id: FrameId) {
        let old_tail = self.tail;
        self.nodes[frame_id.as_usize()] = Node {
            prev: old_tail,
            next: None,
            linked: true,
        };
        match old_tail {
            Some(tail) => self.nodes[tail.as_usize()].next = Some(frame_id),
            None => self.head = Some(frame_id),
        }
        self.tail = Some(frame_id);
        self.size += 1;
    }

    fn unlink(&mut self, frame_id: FrameId) {
        let Node { prev, next, .. } = std::mem::take(&mut self.nodes[frame_id.as_usize()]);
        match prev {
            Some(prev) => self.nodes[prev.as_usize()].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next.as_usize()].prev = prev,
            None => self.tail = prev,
        }
        self.size -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(id: u32) -> FrameId {
        FrameId::new(id)
    }

    #[test]
    fn test_lru_replacer_new() {
        let replacer = LruReplacer::new(10);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.capacity(), 10);
    }

    #[test]
    fn test_lru_replacer_victim_empty() {
        let mut replacer = LruReplacer::new(10);
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn test_lru_replacer_victim_in_unpin_order() {
        let mut replacer = LruReplacer::new(10);

        replacer.unpin(f(2));
        replacer.unpin(f(0));
        replacer.unpin(f(1));
        assert_eq!(replacer.size(), 3);

        assert_eq!(replacer.victim(), Some(f(2)));
        assert_eq!(replacer.victim(), Some(f(0)));
        assert_eq!(replacer.victim(), Some(f(1)));
        assert_eq!(replacer.victim(), None);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_lru_replacer_unpin_is_idempotent() {
        let mut replacer = LruReplacer::new(10);

        replacer.unpin(f(1));
        replacer.unpin(f(2));
        // A second unpin does not refresh the position
        replacer.unpin(f(1));

        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.victim(), Some(f(1)));
    }

    #[test]
    fn test_lru_replacer_pin_removes_middle() {
        let mut replacer = LruReplacer::new(10);

        for i in 0..3 {
            replacer.unpin(f(i));
        }
        replacer.pin(f(1));
        replacer.pin(f(1));

        assert_eq!(replacer.size(), 2);
        assert!(!replacer.contains(f(1)));
        assert_eq!(replacer.victim(), Some(f(0)));
        assert_eq!(replacer.victim(), Some(f(2)));
    }

    #[test]
    fn test_lru_replacer_pin_head_and_tail() {
        let mut replacer = LruReplacer::new(10);

        for i in 0..4 {
            replacer.unpin(f(i));
        }
        replacer.pin(f(0));
        replacer.pin(f(3));

        assert_eq!(replacer.victim(), Some(f(1)));
        assert_eq!(replacer.victim(), Some(f(2)));
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn test_lru_replacer_repin_moves_to_back() {
        let mut replacer = LruReplacer::new(10);

        replacer.unpin(f(0));
        replacer.unpin(f(1));
        replacer.pin(f(0));
        replacer.unpin(f(0));

        assert_eq!(replacer.victim(), Some(f(1)));
        assert_eq!(replacer.victim(), Some(f(0)));
    }

    #[test]
    fn test_lru_replacer_remove() {
        let mut replacer = LruReplacer::new(10);

        replacer.unpin(f(4));
        replacer.remove(f(4));
        replacer.remove(f(5));

        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn test_lru_replacer_ignores_out_of_range() {
        let mut replacer = LruReplacer::new(2);

        replacer.unpin(f(7));
        replacer.pin(f(7));

        assert_eq!(replacer.size(), 0);
        assert!(!replacer.contains(f(7)));
    }

    #[test]
    fn test_lru_replacer_reuse_after_victim() {
        let mut replacer = LruReplacer::new(3);

        replacer.unpin(f(0));
        assert_eq!(replacer.victim(), Some(f(0)));
        replacer.unpin(f(1));
        replacer.unpin(f(0));

        assert_eq!(replacer.victim(), Some(f(1)));
        assert_eq!(replacer.victim(), Some(f(0)));
    }
}
