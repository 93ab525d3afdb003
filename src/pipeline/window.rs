use std::collections::VecDeque;

/// Fixed-capacity FIFO of samples. Pushing past capacity evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct SampleWindow<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T> SampleWindow<T> {
    /// A capacity of zero is bumped to one so the latest sample is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `value`, returning the evicted sample if the window was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.samples.iter()
    }

    /// All samples as one slice, oldest first. Rotates the ring into place if it
    /// has wrapped.
    pub fn as_slice(&mut self) -> &[T] {
        self.samples.make_contiguous()
    }
}

impl<T: Clone> SampleWindow<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_exceeds_capacity() {
        let capacity = 300;
        for extra in [0, 1, 7, 300, 1000] {
            let mut window = SampleWindow::new(capacity);
            for i in 0..capacity + extra {
                window.push(i);
                assert!(window.len() <= capacity);
            }
            assert_eq!(window.len(), capacity);
            let expected: Vec<usize> = (extra..capacity + extra).collect();
            assert_eq!(window.to_vec(), expected);
        }
    }

    #[test]
    fn push_reports_eviction() {
        let mut window = SampleWindow::new(2);
        assert_eq!(window.push('a'), None);
        assert_eq!(window.push('b'), None);
        assert_eq!(window.push('c'), Some('a'));
        assert_eq!(window.to_vec(), vec!['b', 'c']);
    }

    #[test]
    fn partial_fill_keeps_order() {
        let mut window = SampleWindow::new(10);
        for i in 0..4 {
            window.push(i);
        }
        assert_eq!(window.len(), 4);
        assert_eq!(window.to_vec(), vec![0, 1, 2, 3]);
        assert_eq!(window.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn slice_is_ordered_after_wrapping() {
        let mut window = SampleWindow::new(5);
        for i in 0..13 {
            window.push(i);
        }
        assert_eq!(window.as_slice(), &[8, 9, 10, 11, 12]);
        window.push(13);
        assert_eq!(window.as_slice(), &[9, 10, 11, 12, 13]);
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut window = SampleWindow::new(0);
        window.push(1);
        window.push(2);
        assert_eq!(window.len(), 1);
        assert_eq!(window.to_vec(), vec![2]);
    }
}
