use super::extractor::RawSample;
use super::filters::{apply_chain, WindowFilter};
use super::statistics::mean;

// BUFFER COMPONENT ------------------------------------------------------------

/// Fixed-capacity FIFO. Pushing into a full buffer overwrites the oldest
/// element; iteration is always oldest-first.
#[derive(Clone, Debug)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    capacity: usize,
    start: usize,
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be positive");
        Self {
            buffer: vec![T::default(); capacity],
            capacity,
            start: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, element: T) {
        if self.len < self.capacity {
            self.buffer[(self.start + self.len) % self.capacity] = element;
            self.len += 1;
        } else {
            self.buffer[self.start] = element; // Overwrite oldest if full
            self.start = (self.start + 1) % self.capacity;
        }
    }

    /// Appends a batch. A batch at least as long as the capacity replaces the
    /// contents with its trailing `capacity` elements in one copy.
    pub fn extend_from_slice(&mut self, elements: &[T]) {
        if elements.len() >= self.capacity {
            let tail = &elements[elements.len() - self.capacity..];
            self.buffer.copy_from_slice(tail);
            self.start = 0;
            self.len = self.capacity;
        } else {
            for &element in elements {
                self.push(element);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.buffer[(self.start + i) % self.capacity])
    }

    /// Copies the contents, oldest first, into `out` (cleared first).
    pub fn copy_into(&self, out: &mut Vec<T>) {
        out.clear();
        out.extend(self.iter());
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
    }
}

// SAMPLE BUFFER MANAGER -------------------------------------------------------

/// What happened when a frame closed a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// Window was detrended and appended to the processed buffers.
    Active { window_index: usize },
    /// Rest window: display flattened, processed buffers untouched.
    Idle { window_index: usize },
}

/// Owns every per-session sample buffer.
///
/// Window accumulators hold `1 - mean` rather than the raw mean. Blood volume
/// peaks absorb more light, so the pulse shows up as a trough in raw
/// intensity; inverting it turns each beat into a local maximum, which is
/// what the peak detector looks for.
///
/// Completed windows alternate between active (even window index, starting
/// with the first) and idle (odd). The alternation is part of the observable
/// behaviour through [`SampleBuffers::is_signal`].
pub struct SampleBuffers {
    window_length: usize,
    frame_count: usize,
    raw_red: RingBuffer<f64>,
    raw_green: RingBuffer<f64>,
    window_red: Vec<f64>,
    window_green: Vec<f64>,
    processed_red: RingBuffer<f64>,
    processed_green: RingBuffer<f64>,
    display: Vec<f64>,
    previous_window_mean: f64,
    is_signal: bool,
    filters: Vec<Box<dyn WindowFilter>>,
}

impl SampleBuffers {
    pub fn new(
        window_length: usize,
        capacity: usize,
        filters: Vec<Box<dyn WindowFilter>>,
    ) -> Self {
        Self {
            window_length,
            frame_count: 0,
            raw_red: RingBuffer::new(capacity),
            raw_green: RingBuffer::new(capacity),
            window_red: vec![0.0; window_length],
            window_green: vec![0.0; window_length],
            processed_red: RingBuffer::new(capacity),
            processed_green: RingBuffer::new(capacity),
            display: vec![0.0; window_length],
            previous_window_mean: 0.0,
            is_signal: false,
            filters,
        }
    }

    /// Records one frame's sample. Returns the window event when this frame
    /// completes a window.
    pub fn push(&mut self, sample: &RawSample) -> Option<WindowEvent> {
        let slot = self.frame_count % self.window_length;
        self.window_red[slot] = 1.0 - sample.red_mean;
        self.window_green[slot] = 1.0 - sample.green_mean;
        self.raw_red.push(sample.red_mean);
        self.raw_green.push(sample.green_mean);
        self.frame_count += 1;

        if self.frame_count % self.window_length != 0 {
            return None;
        }

        let window_index = self.frame_count / self.window_length - 1;
        if window_index % 2 == 0 {
            let red = apply_chain(&self.filters, &self.window_red);
            let green = apply_chain(&self.filters, &self.window_green);
            self.processed_red.extend_from_slice(&red);
            self.processed_green.extend_from_slice(&green);
            self.previous_window_mean = mean(&red);
            self.display = red;
            self.is_signal = true;
            Some(WindowEvent::Active { window_index })
        } else {
            self.display.fill(self.previous_window_mean);
            self.is_signal = false;
            Some(WindowEvent::Idle { window_index })
        }
    }

    /// Processed value shown for the most recent frame.
    pub fn display_value(&self) -> f64 {
        if self.frame_count == 0 {
            return self.previous_window_mean;
        }
        self.display[(self.frame_count - 1) % self.window_length]
    }

    pub fn is_signal(&self) -> bool {
        self.is_signal
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn raw_red(&self) -> &RingBuffer<f64> {
        &self.raw_red
    }

    pub fn raw_green(&self) -> &RingBuffer<f64> {
        &self.raw_green
    }

    pub fn processed_red(&self) -> &RingBuffer<f64> {
        &self.processed_red
    }

    pub fn processed_green(&self) -> &RingBuffer<f64> {
        &self.processed_green
    }

    /// Empties every buffer. Only used when a session ends.
    pub fn clear(&mut self) {
        self.frame_count = 0;
        self.raw_red.clear();
        self.raw_green.clear();
        self.window_red.fill(0.0);
        self.window_green.fill(0.0);
        self.processed_red.clear();
        self.processed_green.clear();
        self.display.fill(0.0);
        self.previous_window_mean = 0.0;
        self.is_signal = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::filters::LinearDetrend;
    use approx::assert_abs_diff_eq;

    fn sample(red: f64, green: f64) -> RawSample {
        RawSample {
            red_mean: red,
            green_mean: green,
            timestamp: 0.0,
        }
    }

    fn detrending_buffers(window_length: usize, capacity: usize) -> SampleBuffers {
        SampleBuffers::new(
            window_length,
            capacity,
            vec![Box::new(LinearDetrend::new())],
        )
    }

    #[test]
    fn ring_buffer_keeps_last_capacity_pushes_in_order() {
        let mut buffer = RingBuffer::new(256);
        for i in 0..1000 {
            buffer.push(i);
        }
        assert_eq!(buffer.len(), 256);
        assert_eq!(buffer.to_vec(), (744..1000).collect::<Vec<_>>());
    }

    #[test]
    fn ring_buffer_below_capacity_grows() {
        let mut buffer = RingBuffer::new(4);
        buffer.push(1.0);
        buffer.push(2.0);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn batch_longer_than_capacity_keeps_its_tail() {
        let mut buffer = RingBuffer::new(5);
        buffer.push(-1);
        buffer.extend_from_slice(&[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(buffer.to_vec(), vec![3, 4, 5, 6, 7]);

        buffer.extend_from_slice(&[8, 9]);
        assert_eq!(buffer.to_vec(), vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn copy_into_reuses_the_output() {
        let mut buffer = RingBuffer::new(3);
        buffer.extend_from_slice(&[1, 2, 3, 4]);
        let mut out = vec![99; 10];
        buffer.copy_into(&mut out);
        assert_eq!(out, vec![2, 3, 4]);
    }

    #[test]
    fn first_window_is_active_second_is_idle() {
        let mut buffers = detrending_buffers(10, 8);
        let mut events = Vec::new();
        for i in 0..30 {
            if let Some(event) = buffers.push(&sample(0.5 + 0.01 * i as f64, 0.3)) {
                events.push((i, event));
            }
        }
        assert_eq!(
            events,
            vec![
                (9, WindowEvent::Active { window_index: 0 }),
                (19, WindowEvent::Idle { window_index: 1 }),
                (29, WindowEvent::Active { window_index: 2 }),
            ]
        );
        assert!(buffers.is_signal());
    }

    #[test]
    fn active_window_appends_inverted_detrended_values() {
        let mut buffers = detrending_buffers(10, 8);
        for i in 0..10 {
            let red = if i % 2 == 0 { 0.6 } else { 0.4 };
            buffers.push(&sample(red, 0.5));
        }

        // capacity 8 < window 10: processed keeps the window's last 8 values
        let processed = buffers.processed_red().to_vec();
        assert_eq!(processed.len(), 8);
        // inverted: even frames (bright) are low, odd frames high
        assert!(processed[0] < 0.0 && processed[1] > 0.0);
        assert_eq!(buffers.raw_red().len(), 8);
        for value in buffers.processed_green().iter() {
            assert_abs_diff_eq!(value, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn idle_window_flattens_display_and_leaves_processed_alone() {
        let mut buffers = detrending_buffers(10, 32);
        for i in 0..10 {
            buffers.push(&sample(0.5 + 0.05 * (i as f64).sin(), 0.5));
        }
        let processed_after_active = buffers.processed_red().to_vec();
        let window_mean = mean(&processed_after_active);

        for _ in 0..10 {
            buffers.push(&sample(0.9, 0.9));
        }
        assert!(!buffers.is_signal());
        assert_eq!(buffers.processed_red().to_vec(), processed_after_active);
        assert_abs_diff_eq!(buffers.display_value(), window_mean, epsilon = 1e-12);
    }

    #[test]
    fn clear_resets_everything() {
        let mut buffers = detrending_buffers(10, 8);
        for _ in 0..10 {
            buffers.push(&sample(0.5, 0.5));
        }
        buffers.clear();
        assert_eq!(buffers.frame_count(), 0);
        assert!(buffers.raw_red().is_empty());
        assert!(buffers.processed_red().is_empty());
        assert!(!buffers.is_signal());
    }
}
