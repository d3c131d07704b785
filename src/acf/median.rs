/// The maximum median filter length.
pub const MAX_MEDIAN_SIZE: usize = 31;

/// A running median over the most recent values.
///
/// Values are kept sorted in a fixed array, with a parallel array of ages.
/// Inserting a value replaces the oldest one and moves the new value
/// into its sorted position, so no allocation or full sort is needed.
#[derive(Clone, Debug)]
pub struct MedianFilter {
    values: [f32; MAX_MEDIAN_SIZE],
    ages: [usize; MAX_MEDIAN_SIZE],
    size: usize,
}

impl MedianFilter {
    /// Creates a filter of a given length (clamped to `1..=31`)
    /// filled with `value`.
    pub fn new(size: usize, value: f32) -> Self {
        let mut filter = MedianFilter {
            values: [0.0; MAX_MEDIAN_SIZE],
            ages: [0; MAX_MEDIAN_SIZE],
            size: size.clamp(1, MAX_MEDIAN_SIZE),
        };
        filter.fill(value);
        filter
    }

    /// Replaces all values with `value`.
    pub fn fill(&mut self, value: f32) {
        let size = self.size;
        for (age, (v, a)) in self.values[..size]
            .iter_mut()
            .zip(self.ages[..size].iter_mut())
            .enumerate()
        {
            *v = value;
            *a = age;
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The current median value.
    pub fn median(&self) -> f32 {
        self.values[self.size >> 1]
    }

    /// Inserts a value, evicting the oldest one, and returns the new median.
    pub fn insert(&mut self, value: f32) -> f32 {
        let last = self.size - 1;

        // Find the slot of the oldest value and age the others.
        let mut pos = 0;
        for (i, age) in self.ages[..self.size].iter_mut().enumerate() {
            if *age == last {
                pos = i;
            } else {
                *age += 1;
            }
        }

        while pos > 0 && value < self.values[pos - 1] {
            self.values[pos] = self.values[pos - 1];
            self.ages[pos] = self.ages[pos - 1];
            pos -= 1;
        }

        while pos < last && value > self.values[pos + 1] {
            self.values[pos] = self.values[pos + 1];
            self.ages[pos] = self.ages[pos + 1];
            pos += 1;
        }

        self.values[pos] = value;
        self.ages[pos] = 0;
        self.median()
    }

    #[cfg(test)]
    fn values(&self) -> &[f32] {
        &self.values[..self.size]
    }
}
