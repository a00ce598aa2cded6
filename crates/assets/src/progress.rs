use std::io::{self, Read};

/// Bytes received so far for one load, and the expected total if known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl LoadProgress {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self {
            loaded,
            total: Some(total),
        }
    }

    /// Percentage in `0.0..=100.0`. Zero while the total is unknown or empty.
    pub fn percent(&self) -> f32 {
        match self.total {
            Some(total) if total > 0 => {
                ((self.loaded as f64 / total as f64) * 100.0).clamp(0.0, 100.0) as f32
            }
            _ => 0.0,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.total, Some(total) if self.loaded >= total)
    }
}

/// Reader adapter that reports the running byte count after every read.
pub struct ProgressReader<R, F> {
    inner: R,
    loaded: u64,
    on_read: F,
}

impl<R: Read, F: FnMut(u64)> ProgressReader<R, F> {
    pub fn new(inner: R, on_read: F) -> Self {
        Self {
            inner,
            loaded: 0,
            on_read,
        }
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }
}

impl<R: Read, F: FnMut(u64)> Read for ProgressReader<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.loaded += n as u64;
            (self.on_read)(self.loaded);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_loaded_is_twenty_five_percent() {
        assert_eq!(LoadProgress::new(50, 200).percent(), 25.0);
    }

    #[test]
    fn percent_is_bounded() {
        assert_eq!(LoadProgress::new(0, 200).percent(), 0.0);
        assert_eq!(LoadProgress::new(200, 200).percent(), 100.0);
        assert_eq!(LoadProgress::new(300, 200).percent(), 100.0);
    }

    #[test]
    fn unknown_or_empty_total_reports_zero() {
        let unknown = LoadProgress {
            loaded: 10,
            total: None,
        };
        assert_eq!(unknown.percent(), 0.0);
        assert_eq!(LoadProgress::new(0, 0).percent(), 0.0);
        assert!(!unknown.is_complete());
    }

    #[test]
    fn reader_reports_running_total() {
        let data = vec![7u8; 10];
        let mut seen = Vec::new();
        let mut reader = ProgressReader::new(&data[..], |n| seen.push(n));
        let mut buf = [0u8; 4];
        while reader.read(&mut buf).unwrap() > 0 {}
        assert_eq!(reader.loaded(), 10);
        drop(reader);
        assert_eq!(seen, vec![4, 8, 10]);
    }
}
