//! Line mapper trait and the iterator adapter that drives it
//!
//! Every stage of the line-reader chain is a [`LineMapper`]: it receives one item of the
//! previous stage at a time and produces at most one item of its own. A stage that needs to
//! look ahead (e.g. continuation folding) holds an item back and hands it out from
//! [`LineMapper::flush`] once the input is exhausted.
//!
//! # Design
//!
//! The mapper only holds the transformation state. [`MapStream`] owns the upstream
//! iterator and the pull loop, so every stage stays lazy and single-pass and can be unit
//! tested by feeding it a plain `Vec`.
//!
//! # Examples
//!
//! ```ignore
//! let lines = source
//!     .map_lines(EncodingDecoder::new(diagnostics.clone()))
//!     .map_lines(LineEndingChecker::new(diagnostics.clone()));
//! for line in lines { /* ... */ }
//! ```

/// A single stage of the line-reader chain.
pub trait LineMapper {
    type Input;
    type Output;

    /// Transform one item. Returning `None` drops the item (or holds it back).
    fn map(&mut self, item: Self::Input) -> Option<Self::Output>;

    /// Called once after the last input item.
    fn flush(&mut self) -> Option<Self::Output> {
        None
    }
}

/// Iterator adapter applying a [`LineMapper`] to an upstream iterator.
pub struct MapStream<I, M> {
    inner: I,
    mapper: M,
    flushed: bool,
}

impl<I, M> MapStream<I, M> {
    pub fn new(inner: I, mapper: M) -> Self {
        Self {
            inner,
            mapper,
            flushed: false,
        }
    }
}

impl<I, M> Iterator for MapStream<I, M>
where
    I: Iterator,
    M: LineMapper<Input = I::Item>,
{
    type Item = M::Output;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.flushed {
            match self.inner.next() {
                Some(item) => {
                    if let Some(output) = self.mapper.map(item) {
                        return Some(output);
                    }
                }
                None => {
                    self.flushed = true;
                    return self.mapper.flush();
                }
            }
        }
        None
    }
}

/// Chain a [`LineMapper`] onto any iterator.
pub trait LineStreamExt: Iterator + Sized {
    fn map_lines<M>(self, mapper: M) -> MapStream<Self, M>
    where
        M: LineMapper<Input = Self::Item>,
    {
        MapStream::new(self, mapper)
    }
}

impl<I: Iterator> LineStreamExt for I {}

#[cfg(test)]
mod tests {
    use super::*;

    // Mapper that uppercases and counts items
    struct Upper {
        count: usize,
    }

    impl LineMapper for Upper {
        type Input = String;
        type Output = String;

        fn map(&mut self, item: String) -> Option<String> {
            self.count += 1;
            Some(item.to_uppercase())
        }
    }

    // Mapper that drops empty items
    struct DropEmpty;

    impl LineMapper for DropEmpty {
        type Input = String;
        type Output = String;

        fn map(&mut self, item: String) -> Option<String> {
            (!item.is_empty()).then_some(item)
        }
    }

    // Mapper that delays every item by one and releases the last on flush
    struct Delay {
        held: Option<String>,
    }

    impl LineMapper for Delay {
        type Input = String;
        type Output = String;

        fn map(&mut self, item: String) -> Option<String> {
            self.held.replace(item)
        }

        fn flush(&mut self) -> Option<String> {
            self.held.take()
        }
    }

    fn items(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_map_each_item() {
        let result: Vec<_> = items(&["a", "b"])
            .into_iter()
            .map_lines(Upper { count: 0 })
            .collect();
        assert_eq!(result, items(&["A", "B"]));
    }

    #[test]
    fn test_empty_input() {
        let result: Vec<_> = Vec::<String>::new()
            .into_iter()
            .map_lines(Delay { held: None })
            .collect();
        assert!(result.is_empty());
    }

    #[test]
    fn test_dropped_items_are_skipped() {
        let result: Vec<_> = items(&["a", "", "", "b", ""])
            .into_iter()
            .map_lines(DropEmpty)
            .collect();
        assert_eq!(result, items(&["a", "b"]));
    }

    #[test]
    fn test_flush_releases_held_item() {
        let result: Vec<_> = items(&["a", "b", "c"])
            .into_iter()
            .map_lines(Delay { held: None })
            .collect();
        assert_eq!(result, items(&["a", "b", "c"]));
    }

    #[test]
    fn test_chained_stages() {
        let result: Vec<_> = items(&["a", "", "b"])
            .into_iter()
            .map_lines(DropEmpty)
            .map_lines(Delay { held: None })
            .map_lines(Upper { count: 0 })
            .collect();
        assert_eq!(result, items(&["A", "B"]));
    }

    #[test]
    fn test_stream_is_fused_after_flush() {
        let mut stream = items(&["a"]).into_iter().map_lines(Delay { held: None });
        assert_eq!(stream.next().as_deref(), Some("a"));
        assert_eq!(stream.next(), None);
        assert_eq!(stream.next(), None);
    }
}
