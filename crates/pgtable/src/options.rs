//! Per-call options for write operations.

/// Options controlling `insert` / `update` / `upsert`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Execute the statement without reading a row back.
    ///
    /// The passed record is left untouched and the post-process callback is
    /// not run. Only driver success is checked.
    pub ignore_return: bool,
}

impl QueryOptions {
    /// Shortcut for `QueryOptions::new().ignore_return()`.
    pub const IGNORE_RETURN: Self = Self {
        ignore_return: true,
    };

    /// Default options: the written row is read back into the record.
    pub const fn new() -> Self {
        Self {
            ignore_return: false,
        }
    }

    pub const fn ignore_return(mut self) -> Self {
        self.ignore_return = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_read_back() {
        assert!(!QueryOptions::default().ignore_return);
        assert_eq!(QueryOptions::new(), QueryOptions::default());
    }

    #[test]
    fn ignore_return_shortcut() {
        assert_eq!(QueryOptions::new().ignore_return(), QueryOptions::IGNORE_RETURN);
    }
}
