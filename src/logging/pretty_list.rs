use std::fmt;

/// Formats a slice as a markdown style list, one entry per line, so lists
/// read well inside multiline log records.
///
/// The alternate flag (`{:#?}`) pretty-prints each entry.
pub struct PrettyList<'data, T>(pub &'data [T]);

impl<T> PrettyList<'_, T> {
    fn write_entries(
        &self,
        f: &mut fmt::Formatter<'_>,
        mut write_entry: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
    ) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(" (none)");
        }
        for entry in self.0 {
            f.write_str("\n- ")?;
            write_entry(f, entry)?;
        }
        f.write_str("\n")
    }
}

impl<T: fmt::Debug> fmt::Debug for PrettyList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pretty = f.alternate();
        self.write_entries(f, |f, entry| match pretty {
            true => write!(f, "{:#?}", entry),
            false => write!(f, "{:?}", entry),
        })
    }
}

impl<T: fmt::Display> fmt::Display for PrettyList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_entries(f, |f, entry| write!(f, "{}", entry))
    }
}
