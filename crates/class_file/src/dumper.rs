use std::io::{self, Write};

const INDENT: &str = "    ";

/// Text sink for rendered declarations.
///
/// Line ends are held back until more text arrives, so a renderer can take back a
/// blank line it has already asked for.
pub trait Dumper {
    /// Prints `text`. A trailing `\n` ends the line lazily.
    fn print(&mut self, text: &str);

    /// Ends the current line, or requests a blank line if the line is already ended.
    fn newln(&mut self);

    /// Drops a pending blank line, keeping the pending line end if there is one.
    fn remove_trailing_soft_break(&mut self);
}

/// Renders into a `String`, indenting by one level per open `{`.
#[derive(Debug)]
pub struct StringDumper {
    out: String,
    pending_breaks: usize,
    indent: usize,
    at_line_start: bool,
}
impl StringDumper {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            pending_breaks: 0,
            indent: 0,
            at_line_start: true,
        }
    }

    /// Flushes pending line ends and returns the text.
    pub fn finish(mut self) -> String {
        self.flush_breaks();
        self.out
    }

    fn flush_breaks(&mut self) {
        for _ in 0..self.pending_breaks {
            self.out.push('\n');
            self.at_line_start = true;
        }
        self.pending_breaks = 0;
    }

    fn write_segment(&mut self, segment: &str) {
        self.flush_breaks();
        if self.at_line_start {
            if segment.starts_with('}') {
                self.indent = self.indent.saturating_sub(1);
            }
            for _ in 0..self.indent {
                self.out.push_str(INDENT);
            }
            self.at_line_start = false;
        }
        self.out.push_str(segment);
        if segment.trim_end().ends_with('{') {
            self.indent += 1;
        }
    }
}
impl Default for StringDumper {
    fn default() -> Self {
        Self::new()
    }
}
impl Dumper for StringDumper {
    fn print(&mut self, text: &str) {
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.pending_breaks += 1;
            }
            if !segment.is_empty() {
                self.write_segment(segment);
            }
        }
    }

    fn newln(&mut self) {
        self.pending_breaks += 1;
    }

    fn remove_trailing_soft_break(&mut self) {
        self.pending_breaks = self.pending_breaks.min(1);
    }
}

/// Streams rendered text to a writer. The first write error is kept and returned by
/// [`WriteDumper::finish`].
pub struct WriteDumper<W: Write> {
    inner: StringDumper,
    w: W,
    error: Option<io::Error>,
}
impl<W: Write> WriteDumper<W> {
    pub fn new(w: W) -> Self {
        Self {
            inner: StringDumper::new(),
            w,
            error: None,
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush_breaks();
        self.drain();
        match self.error {
            Some(e) => Err(e),
            None => {
                self.w.flush()?;
                Ok(self.w)
            }
        }
    }

    fn drain(&mut self) {
        if self.error.is_none() {
            if let Err(e) = self.w.write_all(self.inner.out.as_bytes()) {
                self.error = Some(e);
            }
        }
        self.inner.out.clear();
    }
}
impl<W: Write> Dumper for WriteDumper<W> {
    fn print(&mut self, text: &str) {
        self.inner.print(text);
        self.drain();
    }

    fn newln(&mut self) {
        self.inner.newln();
    }

    fn remove_trailing_soft_break(&mut self) {
        self.inner.remove_trailing_soft_break();
    }
}
