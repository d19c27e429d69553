// Copyright (c) 2016-2021 Fabian Schuiki

//! A global source file table that assigns an opaque ID to each processed
//! grammar file. This keeps source locations lean and allows diagnostics to
//! point back into the input long after it has been parsed.

use crate::errors::{DiagBuilder2, DiagResult2};
use memmap2::Mmap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Source(pub u32);

impl Source {
    /// Return the path of this source file.
    pub fn get_path(self) -> Rc<str> {
        get_source_manager().with(self, |x| x.get_path())
    }

    /// Access the contents of this source file.
    pub fn get_content(self) -> Rc<dyn SourceContent> {
        get_source_manager().with(self, |x| x.get_content())
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "Source({}; \"{}\")", self.0, self.get_path())
        } else {
            write!(f, "Source(INVALID)")
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.get_path(), f)
    }
}

pub trait SourceFile {
    fn get_path(&self) -> Rc<str>;

    /// Obtain the content of this source file. The returned object may be used
    /// to iterate over the characters in the file or extract portions of it.
    fn get_content(&self) -> Rc<dyn SourceContent>;
}

pub trait SourceContent {
    /// Obtain the entire content as a string slice.
    fn text(&self) -> &str;

    /// Obtain an iterator over the characters within the source file, together
    /// with their respective byte positions.
    fn iter(&self) -> Box<CharIter<'_>> {
        Box::new(self.text().char_indices())
    }

    /// Obtain an iterator over the characters within the source file, starting
    /// at the provided location `offset`, together with their respective byte
    /// positions.
    fn iter_from(&self, offset: usize) -> Box<CharIter<'_>> {
        Box::new(
            self.text()[offset..]
                .char_indices()
                .map(move |(i, c)| (i + offset, c)),
        )
    }

    /// Copy a range of the source content into a String instance owned by the
    /// caller.
    fn extract(&self, begin: usize, end: usize) -> String {
        self.text()[begin..end].to_string()
    }

    /// Obtain an iterator over an extract of the source content. This might be
    /// more efficient than copying the extract into a String.
    fn extract_iter(&self, begin: usize, end: usize) -> Box<CharIter<'_>> {
        Box::new(
            self.text()[begin..end]
                .char_indices()
                .map(move |(i, c)| (i + begin, c)),
        )
    }
}

/// A manager for source files and their assigned IDs.
pub struct SourceManager {
    map: RefCell<HashMap<Rc<str>, Source>>,
    vect: RefCell<Vec<Box<dyn SourceFile>>>,
}

impl SourceManager {
    fn new() -> SourceManager {
        SourceManager {
            map: RefCell::new(HashMap::new()),
            vect: RefCell::new(Vec::new()),
        }
    }

    /// Obtain the source file for a given source ID.
    pub fn with<F, R>(&self, id: Source, f: F) -> R
    where
        F: FnOnce(&dyn SourceFile) -> R,
    {
        let vect = self.vect.borrow();
        assert!(id.0 > 0, "invalid source");
        assert!(
            (id.0 as usize - 1) < vect.len(),
            "unknown source file: Source({}) >= {}",
            id.0,
            vect.len()
        );
        f(&*vect[id.0 as usize - 1])
    }

    /// Find a source that has already been opened or added.
    pub fn find(&self, filename: &str) -> Option<Source> {
        self.map.borrow().get(filename).copied()
    }

    /// Open a file on disk. The file must exist and contain valid UTF-8.
    /// Opening the same path twice yields the same source.
    ///
    /// The file is read exactly once. Later changes to the file on disk are
    /// not observed by the returned source.
    pub fn open(&self, filename: &str) -> DiagResult2<Source> {
        if let Some(id) = self.find(filename) {
            return Ok(id);
        }

        let text = read_text(Path::new(filename))?;
        let mut vect = self.vect.borrow_mut();
        let new_id = Source(vect.len() as u32 + 1);
        let path: Rc<str> = Rc::from(filename);
        self.map.borrow_mut().insert(path.clone(), new_id);
        vect.push(Box::new(TextSourceFile {
            path,
            content: Rc::new(TextContent(text)),
        }));
        Ok(new_id)
    }

    /// Create a virtual file from the contents of a string and add it to the
    /// source manager. Future calls to `open()` with the given filename will
    /// yield the provided contents.
    pub fn add(&self, filename: &str, content: &str) -> Source {
        let mut map = self.map.borrow_mut();
        assert!(
            !map.contains_key(filename),
            "add failed: source \"{}\" already exists",
            filename
        );
        let mut vect = self.vect.borrow_mut();
        let new_id = Source(vect.len() as u32 + 1);
        let path: Rc<str> = Rc::from(filename);
        map.insert(path.clone(), new_id);
        vect.push(Box::new(TextSourceFile {
            path,
            content: Rc::new(TextContent(content.to_string())),
        }));
        new_id
    }

    /// Create a virtual file from the contents of a string and add it to the
    /// source manager. The file can only be used with the returned `Source`,
    /// since there is no name associated with it by which it could be referred
    /// to.
    pub fn add_anonymous<S>(&self, content: S) -> Source
    where
        S: Into<String>,
    {
        let mut vect = self.vect.borrow_mut();
        let new_id = Source(vect.len() as u32 + 1);
        vect.push(Box::new(TextSourceFile {
            path: Rc::from("<anonymous>"),
            content: Rc::new(TextContent(content.into())),
        }));
        new_id
    }
}

/// Get the global source manager.
pub fn get_source_manager() -> Rc<SourceManager> {
    thread_local!(static MNGR: Rc<SourceManager> = {
        Rc::new(SourceManager::new())
    });
    MNGR.with(|x| x.clone())
}

/// Map a file and decode it into an owned string. The mapping is released
/// before this function returns.
fn read_text(path: &Path) -> DiagResult2<String> {
    let unable = |e: std::io::Error| {
        DiagBuilder2::fatal(format!("unable to open `{}`: {}", path.display(), e))
    };
    let file = File::open(path).map_err(unable)?;
    let map = unsafe { Mmap::map(&file) }.map_err(unable)?;
    match std::str::from_utf8(&map) {
        Ok(text) => Ok(text.to_string()),
        Err(e) => Err(DiagBuilder2::fatal(format!(
            "`{}` is not valid UTF-8: {}",
            path.display(),
            e
        ))),
    }
}

/// A source file whose content is held in memory. Disk files are decoded into
/// one of these when they are opened, virtual files are created from a string.
struct TextSourceFile {
    path: Rc<str>,
    content: Rc<TextContent>,
}

struct TextContent(String);

impl SourceFile for TextSourceFile {
    fn get_path(&self) -> Rc<str> {
        self.path.clone()
    }

    fn get_content(&self) -> Rc<dyn SourceContent> {
        self.content.clone()
    }
}

impl SourceContent for TextContent {
    fn text(&self) -> &str {
        &self.0
    }
}

/// An iterator that yields the characters from an input file together with the
/// byte positions within the stream.
pub type CharIter<'a> = dyn DoubleEndedIterator<Item = (usize, char)> + 'a;

/// A single location within a source file, expressed as a byte offset.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Location {
    pub source: Source,
    pub offset: usize,
}

impl Location {
    /// Create a new location.
    pub fn new(source: Source, offset: usize) -> Location {
        Location { source, offset }
    }

    /// Determine the line and column information at this location.
    ///
    /// Returns a tuple `(line, column, line_offset)`.
    pub fn human(self) -> (usize, usize, usize) {
        let c = self.source.get_content();
        let mut iter = c.extract_iter(0, self.offset);

        // Look for the start of the line.
        let mut col = 1;
        let mut line = 1;
        let mut line_offset = self.offset;
        while let Some(c) = iter.next_back() {
            match c.1 {
                '\n' => {
                    line += 1;
                    break;
                }
                '\r' => continue,
                _ => {
                    col += 1;
                    line_offset = c.0;
                }
            }
        }

        // Count the number of lines.
        while let Some(c) = iter.next_back() {
            if c.1 == '\n' {
                line += 1;
            }
        }

        (line, col, line_offset)
    }

    /// Determine the line at this location.
    pub fn human_line(self) -> usize {
        self.human().0
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}:{}", self.source, self.offset)
    }
}

/// A span of locations within a source file, expressed as a half-open interval
/// of bytes `[begin,end)`.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Span {
    pub source: Source,
    pub begin: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span from two byte offsets.
    pub fn new(source: Source, begin: usize, end: usize) -> Span {
        Span { source, begin, end }
    }

    /// Create a new span that covers two spans, i.e. represents the smallest
    /// possible span that fully contains both input spans `a` and `b`.
    pub fn union<S: Into<Span>>(a: S, b: S) -> Span {
        use std::cmp::{max, min};
        let sa = a.into();
        let sb = b.into();
        if sa.source != sb.source {
            return sa;
        }
        Span {
            source: sa.source,
            begin: min(sa.begin, sb.begin),
            end: max(sa.end, sb.end),
        }
    }

    /// Return the location just before the first character in this span.
    pub fn begin(&self) -> Location {
        Location::new(self.source, self.begin)
    }

    /// Copy the portion of the source file in this span into an owned string.
    pub fn extract(&self) -> String {
        self.source.get_content().extract(self.begin, self.end)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}:{}-{}", self.source, self.begin, self.end)
    }
}

/// A wrapper that associates a span with a value.
#[derive(PartialOrd, Ord, PartialEq, Eq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Wrap a given value together with the span it covers.
    pub fn new(value: T, span: Span) -> Spanned<T> {
        Spanned { value, span }
    }
}

impl<T> fmt::Debug for Spanned<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T> fmt::Display for Spanned<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T> Copy for Spanned<T> where T: Copy {}

impl<T> Clone for Spanned<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Spanned {
            value: self.value.clone(),
            span: self.span,
        }
    }
}

impl<T> Hash for Spanned<T>
where
    T: Hash,
{
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.value.hash(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "invalid source")]
    fn invalid_source_id() {
        get_source_manager().with(Source(0), |_| ());
    }

    #[test]
    #[should_panic(expected = "unknown source file")]
    fn unknown_source_id() {
        get_source_manager().with(Source(1), |_| ());
    }

    #[test]
    fn inject_file() {
        let sm = get_source_manager();
        let id = sm.add("flabberghasted.lsys", "%A\n@A@\n");
        let source = sm.open("flabberghasted.lsys").expect("file should exist");
        assert_eq!(source, id);
    }

    #[test]
    fn inexistent_file() {
        let sm = get_source_manager();
        assert!(sm.open("/this/path/points/nowhere").is_err());
    }

    #[test]
    fn chars() {
        let sm = get_source_manager();
        let source = sm.add_anonymous("老虎.");
        let content = source.get_content();
        let elements: Vec<(usize, char)> = content.iter().collect();
        assert_eq!(elements, vec![(0, '老'), (3, '虎'), (6, '.')]);
        let tail: Vec<(usize, char)> = content.iter_from(3).collect();
        assert_eq!(tail, vec![(3, '虎'), (6, '.')]);
    }

    #[test]
    fn human_location() {
        let sm = get_source_manager();
        let source = sm.add_anonymous("%A,B\n@A@\n$A=\n");
        assert_eq!(Location::new(source, 0).human(), (1, 1, 0));
        assert_eq!(Location::new(source, 6).human(), (2, 2, 5));
        assert_eq!(Span::new(source, 10, 11).extract(), "A");
    }

    #[test]
    fn file() {
        use std::io::Write;

        let path = std::env::temp_dir().join("lsys-source-test.lsys");
        let data = "%Löwe, 老虎\n@Löwe@\n";
        File::create(&path)
            .unwrap()
            .write_all(data.as_bytes())
            .unwrap();

        let sm = get_source_manager();
        let source = sm.open(path.to_str().unwrap()).expect("file should exist");
        let content = source.get_content();
        let expected: Vec<_> = data.char_indices().collect();
        let actual: Vec<_> = content.iter().collect();

        assert_eq!(expected, actual);
    }

    #[test]
    fn file_is_read_once() {
        use std::io::Write;

        let path = std::env::temp_dir().join("lsys-source-read-once.lsys");
        let data = "%Alpha\n@Alpha@\n";
        File::create(&path)
            .unwrap()
            .write_all(data.as_bytes())
            .unwrap();
        let sm = get_source_manager();
        let source = sm.open(path.to_str().unwrap()).expect("file should exist");

        // Rewrite the file with shorter, invalid content behind our back.
        File::create(&path)
            .unwrap()
            .write_all(&[0x25, 0xff])
            .unwrap();

        assert_eq!(source.get_content().text(), data);
        assert_eq!(Span::new(source, 8, 13).extract(), "Alpha");
        assert_eq!(Location::new(source, 8).human(), (2, 2, 7));
        assert_eq!(sm.open(path.to_str().unwrap()).unwrap(), source);
    }

    #[test]
    fn rejects_invalid_utf8() {
        use std::io::Write;

        let path = std::env::temp_dir().join("lsys-source-binary.lsys");
        File::create(&path)
            .unwrap()
            .write_all(&[0x25, 0xff, 0xfe, 0x0a])
            .unwrap();
        let sm = get_source_manager();
        let err = sm.open(path.to_str().unwrap()).unwrap_err();
        assert!(err.get_message().contains("not valid UTF-8"));
    }
}
