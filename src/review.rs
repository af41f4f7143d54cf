//! Manual review of exported approach segments.
//!
//! Walks the `unclassified` bucket in file order, applying human
//! dispositions. Each classification relocates the segment file into the
//! bucket matching its new state; "back" relocates the immediately
//! preceding item to `unclassified` and clears its label. That
//! undo-only-previous behavior is a two-pointer cursor, not a general
//! undo stack — intentional, out-of-order undo is unsupported.
//!
//! Relocation is all-or-nothing: when the filesystem move fails the item
//! keeps its prior state and position.
//!
//! Input arrives as a blocking read on any `BufRead` returning the next
//! action as a value; there is no ambient keypress state.

use std::io::BufRead;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::dataset::LabeledCorpus;
use crate::types::Label;

/// Errors raised by the review session.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot classify as {0}: not a review disposition")]
    InvalidDisposition(Label),

    #[error("no item at the review cursor")]
    NoCurrentItem,
}

/// One human disposition, parsed from a single input token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Good,
    Bad,
    Anomaly,
    Skip,
    /// Undo the immediately preceding item
    Back,
    Quit,
}

impl ReviewAction {
    /// Parse an input token. Accepts single letters and full words.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "g" | "good" => Some(Self::Good),
            "b" | "bad" => Some(Self::Bad),
            "a" | "anomaly" => Some(Self::Anomaly),
            "s" | "skip" => Some(Self::Skip),
            "u" | "back" | "undo" => Some(Self::Back),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }

    /// The label a forward action assigns, if it is one.
    pub fn label(self) -> Option<Label> {
        match self {
            Self::Good => Some(Label::Good),
            Self::Bad => Some(Label::Bad),
            Self::Anomaly => Some(Label::Anomaly),
            Self::Skip => Some(Label::Skipped),
            Self::Back | Self::Quit => None,
        }
    }
}

/// Block until the next recognizable action arrives on `input`.
///
/// Unrecognized lines are reported and skipped. `Ok(None)` means the
/// input stream ended.
pub fn next_action(input: &mut impl BufRead) -> std::io::Result<Option<ReviewAction>> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.trim().is_empty() {
            continue;
        }
        match ReviewAction::parse(&line) {
            Some(action) => return Ok(Some(action)),
            None => warn!(input = %line.trim(), "unrecognized review action"),
        }
    }
}

/// One item under review.
#[derive(Debug, Clone)]
pub struct ReviewItem {
    /// Current location of the segment file (moves with its bucket)
    pub path: PathBuf,
    /// Assigned label; `None` while unclassified
    pub label: Option<Label>,
}

impl ReviewItem {
    fn file_name(&self) -> std::io::Result<std::ffi::OsString> {
        self.path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "item path has no file name")
            })
    }
}

/// The review cursor over one corpus's `unclassified` bucket.
pub struct ReviewSession {
    corpus: LabeledCorpus,
    items: Vec<ReviewItem>,
    cursor: usize,
}

impl ReviewSession {
    /// Open a session over the corpus, creating bucket directories as
    /// needed and listing the unclassified files in name order.
    pub fn open(corpus: LabeledCorpus) -> Result<Self, ReviewError> {
        corpus.ensure_buckets()?;
        let items = corpus
            .files_in(Label::Unclassified)?
            .into_iter()
            .map(|path| ReviewItem { path, label: None })
            .collect();
        Ok(Self {
            corpus,
            items,
            cursor: 0,
        })
    }

    /// Item currently under the cursor, if review is not finished.
    pub fn current(&self) -> Option<&ReviewItem> {
        self.items.get(self.cursor)
    }

    /// `(position, total)` of the cursor, 1-based position.
    pub fn progress(&self) -> (usize, usize) {
        (self.cursor + 1, self.items.len())
    }

    /// Whether every item has been reviewed.
    pub fn is_done(&self) -> bool {
        self.cursor >= self.items.len()
    }

    /// Count of items currently carrying the given label.
    pub fn count_labeled(&self, label: Label) -> usize {
        self.items
            .iter()
            .filter(|item| item.label == Some(label))
            .count()
    }

    /// Classify the current item and advance the cursor.
    ///
    /// Relocates the file into the label's bucket. On I/O failure the
    /// item keeps its prior state and the cursor does not move.
    pub fn classify(&mut self, label: Label) -> Result<(), ReviewError> {
        if !matches!(
            label,
            Label::Good | Label::Bad | Label::Anomaly | Label::Skipped
        ) {
            return Err(ReviewError::InvalidDisposition(label));
        }
        let item = self
            .items
            .get(self.cursor)
            .ok_or(ReviewError::NoCurrentItem)?;
        let file_name = item.file_name()?;
        let dest = self.corpus.bucket_dir(label).join(&file_name);

        std::fs::rename(&item.path, &dest)?;
        debug!(file = %dest.display(), label = %label, "classified segment");

        // A same-named stale file left in another bucket by an earlier
        // run would shadow this disposition; clean it up now that the
        // move itself has succeeded.
        for other in Label::ALL {
            if other == label {
                continue;
            }
            let stale = self.corpus.bucket_dir(other).join(&file_name);
            if stale.is_file() {
                if let Err(e) = std::fs::remove_file(&stale) {
                    warn!(file = %stale.display(), error = %e, "failed to remove stale duplicate");
                }
            }
        }

        let item = &mut self.items[self.cursor];
        item.path = dest;
        item.label = Some(label);
        self.cursor += 1;
        Ok(())
    }

    /// Undo the immediately preceding item: relocate it back to the
    /// `unclassified` bucket, clear its label, and step the cursor back.
    ///
    /// Returns `false` when there is no preceding item. On I/O failure
    /// nothing changes.
    pub fn back(&mut self) -> Result<bool, ReviewError> {
        if self.cursor == 0 {
            return Ok(false);
        }
        let prev = &self.items[self.cursor - 1];
        let file_name = prev.file_name()?;
        let dest = self.corpus.bucket_dir(Label::Unclassified).join(&file_name);

        std::fs::rename(&prev.path, &dest)?;
        debug!(file = %dest.display(), "returned segment to unclassified");

        let prev = &mut self.items[self.cursor - 1];
        prev.path = dest;
        prev.label = None;
        self.cursor -= 1;
        Ok(true)
    }
}
