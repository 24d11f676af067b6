//! User-visible success/failure messages.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Success => "Success",
            NoticeKind::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

/// Fire-and-forget sink for notices.
pub trait Notifier {
    fn notify(&mut self, kind: NoticeKind, message: &str);

    fn success(&mut self, message: &str) {
        self.notify(NoticeKind::Success, message);
    }

    fn error(&mut self, message: &str) {
        self.notify(NoticeKind::Error, message);
    }
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn notify(&mut self, kind: NoticeKind, message: &str) {
        (**self).notify(kind, message);
    }
}

/// Collects notices in order. Used by the browser status line and by tests.
#[derive(Debug, Default, Clone)]
pub struct NoticeLog {
    notices: Vec<Notice>,
    limit: Option<usize>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the newest `limit` notices (at least one).
    pub fn bounded(limit: usize) -> Self {
        Self {
            notices: Vec::new(),
            limit: Some(limit.max(1)),
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn last(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices.iter().filter(|n| n.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Notifier for NoticeLog {
    fn notify(&mut self, kind: NoticeKind, message: &str) {
        self.notices.push(Notice {
            kind,
            message: message.to_string(),
        });
        if let Some(limit) = self.limit {
            let excess = self.notices.len().saturating_sub(limit);
            self.notices.drain(..excess);
        }
    }
}

/// Prints successes to stdout and errors to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier {
    /// Number of error notices printed so far.
    pub errors: usize,
}

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Success => println!("{message}"),
            NoticeKind::Error => {
                self.errors += 1;
                eprintln!("Error: {message}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_keeps_order_and_counts() {
        let mut log = NoticeLog::new();
        log.success("uploaded");
        log.error("fetch failed");
        log.error("again");
        assert_eq!(log.len(), 3);
        assert_eq!(log.count(NoticeKind::Error), 2);
        assert_eq!(log.last().unwrap().to_string(), "Error: again");
    }

    #[test]
    fn bounded_log_drops_oldest() {
        let mut log = NoticeLog::bounded(2);
        for i in 0..5 {
            log.success(&format!("upload {i}"));
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.notices()[0].message, "upload 3");
        assert_eq!(log.last().unwrap().message, "upload 4");
    }
}
