use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;

/// Byte range into the offending source, used for ariadne labels.
#[derive(Debug, Clone, Copy)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }
}

/// 1-based line/column position reported to the host.
#[derive(Debug, Clone, Copy)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Runtime,
}

#[derive(Debug, Clone)]
pub struct SpudError {
    pub kind: ErrorKind,
    pub message: String,
    /// Lex and parse errors are positioned; runtime errors carry a message only.
    pub pos: Option<SourcePos>,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl SpudError {
    pub fn lex(pos: SourcePos, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Lex,
            message: message.into(),
            pos: Some(pos),
            span: Some(span),
            help: None,
        }
    }

    pub fn parse(pos: SourcePos, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            message: message.into(),
            pos: Some(pos),
            span: Some(span),
            help: None,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            message: message.into(),
            pos: None,
            span: None,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Pretty terminal diagnostic. The plain `Display` form is what the
    /// `parse_only`/`run_script` entry points emit; this one is for the CLI
    /// and the REPL, where the source line is at hand.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");

        let (color, kind_str) = match self.kind {
            ErrorKind::Lex => (Color::Red, "Lex Error"),
            ErrorKind::Parse => (Color::Yellow, "Parse Error"),
            ErrorKind::Runtime => (Color::Magenta, "Runtime Error"),
        };

        let offset = self.span.map_or(0, |s| s.start);
        let mut builder = Report::build(ReportKind::Error, filename, offset)
            .with_message(format!("{}: {}", kind_str.fg(color), self.message));

        if let Some(span) = self.span {
            builder = builder.with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(&self.message)
                    .with_color(color),
            );
        }

        if let Some(ref help_text) = self.help {
            builder = builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        let _ = builder.finish().print((filename, Source::from(source)));
    }
}

impl fmt::Display for SpudError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.kind, self.pos) {
            (ErrorKind::Lex, Some(p)) => {
                write!(f, "Lex error at {}:{}: {}", p.line, p.column, self.message)
            }
            (ErrorKind::Parse, Some(p)) => {
                write!(f, "Parse error at {}:{}: {}", p.line, p.column, self.message)
            }
            (ErrorKind::Runtime, _) => write!(f, "Runtime error: {}", self.message),
            (_, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for SpudError {}
