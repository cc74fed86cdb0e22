use crate::level::Level;
use crate::request::RequestSummary;
use crate::sink::Stream;
use chrono::NaiveDateTime;
use console::style;

/// Source of the local wall-clock time used in date tags.
pub type Clock = fn() -> NaiveDateTime;

pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Plain,
    Colored,
}

#[derive(Clone, Copy)]
pub(crate) struct LineFormat {
    pub(crate) palette: Palette,
    pub(crate) clock: Clock,
}

impl LineFormat {
    pub(crate) fn new(palette: Palette, clock: Clock) -> Self {
        Self { palette, clock }
    }

    /// `[2020-01-01T00:00:00] ` prefixed level line.
    pub(crate) fn line(&self, level: Level, message: Option<&str>) -> String {
        let mut line = format!("{} {}", self.date_tag(), self.level_tag(level));
        if let Some(message) = message {
            line.push(' ');
            line.push_str(message);
        }
        line
    }

    /// `POST   200 /foo 100ms 2KB`
    pub(crate) fn request_line(&self, summary: &RequestSummary) -> String {
        let meta = format!("{} {}ms {}", summary.path, summary.latency_ms, summary.size);
        format!(
            "{:<6} {} {}",
            summary.method,
            self.status(summary.status),
            self.gray(&meta)
        )
    }

    fn date_tag(&self) -> String {
        let tag = format!("[{}]", (self.clock)().format("%Y-%m-%dT%H:%M:%S"));
        self.gray(&tag)
    }

    fn level_tag(&self, level: Level) -> String {
        let tag = format!("{:>5}", level.as_str().to_ascii_uppercase());
        match (self.palette, level) {
            (Palette::Plain, _) => tag,
            (Palette::Colored, Level::Error) => style(tag).red().to_string(),
            (Palette::Colored, Level::Warn) => style(tag).yellow().to_string(),
            (Palette::Colored, _) => style(tag).black().bright().to_string(),
        }
    }

    fn status(&self, status: u16) -> String {
        if self.palette == Palette::Plain {
            return status.to_string();
        }
        let styled = match status {
            500..=u16::MAX => style(status).red(),
            400..=499 => style(status).yellow(),
            300..=399 => style(status).cyan(),
            _ => style(status).green(),
        };
        styled.to_string()
    }

    fn gray(&self, text: &str) -> String {
        match self.palette {
            Palette::Plain => text.to_string(),
            Palette::Colored => style(text).black().bright().to_string(),
        }
    }
}

/// Console stream a level is written to.
pub(crate) fn stream_for(level: Level) -> Stream {
    match level {
        Level::Trace | Level::Debug => Stream::Debug,
        Level::Info => Stream::Info,
        Level::Warn => Stream::Warn,
        Level::Error => Stream::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    #[test]
    fn plain_lines_pad_level_tag() {
        let format = LineFormat::new(Palette::Plain, fixed);
        assert_eq!(format.line(Level::Info, Some("msg")), "[2020-01-01T00:00:00]  INFO msg");
        assert_eq!(format.line(Level::Error, Some("msg")), "[2020-01-01T00:00:00] ERROR msg");
        assert_eq!(format.line(Level::Trace, None), "[2020-01-01T00:00:00] TRACE");
    }

    #[test]
    fn plain_request_line() {
        let format = LineFormat::new(Palette::Plain, fixed);
        let summary = RequestSummary::new("POST", "/foo", 200, 100).with_response_length("2048");
        assert_eq!(format.request_line(&summary), "POST   200 /foo 100ms 2KB");
    }

    #[test]
    fn colored_lines_strip_to_plain() {
        let format = LineFormat::new(Palette::Colored, fixed);
        let line = format.line(Level::Warn, Some("careful"));
        assert_eq!(console::strip_ansi_codes(&line), "[2020-01-01T00:00:00]  WARN careful");
    }
}
