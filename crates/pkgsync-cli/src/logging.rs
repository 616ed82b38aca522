use std::fmt::Write as _;

use nu_ansi_term::Color::{Blue, DarkGray, Magenta, Red, Yellow};
use tracing::{field::Field, Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields, FormattedFields, MakeWriter,
    },
    registry::LookupSpan,
};

use crate::{cli::Args, utils::Colored};

/// Splits an event into its message and the remaining `key=value` fields.
#[derive(Default)]
struct EventFields {
    message: String,
    extra: String,
}

impl tracing::field::Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.extra, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.extra, " {}={value:?}", field.name());
        }
    }
}

/// Human readable event format.
///
/// `INFO` events are progress for the user and print as bare messages. Every other level
/// carries a colored tag and the chain of engine spans it was emitted in, so that a
/// `-v` line reads like `[DEBUG] package{spec=foo==1.0}:artifact{file=foo-1.0.tar.gz}:
/// uploading`.
pub struct SyncFormatter;

impl<S, N> FormatEvent<S, N> for SyncFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = *event.metadata().level();
        match level {
            Level::INFO => {}
            Level::TRACE => write!(writer, "{} ", Colored(Magenta, "[TRACE]"))?,
            Level::DEBUG => write!(writer, "{} ", Colored(Blue, "[DEBUG]"))?,
            Level::WARN => write!(writer, "{} ", Colored(Yellow, "[WARN]"))?,
            Level::ERROR => write!(writer, "{} ", Colored(Red, "[ERROR]"))?,
        }

        if level != Level::INFO {
            if let Some(scope) = ctx.event_scope() {
                let mut path = String::new();
                for span in scope.from_root() {
                    if !path.is_empty() {
                        path.push(':');
                    }
                    path.push_str(span.name());
                    let extensions = span.extensions();
                    if let Some(fields) = extensions.get::<FormattedFields<N>>() {
                        if !fields.is_empty() {
                            let _ = write!(path, "{{{fields}}}");
                        }
                    }
                }
                if !path.is_empty() {
                    write!(writer, "{}: ", Colored(DarkGray, path))?;
                }
            }
        }

        let mut fields = EventFields::default();
        event.record(&mut fields);
        write!(writer, "{}", fields.message)?;
        if !fields.extra.is_empty() {
            let extra = if fields.message.is_empty() {
                fields.extra.trim_start()
            } else {
                &fields.extra
            };
            write!(writer, "{}", Colored(DarkGray, extra))?;
        }
        writeln!(writer)
    }
}

struct WriterBuilder;

/// Buffers one formatted event and prints it on drop, on a fresh line so that it does
/// not land in the middle of a status line.
struct LineWriter {
    buffer: Vec<u8>,
    use_stderr: bool,
}

impl LineWriter {
    fn new(use_stderr: bool) -> Self {
        Self {
            buffer: Vec::new(),
            use_stderr,
        }
    }
}

impl std::io::Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let output = String::from_utf8_lossy(&self.buffer);
        let output = output.trim_end_matches('\n').to_string();
        let use_stderr = self.use_stderr;
        crate::reporter::suspend(|| {
            if use_stderr {
                eprintln!("{output}");
            } else {
                println!("{output}");
            }
        });
    }
}

impl<'a> MakeWriter<'a> for WriterBuilder {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter::new(false)
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        LineWriter::new(meta.level() != &Level::INFO)
    }
}

pub fn filter_level(args: &Args) -> Level {
    if args.quiet {
        Level::ERROR
    } else if args.verbose >= 2 {
        Level::TRACE
    } else if args.verbose == 1 {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

pub fn setup_logging(args: &Args) {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(format!("pkgsync={}", filter_level(args)))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(WriterBuilder)
        .compact()
        .without_time();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if args.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.event_format(SyncFormatter).finish())
    };

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}
