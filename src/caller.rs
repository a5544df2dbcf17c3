use std::backtrace::Backtrace;
use std::fmt;

/// Logical call-site identity: the owning component (module path or type)
/// and the function name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub component: Option<String>,
    pub function: String,
}

impl CallSite {
    pub fn new(component: Option<String>, function: impl Into<String>) -> Self {
        Self {
            component,
            function: function.into(),
        }
    }

    /// Split a demangled Rust symbol (`my_app::jobs::Runner::tick`) into a
    /// component (`my_app::jobs::Runner`) and a function (`tick`).
    ///
    /// Closure frames and the trailing `::h0123...` hash are dropped so a
    /// closure inside `tick` still reports `tick`.
    pub fn from_symbol(symbol: &str) -> CallSite {
        let mut symbol = strip_hash(symbol.trim());
        while let Some(rest) = symbol.strip_suffix("::{{closure}}") {
            symbol = rest;
        }

        match symbol.rsplit_once("::") {
            Some((component, function)) if !component.is_empty() => {
                CallSite::new(Some(component.to_string()), function)
            }
            _ => CallSite::new(None, symbol),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.component {
            Some(component) => write!(f, "{}:{}", component, self.function),
            None => f.write_str(&self.function),
        }
    }
}

fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit()) => {
            head
        }
        _ => symbol,
    }
}

/// Source of call-site identity for records that arrive with an empty
/// `caller` field.
///
/// `depth` counts frames outward from the first frame that is not part of
/// the logging plumbing: `0` is whoever called into the logger.
pub trait CallerInfo: Send + Sync {
    /// `None` when the stack is shallower than `depth`.
    fn caller_at(&self, depth: usize) -> Option<CallSite>;
}

impl<F> CallerInfo for F
where
    F: Fn(usize) -> Option<CallSite> + Send + Sync,
{
    fn caller_at(&self, depth: usize) -> Option<CallSite> {
        self(depth)
    }
}

/// Never infers anything; empty callers stay empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCallerInfo;

impl CallerInfo for NoCallerInfo {
    fn caller_at(&self, _depth: usize) -> Option<CallSite> {
        None
    }
}

/// Best-effort caller inference from a captured [`Backtrace`].
///
/// Relies on symbol names being available (debug info or symbol tables) and
/// on the interesting frames not being inlined away. Prefer passing an
/// explicit caller, e.g. via [`log_entry!`](crate::log_entry).
#[derive(Debug, Clone, Copy, Default)]
pub struct StackCallerInfo;

impl CallerInfo for StackCallerInfo {
    fn caller_at(&self, depth: usize) -> Option<CallSite> {
        let trace = Backtrace::force_capture().to_string();
        let site = frame_symbols(&trace)
            .filter(|symbol| !is_plumbing(symbol))
            .nth(depth)
            .map(CallSite::from_symbol);
        if site.is_none() {
            tracing::trace!(depth, "no frame at requested caller depth");
        }
        site
    }
}

/// Symbol names from the text rendering of a backtrace, innermost first.
///
/// Frame lines look like `  12: some::symbol`; the `at file:line` lines in
/// between are skipped.
pub(crate) fn frame_symbols(trace: &str) -> impl Iterator<Item = &str> {
    trace.lines().filter_map(|line| {
        let (index, symbol) = line.trim_start().split_once(": ")?;
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(symbol.trim())
    })
}

const PLUMBING_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "backtrace::",
    "__rust",
    "rust_begin_unwind",
    "file_log_sink::caller::",
    "file_log_sink::field::",
    "file_log_sink::logger::FileLogger",
    "file_log_sink::registry::LoggerRegistry",
];

fn is_plumbing(symbol: &str) -> bool {
    let symbol = symbol.strip_prefix('<').unwrap_or(symbol);
    PLUMBING_PREFIXES
        .iter()
        .any(|prefix| symbol.starts_with(prefix))
}

/// Fully qualified path of the enclosing function, e.g.
/// `my_app::jobs::Runner::tick`. Inside closures the path ends in
/// `::{{closure}}`; [`CallSite::from_symbol`] strips that.
#[macro_export]
macro_rules! function_path {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        name.strip_suffix("::__here").unwrap_or(name)
    }};
}

/// Add an entry to a [`FileLogger`](crate::logger::FileLogger) with the
/// calling function recorded as `caller`.
///
/// ```ignore
/// log_entry!(logger, Severity::Error, "payment declined", json!({"order": 7}))?;
/// ```
#[macro_export]
macro_rules! log_entry {
    ($logger:expr, $severity:expr, $message:expr) => {
        $crate::log_entry!($logger, $severity, $message, $crate::Value::Null)
    };
    ($logger:expr, $severity:expr, $message:expr, $data:expr) => {
        $logger.add_entry(
            $crate::record::LogRecord::entry($severity, $message)
                .with_caller(
                    $crate::caller::CallSite::from_symbol($crate::function_path!()).to_string(),
                )
                .with_data($data),
        )
    };
}
