use linefsm::{ParseResultVerbose, Template, ValueOptions};
use std::path::Path;

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

const MAX_TRACE_LINES: usize = 40;

pub fn print_run(path: &Path, template: &Template, res: &ParseResultVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Template: {}", path.display()), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Template ━━━", ansi::GRAY));
    print_template(template, &palette);

    println!("\n{}", palette.paint("━━━ Run ━━━", ansi::GRAY));
    print_summary(res, &palette);

    if !res.metrics.trace.is_empty() {
        println!("\n{}", palette.paint("━━━ Trace ━━━", ansi::GRAY));
        print_trace(res, &palette);
    }

    println!("\n{}", palette.paint("━━━ Records ━━━", ansi::GRAY));
    if res.records.is_empty() {
        println!("{}", palette.dim("  No records produced"));
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • No rule matched any input line (check the trace above)");
        println!("  • A Required value was empty when Record ran");
        println!("  • The run reached End before any Record action");
        println!("\n{}", palette.dim("  Tip: Set RUST_LOG=linefsm=debug to see state transitions"));
    } else {
        print_records(res, &palette);
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Engine: {}",
        palette.paint(format!("{:?}", res.elapsed), ansi::GREEN),
        palette.paint(format!("{:?}", res.metrics.total), ansi::CYAN),
    );
    println!();
}

fn print_template(template: &Template, palette: &ansi::Palette) {
    for value in template.values() {
        let options = value.options().iter_names().map(|(name, _)| name.to_lowercase()).collect::<Vec<_>>();
        println!(
            "  {} {} {}",
            palette.paint(value.name(), ansi::BLUE),
            palette.dim(value.pattern()),
            if options.is_empty() { String::new() } else { palette.paint(options.join(","), ansi::YELLOW) }
        );
    }
    let keys = template.values_with(ValueOptions::KEY);
    if !keys.is_empty() {
        println!("  {} {}", palette.dim("key:"), palette.paint(keys.join(", "), ansi::YELLOW));
    }
    for state in template.state_names() {
        println!(
            "  {} {}",
            palette.paint(state, ansi::CYAN),
            palette.dim(format!("{} rules", template.rules(state).len()))
        );
    }
}

fn print_summary(res: &ParseResultVerbose, palette: &ansi::Palette) {
    let m = &res.metrics;
    println!(
        "  Lines: {}  │  Matched: {}  │  Rules evaluated: {}",
        palette.paint(m.lines.to_string(), ansi::BLUE),
        palette.paint(m.matched_lines.to_string(), ansi::GREEN),
        palette.dim(m.rules_evaluated.to_string()),
    );
    println!(
        "  Records: {}  │  Suppressed: {}  │  Final state: {}{}",
        palette.paint(m.records.to_string(), ansi::GREEN),
        if m.suppressed > 0 {
            palette.paint(m.suppressed.to_string(), ansi::YELLOW)
        } else {
            palette.dim(m.suppressed.to_string())
        },
        palette.paint(&m.final_state, ansi::CYAN),
        if m.eof_record { palette.dim(" (implicit EOF record)") } else { String::new() },
    );
}

fn print_trace(res: &ParseResultVerbose, palette: &ansi::Palette) {
    for entry in res.metrics.trace.iter().take(MAX_TRACE_LINES) {
        let rules = if entry.rules.is_empty() {
            palette.dim("✗ skipped")
        } else {
            let lines = entry.rules.iter().map(|l| format!("@{l}")).collect::<Vec<_>>().join(" ");
            palette.paint(format!("✓ {lines}"), ansi::GREEN)
        };
        println!(
            "  {} {} {}{}",
            palette.paint(format!("{:>4}", entry.line), ansi::GRAY),
            palette.paint(&entry.state, ansi::BLUE),
            rules,
            entry.transition.as_ref().map(|s| format!(" → {}", palette.paint(s, ansi::CYAN))).unwrap_or_default(),
        );
    }
    if res.metrics.trace.len() > MAX_TRACE_LINES {
        println!("  {}", palette.dim(format!("... +{} more", res.metrics.trace.len() - MAX_TRACE_LINES)));
    }
}

fn print_records(res: &ParseResultVerbose, palette: &ansi::Palette) {
    for (idx, record) in res.records.iter().enumerate() {
        println!("  {}", palette.paint(format!("[{idx}]"), ansi::GRAY));
        for (name, value) in record.iter() {
            let shown = if value.is_empty() {
                palette.dim("∅")
            } else {
                palette.bold(palette.paint(value.to_string(), ansi::GREEN))
            };
            println!("      {} {}", palette.paint(format!("{name}:"), ansi::BLUE), shown);
        }
    }
}
