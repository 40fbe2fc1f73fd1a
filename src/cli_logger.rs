use anyhow::Result;
use cmdperf::RunRecord;
use serde::Serialize;
use serde_json::Value;

use crate::cmd::run_cmd::RunOutput;

pub struct CliLogger {
    json: bool,
    no_color: bool,
}

impl CliLogger {
    pub fn new(json: bool, no_color: bool) -> Self {
        Self { json, no_color }
    }

    pub fn print_serialized<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
            return Ok(());
        }

        let rendered = render_value(&serde_json::to_value(value)?, 0);
        println!("{rendered}");
        Ok(())
    }

    pub fn print_batch_summary(&self, out: &RunOutput) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(out)?);
            return Ok(());
        }
        println!("{}", self.batch_summary_text(out));
        Ok(())
    }

    fn batch_summary_text(&self, out: &RunOutput) -> String {
        let report = &out.report;
        let status = if report.has_failures() {
            self.style("PARTIAL", "33;1")
        } else {
            self.style("OK", "32;1")
        };

        let mut text = String::new();
        text.push_str(&format!(
            "{} {} {}\n",
            self.style("cmdperf", "36;1"),
            self.style("run", "37;1"),
            status
        ));
        text.push_str(&format!("{} {}\n", self.style("run", "90"), report.run_id));
        text.push_str(&format!("{} {}\n", self.style("report", "90"), out.report_path));
        text.push_str(&format!(
            "{} profiled={} failed={} timed_out={}\n",
            self.style("runs", "90"),
            report.runs.len() - report.failed_count(),
            report.failed_count(),
            report.timed_out_count()
        ));

        for run in &report.runs {
            match run {
                RunRecord::Profiled(o) => {
                    let p = &o.profile;
                    let code = match (p.return_code, o.term_signal) {
                        (Some(code), _) => format!("rc={code}"),
                        (None, Some(sig)) => format!("signal={sig}"),
                        (None, None) => "rc=?".to_string(),
                    };
                    let flag = if o.timed_out {
                        format!(" {}", self.style("timeout", "33;1"))
                    } else {
                        String::new()
                    };
                    text.push_str(&format!(
                        "  {} {code} time={:.3}s rss={} user={:.3}s sys={:.3}s{flag}\n",
                        self.style(&p.name, "37;1"),
                        p.total_time_nanos as f64 / 1e9,
                        p.max_memory_bytes,
                        p.user_time,
                        p.cpu_time,
                    ));
                }
                RunRecord::Failed(f) => {
                    text.push_str(&format!(
                        "  {} {} {}\n",
                        self.style(&f.name, "37;1"),
                        self.style("failed", "31;1"),
                        f.message
                    ));
                }
            }
        }

        text.trim_end().to_string()
    }

    pub fn print_error(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "error",
                "code": "error",
                "message": msg,
            });
            println!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("error", "31;1"));
    }

    pub fn print_warning(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "warning",
                "code": "warning",
                "message": msg,
            });
            eprintln!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("warn", "33;1"));
    }

    fn style(&self, text: &str, ansi: &str) -> String {
        if self.no_color {
            return text.to_string();
        }
        format!("\x1b[{ansi}m{text}\x1b[0m")
    }
}

fn render_value(value: &Value, indent: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Array(items) => render_array(items, indent),
        Value::Object(map) => render_object(map, indent),
    }
}

fn render_array(items: &[Value], indent: usize) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }

    let pad = " ".repeat(indent);
    let mut out = String::new();
    for item in items {
        match item {
            Value::Object(_) | Value::Array(_) => {
                out.push_str(&format!("{pad}-\n{}\n", render_value(item, indent + 2)));
            }
            _ => out.push_str(&format!("{pad}- {}\n", render_value(item, indent + 2))),
        }
    }
    out.trim_end().to_string()
}

fn render_object(map: &serde_json::Map<String, Value>, indent: usize) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }

    let pad = " ".repeat(indent);
    let mut out = String::new();
    for (key, value) in map {
        match value {
            Value::Object(_) | Value::Array(_) => {
                out.push_str(&format!(
                    "{pad}{key}:\n{}\n",
                    render_value(value, indent + 2)
                ));
            }
            _ => out.push_str(&format!(
                "{pad}{key}: {}\n",
                render_value(value, indent + 2)
            )),
        }
    }
    out.trim_end().to_string()
}
