//! Test reports built from libtest's console output.
//!
//! `cargo test` prints one `test <name> ... <status>` line per test and a
//! `---- <name> stdout ----` block per failure. From that we write
//! `results.json`, `junit.xml` and `index.html` into the report directory.

use anyhow::{Context, Result};
use axum::Router;
use chrono::{DateTime, Local};
use drivepage::artifacts::sanitize;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
    pub name: String,
    pub outcome: Outcome,
    /// Captured output of a failed test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Failure screenshots, relative to the report directory
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub cases: Vec<TestCase>,
}

impl Report {
    pub fn parse(console: &str) -> Self {
        let mut cases = Vec::new();
        let mut outputs: HashMap<String, String> = HashMap::new();
        let mut current: Option<(String, String)> = None;

        for line in console.lines() {
            if let Some(name) = line
                .strip_prefix("---- ")
                .and_then(|rest| rest.strip_suffix(" stdout ----"))
            {
                if let Some((done, body)) = current.take() {
                    outputs.insert(done, body.trim_end().to_string());
                }
                current = Some((name.to_string(), String::new()));
                continue;
            }
            if current.is_some() {
                if line == "failures:" || line.starts_with("test result:") {
                    if let Some((done, body)) = current.take() {
                        outputs.insert(done, body.trim_end().to_string());
                    }
                } else if let Some((_, body)) = current.as_mut() {
                    body.push_str(line);
                    body.push('\n');
                }
                continue;
            }
            if let Some(case) = parse_result_line(line) {
                cases.push(case);
            }
        }
        if let Some((done, body)) = current {
            outputs.insert(done, body.trim_end().to_string());
        }

        for case in &mut cases {
            case.output = outputs.remove(&case.name);
        }
        Self {
            generated_at: Local::now(),
            cases,
        }
    }

    pub fn passed(&self) -> usize {
        self.count(Outcome::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    pub fn ignored(&self) -> usize {
        self.count(Outcome::Ignored)
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.cases.iter().filter(|c| c.outcome == outcome).count()
    }

    /// Copies failure screenshots next to the report and writes every format.
    pub async fn write(mut self, dir: &Path, screenshots: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating '{}'", dir.display()))?;
        self.attach_screenshots(dir, screenshots).await?;

        let json = serde_json::to_string_pretty(&self)?;
        tokio::fs::write(dir.join("results.json"), json).await?;
        tokio::fs::write(dir.join("junit.xml"), self.to_junit()).await?;
        tokio::fs::write(dir.join("index.html"), self.to_html()).await?;
        tracing::info!(dir = %dir.display(), "reports written");
        Ok(self)
    }

    async fn attach_screenshots(&mut self, dir: &Path, screenshots: &Path) -> Result<()> {
        let available = list_png(screenshots).await?;
        if available.is_empty() {
            return Ok(());
        }
        let target = dir.join("screenshots");
        tokio::fs::create_dir_all(&target).await?;

        for case in self.cases.iter_mut().filter(|c| c.outcome == Outcome::Failed) {
            let prefix = format!("{}_", sanitize(short_name(&case.name)));
            for path in &available {
                let Some(file) = path.file_name().and_then(|f| f.to_str()) else {
                    continue;
                };
                if file.starts_with(&prefix) {
                    tokio::fs::copy(path, target.join(file)).await?;
                    case.screenshots.push(format!("screenshots/{file}"));
                }
            }
        }
        Ok(())
    }

    pub fn to_junit(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            xml,
            "<testsuite name=\"drivepage\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" timestamp=\"{}\">",
            self.cases.len(),
            self.failed(),
            self.ignored(),
            self.generated_at.to_rfc3339()
        );
        for case in &self.cases {
            let name = escape(&case.name);
            match case.outcome {
                Outcome::Passed => {
                    let _ = writeln!(xml, "  <testcase name=\"{name}\"/>");
                }
                Outcome::Ignored => {
                    let _ = writeln!(xml, "  <testcase name=\"{name}\"><skipped/></testcase>");
                }
                Outcome::Failed => {
                    let output = escape(case.output.as_deref().unwrap_or_default());
                    let _ = writeln!(
                        xml,
                        "  <testcase name=\"{name}\"><failure message=\"test failed\">{output}</failure></testcase>"
                    );
                }
            }
        }
        xml.push_str("</testsuite>\n");
        xml
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>drivepage report</title>\
             <style>body{{font-family:sans-serif}} .passed{{color:#2e7d32}} .failed{{color:#c62828}} \
             .ignored{{color:#757575}} pre{{background:#f5f5f5;padding:8px;overflow:auto}} \
             img{{max-width:640px;display:block}}</style></head><body>\n\
             <h1>drivepage</h1>\n<p>{} &middot; {} passed, {} failed, {} ignored</p>\n<table>\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.passed(),
            self.failed(),
            self.ignored()
        );
        for case in &self.cases {
            let (class, label) = match case.outcome {
                Outcome::Passed => ("passed", "passed"),
                Outcome::Failed => ("failed", "FAILED"),
                Outcome::Ignored => ("ignored", "ignored"),
            };
            let _ = write!(
                html,
                "<tr><td class=\"{class}\">{label}</td><td>{}",
                escape(&case.name)
            );
            if let Some(output) = &case.output {
                let _ = write!(html, "<pre>{}</pre>", escape(output));
            }
            for shot in &case.screenshots {
                let _ = write!(html, "<img src=\"{}\" alt=\"\">", escape(shot));
            }
            html.push_str("</td></tr>\n");
        }
        html.push_str("</table>\n</body></html>\n");
        html
    }
}

/// Serves `dir` until interrupted.
pub async fn serve(dir: &Path, port: u16) -> Result<()> {
    if !dir.join("index.html").is_file() {
        anyhow::bail!(
            "no report in '{}'; run `cargo xtask test` first",
            dir.display()
        );
    }
    let app = Router::new().fallback_service(ServeDir::new(dir));
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    println!("serving report at http://{addr}/ (Ctrl+C to stop)");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

fn parse_result_line(line: &str) -> Option<TestCase> {
    let rest = line.strip_prefix("test ")?;
    let (name, status) = rest.rsplit_once(" ... ")?;
    let outcome = match status.trim() {
        "ok" => Outcome::Passed,
        "FAILED" => Outcome::Failed,
        s if s.starts_with("ignored") => Outcome::Ignored,
        _ => return None,
    };
    Some(TestCase {
        name: name.to_string(),
        outcome,
        output: None,
        screenshots: Vec::new(),
    })
}

/// Test function name without its module path.
fn short_name(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

async fn list_png(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut out = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "png") {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
